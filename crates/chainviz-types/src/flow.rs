//! Flow and step types
//!
//! A flow is one educational scenario (bridge transfer, swap, deposit, ...)
//! made of ordered steps. Step 0 is always the overview.

use crate::action::ActionKind;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Educational flow scenarios
#[derive(
    Debug,
    Clone,
    Copy,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum FlowType {
    /// Cross-chain bridge: lock on the source chain, mint on the target
    Bridge,
    /// DEX swap through a liquidity pool
    Swap,
    /// Token deposit into a vault or bridge contract
    Deposit,
    /// Token withdrawal back to the user
    Withdrawal,
    /// Governance proposal lifecycle
    Governance,
    /// Lending market supply and withdraw
    Lending,
    /// Multisig-approved token mint
    MultisigMint,
    /// Multisig-approved token burn
    MultisigBurn,
}

impl FlowType {
    /// Action kinds a session of this flow owns by default
    pub fn default_actions(&self) -> &'static [ActionKind] {
        match self {
            FlowType::Bridge => &[ActionKind::Deposit, ActionKind::Withdrawal],
            FlowType::Swap => &[ActionKind::Swap, ActionKind::Liquidity],
            FlowType::Deposit => &[ActionKind::Deposit],
            FlowType::Withdrawal => &[ActionKind::Withdrawal],
            FlowType::Governance => &[ActionKind::Proposal],
            FlowType::Lending => &[ActionKind::Deposit, ActionKind::Withdrawal],
            FlowType::MultisigMint => &[ActionKind::Mint],
            FlowType::MultisigBurn => &[ActionKind::Burn],
        }
    }

    /// String key used by the static table and prompt templates
    pub fn key(&self) -> &'static str {
        self.into()
    }
}

/// A highlighted diagram edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramEdge {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl DiagramEdge {
    /// Human readable form, e.g. `User Wallet -> Bridge Contract (lock tokens)`
    pub fn describe(&self) -> String {
        match &self.label {
            Some(label) => format!("{} -> {} ({})", self.from, self.to, label),
            None => format!("{} -> {}", self.from, self.to),
        }
    }
}

/// Narrative and diagram metadata for one step of a flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepMetadata {
    pub step: u32,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub rationale: String,
    /// Illustrative snippet shown next to the step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Labels of diagram nodes highlighted during this step
    #[serde(default)]
    pub active_nodes: Vec<String>,
    #[serde(default)]
    pub active_edges: Vec<DiagramEdge>,
}

impl StepMetadata {
    pub fn new(step: u32, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            step,
            title: title.into(),
            description: description.into(),
            rationale: String::new(),
            code: None,
            active_nodes: Vec::new(),
            active_edges: Vec::new(),
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.active_nodes.push(node.into());
        self
    }

    pub fn with_edge(mut self, edge: DiagramEdge) -> Self {
        self.active_edges.push(edge);
        self
    }
}
