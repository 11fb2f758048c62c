//! Simulated action types
//!
//! Every simulated on-chain action (deposit, withdrawal, swap, ...) shares the
//! same status progression and the same snapshot shape. Action-specific data
//! travels in the free-form [`ActionParams`] payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Lifecycle status shared by every simulated action
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Display,
    EnumString,
    IntoStaticStr,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    /// Nothing in flight
    #[default]
    Idle,
    /// Submitted to the simulated network, waiting for the delay to elapse
    Processing,
    /// Reference id issued, waiting for the caller to confirm
    Awaiting,
    /// Confirmation counter running
    Confirming,
    /// Threshold reached
    Completed,
    /// Forced failure, terminal until reset
    Error,
}

impl ActionStatus {
    /// Whether no further automatic progress can happen from this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, ActionStatus::Completed | ActionStatus::Error)
    }

    /// Whether a timer may be driving this status
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            ActionStatus::Processing | ActionStatus::Awaiting | ActionStatus::Confirming
        )
    }
}

/// Kind of simulated action owned by a flow
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
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Deposit,
    Withdrawal,
    Transfer,
    Swap,
    Liquidity,
    Proposal,
    Mint,
    Burn,
}

/// Free-form action payload (amount, source/target identifiers, addresses)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Anything else a particular flow wants to carry along
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl ActionParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = Some(amount.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.source.is_none()
            && self.target.is_none()
            && self.address.is_none()
            && self.extra.is_empty()
    }
}

/// Observable state of one simulated action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionState {
    pub kind: ActionKind,
    pub status: ActionStatus,
    /// Opaque generated transaction identifier, absent while idle
    pub reference_id: Option<String>,
    pub confirmations: u32,
    pub required_confirmations: u32,
    pub params: ActionParams,
    pub updated_at: DateTime<Utc>,
}

impl ActionState {
    /// Create an idle state for the given action kind
    pub fn new(kind: ActionKind, required_confirmations: u32) -> Self {
        Self {
            kind,
            status: ActionStatus::Idle,
            reference_id: None,
            confirmations: 0,
            required_confirmations,
            params: ActionParams::default(),
            updated_at: Utc::now(),
        }
    }

    /// Confirmation progress clamped to `0.0..=1.0`
    pub fn progress(&self) -> f64 {
        if self.required_confirmations == 0 {
            return if self.status == ActionStatus::Completed {
                1.0
            } else {
                0.0
            };
        }
        (self.confirmations as f64 / self.required_confirmations as f64).min(1.0)
    }

    pub fn is_idle(&self) -> bool {
        self.status == ActionStatus::Idle
    }

    /// Return to idle with every attempt-specific field cleared
    pub fn clear(&mut self) {
        self.status = ActionStatus::Idle;
        self.reference_id = None;
        self.confirmations = 0;
        self.params = ActionParams::default();
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_round_trips_through_strings() {
        assert_eq!(ActionStatus::Confirming.to_string(), "confirming");
        assert_eq!(
            ActionStatus::from_str("awaiting").unwrap(),
            ActionStatus::Awaiting
        );
        assert!(ActionStatus::from_str("pending").is_err());
    }

    #[test]
    fn test_progress_is_clamped() {
        let mut state = ActionState::new(ActionKind::Deposit, 4);
        assert_eq!(state.progress(), 0.0);

        state.confirmations = 2;
        assert_eq!(state.progress(), 0.5);

        state.confirmations = 9;
        assert_eq!(state.progress(), 1.0);
    }

    #[test]
    fn test_clear_resets_attempt_fields() {
        let mut state = ActionState::new(ActionKind::Swap, 6);
        state.status = ActionStatus::Confirming;
        state.reference_id = Some("0xabc".to_string());
        state.confirmations = 3;
        state.params = ActionParams::new().with_amount("1.5");

        state.clear();

        assert!(state.is_idle());
        assert_eq!(state.reference_id, None);
        assert_eq!(state.confirmations, 0);
        assert!(state.params.is_empty());
        assert_eq!(state.required_confirmations, 6);
    }
}
