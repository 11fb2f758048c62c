//! Flow session
//!
//! A session is the explicit owner of the action machines used by one flow
//! walkthrough, plus the step cursor that drives diagram highlighting.

use crate::config::ActionConfig;
use crate::error::{FlowError, FlowResult};
use crate::machine::ActionMachine;
use chainviz_types::{ActionKind, ActionState, FlowType};
use std::collections::BTreeMap;
use tracing::{debug, info};
use uuid::Uuid;

/// Owns the actions and step position of one flow walkthrough
#[derive(Debug)]
pub struct FlowSession {
    id: Uuid,
    flow: FlowType,
    step_count: u32,
    current_step: u32,
    actions: BTreeMap<ActionKind, ActionMachine>,
}

impl FlowSession {
    /// Create a session with the flow's default actions and their presets
    pub fn new(flow: FlowType, step_count: u32) -> FlowResult<Self> {
        let actions = flow
            .default_actions()
            .iter()
            .map(|kind| (*kind, ActionConfig::for_kind(*kind)))
            .collect();
        Self::with_actions(flow, step_count, actions)
    }

    /// Create a session with explicit action configurations
    pub fn with_actions(
        flow: FlowType,
        step_count: u32,
        actions: Vec<(ActionKind, ActionConfig)>,
    ) -> FlowResult<Self> {
        let mut machines = BTreeMap::new();
        for (kind, config) in actions {
            machines.insert(kind, ActionMachine::new(kind, config)?);
        }

        let session = Self {
            id: Uuid::new_v4(),
            flow,
            step_count,
            current_step: 0,
            actions: machines,
        };

        info!(
            session_id = %session.id,
            flow = %flow,
            step_count,
            actions = session.actions.len(),
            "Flow session created"
        );
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn flow(&self) -> FlowType {
        self.flow
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    /// Current step, 0 being the overview
    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step >= self.step_count
    }

    /// Machine for an action kind owned by this flow
    pub fn action(&self, kind: ActionKind) -> FlowResult<&ActionMachine> {
        self.actions.get(&kind).ok_or(FlowError::UnknownAction {
            flow: self.flow,
            kind,
        })
    }

    pub fn action_kinds(&self) -> impl Iterator<Item = ActionKind> + '_ {
        self.actions.keys().copied()
    }

    /// Snapshots of every owned action, ordered by kind
    pub fn snapshots(&self) -> Vec<ActionState> {
        self.actions.values().map(ActionMachine::snapshot).collect()
    }

    /// Advance the cursor, stopping at the last step
    pub fn next_step(&mut self) -> u32 {
        if self.current_step < self.step_count {
            self.current_step += 1;
        }
        debug!(session_id = %self.id, step = self.current_step, "Step advanced");
        self.current_step
    }

    /// Move the cursor back, stopping at the overview
    pub fn previous_step(&mut self) -> u32 {
        self.current_step = self.current_step.saturating_sub(1);
        debug!(session_id = %self.id, step = self.current_step, "Step rewound");
        self.current_step
    }

    pub fn go_to_step(&mut self, step: u32) -> FlowResult<u32> {
        if step > self.step_count {
            return Err(FlowError::StepOutOfRange {
                step,
                step_count: self.step_count,
            });
        }
        self.current_step = step;
        Ok(step)
    }

    /// Reset every action and return to the overview
    pub async fn reset(&mut self) {
        for machine in self.actions.values() {
            machine.reset().await;
        }
        self.current_step = 0;
        info!(session_id = %self.id, flow = %self.flow, "Flow session reset");
    }
}
