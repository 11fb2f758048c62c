//! Drive one action from submission to completion

use anyhow::{Context, Result};
use chainviz_flow::{ActionConfig, ActionKind, ActionMachine, ActionParams, ActionState};
use std::time::Duration;
use tracing::{info, instrument};

/// Overrides applied on top of the action's preset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationOptions {
    pub confirmations: Option<u32>,
    pub interval: Option<Duration>,
    pub delay: Option<Duration>,
}

impl SimulationOptions {
    pub fn config_for(&self, kind: ActionKind) -> ActionConfig {
        let mut config = ActionConfig::for_kind(kind);
        if let Some(confirmations) = self.confirmations {
            config = config.with_required_confirmations(confirmations);
        }
        if let Some(interval) = self.interval {
            config = config.with_confirmation_interval(interval);
        }
        if let Some(delay) = self.delay {
            config = config.with_processing_delay(delay);
        }
        config
    }
}

/// Every state observed while the action ran
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub reference_id: String,
    pub states: Vec<ActionState>,
}

impl SimulationReport {
    pub fn final_state(&self) -> Option<&ActionState> {
        self.states.last()
    }
}

/// Start, confirm and follow `kind` until it reaches a terminal status
#[instrument(skip(options))]
pub async fn run_simulation(
    kind: ActionKind,
    params: ActionParams,
    options: &SimulationOptions,
) -> Result<SimulationReport> {
    let machine = ActionMachine::new(kind, options.config_for(kind))
        .with_context(|| format!("Invalid configuration for {kind}"))?;
    let mut updates = machine.subscribe();
    let mut states = Vec::new();

    let pending = machine.submit(params).await;
    states.push(log_state(machine.snapshot()));

    let reference_id = pending.await.context("Action was superseded")?;
    states.push(log_state(machine.snapshot()));

    machine
        .confirm(reference_id.clone())
        .await
        .context("Failed to begin confirmations")?;
    let mut current = updates.borrow_and_update().clone();
    states.push(log_state(current.clone()));

    while !current.status.is_terminal() {
        updates
            .changed()
            .await
            .context("Action machine dropped while confirming")?;
        current = updates.borrow_and_update().clone();
        states.push(log_state(current.clone()));
    }

    Ok(SimulationReport {
        reference_id,
        states,
    })
}

fn log_state(state: ActionState) -> ActionState {
    info!(
        kind = %state.kind,
        status = %state.status,
        reference_id = state.reference_id.as_deref().unwrap_or("-"),
        confirmations = state.confirmations,
        required = state.required_confirmations,
        progress = state.progress(),
        "Action state"
    );
    state
}
