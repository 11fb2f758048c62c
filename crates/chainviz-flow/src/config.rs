//! Timing configuration for simulated actions

use crate::error::{FlowError, FlowResult};
use chainviz_types::ActionKind;
use std::time::Duration;

/// Timing and threshold settings for one [`ActionMachine`](crate::ActionMachine)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionConfig {
    /// Simulated network delay between `processing` and `awaiting`
    pub processing_delay: Duration,
    /// Period of the confirmation ticker
    pub confirmation_interval: Duration,
    /// Number of ticks needed to reach `completed`
    pub required_confirmations: u32,
    /// When false, `confirm` completes the action immediately
    pub confirmation_phase: bool,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            processing_delay: Duration::from_millis(2000),
            confirmation_interval: Duration::from_millis(1000),
            required_confirmations: 6,
            confirmation_phase: true,
        }
    }
}

impl ActionConfig {
    /// Presets matching how each action is narrated in the flows
    pub fn for_kind(kind: ActionKind) -> Self {
        let base = Self::default();
        match kind {
            ActionKind::Deposit | ActionKind::Withdrawal => base,
            ActionKind::Transfer => base.with_required_confirmations(12),
            ActionKind::Swap | ActionKind::Liquidity => base
                .with_processing_delay(Duration::from_millis(1500))
                .without_confirmation_phase(),
            ActionKind::Proposal => base
                .with_required_confirmations(3)
                .with_confirmation_interval(Duration::from_millis(1500)),
            // multisig approvals
            ActionKind::Mint | ActionKind::Burn => base.with_required_confirmations(2),
        }
    }

    pub fn with_processing_delay(mut self, delay: Duration) -> Self {
        self.processing_delay = delay;
        self
    }

    pub fn with_confirmation_interval(mut self, interval: Duration) -> Self {
        self.confirmation_interval = interval;
        self
    }

    pub fn with_required_confirmations(mut self, required: u32) -> Self {
        self.required_confirmations = required;
        self
    }

    pub fn without_confirmation_phase(mut self) -> Self {
        self.confirmation_phase = false;
        self
    }

    /// Reject settings the timers cannot run with
    pub fn validate(&self) -> FlowResult<()> {
        if self.required_confirmations == 0 {
            return Err(FlowError::config(
                "required_confirmations must be greater than zero",
            ));
        }
        if self.confirmation_phase && self.confirmation_interval.is_zero() {
            return Err(FlowError::config(
                "confirmation_interval must be non-zero when the confirmation phase is enabled",
            ));
        }
        Ok(())
    }
}
