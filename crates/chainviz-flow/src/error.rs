use chainviz_types::{ActionKind, ActionStatus, FlowType};
use thiserror::Error;

/// Errors raised by the flow state machine
#[derive(Debug, Error)]
pub enum FlowError {
    /// The attempt was reset or restarted before its reference id was issued
    #[error("Action attempt was superseded before a reference id was issued")]
    Superseded,

    /// Operation not allowed from the current status
    #[error("Cannot {operation} {kind} action while it is {status}")]
    InvalidTransition {
        kind: ActionKind,
        status: ActionStatus,
        operation: &'static str,
    },

    /// Configuration error
    #[error("Invalid action configuration: {0}")]
    InvalidConfig(String),

    /// The session does not own an action of this kind
    #[error("Flow {flow} has no {kind} action")]
    UnknownAction { flow: FlowType, kind: ActionKind },

    /// Step cursor moved outside the flow
    #[error("Step {step} is outside flow with {step_count} steps")]
    StepOutOfRange { step: u32, step_count: u32 },
}

impl FlowError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Result type for flow operations
pub type FlowResult<T> = Result<T, FlowError>;
