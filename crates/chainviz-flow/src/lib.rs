//! # chainviz-flow
//!
//! Timer-driven state machines for simulated on-chain actions.
//!
//! Nothing here talks to a chain: an action is submitted, a reference id is
//! produced after a simulated delay, and a confirmation counter ticks until
//! the configured threshold is reached.

pub mod config;
pub mod error;
pub mod machine;
pub mod reference;
pub mod session;

pub use config::ActionConfig;
pub use error::{FlowError, FlowResult};
pub use machine::{ActionMachine, PendingReference};
pub use reference::{generate_reference_id, is_reference_id};
pub use session::FlowSession;

pub use chainviz_types::{ActionKind, ActionParams, ActionState, ActionStatus, FlowType};
