//! Shared types for chainviz
//!
//! Simulated action state, flow/step metadata and the explanation shape used
//! across the flow state machine and the explanation resolver.

pub mod action;
pub mod explanation;
pub mod flow;

pub use action::*;
pub use explanation::*;
pub use flow::*;
