//! Library side of the `chainviz-runner` binary

pub mod cli;
pub mod config;
pub mod simulate;

pub use cli::{explain, Cli, Command};
pub use config::RunnerConfig;
pub use simulate::{run_simulation, SimulationOptions, SimulationReport};
