//! Shared application service layer for the climate manager.
//!
//! Front-ends (currently the CLI) go through this crate for configuration
//! loading and inspection, and for running a hub against a simulated host.

pub mod error;
pub mod project_service;
pub mod run_service;

pub use error::{AppError, AppResult};
pub use project_service::{
    CircuitSummary, ZoneSummary, list_circuits, list_zones, load_config, validate_config,
};
pub use run_service::{
    CircuitStatus, RunOptions, RunReport, ZoneStatus, load_states, simulate,
};
