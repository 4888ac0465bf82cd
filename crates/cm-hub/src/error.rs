//! Error types for the control composites.

use cm_controls::ControlError;
use cm_core::CoreError;
use cm_project::ValidationError;
use thiserror::Error;

/// Any failure inside a zone, circuit or hub step.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HubError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Control(#[from] ControlError),

    #[error("Configuration error: {0}")]
    Config(#[from] ValidationError),

    #[error("Unknown zone: {id}")]
    UnknownZone { id: String },

    #[error("Unknown circuit: {id}")]
    UnknownCircuit { id: String },

    #[error("Unknown preset '{preset}'")]
    UnknownPreset { preset: String },

    #[error("Zone '{zone}' has no PID regulator")]
    NotPid { zone: String },
}

pub type HubResult<T> = Result<T, HubError>;
