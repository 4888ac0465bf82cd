//! cm-project: configuration file format, restore snapshots and validation.

pub mod schema;
pub mod snapshot;
pub mod validate;

pub use schema::*;
pub use snapshot::*;
pub use validate::{ValidationError, validate_config, validate_zone_snapshot};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn config_from_yaml_str(content: &str) -> ProjectResult<HubConfig> {
    let config: HubConfig = serde_yaml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn load_yaml(path: &std::path::Path) -> ProjectResult<HubConfig> {
    let content = std::fs::read_to_string(path)?;
    config_from_yaml_str(&content)
}

pub fn save_yaml(path: &std::path::Path, config: &HubConfig) -> ProjectResult<()> {
    validate_config(config)?;
    let content = serde_yaml::to_string(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_snapshots(path: &std::path::Path) -> ProjectResult<SnapshotSet> {
    let content = std::fs::read_to_string(path)?;
    let snapshots: SnapshotSet = serde_json::from_str(&content)?;
    Ok(snapshots)
}

pub fn save_snapshots(path: &std::path::Path, snapshots: &SnapshotSet) -> ProjectResult<()> {
    let content = serde_json::to_string_pretty(snapshots)?;
    std::fs::write(path, content)?;
    Ok(())
}
