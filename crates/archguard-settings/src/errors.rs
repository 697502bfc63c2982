//! Settings error types.

use thiserror::Error;

/// Errors that can occur when loading or writing settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read or write the settings file.
    #[error("failed to access settings file: {0}")]
    Io(#[from] std::io::Error),
    /// The settings file is not valid YAML.
    #[error("failed to parse archguard.yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The merged settings did not match the expected shape.
    #[error("failed to decode settings: {0}")]
    Json(#[from] serde_json::Error),
    /// A settings value was invalid (e.g., out of range).
    #[error("invalid settings value: {0}")]
    InvalidValue(String),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;
