//! Error types for cxxconf-core

use thiserror::Error;

/// Errors that can occur in the configuration layer
#[derive(Error, Debug)]
pub enum ConfigureError {
    /// A mandatory compile check did not pass
    #[error("Mandatory check failed: {0}")]
    MandatoryCheckFailed(String),

    /// Config header generation error
    #[error("Config header write failed: {0}")]
    HeaderWrite(String),

    /// Configuration store write error
    #[error("Configuration store write failed: {0}")]
    StoreWrite(String),

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ConfigureError {
    fn from(err: serde_json::Error) -> Self {
        ConfigureError::Serialization(err.to_string())
    }
}
