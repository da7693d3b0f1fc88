use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] joss_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Amount must be a positive whole number, got '{0}'")]
    InvalidAmount(String),
    #[error("Category cannot be empty")]
    EmptyCategory,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Share URL does not carry a device id")]
    MissingHandshake,
    #[error("Share URL points at this device; nothing to pull")]
    OwnDeviceHandshake,
}
