use std::io;
use thiserror::Error;

/// Errors raised while loading or validating `RetentionConfig`
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("API token not provided: {0}")]
    MissingToken(String),

    #[error("Invalid URL template: {0}")]
    InvalidTemplate(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}
