use thiserror::Error;

/// Crate-wide error type to avoid `Box<dyn Error>` in public APIs.
///
/// Only setup-time operations return it: building a fetcher, loading
/// configuration, rendering HTML. The render path of the block never fails.
#[derive(Error, Debug)]
pub enum RetentionError {
    #[error("Config error: {0}")]
    Config(#[from] crate::errors::ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crate::errors::FetchError),

    #[error("Render error: {0}")]
    Render(#[from] crate::errors::RenderError),
}
