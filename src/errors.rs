// Central error aggregation module. This file defines the crate-wide
// `RetentionError` and re-exports the per-concern error types under
// `crate::errors::*`.
pub mod config;
pub mod fetch;
pub mod render;
pub mod retention;

pub use config::ConfigError;
pub use fetch::FetchError;
pub use render::RenderError;

pub use retention::RetentionError;
pub type Result<T> = std::result::Result<T, RetentionError>;
