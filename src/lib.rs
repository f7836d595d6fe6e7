//! Learning-management block listing unread Retention Management System
//! alert counts for the viewing instructor.
//!
//! The flow for one page render is `block` -> `fetcher` -> `presenter`, with
//! `html` turning the resulting rows into markup when the host wants it.
pub mod assets;
pub mod block;
pub mod config;
pub mod errors;
pub mod fetcher;
pub mod html;
pub mod presenter;
pub mod types;

pub use block::{CapabilityCheck, RenderContext, RetentionBlock};
pub use config::RetentionConfig;
pub use errors::{Result, RetentionError};
pub use fetcher::AlertFetcher;
pub use types::{AlertResult, DisplayModel, Widget};
