use thiserror::Error;

/// Errors raised while turning a display model into HTML
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Template is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}
