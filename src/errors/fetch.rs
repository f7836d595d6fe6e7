use thiserror::Error;

/// Message shown when the HTTP exchange could not be completed.
pub const TRANSPORT_FAILURE_MESSAGE: &str = "Remote call failed (general failure)";

/// Message shown when a malformed body is surfaced instead of swallowed.
pub const MALFORMED_RESPONSE_MESSAGE: &str = "Remote call failed (malformed response)";

/// Errors that can occur while fetching alerts from the retention system
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connect, DNS, TLS, timeout or body read failure.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The request could not be assembled for this user.
    #[error("Request error: {0}")]
    Request(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl FetchError {
    /// Text shown to the viewer in place of the alert list
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Request(detail) => {
                format!("Remote call failed (request error): {}", detail)
            }
            FetchError::MalformedResponse(_) => MALFORMED_RESPONSE_MESSAGE.to_string(),
            FetchError::Transport(_) | FetchError::HttpClient(_) => {
                TRANSPORT_FAILURE_MESSAGE.to_string()
            }
        }
    }
}
