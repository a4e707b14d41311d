use thiserror::Error;

/// Client-level error type.
///
/// None of these are shown to the user directly. The shell logs them and
/// swaps in one of the fixed messages from `shell::messages`.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Identity token error: {0}")]
    Token(String),

    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
