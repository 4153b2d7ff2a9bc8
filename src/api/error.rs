use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to parse API response: {0}")]
    Parse(String),
}

impl ApiError {
    /// HTTP status code of the failure, when the server answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::Parse(_) => None,
        }
    }
}
