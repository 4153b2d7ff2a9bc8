use thiserror::Error;

use crate::api::ApiError;

#[derive(Debug, Error)]
pub enum PodforgeError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Podcast not found: {0}")]
    PodcastNotFound(i64),

    #[error("Backend API error: {0}")]
    Api(#[from] ApiError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
