use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AssistantError {
    /// The backend answered with a non-success status.
    #[error("Backend error: {status} {body}")]
    Backend { status: u16, body: String },

    /// The request never completed (connect, read, or timeout failure).
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}

pub type AssistantResult<T> = Result<T, AssistantError>;
