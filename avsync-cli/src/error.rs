use avsync_engine::{CheckError, ConfigError, NotifyError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Check error: {0}")]
    Check(#[from] CheckError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[cfg(not(feature = "sns"))]
    #[error("{0} support is not compiled into this build")]
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, AppError>;
