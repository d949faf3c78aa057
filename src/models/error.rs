use super::timeline::HostPrompt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: credential rejected by provider")]
    Unauthorized,

    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Invalid data (status {status}): {reason}")]
    InvalidData { status: u16, reason: String },

    #[error("No API credential configured")]
    MissingCredential,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    /// Whether a later attempt could succeed without the user changing anything.
    ///
    /// Invalid data is terminal for the attempt that saw it; it is only
    /// scheduled like a transport failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Transport(_) | AppError::Server { .. })
    }

    /// The host prompt this error should drive.
    pub fn prompt(&self) -> HostPrompt {
        match self {
            AppError::MissingCredential | AppError::Unauthorized => HostPrompt::Setup,
            AppError::ZoneNotFound(_) | AppError::BadRequest(_) | AppError::ConfigError(_) => {
                HostPrompt::Configure
            }
            AppError::Transport(_) | AppError::Server { .. } | AppError::InvalidData { .. } => {
                HostPrompt::Retry
            }
        }
    }
}
