use thiserror::Error;
use token_core::TokenError;

pub type Result<T> = std::result::Result<T, NotificationError>;

#[derive(Debug, Error)]
pub enum NotificationError {
    /// Reset token could not be issued; nothing was sent
    #[error("Password reset token unavailable: {0}")]
    Token(#[from] TokenError),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build email message: {0}")]
    Build(String),

    #[error("Failed to send email: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl NotificationError {
    /// Whether the caller may reasonably try the same send again
    pub fn is_retryable(&self) -> bool {
        matches!(self, NotificationError::Transport(_))
    }
}

impl From<lettre::error::Error> for NotificationError {
    fn from(err: lettre::error::Error) -> Self {
        NotificationError::Build(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for NotificationError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        tracing::error!("SMTP error: {}", err);
        NotificationError::Transport(err.to_string())
    }
}
