use crate::claims::TokenKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TokenError>;

#[derive(Debug, Error)]
pub enum TokenError {
    /// Session issuance failed. The cause is logged, never returned.
    #[error("token generation failed")]
    GenerationFailed,

    /// Reset token signing failed; surfaced as-is.
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// Bad signature, malformed payload, wrong kind, or expired.
    #[error("invalid or expired {} token", kind.label())]
    InvalidOrExpired { kind: TokenKind },
}

impl TokenError {
    pub fn invalid(kind: TokenKind) -> Self {
        TokenError::InvalidOrExpired { kind }
    }

    /// True for the normalized verification failure of any kind
    pub fn is_verification_failure(&self) -> bool {
        matches!(self, TokenError::InvalidOrExpired { .. })
    }
}
