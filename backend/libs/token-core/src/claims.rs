use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which policy (secret + TTL) a token is minted and verified under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
    PasswordReset,
}

impl TokenKind {
    pub const ALL: [TokenKind; 3] = [TokenKind::Access, TokenKind::Refresh, TokenKind::PasswordReset];

    /// Value of the `token_type` claim
    pub fn as_claim(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
            TokenKind::PasswordReset => "password_reset",
        }
    }

    /// Short name used in user-facing messages
    pub fn label(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
            TokenKind::PasswordReset => "reset",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_claim())
    }
}

/// Opaque principal identifier; numeric ids stay JSON numbers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubjectId {
    Numeric(i64),
    Text(String),
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectId::Numeric(id) => write!(f, "{id}"),
            SubjectId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for SubjectId {
    fn from(id: i64) -> Self {
        SubjectId::Numeric(id)
    }
}

impl From<i32> for SubjectId {
    fn from(id: i32) -> Self {
        SubjectId::Numeric(id.into())
    }
}

impl From<String> for SubjectId {
    fn from(id: String) -> Self {
        SubjectId::Text(id)
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        SubjectId::Text(id.to_string())
    }
}

/// Claims carried by access and refresh tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (principal id)
    pub sub: SubjectId,
    pub email: String,
    /// Free-form role label, e.g. "OWNER"
    pub role: String,
    /// "access" or "refresh"
    pub token_type: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl SessionClaims {
    pub(crate) fn new(
        kind: TokenKind,
        sub: SubjectId,
        email: &str,
        role: &str,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub,
            email: email.to_string(),
            role: role.to_string(),
            token_type: kind.as_claim().to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at(issued_at, ttl),
        }
    }

    /// Same principal, re-stamped for another kind and time
    pub(crate) fn reissue(&self, kind: TokenKind, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self::new(kind, self.sub.clone(), &self.email, &self.role, issued_at, ttl)
    }
}

/// Claims carried by password-reset tokens. No subject id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetClaims {
    pub email: String,
    pub role: String,
    /// Always "password_reset"
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
}

impl ResetClaims {
    pub(crate) fn new(email: &str, role: &str, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            email: email.to_string(),
            role: role.to_string(),
            token_type: TokenKind::PasswordReset.as_claim().to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at(issued_at, ttl),
        }
    }
}

/// Unix expiry for a token issued at `issued_at`, clamped to chrono's range
fn expires_at(issued_at: DateTime<Utc>, ttl: Duration) -> i64 {
    issued_at
        .checked_add_signed(ttl)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
        .timestamp()
}

/// Claims with a kind tag and expiry, checked uniformly on verification
pub(crate) trait KindedClaims {
    fn token_type(&self) -> &str;
    fn exp(&self) -> i64;
}

impl KindedClaims for SessionClaims {
    fn token_type(&self) -> &str {
        &self.token_type
    }

    fn exp(&self) -> i64 {
        self.exp
    }
}

impl KindedClaims for ResetClaims {
    fn token_type(&self) -> &str {
        &self.token_type
    }

    fn exp(&self) -> i64 {
        self.exp
    }
}

/// Pair returned by session issuance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// What a verified reset token yields to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetIdentity {
    pub email: String,
}
