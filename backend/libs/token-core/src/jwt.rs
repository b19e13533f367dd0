/// Token issuance and verification
///
/// Mints and verifies three kinds of HS256 JWTs, each under its own secret and
/// lifetime:
///
/// - **access**: short-lived session credential
/// - **refresh**: long-lived credential used to obtain new access tokens
/// - **password_reset**: single-purpose credential embedded in reset links
///
/// ## Security Design
///
/// - **HS256 only**: the validator accepts no other algorithm
/// - **Independent secrets**: one key per kind, plus a `token_type` claim so a
///   token never verifies as another kind even if two secrets collide
/// - **Opaque failures**: every verification failure collapses into one
///   "invalid or expired" error; the cause is only logged
/// - **Immutable keys**: built once from [`TokenSettings`] and shared behind an
///   `Arc`, safe for any number of concurrent callers
///
/// ## Usage
///
/// ```no_run
/// use token_core::{TokenService, TokenSettings};
///
/// # async fn run() -> anyhow::Result<()> {
/// let service = TokenService::new(TokenSettings::from_env()?);
///
/// let tokens = service.issue_session_tokens(42, "u@x.com", "OWNER").await?;
/// let claims = service.verify_access_token(&tokens.access_token)?;
/// assert_eq!(claims.email, "u@x.com");
/// # Ok(())
/// # }
/// ```
use crate::claims::{
    KindedClaims, ResetClaims, ResetIdentity, SessionClaims, SessionTokens, SubjectId, TokenKind,
};
use crate::clock::{Clock, SystemClock};
use crate::config::TokenSettings;
use crate::error::{Result, TokenError};
use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tokio::task::JoinError;
use tracing::{debug, error, warn};

// ============================================================================
// Constants
// ============================================================================

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;
const BEARER: &str = "Bearer";

// ============================================================================
// Key Storage
// ============================================================================

struct KindKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl KindKeys {
    fn from_secret(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

/// One key set per token kind. Never mutated after construction.
struct KeyRing {
    access: KindKeys,
    refresh: KindKeys,
    password_reset: KindKeys,
    validation: Validation,
}

impl KeyRing {
    fn new(settings: &TokenSettings) -> Self {
        // Expiry is checked against the service clock, not jsonwebtoken's.
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat"]);

        Self {
            access: KindKeys::from_secret(&settings.access.secret, settings.access.ttl),
            refresh: KindKeys::from_secret(&settings.refresh.secret, settings.refresh.ttl),
            password_reset: KindKeys::from_secret(
                &settings.password_reset.secret,
                settings.password_reset.ttl,
            ),
            validation,
        }
    }

    fn get(&self, kind: TokenKind) -> &KindKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
            TokenKind::PasswordReset => &self.password_reset,
        }
    }

    fn sign<T: Serialize>(
        &self,
        kind: TokenKind,
        claims: &T,
    ) -> std::result::Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::new(JWT_ALGORITHM), claims, &self.get(kind).encoding)
    }
}

/// Why a blocking signing step produced no token
#[derive(Debug, thiserror::Error)]
enum SigningFailure {
    #[error("signing task did not complete: {0}")]
    Task(#[from] JoinError),
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

// ============================================================================
// Service
// ============================================================================

/// Stateless token minting and verification
#[derive(Clone)]
pub struct TokenService {
    keys: Arc<KeyRing>,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(settings: TokenSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    /// Build a service whose notion of "now" comes from `clock`
    pub fn with_clock(settings: TokenSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            keys: Arc::new(KeyRing::new(&settings)),
            clock,
        }
    }

    /// Load settings from the environment and build a service
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(TokenSettings::from_env()?))
    }

    /// Configured lifetime for `kind`
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        self.keys.get(kind).ttl
    }

    // ------------------------------------------------------------------------
    // Token Generation
    // ------------------------------------------------------------------------

    /// Mint an access/refresh pair for an authenticated principal
    ///
    /// Both tokens are signed concurrently on blocking tasks. Either both are
    /// returned or the call fails with [`TokenError::GenerationFailed`]; the
    /// underlying cause is logged, not returned.
    pub async fn issue_session_tokens(
        &self,
        subject: impl Into<SubjectId>,
        email: &str,
        role: &str,
    ) -> Result<SessionTokens> {
        let now = self.clock.now();
        let subject = subject.into();

        let access_claims = SessionClaims::new(
            TokenKind::Access,
            subject.clone(),
            email,
            role,
            now,
            self.keys.access.ttl,
        );
        let refresh_claims = SessionClaims::new(
            TokenKind::Refresh,
            subject,
            email,
            role,
            now,
            self.keys.refresh.ttl,
        );

        let (access, refresh) = tokio::join!(
            self.sign_blocking(TokenKind::Access, access_claims),
            self.sign_blocking(TokenKind::Refresh, refresh_claims),
        );

        self.assemble_pair(access, refresh)
    }

    /// Mint a password-reset token scoped to `email` and `role`
    ///
    /// Signing errors propagate as [`TokenError::Signing`].
    pub fn issue_reset_token(&self, email: &str, role: &str) -> Result<String> {
        let claims = ResetClaims::new(email, role, self.clock.now(), self.keys.password_reset.ttl);

        self.keys
            .sign(TokenKind::PasswordReset, &claims)
            .map_err(|e| {
                error!(error = %e, "Failed to sign password reset token");
                TokenError::from(e)
            })
    }

    /// Exchange a valid refresh token for a fresh access token
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<String> {
        let claims = self.verify_refresh_token(refresh_token)?;
        let access = claims.reissue(TokenKind::Access, self.clock.now(), self.keys.access.ttl);

        self.sign_blocking(TokenKind::Access, access)
            .await
            .map_err(|cause| {
                error!(kind = %TokenKind::Access, error = %cause, "Failed to refresh access token");
                TokenError::GenerationFailed
            })
    }

    async fn sign_blocking<T>(
        &self,
        kind: TokenKind,
        claims: T,
    ) -> std::result::Result<String, SigningFailure>
    where
        T: Serialize + Send + 'static,
    {
        let keys = Arc::clone(&self.keys);
        let token = tokio::task::spawn_blocking(move || keys.sign(kind, &claims)).await??;
        Ok(token)
    }

    fn assemble_pair(
        &self,
        access: std::result::Result<String, SigningFailure>,
        refresh: std::result::Result<String, SigningFailure>,
    ) -> Result<SessionTokens> {
        match (access, refresh) {
            (Ok(access_token), Ok(refresh_token)) => Ok(SessionTokens {
                access_token,
                refresh_token,
                token_type: BEARER.to_string(),
                expires_in: self.keys.access.ttl.num_seconds(),
            }),
            (access, refresh) => {
                for (kind, outcome) in [(TokenKind::Access, access), (TokenKind::Refresh, refresh)] {
                    if let Err(cause) = outcome {
                        error!(kind = %kind, error = %cause, "Failed to sign session token");
                    }
                }
                Err(TokenError::GenerationFailed)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Token Validation
    // ------------------------------------------------------------------------

    /// Verify a reset token and return the email it was issued for
    ///
    /// The embedded role is not returned and not cross-checked.
    pub fn verify_reset_token(&self, token: &str) -> Result<ResetIdentity> {
        let claims: ResetClaims = self.verify(TokenKind::PasswordReset, token)?;
        Ok(ResetIdentity {
            email: claims.email,
        })
    }

    pub fn verify_access_token(&self, token: &str) -> Result<SessionClaims> {
        self.verify(TokenKind::Access, token)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<SessionClaims> {
        self.verify(TokenKind::Refresh, token)
    }

    /// Signature, kind and expiry checks shared by every kind
    fn verify<T>(&self, kind: TokenKind, token: &str) -> Result<T>
    where
        T: DeserializeOwned + KindedClaims,
    {
        let data = decode::<T>(token, &self.keys.get(kind).decoding, &self.keys.validation)
            .map_err(|e| {
                debug!(kind = %kind, error = %e, "Token rejected");
                TokenError::invalid(kind)
            })?;

        if data.claims.token_type() != kind.as_claim() {
            warn!(
                expected = %kind,
                actual = data.claims.token_type(),
                "Token presented as the wrong kind"
            );
            return Err(TokenError::invalid(kind));
        }

        let now = self.clock.now().timestamp();
        if now >= data.claims.exp() {
            debug!(kind = %kind, exp = data.claims.exp(), now, "Token expired");
            return Err(TokenError::invalid(kind));
        }

        Ok(data.claims)
    }
}

// ============================================================================
// Tests
// ============================================================================
