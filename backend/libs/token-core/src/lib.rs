//! Token Core
//!
//! Issues and verifies the signed, time-boxed tokens used by the recruitment
//! platform: session access tokens, session refresh tokens, and password-reset
//! tokens. Each kind has its own secret and lifetime.
//!
//! ## Modules
//!
//! - `claims`: token payloads and kinds
//! - `clock`: injectable time source
//! - `config`: per-kind secrets and TTLs
//! - `error`: error types
//! - `jwt`: the token service
pub mod claims;
pub mod clock;
pub mod config;
pub mod error;
pub mod jwt;

pub use claims::{ResetClaims, ResetIdentity, SessionClaims, SessionTokens, SubjectId, TokenKind};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{TokenPolicy, TokenSettings};
pub use error::{Result, TokenError};
pub use jwt::TokenService;
