//! Token configuration
//!
//! Loads one secret and one TTL per token kind from:
//! 1. Environment variables
//! 2. .env file (local development)
//! 3. Built-in defaults when a key is absent or blank
//!
//! # Example
//!
//! ```no_run
//! use token_core::config::TokenSettings;
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = TokenSettings::from_env()?;
//!     println!("access TTL: {}s", settings.access.ttl.num_seconds());
//!     Ok(())
//! }
//! ```

use crate::claims::TokenKind;
use anyhow::{anyhow, Context, Result};
use chrono::Duration;
use std::env;
use std::fmt;
use tracing::{info, warn};

pub const ACCESS_TOKEN_SECRET: &str = "ACCESS_TOKEN_SECRET";
pub const ACCESS_TOKEN_TTL: &str = "ACCESS_TOKEN_TTL";
pub const REFRESH_TOKEN_SECRET: &str = "REFRESH_TOKEN_SECRET";
pub const REFRESH_TOKEN_TTL: &str = "REFRESH_TOKEN_TTL";
pub const RESET_TOKEN_SECRET: &str = "RESET_TOKEN_SECRET";
pub const RESET_TOKEN_TTL: &str = "RESET_TOKEN_TTL";

const DEFAULT_ACCESS_SECRET: &str = "secret";
const DEFAULT_ACCESS_TTL: &str = "15m";
const DEFAULT_REFRESH_SECRET: &str = "refreshSecret";
const DEFAULT_REFRESH_TTL: &str = "7d";
const DEFAULT_RESET_SECRET: &str = "resetSecret";
const DEFAULT_RESET_TTL: &str = "15m";

/// Longest accepted lifetime: 100 years
const MAX_TTL_SECONDS: i64 = 100 * 365 * 86_400;

/// Secret and lifetime for a single token kind
#[derive(Clone)]
pub struct TokenPolicy {
    pub secret: String,
    pub ttl: Duration,
}

impl TokenPolicy {
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }
}

impl fmt::Debug for TokenPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPolicy")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Per-kind token policies, read once at startup
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub access: TokenPolicy,
    pub refresh: TokenPolicy,
    pub password_reset: TokenPolicy,
}

impl TokenSettings {
    /// Load settings from the process environment
    pub fn from_env() -> Result<Self> {
        if cfg!(debug_assertions) && dotenvy::dotenv().is_ok() {
            info!("Loaded .env file for development");
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = Self {
            access: load_policy(
                &lookup,
                TokenKind::Access,
                (ACCESS_TOKEN_SECRET, DEFAULT_ACCESS_SECRET),
                (ACCESS_TOKEN_TTL, DEFAULT_ACCESS_TTL),
            )?,
            refresh: load_policy(
                &lookup,
                TokenKind::Refresh,
                (REFRESH_TOKEN_SECRET, DEFAULT_REFRESH_SECRET),
                (REFRESH_TOKEN_TTL, DEFAULT_REFRESH_TTL),
            )?,
            password_reset: load_policy(
                &lookup,
                TokenKind::PasswordReset,
                (RESET_TOKEN_SECRET, DEFAULT_RESET_SECRET),
                (RESET_TOKEN_TTL, DEFAULT_RESET_TTL),
            )?,
        };

        settings.warn_on_shared_secrets();
        Ok(settings)
    }

    pub fn policy(&self, kind: TokenKind) -> &TokenPolicy {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
            TokenKind::PasswordReset => &self.password_reset,
        }
    }

    /// Kinds whose configured secrets are identical
    pub fn shared_secrets(&self) -> Vec<(TokenKind, TokenKind)> {
        let mut shared = Vec::new();
        for (i, a) in TokenKind::ALL.iter().enumerate() {
            for b in &TokenKind::ALL[i + 1..] {
                if self.policy(*a).secret == self.policy(*b).secret {
                    shared.push((*a, *b));
                }
            }
        }
        shared
    }

    fn warn_on_shared_secrets(&self) {
        for (a, b) in self.shared_secrets() {
            warn!(
                first = %a,
                second = %b,
                "Token kinds share a signing secret; only the token_type claim keeps them apart"
            );
        }
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        let ttl = |s: &str| parse_ttl(s).unwrap_or_else(|_| Duration::minutes(15));
        Self {
            access: TokenPolicy::new(DEFAULT_ACCESS_SECRET, ttl(DEFAULT_ACCESS_TTL)),
            refresh: TokenPolicy::new(DEFAULT_REFRESH_SECRET, ttl(DEFAULT_REFRESH_TTL)),
            password_reset: TokenPolicy::new(DEFAULT_RESET_SECRET, ttl(DEFAULT_RESET_TTL)),
        }
    }
}

fn load_policy<F>(
    lookup: &F,
    kind: TokenKind,
    (secret_key, default_secret): (&str, &str),
    (ttl_key, default_ttl): (&str, &str),
) -> Result<TokenPolicy>
where
    F: Fn(&str) -> Option<String>,
{
    let secret = match non_blank(lookup(secret_key)) {
        Some(secret) => secret,
        None => {
            warn!(
                kind = %kind,
                key = secret_key,
                "Signing secret not configured; using built-in default"
            );
            default_secret.to_string()
        }
    };

    let ttl_raw = non_blank(lookup(ttl_key)).unwrap_or_else(|| default_ttl.to_string());
    let ttl = parse_ttl(&ttl_raw).with_context(|| format!("Invalid {ttl_key}"))?;

    Ok(TokenPolicy { secret, ttl })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse a lifetime such as `900`, `15m`, `7d`, `12 hours`.
///
/// A bare integer is seconds. Zero, negative values and anything longer than
/// 100 years are rejected.
pub fn parse_ttl(raw: &str) -> Result<Duration> {
    let trimmed = raw.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);

    let amount: i64 = digits
        .parse()
        .map_err(|_| anyhow!("expected a positive integer with optional unit, got {raw:?}"))?;
    if amount == 0 {
        return Err(anyhow!("TTL must be greater than zero, got {raw:?}"));
    }

    let unit_seconds: i64 = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600,
        "d" | "day" | "days" => 86_400,
        "w" | "week" | "weeks" => 604_800,
        other => return Err(anyhow!("unknown TTL unit {other:?} in {raw:?}")),
    };

    amount
        .checked_mul(unit_seconds)
        .filter(|seconds| *seconds <= MAX_TTL_SECONDS)
        .and_then(Duration::try_seconds)
        .ok_or_else(|| anyhow!("TTL out of range (max 100 years): {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_ttl_units() {
        assert_eq!(parse_ttl("900").unwrap(), Duration::seconds(900));
        assert_eq!(parse_ttl("30s").unwrap(), Duration::seconds(30));
        assert_eq!(parse_ttl("15m").unwrap(), Duration::minutes(15));
        assert_eq!(parse_ttl("1h").unwrap(), Duration::hours(1));
        assert_eq!(parse_ttl("7d").unwrap(), Duration::days(7));
        assert_eq!(parse_ttl("2w").unwrap(), Duration::weeks(2));
        assert_eq!(parse_ttl(" 12 Hours ").unwrap(), Duration::hours(12));
    }

    #[test]
    fn test_parse_ttl_rejects_garbage() {
        assert!(parse_ttl("").is_err());
        assert!(parse_ttl("m").is_err());
        assert!(parse_ttl("0").is_err());
        assert!(parse_ttl("-5m").is_err());
        assert!(parse_ttl("10 fortnights").is_err());
        assert!(parse_ttl("1.5h").is_err());
    }

    #[test]
    fn test_defaults_when_nothing_configured() {
        let settings = TokenSettings::from_lookup(|_| None).unwrap();

        assert_eq!(settings.access.secret, "secret");
        assert_eq!(settings.access.ttl, Duration::minutes(15));
        assert_eq!(settings.refresh.secret, "refreshSecret");
        assert_eq!(settings.refresh.ttl, Duration::days(7));
        assert_eq!(settings.password_reset.secret, "resetSecret");
        assert_eq!(settings.password_reset.ttl, Duration::minutes(15));
        assert!(settings.shared_secrets().is_empty());
    }

    #[test]
    fn test_default_impl_matches_empty_lookup() {
        let from_lookup = TokenSettings::from_lookup(|_| None).unwrap();
        let default = TokenSettings::default();

        for kind in TokenKind::ALL {
            assert_eq!(default.policy(kind).secret, from_lookup.policy(kind).secret);
            assert_eq!(default.policy(kind).ttl, from_lookup.policy(kind).ttl);
        }
    }

    #[test]
    fn test_overrides_and_blank_values() {
        let settings = TokenSettings::from_lookup(lookup_from(&[
            (ACCESS_TOKEN_SECRET, "a-very-long-access-secret"),
            (ACCESS_TOKEN_TTL, "5m"),
            (REFRESH_TOKEN_SECRET, "   "),
            (RESET_TOKEN_TTL, "1h"),
        ]))
        .unwrap();

        assert_eq!(settings.access.secret, "a-very-long-access-secret");
        assert_eq!(settings.access.ttl, Duration::minutes(5));
        assert_eq!(settings.refresh.secret, "refreshSecret");
        assert_eq!(settings.password_reset.ttl, Duration::hours(1));
    }

    #[test]
    fn test_invalid_ttl_names_the_key() {
        let err = TokenSettings::from_lookup(lookup_from(&[(REFRESH_TOKEN_TTL, "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains(REFRESH_TOKEN_TTL));
    }

    #[test]
    fn test_parse_ttl_upper_bound() {
        assert_eq!(parse_ttl("5200w").unwrap(), Duration::weeks(5200));
        assert_eq!(parse_ttl("36500d").unwrap(), Duration::days(36_500));
        assert!(parse_ttl("36501d").is_err());
        assert!(parse_ttl("1000000000d").is_err());
        assert!(parse_ttl("99999999999999999999").is_err());
    }

    #[test]
    fn test_oversized_ttl_fails_at_load() {
        let err = TokenSettings::from_lookup(lookup_from(&[(RESET_TOKEN_TTL, "1000000000d")]))
            .unwrap_err();
        assert!(format!("{err:#}").contains(RESET_TOKEN_TTL));
    }

    #[test]
    fn test_shared_secrets_detected() {
        let settings = TokenSettings::from_lookup(lookup_from(&[
            (ACCESS_TOKEN_SECRET, "same"),
            (RESET_TOKEN_SECRET, "same"),
        ]))
        .unwrap();

        assert_eq!(
            settings.shared_secrets(),
            vec![(TokenKind::Access, TokenKind::PasswordReset)]
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let settings = TokenSettings::default();
        let debug = format!("{settings:?}");
        assert!(!debug.contains("refreshSecret"));
        assert!(debug.contains("<redacted>"));
    }
}
