/// Integration tests for token-core
///
/// This test module covers:
/// - Session token issuance and per-kind verification
/// - Expiry boundaries under a controlled clock
/// - Reset token round trips and tampering
/// - Concurrent issuance without payload bleed
use chrono::{Duration, TimeZone, Utc};
use std::sync::{Arc, Once};
use token_core::{
    FixedClock, SubjectId, TokenError, TokenKind, TokenPolicy, TokenService, TokenSettings,
};

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("token_core=debug")
            .with_test_writer()
            .try_init();
    });
}

fn service() -> TokenService {
    init_tracing();
    TokenService::new(TokenSettings::default())
}

fn clocked_service(settings: TokenSettings) -> (TokenService, Arc<FixedClock>) {
    init_tracing();
    let start = Utc.with_ymd_and_hms(2024, 6, 3, 10, 30, 0).unwrap();
    let clock = Arc::new(FixedClock::new(start));
    (TokenService::with_clock(settings, clock.clone()), clock)
}

/// Decode the payload segment without verifying, to inspect what was signed
fn raw_payload(token: &str) -> serde_json::Value {
    use jsonwebtoken::{decode, DecodingKey, Validation};
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();
    decode::<serde_json::Value>(token, &DecodingKey::from_secret(b"unused"), &validation)
        .expect("payload should decode")
        .claims
}

// ============================================================================
// Session Token Tests
// ============================================================================

#[tokio::test]
async fn test_owner_scenario_decodes_under_both_kinds() {
    let service = service();
    let tokens = service
        .issue_session_tokens(42, "u@x.com", "OWNER")
        .await
        .expect("Should issue session tokens");

    for claims in [
        service.verify_access_token(&tokens.access_token).unwrap(),
        service.verify_refresh_token(&tokens.refresh_token).unwrap(),
    ] {
        assert_eq!(claims.sub, SubjectId::Numeric(42));
        assert_eq!(claims.email, "u@x.com");
        assert_eq!(claims.role, "OWNER");
    }

    assert_eq!(raw_payload(&tokens.access_token)["sub"], 42);
}

#[tokio::test]
async fn test_session_tokens_distinct_and_kind_bound() {
    let service = service();
    let tokens = service
        .issue_session_tokens("cand-77", "c@agency.io", "CANDIDATE")
        .await
        .unwrap();

    assert!(!tokens.access_token.is_empty());
    assert!(!tokens.refresh_token.is_empty());
    assert_ne!(tokens.access_token, tokens.refresh_token);

    let err = service
        .verify_refresh_token(&tokens.access_token)
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid or expired refresh token");

    let err = service
        .verify_access_token(&tokens.refresh_token)
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid or expired access token");
}

#[tokio::test]
async fn test_refresh_token_longer_expiry() {
    let service = service();
    let tokens = service
        .issue_session_tokens(1, "u@x.com", "admin")
        .await
        .unwrap();

    let access = service.verify_access_token(&tokens.access_token).unwrap();
    let refresh = service.verify_refresh_token(&tokens.refresh_token).unwrap();

    assert!(refresh.exp > access.exp);
    assert_eq!(access.exp - access.iat, 15 * 60);
    assert_eq!(refresh.exp - refresh.iat, 7 * 24 * 3600);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_issuance_keeps_payloads_apart() {
    let service = service();

    let calls = (0..200i64).map(|id| {
        let service = service.clone();
        async move {
            let email = format!("user{id}@x.com");
            let role = if id % 2 == 0 { "OWNER" } else { "TENANT" };
            let tokens = service.issue_session_tokens(id, &email, role).await?;
            Ok::<_, TokenError>((id, email, role, tokens))
        }
    });

    for outcome in futures::future::join_all(calls).await {
        let (id, email, role, tokens) = outcome.expect("issuance should succeed");
        for claims in [
            service.verify_access_token(&tokens.access_token).unwrap(),
            service.verify_refresh_token(&tokens.refresh_token).unwrap(),
        ] {
            assert_eq!(claims.sub, SubjectId::Numeric(id));
            assert_eq!(claims.email, email);
            assert_eq!(claims.role, role);
        }
    }
}

// ============================================================================
// Expiry Tests
// ============================================================================

#[tokio::test]
async fn test_access_token_expiry_boundary() {
    let (service, clock) = clocked_service(TokenSettings::default());
    let tokens = service
        .issue_session_tokens(5, "u@x.com", "OWNER")
        .await
        .unwrap();
    let ttl = service.ttl(TokenKind::Access);

    clock.advance(ttl - Duration::seconds(1));
    assert!(service.verify_access_token(&tokens.access_token).is_ok());

    clock.advance(Duration::seconds(2));
    assert!(service.verify_access_token(&tokens.access_token).is_err());

    // Refresh token outlives the access token
    assert!(service.verify_refresh_token(&tokens.refresh_token).is_ok());
}

#[test]
fn test_reset_token_expiry_boundary_with_custom_ttl() {
    let mut settings = TokenSettings::default();
    settings.password_reset = TokenPolicy::new("resetSecret", Duration::minutes(30));
    let (service, clock) = clocked_service(settings);

    let token = service.issue_reset_token("a@b.com", "TENANT").unwrap();

    clock.advance(Duration::minutes(30) - Duration::seconds(1));
    assert!(service.verify_reset_token(&token).is_ok());

    clock.advance(Duration::seconds(2));
    let err = service.verify_reset_token(&token).unwrap_err();
    assert_eq!(err.to_string(), "invalid or expired reset token");
}

#[tokio::test]
async fn test_refresh_token_expiry_boundary() {
    let (service, clock) = clocked_service(TokenSettings::default());
    let tokens = service
        .issue_session_tokens(9, "u@x.com", "OWNER")
        .await
        .unwrap();

    clock.advance(Duration::days(7) - Duration::seconds(1));
    assert!(service.refresh_access_token(&tokens.refresh_token).await.is_ok());

    clock.advance(Duration::seconds(2));
    let err = service
        .refresh_access_token(&tokens.refresh_token)
        .await
        .unwrap_err();
    assert!(err.is_verification_failure());
}

// ============================================================================
// Reset Token Tests
// ============================================================================

#[test]
fn test_reset_round_trip_returns_email() {
    let service = service();
    let token = service.issue_reset_token("a@b.com", "TENANT").unwrap();

    let identity = service.verify_reset_token(&token).unwrap();
    assert_eq!(identity.email, "a@b.com");

    let payload = raw_payload(&token);
    assert!(payload.get("sub").is_none());
    assert_eq!(payload["role"], "TENANT");
}

#[test]
fn test_tampering_any_byte_is_normalized() {
    let service = service();
    let token = service.issue_reset_token("a@b.com", "TENANT").unwrap();

    for (index, original) in token.char_indices() {
        if original == '.' {
            continue;
        }
        let replacement = if original == 'A' { 'B' } else { 'A' };
        let mut tampered = token.clone();
        tampered.replace_range(index..index + 1, &replacement.to_string());

        let err = service
            .verify_reset_token(&tampered)
            .expect_err("tampered token must not verify");
        assert!(
            matches!(
                err,
                TokenError::InvalidOrExpired {
                    kind: TokenKind::PasswordReset
                }
            ),
            "unexpected error at byte {index}: {err:?}"
        );
    }
}

#[test]
fn test_garbage_inputs_are_normalized() {
    let service = service();
    for input in ["", "not-a-jwt", "a.b.c", "....", "eyJhbGciOiJub25lIn0.e30."] {
        let err = service.verify_reset_token(input).unwrap_err();
        assert_eq!(err.to_string(), "invalid or expired reset token");
    }
}

#[test]
fn test_reset_token_rejected_by_session_verifiers() {
    let service = service();
    let token = service.issue_reset_token("a@b.com", "TENANT").unwrap();

    assert!(service.verify_access_token(&token).is_err());
    assert!(service.verify_refresh_token(&token).is_err());
}
