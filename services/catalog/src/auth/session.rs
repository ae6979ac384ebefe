//! Session token minting and verification.
//!
//! # Purpose
//! Admin sessions are HS256 JWTs signed with the deployment's shared session
//! secret. `POST /api/auth/login` mints them after a password check; any
//! service holding the same secret may mint them too.
//!
//! # Key invariants
//! - Only HS256 is accepted; `alg` substitution fails verification.
//! - `iss`, `aud` and `exp` are mandatory and validated (with configured leeway).
//! - The `role` claim must be a known elevated role, otherwise decoding fails.
//! - Tokens issued for longer than the configured session TTL are refused,
//!   even when still unexpired.
use crate::config::SessionConfig;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use luxe_authz::Role;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("session lifetime {lifetime}s exceeds {max}s")]
    Lifetime { lifetime: i64, max: u64 },
}

/// Who a minted token is for.
#[derive(Debug, Clone)]
pub struct SessionSubject {
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Role,
}

/// Key material and validation settings derived from [`SessionConfig`].
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    leeway_secs: u64,
    max_ttl_secs: u64,
}

impl SessionKeys {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            leeway_secs: config.leeway_secs,
            max_ttl_secs: config.ttl_secs,
        }
    }
}

impl SessionKeys {
    /// Longest session lifetime the catalog accepts, and the one it issues.
    pub fn max_ttl(&self) -> Duration {
        Duration::from_secs(self.max_ttl_secs)
    }
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway_secs", &self.leeway_secs)
            .field("max_ttl_secs", &self.max_ttl_secs)
            .finish_non_exhaustive()
    }
}

pub fn mint_session_token(
    keys: &SessionKeys,
    subject: SessionSubject,
    ttl: Duration,
) -> Result<String, SessionError> {
    let now = now_epoch_seconds();
    let claims = SessionClaims {
        iss: keys.issuer.clone(),
        aud: keys.audience.clone(),
        sub: subject.sub,
        email: subject.email,
        name: subject.name,
        role: subject.role,
        exp: now + ttl.as_secs() as i64,
        iat: now,
    };
    Ok(jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &keys.encoding,
    )?)
}

pub fn verify_session_token(keys: &SessionKeys, token: &str) -> Result<SessionClaims, SessionError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[keys.issuer.as_str()]);
    validation.set_audience(&[keys.audience.as_str()]);
    validation.set_required_spec_claims(&["exp", "iss", "aud"]);
    validation.leeway = keys.leeway_secs;
    let data = jsonwebtoken::decode::<SessionClaims>(token, &keys.decoding, &validation)?;
    let lifetime = data.claims.exp.saturating_sub(data.claims.iat);
    if lifetime > keys.max_ttl_secs.saturating_add(keys.leeway_secs) as i64 {
        return Err(SessionError::Lifetime {
            lifetime,
            max: keys.max_ttl_secs,
        });
    }
    Ok(data.claims)
}

fn now_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
pub(crate) fn test_session_config(secret: &str) -> SessionConfig {
    SessionConfig {
        secret: secret.to_string(),
        issuer: "luxe-identity".to_string(),
        audience: "luxe-catalog".to_string(),
        cookie_name: "luxe.session-token".to_string(),
        leeway_secs: 0,
        ttl_secs: 3600,
        admin_username: "admin".to_string(),
        admin_password_hash: None,
        manager_username: "manager".to_string(),
        manager_password_hash: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(secret: &str) -> SessionKeys {
        SessionKeys::from_config(&test_session_config(secret))
    }

    fn subject(role: Role) -> SessionSubject {
        SessionSubject {
            sub: "user-1".to_string(),
            email: Some("ops@luxe.test".to_string()),
            name: None,
            role,
        }
    }

    #[test]
    fn mint_then_verify_returns_claims() {
        let keys = keys("0123456789abcdef-secret");
        let token =
            mint_session_token(&keys, subject(Role::Manager), Duration::from_secs(60)).expect("mint");
        let claims = verify_session_token(&keys, &token).expect("verify");
        assert_eq!(claims.role, Role::Manager);
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email.as_deref(), Some("ops@luxe.test"));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = mint_session_token(
            &keys("0123456789abcdef-secret"),
            subject(Role::Admin),
            Duration::from_secs(60),
        )
        .expect("mint");
        assert!(verify_session_token(&keys("another-secret-entirely"), &token).is_err());
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let signer = keys("0123456789abcdef-secret");
        let token =
            mint_session_token(&signer, subject(Role::Admin), Duration::from_secs(60)).expect("mint");
        let mut config = test_session_config("0123456789abcdef-secret");
        config.audience = "someone-else".to_string();
        let verifier = SessionKeys::from_config(&config);
        assert!(verify_session_token(&verifier, &token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = keys("0123456789abcdef-secret");
        let now = now_epoch_seconds();
        let claims = SessionClaims {
            iss: "luxe-identity".to_string(),
            aud: "luxe-catalog".to_string(),
            sub: "user-1".to_string(),
            email: None,
            name: None,
            role: Role::Admin,
            exp: now - 120,
            iat: now - 240,
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .expect("encode");
        assert!(verify_session_token(&keys, &token).is_err());
    }

    #[test]
    fn overlong_session_is_rejected() {
        let keys = keys("0123456789abcdef-secret");
        let token = mint_session_token(&keys, subject(Role::Admin), Duration::from_secs(7200))
            .expect("mint");
        let err = verify_session_token(&keys, &token).expect_err("too long");
        assert!(matches!(err, SessionError::Lifetime { max: 3600, .. }));
    }

    #[test]
    fn unknown_role_claim_is_rejected() {
        let keys = keys("0123456789abcdef-secret");
        let now = now_epoch_seconds();
        let claims = serde_json::json!({
            "iss": "luxe-identity", "aud": "luxe-catalog", "sub": "u",
            "role": "superuser", "exp": now + 60, "iat": now
        });
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .expect("encode");
        assert!(verify_session_token(&keys, &token).is_err());
    }

    #[test]
    fn debug_output_hides_key_material() {
        let rendered = format!("{:?}", keys("0123456789abcdef-secret"));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("luxe-catalog"));
    }
}
