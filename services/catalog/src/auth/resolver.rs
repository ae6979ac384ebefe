//! Request credential resolution.
//!
//! # Purpose
//! Turns the credentials on a request into an [`AuthContext`]. Evidence is
//! tried in a fixed order:
//! 1. `Authorization: Bearer <session token>`
//! 2. the session cookie (configured name, or its `__Secure-` variant)
//! 3. development bypass, only when enabled outside production
//!
//! The `X-Session-Data` header is a client-asserted hint. It never grants a
//! role; when it disagrees with a verified token the disagreement is logged.
//!
//! # Key invariants
//! - Resolution never fails; missing or invalid evidence yields an anonymous context.
//! - Invalid tokens on one channel fall through to the next channel.
use super::login::{
    IssuedSession, LoginError, StaffDirectory, session_clear_cookie, session_set_cookie, sign_in,
};
use super::session::{SessionKeys, verify_session_token};
use crate::observability::AUTH_OUTCOMES;
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use luxe_authz::{AuthzResult, Role};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const SESSION_DATA_HEADER: &str = "x-session-data";
pub(crate) const SECURE_COOKIE_PREFIX: &str = "__Secure-";

/// Evidence channel that produced an [`AuthContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuthChannel {
    Bearer,
    Cookie,
    DevBypass,
    None,
}

impl AuthChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthChannel::Bearer => "bearer",
            AuthChannel::Cookie => "cookie",
            AuthChannel::DevBypass => "dev_bypass",
            AuthChannel::None => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub role: Option<Role>,
    pub subject: Option<String>,
    pub email: Option<String>,
    pub channel: AuthChannel,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self {
            role: None,
            subject: None,
            email: None,
            channel: AuthChannel::None,
        }
    }

    pub fn authenticated(&self) -> bool {
        self.role.is_some()
    }
}

/// Client-asserted session summary carried in `X-Session-Data`.
#[derive(Debug, Clone, Deserialize)]
struct SessionHint {
    role: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Authenticator {
    keys: SessionKeys,
    cookie_name: String,
    dev_bypass: bool,
    staff: StaffDirectory,
    secure_cookies: bool,
}

impl Authenticator {
    /// `dev_bypass` must already account for the environment; see
    /// `CatalogConfig::dev_bypass_active`.
    pub fn new(keys: SessionKeys, cookie_name: impl Into<String>, dev_bypass: bool) -> Self {
        Self {
            keys,
            cookie_name: cookie_name.into(),
            dev_bypass,
            staff: StaffDirectory::default(),
            secure_cookies: false,
        }
    }

    /// Accounts allowed to sign in with a password. None by default.
    pub fn with_staff(mut self, staff: StaffDirectory) -> Self {
        self.staff = staff;
        self
    }

    /// Issue `Secure` cookies under the `__Secure-` name. Production only.
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    pub fn keys(&self) -> &SessionKeys {
        &self.keys
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedSession, LoginError> {
        sign_in(&self.keys, &self.staff, username, password).await
    }

    pub fn set_cookie(&self, session: &IssuedSession) -> String {
        session_set_cookie(
            &self.cookie_name,
            &session.token,
            session.expires_in,
            self.secure_cookies,
        )
    }

    pub fn clear_cookie(&self) -> String {
        session_clear_cookie(&self.cookie_name, self.secure_cookies)
    }

    pub fn resolve(&self, headers: &HeaderMap) -> AuthContext {
        let context = self
            .from_token(extract_bearer(headers), AuthChannel::Bearer)
            .or_else(|| {
                self.from_token(
                    session_cookie(headers, &self.cookie_name),
                    AuthChannel::Cookie,
                )
            })
            .or_else(|| self.dev_bypass_context())
            .unwrap_or_else(AuthContext::anonymous);

        check_session_hint(headers, &context);
        metrics::counter!(AUTH_OUTCOMES, "channel" => context.channel.as_str()).increment(1);
        context
    }

    fn from_token(&self, token: Option<&str>, channel: AuthChannel) -> Option<AuthContext> {
        let token = token?;
        match verify_session_token(&self.keys, token) {
            Ok(claims) => Some(AuthContext {
                role: Some(claims.role),
                subject: Some(claims.sub),
                email: claims.email,
                channel,
            }),
            Err(err) => {
                tracing::debug!(channel = channel.as_str(), error = %err, "session token rejected");
                None
            }
        }
    }

    fn dev_bypass_context(&self) -> Option<AuthContext> {
        if !self.dev_bypass {
            return None;
        }
        tracing::warn!("development auth bypass granted manager role");
        Some(AuthContext {
            role: Some(Role::Manager),
            subject: Some("dev-bypass".to_string()),
            email: None,
            channel: AuthChannel::DevBypass,
        })
    }
}

fn check_session_hint(headers: &HeaderMap, context: &AuthContext) {
    let Some(raw) = headers
        .get(SESSION_DATA_HEADER)
        .and_then(|value| value.to_str().ok())
    else {
        return;
    };
    let hint = match serde_json::from_str::<SessionHint>(raw) {
        Ok(hint) => hint,
        Err(err) => {
            tracing::debug!(error = %err, "ignoring malformed session data header");
            return;
        }
    };
    let Some(verified) = context.role else {
        tracing::debug!("ignoring session data header without a verified session");
        return;
    };
    let Some(claimed) = hint.role.as_deref() else {
        return;
    };
    match hint_agrees(claimed, verified) {
        Ok(true) => {}
        Ok(false) => tracing::warn!(
            claimed,
            verified = verified.as_str(),
            email = hint.email.as_deref().unwrap_or(""),
            "session data header disagrees with verified session"
        ),
        Err(err) => tracing::warn!(
            error = %err,
            verified = verified.as_str(),
            "session data header names an unknown role"
        ),
    }
}

/// Whether a client-claimed role matches the verified one.
fn hint_agrees(claimed: &str, verified: Role) -> AuthzResult<bool> {
    Ok(claimed.parse::<Role>()? == verified)
}

pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?;
    let value = value.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Session token from the `Cookie` header, preferring the `__Secure-` variant.
pub fn session_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let mut plain = None;
    for header in headers.get_all(COOKIE) {
        let Ok(header) = header.to_str() else {
            continue;
        };
        for pair in header.split(';') {
            let Some((key, value)) = pair.trim().split_once('=') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.trim().strip_prefix(SECURE_COOKIE_PREFIX) {
                Some(stripped) if stripped == name => return Some(value),
                None if key.trim() == name => plain = plain.or(Some(value)),
                _ => {}
            }
        }
    }
    plain
}
