//! Staff password sign-in.
//!
//! # Purpose
//! The catalog knows one staff account per elevated role, each a username and
//! a bcrypt hash taken from [`SessionConfig`]. A matching password mints a
//! session token for that account's role.
//!
//! # Key invariants
//! - Unknown usernames and wrong passwords fail with the same error.
//! - An account without a configured hash can never sign in.
//! - bcrypt runs on the blocking pool, never on a runtime worker.
use super::resolver::SECURE_COOKIE_PREFIX;
use super::session::{SessionError, SessionKeys, SessionSubject, mint_session_token};
use crate::config::SessionConfig;
use luxe_authz::Role;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Clone)]
struct StaffAccount {
    username: String,
    password_hash: String,
    role: Role,
}

/// Accounts allowed to sign in with a password.
#[derive(Clone, Default)]
pub struct StaffDirectory {
    accounts: Vec<StaffAccount>,
}

impl StaffDirectory {
    pub fn from_config(config: &SessionConfig) -> Self {
        let accounts = [
            (&config.admin_username, &config.admin_password_hash, Role::Admin),
            (
                &config.manager_username,
                &config.manager_password_hash,
                Role::Manager,
            ),
        ]
        .into_iter()
        .filter_map(|(username, hash, role)| {
            Some(StaffAccount {
                username: username.clone(),
                password_hash: hash.clone()?,
                role,
            })
        })
        .collect();
        Self { accounts }
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Role `username` signs in as when `password` matches its hash.
    pub async fn verify(&self, username: &str, password: &str) -> Result<Role, LoginError> {
        let Some(account) = self
            .accounts
            .iter()
            .find(|account| account.username == username)
        else {
            return Err(LoginError::InvalidCredentials);
        };
        let hash = account.password_hash.clone();
        let password = password.to_string();
        match tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await {
            Ok(Ok(true)) => Ok(account.role),
            Ok(Ok(false)) => Err(LoginError::InvalidCredentials),
            Ok(Err(err)) => {
                tracing::error!(role = account.role.as_str(), error = %err, "stored password hash is unusable");
                Err(LoginError::InvalidCredentials)
            }
            Err(err) => {
                tracing::error!(error = %err, "password check did not complete");
                Err(LoginError::InvalidCredentials)
            }
        }
    }
}

impl std::fmt::Debug for StaffDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let accounts: Vec<_> = self
            .accounts
            .iter()
            .map(|account| (account.username.as_str(), account.role.as_str()))
            .collect();
        f.debug_struct("StaffDirectory")
            .field("accounts", &accounts)
            .finish()
    }
}

/// A session minted by a successful sign-in.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub subject: String,
    pub role: Role,
    pub expires_in: Duration,
}

pub async fn sign_in(
    keys: &SessionKeys,
    staff: &StaffDirectory,
    username: &str,
    password: &str,
) -> Result<IssuedSession, LoginError> {
    let role = staff.verify(username, password).await?;
    let expires_in = keys.max_ttl();
    let token = mint_session_token(
        keys,
        SessionSubject {
            sub: username.to_string(),
            email: None,
            name: Some(display_name(role).to_string()),
            role,
        },
        expires_in,
    )?;
    Ok(IssuedSession {
        token,
        subject: username.to_string(),
        role,
        expires_in,
    })
}

fn display_name(role: Role) -> &'static str {
    match role {
        Role::Admin => "Admin",
        Role::Manager => "Manager",
    }
}

/// `Set-Cookie` value carrying `token`. Secure cookies take the `__Secure-`
/// name the resolver prefers.
pub fn session_set_cookie(name: &str, token: &str, max_age: Duration, secure: bool) -> String {
    if secure {
        format!(
            "{SECURE_COOKIE_PREFIX}{name}={token}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax; Secure",
            max_age.as_secs()
        )
    } else {
        format!(
            "{name}={token}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            max_age.as_secs()
        )
    }
}

/// `Set-Cookie` value that expires the session cookie.
pub fn session_clear_cookie(name: &str, secure: bool) -> String {
    session_set_cookie(name, "", Duration::ZERO, secure)
}
