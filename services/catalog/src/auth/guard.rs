//! Handler-side authorization guards.
//!
//! Every privileged handler calls one of these before touching the store or
//! the media backend: missing evidence is a 401, a role the permission matrix
//! does not allow is a 403.
use super::resolver::{AuthChannel, AuthContext};
use crate::api::error::{ApiError, api_forbidden, api_unauthorized};
use crate::app::AppState;
use axum::http::HeaderMap;
use luxe_authz::{Action, Role, authorize};

/// A caller with a verified elevated role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub role: Role,
    pub subject: String,
    pub channel: AuthChannel,
}

impl Actor {
    pub fn from_context(context: AuthContext) -> Option<Self> {
        Some(Self {
            role: context.role?,
            subject: context.subject.unwrap_or_default(),
            channel: context.channel,
        })
    }
}

/// Resolve the caller or fail with 401.
pub fn require_actor(state: &AppState, headers: &HeaderMap) -> Result<Actor, ApiError> {
    let context = state.auth.resolve(headers);
    Actor::from_context(context).ok_or_else(|| api_unauthorized("authentication required"))
}

/// Resolve the caller and check `action` against the permission matrix.
pub fn require_permission(
    state: &AppState,
    headers: &HeaderMap,
    action: Action,
) -> Result<Actor, ApiError> {
    let actor = require_actor(state, headers)?;
    if let Err(err) = authorize(actor.role, action) {
        tracing::info!(subject = %actor.subject, %action, "permission denied");
        return Err(api_forbidden(&err.to_string()));
    }
    Ok(actor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_requires_a_role() {
        assert!(Actor::from_context(AuthContext::anonymous()).is_none());
        let actor = Actor::from_context(AuthContext {
            role: Some(Role::Admin),
            subject: None,
            email: None,
            channel: AuthChannel::Cookie,
        })
        .expect("actor");
        assert_eq!(actor.role, Role::Admin);
        assert_eq!(actor.subject, "");
    }
}
