//! Luxe role and permission primitives shared by catalog services.
//!
//! # Purpose
//! Centralizes the role model and the role → action permission matrix so every
//! endpoint asks the same question ("may this role perform this action?")
//! instead of comparing role strings inline.
//!
//! # Key invariants
//! - Exactly two elevated roles exist: `admin` and `manager`.
//! - Reads of published listings are not actions; they need no role.
//! - The matrix in [`Role::permits`] is the only place a role gains an action.
//!
//! # Examples
//! ```rust
//! use luxe_authz::{Action, Role};
//!
//! assert!(Role::Manager.permits(Action::ListingWrite));
//! assert!(!Role::Manager.permits(Action::StatsView));
//! assert!(Role::Admin.permits(Action::StatsView));
//! ```

mod action;
mod errors;
mod role;

pub use action::Action;
pub use errors::{AuthzError, AuthzResult};
pub use role::Role;

/// Check that `role` may perform `action`.
///
/// # Errors
/// - [`AuthzError::Forbidden`] when the matrix does not grant the action.
pub fn authorize(role: Role, action: Action) -> AuthzResult<()> {
    if role.permits(action) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden { role, action })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_maps_matrix_to_result() {
        assert!(authorize(Role::Admin, Action::StatsView).is_ok());
        let err = authorize(Role::Manager, Action::StatsView).expect_err("denied");
        assert!(matches!(
            err,
            AuthzError::Forbidden {
                role: Role::Manager,
                action: Action::StatsView
            }
        ));
    }
}
