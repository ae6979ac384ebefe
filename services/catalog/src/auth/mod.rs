//! Authentication and authorization for the catalog API.
//!
//! # Purpose
//! - [`session`]: HS256 session token minting/verification.
//! - [`login`]: staff password sign-in backed by bcrypt hashes.
//! - [`resolver`]: turns request credentials into an [`resolver::AuthContext`].
//! - [`guard`]: handler helpers that enforce the `luxe-authz` permission matrix.
pub mod guard;
pub mod login;
pub mod resolver;
pub mod session;

pub use guard::{Actor, require_actor, require_permission};
pub use login::{IssuedSession, LoginError, StaffDirectory};
pub use resolver::{AuthChannel, AuthContext, Authenticator};
pub use session::{
    SessionClaims, SessionError, SessionKeys, SessionSubject, mint_session_token,
    verify_session_token,
};
