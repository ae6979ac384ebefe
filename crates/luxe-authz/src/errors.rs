use crate::{Action, Role};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("invalid role: {0}")]
    InvalidRole(String),
    #[error("role {role} may not perform {action}")]
    Forbidden { role: Role, action: Action },
}

pub type AuthzResult<T> = Result<T, AuthzError>;
