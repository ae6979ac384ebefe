//! Elevated roles and the role → action matrix.
use crate::{Action, AuthzError};
use serde::{Deserialize, Serialize};

/// Role carried by a verified session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
        }
    }

    /// Permission matrix. Managers run the catalogs day to day; statistics
    /// are reserved for admins.
    pub fn permits(self, action: Action) -> bool {
        match (self, action) {
            (Role::Admin, _) => true,
            (Role::Manager, Action::ListingWrite | Action::MediaUpload) => true,
            (Role::Manager, Action::StatsView) => false,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = AuthzError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            other => Err(AuthzError::InvalidRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_is_exact() {
        assert_eq!("admin".parse::<Role>().ok(), Some(Role::Admin));
        assert_eq!("manager".parse::<Role>().ok(), Some(Role::Manager));
        assert!("Admin".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn admin_has_every_action() {
        for action in Action::ALL {
            assert!(Role::Admin.permits(action), "{action}");
        }
    }

    #[test]
    fn manager_matrix() {
        assert!(Role::Manager.permits(Action::ListingWrite));
        assert!(Role::Manager.permits(Action::MediaUpload));
        assert!(!Role::Manager.permits(Action::StatsView));
    }

    #[test]
    fn role_serde_is_lowercase() {
        let json = serde_json::to_string(&Role::Manager).expect("serialize");
        assert_eq!(json, "\"manager\"");
        let parsed: Role = serde_json::from_str("\"admin\"").expect("deserialize");
        assert_eq!(parsed, Role::Admin);
    }
}
