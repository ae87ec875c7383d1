use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;

mod claims;
pub(crate) mod extractors;
pub mod gateway;
pub mod handlers;
pub mod jwt;
pub mod repo_types;

pub use extractors::{AuthUser, MaybeAuthUser};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// Trusted identity produced by the gateway. The role is resolved once at the
/// gateway; nothing downstream compares emails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owner-or-admin predicate used by every mutation on user content.
    pub fn can_manage(&self, owner_id: Option<Uuid>) -> bool {
        self.is_admin() || owner_id == Some(self.user_id)
    }

    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or(&self.email)
                .to_string(),
        }
    }
}

pub fn router() -> Router<AppState> {
    handlers::me_routes()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn user(email: &str) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            email: email.into(),
            name: None,
            role: Role::User,
        }
    }

    pub fn admin() -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            email: "admin@recipe.com".into(),
            name: Some("Admin".into()),
            role: Role::Admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn display_name_falls_back_to_email_local_part() {
        let u = user("lan.nguyen@example.com");
        assert_eq!(u.display_name(), "lan.nguyen");
        assert_eq!(admin().display_name(), "Admin");
    }

    #[test]
    fn owner_or_admin_can_manage() {
        let owner = user("a@example.com");
        let other = user("b@example.com");
        assert!(owner.can_manage(Some(owner.user_id)));
        assert!(!other.can_manage(Some(owner.user_id)));
        assert!(!other.can_manage(None));
        assert!(admin().can_manage(Some(owner.user_id)));
    }
}
