//! Bearer credential to trusted [`Identity`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::{jwt::JwtKeys, Identity, Role};
use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    store::Store,
};

#[async_trait]
pub trait IdentityGateway: Send + Sync {
    async fn resolve(&self, bearer: &str) -> AppResult<Identity>;
}

/// Verifies tokens issued by the external identity provider and resolves the
/// admin role from the configured admin email.
pub struct JwtGateway {
    keys: JwtKeys,
    config: Arc<AppConfig>,
    store: Arc<dyn Store>,
}

impl JwtGateway {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn Store>) -> Self {
        Self {
            keys: JwtKeys::from(&config.jwt),
            config,
            store,
        }
    }

    fn role_for(&self, email: &str) -> Role {
        if self.config.is_admin_email(email) {
            Role::Admin
        } else {
            Role::User
        }
    }
}

#[async_trait]
impl IdentityGateway for JwtGateway {
    async fn resolve(&self, bearer: &str) -> AppResult<Identity> {
        let claims = self.keys.verify_access(bearer).map_err(|e| {
            warn!(error = %e, "token rejected");
            AppError::Unauthorized("invalid or expired token".into())
        })?;

        if let Some(user) = self.store.find_user(claims.sub).await? {
            if user.locked {
                warn!(user_id = %claims.sub, "locked account");
                return Err(AppError::forbidden("account is locked"));
            }
        }

        Ok(Identity {
            user_id: claims.sub,
            role: self.role_for(&claims.email),
            email: claims.email.trim().to_lowercase(),
            name: claims.name.filter(|n| !n.trim().is_empty()),
        })
    }
}
