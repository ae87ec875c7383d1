use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    /// Accounts whose verified email matches this value get the admin role.
    pub admin_email: String,
    /// External recommendation scorer; popularity ranking is used when unset.
    pub recommender_url: Option<String>,
    pub counter_events_capacity: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "recipe-planner".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "recipe-planner-users".into()),
        };
        Ok(Self {
            database_url,
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            jwt,
            admin_email: std::env::var("ADMIN_EMAIL")
                .map(|v| v.trim().to_lowercase())
                .unwrap_or_else(|_| "admin@recipe.com".into()),
            recommender_url: std::env::var("RECOMMENDER_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            counter_events_capacity: std::env::var("COUNTER_EVENTS_CAPACITY")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(256),
        })
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        email.trim().eq_ignore_ascii_case(&self.admin_email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_email_comparison_ignores_case_and_padding() {
        let cfg = AppConfig {
            database_url: "postgres://localhost/test".into(),
            max_connections: 1,
            jwt: JwtConfig {
                secret: "s".into(),
                issuer: "i".into(),
                audience: "a".into(),
            },
            admin_email: "admin@recipe.com".into(),
            recommender_url: None,
            counter_events_capacity: 8,
        };
        assert!(cfg.is_admin_email(" Admin@Recipe.com "));
        assert!(!cfg.is_admin_email("someone@recipe.com"));
    }
}
