use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Inputs handed to the recommendation scorer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthProfile {
    pub age: Option<u32>,
    #[serde(default)]
    pub health_conditions: Vec<String>,
    #[serde(default)]
    pub dietary_preferences: Vec<String>,
}

/// User record. Credentials live with the identity provider; this document only
/// carries what the core needs: lock flag, social mirrors and health profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub locked: bool,
    pub liked_recipes: Vec<Uuid>,
    pub saved_recipes: Vec<Uuid>,
    pub health_profile: Option<HealthProfile>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl User {
    pub fn new(id: Uuid, email: &str, name: Option<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id,
            email: email.to_string(),
            name,
            locked: false,
            liked_recipes: Vec::new(),
            saved_recipes: Vec::new(),
            health_profile: None,
            created_at: now,
            updated_at: now,
        }
    }
}
