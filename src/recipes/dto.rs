use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    moderation::Decision,
    repo_types::{Recipe, RecipeBody},
    social::{SocialKind, ToggleOutcome},
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub status: Option<String>,
    #[serde(default)]
    pub include_all: bool,
    pub q: Option<String>,
    pub category: Option<String>,
    pub cuisine: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecipeList {
    pub success: bool,
    pub recipes: Vec<Recipe>,
}

#[derive(Debug, Serialize)]
pub struct RecipeEnvelope {
    pub success: bool,
    pub recipe: Recipe,
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateRecipeRequest {
    pub recipe: RecipeBody,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRecipeRequest {
    pub recipe: RecipeBody,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub action: Decision,
    #[serde(default)]
    pub note: Option<String>,
}

/// Absolute like state after a toggle, plus the caller's full liked list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggleResponse {
    pub success: bool,
    pub is_liked: bool,
    pub likes_count: i64,
    pub liked_recipes: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveToggleResponse {
    pub success: bool,
    pub is_saved: bool,
    pub saves_count: i64,
    pub saved_recipes: Vec<Uuid>,
}

impl From<ToggleOutcome> for LikeToggleResponse {
    fn from(o: ToggleOutcome) -> Self {
        debug_assert_eq!(o.kind, SocialKind::Like);
        Self {
            success: true,
            is_liked: o.active,
            likes_count: o.count(),
            liked_recipes: o.mirror,
        }
    }
}

impl From<ToggleOutcome> for SaveToggleResponse {
    fn from(o: ToggleOutcome) -> Self {
        debug_assert_eq!(o.kind, SocialKind::Save);
        Self {
            success: true,
            is_saved: o.active,
            saves_count: o.count(),
            saved_recipes: o.mirror,
        }
    }
}
