use axum::{extract::State, Json};
use serde::Serialize;
use tracing::{info, instrument};

use super::ScoreRequest;
use crate::{
    error::{AppError, AppResult},
    identity::AuthUser,
    recipes::{moderation, repo_types::Recipe},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub success: bool,
    pub recipes: Vec<Recipe>,
}

/// GET /recommendations
/// Needs at least one health condition or dietary preference on the profile.
#[instrument(skip(state))]
pub async fn recommendations(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
) -> AppResult<Json<RecommendationsResponse>> {
    let user = state
        .store
        .ensure_user(who.user_id, &who.email, who.name.as_deref())
        .await?;
    let profile = user
        .health_profile
        .filter(|p| !p.health_conditions.is_empty() || !p.dietary_preferences.is_empty())
        .ok_or_else(|| AppError::validation("add your health profile to get recommendations"))?;

    let ranked = state.scorer.rank(&ScoreRequest::new(who.user_id, &profile)).await?;

    let mut recipes = Vec::with_capacity(ranked.len());
    for id in &ranked {
        if let Some(r) = state.store.find_recipe(*id).await? {
            if moderation::is_publicly_visible(&r) && !recipes.iter().any(|x: &Recipe| x.id == r.id) {
                recipes.push(r);
            }
        }
    }
    info!(user_id = %who.user_id, scorer = state.scorer.name(), ranked = ranked.len(), returned = recipes.len(), "recommendations served");
    Ok(Json(RecommendationsResponse {
        success: true,
        recipes,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;
    use crate::{
        identity::{fixtures::user, repo_types::HealthProfile},
        recipes::repo_types::{fixtures::recipe, RecipeStatus},
        recommendations::RecommendationScorer,
    };

    struct Fixed(Vec<Uuid>);

    #[async_trait]
    impl RecommendationScorer for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }
        async fn rank(&self, _req: &ScoreRequest) -> anyhow::Result<Vec<Uuid>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn missing_profile_is_a_validation_error() {
        let state = AppState::fake();
        let res = recommendations(State(state), AuthUser(user("a@example.com"))).await;
        assert!(matches!(res, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn keeps_rank_order_and_drops_hidden_or_missing() {
        let base = AppState::fake();
        let first = recipe("Đầu", vec![]);
        let second = recipe("Nhì", vec![]);
        let mut pending = recipe("Chờ", vec![]);
        pending.status = Some(RecipeStatus::Pending);
        for r in [&first, &second, &pending] {
            base.store.insert_recipe(r).await.unwrap();
        }
        let ranked = vec![second.id, Uuid::new_v4(), pending.id, first.id];
        let state = AppState::from_parts(base.store.clone(), base.config.clone(), Arc::new(Fixed(ranked)));

        let who = user("a@example.com");
        state.store.ensure_user(who.user_id, &who.email, None).await.unwrap();
        let profile = HealthProfile {
            age: None,
            health_conditions: vec![],
            dietary_preferences: vec!["ít dầu".into()],
        };
        state.store.set_health_profile(who.user_id, &profile).await.unwrap();

        let Json(res) = recommendations(State(state), AuthUser(who)).await.unwrap();
        let ids: Vec<Uuid> = res.recipes.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }
}
