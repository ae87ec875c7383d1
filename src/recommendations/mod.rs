//! Recommendation scoring seam.
//!
//! The scorer is a black box: health profile in, ranked recipe ids out. The
//! handler hydrates the ids and drops anything not publicly visible.

pub mod handlers;

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use axum::{routing::get, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    identity::repo_types::HealthProfile,
    recipes::moderation::ListMode,
    state::AppState,
    store::Store,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    pub user_id: Uuid,
    pub age: Option<u32>,
    pub health_conditions: Vec<String>,
    pub dietary_preferences: Vec<String>,
}

impl ScoreRequest {
    pub fn new(user_id: Uuid, profile: &HealthProfile) -> Self {
        Self {
            user_id,
            age: profile.age,
            health_conditions: profile.health_conditions.clone(),
            dietary_preferences: profile.dietary_preferences.clone(),
        }
    }
}

#[async_trait]
pub trait RecommendationScorer: Send + Sync {
    fn name(&self) -> &'static str;
    /// Recipe ids, best first.
    async fn rank(&self, req: &ScoreRequest) -> anyhow::Result<Vec<Uuid>>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoreResponse {
    recipe_ids: Vec<Uuid>,
}

/// External scorer reached over HTTP.
pub struct HttpScorer {
    client: reqwest::Client,
    url: String,
}

impl HttpScorer {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build recommender client")?;
        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RecommendationScorer for HttpScorer {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn rank(&self, req: &ScoreRequest) -> anyhow::Result<Vec<Uuid>> {
        let res = self
            .client
            .post(&self.url)
            .json(req)
            .send()
            .await
            .context("call recommender")?
            .error_for_status()
            .context("recommender rejected request")?;
        let body: ScoreResponse = res.json().await.context("decode recommender response")?;
        Ok(body.recipe_ids)
    }
}

/// Fallback ranking when no external scorer is configured: publicly visible
/// recipes by likes, then saves, then recency.
pub struct PopularityScorer {
    store: Arc<dyn Store>,
    limit: usize,
}

impl PopularityScorer {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store, limit: 12 }
    }
}

#[async_trait]
impl RecommendationScorer for PopularityScorer {
    fn name(&self) -> &'static str {
        "popularity"
    }

    async fn rank(&self, _req: &ScoreRequest) -> anyhow::Result<Vec<Uuid>> {
        let mut recipes = self.store.list_recipes(&ListMode::Public).await?;
        // list_recipes is newest first and the sort is stable
        recipes.sort_by(|a, b| {
            (b.likes_count, b.saves_count).cmp(&(a.likes_count, a.saves_count))
        });
        Ok(recipes.into_iter().take(self.limit).map(|r| r.id).collect())
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/recommendations", get(handlers::recommendations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        recipes::repo_types::{fixtures::recipe, RecipeStatus},
        store::MemoryStore,
    };

    #[tokio::test]
    async fn popularity_ranks_by_likes_then_saves_and_skips_pending() {
        let store = Arc::new(MemoryStore::new());
        let mut a = recipe("A", vec![]);
        a.likes_count = 1;
        a.saves_count = 5;
        let mut b = recipe("B", vec![]);
        b.likes_count = 3;
        let mut c = recipe("C", vec![]);
        c.likes_count = 1;
        c.saves_count = 9;
        let mut hidden = recipe("Hidden", vec![]);
        hidden.likes_count = 99;
        hidden.status = Some(RecipeStatus::Pending);
        for r in [&a, &b, &c, &hidden] {
            store.insert_recipe(r).await.unwrap();
        }

        let scorer = PopularityScorer::new(store);
        let req = ScoreRequest::new(Uuid::new_v4(), &HealthProfile::default());
        assert_eq!(scorer.rank(&req).await.unwrap(), vec![b.id, c.id, a.id]);
    }

    #[test]
    fn score_request_uses_camel_case() {
        let profile = HealthProfile {
            age: Some(40),
            health_conditions: vec!["huyết áp cao".into()],
            dietary_preferences: vec![],
        };
        let json = serde_json::to_value(ScoreRequest::new(Uuid::nil(), &profile)).unwrap();
        assert_eq!(json["age"], 40);
        assert_eq!(json["healthConditions"][0], "huyết áp cao");
        assert!(json.get("userId").is_some());
    }
}
