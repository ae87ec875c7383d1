use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{repo_types::HealthProfile, AuthUser, Identity, Role};
use crate::{
    error::{AppError, AppResult},
    recipes::{repo_types::Recipe, services::hydrate},
    state::AppState,
};

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/me/health-profile", put(put_health_profile))
        .route("/me/liked-recipes", get(liked_recipes))
        .route("/me/saved-recipes", get(saved_recipes))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub locked: bool,
    pub liked_recipes: Vec<Uuid>,
    pub saved_recipes: Vec<Uuid>,
    pub health_profile: Option<HealthProfile>,
}

#[instrument(skip(state, who), fields(user_id = %who.user_id))]
pub async fn get_me(State(state): State<AppState>, AuthUser(who): AuthUser) -> AppResult<Json<MeResponse>> {
    let user = state
        .store
        .ensure_user(who.user_id, &who.email, who.name.as_deref())
        .await?;
    Ok(Json(MeResponse {
        id: user.id,
        email: who.email.clone(),
        name: who.display_name(),
        role: who.role,
        locked: user.locked,
        liked_recipes: user.liked_recipes,
        saved_recipes: user.saved_recipes,
        health_profile: user.health_profile,
    }))
}

#[instrument(skip(state, who, body), fields(user_id = %who.user_id))]
pub async fn put_health_profile(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    Json(body): Json<HealthProfile>,
) -> AppResult<Json<HealthProfile>> {
    let profile = normalize_profile(body)?;
    state
        .store
        .ensure_user(who.user_id, &who.email, who.name.as_deref())
        .await?;
    let user = state
        .store
        .set_health_profile(who.user_id, &profile)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    info!(user_id = %who.user_id, "health profile updated");
    Ok(Json(user.health_profile.unwrap_or(profile)))
}

fn normalize_profile(mut p: HealthProfile) -> AppResult<HealthProfile> {
    if matches!(p.age, Some(age) if age == 0 || age > 130) {
        return Err(AppError::validation("age must be between 1 and 130"));
    }
    let clean = |v: Vec<String>| -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(v.len());
        for s in v.into_iter().map(|s| s.trim().to_string()) {
            if !s.is_empty() && !out.iter().any(|o| o.eq_ignore_ascii_case(&s)) {
                out.push(s);
            }
        }
        out
    };
    p.health_conditions = clean(p.health_conditions);
    p.dietary_preferences = clean(p.dietary_preferences);
    Ok(p)
}

#[instrument(skip(state, who), fields(user_id = %who.user_id))]
pub async fn liked_recipes(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
) -> AppResult<Json<Vec<Recipe>>> {
    let ids = mirror(&state, &who, |u| u.liked_recipes).await?;
    Ok(Json(hydrate(&state, &ids, Some(&who)).await?))
}

#[instrument(skip(state, who), fields(user_id = %who.user_id))]
pub async fn saved_recipes(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
) -> AppResult<Json<Vec<Recipe>>> {
    let ids = mirror(&state, &who, |u| u.saved_recipes).await?;
    Ok(Json(hydrate(&state, &ids, Some(&who)).await?))
}

async fn mirror(
    state: &AppState,
    who: &Identity,
    pick: impl FnOnce(super::repo_types::User) -> Vec<Uuid>,
) -> AppResult<Vec<Uuid>> {
    Ok(state
        .store
        .find_user(who.user_id)
        .await?
        .map(pick)
        .unwrap_or_default())
}
