use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{
        Ack, CreateRecipeRequest, LikeToggleResponse, ListQuery, RecipeEnvelope, RecipeList,
        ReviewRequest, SaveToggleResponse, UpdateRecipeRequest,
    },
    services,
    social::{self, SocialKind},
};
use crate::{
    error::AppResult,
    identity::{AuthUser, MaybeAuthUser},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes))
        .route("/recipes/:id", get(get_recipe))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", post(create_recipe))
        .route(
            "/recipes/:id",
            axum::routing::put(update_recipe).delete(delete_recipe),
        )
        .route("/recipes/:id/review", post(review_recipe))
        .route("/recipes/:id/like", post(toggle_like))
        .route("/recipes/:id/save", post(toggle_save))
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Query(q): Query<ListQuery>,
) -> AppResult<Json<RecipeList>> {
    let mode = services::list_mode(viewer.as_ref(), q.include_all, q.status.as_deref())?;
    let filter = services::RecipeFilter::new(
        q.q.as_deref(),
        q.category.as_deref(),
        q.cuisine.as_deref(),
        q.difficulty.as_deref(),
    );
    let recipes = services::list(&state, mode, &filter).await?;
    Ok(Json(RecipeList {
        success: true,
        recipes,
    }))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RecipeEnvelope>> {
    let recipe = services::get(&state, viewer.as_ref(), id).await?;
    Ok(Json(RecipeEnvelope {
        success: true,
        recipe,
    }))
}

#[instrument(skip(state, body))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    Json(body): Json<CreateRecipeRequest>,
) -> AppResult<(StatusCode, Json<RecipeEnvelope>)> {
    let recipe = services::create(&state, &who, body.recipe).await?;
    Ok((
        StatusCode::CREATED,
        Json(RecipeEnvelope {
            success: true,
            recipe,
        }),
    ))
}

#[instrument(skip(state, body))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateRecipeRequest>,
) -> AppResult<Json<RecipeEnvelope>> {
    let recipe = services::update(&state, &who, id, body.recipe).await?;
    Ok(Json(RecipeEnvelope {
        success: true,
        recipe,
    }))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Ack>> {
    services::delete(&state, &who, id).await?;
    Ok(Json(Ack { success: true }))
}

#[instrument(skip(state, body))]
pub async fn review_recipe(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ReviewRequest>,
) -> AppResult<Json<RecipeEnvelope>> {
    let recipe = services::review(&state, &who, id, body.action, body.note).await?;
    Ok(Json(RecipeEnvelope {
        success: true,
        recipe,
    }))
}

#[instrument(skip(state))]
pub async fn toggle_like(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<LikeToggleResponse>> {
    let outcome = social::toggle(&state, &who, id, SocialKind::Like).await?;
    Ok(Json(outcome.into()))
}

#[instrument(skip(state))]
pub async fn toggle_save(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SaveToggleResponse>> {
    let outcome = social::toggle(&state, &who, id, SocialKind::Save).await?;
    Ok(Json(outcome.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        identity::fixtures::{admin, user},
        recipes::repo_types::fixtures::recipe,
    };

    #[tokio::test]
    async fn like_twice_restores_state() {
        let state = AppState::fake();
        let r = recipe("Bún đậu", vec![]);
        state.store.insert_recipe(&r).await.unwrap();
        let who = user("a@example.com");

        let Json(first) = toggle_like(State(state.clone()), AuthUser(who.clone()), Path(r.id))
            .await
            .unwrap();
        assert!(first.is_liked);
        assert_eq!(first.likes_count, 1);
        assert_eq!(first.liked_recipes, vec![r.id]);

        let Json(second) = toggle_like(State(state.clone()), AuthUser(who), Path(r.id))
            .await
            .unwrap();
        assert!(!second.is_liked);
        assert_eq!(second.likes_count, 0);
        assert!(second.liked_recipes.is_empty());
    }

    #[tokio::test]
    async fn save_reports_saved_list() {
        let state = AppState::fake();
        let r = recipe("Gà nướng", vec![]);
        state.store.insert_recipe(&r).await.unwrap();

        let Json(res) = toggle_save(State(state), AuthUser(user("a@example.com")), Path(r.id))
            .await
            .unwrap();
        assert!(res.is_saved);
        assert_eq!(res.saves_count, 1);
        assert_eq!(res.saved_recipes, vec![r.id]);
    }

    #[tokio::test]
    async fn toggling_unknown_recipe_is_not_found() {
        let state = AppState::fake();
        let res = toggle_like(State(state), AuthUser(user("a@example.com")), Path(Uuid::new_v4())).await;
        assert!(matches!(res, Err(AppError::NotFound("recipe"))));
    }

    #[tokio::test]
    async fn anonymous_include_all_is_forbidden() {
        let state = AppState::fake();
        let q = ListQuery {
            include_all: true,
            ..Default::default()
        };
        let res = list_recipes(State(state), MaybeAuthUser(None), Query(q)).await;
        assert!(matches!(res, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn admin_sees_every_status() {
        let state = AppState::fake();
        let mut pending = recipe("Bánh tráng trộn", vec![]);
        pending.status = Some(crate::recipes::repo_types::RecipeStatus::Pending);
        state.store.insert_recipe(&pending).await.unwrap();
        state.store.insert_recipe(&recipe("Bún mắm", vec![])).await.unwrap();

        let q = ListQuery {
            include_all: true,
            ..Default::default()
        };
        let Json(all) = list_recipes(State(state.clone()), MaybeAuthUser(Some(admin())), Query(q))
            .await
            .unwrap();
        assert_eq!(all.recipes.len(), 2);

        let Json(public) = list_recipes(State(state), MaybeAuthUser(None), Query(ListQuery::default()))
            .await
            .unwrap();
        assert_eq!(public.recipes.len(), 1);
    }

    #[tokio::test]
    async fn public_search_skips_pending_matches() {
        let state = AppState::fake();
        let mut pending = recipe("Chè ba màu", vec![]);
        pending.status = Some(crate::recipes::repo_types::RecipeStatus::Pending);
        state.store.insert_recipe(&pending).await.unwrap();

        let q = ListQuery {
            q: Some("chè".into()),
            ..Default::default()
        };
        let Json(public) = list_recipes(State(state.clone()), MaybeAuthUser(None), Query(q))
            .await
            .unwrap();
        assert!(public.recipes.is_empty());

        let q = ListQuery {
            q: Some("chè".into()),
            include_all: true,
            ..Default::default()
        };
        let Json(all) = list_recipes(State(state), MaybeAuthUser(Some(admin())), Query(q))
            .await
            .unwrap();
        assert_eq!(all.recipes.len(), 1);
    }
}
