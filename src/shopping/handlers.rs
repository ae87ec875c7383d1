use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{GenerateRequest, GenerateResponse, GroupedResponse, ReplaceListRequest, ShoppingListResponse},
    services,
};
use crate::{
    error::AppResult,
    identity::AuthUser,
    meal_plans::dto::parse_date,
    recipes::dto::Ack,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/shopping-list",
            get(get_list).put(replace_list).delete(clear_list),
        )
        .route("/shopping-list/generate", post(generate))
        .route(
            "/shopping-list/items/:ingredient",
            patch(toggle_item).delete(remove_item),
        )
        .route("/shopping-list/grouped", get(grouped))
        .route("/shopping-list/export", get(export))
}

#[instrument(skip(state))]
pub async fn get_list(State(state): State<AppState>, AuthUser(who): AuthUser) -> AppResult<Json<ShoppingListResponse>> {
    let items = services::get(&state, &who).await?;
    Ok(Json(ShoppingListResponse { success: true, items }))
}

#[instrument(skip(state, body))]
pub async fn replace_list(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    Json(body): Json<ReplaceListRequest>,
) -> AppResult<Json<ShoppingListResponse>> {
    let items = services::replace_all(&state, &who, body.items).await?;
    Ok(Json(ShoppingListResponse { success: true, items }))
}

#[instrument(skip(state))]
pub async fn clear_list(State(state): State<AppState>, AuthUser(who): AuthUser) -> AppResult<Json<Ack>> {
    services::clear(&state, &who).await?;
    Ok(Json(Ack { success: true }))
}

#[instrument(skip(state))]
pub async fn generate(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    Json(body): Json<GenerateRequest>,
) -> AppResult<Json<GenerateResponse>> {
    let (items, added) = services::generate(&state, &who, parse_date(&body.date)?).await?;
    Ok(Json(GenerateResponse {
        success: true,
        added,
        items,
    }))
}

#[instrument(skip(state))]
pub async fn toggle_item(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    Path(ingredient): Path<String>,
) -> AppResult<Json<ShoppingListResponse>> {
    let items = services::toggle_checked(&state, &who, &ingredient).await?;
    Ok(Json(ShoppingListResponse { success: true, items }))
}

#[instrument(skip(state))]
pub async fn remove_item(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    Path(ingredient): Path<String>,
) -> AppResult<Json<ShoppingListResponse>> {
    let items = services::remove(&state, &who, &ingredient).await?;
    Ok(Json(ShoppingListResponse { success: true, items }))
}

#[instrument(skip(state))]
pub async fn grouped(State(state): State<AppState>, AuthUser(who): AuthUser) -> AppResult<Json<GroupedResponse>> {
    let days = services::grouped(&state, &who).await?;
    Ok(Json(GroupedResponse { success: true, days }))
}

#[instrument(skip(state))]
pub async fn export(State(state): State<AppState>, AuthUser(who): AuthUser) -> AppResult<impl IntoResponse> {
    let text = services::export(&state, &who).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"danh-sach-mua-sam.txt\"",
            ),
        ],
        text,
    ))
}
