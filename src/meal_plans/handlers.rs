use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{parse_date, parse_slot, AddMealRequest, MealPlanEnvelope, MealPlanList, ReplaceSlotRequest},
    services,
};
use crate::{error::AppResult, identity::AuthUser, recipes::dto::Ack, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/meal-plans", get(list_plans))
        .route("/meal-plans/:date", get(get_plan).delete(delete_plan))
        .route("/meal-plans/:date/:slot", post(add_meal).put(replace_slot))
        .route("/meal-plans/:date/:slot/:index", delete(remove_meal))
}

#[instrument(skip(state))]
pub async fn list_plans(State(state): State<AppState>, AuthUser(who): AuthUser) -> AppResult<Json<MealPlanList>> {
    let meal_plans = services::list(&state, &who).await?;
    Ok(Json(MealPlanList {
        success: true,
        meal_plans,
    }))
}

#[instrument(skip(state))]
pub async fn get_plan(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    Path(date): Path<String>,
) -> AppResult<Json<MealPlanEnvelope>> {
    let plan = services::get(&state, &who, parse_date(&date)?).await?;
    Ok(Json(MealPlanEnvelope {
        success: true,
        meal_plan: Some(plan),
    }))
}

#[instrument(skip(state))]
pub async fn add_meal(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    Path((date, slot)): Path<(String, String)>,
    Json(body): Json<AddMealRequest>,
) -> AppResult<Json<MealPlanEnvelope>> {
    let plan = services::add(&state, &who, parse_date(&date)?, parse_slot(&slot)?, body.recipe_id).await?;
    Ok(Json(MealPlanEnvelope {
        success: true,
        meal_plan: Some(plan),
    }))
}

#[instrument(skip(state, body))]
pub async fn replace_slot(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    Path((date, slot)): Path<(String, String)>,
    Json(body): Json<ReplaceSlotRequest>,
) -> AppResult<Json<MealPlanEnvelope>> {
    let plan =
        services::replace(&state, &who, parse_date(&date)?, parse_slot(&slot)?, &body.recipe_ids).await?;
    Ok(Json(MealPlanEnvelope {
        success: true,
        meal_plan: plan,
    }))
}

#[instrument(skip(state))]
pub async fn remove_meal(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    Path((date, slot, index)): Path<(String, String, usize)>,
) -> AppResult<Json<MealPlanEnvelope>> {
    let plan = services::remove(&state, &who, parse_date(&date)?, parse_slot(&slot)?, index).await?;
    Ok(Json(MealPlanEnvelope {
        success: true,
        meal_plan: plan,
    }))
}

#[instrument(skip(state))]
pub async fn delete_plan(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    Path(date): Path<String>,
) -> AppResult<Json<Ack>> {
    services::delete(&state, &who, parse_date(&date)?).await?;
    Ok(Json(Ack { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AppError, identity::fixtures::user, recipes::repo_types::fixtures::recipe};

    #[tokio::test]
    async fn bad_date_or_slot_is_a_validation_error() {
        let state = AppState::fake();
        let who = user("a@example.com");
        let body = || Json(AddMealRequest { recipe_id: uuid::Uuid::new_v4() });

        let res = add_meal(
            State(state.clone()),
            AuthUser(who.clone()),
            Path(("2024-02-30".into(), "lunch".into())),
            body(),
        )
        .await;
        assert!(matches!(res, Err(AppError::Validation(_))));

        let res = add_meal(State(state), AuthUser(who), Path(("2024-02-01".into(), "brunch".into())), body()).await;
        assert!(matches!(res, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn remove_last_meal_returns_null_plan() {
        let state = AppState::fake();
        let who = user("a@example.com");
        let r = recipe("Bún thang", vec![]);
        state.store.insert_recipe(&r).await.unwrap();

        add_meal(
            State(state.clone()),
            AuthUser(who.clone()),
            Path(("2024-01-01".into(), "Dinner".into())),
            Json(AddMealRequest { recipe_id: r.id }),
        )
        .await
        .unwrap();
        let Json(env) = remove_meal(State(state), AuthUser(who), Path(("2024-01-01".into(), "dinner".into(), 0)))
            .await
            .unwrap();
        assert!(env.meal_plan.is_none());
        assert_eq!(serde_json::to_value(&env).unwrap()["mealPlan"], serde_json::Value::Null);
    }
}
