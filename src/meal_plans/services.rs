//! Per-slot meal plan edits.
//!
//! Every edit rewrites exactly one slot; the other three are never sent to the
//! store, so a stale client cannot clobber them. A plan exists only while at
//! least one slot holds a meal.

use time::Date;
use tracing::info;
use uuid::Uuid;

use super::repo_types::{MealPlan, MealType};
use crate::{
    error::{AppError, AppResult},
    identity::Identity,
    recipes::{repo_types::Recipe, services as recipes},
    state::AppState,
};

/// Recipe as embedded in a plan: a copy of the body without membership sets.
fn snapshot(mut recipe: Recipe) -> Recipe {
    recipe.liked_by.clear();
    recipe.saved_by.clear();
    recipe
}

pub async fn list(state: &AppState, who: &Identity) -> AppResult<Vec<MealPlan>> {
    Ok(state.store.list_meal_plans(who.user_id).await?)
}

pub async fn get(state: &AppState, who: &Identity, date: Date) -> AppResult<MealPlan> {
    state
        .store
        .find_meal_plan(who.user_id, date)
        .await?
        .ok_or(AppError::NotFound("meal plan"))
}

pub async fn add(
    state: &AppState,
    who: &Identity,
    date: Date,
    slot: MealType,
    recipe_id: Uuid,
) -> AppResult<MealPlan> {
    let recipe = recipes::get(state, Some(who), recipe_id).await?;
    let mut meals = state
        .store
        .find_meal_plan(who.user_id, date)
        .await?
        .map(|p| p.slot(slot).to_vec())
        .unwrap_or_default();
    meals.push(snapshot(recipe));

    let plan = state.store.replace_slot(who.user_id, date, slot, &meals).await?;
    info!(user_id = %who.user_id, %date, %slot, %recipe_id, "meal added");
    Ok(plan)
}

/// Replaces one slot with the given recipes, in order. Returns `None` when the
/// replacement left the whole plan empty and it was deleted.
pub async fn replace(
    state: &AppState,
    who: &Identity,
    date: Date,
    slot: MealType,
    recipe_ids: &[Uuid],
) -> AppResult<Option<MealPlan>> {
    let mut meals = Vec::with_capacity(recipe_ids.len());
    for id in recipe_ids {
        meals.push(snapshot(recipes::get(state, Some(who), *id).await?));
    }

    let plan = state.store.replace_slot(who.user_id, date, slot, &meals).await?;
    info!(user_id = %who.user_id, %date, %slot, meals = meals.len(), "slot replaced");
    drop_if_empty(state, who, plan).await
}

/// Removes the meal at `index` from one slot. Returns `None` when that was the
/// last meal of the day and the plan was deleted.
pub async fn remove(
    state: &AppState,
    who: &Identity,
    date: Date,
    slot: MealType,
    index: usize,
) -> AppResult<Option<MealPlan>> {
    let plan = get(state, who, date).await?;
    let mut meals = plan.slot(slot).to_vec();
    if index >= meals.len() {
        return Err(AppError::NotFound("meal"));
    }
    let removed = meals.remove(index);

    let plan = state.store.replace_slot(who.user_id, date, slot, &meals).await?;
    info!(user_id = %who.user_id, %date, %slot, recipe_id = %removed.id, "meal removed");
    drop_if_empty(state, who, plan).await
}

async fn drop_if_empty(state: &AppState, who: &Identity, plan: MealPlan) -> AppResult<Option<MealPlan>> {
    if !plan.is_empty() {
        return Ok(Some(plan));
    }
    state.store.delete_meal_plan(who.user_id, plan.date).await?;
    info!(user_id = %who.user_id, date = %plan.date, "empty meal plan deleted");
    Ok(None)
}

pub async fn delete(state: &AppState, who: &Identity, date: Date) -> AppResult<()> {
    if !state.store.delete_meal_plan(who.user_id, date).await? {
        return Err(AppError::NotFound("meal plan"));
    }
    info!(user_id = %who.user_id, %date, "meal plan deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::identity::fixtures::user;
    use crate::recipes::repo_types::{fixtures::recipe, RecipeStatus};

    async fn seeded(names: &[&str]) -> (AppState, Vec<Uuid>) {
        let state = AppState::fake();
        let mut ids = Vec::new();
        for n in names {
            let r = recipe(n, vec![]);
            ids.push(r.id);
            state.store.insert_recipe(&r).await.unwrap();
        }
        (state, ids)
    }

    #[tokio::test]
    async fn adding_to_dinner_leaves_lunch_untouched() {
        let (state, ids) = seeded(&["RecipeX", "RecipeY"]).await;
        let who = user("lan@example.com");
        let day = date!(2024 - 01 - 01);

        add(&state, &who, day, MealType::Lunch, ids[0]).await.unwrap();
        let plan = add(&state, &who, day, MealType::Dinner, ids[1]).await.unwrap();

        assert_eq!(plan.lunch.len(), 1);
        assert_eq!(plan.lunch[0].name, "RecipeX");
        assert_eq!(plan.dinner[0].name, "RecipeY");
        assert_eq!(state.store.list_meal_plans(who.user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn removing_last_meal_deletes_plan() {
        let (state, ids) = seeded(&["Xôi gấc"]).await;
        let who = user("lan@example.com");
        let day = date!(2024 - 01 - 02);
        add(&state, &who, day, MealType::Breakfast, ids[0]).await.unwrap();

        assert!(matches!(
            remove(&state, &who, day, MealType::Breakfast, 3).await,
            Err(AppError::NotFound("meal"))
        ));
        let left = remove(&state, &who, day, MealType::Breakfast, 0).await.unwrap();
        assert!(left.is_none());
        assert!(matches!(
            get(&state, &who, day).await,
            Err(AppError::NotFound("meal plan"))
        ));
    }

    #[tokio::test]
    async fn replace_keeps_order_and_other_slots() {
        let (state, ids) = seeded(&["A", "B", "C"]).await;
        let who = user("lan@example.com");
        let day = date!(2024 - 01 - 03);
        add(&state, &who, day, MealType::Snack, ids[0]).await.unwrap();

        let plan = replace(&state, &who, day, MealType::Dinner, &[ids[2], ids[1]])
            .await
            .unwrap()
            .unwrap();
        let names: Vec<&str> = plan.dinner.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["C", "B"]);
        assert_eq!(plan.snack.len(), 1);

        replace(&state, &who, day, MealType::Dinner, &[]).await.unwrap();
        let left = replace(&state, &who, day, MealType::Snack, &[]).await.unwrap();
        assert!(left.is_none());
    }

    #[tokio::test]
    async fn plans_are_per_user() {
        let (state, ids) = seeded(&["Bánh chưng"]).await;
        let a = user("a@example.com");
        let b = user("b@example.com");
        let day = date!(2024 - 02 - 10);
        add(&state, &a, day, MealType::Lunch, ids[0]).await.unwrap();
        assert!(matches!(get(&state, &b, day).await, Err(AppError::NotFound(_))));
        assert!(matches!(delete(&state, &b, day).await, Err(AppError::NotFound(_))));
        delete(&state, &a, day).await.unwrap();
    }

    #[tokio::test]
    async fn pending_recipe_of_someone_else_cannot_be_planned() {
        let state = AppState::fake();
        let mut r = recipe("Nem rán", vec![]);
        r.status = Some(RecipeStatus::Pending);
        state.store.insert_recipe(&r).await.unwrap();
        let res = add(&state, &user("a@example.com"), date!(2024 - 01 - 01), MealType::Lunch, r.id).await;
        assert!(matches!(res, Err(AppError::NotFound("recipe"))));
    }

    #[tokio::test]
    async fn plans_list_ascending_by_date() {
        let (state, ids) = seeded(&["Cháo"]).await;
        let who = user("a@example.com");
        add(&state, &who, date!(2024 - 03 - 05), MealType::Lunch, ids[0]).await.unwrap();
        add(&state, &who, date!(2024 - 03 - 01), MealType::Lunch, ids[0]).await.unwrap();
        let dates: Vec<Date> = list(&state, &who).await.unwrap().iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![date!(2024 - 03 - 01), date!(2024 - 03 - 05)]);
    }
}
