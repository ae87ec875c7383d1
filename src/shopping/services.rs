use time::Date;
use tracing::info;

use super::{
    aggregate::{self, DayGroup},
    repo_types::ShoppingListItem,
};
use crate::{
    error::{AppError, AppResult},
    identity::Identity,
    state::AppState,
};

pub async fn get(state: &AppState, who: &Identity) -> AppResult<Vec<ShoppingListItem>> {
    Ok(state.store.shopping_list(who.user_id).await?)
}

pub async fn replace_all(
    state: &AppState,
    who: &Identity,
    items: Vec<ShoppingListItem>,
) -> AppResult<Vec<ShoppingListItem>> {
    let items = aggregate::normalize(items);
    state.store.replace_shopping_list(who.user_id, &items).await?;
    info!(user_id = %who.user_id, items = items.len(), "shopping list replaced");
    Ok(items)
}

pub async fn clear(state: &AppState, who: &Identity) -> AppResult<()> {
    state.store.replace_shopping_list(who.user_id, &[]).await?;
    info!(user_id = %who.user_id, "shopping list cleared");
    Ok(())
}

/// Aggregates one day's plan and merges it into the stored list.
/// Returns the list after the merge and how many items were new.
pub async fn generate(
    state: &AppState,
    who: &Identity,
    date: Date,
) -> AppResult<(Vec<ShoppingListItem>, usize)> {
    let plan = state
        .store
        .find_meal_plan(who.user_id, date)
        .await?
        .ok_or(AppError::NotFound("meal plan"))?;
    let generated = aggregate::generate_for_plan(&plan);

    let mut items = state.store.shopping_list(who.user_id).await?;
    let added = aggregate::merge_into(&mut items, generated);
    if added > 0 {
        state.store.replace_shopping_list(who.user_id, &items).await?;
    }
    info!(user_id = %who.user_id, %date, added, "shopping list generated");
    Ok((items, added))
}

pub async fn toggle_checked(
    state: &AppState,
    who: &Identity,
    ingredient: &str,
) -> AppResult<Vec<ShoppingListItem>> {
    let mut items = state.store.shopping_list(who.user_id).await?;
    aggregate::toggle_checked(&mut items, ingredient).ok_or(AppError::NotFound("shopping list item"))?;
    state.store.replace_shopping_list(who.user_id, &items).await?;
    Ok(items)
}

pub async fn remove(
    state: &AppState,
    who: &Identity,
    ingredient: &str,
) -> AppResult<Vec<ShoppingListItem>> {
    let mut items = state.store.shopping_list(who.user_id).await?;
    if !aggregate::remove(&mut items, ingredient) {
        return Err(AppError::NotFound("shopping list item"));
    }
    state.store.replace_shopping_list(who.user_id, &items).await?;
    info!(user_id = %who.user_id, "shopping list item removed");
    Ok(items)
}

pub async fn grouped(state: &AppState, who: &Identity) -> AppResult<Vec<DayGroup>> {
    let items = state.store.shopping_list(who.user_id).await?;
    Ok(aggregate::group_by_date(&items))
}

pub async fn export(state: &AppState, who: &Identity) -> AppResult<String> {
    let items = state.store.shopping_list(who.user_id).await?;
    Ok(aggregate::export_text(&items))
}
