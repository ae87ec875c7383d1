use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    moderation::{self, Decision, ListMode},
    repo_types::{Recipe, RecipeBody, RecipeStatus},
};
use crate::{
    error::{AppError, AppResult},
    identity::Identity,
    state::AppState,
};

/// Resolves the listing mode. Only admins may ask for every status.
pub fn list_mode(
    viewer: Option<&Identity>,
    include_all: bool,
    status: Option<&str>,
) -> AppResult<ListMode> {
    if !include_all {
        return Ok(ListMode::Public);
    }
    if !viewer.is_some_and(Identity::is_admin) {
        return Err(AppError::forbidden("only admins can list unreviewed recipes"));
    }
    let status = status
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<RecipeStatus>)
        .transpose()
        .map_err(AppError::Validation)?;
    Ok(ListMode::All { status })
}

/// Search and facet filters applied on top of the moderation-gated listing.
/// Blank values are ignored.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    search: Option<String>,
    category: Option<String>,
    cuisine: Option<String>,
    difficulty: Option<String>,
}

impl RecipeFilter {
    pub fn new(
        q: Option<&str>,
        category: Option<&str>,
        cuisine: Option<&str>,
        difficulty: Option<&str>,
    ) -> Self {
        let present = |v: Option<&str>| v.filter(|s| !s.trim().is_empty()).map(str::to_owned);
        Self {
            search: present(q).map(|s| s.trim().to_lowercase()),
            category: present(category),
            cuisine: present(cuisine),
            difficulty: present(difficulty),
        }
    }

    /// Facets match exactly. The search term matches a substring of the
    /// name, description, any tag or the difficulty, ignoring case.
    pub fn matches(&self, r: &Recipe) -> bool {
        let exact = |want: &Option<String>, have: &str| want.as_deref().map_or(true, |w| w == have);
        if !exact(&self.category, &r.category)
            || !exact(&self.cuisine, &r.cuisine)
            || !exact(&self.difficulty, &r.difficulty)
        {
            return false;
        }
        let Some(needle) = self.search.as_deref() else {
            return true;
        };
        let hit = |text: &str| text.to_lowercase().contains(needle);
        hit(&r.name) || hit(&r.description) || r.tags.iter().any(|t| hit(t)) || hit(&r.difficulty)
    }
}

pub async fn list(state: &AppState, mode: ListMode, filter: &RecipeFilter) -> AppResult<Vec<Recipe>> {
    let mut recipes = state.store.list_recipes(&mode).await?;
    recipes.retain(|r| filter.matches(r));
    Ok(recipes)
}

pub async fn get(state: &AppState, viewer: Option<&Identity>, id: Uuid) -> AppResult<Recipe> {
    state
        .store
        .find_recipe(id)
        .await?
        .filter(|r| moderation::can_view(r, viewer))
        .ok_or(AppError::NotFound("recipe"))
}

/// Loads recipes by id in the given order, skipping ids that are gone or
/// not visible to `viewer`.
pub async fn hydrate(
    state: &AppState,
    ids: &[Uuid],
    viewer: Option<&Identity>,
) -> AppResult<Vec<Recipe>> {
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(r) = state.store.find_recipe(*id).await? {
            if moderation::can_view(&r, viewer) {
                out.push(r);
            }
        }
    }
    Ok(out)
}

fn validate(recipe: &Recipe) -> AppResult<()> {
    if recipe.name.trim().is_empty() {
        return Err(AppError::validation("recipe name is required"));
    }
    if recipe.prep_time < 0 || recipe.cook_time < 0 || recipe.servings < 0 {
        return Err(AppError::validation("times and servings cannot be negative"));
    }
    if recipe.ingredients.iter().any(|i| i.name.trim().is_empty()) {
        return Err(AppError::validation("every ingredient needs a name"));
    }
    Ok(())
}

pub async fn create(state: &AppState, author: &Identity, body: RecipeBody) -> AppResult<Recipe> {
    let now = OffsetDateTime::now_utc();
    let mut recipe = Recipe {
        id: Uuid::new_v4(),
        name: String::new(),
        description: String::new(),
        image: String::new(),
        category: String::new(),
        cuisine: String::new(),
        prep_time: 0,
        cook_time: 0,
        servings: 0,
        difficulty: String::new(),
        ingredients: Vec::new(),
        instructions: Vec::new(),
        nutrition: None,
        tags: Vec::new(),
        status: Some(moderation::initial_status(author.role)),
        author_id: Some(author.user_id),
        author_email: Some(author.email.clone()),
        liked_by: Vec::new(),
        saved_by: Vec::new(),
        likes_count: 0,
        saves_count: 0,
        comments_count: 0,
        created_at: now,
        updated_at: now,
        reviewed_at: None,
        review_note: None,
    };
    body.apply_to(&mut recipe);
    validate(&recipe)?;

    state.store.insert_recipe(&recipe).await?;
    info!(recipe_id = %recipe.id, author_id = %author.user_id, status = ?recipe.status, "recipe created");
    Ok(recipe)
}

pub async fn update(
    state: &AppState,
    editor: &Identity,
    id: Uuid,
    body: RecipeBody,
) -> AppResult<Recipe> {
    let mut recipe = state
        .store
        .find_recipe(id)
        .await?
        .ok_or(AppError::NotFound("recipe"))?;
    if !editor.can_manage(recipe.author_id) {
        warn!(recipe_id = %id, user_id = %editor.user_id, "edit of foreign recipe refused");
        return Err(AppError::forbidden("you can only edit your own recipes"));
    }

    body.apply_to(&mut recipe);
    validate(&recipe)?;
    recipe.status = moderation::status_after_edit(recipe.status, editor);
    recipe.updated_at = OffsetDateTime::now_utc();

    if !state.store.update_recipe(&recipe).await? {
        return Err(AppError::NotFound("recipe"));
    }
    info!(recipe_id = %id, user_id = %editor.user_id, "recipe updated");
    Ok(recipe)
}

pub async fn delete(state: &AppState, who: &Identity, id: Uuid) -> AppResult<()> {
    let recipe = state
        .store
        .find_recipe(id)
        .await?
        .ok_or(AppError::NotFound("recipe"))?;
    if !who.can_manage(recipe.author_id) {
        warn!(recipe_id = %id, user_id = %who.user_id, "delete of foreign recipe refused");
        return Err(AppError::forbidden("you can only delete your own recipes"));
    }
    if !state.store.delete_recipe(id).await? {
        return Err(AppError::NotFound("recipe"));
    }
    state.events.forget(id);
    info!(recipe_id = %id, user_id = %who.user_id, "recipe deleted");
    Ok(())
}

pub async fn review(
    state: &AppState,
    reviewer: &Identity,
    id: Uuid,
    decision: Decision,
    note: Option<String>,
) -> AppResult<Recipe> {
    if !reviewer.is_admin() {
        return Err(AppError::forbidden("only admins can review recipes"));
    }
    let mut recipe = state
        .store
        .find_recipe(id)
        .await?
        .ok_or(AppError::NotFound("recipe"))?;
    moderation::review(&mut recipe, decision, note, OffsetDateTime::now_utc());
    if !state.store.update_recipe(&recipe).await? {
        return Err(AppError::NotFound("recipe"));
    }
    info!(recipe_id = %id, decision = ?decision, "recipe reviewed");
    Ok(recipe)
}
