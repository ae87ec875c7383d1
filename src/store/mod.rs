//! Document store seam.
//!
//! Every method touches exactly one document and is atomic for that document.
//! Nothing here spans documents; callers that update two documents (a recipe
//! counter and its user mirror, a comment and its recipe count) do so in two
//! calls and accept the gap between them.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{
    comments::repo_types::{Comment, CommentCounts, LikeToggle},
    identity::repo_types::{HealthProfile, User},
    meal_plans::repo_types::{MealPlan, MealType},
    recipes::{
        moderation::ListMode,
        repo_types::{Recipe, RecipeCounters},
        social::SocialKind,
    },
    shopping::repo_types::ShoppingListItem,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Outcome of flipping one user's membership in a recipe's like/save set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipToggle {
    pub active: bool,
    pub counters: RecipeCounters,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserMirrors {
    pub liked: Vec<Uuid>,
    pub saved: Vec<Uuid>,
}

#[async_trait]
pub trait Store: Send + Sync {
    fn backend(&self) -> &'static str;

    // ---- users ----

    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    /// Returns the user record, creating an empty one on first touch.
    async fn ensure_user(&self, id: Uuid, email: &str, name: Option<&str>) -> anyhow::Result<User>;
    async fn list_users(&self) -> anyhow::Result<Vec<User>>;
    async fn set_user_locked(&self, id: Uuid, locked: bool) -> anyhow::Result<Option<User>>;
    async fn set_health_profile(
        &self,
        id: Uuid,
        profile: &HealthProfile,
    ) -> anyhow::Result<Option<User>>;
    async fn delete_user(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Adds (`active`) or removes `recipe_id` in the user's mirror list and
    /// returns the whole list after the write.
    async fn mirror_membership(
        &self,
        user_id: Uuid,
        kind: SocialKind,
        recipe_id: Uuid,
        active: bool,
    ) -> anyhow::Result<Option<Vec<Uuid>>>;
    /// Rebuilds both mirror lists from the recipe membership sets in one
    /// atomic step and returns them.
    async fn rebuild_user_mirrors(&self, user_id: Uuid) -> anyhow::Result<Option<UserMirrors>>;

    // ---- recipes ----

    async fn find_recipe(&self, id: Uuid) -> anyhow::Result<Option<Recipe>>;
    /// Newest first.
    async fn list_recipes(&self, mode: &ListMode) -> anyhow::Result<Vec<Recipe>>;
    async fn insert_recipe(&self, recipe: &Recipe) -> anyhow::Result<()>;
    /// Writes body, moderation and timestamp fields. Counters and membership
    /// sets are left untouched so concurrent toggles are not clobbered.
    async fn update_recipe(&self, recipe: &Recipe) -> anyhow::Result<bool>;
    async fn delete_recipe(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn toggle_membership(
        &self,
        recipe_id: Uuid,
        kind: SocialKind,
        user_id: Uuid,
    ) -> anyhow::Result<Option<MembershipToggle>>;
    /// Adds `delta` to `commentsCount`, clamped at zero.
    async fn adjust_comments_count(
        &self,
        recipe_id: Uuid,
        delta: i64,
    ) -> anyhow::Result<Option<RecipeCounters>>;
    /// Recomputes every counter from the current membership sets and visible
    /// comments in one atomic step.
    async fn recount_recipe(&self, recipe_id: Uuid) -> anyhow::Result<Option<RecipeCounters>>;

    // ---- comments ----

    async fn find_comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>>;
    async fn list_comments(&self, recipe_id: Uuid) -> anyhow::Result<Vec<Comment>>;
    async fn insert_comment(&self, comment: &Comment) -> anyhow::Result<()>;
    async fn update_comment_content(
        &self,
        id: Uuid,
        content: &str,
        at: OffsetDateTime,
    ) -> anyhow::Result<Option<Comment>>;
    async fn delete_comment(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn toggle_comment_like(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<LikeToggle>>;
    async fn count_comments(&self, recipe_id: Uuid) -> anyhow::Result<CommentCounts>;

    // ---- meal plans ----

    async fn find_meal_plan(&self, user_id: Uuid, date: Date) -> anyhow::Result<Option<MealPlan>>;
    /// Ascending by date.
    async fn list_meal_plans(&self, user_id: Uuid) -> anyhow::Result<Vec<MealPlan>>;
    /// Replaces one slot, creating the plan if needed. Other slots are untouched.
    async fn replace_slot(
        &self,
        user_id: Uuid,
        date: Date,
        slot: MealType,
        recipes: &[Recipe],
    ) -> anyhow::Result<MealPlan>;
    async fn delete_meal_plan(&self, user_id: Uuid, date: Date) -> anyhow::Result<bool>;

    // ---- shopping lists ----

    async fn shopping_list(&self, user_id: Uuid) -> anyhow::Result<Vec<ShoppingListItem>>;
    async fn replace_shopping_list(
        &self,
        user_id: Uuid,
        items: &[ShoppingListItem],
    ) -> anyhow::Result<()>;
}
