use std::collections::HashMap;

use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{MembershipToggle, Store, UserMirrors};
use crate::{
    comments::repo_types::{Comment, CommentCounts, LikeToggle},
    identity::repo_types::{HealthProfile, User},
    meal_plans::repo_types::{MealPlan, MealType},
    recipes::{
        moderation::ListMode,
        repo_types::{Recipe, RecipeCounters},
        social::{flip_membership, rebuild_mirror, SocialKind},
    },
    shopping::repo_types::ShoppingListItem,
};

#[derive(Default)]
struct Collections {
    users: HashMap<Uuid, User>,
    recipes: HashMap<Uuid, Recipe>,
    comments: HashMap<Uuid, Comment>,
    meal_plans: HashMap<(Uuid, Date), MealPlan>,
    shopping_lists: HashMap<Uuid, Vec<ShoppingListItem>>,
}

/// Process-local store. One lock over all collections, so every call is atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Top-level comments plus replies whose parent is still a live top-level comment.
fn visible_counts(comments: &HashMap<Uuid, Comment>, recipe_id: Uuid) -> CommentCounts {
    let mut counts = CommentCounts::default();
    for c in comments.values().filter(|c| c.recipe_id == recipe_id) {
        match c.parent_id {
            None => counts.top_level += 1,
            Some(parent) => {
                if comments.get(&parent).is_some_and(|p| p.parent_id.is_none()) {
                    counts.replies += 1;
                }
            }
        }
    }
    counts
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.inner.lock().await.users.get(&id).cloned())
    }

    async fn ensure_user(&self, id: Uuid, email: &str, name: Option<&str>) -> anyhow::Result<User> {
        let mut db = self.inner.lock().await;
        let user = db
            .users
            .entry(id)
            .or_insert_with(|| User::new(id, email, name.map(str::to_string)));
        Ok(user.clone())
    }

    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        let mut users: Vec<User> = self.inner.lock().await.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn set_user_locked(&self, id: Uuid, locked: bool) -> anyhow::Result<Option<User>> {
        let mut db = self.inner.lock().await;
        Ok(db.users.get_mut(&id).map(|u| {
            u.locked = locked;
            u.updated_at = OffsetDateTime::now_utc();
            u.clone()
        }))
    }

    async fn set_health_profile(
        &self,
        id: Uuid,
        profile: &HealthProfile,
    ) -> anyhow::Result<Option<User>> {
        let mut db = self.inner.lock().await;
        Ok(db.users.get_mut(&id).map(|u| {
            u.health_profile = Some(profile.clone());
            u.updated_at = OffsetDateTime::now_utc();
            u.clone()
        }))
    }

    async fn delete_user(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.inner.lock().await.users.remove(&id).is_some())
    }

    async fn mirror_membership(
        &self,
        user_id: Uuid,
        kind: SocialKind,
        recipe_id: Uuid,
        active: bool,
    ) -> anyhow::Result<Option<Vec<Uuid>>> {
        let mut db = self.inner.lock().await;
        let Some(user) = db.users.get_mut(&user_id) else {
            return Ok(None);
        };
        let list = match kind {
            SocialKind::Like => &mut user.liked_recipes,
            SocialKind::Save => &mut user.saved_recipes,
        };
        let present = list.contains(&recipe_id);
        if active && !present {
            list.push(recipe_id);
        } else if !active && present {
            list.retain(|id| *id != recipe_id);
        }
        Ok(Some(list.clone()))
    }

    async fn rebuild_user_mirrors(&self, user_id: Uuid) -> anyhow::Result<Option<UserMirrors>> {
        let mut db = self.inner.lock().await;
        let mut liked_members = Vec::new();
        let mut saved_members = Vec::new();
        for r in db.recipes.values() {
            if r.liked_by.contains(&user_id) {
                liked_members.push(r.id);
            }
            if r.saved_by.contains(&user_id) {
                saved_members.push(r.id);
            }
        }
        let Some(user) = db.users.get_mut(&user_id) else {
            return Ok(None);
        };
        user.liked_recipes = rebuild_mirror(&user.liked_recipes, &liked_members);
        user.saved_recipes = rebuild_mirror(&user.saved_recipes, &saved_members);
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(UserMirrors {
            liked: user.liked_recipes.clone(),
            saved: user.saved_recipes.clone(),
        }))
    }

    async fn find_recipe(&self, id: Uuid) -> anyhow::Result<Option<Recipe>> {
        Ok(self.inner.lock().await.recipes.get(&id).cloned())
    }

    async fn list_recipes(&self, mode: &ListMode) -> anyhow::Result<Vec<Recipe>> {
        let mut recipes: Vec<Recipe> = self
            .inner
            .lock()
            .await
            .recipes
            .values()
            .filter(|r| mode.admits(r))
            .cloned()
            .collect();
        recipes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(recipes)
    }

    async fn insert_recipe(&self, recipe: &Recipe) -> anyhow::Result<()> {
        let mut db = self.inner.lock().await;
        anyhow::ensure!(
            !db.recipes.contains_key(&recipe.id),
            "duplicate recipe id {}",
            recipe.id
        );
        db.recipes.insert(recipe.id, recipe.clone());
        Ok(())
    }

    async fn update_recipe(&self, recipe: &Recipe) -> anyhow::Result<bool> {
        let mut db = self.inner.lock().await;
        let Some(stored) = db.recipes.get_mut(&recipe.id) else {
            return Ok(false);
        };
        let mut next = recipe.clone();
        next.liked_by = std::mem::take(&mut stored.liked_by);
        next.saved_by = std::mem::take(&mut stored.saved_by);
        next.likes_count = stored.likes_count;
        next.saves_count = stored.saves_count;
        next.comments_count = stored.comments_count;
        next.created_at = stored.created_at;
        *stored = next;
        Ok(true)
    }

    async fn delete_recipe(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.inner.lock().await.recipes.remove(&id).is_some())
    }

    async fn toggle_membership(
        &self,
        recipe_id: Uuid,
        kind: SocialKind,
        user_id: Uuid,
    ) -> anyhow::Result<Option<MembershipToggle>> {
        let mut db = self.inner.lock().await;
        let Some(recipe) = db.recipes.get_mut(&recipe_id) else {
            return Ok(None);
        };
        let active = match kind {
            SocialKind::Like => flip_membership(&mut recipe.liked_by, &mut recipe.likes_count, user_id),
            SocialKind::Save => flip_membership(&mut recipe.saved_by, &mut recipe.saves_count, user_id),
        };
        Ok(Some(MembershipToggle {
            active,
            counters: RecipeCounters::from(&*recipe),
        }))
    }

    async fn adjust_comments_count(
        &self,
        recipe_id: Uuid,
        delta: i64,
    ) -> anyhow::Result<Option<RecipeCounters>> {
        let mut db = self.inner.lock().await;
        Ok(db.recipes.get_mut(&recipe_id).map(|r| {
            r.comments_count = (r.comments_count + delta).max(0);
            RecipeCounters::from(&*r)
        }))
    }

    async fn recount_recipe(&self, recipe_id: Uuid) -> anyhow::Result<Option<RecipeCounters>> {
        let mut db = self.inner.lock().await;
        let visible = visible_counts(&db.comments, recipe_id).total() as i64;
        Ok(db.recipes.get_mut(&recipe_id).map(|r| {
            r.likes_count = r.liked_by.len() as i64;
            r.saves_count = r.saved_by.len() as i64;
            r.comments_count = visible;
            RecipeCounters::from(&*r)
        }))
    }

    async fn find_comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        Ok(self.inner.lock().await.comments.get(&id).cloned())
    }

    async fn list_comments(&self, recipe_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        let mut comments: Vec<Comment> = self
            .inner
            .lock()
            .await
            .comments
            .values()
            .filter(|c| c.recipe_id == recipe_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments)
    }

    async fn insert_comment(&self, comment: &Comment) -> anyhow::Result<()> {
        self.inner
            .lock()
            .await
            .comments
            .insert(comment.id, comment.clone());
        Ok(())
    }

    async fn update_comment_content(
        &self,
        id: Uuid,
        content: &str,
        at: OffsetDateTime,
    ) -> anyhow::Result<Option<Comment>> {
        let mut db = self.inner.lock().await;
        Ok(db.comments.get_mut(&id).map(|c| {
            c.content = content.to_string();
            c.updated_at = Some(at);
            c.clone()
        }))
    }

    async fn delete_comment(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.inner.lock().await.comments.remove(&id).is_some())
    }

    async fn toggle_comment_like(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<LikeToggle>> {
        let mut db = self.inner.lock().await;
        Ok(db.comments.get_mut(&id).map(|c| {
            let is_liked = if c.likes.contains(&user_id) {
                c.likes.retain(|u| *u != user_id);
                false
            } else {
                c.likes.push(user_id);
                true
            };
            LikeToggle {
                is_liked,
                likes_count: c.likes.len(),
            }
        }))
    }

    async fn count_comments(&self, recipe_id: Uuid) -> anyhow::Result<CommentCounts> {
        Ok(visible_counts(&self.inner.lock().await.comments, recipe_id))
    }

    async fn find_meal_plan(&self, user_id: Uuid, date: Date) -> anyhow::Result<Option<MealPlan>> {
        Ok(self
            .inner
            .lock()
            .await
            .meal_plans
            .get(&(user_id, date))
            .cloned())
    }

    async fn list_meal_plans(&self, user_id: Uuid) -> anyhow::Result<Vec<MealPlan>> {
        let mut plans: Vec<MealPlan> = self
            .inner
            .lock()
            .await
            .meal_plans
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        plans.sort_by_key(|p| p.date);
        Ok(plans)
    }

    async fn replace_slot(
        &self,
        user_id: Uuid,
        date: Date,
        slot: MealType,
        recipes: &[Recipe],
    ) -> anyhow::Result<MealPlan> {
        let mut db = self.inner.lock().await;
        let plan = db
            .meal_plans
            .entry((user_id, date))
            .or_insert_with(|| MealPlan::new(user_id, date));
        *plan.slot_mut(slot) = recipes.to_vec();
        plan.updated_at = OffsetDateTime::now_utc();
        Ok(plan.clone())
    }

    async fn delete_meal_plan(&self, user_id: Uuid, date: Date) -> anyhow::Result<bool> {
        Ok(self
            .inner
            .lock()
            .await
            .meal_plans
            .remove(&(user_id, date))
            .is_some())
    }

    async fn shopping_list(&self, user_id: Uuid) -> anyhow::Result<Vec<ShoppingListItem>> {
        Ok(self
            .inner
            .lock()
            .await
            .shopping_lists
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_shopping_list(
        &self,
        user_id: Uuid,
        items: &[ShoppingListItem],
    ) -> anyhow::Result<()> {
        self.inner
            .lock()
            .await
            .shopping_lists
            .insert(user_id, items.to_vec());
        Ok(())
    }
}
