use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::{MembershipToggle, Store, UserMirrors};
use crate::{
    comments::repo_types::{Comment, CommentCounts, LikeToggle},
    identity::repo_types::{HealthProfile, User},
    meal_plans::repo_types::{MealPlan, MealType},
    recipes::{
        moderation::ListMode,
        repo_types::{Ingredient, Nutrition, Recipe, RecipeCounters},
        social::SocialKind,
    },
    shopping::repo_types::ShoppingListItem,
};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const USER_COLUMNS: &str = "id, email, name, locked, liked_recipes, saved_recipes, \
     health_profile, created_at, updated_at";

const RECIPE_COLUMNS: &str = "id, name, description, image, category, cuisine, prep_time, \
     cook_time, servings, difficulty, ingredients, instructions, nutrition, tags, status, \
     author_id, author_email, liked_by, saved_by, likes_count, saves_count, comments_count, \
     created_at, updated_at, reviewed_at, review_note";

const COMMENT_COLUMNS: &str =
    "id, recipe_id, parent_id, user_id, user_name, user_email, content, likes, created_at, updated_at";

const MEAL_PLAN_COLUMNS: &str =
    "id, user_id, date, breakfast, lunch, dinner, snack, created_at, updated_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: Option<String>,
    locked: bool,
    liked_recipes: Vec<Uuid>,
    saved_recipes: Vec<Uuid>,
    health_profile: Option<Json<HealthProfile>>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            email: r.email,
            name: r.name,
            locked: r.locked,
            liked_recipes: r.liked_recipes,
            saved_recipes: r.saved_recipes,
            health_profile: r.health_profile.map(|Json(p)| p),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct RecipeRow {
    id: Uuid,
    name: String,
    description: String,
    image: String,
    category: String,
    cuisine: String,
    prep_time: i32,
    cook_time: i32,
    servings: i32,
    difficulty: String,
    ingredients: Json<Vec<Ingredient>>,
    instructions: Json<Vec<String>>,
    nutrition: Option<Json<Nutrition>>,
    tags: Json<Vec<String>>,
    status: Option<String>,
    author_id: Option<Uuid>,
    author_email: Option<String>,
    liked_by: Vec<Uuid>,
    saved_by: Vec<Uuid>,
    likes_count: i64,
    saves_count: i64,
    comments_count: i64,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    reviewed_at: Option<OffsetDateTime>,
    review_note: Option<String>,
}

impl TryFrom<RecipeRow> for Recipe {
    type Error = anyhow::Error;

    fn try_from(r: RecipeRow) -> anyhow::Result<Self> {
        let status = r
            .status
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(anyhow::Error::msg)?;
        Ok(Self {
            id: r.id,
            name: r.name,
            description: r.description,
            image: r.image,
            category: r.category,
            cuisine: r.cuisine,
            prep_time: r.prep_time,
            cook_time: r.cook_time,
            servings: r.servings,
            difficulty: r.difficulty,
            ingredients: r.ingredients.0,
            instructions: r.instructions.0,
            nutrition: r.nutrition.map(|Json(n)| n),
            tags: r.tags.0,
            status,
            author_id: r.author_id,
            author_email: r.author_email,
            liked_by: r.liked_by,
            saved_by: r.saved_by,
            likes_count: r.likes_count,
            saves_count: r.saves_count,
            comments_count: r.comments_count,
            created_at: r.created_at,
            updated_at: r.updated_at,
            reviewed_at: r.reviewed_at,
            review_note: r.review_note,
        })
    }
}

#[derive(Debug, FromRow)]
struct CommentRow {
    id: Uuid,
    recipe_id: Uuid,
    parent_id: Option<Uuid>,
    user_id: Uuid,
    user_name: String,
    user_email: String,
    content: String,
    likes: Vec<Uuid>,
    created_at: OffsetDateTime,
    updated_at: Option<OffsetDateTime>,
}

impl From<CommentRow> for Comment {
    fn from(r: CommentRow) -> Self {
        Self {
            id: r.id,
            recipe_id: r.recipe_id,
            parent_id: r.parent_id,
            user_id: r.user_id,
            user_name: r.user_name,
            user_email: r.user_email,
            content: r.content,
            likes: r.likes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MealPlanRow {
    id: Uuid,
    user_id: Uuid,
    date: Date,
    breakfast: Json<Vec<Recipe>>,
    lunch: Json<Vec<Recipe>>,
    dinner: Json<Vec<Recipe>>,
    snack: Json<Vec<Recipe>>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<MealPlanRow> for MealPlan {
    fn from(r: MealPlanRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            date: r.date,
            breakfast: r.breakfast.0,
            lunch: r.lunch.0,
            dinner: r.dinner.0,
            snack: r.snack.0,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CountersRow {
    recipe_id: Uuid,
    likes_count: i64,
    saves_count: i64,
    comments_count: i64,
}

impl From<CountersRow> for RecipeCounters {
    fn from(r: CountersRow) -> Self {
        Self {
            recipe_id: r.recipe_id,
            likes_count: r.likes_count,
            saves_count: r.saves_count,
            comments_count: r.comments_count,
        }
    }
}

fn membership_columns(kind: SocialKind) -> (&'static str, &'static str) {
    match kind {
        SocialKind::Like => ("liked_by", "likes_count"),
        SocialKind::Save => ("saved_by", "saves_count"),
    }
}

fn mirror_column(kind: SocialKind) -> &'static str {
    match kind {
        SocialKind::Like => "liked_recipes",
        SocialKind::Save => "saved_recipes",
    }
}

/// Array expression that keeps the order of current mirror entries still present
/// in the recipe set and appends missing recipe ids sorted by id.
fn mirror_rebuild_expr(user_col: &str, recipe_col: &str) -> String {
    format!(
        r#"ARRAY(
                SELECT m.id FROM (
                    SELECT DISTINCT ON (c.id) c.id, c.ord FROM (
                        SELECT x.id, x.ord FROM unnest(u.{user_col}) WITH ORDINALITY AS x(id, ord)
                        UNION ALL
                        SELECT r.id, 9223372036854775807::bigint FROM recipes r
                         WHERE u.id = ANY(r.{recipe_col})
                    ) c
                    WHERE EXISTS (
                        SELECT 1 FROM recipes r WHERE r.id = c.id AND u.id = ANY(r.{recipe_col}))
                    ORDER BY c.id, c.ord
                ) m
                ORDER BY m.ord, m.id)"#
    )
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user")?;
        Ok(row.map(User::from))
    }

    async fn ensure_user(&self, id: Uuid, email: &str, name: Option<&str>) -> anyhow::Result<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, email, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET email = users.email
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(email)
        .bind(name)
        .fetch_one(&self.db)
        .await
        .context("ensure user")?;
        Ok(row.into())
    }

    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn set_user_locked(&self, id: Uuid, locked: bool) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET locked = $2, updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(locked)
        .fetch_optional(&self.db)
        .await
        .context("set user locked")?;
        Ok(row.map(User::from))
    }

    async fn set_health_profile(
        &self,
        id: Uuid,
        profile: &HealthProfile,
    ) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET health_profile = $2, updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(Json(profile))
        .fetch_optional(&self.db)
        .await
        .context("set health profile")?;
        Ok(row.map(User::from))
    }

    async fn delete_user(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete user")?;
        Ok(res.rows_affected() > 0)
    }

    async fn mirror_membership(
        &self,
        user_id: Uuid,
        kind: SocialKind,
        recipe_id: Uuid,
        active: bool,
    ) -> anyhow::Result<Option<Vec<Uuid>>> {
        let col = mirror_column(kind);
        let list = sqlx::query_scalar::<_, Vec<Uuid>>(&format!(
            r#"
            UPDATE users
               SET {col} = CASE
                       WHEN $3 AND $2 = ANY({col}) THEN {col}
                       WHEN $3 THEN array_append({col}, $2)
                       ELSE array_remove({col}, $2)
                   END,
                   updated_at = now()
             WHERE id = $1
            RETURNING {col}
            "#
        ))
        .bind(user_id)
        .bind(recipe_id)
        .bind(active)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("mirror {} membership", kind.as_str()))?;
        Ok(list)
    }

    async fn rebuild_user_mirrors(&self, user_id: Uuid) -> anyhow::Result<Option<UserMirrors>> {
        let row = sqlx::query_as::<_, (Vec<Uuid>, Vec<Uuid>)>(&format!(
            r#"
            UPDATE users u
               SET liked_recipes = {liked},
                   saved_recipes = {saved},
                   updated_at = now()
             WHERE u.id = $1
            RETURNING u.liked_recipes, u.saved_recipes
            "#,
            liked = mirror_rebuild_expr("liked_recipes", "liked_by"),
            saved = mirror_rebuild_expr("saved_recipes", "saved_by"),
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("rebuild user mirrors")?;
        Ok(row.map(|(liked, saved)| UserMirrors { liked, saved }))
    }

    async fn find_recipe(&self, id: Uuid) -> anyhow::Result<Option<Recipe>> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find recipe")?;
        row.map(Recipe::try_from).transpose()
    }

    async fn list_recipes(&self, mode: &ListMode) -> anyhow::Result<Vec<Recipe>> {
        let (filter, status) = match mode {
            ListMode::Public => ("WHERE status = 'approved' OR status IS NULL", None),
            ListMode::All { status: None } => ("", None),
            ListMode::All { status: Some(s) } => ("WHERE status = $1", Some(s.as_str())),
        };
        let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes {filter} ORDER BY created_at DESC");
        let mut query = sqlx::query_as::<_, RecipeRow>(&sql);
        if let Some(status) = status {
            query = query.bind(status);
        }
        let rows = query.fetch_all(&self.db).await.context("list recipes")?;
        rows.into_iter().map(Recipe::try_from).collect()
    }

    async fn insert_recipe(&self, recipe: &Recipe) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO recipes (id, name, description, image, category, cuisine, prep_time,
                                 cook_time, servings, difficulty, ingredients, instructions,
                                 nutrition, tags, status, author_id, author_email,
                                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                    $18, $19)
            "#,
        )
        .bind(recipe.id)
        .bind(&recipe.name)
        .bind(&recipe.description)
        .bind(&recipe.image)
        .bind(&recipe.category)
        .bind(&recipe.cuisine)
        .bind(recipe.prep_time)
        .bind(recipe.cook_time)
        .bind(recipe.servings)
        .bind(&recipe.difficulty)
        .bind(Json(&recipe.ingredients))
        .bind(Json(&recipe.instructions))
        .bind(recipe.nutrition.as_ref().map(Json))
        .bind(Json(&recipe.tags))
        .bind(recipe.status.map(|s| s.as_str()))
        .bind(recipe.author_id)
        .bind(recipe.author_email.as_deref())
        .bind(recipe.created_at)
        .bind(recipe.updated_at)
        .execute(&self.db)
        .await
        .context("insert recipe")?;
        Ok(())
    }

    async fn update_recipe(&self, recipe: &Recipe) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE recipes
               SET name = $2, description = $3, image = $4, category = $5, cuisine = $6,
                   prep_time = $7, cook_time = $8, servings = $9, difficulty = $10,
                   ingredients = $11, instructions = $12, nutrition = $13, tags = $14,
                   status = $15, updated_at = $16, reviewed_at = $17, review_note = $18
             WHERE id = $1
            "#,
        )
        .bind(recipe.id)
        .bind(&recipe.name)
        .bind(&recipe.description)
        .bind(&recipe.image)
        .bind(&recipe.category)
        .bind(&recipe.cuisine)
        .bind(recipe.prep_time)
        .bind(recipe.cook_time)
        .bind(recipe.servings)
        .bind(&recipe.difficulty)
        .bind(Json(&recipe.ingredients))
        .bind(Json(&recipe.instructions))
        .bind(recipe.nutrition.as_ref().map(Json))
        .bind(Json(&recipe.tags))
        .bind(recipe.status.map(|s| s.as_str()))
        .bind(recipe.updated_at)
        .bind(recipe.reviewed_at)
        .bind(recipe.review_note.as_deref())
        .execute(&self.db)
        .await
        .context("update recipe")?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_recipe(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete recipe")?;
        Ok(res.rows_affected() > 0)
    }

    async fn toggle_membership(
        &self,
        recipe_id: Uuid,
        kind: SocialKind,
        user_id: Uuid,
    ) -> anyhow::Result<Option<MembershipToggle>> {
        let (set, count) = membership_columns(kind);
        // SET sees the old row, RETURNING sees the new one.
        let row = sqlx::query_as::<_, (bool, Uuid, i64, i64, i64)>(&format!(
            r#"
            UPDATE recipes
               SET {set} = CASE WHEN $2 = ANY({set}) THEN array_remove({set}, $2)
                                ELSE array_append({set}, $2) END,
                   {count} = CASE WHEN $2 = ANY({set}) THEN GREATEST({count} - 1, 0)
                                  ELSE {count} + 1 END
             WHERE id = $1
            RETURNING $2 = ANY({set}), id, likes_count, saves_count, comments_count
            "#
        ))
        .bind(recipe_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("toggle recipe {}", kind.as_str()))?;

        Ok(row.map(|(active, recipe_id, likes_count, saves_count, comments_count)| {
            MembershipToggle {
                active,
                counters: RecipeCounters {
                    recipe_id,
                    likes_count,
                    saves_count,
                    comments_count,
                },
            }
        }))
    }

    async fn adjust_comments_count(
        &self,
        recipe_id: Uuid,
        delta: i64,
    ) -> anyhow::Result<Option<RecipeCounters>> {
        let row = sqlx::query_as::<_, CountersRow>(
            r#"
            UPDATE recipes
               SET comments_count = GREATEST(comments_count + $2, 0)
             WHERE id = $1
            RETURNING id AS recipe_id, likes_count, saves_count, comments_count
            "#,
        )
        .bind(recipe_id)
        .bind(delta)
        .fetch_optional(&self.db)
        .await
        .context("adjust comments count")?;
        Ok(row.map(RecipeCounters::from))
    }

    async fn recount_recipe(&self, recipe_id: Uuid) -> anyhow::Result<Option<RecipeCounters>> {
        let row = sqlx::query_as::<_, CountersRow>(
            r#"
            UPDATE recipes r
               SET likes_count = cardinality(r.liked_by),
                   saves_count = cardinality(r.saved_by),
                   comments_count = (
                       SELECT COUNT(*) FROM comments c
                        WHERE c.recipe_id = r.id
                          AND (c.parent_id IS NULL OR EXISTS (
                              SELECT 1 FROM comments p
                               WHERE p.id = c.parent_id AND p.parent_id IS NULL)))
             WHERE r.id = $1
            RETURNING r.id AS recipe_id, r.likes_count, r.saves_count, r.comments_count
            "#,
        )
        .bind(recipe_id)
        .fetch_optional(&self.db)
        .await
        .context("recount recipe")?;
        Ok(row.map(RecipeCounters::from))
    }

    async fn find_comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find comment")?;
        Ok(row.map(Comment::from))
    }

    async fn list_comments(&self, recipe_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE recipe_id = $1 ORDER BY created_at DESC"
        ))
        .bind(recipe_id)
        .fetch_all(&self.db)
        .await
        .context("list comments")?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn insert_comment(&self, comment: &Comment) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, recipe_id, parent_id, user_id, user_name, user_email,
                                  content, likes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(comment.id)
        .bind(comment.recipe_id)
        .bind(comment.parent_id)
        .bind(comment.user_id)
        .bind(&comment.user_name)
        .bind(&comment.user_email)
        .bind(&comment.content)
        .bind(&comment.likes)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&self.db)
        .await
        .context("insert comment")?;
        Ok(())
    }

    async fn update_comment_content(
        &self,
        id: Uuid,
        content: &str,
        at: OffsetDateTime,
    ) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            "UPDATE comments SET content = $2, updated_at = $3 WHERE id = $1 RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(content)
        .bind(at)
        .fetch_optional(&self.db)
        .await
        .context("update comment")?;
        Ok(row.map(Comment::from))
    }

    async fn delete_comment(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete comment")?;
        Ok(res.rows_affected() > 0)
    }

    async fn toggle_comment_like(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<LikeToggle>> {
        let row = sqlx::query_as::<_, (bool, i32)>(
            r#"
            UPDATE comments
               SET likes = CASE WHEN $2 = ANY(likes) THEN array_remove(likes, $2)
                                ELSE array_append(likes, $2) END
             WHERE id = $1
            RETURNING $2 = ANY(likes), cardinality(likes)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("toggle comment like")?;
        Ok(row.map(|(is_liked, count)| LikeToggle {
            is_liked,
            likes_count: usize::try_from(count).unwrap_or(0),
        }))
    }

    async fn count_comments(&self, recipe_id: Uuid) -> anyhow::Result<CommentCounts> {
        let (top_level, replies) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(*) FILTER (WHERE c.parent_id IS NULL),
                   COUNT(*) FILTER (WHERE c.parent_id IS NOT NULL AND EXISTS (
                       SELECT 1 FROM comments p
                        WHERE p.id = c.parent_id AND p.parent_id IS NULL))
              FROM comments c
             WHERE c.recipe_id = $1
            "#,
        )
        .bind(recipe_id)
        .fetch_one(&self.db)
        .await
        .context("count comments")?;
        Ok(CommentCounts {
            top_level: usize::try_from(top_level).unwrap_or(0),
            replies: usize::try_from(replies).unwrap_or(0),
        })
    }

    async fn find_meal_plan(&self, user_id: Uuid, date: Date) -> anyhow::Result<Option<MealPlan>> {
        let row = sqlx::query_as::<_, MealPlanRow>(&format!(
            "SELECT {MEAL_PLAN_COLUMNS} FROM meal_plans WHERE user_id = $1 AND date = $2"
        ))
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.db)
        .await
        .context("find meal plan")?;
        Ok(row.map(MealPlan::from))
    }

    async fn list_meal_plans(&self, user_id: Uuid) -> anyhow::Result<Vec<MealPlan>> {
        let rows = sqlx::query_as::<_, MealPlanRow>(&format!(
            "SELECT {MEAL_PLAN_COLUMNS} FROM meal_plans WHERE user_id = $1 ORDER BY date ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list meal plans")?;
        Ok(rows.into_iter().map(MealPlan::from).collect())
    }

    async fn replace_slot(
        &self,
        user_id: Uuid,
        date: Date,
        slot: MealType,
        recipes: &[Recipe],
    ) -> anyhow::Result<MealPlan> {
        let col = slot.as_str();
        let row = sqlx::query_as::<_, MealPlanRow>(&format!(
            r#"
            INSERT INTO meal_plans (id, user_id, date, {col})
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, date)
            DO UPDATE SET {col} = EXCLUDED.{col}, updated_at = now()
            RETURNING {MEAL_PLAN_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(date)
        .bind(Json(recipes))
        .fetch_one(&self.db)
        .await
        .with_context(|| format!("replace {col} slot"))?;
        Ok(row.into())
    }

    async fn delete_meal_plan(&self, user_id: Uuid, date: Date) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM meal_plans WHERE user_id = $1 AND date = $2")
            .bind(user_id)
            .bind(date)
            .execute(&self.db)
            .await
            .context("delete meal plan")?;
        Ok(res.rows_affected() > 0)
    }

    async fn shopping_list(&self, user_id: Uuid) -> anyhow::Result<Vec<ShoppingListItem>> {
        let items = sqlx::query_scalar::<_, Json<Vec<ShoppingListItem>>>(
            "SELECT items FROM shopping_lists WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("load shopping list")?;
        Ok(items.map(|Json(items)| items).unwrap_or_default())
    }

    async fn replace_shopping_list(
        &self,
        user_id: Uuid,
        items: &[ShoppingListItem],
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO shopping_lists (user_id, items, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (user_id)
            DO UPDATE SET items = EXCLUDED.items, updated_at = now()
            "#,
        )
        .bind(user_id)
        .bind(Json(items))
        .execute(&self.db)
        .await
        .context("replace shopping list")?;
        Ok(())
    }
}
