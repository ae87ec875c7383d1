use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::serde_ext::amount_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipeStatus {
    Pending,
    Approved,
    Rejected,
}

impl RecipeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RecipeStatus::Pending => "pending",
            RecipeStatus::Approved => "approved",
            RecipeStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RecipeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecipeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(RecipeStatus::Pending),
            "approved" => Ok(RecipeStatus::Approved),
            "rejected" => Ok(RecipeStatus::Rejected),
            other => Err(format!("unknown recipe status `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    #[serde(deserialize_with = "amount_text", default)]
    pub amount: String,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Stored recipe document.
///
/// `liked_by`/`saved_by` are the membership sets behind the denormalized
/// counters; they never leave the server. A recipe with no `status` predates
/// moderation and reads as approved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub cuisine: String,
    #[serde(default)]
    pub prep_time: i32,
    #[serde(default)]
    pub cook_time: i32,
    #[serde(default)]
    pub servings: i32,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub nutrition: Option<Nutrition>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RecipeStatus>,
    #[serde(default)]
    pub author_id: Option<Uuid>,
    #[serde(default)]
    pub author_email: Option<String>,
    #[serde(skip_serializing, default)]
    pub liked_by: Vec<Uuid>,
    #[serde(skip_serializing, default)]
    pub saved_by: Vec<Uuid>,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub saves_count: i64,
    #[serde(default)]
    pub comments_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub reviewed_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub review_note: Option<String>,
}

impl Recipe {
    pub fn effective_status(&self) -> RecipeStatus {
        self.status.unwrap_or(RecipeStatus::Approved)
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == Some(user_id)
    }
}

/// Editable body fields shared by create and update payloads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeBody {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub cuisine: Option<String>,
    pub prep_time: Option<i32>,
    pub cook_time: Option<i32>,
    pub servings: Option<i32>,
    pub difficulty: Option<String>,
    pub ingredients: Option<Vec<Ingredient>>,
    pub instructions: Option<Vec<String>>,
    pub nutrition: Option<Nutrition>,
    pub tags: Option<Vec<String>>,
}

impl RecipeBody {
    /// Copies every present field onto `recipe`; absent fields are left as they are.
    pub fn apply_to(self, recipe: &mut Recipe) {
        if let Some(v) = self.name {
            recipe.name = v.trim().to_string();
        }
        if let Some(v) = self.description {
            recipe.description = v;
        }
        if let Some(v) = self.image {
            recipe.image = v;
        }
        if let Some(v) = self.category {
            recipe.category = v;
        }
        if let Some(v) = self.cuisine {
            recipe.cuisine = v;
        }
        if let Some(v) = self.prep_time {
            recipe.prep_time = v;
        }
        if let Some(v) = self.cook_time {
            recipe.cook_time = v;
        }
        if let Some(v) = self.servings {
            recipe.servings = v;
        }
        if let Some(v) = self.difficulty {
            recipe.difficulty = v;
        }
        if let Some(v) = self.ingredients {
            recipe.ingredients = v;
        }
        if let Some(v) = self.instructions {
            recipe.instructions = v;
        }
        if let Some(v) = self.nutrition {
            recipe.nutrition = Some(v);
        }
        if let Some(v) = self.tags {
            recipe.tags = v;
        }
    }
}

/// Absolute counter values of one recipe, as returned after every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeCounters {
    pub recipe_id: Uuid,
    pub likes_count: i64,
    pub saves_count: i64,
    pub comments_count: i64,
}

impl From<&Recipe> for RecipeCounters {
    fn from(r: &Recipe) -> Self {
        Self {
            recipe_id: r.id,
            likes_count: r.likes_count,
            saves_count: r.saves_count,
            comments_count: r.comments_count,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn ingredient(name: &str, amount: &str, unit: &str) -> Ingredient {
        Ingredient {
            name: name.into(),
            amount: amount.into(),
            unit: unit.into(),
        }
    }

    pub fn recipe(name: &str, ingredients: Vec<Ingredient>) -> Recipe {
        let now = OffsetDateTime::now_utc();
        Recipe {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            image: String::new(),
            category: "món chính".into(),
            cuisine: "Bắc".into(),
            prep_time: 10,
            cook_time: 20,
            servings: 2,
            difficulty: "Dễ".into(),
            ingredients,
            instructions: vec![],
            nutrition: None,
            tags: vec![],
            status: Some(RecipeStatus::Approved),
            author_id: None,
            author_email: None,
            liked_by: vec![],
            saved_by: vec![],
            likes_count: 0,
            saves_count: 0,
            comments_count: 0,
            created_at: now,
            updated_at: now,
            reviewed_at: None,
            review_note: None,
        }
    }
}
