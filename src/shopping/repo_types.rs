use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    meal_plans::repo_types::MealType,
    serde_ext::{amount_text, iso_date},
};

/// Which meal occurrence contributed an ingredient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealInfo {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub meal_type: MealType,
    pub recipe_name: String,
}

/// One line of a user's shopping list, identified by its lower-cased ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListItem {
    pub ingredient: String,
    /// Display amount: `"300"` or `"300 (x2)"` for merged occurrences.
    #[serde(deserialize_with = "amount_text", default)]
    pub amount: String,
    /// Numeric sum behind `amount`.
    #[serde(default)]
    pub total: f64,
    #[serde(default = "one")]
    pub occurrences: u32,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub recipe_names: Vec<String>,
    #[serde(default)]
    pub meal_info: Vec<MealInfo>,
}

fn one() -> u32 {
    1
}

impl ShoppingListItem {
    pub fn key(&self) -> String {
        dedup_key(&self.ingredient)
    }
}

pub fn dedup_key(ingredient: &str) -> String {
    ingredient.to_lowercase()
}
