use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{recipes::repo_types::Recipe, serde_ext::iso_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    /// Slot order used everywhere a plan is walked.
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MealType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown meal type `{s}`"))
    }
}

/// One user's plan for one calendar date. Slots hold full recipe snapshots
/// taken when the meal was added, not references.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(default)]
    pub breakfast: Vec<Recipe>,
    #[serde(default)]
    pub lunch: Vec<Recipe>,
    #[serde(default)]
    pub dinner: Vec<Recipe>,
    #[serde(default)]
    pub snack: Vec<Recipe>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl MealPlan {
    pub fn new(user_id: Uuid, date: Date) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            user_id,
            date,
            breakfast: Vec::new(),
            lunch: Vec::new(),
            dinner: Vec::new(),
            snack: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn slot(&self, meal_type: MealType) -> &[Recipe] {
        match meal_type {
            MealType::Breakfast => &self.breakfast,
            MealType::Lunch => &self.lunch,
            MealType::Dinner => &self.dinner,
            MealType::Snack => &self.snack,
        }
    }

    pub fn slot_mut(&mut self, meal_type: MealType) -> &mut Vec<Recipe> {
        match meal_type {
            MealType::Breakfast => &mut self.breakfast,
            MealType::Lunch => &mut self.lunch,
            MealType::Dinner => &mut self.dinner,
            MealType::Snack => &mut self.snack,
        }
    }

    pub fn is_empty(&self) -> bool {
        MealType::ALL.iter().all(|t| self.slot(*t).is_empty())
    }
}
