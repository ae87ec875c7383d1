use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use super::repo_types::{MealPlan, MealType};
use crate::{error::AppError, serde_ext::iso_date};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanList {
    pub success: bool,
    pub meal_plans: Vec<MealPlan>,
}

/// `mealPlan` is `null` after the last meal of a day was removed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanEnvelope {
    pub success: bool,
    pub meal_plan: Option<MealPlan>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMealRequest {
    pub recipe_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceSlotRequest {
    pub recipe_ids: Vec<Uuid>,
}

pub fn parse_date(raw: &str) -> Result<Date, AppError> {
    iso_date::parse(raw)
        .ok_or_else(|| AppError::validation(format!("invalid date `{raw}`, expected YYYY-MM-DD")))
}

pub fn parse_slot(raw: &str) -> Result<MealType, AppError> {
    raw.parse().map_err(AppError::Validation)
}
