//! Ingredient aggregation for shopping lists.
//!
//! Occurrences of an ingredient across one day's meals fold into a single item
//! keyed by the lower-cased name. Amounts are free text; only a leading number
//! counts toward the sum, anything else adds zero but still leaves provenance.

use std::collections::{BTreeMap, HashMap};

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use time::Date;

use super::repo_types::{dedup_key, MealInfo, ShoppingListItem};
use crate::{
    meal_plans::repo_types::{MealPlan, MealType},
    serde_ext::iso_date,
};

/// Leading decimal number of `raw`, or 0 when there is none.
pub fn parse_amount(raw: &str) -> f64 {
    lazy_static! {
        static ref LEADING_NUMBER: Regex =
            Regex::new(r"^\s*[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").unwrap();
    }
    LEADING_NUMBER
        .find(raw)
        .and_then(|m| m.as_str().trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

pub fn display_amount(total: f64, occurrences: u32) -> String {
    if occurrences > 1 {
        format!("{total} (x{occurrences})")
    } else {
        format!("{total}")
    }
}

/// One item per distinct ingredient of the plan, in first-seen order walking
/// breakfast, lunch, dinner, snack. The unit is the first occurrence's.
pub fn generate_for_plan(plan: &MealPlan) -> Vec<ShoppingListItem> {
    let mut items: Vec<ShoppingListItem> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for meal_type in MealType::ALL {
        for recipe in plan.slot(meal_type) {
            for ingredient in &recipe.ingredients {
                let key = dedup_key(&ingredient.name);
                let amount = parse_amount(&ingredient.amount);
                let info = MealInfo {
                    date: plan.date,
                    meal_type,
                    recipe_name: recipe.name.clone(),
                };

                match index.get(&key) {
                    Some(&i) => {
                        let item = &mut items[i];
                        item.total += amount;
                        item.occurrences += 1;
                        if !item.recipe_names.contains(&recipe.name) {
                            item.recipe_names.push(recipe.name.clone());
                        }
                        item.meal_info.push(info);
                    }
                    None => {
                        index.insert(key.clone(), items.len());
                        items.push(ShoppingListItem {
                            ingredient: key,
                            amount: String::new(),
                            total: amount,
                            occurrences: 1,
                            unit: ingredient.unit.clone(),
                            checked: false,
                            recipe_names: vec![recipe.name.clone()],
                            meal_info: vec![info],
                        });
                    }
                }
            }
        }
    }

    for item in &mut items {
        item.amount = display_amount(item.total, item.occurrences);
    }
    items
}

/// Appends generated items whose key is not on the list yet. Existing items
/// are never touched. Returns how many were added.
pub fn merge_into(existing: &mut Vec<ShoppingListItem>, generated: Vec<ShoppingListItem>) -> usize {
    let mut added = 0;
    for item in generated {
        let key = item.key();
        if !existing.iter().any(|e| e.key() == key) {
            existing.push(item);
            added += 1;
        }
    }
    added
}

/// Drops blank ingredients and later duplicates of a key.
pub fn normalize(items: Vec<ShoppingListItem>) -> Vec<ShoppingListItem> {
    let mut out: Vec<ShoppingListItem> = Vec::with_capacity(items.len());
    for mut item in items {
        item.ingredient = item.ingredient.trim().to_string();
        if item.ingredient.is_empty() {
            continue;
        }
        if !out.iter().any(|o| o.key() == item.key()) {
            out.push(item);
        }
    }
    out
}

/// Flips `checked` on the item with `key`; returns the new value.
pub fn toggle_checked(items: &mut [ShoppingListItem], key: &str) -> Option<bool> {
    let key = dedup_key(key);
    items.iter_mut().find(|i| i.key() == key).map(|item| {
        item.checked = !item.checked;
        item.checked
    })
}

pub fn remove(items: &mut Vec<ShoppingListItem>, key: &str) -> bool {
    let key = dedup_key(key);
    let before = items.len();
    items.retain(|i| i.key() != key);
    items.len() != before
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedEntry {
    pub ingredient: String,
    pub amount: String,
    pub unit: String,
    pub checked: bool,
    /// Recipes of this date and meal that use the ingredient.
    pub recipe_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealGroup {
    pub meal_type: MealType,
    pub items: Vec<GroupedEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayGroup {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub meals: Vec<MealGroup>,
}

/// Regroups items by the date and meal of each provenance record. An item used
/// by several meals shows up under each of them, once per group.
pub fn group_by_date(items: &[ShoppingListItem]) -> Vec<DayGroup> {
    let mut groups: BTreeMap<(Date, MealType), Vec<GroupedEntry>> = BTreeMap::new();

    for item in items {
        for info in &item.meal_info {
            let entries = groups.entry((info.date, info.meal_type)).or_default();
            match entries.iter_mut().find(|e| e.ingredient == item.ingredient) {
                Some(entry) => {
                    if !entry.recipe_names.contains(&info.recipe_name) {
                        entry.recipe_names.push(info.recipe_name.clone());
                    }
                }
                None => entries.push(GroupedEntry {
                    ingredient: item.ingredient.clone(),
                    amount: item.amount.clone(),
                    unit: item.unit.clone(),
                    checked: item.checked,
                    recipe_names: vec![info.recipe_name.clone()],
                }),
            }
        }
    }

    let mut days: Vec<DayGroup> = Vec::new();
    for ((date, meal_type), items) in groups {
        let meal = MealGroup { meal_type, items };
        match days.last_mut() {
            Some(day) if day.date == date => day.meals.push(meal),
            _ => days.push(DayGroup {
                date,
                meals: vec![meal],
            }),
        }
    }
    days
}

/// Plain-text list, one `✓`/`○ ingredient - amount unit` line per item.
pub fn export_text(items: &[ShoppingListItem]) -> String {
    items
        .iter()
        .map(|i| {
            let mark = if i.checked { "✓" } else { "○" };
            format!("{mark} {} - {} {}", i.ingredient, i.amount, i.unit)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
