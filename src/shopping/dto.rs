use serde::{Deserialize, Serialize};

use super::{aggregate::DayGroup, repo_types::ShoppingListItem};

#[derive(Debug, Serialize)]
pub struct ShoppingListResponse {
    pub success: bool,
    pub items: Vec<ShoppingListItem>,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceListRequest {
    pub items: Vec<ShoppingListItem>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub added: usize,
    pub items: Vec<ShoppingListItem>,
}

#[derive(Debug, Serialize)]
pub struct GroupedResponse {
    pub success: bool,
    pub days: Vec<DayGroup>,
}
