//! Like/save toggles on recipes.
//!
//! Two writes per toggle: the membership flip on the recipe document (which
//! also moves the counter) and the mirror on the user document. They are not
//! atomic together; a failure between them is logged and left for the
//! maintenance reconcile to repair.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::{moderation, repo_types::RecipeCounters};
use crate::{
    error::{AppError, AppResult},
    identity::Identity,
    state::AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialKind {
    Like,
    Save,
}

impl SocialKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SocialKind::Like => "like",
            SocialKind::Save => "save",
        }
    }
}

/// Flips `user_id` in `members` and moves `count` with it, never below zero.
/// Returns the new membership state.
pub fn flip_membership(members: &mut Vec<Uuid>, count: &mut i64, user_id: Uuid) -> bool {
    if let Some(pos) = members.iter().position(|m| *m == user_id) {
        members.remove(pos);
        *count = (*count - 1).max(0);
        false
    } else {
        members.push(user_id);
        *count += 1;
        true
    }
}

/// Mirror list rebuilt from recipe membership: ids of the current mirror that
/// are still members keep their order, duplicates dropped, then the members the
/// mirror was missing are appended in id order.
pub fn rebuild_mirror(current: &[Uuid], members: &[Uuid]) -> Vec<Uuid> {
    let member_set: HashSet<Uuid> = members.iter().copied().collect();
    let mut seen = HashSet::with_capacity(member_set.len());
    let mut out: Vec<Uuid> = current
        .iter()
        .copied()
        .filter(|id| member_set.contains(id) && seen.insert(*id))
        .collect();
    let mut missing: Vec<Uuid> = member_set.into_iter().filter(|id| !seen.contains(id)).collect();
    missing.sort();
    out.extend(missing);
    out
}

#[derive(Debug, Clone)]
pub struct ToggleOutcome {
    pub kind: SocialKind,
    pub active: bool,
    pub counters: RecipeCounters,
    /// The user's full mirror list after the toggle.
    pub mirror: Vec<Uuid>,
}

impl ToggleOutcome {
    pub fn count(&self) -> i64 {
        match self.kind {
            SocialKind::Like => self.counters.likes_count,
            SocialKind::Save => self.counters.saves_count,
        }
    }
}

pub async fn toggle(
    state: &AppState,
    who: &Identity,
    recipe_id: Uuid,
    kind: SocialKind,
) -> AppResult<ToggleOutcome> {
    let recipe = state
        .store
        .find_recipe(recipe_id)
        .await?
        .filter(|r| moderation::can_view(r, Some(who)))
        .ok_or(AppError::NotFound("recipe"))?;

    state
        .store
        .ensure_user(who.user_id, &who.email, who.name.as_deref())
        .await?;

    let flipped = state
        .store
        .toggle_membership(recipe.id, kind, who.user_id)
        .await?
        .ok_or(AppError::NotFound("recipe"))?;
    state.events.publish(flipped.counters);

    let mirror = match state
        .store
        .mirror_membership(who.user_id, kind, recipe.id, flipped.active)
        .await
    {
        Ok(Some(list)) => list,
        Ok(None) => {
            warn!(consistency_risk = true, user_id = %who.user_id, %recipe_id, kind = kind.as_str(), "user record vanished before mirror write");
            return Err(AppError::Internal(anyhow::anyhow!("user record missing")));
        }
        Err(e) => {
            warn!(consistency_risk = true, user_id = %who.user_id, %recipe_id, kind = kind.as_str(), error = %e, "mirror write failed after counter update");
            return Err(e.into());
        }
    };

    info!(user_id = %who.user_id, %recipe_id, kind = kind.as_str(), active = flipped.active, "recipe toggled");
    Ok(ToggleOutcome {
        kind,
        active: flipped.active,
        counters: flipped.counters,
        mirror,
    })
}
