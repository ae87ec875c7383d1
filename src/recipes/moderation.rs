//! Moderation lifecycle of contributed recipes.
//!
//! `pending` on submission (admins skip straight to `approved`), then any
//! number of reviews. Review is accepted from every state, so an approved or
//! rejected recipe can be reviewed again.

use serde::Deserialize;
use time::OffsetDateTime;

use super::repo_types::{Recipe, RecipeStatus};
use crate::identity::{Identity, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

pub fn initial_status(author_role: Role) -> RecipeStatus {
    match author_role {
        Role::Admin => RecipeStatus::Approved,
        Role::User => RecipeStatus::Pending,
    }
}

pub fn review(recipe: &mut Recipe, decision: Decision, note: Option<String>, now: OffsetDateTime) {
    recipe.status = Some(match decision {
        Decision::Approve => RecipeStatus::Approved,
        Decision::Reject => RecipeStatus::Rejected,
    });
    recipe.review_note = Some(note.map(|n| n.trim().to_string()).unwrap_or_default());
    recipe.reviewed_at = Some(now);
    recipe.updated_at = now;
}

/// Status after `editor` changes a recipe's content. A rejected recipe
/// edited by a non-admin goes back to the queue; everything else keeps its status.
pub fn status_after_edit(current: Option<RecipeStatus>, editor: &Identity) -> Option<RecipeStatus> {
    match current {
        Some(RecipeStatus::Rejected) if !editor.is_admin() => Some(RecipeStatus::Pending),
        other => other,
    }
}

/// Listing visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    /// Approved recipes plus legacy ones without a status.
    Public,
    /// Everything, optionally narrowed to one explicit status.
    All { status: Option<RecipeStatus> },
}

impl ListMode {
    pub fn admits(&self, recipe: &Recipe) -> bool {
        match self {
            ListMode::Public => is_publicly_visible(recipe),
            ListMode::All { status: None } => true,
            ListMode::All {
                status: Some(wanted),
            } => recipe.status == Some(*wanted),
        }
    }
}

pub fn is_publicly_visible(recipe: &Recipe) -> bool {
    recipe.effective_status() == RecipeStatus::Approved
}

/// Whether `viewer` may open a single recipe regardless of its status.
pub fn can_view(recipe: &Recipe, viewer: Option<&Identity>) -> bool {
    is_publicly_visible(recipe)
        || viewer.is_some_and(|v| v.is_admin() || recipe.is_authored_by(v.user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::fixtures::{admin, user};
    use crate::recipes::repo_types::fixtures::recipe;

    #[test]
    fn admins_publish_directly_and_users_queue() {
        assert_eq!(initial_status(Role::Admin), RecipeStatus::Approved);
        assert_eq!(initial_status(Role::User), RecipeStatus::Pending);
    }

    #[test]
    fn reject_stamps_note_and_time() {
        let mut r = recipe("Bánh xèo", vec![]);
        r.status = Some(RecipeStatus::Pending);
        let now = OffsetDateTime::now_utc();
        review(&mut r, Decision::Reject, Some(" thiếu ảnh ".into()), now);
        assert_eq!(r.status, Some(RecipeStatus::Rejected));
        assert_eq!(r.review_note.as_deref(), Some("thiếu ảnh"));
        assert_eq!(r.reviewed_at, Some(now));
    }

    #[test]
    fn review_without_note_stores_empty_string() {
        let mut r = recipe("Cơm tấm", vec![]);
        review(&mut r, Decision::Reject, None, OffsetDateTime::now_utc());
        assert_eq!(r.review_note.as_deref(), Some(""));
    }

    #[test]
    fn rejected_recipe_can_be_re_reviewed() {
        let mut r = recipe("Canh chua", vec![]);
        review(&mut r, Decision::Reject, None, OffsetDateTime::now_utc());
        review(&mut r, Decision::Approve, None, OffsetDateTime::now_utc());
        assert_eq!(r.status, Some(RecipeStatus::Approved));
    }

    #[test]
    fn edits_by_owner_requeue_rejected_recipes_only() {
        let owner = user("cook@example.com");
        assert_eq!(
            status_after_edit(Some(RecipeStatus::Rejected), &owner),
            Some(RecipeStatus::Pending)
        );
        assert_eq!(
            status_after_edit(Some(RecipeStatus::Approved), &owner),
            Some(RecipeStatus::Approved)
        );
        assert_eq!(status_after_edit(None, &owner), None);
        assert_eq!(
            status_after_edit(Some(RecipeStatus::Rejected), &admin()),
            Some(RecipeStatus::Rejected)
        );
    }

    #[test]
    fn public_listing_admits_approved_and_legacy_only() {
        let mut legacy = recipe("Xôi", vec![]);
        legacy.status = None;
        let mut pending = recipe("Chả giò", vec![]);
        pending.status = Some(RecipeStatus::Pending);
        let mut rejected = recipe("Nem", vec![]);
        rejected.status = Some(RecipeStatus::Rejected);
        let approved = recipe("Bún bò", vec![]);

        assert!(ListMode::Public.admits(&legacy));
        assert!(ListMode::Public.admits(&approved));
        assert!(!ListMode::Public.admits(&pending));
        assert!(!ListMode::Public.admits(&rejected));

        let all = ListMode::All { status: None };
        assert!([&legacy, &pending, &rejected, &approved]
            .iter()
            .all(|r| all.admits(r)));

        let only_pending = ListMode::All {
            status: Some(RecipeStatus::Pending),
        };
        assert!(only_pending.admits(&pending));
        assert!(!only_pending.admits(&legacy));
    }

    #[test]
    fn pending_recipe_visible_to_author_and_admin() {
        let author = user("author@example.com");
        let stranger = user("x@example.com");
        let mut r = recipe("Bò kho", vec![]);
        r.status = Some(RecipeStatus::Pending);
        r.author_id = Some(author.user_id);

        assert!(can_view(&r, Some(&author)));
        assert!(can_view(&r, Some(&admin())));
        assert!(!can_view(&r, Some(&stranger)));
        assert!(!can_view(&r, None));
    }
}
