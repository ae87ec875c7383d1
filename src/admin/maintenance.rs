//! Counter and mirror repair.
//!
//! Toggles write the recipe and the user in two steps, so a crash between them
//! leaves the two sides disagreeing. The recipe membership sets are the source
//! of truth: counters are recomputed from them and user mirrors are rebuilt
//! from them.
//!
//! The scan only decides which documents drifted. Each repair is recomputed
//! by the store from the live document, so a toggle that lands between the
//! scan and the write is never overwritten.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    identity::{repo_types::User, Identity},
    recipes::{
        moderation::ListMode,
        repo_types::{Recipe, RecipeCounters},
        social::rebuild_mirror,
    },
    state::AppState,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorFix {
    pub user_id: Uuid,
    pub liked: Vec<Uuid>,
    pub saved: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairPlan {
    pub counters: Vec<RecipeCounters>,
    pub mirrors: Vec<MirrorFix>,
}

/// Computes the writes that bring counters and mirrors back in line.
/// `visible_comments` holds the rendered thread total per recipe; recipes
/// missing from it count as having no comments.
pub fn plan_repairs(
    recipes: &[Recipe],
    visible_comments: &HashMap<Uuid, i64>,
    users: &[User],
) -> RepairPlan {
    let mut plan = RepairPlan::default();

    let mut liked: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    let mut saved: HashMap<Uuid, Vec<Uuid>> = HashMap::new();

    for r in recipes {
        let want = RecipeCounters {
            recipe_id: r.id,
            likes_count: r.liked_by.len() as i64,
            saves_count: r.saved_by.len() as i64,
            comments_count: visible_comments.get(&r.id).copied().unwrap_or(0),
        };
        if want != RecipeCounters::from(r) {
            plan.counters.push(want);
        }
        for u in &r.liked_by {
            liked.entry(*u).or_default().push(r.id);
        }
        for u in &r.saved_by {
            saved.entry(*u).or_default().push(r.id);
        }
    }

    for u in users {
        let want_liked = rebuild_mirror(&u.liked_recipes, &liked.remove(&u.id).unwrap_or_default());
        let want_saved = rebuild_mirror(&u.saved_recipes, &saved.remove(&u.id).unwrap_or_default());
        if want_liked != u.liked_recipes || want_saved != u.saved_recipes {
            plan.mirrors.push(MirrorFix {
                user_id: u.id,
                liked: want_liked,
                saved: want_saved,
            });
        }
    }

    plan
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub recipes_scanned: usize,
    pub recipes_repaired: usize,
    pub users_repaired: usize,
}

/// Recomputes every document the plan names. The planned values are not
/// written; they only mark which recipes and users drifted.
pub async fn apply_repairs(state: &AppState, plan: &RepairPlan) -> AppResult<()> {
    for c in &plan.counters {
        match state.store.recount_recipe(c.recipe_id).await? {
            Some(fresh) => state.events.publish(fresh),
            None => warn!(recipe_id = %c.recipe_id, "recipe vanished before recount"),
        }
    }
    for m in &plan.mirrors {
        match state.store.rebuild_user_mirrors(m.user_id).await {
            Ok(Some(_)) => {}
            Ok(None) => warn!(user_id = %m.user_id, "user vanished before mirror repair"),
            Err(e) => {
                warn!(consistency_risk = true, user_id = %m.user_id, error = %e, "mirror repair failed");
                return Err(e.into());
            }
        }
    }
    Ok(())
}

pub async fn reconcile(state: &AppState, who: &Identity) -> AppResult<ReconcileReport> {
    if !who.is_admin() {
        return Err(AppError::forbidden("admin only"));
    }

    let recipes = state.store.list_recipes(&ListMode::All { status: None }).await?;
    let mut visible = HashMap::with_capacity(recipes.len());
    for r in &recipes {
        let counts = state.store.count_comments(r.id).await?;
        visible.insert(r.id, counts.total() as i64);
    }
    let users = state.store.list_users().await?;

    let plan = plan_repairs(&recipes, &visible, &users);
    apply_repairs(state, &plan).await?;

    let report = ReconcileReport {
        recipes_scanned: recipes.len(),
        recipes_repaired: plan.counters.len(),
        users_repaired: plan.mirrors.len(),
    };
    info!(
        recipes_scanned = report.recipes_scanned,
        recipes_repaired = report.recipes_repaired,
        users_repaired = report.users_repaired,
        "reconcile finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        comments::services as comments,
        events::Surface,
        identity::fixtures::{admin, user},
        recipes::{
            repo_types::fixtures::recipe,
            social::{self, SocialKind},
        },
    };

    #[test]
    fn counters_follow_membership_sets() {
        let u = Uuid::new_v4();
        let mut r = recipe("Phở", vec![]);
        r.liked_by = vec![u];
        r.likes_count = 5;
        r.saves_count = 2;

        let plan = plan_repairs(&[r.clone()], &HashMap::new(), &[]);
        assert_eq!(
            plan.counters,
            vec![RecipeCounters {
                recipe_id: r.id,
                likes_count: 1,
                saves_count: 0,
                comments_count: 0,
            }]
        );
    }

    #[test]
    fn consistent_data_needs_no_writes() {
        let mut u = User::new(Uuid::new_v4(), "a@example.com", None);
        let mut r = recipe("Bún", vec![]);
        r.liked_by = vec![u.id];
        r.likes_count = 1;
        r.comments_count = 2;
        u.liked_recipes = vec![r.id];

        let visible = HashMap::from([(r.id, 2)]);
        assert_eq!(plan_repairs(&[r], &visible, &[u]), RepairPlan::default());
    }

    #[test]
    fn mirrors_are_rebuilt_from_recipe_sets() {
        let mut u = User::new(Uuid::new_v4(), "a@example.com", None);
        let mut kept = recipe("Kept", vec![]);
        kept.liked_by = vec![u.id];
        kept.likes_count = 1;
        let mut missing = recipe("Missing", vec![]);
        missing.saved_by = vec![u.id];
        missing.saves_count = 1;
        let deleted = Uuid::new_v4();
        u.liked_recipes = vec![deleted, kept.id];

        let plan = plan_repairs(&[kept.clone(), missing.clone()], &HashMap::new(), &[u.clone()]);
        assert!(plan.counters.is_empty());
        assert_eq!(
            plan.mirrors,
            vec![MirrorFix {
                user_id: u.id,
                liked: vec![kept.id],
                saved: vec![missing.id],
            }]
        );
    }

    #[tokio::test]
    async fn reconcile_repairs_drift_end_to_end() {
        let state = AppState::fake();
        let cook = user("cook@example.com");
        let mut r = recipe("Bánh canh", vec![]);
        r.likes_count = 7;
        state.store.insert_recipe(&r).await.unwrap();

        let top = comments::post(&state, &cook, r.id, "ngon", None).await.unwrap();
        comments::post(&state, &cook, r.id, "thật", Some(top.comment.id)).await.unwrap();
        comments::delete(&state, &cook, top.comment.id).await.unwrap();

        let stale = state.store.find_recipe(r.id).await.unwrap().unwrap();
        assert_eq!(stale.comments_count, 1);

        assert!(matches!(
            reconcile(&state, &cook).await,
            Err(AppError::Forbidden(_))
        ));
        let report = reconcile(&state, &admin()).await.unwrap();
        assert_eq!(report.recipes_scanned, 1);
        assert_eq!(report.recipes_repaired, 1);

        let fixed = state.store.find_recipe(r.id).await.unwrap().unwrap();
        assert_eq!(fixed.likes_count, 0);
        assert_eq!(fixed.comments_count, 0);

        let again = reconcile(&state, &admin()).await.unwrap();
        assert_eq!(again.recipes_repaired, 0);
    }

    #[test]
    fn mirror_with_scattered_duplicates_is_repaired() {
        let mut u = User::new(Uuid::new_v4(), "a@example.com", None);
        let mut a = recipe("A", vec![]);
        a.liked_by = vec![u.id];
        a.likes_count = 1;
        let mut b = recipe("B", vec![]);
        b.liked_by = vec![u.id];
        b.likes_count = 1;
        u.liked_recipes = vec![a.id, b.id, a.id];

        let plan = plan_repairs(&[a.clone(), b.clone()], &HashMap::new(), &[u.clone()]);
        assert_eq!(
            plan.mirrors,
            vec![MirrorFix {
                user_id: u.id,
                liked: vec![a.id, b.id],
                saved: vec![],
            }]
        );
    }

    #[tokio::test]
    async fn toggle_between_scan_and_repair_is_not_lost() {
        let state = AppState::fake();
        let fan = user("fan@example.com");
        let mut r = recipe("Cơm tấm", vec![]);
        r.likes_count = 3;
        state.store.insert_recipe(&r).await.unwrap();

        let snapshot = state.store.list_recipes(&ListMode::All { status: None }).await.unwrap();
        let plan = plan_repairs(&snapshot, &HashMap::new(), &[]);
        assert_eq!(plan.counters[0].likes_count, 0);

        social::toggle(&state, &fan, r.id, SocialKind::Like).await.unwrap();
        apply_repairs(&state, &plan).await.unwrap();

        let after = state.store.find_recipe(r.id).await.unwrap().unwrap();
        assert_eq!(after.liked_by, vec![fan.user_id]);
        assert_eq!(after.likes_count, after.liked_by.len() as i64);
        let pushed = state.events.latest_for(&Surface::new([r.id]));
        assert_eq!(pushed.iter().map(|c| c.likes_count).collect::<Vec<_>>(), vec![1]);
    }
}
