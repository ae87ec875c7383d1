//! Counter fan-out.
//!
//! Every mutation that moves a recipe counter publishes the recipe's absolute
//! counters here. Clients keep one normalized entry per recipe id and replace
//! it with whatever arrives, so the card grid, the detail dialog and the
//! recommendation carousel all render the same numbers. A subscriber names the
//! recipe ids it currently holds and never hears about any other id.

pub mod handlers;

use std::{
    collections::{HashMap, HashSet},
    sync::RwLock,
};

use axum::{routing::get, Router};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{recipes::repo_types::RecipeCounters, state::AppState};

pub struct CounterHub {
    latest: RwLock<HashMap<Uuid, RecipeCounters>>,
    tx: broadcast::Sender<RecipeCounters>,
}

impl CounterHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            latest: RwLock::new(HashMap::new()),
            tx,
        }
    }

    /// Replaces the cached snapshot and broadcasts it. Having no subscribers is fine.
    pub fn publish(&self, counters: RecipeCounters) {
        self.latest
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(counters.recipe_id, counters);
        let _ = self.tx.send(counters);
    }

    pub fn forget(&self, recipe_id: Uuid) {
        self.latest
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&recipe_id);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RecipeCounters> {
        self.tx.subscribe()
    }

    /// Cached snapshots for the ids a surface holds.
    pub fn latest_for(&self, surface: &Surface) -> Vec<RecipeCounters> {
        let latest = self
            .latest
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        surface
            .ids
            .iter()
            .filter_map(|id| latest.get(id).copied())
            .collect()
    }
}

/// The set of recipe ids one rendered surface currently holds.
#[derive(Debug, Clone, Default)]
pub struct Surface {
    ids: HashSet<Uuid>,
}

impl Surface {
    pub fn new(ids: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    pub fn holds(&self, recipe_id: Uuid) -> bool {
        self.ids.contains(&recipe_id)
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/events/counters", get(handlers::counter_events))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters(id: Uuid, likes: i64) -> RecipeCounters {
        RecipeCounters {
            recipe_id: id,
            likes_count: likes,
            saves_count: 0,
            comments_count: 0,
        }
    }

    #[tokio::test]
    async fn publish_replaces_cached_snapshot_and_broadcasts() {
        let hub = CounterHub::new(8);
        let mut rx = hub.subscribe();
        let id = Uuid::new_v4();

        hub.publish(counters(id, 1));
        hub.publish(counters(id, 2));

        assert_eq!(rx.recv().await.unwrap().likes_count, 1);
        assert_eq!(rx.recv().await.unwrap().likes_count, 2);
        let cached = hub.latest_for(&Surface::new([id]));
        assert_eq!(cached, vec![counters(id, 2)]);
    }

    #[test]
    fn surfaces_only_see_ids_they_hold() {
        let hub = CounterHub::new(8);
        let held = Uuid::new_v4();
        let other = Uuid::new_v4();
        hub.publish(counters(held, 3));
        hub.publish(counters(other, 9));

        let surface = Surface::new([held]);
        assert!(surface.holds(held));
        assert!(!surface.holds(other));
        assert_eq!(hub.latest_for(&surface), vec![counters(held, 3)]);
    }

    #[test]
    fn forget_drops_cached_snapshot() {
        let hub = CounterHub::new(8);
        let id = Uuid::new_v4();
        hub.publish(counters(id, 1));
        hub.forget(id);
        assert!(hub.latest_for(&Surface::new([id])).is_empty());
    }

    #[test]
    fn publishing_without_subscribers_is_not_an_error() {
        let hub = CounterHub::new(1);
        hub.publish(counters(Uuid::new_v4(), 1));
    }
}
