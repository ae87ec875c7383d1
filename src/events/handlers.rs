use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use serde::Deserialize;
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    Stream, StreamExt,
};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::Surface;
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CounterEventsQuery {
    /// Comma separated recipe ids held by the subscribing surface.
    #[serde(default)]
    pub ids: String,
}

pub(crate) fn parse_ids(raw: &str) -> AppResult<Vec<Uuid>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s).map_err(|_| AppError::validation(format!("invalid recipe id `{s}`")))
        })
        .collect()
}

/// GET /events/counters?ids=<uuid,...>
/// Cached snapshots for the held ids first, then live ones as they happen.
#[instrument(skip(state))]
pub async fn counter_events(
    State(state): State<AppState>,
    Query(q): Query<CounterEventsQuery>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let ids = parse_ids(&q.ids)?;
    if ids.is_empty() {
        return Err(AppError::validation("ids is required"));
    }
    let surface = Surface::new(ids);

    // Subscribe before reading the cache so nothing published in between is lost.
    let rx = state.events.subscribe();
    let initial = state.events.latest_for(&surface);

    let live = BroadcastStream::new(rx).filter_map(move |msg| match msg {
        Ok(snap) if surface.holds(snap.recipe_id) => Some(snap),
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            debug!(skipped, "counter subscriber lagged");
            None
        }
    });

    let stream = tokio_stream::iter(initial)
        .chain(live)
        .map(|snap| Event::default().event("counters").json_data(snap));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
