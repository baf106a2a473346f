//! Server-Sent Events for performer changes

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;

use crate::AppState;

/// GET /api/events - SSE stream of `RankEvent`s
///
/// Streams events:
/// - ConnectionStatus (once, on connect)
/// - PerformerCreated / PerformerUpdated / PerformerPlaced / PerformerDeleted
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    djrank_common::sse::create_event_sse_stream("djrank-server", state.events.clone())
}
