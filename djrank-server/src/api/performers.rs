//! Performer endpoints
//!
//! Thin handlers over the shared gateway. Successful mutations are announced
//! on the event bus so SSE clients can refresh the affected buckets.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use djrank_common::api::{ScoreResponse, SuccessResponse};
use djrank_common::events::RankEvent;
use djrank_common::placement::PlacementIndex;
use djrank_common::{time, NewPerformer, Performer, PerformerPatch};
use tracing::{debug, info};

use super::error::{ApiError, ApiResult};
use crate::AppState;

const NOT_FOUND: &str = "DJ not found";

async fn fetch(state: &AppState, id: &str) -> ApiResult<Performer> {
    state
        .gateway
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

// ========================================
// Reads
// ========================================

/// GET /api/performers
pub async fn list_performers(State(state): State<AppState>) -> ApiResult<Json<Vec<Performer>>> {
    let performers = state.gateway.list().await?;
    debug!("Listing {} performers", performers.len());
    Ok(Json(performers))
}

/// GET /api/performers/:id
pub async fn get_performer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Performer>> {
    Ok(Json(fetch(&state, &id).await?))
}

/// GET /api/performers/:id/score
///
/// Rubric total and the tier it suggests, next to the tier actually assigned.
pub async fn get_performer_score(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ScoreResponse>> {
    let performer = fetch(&state, &id).await?;
    Ok(Json(ScoreResponse::from(&performer)))
}

/// GET /api/board
pub async fn get_board(State(state): State<AppState>) -> ApiResult<Json<PlacementIndex>> {
    let performers = state.gateway.list().await?;
    Ok(Json(PlacementIndex::from_performers(&performers)))
}

// ========================================
// Mutations (admin only)
// ========================================

/// POST /api/performers
pub async fn create_performer(
    State(state): State<AppState>,
    payload: Result<Json<NewPerformer>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Performer>)> {
    let Json(new) = payload?;
    let performer = state.gateway.create(new).await?;

    info!("Created performer {} ({})", performer.id, performer.name);
    state.events.emit_lossy(RankEvent::PerformerCreated {
        performer_id: performer.id.clone(),
        name: performer.name.clone(),
        bucket: performer.bucket(),
        timestamp: time::now(),
    });

    Ok((StatusCode::CREATED, Json(performer)))
}

/// PUT /api/performers/:id
///
/// Only fields present in the body change; `null` clears a field.
pub async fn update_performer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<PerformerPatch>, JsonRejection>,
) -> ApiResult<Json<Performer>> {
    let Json(patch) = payload?;
    if patch.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let from = fetch(&state, &id).await?.bucket();
    let performer = state
        .gateway
        .update(&id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    let to = performer.bucket();
    let timestamp = time::now();
    let event = if from == to {
        RankEvent::PerformerUpdated {
            performer_id: performer.id.clone(),
            bucket: to,
            timestamp,
        }
    } else {
        info!("Performer {} moved {} -> {}", performer.id, from, to);
        RankEvent::PerformerPlaced {
            performer_id: performer.id.clone(),
            from,
            to,
            timestamp,
        }
    };
    state.events.emit_lossy(event);

    Ok(Json(performer))
}

/// DELETE /api/performers/:id
pub async fn delete_performer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    let from = fetch(&state, &id).await?.bucket();
    if !state.gateway.delete(&id).await? {
        return Err(ApiError::not_found(NOT_FOUND));
    }

    info!("Deleted performer {}", id);
    state.events.emit_lossy(RankEvent::PerformerDeleted {
        performer_id: id,
        from,
        timestamp: time::now(),
    });

    Ok(Json(SuccessResponse { success: true }))
}
