use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;

use super::dto::*;
use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::batch::{BatchBeat, BatchIngest};
use crate::hub::{now_ms, PostureInput, StatusEventInput};
use crate::realtime::BeatsIngest;

pub async fn ingest_beats(
    State(state): State<AppState>,
    Json(request): Json<BeatsRequest>,
) -> ApiResult<Json<BeatsResponse>> {
    let device = request
        .device
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing device"))?;
    let rr_intervals = request
        .rr_intervals
        .ok_or_else(|| ApiError::bad_request("missing rrIntervals"))?;

    let received = state
        .hub
        .handle_beats(BeatsIngest {
            device,
            timestamp: request.timestamp.unwrap_or_else(now_ms),
            heart_rate: request.heart_rate,
            rr_intervals,
            posture: request.posture,
            source: request.source,
        })
        .await;

    Ok(Json(BeatsResponse { ok: true, received }))
}

pub async fn ingest_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> ApiResult<Json<BatchResponse>> {
    let device = request
        .device
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing device"))?;
    let beats = request
        .beats
        .ok_or_else(|| ApiError::bad_request("missing beats"))?;

    let beats = beats
        .into_iter()
        .map(|beat| {
            let timestamp = beat
                .timestamp
                .ok_or_else(|| ApiError::bad_request("beat without numeric timestamp"))?;
            Ok(BatchBeat {
                timestamp,
                heart_rate: beat.heart_rate,
                rr_intervals: beat.rr_intervals.unwrap_or_default(),
            })
        })
        .collect::<ApiResult<Vec<_>>>()?;

    let report = state
        .hub
        .handle_batch(BatchIngest {
            device,
            source: request.source,
            beats,
        })
        .await?;

    Ok(Json(BatchResponse {
        ok: true,
        received: report.received,
        new: report.new,
        duplicates: report.duplicates,
    }))
}

pub async fn ingest_posture(
    State(state): State<AppState>,
    Json(request): Json<PostureRequest>,
) -> ApiResult<Json<AckResponse>> {
    let (from_posture, to_posture) = match (request.from_posture, request.to_posture) {
        (Some(from), Some(to)) if !from.is_empty() && !to.is_empty() => (from, to),
        _ => return Err(ApiError::bad_request("missing postures")),
    };

    state
        .hub
        .handle_posture(PostureInput {
            device: request.device,
            source: request.source,
            from_posture,
            to_posture,
            from_duration_seconds: request.from_duration_seconds,
            confidence: request.confidence,
        })
        .await?;

    Ok(Json(AckResponse { ok: true }))
}

pub async fn ingest_status(
    State(state): State<AppState>,
    Json(request): Json<StatusRequest>,
) -> ApiResult<Json<AckResponse>> {
    let (category, event) = match (request.category, request.event) {
        (Some(category), Some(event)) if !category.is_empty() && !event.is_empty() => {
            (category, event)
        }
        _ => return Err(ApiError::bad_request("missing category or event")),
    };

    state
        .hub
        .handle_status(StatusEventInput {
            category,
            event,
            description: request.description,
            fields: request.fields,
            source: request.source,
            device: request.device,
        })
        .await?;

    Ok(Json(AckResponse { ok: true }))
}

/// SSE stream of full status snapshots, one per real-time ingest.
pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.hub.subscribe();
    let stream = BroadcastStream::new(receiver).filter_map(|snapshot| async move {
        let snapshot = snapshot.ok()?;
        let event = Event::default().json_data(&snapshot).ok()?;
        Some(Ok(event))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        devices: state.hub.device_count(),
    })
}
