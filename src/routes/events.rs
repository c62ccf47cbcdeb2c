//! Event ledger routes.
//!
//! POST /events                   - register an event's capacity and price
//! GET  /events/{id}              - retrieve the event row
//! GET  /events/{id}/availability - current sold/held/available counters
//!
//! Event content (description, venue, schedule) lives in the external
//! catalog; this service only owns capacity, price and the counters.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use uuid::Uuid;

use crate::error::Result;
use crate::inventory;
use crate::models::{ApiResponse, Availability, Event, RegisterEventRequest};
use crate::AppState;

/// Build the events router.
pub fn router() -> Router {
    Router::new()
        .route("/events", post(register_event))
        .route("/events/{id}", get(get_event))
        .route("/events/{id}/availability", get(get_availability))
}

/// Register an event with the inventory ledger.
async fn register_event(
    Extension(state): Extension<AppState>,
    Json(req): Json<RegisterEventRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Event>>)> {
    let event = inventory::register_event(&state.db, &req, &state.config.default_currency).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: event,
            message: "Event registered".to_string(),
        }),
    ))
}

/// Retrieve an event by ID.
async fn get_event(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Event>>> {
    let event = inventory::get_event(&state.db, id).await?;
    Ok(Json(ApiResponse {
        data: event,
        message: "Event retrieved".to_string(),
    }))
}

/// Retrieve availability counters for an event.
async fn get_availability(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Availability>>> {
    let availability = inventory::availability(&state.db, id).await?;
    Ok(Json(ApiResponse {
        data: availability,
        message: "Availability retrieved".to_string(),
    }))
}
