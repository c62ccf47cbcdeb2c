//! Booking lifecycle routes.
//!
//! POST  /bookings/book          - create a booking (reserves inventory)
//! GET   /bookings/{id}          - retrieve a booking
//! PATCH /bookings/{id}/cancel   - user-initiated cancellation
//! GET   /bookings/user/{id}     - list a user's bookings
//!
//! Confirmation has no route of its own: bookings are confirmed only by the
//! payment orchestrator when a settlement arrives.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Extension, Json, Router};
use tracing::info;
use uuid::Uuid;

use crate::booking;
use crate::error::Result;
use crate::models::{ApiResponse, Booking, CreateBookingRequest};
use crate::AppState;

/// Build the bookings router.
pub fn router() -> Router {
    Router::new()
        .route("/bookings/book", post(create_booking))
        .route("/bookings/{id}", get(get_booking))
        .route("/bookings/{id}/cancel", patch(cancel_booking))
        .route("/bookings/user/{user_id}", get(get_by_user))
}

/// Create a booking and the inventory hold backing it.
async fn create_booking(
    Extension(state): Extension<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Booking>>)> {
    let booking = booking::create(&state.db, &state.config, &req).await?;
    info!(
        "booking {} accepted for user {}",
        booking.booking_id, booking.user_id
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: booking,
            message: "Booking created; complete payment before the hold expires".to_string(),
        }),
    ))
}

/// Retrieve a booking by ID.
async fn get_booking(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Booking>>> {
    let booking = booking::get(&state.db, id).await?;
    Ok(Json(ApiResponse {
        data: booking,
        message: "Booking retrieved".to_string(),
    }))
}

/// Cancel a PENDING booking, releasing its hold.
async fn cancel_booking(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Booking>>> {
    let booking = booking::cancel(&state.db, id).await?;
    Ok(Json(ApiResponse {
        data: booking,
        message: "Booking cancelled".to_string(),
    }))
}

/// List all bookings for a user, newest first.
async fn get_by_user(
    Extension(state): Extension<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Booking>>>> {
    let bookings = booking::list_for_user(&state.db, user_id).await?;
    Ok(Json(ApiResponse {
        data: bookings,
        message: "Bookings retrieved".to_string(),
    }))
}
