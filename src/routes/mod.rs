//! HTTP route modules for the boxoffice service.
//!
//! Each module defines the Axum routes for one slice of the API:
//! - `events`: event registration and availability (the catalog seam)
//! - `bookings`: booking lifecycle (create, read, cancel)
//! - `payments`: payment initiation, provider webhook, dev simulation

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Router};

use crate::AppState;

pub mod bookings;
pub mod events;
pub mod payments;

/// Assemble all route modules plus the health probe.
pub fn router() -> Router {
    Router::new()
        .merge(events::router())
        .merge(bookings::router())
        .merge(payments::router())
        .route("/health", get(health))
}

/// Liveness probe including a database round-trip.
async fn health(Extension(state): Extension<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
