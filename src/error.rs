//! Error taxonomy for the booking/payment/inventory core.
//!
//! Each variant maps to a distinct HTTP status and a stable machine-readable
//! code, so clients can tell "sold out" from "already processed" instead of
//! seeing a generic failure. Duplicate or stale operations (double confirm,
//! repeated provider callback) are not represented here at all: they resolve
//! to no-op successes in the domain modules.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::models::BookingStatus;

/// Domain errors surfaced by the booking, inventory and payment modules.
#[derive(Debug, Error)]
pub enum Error {
    #[error("event {0} not found")]
    EventNotFound(Uuid),

    #[error("booking {0} not found")]
    BookingNotFound(Uuid),

    #[error("payment {0} not found")]
    PaymentNotFound(Uuid),

    /// Capacity exhausted for the requested quantity. Not retryable for the
    /// same request; the client should pick another event or quantity.
    #[error("event {event_id} sold out: requested {requested}, available {available}")]
    SoldOut {
        event_id: Uuid,
        requested: i32,
        available: i32,
    },

    /// The booking is not in a state that admits the attempted operation.
    #[error("booking {booking_id} is {status}, cannot {attempted}")]
    InvalidTransition {
        booking_id: Uuid,
        status: BookingStatus,
        attempted: &'static str,
    },

    #[error("booking {booking_id} is not payable: {reason}")]
    BookingNotPayable { booking_id: Uuid, reason: String },

    #[error("quantity {0} outside allowed range")]
    InvalidQuantity(i32),

    /// A ledger commit/release did not match its hold. Integration bug:
    /// counters would go negative or move twice. Never expected in normal
    /// operation.
    #[error("invalid hold token for event {event_id} (quantity {quantity})")]
    InvalidToken { event_id: Uuid, quantity: i32 },

    /// Payment provider dispatch failed. Transient; the caller may retry
    /// `initiate` with backoff, the booking keeps its hold.
    #[error("payment provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Error {
    /// Stable code included in error response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::EventNotFound(_) => "EVENT_NOT_FOUND",
            Error::BookingNotFound(_) => "BOOKING_NOT_FOUND",
            Error::PaymentNotFound(_) => "PAYMENT_NOT_FOUND",
            Error::SoldOut { .. } => "SOLD_OUT",
            Error::InvalidTransition { .. } => "INVALID_TRANSITION",
            Error::BookingNotPayable { .. } => "BOOKING_NOT_PAYABLE",
            Error::InvalidQuantity(_) => "INVALID_QUANTITY",
            Error::InvalidToken { .. } => "INVALID_TOKEN",
            Error::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
            Error::Database(_) => "DATABASE_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Error::EventNotFound(_) | Error::BookingNotFound(_) | Error::PaymentNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Error::SoldOut { .. }
            | Error::InvalidTransition { .. }
            | Error::BookingNotPayable { .. } => StatusCode::CONFLICT,
            Error::InvalidQuantity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::ProviderUnavailable(_) => StatusCode::BAD_GATEWAY,
            Error::InvalidToken { .. } | Error::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // InvalidToken means ledger counters and booking state disagree;
        // Database covers everything sqlx can throw. Both are server faults.
        if self.status() == StatusCode::INTERNAL_SERVER_ERROR {
            error!("internal error: {self}");
        }

        let body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

/// Shorthand used across the domain modules.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sold_out_and_invalid_transition_have_distinct_codes() {
        let sold_out = Error::SoldOut {
            event_id: Uuid::new_v4(),
            requested: 2,
            available: 1,
        };
        let invalid = Error::InvalidTransition {
            booking_id: Uuid::new_v4(),
            status: BookingStatus::Confirmed,
            attempted: "cancel",
        };
        assert_ne!(sold_out.code(), invalid.code());
        assert_eq!(sold_out.status(), StatusCode::CONFLICT);
        assert_eq!(invalid.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn not_found_variants_map_to_404() {
        assert_eq!(
            Error::EventNotFound(Uuid::new_v4()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::PaymentNotFound(Uuid::new_v4()).status(),
            StatusCode::NOT_FOUND
        );
    }
}
