//! Domain models for the boxoffice service.
//!
//! These structs map to the tables created under `migrations/` and carry the
//! request/response shapes of the HTTP API. Monetary amounts are integer
//! minor units (paise); timestamps are UTC and all expiry comparisons happen
//! in SQL against the database clock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Status Enumerations
// ============================================================================

/// Lifecycle of a booking. PENDING is the only non-terminal state; the three
/// terminal states are reached exclusively through the compare-and-set writes
/// in `crate::booking`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Expired,
}

impl BookingStatus {
    /// The transition table. Everything not listed here is rejected; the SQL
    /// CAS predicates in `crate::booking` are the enforcing copy of this
    /// same table.
    pub fn allows(self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Pending, BookingStatus::Expired)
        )
    }

    pub fn is_terminal(self) -> bool {
        self != BookingStatus::Pending
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

/// Settlement state of a payment attempt. SUCCESS and FAILED are terminal;
/// a stale callback can never move a payment out of a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(self) -> bool {
        self != PaymentStatus::Pending
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Success => "SUCCESS",
            PaymentStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Database Models (sqlx::FromRow)
// ============================================================================

/// An event as seen by the inventory ledger: fixed capacity, unit price, and
/// the two counters no other module may write.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub event_id: Uuid,
    pub title: String,
    pub total_tickets: i32,
    pub ticket_price: i64,
    pub currency: String,
    pub tickets_sold: i32,
    pub tickets_held: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A booking. While PENDING, its quantity is counted in the event's
/// tickets_held; the row itself is the hold record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Booking {
    pub booking_id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub ticket_type: String,
    pub quantity: i32,
    pub status: BookingStatus,
    pub hold_expiry: DateTime<Utc>,
    pub payment_status: String,
    pub payment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A payment attempt against a booking.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub payment_id: Uuid,
    pub booking_id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub upi_id: Option<String>,
    pub coupon_code: Option<String>,
    pub provider_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Request Models (Deserialize from JSON input)
// ============================================================================

/// Request body for registering an event with the ledger.
#[derive(Debug, Deserialize)]
pub struct RegisterEventRequest {
    pub title: String,
    pub total_tickets: i32,
    /// Unit price in minor units.
    pub ticket_price: i64,
    pub currency: Option<String>,
}

/// Request body for creating a booking.
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub ticket_type: String,
    pub quantity: i32,
}

/// Request body for initiating a payment.
#[derive(Debug, Deserialize)]
pub struct InitiatePaymentRequest {
    pub booking_id: Uuid,
    pub user_id: Uuid,
    pub upi_id: Option<String>,
    pub coupon_code: Option<String>,
}

/// Provider webhook body. Also produced internally by the simulation endpoint
/// and by instant coupon settlement, so every settlement flows through one
/// path.
#[derive(Debug, Deserialize)]
pub struct PaymentConfirmRequest {
    pub payment_record_id: Uuid,
    pub provider_payment_id: String,
    pub status: PaymentStatus,
}

/// Query parameters of the simulated provider callback.
#[derive(Debug, Deserialize)]
pub struct SimulatePaymentQuery {
    pub payment_record_id: Uuid,
    pub status: Option<PaymentStatus>,
}

// ============================================================================
// Response Models
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub message: String,
}

/// Availability counters for an event.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Availability {
    pub event_id: Uuid,
    pub total_tickets: i32,
    pub tickets_sold: i32,
    pub tickets_held: i32,
    pub available: i32,
}

/// Response for an initiated payment.
#[derive(Debug, Serialize)]
pub struct PaymentInitiatedResponse {
    pub payment_id: Uuid,
    pub booking_id: Uuid,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_to_terminal_transitions_are_allowed() {
        use BookingStatus::*;
        let all = [Pending, Confirmed, Cancelled, Expired];
        for from in all {
            for to in all {
                let expected = from == Pending && to != Pending;
                assert_eq!(from.allows(to), expected, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn terminal_states_are_terminal() {
        assert!(!BookingStatus::Pending.is_terminal());
        assert!(BookingStatus::Confirmed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(BookingStatus::Expired.is_terminal());
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(PaymentStatus::Success.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
    }

    #[test]
    fn statuses_serialize_uppercase() {
        assert_eq!(
            serde_json::to_string(&BookingStatus::Pending).unwrap(),
            "\"PENDING\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Success).unwrap(),
            "\"SUCCESS\""
        );
    }
}
