//! Booking state machine.
//!
//! A booking moves PENDING -> CONFIRMED | CANCELLED | EXPIRED and never out
//! of a terminal state. Every transition is a compare-and-set on the status
//! column whose WHERE clause is the transition-table entry, executed in the
//! same transaction as the inventory movement it implies. Multiple service
//! instances (and the sweeper) can race on the same booking; the row-level
//! CAS guarantees exactly one of them wins and the ledger moves exactly once.

use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::AppDb;
use crate::error::{Error, Result};
use crate::inventory::{self, HoldToken};
use crate::models::{Booking, BookingStatus, CreateBookingRequest};

/// Outcome of an expiry attempt. A skipped expiry is not an error: it means
/// another actor (a confirm, a cancel, or a sibling sweeper instance) already
/// moved the booking.
#[derive(Debug)]
pub enum ExpireOutcome {
    Expired(Booking),
    Skipped,
}

/// Create a booking: reserve inventory and insert the PENDING row in one
/// transaction, so a hold can never exist without its booking record and
/// vice versa.
pub async fn create(db: &AppDb, config: &AppConfig, req: &CreateBookingRequest) -> Result<Booking> {
    if req.quantity < 1 || req.quantity > config.max_tickets_per_booking {
        return Err(Error::InvalidQuantity(req.quantity));
    }

    let mut tx = db.begin().await?;
    inventory::reserve(&mut *tx, req.event_id, req.quantity).await?;

    let booking: Booking = sqlx::query_as(
        r#"
        INSERT INTO bookings (user_id, event_id, ticket_type, quantity, hold_expiry)
        VALUES ($1, $2, $3, $4, now() + make_interval(secs => $5))
        RETURNING *
        "#,
    )
    .bind(req.user_id)
    .bind(req.event_id)
    .bind(&req.ticket_type)
    .bind(req.quantity)
    .bind(config.hold_ttl_secs())
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    info!(
        "booking {} created: {} x {} for event {}, hold until {}",
        booking.booking_id, booking.quantity, booking.ticket_type, booking.event_id,
        booking.hold_expiry
    );
    Ok(booking)
}

/// Confirm a booking against a successful payment.
///
/// Valid only from PENDING with an unexpired hold; commits the hold in the
/// same transaction as the status flip. Calling it again with the same
/// payment returns the already-confirmed booking instead of erroring, so the
/// payment orchestrator can safely re-deliver settlement.
pub async fn confirm(db: &AppDb, booking_id: Uuid, payment_id: Uuid) -> Result<Booking> {
    let mut tx = db.begin().await?;
    let won: Option<Booking> = sqlx::query_as(
        r#"
        UPDATE bookings
        SET status = 'CONFIRMED', payment_id = $2, payment_status = 'SUCCESS',
            updated_at = now()
        WHERE booking_id = $1 AND status = 'PENDING' AND hold_expiry > now()
        RETURNING *
        "#,
    )
    .bind(booking_id)
    .bind(payment_id)
    .fetch_optional(&mut *tx)
    .await?;

    match won {
        Some(booking) => {
            let token = HoldToken {
                event_id: booking.event_id,
                quantity: booking.quantity,
            };
            inventory::commit(&mut *tx, token).await?;
            tx.commit().await?;
            info!(
                "booking {} confirmed by payment {}",
                booking.booking_id, payment_id
            );
            Ok(booking)
        }
        None => {
            tx.rollback().await?;
            let current = get(db, booking_id).await?;
            match current.status {
                BookingStatus::Confirmed if current.payment_id == Some(payment_id) => {
                    debug!("booking {booking_id} already confirmed by payment {payment_id}");
                    Ok(current)
                }
                // Still PENDING means the CAS failed on the expiry predicate:
                // the hold lapsed and the caller should book again.
                BookingStatus::Pending => Err(Error::InvalidTransition {
                    booking_id,
                    status: current.status,
                    attempted: "confirm an expired hold",
                }),
                status => Err(Error::InvalidTransition {
                    booking_id,
                    status,
                    attempted: "confirm",
                }),
            }
        }
    }
}

/// User-initiated cancellation. Valid only from PENDING; releases the hold in
/// the same transaction. Cancelling an already-cancelled booking is a no-op;
/// CONFIRMED bookings are refund territory, outside this core.
pub async fn cancel(db: &AppDb, booking_id: Uuid) -> Result<Booking> {
    let mut tx = db.begin().await?;
    let won: Option<Booking> = sqlx::query_as(
        r#"
        UPDATE bookings
        SET status = 'CANCELLED', payment_status = 'CANCELLED', updated_at = now()
        WHERE booking_id = $1 AND status = 'PENDING'
        RETURNING *
        "#,
    )
    .bind(booking_id)
    .fetch_optional(&mut *tx)
    .await?;

    match won {
        Some(booking) => {
            let token = HoldToken {
                event_id: booking.event_id,
                quantity: booking.quantity,
            };
            inventory::release(&mut *tx, token).await?;
            tx.commit().await?;
            info!("booking {} cancelled, hold released", booking.booking_id);
            Ok(booking)
        }
        None => {
            tx.rollback().await?;
            let current = get(db, booking_id).await?;
            match current.status {
                BookingStatus::Cancelled => {
                    debug!("booking {booking_id} already cancelled");
                    Ok(current)
                }
                status => Err(Error::InvalidTransition {
                    booking_id,
                    status,
                    attempted: "cancel",
                }),
            }
        }
    }
}

/// System-invoked expiry (the sweeper's operation). Identical mechanics to
/// `cancel` but gated on the hold actually having lapsed, and first-writer-
/// wins instead of erroring: losing the race to a confirm or to another
/// sweeper instance is normal operation.
pub async fn expire(db: &AppDb, booking_id: Uuid) -> Result<ExpireOutcome> {
    let mut tx = db.begin().await?;
    let won: Option<Booking> = sqlx::query_as(
        r#"
        UPDATE bookings
        SET status = 'EXPIRED', payment_status = 'EXPIRED', updated_at = now()
        WHERE booking_id = $1 AND status = 'PENDING' AND hold_expiry <= now()
        RETURNING *
        "#,
    )
    .bind(booking_id)
    .fetch_optional(&mut *tx)
    .await?;

    match won {
        Some(booking) => {
            let token = HoldToken {
                event_id: booking.event_id,
                quantity: booking.quantity,
            };
            inventory::release(&mut *tx, token).await?;
            tx.commit().await?;
            info!(
                "booking {} expired, released {} held tickets",
                booking.booking_id, booking.quantity
            );
            Ok(ExpireOutcome::Expired(booking))
        }
        None => {
            tx.rollback().await?;
            Ok(ExpireOutcome::Skipped)
        }
    }
}

/// Fetch a booking row.
pub async fn get(db: &AppDb, booking_id: Uuid) -> Result<Booking> {
    sqlx::query_as("SELECT * FROM bookings WHERE booking_id = $1")
        .bind(booking_id)
        .fetch_optional(db)
        .await?
        .ok_or(Error::BookingNotFound(booking_id))
}

/// All bookings for a user, newest first.
pub async fn list_for_user(db: &AppDb, user_id: Uuid) -> Result<Vec<Booking>> {
    let bookings = sqlx::query_as(
        "SELECT * FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(bookings)
}
