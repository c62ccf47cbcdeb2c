//! Payment orchestration.
//!
//! `initiate` prices a PENDING booking (quantity x unit price, coupon applied
//! at checkout time), records the attempt, and hands it to the provider.
//! `on_provider_result` is the single settlement entry point: the provider
//! webhook, the dev simulation endpoint, and instant coupon waivers all
//! converge on it, so idempotency and stale-callback handling live in exactly
//! one place.

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::booking;
use crate::db::AppDb;
use crate::error::{Error, Result};
use crate::models::{InitiatePaymentRequest, Payment, PaymentConfirmRequest, PaymentStatus};
use crate::provider::PaymentDispatch;
use crate::AppState;

/// Initiate a payment for a PENDING booking.
///
/// The amount is computed here, not at booking time, so the coupon's current
/// value applies. At most one PENDING-or-SUCCESS payment may exist per
/// booking; the partial unique index enforces that against concurrent calls.
/// A zero amount (full waiver) settles immediately through the normal
/// settlement path. Provider dispatch happens after the row is committed —
/// never inside a transaction — and a dispatch failure marks the attempt
/// FAILED so the caller can retry while the booking keeps its hold.
pub async fn initiate(state: &AppState, req: &InitiatePaymentRequest) -> Result<Payment> {
    let booking = booking::get(&state.db, req.booking_id).await?;
    if booking.status.is_terminal() {
        return Err(Error::BookingNotPayable {
            booking_id: booking.booking_id,
            reason: format!("booking is {}", booking.status),
        });
    }
    if booking.hold_expiry <= chrono::Utc::now() {
        return Err(Error::BookingNotPayable {
            booking_id: booking.booking_id,
            reason: "hold has expired".to_string(),
        });
    }

    let event = crate::inventory::get_event(&state.db, booking.event_id).await?;
    let base_amount = event.ticket_price * i64::from(booking.quantity);
    let coupon_code = req
        .coupon_code
        .as_deref()
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty());
    let amount = state.coupons.evaluate(coupon_code.as_deref(), base_amount);

    let inserted = sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO payments (booking_id, user_id, amount, currency, upi_id, coupon_code)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(booking.booking_id)
    .bind(req.user_id)
    .bind(amount)
    .bind(&event.currency)
    .bind(&req.upi_id)
    .bind(&coupon_code)
    .fetch_one(&state.db)
    .await;

    let payment = match inserted {
        Ok(p) => p,
        Err(e) if is_active_payment_conflict(&e) => {
            return Err(Error::BookingNotPayable {
                booking_id: booking.booking_id,
                reason: "a payment is already in flight or settled".to_string(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    info!(
        "payment {} initiated for booking {}: {} {} (base {}, coupon {:?})",
        payment.payment_id, booking.booking_id, amount, payment.currency, base_amount,
        coupon_code
    );

    if amount == 0 {
        // Full waiver: settle through the same path a provider callback
        // takes, with a synthetic provider reference.
        let reference = match &coupon_code {
            Some(code) => format!("COUPON-{code}"),
            None => "ZERO-AMOUNT".to_string(),
        };
        return on_provider_result(
            &state.db,
            &PaymentConfirmRequest {
                payment_record_id: payment.payment_id,
                provider_payment_id: reference,
                status: PaymentStatus::Success,
            },
        )
        .await;
    }

    let dispatch = PaymentDispatch {
        payment_id: payment.payment_id,
        booking_id: payment.booking_id,
        amount: payment.amount,
        currency: payment.currency.clone(),
        upi_id: payment.upi_id.clone(),
    };
    if let Err(e) = state.provider.request_payment(&dispatch).await {
        // The provider never saw this attempt; close it out so a retry can
        // open a fresh one. The booking keeps its hold.
        sqlx::query(
            "UPDATE payments SET status = 'FAILED', updated_at = now()
             WHERE payment_id = $1 AND status = 'PENDING'",
        )
        .bind(payment.payment_id)
        .execute(&state.db)
        .await?;
        warn!(
            "provider dispatch failed for payment {}: {e}",
            payment.payment_id
        );
        return Err(e);
    }

    Ok(payment)
}

/// Apply a provider settlement (or simulation of one).
///
/// The PENDING -> terminal compare-and-set makes duplicate callbacks no-ops
/// and makes stale callbacks unable to regress a settled payment: a late
/// FAILED after a SUCCESS is logged and ignored, never applied. On SUCCESS
/// the booking is confirmed; re-delivered SUCCESS callbacks re-run the
/// (idempotent) confirmation, which heals a crash between settlement and
/// confirmation.
pub async fn on_provider_result(db: &AppDb, req: &PaymentConfirmRequest) -> Result<Payment> {
    if !req.status.is_terminal() {
        warn!(
            "ignoring non-terminal provider result {} for payment {}",
            req.status, req.payment_record_id
        );
        return get(db, req.payment_record_id).await;
    }

    let settled: Option<Payment> = sqlx::query_as(
        r#"
        UPDATE payments
        SET status = $2, provider_payment_id = $3, updated_at = now()
        WHERE payment_id = $1 AND status = 'PENDING'
        RETURNING *
        "#,
    )
    .bind(req.payment_record_id)
    .bind(req.status)
    .bind(&req.provider_payment_id)
    .fetch_optional(db)
    .await?;

    match settled {
        Some(payment) => {
            match payment.status {
                PaymentStatus::Success => {
                    info!(
                        "payment {} settled SUCCESS ({})",
                        payment.payment_id, req.provider_payment_id
                    );
                    confirm_booking(db, &payment).await?;
                }
                PaymentStatus::Failed => {
                    // The booking stays PENDING: the user keeps the hold for
                    // a retry until it expires.
                    sqlx::query(
                        "UPDATE bookings SET payment_status = 'FAILED', updated_at = now()
                         WHERE booking_id = $1 AND status = 'PENDING'",
                    )
                    .bind(payment.booking_id)
                    .execute(db)
                    .await?;
                    info!(
                        "payment {} settled FAILED, booking {} keeps its hold",
                        payment.payment_id, payment.booking_id
                    );
                }
                PaymentStatus::Pending => unreachable!("terminal status checked above"),
            }
            Ok(payment)
        }
        None => {
            let current = get(db, req.payment_record_id).await?;
            if current.status == req.status {
                if current.status == PaymentStatus::Success {
                    confirm_booking(db, &current).await?;
                }
                info!(
                    "duplicate provider result for payment {} ({}), no-op",
                    current.payment_id, current.status
                );
            } else {
                warn!(
                    "stale provider result for payment {}: already {}, ignoring {}",
                    current.payment_id, current.status, req.status
                );
            }
            Ok(current)
        }
    }
}

/// Drive the booking to CONFIRMED after a successful settlement. An expired
/// hold at this point means money was taken for inventory we no longer hold;
/// that is the (external) refund workflow's input, logged loudly here.
async fn confirm_booking(db: &AppDb, payment: &Payment) -> Result<()> {
    match booking::confirm(db, payment.booking_id, payment.payment_id).await {
        Ok(_) => Ok(()),
        Err(Error::InvalidTransition {
            booking_id, status, ..
        }) => {
            error!(
                "payment {} succeeded but booking {booking_id} is {status}; refund required",
                payment.payment_id
            );
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn is_active_payment_conflict(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.constraint() == Some("payments_one_active_per_booking")
    )
}

/// Fetch a payment row.
pub async fn get(db: &AppDb, payment_id: Uuid) -> Result<Payment> {
    sqlx::query_as("SELECT * FROM payments WHERE payment_id = $1")
        .bind(payment_id)
        .fetch_optional(db)
        .await?
        .ok_or(Error::PaymentNotFound(payment_id))
}

/// Latest payment attempt for a booking (earlier FAILED attempts remain as
/// history).
pub async fn get_by_booking(db: &AppDb, booking_id: Uuid) -> Result<Payment> {
    sqlx::query_as(
        "SELECT * FROM payments WHERE booking_id = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(booking_id)
    .fetch_optional(db)
    .await?
    .ok_or(Error::PaymentNotFound(booking_id))
}

/// All payments for a user, newest first.
pub async fn list_for_user(db: &AppDb, user_id: Uuid) -> Result<Vec<Payment>> {
    let payments =
        sqlx::query_as("SELECT * FROM payments WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user_id)
            .fetch_all(db)
            .await?;
    Ok(payments)
}
