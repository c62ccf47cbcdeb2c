//! Inventory ledger.
//!
//! Owns the per-event counters (`tickets_sold`, `tickets_held`) and is the
//! only module that writes them. Every mutation is a single conditional
//! `UPDATE`, so concurrent callers across any number of service instances
//! serialize on the event row inside PostgreSQL; there is no in-process
//! locking and none would be sufficient.
//!
//! `reserve` runs inside the booking-creation transaction and `commit` /
//! `release` run inside the booking status transition that triggers them, so
//! a hold can never exist without its PENDING booking row and counters can
//! never move without the corresponding status flip.

use sqlx::PgConnection;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::AppDb;
use crate::error::{Error, Result};
use crate::models::{Availability, Event, RegisterEventRequest};

/// Proof of a successful reservation, bound to an event and quantity. The
/// booking row created in the same transaction carries the same pair, which
/// is how later commits/releases reconstruct the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldToken {
    pub event_id: Uuid,
    pub quantity: i32,
}

/// Atomically move `quantity` tickets into the held count.
///
/// The capacity check and the increment are one statement: two reservations
/// racing for the last tickets cannot both pass, under any interleaving.
pub async fn reserve(conn: &mut PgConnection, event_id: Uuid, quantity: i32) -> Result<HoldToken> {
    let updated = sqlx::query(
        r#"
        UPDATE events
        SET tickets_held = tickets_held + $2, updated_at = now()
        WHERE event_id = $1
          AND tickets_sold + tickets_held + $2 <= total_tickets
        "#,
    )
    .bind(event_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    if updated.rows_affected() == 1 {
        debug!("reserved {quantity} tickets for event {event_id}");
        return Ok(HoldToken { event_id, quantity });
    }

    // Zero rows: either the event is unknown or the capacity check failed.
    let event: Option<Event> = sqlx::query_as("SELECT * FROM events WHERE event_id = $1")
        .bind(event_id)
        .fetch_optional(&mut *conn)
        .await?;

    match event {
        None => Err(Error::EventNotFound(event_id)),
        Some(e) => Err(Error::SoldOut {
            event_id,
            requested: quantity,
            available: e.total_tickets - e.tickets_sold - e.tickets_held,
        }),
    }
}

/// Move a hold's quantity from held to sold.
///
/// Callers invoke this exactly once per booking, on the winning side of the
/// PENDING -> CONFIRMED compare-and-set and inside the same transaction.
/// The `tickets_held >= quantity` guard means a commit that would drive the
/// held count negative fails as `InvalidToken` instead of corrupting the
/// ledger.
pub async fn commit(conn: &mut PgConnection, token: HoldToken) -> Result<()> {
    let updated = sqlx::query(
        r#"
        UPDATE events
        SET tickets_held = tickets_held - $2,
            tickets_sold = tickets_sold + $2,
            updated_at = now()
        WHERE event_id = $1
          AND tickets_held >= $2
        "#,
    )
    .bind(token.event_id)
    .bind(token.quantity)
    .execute(&mut *conn)
    .await?;

    if updated.rows_affected() == 1 {
        info!(
            "committed {} tickets for event {}",
            token.quantity, token.event_id
        );
        return Ok(());
    }
    token_failure(conn, token).await
}

/// Return a hold's quantity to the available pool without touching sold.
///
/// Same serialization rules as `commit`: invoked only on the winning side of
/// a PENDING -> CANCELLED/EXPIRED compare-and-set, in the same transaction.
pub async fn release(conn: &mut PgConnection, token: HoldToken) -> Result<()> {
    let updated = sqlx::query(
        r#"
        UPDATE events
        SET tickets_held = tickets_held - $2, updated_at = now()
        WHERE event_id = $1
          AND tickets_held >= $2
        "#,
    )
    .bind(token.event_id)
    .bind(token.quantity)
    .execute(&mut *conn)
    .await?;

    if updated.rows_affected() == 1 {
        info!(
            "released {} held tickets for event {}",
            token.quantity, token.event_id
        );
        return Ok(());
    }
    token_failure(conn, token).await
}

async fn token_failure(conn: &mut PgConnection, token: HoldToken) -> Result<()> {
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT event_id FROM events WHERE event_id = $1")
        .bind(token.event_id)
        .fetch_optional(conn)
        .await?;
    match exists {
        None => Err(Error::EventNotFound(token.event_id)),
        Some(_) => Err(Error::InvalidToken {
            event_id: token.event_id,
            quantity: token.quantity,
        }),
    }
}

/// Register an event with the ledger. Capacity is fixed at creation; the
/// counters start at zero. Event content beyond title/price lives in the
/// external catalog.
pub async fn register_event(
    db: &AppDb,
    req: &RegisterEventRequest,
    default_currency: &str,
) -> Result<Event> {
    if req.total_tickets < 0 {
        return Err(Error::InvalidQuantity(req.total_tickets));
    }
    let event: Event = sqlx::query_as(
        r#"
        INSERT INTO events (title, total_tickets, ticket_price, currency)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(&req.title)
    .bind(req.total_tickets)
    .bind(req.ticket_price)
    .bind(req.currency.as_deref().unwrap_or(default_currency))
    .fetch_one(db)
    .await?;

    info!(
        "event {} registered: {} tickets at {} {}",
        event.event_id, event.total_tickets, event.ticket_price, event.currency
    );
    Ok(event)
}

/// Fetch an event row.
pub async fn get_event(db: &AppDb, event_id: Uuid) -> Result<Event> {
    sqlx::query_as("SELECT * FROM events WHERE event_id = $1")
        .bind(event_id)
        .fetch_optional(db)
        .await?
        .ok_or(Error::EventNotFound(event_id))
}

/// Current availability counters for an event.
pub async fn availability(db: &AppDb, event_id: Uuid) -> Result<Availability> {
    sqlx::query_as(
        r#"
        SELECT event_id, total_tickets, tickets_sold, tickets_held,
               total_tickets - tickets_sold - tickets_held AS available
        FROM events
        WHERE event_id = $1
        "#,
    )
    .bind(event_id)
    .fetch_optional(db)
    .await?
    .ok_or(Error::EventNotFound(event_id))
}
