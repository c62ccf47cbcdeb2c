//! Hold expiry sweeper.
//!
//! A background task that runs on a fixed interval, independent of request
//! traffic, and expires PENDING bookings whose hold has lapsed. It issues the
//! same transactional `booking::expire` the request path semantics are built
//! on — there is no second expiry code path. Because `expire` is a
//! first-writer-wins compare-and-set, any number of sweeper instances can run
//! concurrently with each other and with request-driven confirms.

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::booking::{self, ExpireOutcome};
use crate::config::AppConfig;
use crate::db::AppDb;
use crate::error::Result;

/// Spawn the sweep loop. Runs for the lifetime of the process.
pub fn spawn(db: AppDb, config: AppConfig) -> JoinHandle<()> {
    tokio::spawn(run(db, config))
}

async fn run(db: AppDb, config: AppConfig) {
    let mut ticker = tokio::time::interval(config.sweep_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(
        "hold expiry sweeper running every {:?} (batch {})",
        config.sweep_interval, config.sweep_batch_size
    );

    loop {
        ticker.tick().await;
        // Per-item failures are logged inside sweep_once and picked up again
        // on the next cycle; only the scan itself can fail here.
        match sweep_once(&db, config.sweep_batch_size).await {
            Ok(0) => {}
            Ok(n) => info!("sweep expired {n} stale holds"),
            Err(e) => error!("hold sweep scan failed: {e}"),
        }
    }
}

/// One sweep cycle: scan for lapsed PENDING holds and expire each. Returns
/// how many bookings this cycle actually transitioned.
pub async fn sweep_once(db: &AppDb, batch_size: i64) -> Result<u64> {
    let candidates: Vec<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT booking_id FROM bookings
        WHERE status = 'PENDING' AND hold_expiry <= now()
        ORDER BY hold_expiry
        LIMIT $1
        "#,
    )
    .bind(batch_size)
    .fetch_all(db)
    .await?;

    let mut expired = 0;
    for (booking_id,) in candidates {
        match booking::expire(db, booking_id).await {
            Ok(ExpireOutcome::Expired(_)) => expired += 1,
            Ok(ExpireOutcome::Skipped) => {
                debug!("booking {booking_id} no longer eligible for expiry")
            }
            Err(e) => error!("failed to expire booking {booking_id}: {e}"),
        }
    }
    Ok(expired)
}
