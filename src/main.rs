//! # Boxoffice Service
//!
//! Booking, payment and inventory reconciliation for a ticket marketplace.
//!
//! ## Responsibilities
//!
//! 1. **Inventory ledger**: per-event sold/held counters, oversell-proof
//! 2. **Booking state machine**: PENDING -> CONFIRMED/CANCELLED/EXPIRED
//! 3. **Payment orchestration**: initiate, provider callbacks, coupons
//! 4. **Hold expiry sweeper**: background release of lapsed holds
//!
//! ## Architecture
//!
//! - Axum handles HTTP routing and the provider webhook
//! - SQLx manages the PostgreSQL state; every invariant-bearing write is a
//!   conditional UPDATE so any number of instances can share one database
//! - The sweeper runs as a background tokio task in each instance

use tracing::info;

use boxoffice::config::AppConfig;
use boxoffice::{create_app, db, provider, sweeper, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "boxoffice=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting boxoffice service");

    let config = AppConfig::from_env();

    let pool = db::connect(&config).await?;
    info!("Connected to application database");

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations complete");

    let provider = provider::from_config(&config)?;
    let state = AppState::new(pool.clone(), config.clone(), provider);

    // The sweeper shares the request path's expire operation; it only needs
    // the pool and the interval knobs.
    let _sweeper = sweeper::spawn(pool, config.clone());

    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
