//! # Boxoffice Library
//!
//! Exposes the Axum router and domain modules so integration tests can create
//! an in-process server without requiring `cargo run` in another terminal.

pub mod booking;
pub mod config;
pub mod coupon;
pub mod db;
pub mod error;
pub mod inventory;
pub mod models;
pub mod payment;
pub mod provider;
pub mod routes;
pub mod sweeper;

use std::sync::Arc;

use axum::{Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::coupon::CouponBook;
use crate::db::AppDb;
use crate::provider::PaymentProvider;

/// Shared state injected into every route handler.
#[derive(Clone)]
pub struct AppState {
    pub db: AppDb,
    pub config: Arc<AppConfig>,
    pub coupons: Arc<CouponBook>,
    pub provider: Arc<dyn PaymentProvider>,
}

impl AppState {
    /// Assemble state from a connected pool and parsed configuration.
    pub fn new(
        db: AppDb,
        config: AppConfig,
        provider: Arc<dyn PaymentProvider>,
    ) -> Self {
        let coupons = Arc::new(CouponBook::from_override(config.coupons.as_deref()));
        Self {
            db,
            config: Arc::new(config),
            coupons,
            provider,
        }
    }
}

/// Build the Axum router with all route modules and middleware.
///
/// The caller is responsible for providing connected state. This function
/// does NOT start a server or spawn the hold-expiry sweeper.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::router())
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
