//! Payment provider client.
//!
//! The provider is an opaque external party: we POST it a payment request and
//! it later calls `POST /payments/confirm` (or an operator drives
//! `GET /payments/simulate`). The trait seam exists so deployments without a
//! gateway (and the test suite) can run with a provider that only logs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{Error, Result};

/// The request shipped to the provider when a payment is initiated.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentDispatch {
    pub payment_id: Uuid,
    pub booking_id: Uuid,
    /// Minor units, after coupon adjustment.
    pub amount: i64,
    pub currency: String,
    pub upi_id: Option<String>,
}

/// Outbound interface to the payment provider.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Hand the payment to the provider. Failure means the provider never
    /// accepted the request; settlement for it will not arrive.
    async fn request_payment(&self, dispatch: &PaymentDispatch) -> Result<()>;
}

/// Real provider over HTTP with a bounded request timeout.
pub struct HttpPaymentProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPaymentProvider {
    pub fn new(base_url: String, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl PaymentProvider for HttpPaymentProvider {
    async fn request_payment(&self, dispatch: &PaymentDispatch) -> Result<()> {
        let url = format!("{}/payments", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(dispatch)
            .send()
            .await
            .map_err(|e| Error::ProviderUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("provider rejected payment {}: {status} {body}", dispatch.payment_id);
            return Err(Error::ProviderUnavailable(format!(
                "provider returned {status}"
            )));
        }

        info!(
            "payment {} dispatched to provider ({} {})",
            dispatch.payment_id, dispatch.amount, dispatch.currency
        );
        Ok(())
    }
}

/// Stand-in used when `PROVIDER_URL` is unset: accepts every dispatch and
/// waits for a simulated or manual settlement.
pub struct LoggingProvider;

#[async_trait]
impl PaymentProvider for LoggingProvider {
    async fn request_payment(&self, dispatch: &PaymentDispatch) -> Result<()> {
        info!(
            "no provider configured; payment {} ({} {}) awaiting simulated settlement",
            dispatch.payment_id, dispatch.amount, dispatch.currency
        );
        Ok(())
    }
}

/// Select the provider implementation from configuration.
pub fn from_config(config: &AppConfig) -> reqwest::Result<Arc<dyn PaymentProvider>> {
    match &config.provider_url {
        Some(url) => Ok(Arc::new(HttpPaymentProvider::new(
            url.clone(),
            config.provider_timeout,
        )?)),
        None => Ok(Arc::new(LoggingProvider)),
    }
}
