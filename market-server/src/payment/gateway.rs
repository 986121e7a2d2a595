//! Payment gateway implementations

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Gateway errors, distinguished so clients know a retry may help
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Gateway unreachable or returned a transport-level failure
    #[error("Payment gateway unavailable: {0}")]
    Unavailable(String),

    /// Gateway reachable but refused the request
    #[error("Payment gateway rejected the request: {0}")]
    Rejected(String),
}

/// Successful initiation: where to send the buyer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiatedPayment {
    pub redirect_url: String,
}

/// Narrow gateway contract
///
/// The asynchronous outcome arrives later on the webhook, correlated by
/// reference; this trait only covers the synchronous leg.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initiate(&self, amount: f64, reference: &str)
    -> Result<InitiatedPayment, GatewayError>;
}

/// Production adapter: JSON POST to the configured gateway
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct CheckoutRequest<'a> {
    amount: f64,
    reference: &'a str,
}

#[derive(Deserialize)]
struct CheckoutResponse {
    redirect_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    async fn initiate(
        &self,
        amount: f64,
        reference: &str,
    ) -> Result<InitiatedPayment, GatewayError> {
        let url = format!("{}/checkout", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&CheckoutRequest { amount, reference })
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected(format!("{status}: {body}")));
        }

        let checkout: CheckoutResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Rejected(format!("malformed gateway response: {e}")))?;

        Ok(InitiatedPayment {
            redirect_url: checkout.redirect_url,
        })
    }
}

/// Development/test adapter: always accepts, deterministic redirect
pub struct MockGateway;

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn initiate(
        &self,
        amount: f64,
        reference: &str,
    ) -> Result<InitiatedPayment, GatewayError> {
        tracing::debug!(amount, reference, "Mock gateway checkout");
        Ok(InitiatedPayment {
            redirect_url: format!("https://pay.example.com/checkout/{reference}"),
        })
    }
}
