//! Quote-of-the-day passthrough.

use axum::Json;
use axum::extract::State;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::api::{ApiError, AppState};

/// Fetches JSON from one fixed upstream URL.
#[derive(Debug, Clone)]
pub struct QuoteClient {
    http: reqwest::Client,
    url: String,
}

impl QuoteClient {
    /// Creates a client with a 5 second timeout.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the HTTP client cannot be built.
    #[instrument(skip(url), fields(url = %url))]
    pub fn new(url: String) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self { http, url })
    }

    /// Upstream URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetches the upstream body as JSON.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch(&self) -> Result<serde_json::Value, reqwest::Error> {
        let body = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        info!("Quote fetched");
        Ok(body)
    }
}

/// `GET /api/quote`
#[instrument(skip_all)]
pub async fn get_quote(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    state.quotes().fetch().await.map(Json).map_err(|e| {
        warn!(error = %e, "Quote upstream failed");
        ApiError::upstream(format!("quote service unavailable: {e}"))
    })
}
