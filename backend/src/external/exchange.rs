//! Exchange rate API client
//!
//! Fetches spot rates from the configured conversion collaborator. Callers
//! treat failures as "no rate available"; a sale never fails because the
//! rate service is down.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::config::ExchangeConfig;
use crate::error::{AppError, AppResult};

/// Exchange rate API client
#[derive(Clone)]
pub struct ExchangeRateClient {
    client: Client,
    api_key: String,
    base_url: String,
}

/// Rate lookup response
#[derive(Debug, Deserialize)]
struct RatesResponse {
    base: String,
    rates: HashMap<String, Decimal>,
}

impl ExchangeRateClient {
    /// Create a client from configuration. An empty API URL produces a
    /// disabled client whose lookups always fail softly.
    pub fn new(config: &ExchangeConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.base_url.is_empty()
    }

    /// Fetch the spot rate converting one unit of `base` into `quote`.
    pub async fn get_rate(&self, base: &str, quote: &str) -> AppResult<Decimal> {
        if !self.is_enabled() {
            return Err(AppError::ExchangeService(
                "exchange rate lookups are disabled".to_string(),
            ));
        }

        let url = format!("{}/latest", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("base", base),
                ("symbols", quote),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::ExchangeService(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::ExchangeService(format!(
                "rate lookup for {}->{} returned {}",
                base,
                quote,
                response.status()
            )));
        }

        let body: RatesResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExchangeService(e.to_string()))?;

        if !body.base.eq_ignore_ascii_case(base) {
            return Err(AppError::ExchangeService(format!(
                "rate lookup returned base {} instead of {}",
                body.base, base
            )));
        }

        body.rates
            .get(&quote.to_uppercase())
            .copied()
            .ok_or_else(|| {
                AppError::ExchangeService(format!("no {} rate in response", quote))
            })
    }
}
