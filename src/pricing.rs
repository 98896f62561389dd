/// USD price oracle client
///
/// The intent venue's quote responses carry no USD valuations, so the CoW
/// rate client fills them in from this service. Thin HTTP wrapper; prices
/// come back as decimal strings keyed by chain and token address.
use crate::config::PriceOracleConfig;
use crate::errors::SwapdeskError;
use crate::logger::{self, LogTag};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct PriceResponse {
    usd: String,
}

pub struct PriceOracle {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl PriceOracle {
    pub fn new(config: &PriceOracleConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }

    /// Spot USD price for one token on one chain
    pub async fn usd_price(&self, chain_id: u64, token: &str) -> Result<Decimal, SwapdeskError> {
        let url = format!(
            "{}/v1/prices?chain_id={}&address={}",
            self.base_url,
            chain_id,
            token.to_lowercase()
        );

        logger::debug(
            LogTag::Oracle,
            &format!("Price lookup: chain {} token {}", chain_id, token),
        );

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(SwapdeskError::from)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.ok();
            return Err(SwapdeskError::http_status(url, status, body));
        }

        let parsed: PriceResponse = response
            .json()
            .await
            .map_err(|e| SwapdeskError::parse_error("price response", e.to_string()))?;

        Decimal::from_str(&parsed.usd)
            .map_err(|e| SwapdeskError::parse_error("usd price", e.to_string()))
    }
}
