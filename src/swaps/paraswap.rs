/// ParaSwap rate client - aggregator quoting plus transaction building
///
/// The only provider family with an on-chain build step, and the only one
/// usable inside the flash-loan execution path. The raw price-route JSON from
/// the quote response is kept opaque and passed back unmodified to the build
/// endpoint; the build call runs with relaxed validation (`ignoreChecks`)
/// because amounts are independently re-validated here before the call.
use super::config::{
    EXCLUDED_LIQUIDITY_SOURCES, QUOTE_RETRY_ATTEMPTS, QUOTE_RETRY_DELAY_MS,
};
use super::transaction::{fee_claimer_for_chain, slippage_bounds};
use super::{
    math, messages, ProviderId, RateQuote, RouteData, SwapProvider, SwapRequest, SwapSide,
    SwapTransactionParams,
};
use crate::config::ParaswapConfig;
use crate::errors::SwapdeskError;
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

// ============================================================================
// API TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
struct PricesResponse {
    #[serde(rename = "priceRoute")]
    price_route: Value,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    to: String,
    data: String,
}

// ============================================================================
// PARASWAP CLIENT
// ============================================================================

pub struct ParaswapClient {
    client: Client,
    base_url: String,
    partner: String,
    supported_chains: Vec<u64>,
    timeout: Duration,
}

impl ParaswapClient {
    pub fn new(config: &ParaswapConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            partner: config.partner.clone(),
            supported_chains: config.supported_chains.clone(),
            timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }

    fn ensure_chain(&self, chain_id: u64) -> Result<(), SwapdeskError> {
        if !self.supports_chain(chain_id) {
            return Err(SwapdeskError::unsupported_chain(self.name(), chain_id));
        }
        Ok(())
    }

    /// Read a string field out of the opaque price route
    fn route_field<'a>(route: &'a Value, field: &str) -> Result<&'a str, SwapdeskError> {
        route
            .get(field)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                SwapdeskError::parse_error(
                    "price route",
                    format!("missing or non-string field '{}'", field),
                )
            })
    }

    async fn fetch_price(&self, request: &SwapRequest) -> Result<RateQuote, SwapdeskError> {
        self.ensure_chain(request.chain_id)?;

        // The fixed amount is in the side's asset: input for sell, output for buy
        let amount_decimals = match request.side {
            SwapSide::Sell => request.src_decimals,
            SwapSide::Buy => request.dest_decimals,
        };
        let amount_base = math::to_base_units(&request.amount, amount_decimals)?;

        let mut url = format!(
            "{}/prices?srcToken={}&srcDecimals={}&destToken={}&destDecimals={}&amount={}&side={}&network={}&partner={}&excludeDEXS={}",
            self.base_url,
            request.src_token,
            request.src_decimals,
            request.dest_token,
            request.dest_decimals,
            amount_base,
            request.side.as_str(),
            request.chain_id,
            self.partner,
            EXCLUDED_LIQUIDITY_SOURCES.join(","),
        );
        if let Some(user) = &request.user_address {
            url.push_str(&format!("&userAddress={}", user));
        }

        logger::debug(
            LogTag::Provider,
            &format!(
                "ParaSwap {} price: {} {} -> {} (chain {})",
                request.side.as_str(),
                request.amount,
                request.src_token,
                request.dest_token,
                request.chain_id
            ),
        );
        logger::verbose(LogTag::Provider, &format!("GET {}", url));

        let mut last_error = SwapdeskError::network_error("no attempt made");

        for attempt in 1..=QUOTE_RETRY_ATTEMPTS {
            match self.client.get(&url).timeout(self.timeout).send().await {
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.map_err(SwapdeskError::from)?;

                    if status.is_success() {
                        let parsed: PricesResponse = serde_json::from_str(&body).map_err(|e| {
                            SwapdeskError::parse_error("ParaSwap prices response", e.to_string())
                        })?;
                        return self.quote_from_route(request, parsed.price_route);
                    }

                    // Business rejections are deterministic; normalize and stop
                    if let Ok(err) = serde_json::from_str::<ErrorResponse>(&body) {
                        return Err(messages::normalize_provider_error(&err.error).into());
                    }

                    last_error = SwapdeskError::http_status(
                        self.base_url.clone(),
                        status.as_u16(),
                        Some(body),
                    );
                }
                Err(e) => {
                    last_error = e.into();
                }
            }

            if attempt < QUOTE_RETRY_ATTEMPTS {
                logger::debug(
                    LogTag::Provider,
                    &format!(
                        "ParaSwap price attempt {}/{} failed: {}",
                        attempt, QUOTE_RETRY_ATTEMPTS, last_error
                    ),
                );
                tokio::time::sleep(Duration::from_millis(QUOTE_RETRY_DELAY_MS)).await;
            }
        }

        Err(last_error)
    }

    fn quote_from_route(
        &self,
        request: &SwapRequest,
        route: Value,
    ) -> Result<RateQuote, SwapdeskError> {
        let src_amount_base = Self::route_field(&route, "srcAmount")?;
        let dest_amount_base = Self::route_field(&route, "destAmount")?;
        let src_usd = Self::route_field(&route, "srcUSD")?.to_string();
        let dest_usd = Self::route_field(&route, "destUSD")?.to_string();

        let src_amount = math::from_base_units(src_amount_base, request.src_decimals)?;
        let dest_amount = math::from_base_units(dest_amount_base, request.dest_decimals)?;

        Ok(RateQuote {
            provider: ProviderId::Paraswap,
            src_token: request.src_token.clone(),
            dest_token: request.dest_token.clone(),
            src_amount,
            dest_amount,
            src_usd,
            dest_usd,
            src_decimals: request.src_decimals,
            dest_decimals: request.dest_decimals,
            side: request.side,
            route: RouteData::Paraswap(route),
        })
    }
}

#[async_trait]
impl SwapProvider for ParaswapClient {
    fn id(&self) -> ProviderId {
        ProviderId::Paraswap
    }

    fn name(&self) -> &'static str {
        "ParaSwap"
    }

    fn supports_chain(&self, chain_id: u64) -> bool {
        self.supported_chains.contains(&chain_id)
    }

    async fn get_sell_rate(&self, request: &SwapRequest) -> Result<RateQuote, SwapdeskError> {
        debug_assert_eq!(request.side, SwapSide::Sell);
        self.fetch_price(request).await
    }

    async fn get_buy_rate(&self, request: &SwapRequest) -> Result<RateQuote, SwapdeskError> {
        debug_assert_eq!(request.side, SwapSide::Buy);
        self.fetch_price(request).await
    }

    async fn build_transaction(
        &self,
        request: &SwapRequest,
        quote: &RateQuote,
    ) -> Result<SwapTransactionParams, SwapdeskError> {
        self.ensure_chain(request.chain_id)?;

        let route = match &quote.route {
            RouteData::Paraswap(route) => route,
            other => {
                return Err(SwapdeskError::transaction_build(
                    self.name(),
                    format!("route was produced by {}", other.provider()),
                ));
            }
        };

        let user_address = request.user_address.as_deref().ok_or_else(|| {
            SwapdeskError::validation_error("user_address", "required to build a transaction")
        })?;

        let bounds = slippage_bounds(request, quote)?;
        let src_amount_base = math::to_base_units(&bounds.max_input, request.src_decimals)?;
        let dest_amount_base = math::to_base_units(&bounds.min_output, request.dest_decimals)?;

        let body = json!({
            "srcToken": request.src_token,
            "srcDecimals": request.src_decimals,
            "destToken": request.dest_token,
            "destDecimals": request.dest_decimals,
            "srcAmount": src_amount_base,
            "destAmount": dest_amount_base,
            "priceRoute": route,
            "userAddress": user_address,
            "partner": self.partner,
            "partnerAddress": fee_claimer_for_chain(request.chain_id),
            "takeSurplus": true,
        });

        let url = format!(
            "{}/transactions/{}?ignoreChecks=true",
            self.base_url, request.chain_id
        );

        logger::debug(
            LogTag::Tx,
            &format!(
                "ParaSwap build: {} -> {} (min out {}, max in {})",
                request.src_token, request.dest_token, bounds.min_output, bounds.max_input
            ),
        );

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| SwapdeskError::transaction_build(self.name(), e.to_string()))?;

        let status = response.status();
        let response_body = response
            .text()
            .await
            .map_err(|e| SwapdeskError::transaction_build(self.name(), e.to_string()))?;

        if !status.is_success() {
            let reason = serde_json::from_str::<ErrorResponse>(&response_body)
                .map(|e| e.error)
                .unwrap_or(response_body);
            return Err(SwapdeskError::transaction_build(
                self.name(),
                format!("HTTP {}: {}", status.as_u16(), reason),
            ));
        }

        let tx: TransactionsResponse = serde_json::from_str(&response_body)
            .map_err(|e| SwapdeskError::transaction_build(self.name(), e.to_string()))?;

        Ok(SwapTransactionParams {
            call_data: tx.data,
            target_contract: tx.to,
            input_amount: bounds.max_input,
            output_amount: bounds.min_output,
            input_amount_usd: quote.src_usd.clone(),
            output_amount_usd: quote.dest_usd.clone(),
        })
    }
}
