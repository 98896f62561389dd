/// CoW Protocol rate client
///
/// Intent venue: quotes come back as signable order templates settled through
/// a batch auction, so there is no transaction-build step and no calldata.
/// Quote responses carry no USD valuations either; those are filled in from
/// the price oracle before the normalized quote is returned.
use super::config::{COW_APP_DATA, QUOTE_RETRY_ATTEMPTS, QUOTE_RETRY_DELAY_MS};
use super::{
    math, messages, ProviderId, RateQuote, RouteData, SwapProvider, SwapRequest, SwapSide,
    SwapTransactionParams,
};
use crate::config::CowConfig;
use crate::errors::SwapdeskError;
use crate::logger::{self, LogTag};
use crate::pricing::PriceOracle;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use std::time::Duration;

/// Order placeholder when no wallet is connected yet; quotes work without one
const ANONYMOUS_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

// ============================================================================
// API TYPES
// ============================================================================

/// Signable order template returned by the quote endpoint. Carried opaquely
/// inside `RouteData::Cow` for the order-placement layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CowOrder {
    pub sell_token: String,
    pub buy_token: String,
    /// Base-unit integer strings, as the settlement contract consumes them
    pub sell_amount: String,
    pub buy_amount: String,
    pub fee_amount: String,
    pub valid_to: u64,
    pub kind: String,
    pub partially_fillable: bool,
    #[serde(default)]
    pub receiver: Option<String>,
    #[serde(default)]
    pub app_data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    quote: CowOrder,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(rename = "errorType")]
    error_type: String,
    description: String,
}

// ============================================================================
// COW CLIENT
// ============================================================================

pub struct CowClient {
    client: Client,
    base_url: String,
    supported_chains: Vec<u64>,
    timeout: Duration,
    oracle: PriceOracle,
}

impl CowClient {
    pub fn new(config: &CowConfig, oracle: PriceOracle) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            supported_chains: config.supported_chains.clone(),
            timeout: Duration::from_secs(config.api_timeout_secs),
            oracle,
        }
    }

    /// API paths are keyed by network segment, not chain id
    fn network_segment(chain_id: u64) -> Option<&'static str> {
        use super::config::{ARBITRUM_ONE, BASE, ETHEREUM_MAINNET, GNOSIS};
        match chain_id {
            ETHEREUM_MAINNET => Some("mainnet"),
            GNOSIS => Some("xdai"),
            BASE => Some("base"),
            ARBITRUM_ONE => Some("arbitrum_one"),
            _ => None,
        }
    }

    fn quote_url(&self, chain_id: u64) -> Result<String, SwapdeskError> {
        let segment = Self::network_segment(chain_id)
            .filter(|_| self.supported_chains.contains(&chain_id))
            .ok_or_else(|| SwapdeskError::unsupported_chain(self.name(), chain_id))?;
        Ok(format!("{}/{}/api/v1/quote", self.base_url, segment))
    }

    fn quote_body(&self, request: &SwapRequest) -> Result<Value, SwapdeskError> {
        let owner = request.user_address.as_deref().unwrap_or(ANONYMOUS_ADDRESS);
        let mut body = json!({
            "sellToken": request.src_token,
            "buyToken": request.dest_token,
            "from": owner,
            "receiver": owner,
            "appData": COW_APP_DATA,
            "partiallyFillable": false,
        });

        match request.side {
            SwapSide::Sell => {
                let amount = math::to_base_units(&request.amount, request.src_decimals)?;
                body["kind"] = json!("sell");
                body["sellAmountBeforeFee"] = json!(amount);
            }
            SwapSide::Buy => {
                let amount = math::to_base_units(&request.amount, request.dest_decimals)?;
                body["kind"] = json!("buy");
                body["buyAmountAfterFee"] = json!(amount);
            }
        }

        Ok(body)
    }

    async fn fetch_quote(&self, request: &SwapRequest) -> Result<RateQuote, SwapdeskError> {
        let url = self.quote_url(request.chain_id)?;
        let body = self.quote_body(request)?;

        logger::debug(
            LogTag::Provider,
            &format!(
                "CoW {} quote: {} {} -> {} (chain {})",
                request.side.as_str(),
                request.amount,
                request.src_token,
                request.dest_token,
                request.chain_id
            ),
        );
        logger::verbose(LogTag::Provider, &format!("POST {} {}", url, body));

        let mut last_error = SwapdeskError::network_error("no attempt made");

        for attempt in 1..=QUOTE_RETRY_ATTEMPTS {
            match self
                .client
                .post(&url)
                .timeout(self.timeout)
                .json(&body)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    let text = response.text().await.map_err(SwapdeskError::from)?;

                    if status.is_success() {
                        let parsed: QuoteResponse = serde_json::from_str(&text).map_err(|e| {
                            SwapdeskError::parse_error("CoW quote response", e.to_string())
                        })?;
                        return self.quote_from_order(request, parsed.quote).await;
                    }

                    // The venue rejects orders with a typed payload; the type
                    // string is what the normalization tables key on
                    if let Ok(err) = serde_json::from_str::<ErrorResponse>(&text) {
                        let normalized = messages::normalize_provider_error(&err.error_type);
                        if let crate::errors::QuoteError::Generic { .. } = normalized {
                            return Err(
                                messages::normalize_provider_error(&err.description).into()
                            );
                        }
                        return Err(normalized.into());
                    }

                    last_error =
                        SwapdeskError::http_status(url.clone(), status.as_u16(), Some(text));
                }
                Err(e) => {
                    last_error = e.into();
                }
            }

            if attempt < QUOTE_RETRY_ATTEMPTS {
                logger::debug(
                    LogTag::Provider,
                    &format!(
                        "CoW quote attempt {}/{} failed: {}",
                        attempt, QUOTE_RETRY_ATTEMPTS, last_error
                    ),
                );
                tokio::time::sleep(Duration::from_millis(QUOTE_RETRY_DELAY_MS)).await;
            }
        }

        Err(last_error)
    }

    async fn quote_from_order(
        &self,
        request: &SwapRequest,
        order: CowOrder,
    ) -> Result<RateQuote, SwapdeskError> {
        let src_amount = math::from_base_units(&order.sell_amount, request.src_decimals)?;
        let dest_amount = math::from_base_units(&order.buy_amount, request.dest_decimals)?;

        let src_usd = self
            .usd_value(request.chain_id, &request.src_token, &src_amount)
            .await?;
        let dest_usd = self
            .usd_value(request.chain_id, &request.dest_token, &dest_amount)
            .await?;

        Ok(RateQuote {
            provider: ProviderId::Cow,
            src_token: request.src_token.clone(),
            dest_token: request.dest_token.clone(),
            src_amount,
            dest_amount,
            src_usd,
            dest_usd,
            src_decimals: request.src_decimals,
            dest_decimals: request.dest_decimals,
            side: request.side,
            route: RouteData::Cow(order),
        })
    }

    async fn usd_value(
        &self,
        chain_id: u64,
        token: &str,
        amount: &str,
    ) -> Result<String, SwapdeskError> {
        let price = self.oracle.usd_price(chain_id, token).await?;
        let amount = Decimal::from_str(amount)
            .map_err(|e| SwapdeskError::parse_error("quote amount", e.to_string()))?;
        Ok((amount * price).round_dp(2).normalize().to_string())
    }
}

#[async_trait]
impl SwapProvider for CowClient {
    fn id(&self) -> ProviderId {
        ProviderId::Cow
    }

    fn name(&self) -> &'static str {
        "CoW Protocol"
    }

    fn supports_chain(&self, chain_id: u64) -> bool {
        self.supported_chains.contains(&chain_id) && Self::network_segment(chain_id).is_some()
    }

    async fn get_sell_rate(&self, request: &SwapRequest) -> Result<RateQuote, SwapdeskError> {
        debug_assert_eq!(request.side, SwapSide::Sell);
        self.fetch_quote(request).await
    }

    async fn get_buy_rate(&self, request: &SwapRequest) -> Result<RateQuote, SwapdeskError> {
        debug_assert_eq!(request.side, SwapSide::Buy);
        self.fetch_quote(request).await
    }

    /// Orders settle off-chain through the batch auction; there is no
    /// calldata to build. Callers that need calldata must route the swap
    /// through a provider with a build step.
    async fn build_transaction(
        &self,
        _request: &SwapRequest,
        _quote: &RateQuote,
    ) -> Result<SwapTransactionParams, SwapdeskError> {
        Err(SwapdeskError::transaction_build(
            self.name(),
            "orders are settled off-chain; no transaction can be built",
        ))
    }
}
