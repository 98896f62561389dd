/// Swap rate and route orchestration across aggregator venues
/// Supports the ParaSwap aggregator and the CoW intent venue behind one
/// provider interface, with policy-driven selection per request.
pub mod config;
pub mod cowswap;
pub mod math;
pub mod messages;
pub mod paraswap;
pub mod selection;
pub mod transaction;
pub mod watcher;

#[cfg(test)]
mod tests;

use crate::config::Config;
use crate::errors::SwapdeskError;
use crate::logger::{self, LogTag};
use crate::pricing::PriceOracle;
use async_trait::async_trait;
use cowswap::CowOrder;
use selection::{select_provider, SelectionContext, SelectionPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Identifies a swap-liquidity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Paraswap,
    Cow,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Paraswap => "paraswap",
            ProviderId::Cow => "cow",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Exact-in (sell) fixes the input amount; exact-out (buy) fixes the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapSide {
    Sell,
    Buy,
}

impl SwapSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapSide::Sell => "SELL",
            SwapSide::Buy => "BUY",
        }
    }
}

/// The protocol operation this swap executes under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapKind {
    CollateralSwitch,
    DebtSwitch,
    RepayWithCollateral,
    Swap,
}

impl SwapKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapKind::CollateralSwitch => "collateral_switch",
            SwapKind::DebtSwitch => "debt_switch",
            SwapKind::RepayWithCollateral => "repay_with_collateral",
            SwapKind::Swap => "swap",
        }
    }
}

/// Immutable input to one quote operation. `amount` is a human-unit decimal
/// string; for sell swaps it is the exact input, for buy swaps the exact
/// output.
#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub chain_id: u64,
    pub src_token: String,
    pub src_decimals: u32,
    pub dest_token: String,
    pub dest_decimals: u32,
    pub amount: String,
    pub side: SwapSide,
    pub user_address: Option<String>,
    pub max_slippage_pct: f64,
    pub use_flashloan: bool,
    pub swap_kind: SwapKind,
}

impl SwapRequest {
    /// Stable identity of the inputs a quote was derived from. Two requests
    /// with equal signatures are interchangeable for refresh purposes; a
    /// session for a different user is never interchangeable, so the user
    /// address is part of the identity.
    pub fn signature(&self) -> String {
        let user = self
            .user_address
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_else(|| "-".to_string());
        format!(
            "{}:{}:{}:{}:{}:{}:{}:{}",
            self.chain_id,
            self.src_token.to_lowercase(),
            self.dest_token.to_lowercase(),
            self.amount,
            self.side.as_str(),
            user,
            self.use_flashloan,
            self.swap_kind.as_str(),
        )
    }

    /// Whether the inputs describe a fetchable quote (both tokens set,
    /// nonzero amount). Invalid inputs keep a session in Idle.
    pub fn is_actionable(&self) -> bool {
        if self.src_token.is_empty() || self.dest_token.is_empty() {
            return false;
        }
        match self.amount.trim().parse::<rust_decimal::Decimal>() {
            Ok(value) => !value.is_zero() && !value.is_sign_negative(),
            Err(_) => false,
        }
    }
}

/// Provider-specific route execution data. Opaque to everything except the
/// provider that produced it; the enum tag travels with the payload so a
/// route can never be replayed through a different provider unnoticed.
#[derive(Debug, Clone)]
pub enum RouteData {
    /// Raw price-route JSON, passed back unmodified to the build endpoint
    Paraswap(serde_json::Value),
    /// Signed-order template for the batch auction
    Cow(CowOrder),
}

impl RouteData {
    pub fn provider(&self) -> ProviderId {
        match self {
            RouteData::Paraswap(_) => ProviderId::Paraswap,
            RouteData::Cow(_) => ProviderId::Cow,
        }
    }
}

/// Normalized rate across providers. Amounts are human-unit decimal strings;
/// USD valuations are display strings.
#[derive(Debug, Clone)]
pub struct RateQuote {
    pub provider: ProviderId,
    pub src_token: String,
    pub dest_token: String,
    pub src_amount: String,
    pub dest_amount: String,
    pub src_usd: String,
    pub dest_usd: String,
    pub src_decimals: u32,
    pub dest_decimals: u32,
    pub side: SwapSide,
    pub route: RouteData,
}

/// Terminal artifact handed to the wallet-signing layer. For sell swaps
/// `output_amount` is the slippage-adjusted guaranteed minimum receipt; for
/// buy swaps `input_amount` is the slippage-adjusted maximum spend.
#[derive(Debug, Clone)]
pub struct SwapTransactionParams {
    pub call_data: String,
    pub target_contract: String,
    pub input_amount: String,
    pub output_amount: String,
    pub input_amount_usd: String,
    pub output_amount_usd: String,
}

// ============================================================================
// PROVIDER INTERFACE
// ============================================================================

/// One swap-liquidity provider. Implementations validate chain support before
/// any network call and normalize their error payloads through
/// `messages::normalize_provider_error`.
#[async_trait]
pub trait SwapProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    fn name(&self) -> &'static str;

    fn supports_chain(&self, chain_id: u64) -> bool;

    /// Exact-in rate: request.amount is the input amount
    async fn get_sell_rate(&self, request: &SwapRequest) -> Result<RateQuote, SwapdeskError>;

    /// Exact-out rate: request.amount is the desired output amount
    async fn get_buy_rate(&self, request: &SwapRequest) -> Result<RateQuote, SwapdeskError>;

    /// Turn a previously fetched route into executable transaction params,
    /// applying the request's slippage tolerance. Providers without an
    /// on-chain build step reject this with a TransactionBuild error.
    async fn build_transaction(
        &self,
        request: &SwapRequest,
        quote: &RateQuote,
    ) -> Result<SwapTransactionParams, SwapdeskError>;
}

// ============================================================================
// PROVIDER REGISTRY
// ============================================================================

/// Holds the configured providers plus the selection policy. Constructed once
/// from config and shared; no process-global state.
pub struct ProviderRegistry {
    providers: HashMap<ProviderId, Arc<dyn SwapProvider>>,
    policy: SelectionPolicy,
}

impl ProviderRegistry {
    pub fn from_config(config: &Config) -> Self {
        let oracle = PriceOracle::new(&config.providers.price_oracle);
        let paraswap: Arc<dyn SwapProvider> =
            Arc::new(paraswap::ParaswapClient::new(&config.providers.paraswap));
        let cow: Arc<dyn SwapProvider> =
            Arc::new(cowswap::CowClient::new(&config.providers.cow, oracle));

        let mut providers: HashMap<ProviderId, Arc<dyn SwapProvider>> = HashMap::new();
        providers.insert(ProviderId::Paraswap, paraswap);
        providers.insert(ProviderId::Cow, cow);

        Self {
            providers,
            policy: SelectionPolicy::from_config(&config.providers.cow),
        }
    }

    /// Build a registry from explicit providers; used by tests and by
    /// embedders that wire custom clients.
    pub fn with_providers(
        providers: Vec<Arc<dyn SwapProvider>>,
        policy: SelectionPolicy,
    ) -> Self {
        let providers = providers.into_iter().map(|p| (p.id(), p)).collect();
        Self { providers, policy }
    }

    pub fn provider(&self, id: ProviderId) -> Result<&Arc<dyn SwapProvider>, SwapdeskError> {
        self.providers.get(&id).ok_or_else(|| {
            SwapdeskError::configuration_error(format!("no {} provider configured", id))
        })
    }

    /// Which provider serves this request, per the selection policy
    pub fn select(&self, request: &SwapRequest) -> ProviderId {
        select_provider(
            &SelectionContext {
                chain_id: request.chain_id,
                asset_from: &request.src_token,
                asset_to: &request.dest_token,
                use_flashloan: request.use_flashloan,
                swap_kind: request.swap_kind,
            },
            &self.policy,
        )
    }

    /// Select a provider and fetch the rate for this request
    pub async fn fetch_rate(&self, request: &SwapRequest) -> Result<RateQuote, SwapdeskError> {
        let id = self.select(request);
        let provider = self.provider(id)?;

        logger::debug(
            LogTag::Quote,
            &format!(
                "Fetching {} rate via {}: {} {} -> {} (chain {})",
                request.side.as_str(),
                provider.name(),
                request.amount,
                request.src_token,
                request.dest_token,
                request.chain_id
            ),
        );

        let result = match request.side {
            SwapSide::Sell => provider.get_sell_rate(request).await,
            SwapSide::Buy => provider.get_buy_rate(request).await,
        };

        match &result {
            Ok(quote) => {
                logger::info(
                    LogTag::Quote,
                    &format!(
                        "{} quote: {} {} -> {} {} (${} -> ${})",
                        provider.name(),
                        quote.src_amount,
                        quote.src_token,
                        quote.dest_amount,
                        quote.dest_token,
                        quote.src_usd,
                        quote.dest_usd
                    ),
                );
            }
            Err(e) => {
                logger::warning(
                    LogTag::Quote,
                    &format!("{} quote failed: {}", provider.name(), e),
                );
            }
        }

        result
    }

    /// Build executable transaction params from a previously fetched quote.
    /// The quote must match the request it was derived from; mismatches and
    /// cross-provider route reuse are rejected before any provider call.
    pub async fn build_transaction(
        &self,
        request: &SwapRequest,
        quote: &RateQuote,
    ) -> Result<SwapTransactionParams, SwapdeskError> {
        transaction::validate_quote_binding(request, quote)?;
        let provider = self.provider(quote.route.provider())?;
        provider.build_transaction(request, quote).await
    }
}
