/// Orchestration tests with stub providers - registry routing, quote
/// binding, and watcher lifecycle (paused-clock timing)
use super::cowswap::CowOrder;
use super::selection::SelectionPolicy;
use super::watcher::{QuoteWatcher, SessionStatus};
use super::*;
use crate::config::WatcherConfig;
use crate::errors::{QuoteError, SwapdeskError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

// ============================================================================
// STUBS
// ============================================================================

struct StubProvider {
    id: ProviderId,
    delay: Duration,
    fail: bool,
    calls: AtomicUsize,
    buy_calls: AtomicUsize,
}

impl StubProvider {
    fn new(id: ProviderId) -> Self {
        Self {
            id,
            delay: Duration::ZERO,
            fail: false,
            calls: AtomicUsize::new(0),
            buy_calls: AtomicUsize::new(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn quote_for(&self, request: &SwapRequest) -> RateQuote {
        let route = match self.id {
            ProviderId::Paraswap => RouteData::Paraswap(serde_json::json!({
                "srcAmount": request.amount,
            })),
            ProviderId::Cow => RouteData::Cow(CowOrder {
                sell_token: request.src_token.clone(),
                buy_token: request.dest_token.clone(),
                sell_amount: request.amount.clone(),
                buy_amount: request.amount.clone(),
                fee_amount: "0".to_string(),
                valid_to: 0,
                kind: "sell".to_string(),
                partially_fillable: false,
                receiver: None,
                app_data: None,
            }),
        };
        RateQuote {
            provider: self.id,
            src_token: request.src_token.clone(),
            dest_token: request.dest_token.clone(),
            src_amount: request.amount.clone(),
            dest_amount: request.amount.clone(),
            src_usd: "1.00".to_string(),
            dest_usd: "1.00".to_string(),
            src_decimals: request.src_decimals,
            dest_decimals: request.dest_decimals,
            side: request.side,
            route,
        }
    }

    async fn answer(&self, request: &SwapRequest) -> Result<RateQuote, SwapdeskError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        if self.fail {
            return Err(QuoteError::Generic {
                message: "stub failure".to_string(),
            }
            .into());
        }
        Ok(self.quote_for(request))
    }
}

#[async_trait]
impl SwapProvider for StubProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn name(&self) -> &'static str {
        match self.id {
            ProviderId::Paraswap => "stub-paraswap",
            ProviderId::Cow => "stub-cow",
        }
    }

    fn supports_chain(&self, _chain_id: u64) -> bool {
        true
    }

    async fn get_sell_rate(&self, request: &SwapRequest) -> Result<RateQuote, SwapdeskError> {
        self.answer(request).await
    }

    async fn get_buy_rate(&self, request: &SwapRequest) -> Result<RateQuote, SwapdeskError> {
        self.buy_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(request).await
    }

    async fn build_transaction(
        &self,
        request: &SwapRequest,
        quote: &RateQuote,
    ) -> Result<SwapTransactionParams, SwapdeskError> {
        let bounds = transaction::slippage_bounds(request, quote)?;
        Ok(SwapTransactionParams {
            call_data: "0xdeadbeef".to_string(),
            target_contract: "0x0000000000000000000000000000000000000042".to_string(),
            input_amount: bounds.max_input,
            output_amount: bounds.min_output,
            input_amount_usd: quote.src_usd.clone(),
            output_amount_usd: quote.dest_usd.clone(),
        })
    }
}

const DAI: &str = "0x6b175474e89094c44da98b954eedeac495271d0f";
const USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";

fn request(amount: &str) -> SwapRequest {
    SwapRequest {
        chain_id: 1,
        src_token: DAI.to_string(),
        src_decimals: 18,
        dest_token: USDC.to_string(),
        dest_decimals: 6,
        amount: amount.to_string(),
        side: SwapSide::Sell,
        user_address: None,
        max_slippage_pct: 0.5,
        use_flashloan: false,
        swap_kind: SwapKind::Swap,
    }
}

fn policy_with_cow_on_chain_one() -> SelectionPolicy {
    SelectionPolicy {
        cow_supported_chains: vec![1],
        cow_unsupported_assets: vec![],
    }
}

fn registry(
    paraswap: Arc<StubProvider>,
    cow: Arc<StubProvider>,
) -> Arc<ProviderRegistry> {
    let providers: Vec<Arc<dyn SwapProvider>> = vec![paraswap, cow];
    Arc::new(ProviderRegistry::with_providers(
        providers,
        policy_with_cow_on_chain_one(),
    ))
}

fn watcher_config() -> WatcherConfig {
    WatcherConfig {
        debounce_ms: 400,
        ready_refresh_secs: 30,
        error_retry_secs: 4,
        fetch_timeout_secs: 20,
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

#[tokio::test]
async fn registry_routes_to_cow_on_supported_chain() {
    let paraswap = Arc::new(StubProvider::new(ProviderId::Paraswap));
    let cow = Arc::new(StubProvider::new(ProviderId::Cow));
    let registry = registry(Arc::clone(&paraswap), Arc::clone(&cow));

    let quote = registry.fetch_rate(&request("100")).await.unwrap();
    assert_eq!(quote.provider, ProviderId::Cow);
    assert_eq!(cow.call_count(), 1);
    assert_eq!(paraswap.call_count(), 0);
}

#[test]
fn request_signature_includes_user_identity() {
    let anonymous = request("100");
    let mut alice = request("100");
    alice.user_address = Some("0x000000000000000000000000000000000000aaaa".to_string());
    assert_ne!(anonymous.signature(), alice.signature());

    // address case does not create a distinct session identity
    let mut alice_upper = request("100");
    alice_upper.user_address = Some("0x000000000000000000000000000000000000AAAA".to_string());
    assert_eq!(alice.signature(), alice_upper.signature());
}

#[tokio::test]
async fn registry_dispatches_buy_side_to_buy_rate() {
    let paraswap = Arc::new(StubProvider::new(ProviderId::Paraswap));
    let cow = Arc::new(StubProvider::new(ProviderId::Cow));
    let registry = registry(Arc::clone(&paraswap), Arc::clone(&cow));

    let mut req = request("99.5");
    req.side = SwapSide::Buy;
    let quote = registry.fetch_rate(&req).await.unwrap();
    assert_eq!(quote.side, SwapSide::Buy);
    assert_eq!(cow.buy_calls.load(Ordering::SeqCst), 1);
    assert_eq!(paraswap.call_count(), 0);
}

#[tokio::test]
async fn flashloan_on_unconfigured_chain_fails_fast_at_fetch() {
    // real ParaSwap client restricted to mainnet; the unreachable base URL
    // proves no request is issued before the chain check
    let paraswap_config = crate::config::ParaswapConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        partner: "swapdesk".to_string(),
        supported_chains: vec![1],
        api_timeout_secs: 1,
    };
    let paraswap: Arc<dyn SwapProvider> =
        Arc::new(paraswap::ParaswapClient::new(&paraswap_config));
    let cow: Arc<dyn SwapProvider> = Arc::new(StubProvider::new(ProviderId::Cow));
    let registry = Arc::new(ProviderRegistry::with_providers(
        vec![paraswap, cow],
        policy_with_cow_on_chain_one(),
    ));

    let mut req = request("100");
    req.chain_id = 999_999;
    req.use_flashloan = true;
    assert_eq!(registry.select(&req), ProviderId::Paraswap);

    let err = registry.fetch_rate(&req).await.unwrap_err();
    assert!(
        matches!(
            err,
            SwapdeskError::Quote(QuoteError::UnsupportedChain { chain_id: 999_999, .. })
        ),
        "got {:?}",
        err
    );
}

#[tokio::test]
async fn registry_routes_flashloan_to_paraswap() {
    let paraswap = Arc::new(StubProvider::new(ProviderId::Paraswap));
    let cow = Arc::new(StubProvider::new(ProviderId::Cow));
    let registry = registry(Arc::clone(&paraswap), Arc::clone(&cow));

    let mut req = request("100");
    req.use_flashloan = true;
    let quote = registry.fetch_rate(&req).await.unwrap();
    assert_eq!(quote.provider, ProviderId::Paraswap);
    assert_eq!(paraswap.call_count(), 1);
    assert_eq!(cow.call_count(), 0);
}

#[tokio::test]
async fn registry_build_dispatches_to_quote_provider_not_selection() {
    let paraswap = Arc::new(StubProvider::new(ProviderId::Paraswap));
    let cow = Arc::new(StubProvider::new(ProviderId::Cow));
    let registry = registry(Arc::clone(&paraswap), Arc::clone(&cow));

    // quote came from ParaSwap even though selection would now pick CoW
    let req = request("100");
    let quote = paraswap.quote_for(&req);
    let params = registry.build_transaction(&req, &quote).await.unwrap();
    assert_eq!(params.call_data, "0xdeadbeef");
    assert_eq!(params.output_amount, "99.5");
}

#[tokio::test]
async fn registry_build_rejects_mismatched_quote() {
    let paraswap = Arc::new(StubProvider::new(ProviderId::Paraswap));
    let cow = Arc::new(StubProvider::new(ProviderId::Cow));
    let registry = registry(Arc::clone(&paraswap), cow);

    let quote = paraswap.quote_for(&request("100"));
    let mut stale = request("250");
    stale.use_flashloan = true;
    let err = registry.build_transaction(&stale, &quote).await.unwrap_err();
    assert!(matches!(err, SwapdeskError::Data(_)), "got {:?}", err);
}

// ============================================================================
// WATCHER
// ============================================================================

#[tokio::test(start_paused = true)]
async fn watcher_debounces_then_reaches_ready() {
    let paraswap = Arc::new(StubProvider::new(ProviderId::Paraswap));
    let cow = Arc::new(StubProvider::new(ProviderId::Cow));
    let watcher = QuoteWatcher::new(registry(paraswap, Arc::clone(&cow)), watcher_config());

    watcher.set_request(request("100"));
    // debouncing counts as Fetching, but no request has gone out yet
    let snap = watcher.snapshot();
    assert_eq!(snap.status, SessionStatus::Fetching);
    assert_eq!(snap.cycle, 0);
    assert_eq!(cow.call_count(), 0);

    sleep(Duration::from_millis(500)).await;
    let snap = watcher.snapshot();
    assert_eq!(snap.status, SessionStatus::Ready);
    assert_eq!(snap.cycle, 1);
    assert_eq!(snap.quote.unwrap().src_amount, "100");
    assert_eq!(cow.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn watcher_refreshes_on_slow_interval_when_ready() {
    let paraswap = Arc::new(StubProvider::new(ProviderId::Paraswap));
    let cow = Arc::new(StubProvider::new(ProviderId::Cow));
    let watcher = QuoteWatcher::new(registry(paraswap, Arc::clone(&cow)), watcher_config());

    watcher.set_request(request("100"));
    sleep(Duration::from_millis(500)).await;
    assert_eq!(watcher.snapshot().cycle, 1);

    // one slow refresh interval later, exactly one more fetch has happened
    sleep(Duration::from_secs(31)).await;
    assert_eq!(watcher.snapshot().cycle, 2);
    assert_eq!(cow.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn watcher_retries_fast_after_error() {
    let paraswap = Arc::new(StubProvider::new(ProviderId::Paraswap));
    let cow = Arc::new(StubProvider::new(ProviderId::Cow).failing());
    let watcher = QuoteWatcher::new(registry(paraswap, Arc::clone(&cow)), watcher_config());

    watcher.set_request(request("100"));
    sleep(Duration::from_millis(500)).await;
    let snap = watcher.snapshot();
    assert_eq!(snap.status, SessionStatus::Errored);
    assert!(snap.quote.is_none());
    assert!(snap.error.is_some());

    // error retry interval is much shorter than the ready refresh
    sleep(Duration::from_secs(5)).await;
    assert!(watcher.snapshot().cycle >= 2);
    assert!(cow.call_count() >= 2);
}

#[tokio::test(start_paused = true)]
async fn watcher_drops_stale_fetch_for_superseded_request() {
    let paraswap = Arc::new(StubProvider::new(ProviderId::Paraswap));
    let cow = Arc::new(StubProvider::new(ProviderId::Cow).with_delay(Duration::from_secs(3)));
    let watcher = QuoteWatcher::new(registry(paraswap, Arc::clone(&cow)), watcher_config());

    // first request's fetch starts, then a new request supersedes it mid-flight
    let first = request("100");
    watcher.set_request(first);
    sleep(Duration::from_millis(600)).await;

    let second = request("250");
    let second_signature = second.signature();
    watcher.set_request(second);
    sleep(Duration::from_secs(10)).await;

    let snap = watcher.snapshot();
    assert_eq!(snap.status, SessionStatus::Ready);
    assert_eq!(snap.request_signature.as_deref(), Some(second_signature.as_str()));
    assert_eq!(snap.quote.unwrap().src_amount, "250");
}

#[tokio::test(start_paused = true)]
async fn watcher_parks_idle_on_non_actionable_input() {
    let paraswap = Arc::new(StubProvider::new(ProviderId::Paraswap));
    let cow = Arc::new(StubProvider::new(ProviderId::Cow));
    let watcher = QuoteWatcher::new(registry(paraswap, Arc::clone(&cow)), watcher_config());

    watcher.set_request(request("0"));
    sleep(Duration::from_secs(60)).await;

    let snap = watcher.snapshot();
    assert_eq!(snap.status, SessionStatus::Idle);
    assert_eq!(snap.cycle, 0);
    assert!(snap.request_signature.is_none());
    assert_eq!(cow.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn watcher_clears_previous_quote_when_input_becomes_non_actionable() {
    let paraswap = Arc::new(StubProvider::new(ProviderId::Paraswap));
    let cow = Arc::new(StubProvider::new(ProviderId::Cow));
    let watcher = QuoteWatcher::new(registry(paraswap, cow), watcher_config());

    watcher.set_request(request("100"));
    sleep(Duration::from_millis(500)).await;
    assert_eq!(watcher.snapshot().status, SessionStatus::Ready);

    watcher.set_request(request("0"));
    let snap = watcher.snapshot();
    assert_eq!(snap.status, SessionStatus::Idle);
    assert!(snap.quote.is_none());
}

#[tokio::test(start_paused = true)]
async fn watcher_times_out_hung_fetch() {
    let paraswap = Arc::new(StubProvider::new(ProviderId::Paraswap));
    let cow = Arc::new(StubProvider::new(ProviderId::Cow).with_delay(Duration::from_secs(120)));
    let watcher = QuoteWatcher::new(registry(paraswap, cow), watcher_config());

    watcher.set_request(request("100"));
    sleep(Duration::from_secs(25)).await;

    let snap = watcher.snapshot();
    assert_eq!(snap.status, SessionStatus::Errored);
    assert!(matches!(snap.error, Some(SwapdeskError::Network(_))));
}

#[tokio::test(start_paused = true)]
async fn watcher_shutdown_stops_refreshing() {
    let paraswap = Arc::new(StubProvider::new(ProviderId::Paraswap));
    let cow = Arc::new(StubProvider::new(ProviderId::Cow));
    let watcher = QuoteWatcher::new(registry(paraswap, Arc::clone(&cow)), watcher_config());

    watcher.set_request(request("100"));
    sleep(Duration::from_millis(500)).await;
    assert_eq!(cow.call_count(), 1);

    watcher.shutdown();
    sleep(Duration::from_secs(120)).await;
    assert_eq!(cow.call_count(), 1);
    assert_eq!(watcher.snapshot().status, SessionStatus::Idle);
}
