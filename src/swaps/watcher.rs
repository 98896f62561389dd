/// Quote refresh watcher
///
/// Keeps one swap-input session's rate fresh: debounces input changes,
/// fetches through the provider registry, then re-fetches on a slow interval
/// while a quote is ready and a fast one after a failure. Each input change
/// bumps a generation counter and aborts the previous task; a commit from a
/// superseded generation is dropped, so a slow stale fetch can never
/// overwrite the result of a newer one.
use super::{ProviderRegistry, RateQuote, SwapRequest};
use crate::config::WatcherConfig;
use crate::errors::SwapdeskError;
use crate::logger::{self, LogTag};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

// ============================================================================
// SESSION STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No actionable input; nothing is being fetched
    Idle,
    /// An actionable request is pending: debouncing, or a fetch in flight
    Fetching,
    /// The last fetch succeeded; `quote` holds the current rate
    Ready,
    /// The last fetch failed; `error` holds the failure
    Errored,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Fetching => "fetching",
            SessionStatus::Ready => "ready",
            SessionStatus::Errored => "errored",
        }
    }
}

/// Point-in-time copy of the session state, safe to hand to a UI layer
#[derive(Debug, Clone)]
pub struct QuoteSnapshot {
    pub status: SessionStatus,
    pub quote: Option<RateQuote>,
    pub error: Option<SwapdeskError>,
    /// Signature of the request the current quote/error belongs to
    pub request_signature: Option<String>,
    /// Completed fetch count across the session, for diagnostics
    pub cycle: u64,
}

struct WatcherState {
    generation: u64,
    status: SessionStatus,
    quote: Option<RateQuote>,
    error: Option<SwapdeskError>,
    request_signature: Option<String>,
    cycle: u64,
    task: Option<TaskHandle>,
}

/// Owns a refresh loop task; aborts it when cancelled or dropped
struct TaskHandle {
    handle: JoinHandle<()>,
}

impl TaskHandle {
    fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ============================================================================
// WATCHER
// ============================================================================

pub struct QuoteWatcher {
    registry: Arc<ProviderRegistry>,
    config: WatcherConfig,
    state: Mutex<WatcherState>,
}

impl QuoteWatcher {
    pub fn new(registry: Arc<ProviderRegistry>, config: WatcherConfig) -> Arc<Self> {
        Arc::new(Self {
            registry,
            config,
            state: Mutex::new(WatcherState {
                generation: 0,
                status: SessionStatus::Idle,
                quote: None,
                error: None,
                request_signature: None,
                cycle: 0,
                task: None,
            }),
        })
    }

    /// Replace the session's inputs. Supersedes any in-flight fetch; if the
    /// new inputs are not actionable the session parks in Idle with no
    /// stale quote left behind.
    pub fn set_request(self: &Arc<Self>, request: SwapRequest) {
        let mut state = self.state.lock();
        state.generation += 1;
        if let Some(task) = state.task.take() {
            task.cancel();
        }

        if !request.is_actionable() {
            logger::debug(LogTag::Watcher, "Inputs not actionable; session idle");
            state.status = SessionStatus::Idle;
            state.quote = None;
            state.error = None;
            state.request_signature = None;
            return;
        }

        let signature = request.signature();
        logger::debug(
            LogTag::Watcher,
            &format!("New request (gen {}): {}", state.generation, signature),
        );
        // Actionable input means a fetch is owed; the debounce wait counts
        // as part of it
        state.status = SessionStatus::Fetching;
        state.quote = None;
        state.error = None;
        state.request_signature = Some(signature);

        let watcher = Arc::clone(self);
        let generation = state.generation;
        let handle = tokio::spawn(async move {
            watcher.refresh_loop(generation, request).await;
        });
        state.task = Some(TaskHandle { handle });
    }

    /// Stop refreshing and park in Idle. Keeps nothing from the old session.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        if let Some(task) = state.task.take() {
            task.cancel();
        }
        state.status = SessionStatus::Idle;
        state.quote = None;
        state.error = None;
        state.request_signature = None;
    }

    pub fn snapshot(&self) -> QuoteSnapshot {
        let state = self.state.lock();
        QuoteSnapshot {
            status: state.status,
            quote: state.quote.clone(),
            error: state.error.clone(),
            request_signature: state.request_signature.clone(),
            cycle: state.cycle,
        }
    }

    async fn refresh_loop(self: Arc<Self>, generation: u64, request: SwapRequest) {
        sleep(Duration::from_millis(self.config.debounce_ms)).await;

        loop {
            if !self.mark_fetching(generation) {
                return;
            }

            let fetch_timeout = Duration::from_secs(self.config.fetch_timeout_secs);
            let outcome = match timeout(fetch_timeout, self.registry.fetch_rate(&request)).await {
                Ok(result) => result,
                Err(_) => Err(SwapdeskError::network_error(format!(
                    "quote fetch timed out after {}s",
                    self.config.fetch_timeout_secs
                ))),
            };

            let delay = match self.commit(generation, outcome) {
                Some(delay) => delay,
                None => return,
            };
            sleep(delay).await;
        }
    }

    /// Flip to Fetching if this generation is still current
    fn mark_fetching(&self, generation: u64) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation {
            return false;
        }
        state.status = SessionStatus::Fetching;
        true
    }

    /// Record a fetch outcome and return the delay before the next refresh,
    /// or None when the outcome belongs to a superseded generation.
    fn commit(
        &self,
        generation: u64,
        outcome: Result<RateQuote, SwapdeskError>,
    ) -> Option<Duration> {
        let mut state = self.state.lock();
        if state.generation != generation {
            logger::debug(
                LogTag::Watcher,
                &format!("Dropping stale fetch result (gen {})", generation),
            );
            return None;
        }

        state.cycle += 1;
        let delay = match outcome {
            Ok(quote) => {
                logger::debug(
                    LogTag::Watcher,
                    &format!(
                        "Cycle {}: {} quote ready, next refresh in {}s",
                        state.cycle,
                        quote.provider,
                        self.config.ready_refresh_secs
                    ),
                );
                state.status = SessionStatus::Ready;
                state.quote = Some(quote);
                state.error = None;
                Duration::from_secs(self.config.ready_refresh_secs)
            }
            Err(error) => {
                logger::debug(
                    LogTag::Watcher,
                    &format!(
                        "Cycle {}: fetch failed ({}), retry in {}s",
                        state.cycle, error, self.config.error_retry_secs
                    ),
                );
                state.status = SessionStatus::Errored;
                state.quote = None;
                state.error = Some(error);
                Duration::from_secs(self.config.error_retry_secs)
            }
        };
        Some(delay)
    }
}
