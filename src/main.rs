use anyhow::{anyhow, Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use swapdesk::arguments;
use swapdesk::config::Config;
use swapdesk::logger::{self, LogTag};
use swapdesk::swaps::watcher::{QuoteWatcher, SessionStatus};
use swapdesk::swaps::{self, ProviderRegistry, SwapKind, SwapRequest, SwapSide};

const DEFAULT_CONFIG_PATH: &str = "swapdesk.json";

#[tokio::main]
async fn main() -> Result<()> {
    logger::init();

    if arguments::is_help_requested() {
        arguments::print_help();
        return Ok(());
    }

    let config_path =
        arguments::get_arg_value("--config").unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path))?;
    logger::info(
        LogTag::Config,
        &format!("Loaded configuration from {}", config_path),
    );

    let request = request_from_args(&config)?;
    let registry = Arc::new(ProviderRegistry::from_config(&config));

    logger::info(
        LogTag::System,
        &format!(
            "Provider selected: {} (chain {}, {})",
            registry.select(&request),
            request.chain_id,
            request.side.as_str()
        ),
    );

    if arguments::is_watch_enabled() {
        run_watch(registry, config, request).await
    } else {
        run_once(registry, &config, request).await
    }
}

/// Fetch one quote, print it, optionally build the transaction
async fn run_once(
    registry: Arc<ProviderRegistry>,
    config: &Config,
    request: SwapRequest,
) -> Result<()> {
    let quote = match registry.fetch_rate(&request).await {
        Ok(quote) => quote,
        Err(e) => {
            logger::error(LogTag::Quote, &format!("{}", e));
            return Err(anyhow!("{}", e.user_message()));
        }
    };

    println!();
    println!("Provider:    {}", quote.provider);
    println!("Sell:        {} (${})", quote.src_amount, quote.src_usd);
    println!("Receive:     {} (${})", quote.dest_amount, quote.dest_usd);

    if arguments::has_arg("--build") {
        let params = match registry.build_transaction(&request, &quote).await {
            Ok(params) => params,
            Err(e) => {
                logger::error(LogTag::Tx, &format!("{}", e));
                return Err(anyhow!("{}", e.user_message()));
            }
        };
        // margin keeps an interest-accruing balance under the signed approval
        let approval = swaps::math::margined_approval_amount(
            &params.input_amount,
            request.src_decimals,
            config.swap.approval_margin_pct,
        )
        .map_err(|e| anyhow!("{}", e))?;

        println!();
        println!("To:          {}", params.target_contract);
        println!("Max input:   {}", params.input_amount);
        println!("Min output:  {}", params.output_amount);
        println!("Approve:     {}", approval);
        println!("Calldata:    {}", params.call_data);
    }

    Ok(())
}

/// Keep a refresh session alive and print state transitions until Ctrl-C
async fn run_watch(
    registry: Arc<ProviderRegistry>,
    config: Config,
    request: SwapRequest,
) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let running_handler = Arc::clone(&running);
    ctrlc::set_handler(move || {
        running_handler.store(false, Ordering::SeqCst);
    })
    .context("installing Ctrl-C handler")?;

    let watcher = QuoteWatcher::new(registry, config.watcher.clone());
    watcher.set_request(request);
    logger::info(LogTag::System, "Watching quote; press Ctrl-C to stop");

    let mut last_status = SessionStatus::Idle;
    let mut last_cycle = 0u64;
    while running.load(Ordering::SeqCst) {
        let snap = watcher.snapshot();
        if snap.status != last_status || snap.cycle != last_cycle {
            match snap.status {
                SessionStatus::Ready => {
                    if let Some(quote) = &snap.quote {
                        logger::info(
                            LogTag::Watcher,
                            &format!(
                                "[cycle {}] {}: {} -> {} (${} -> ${})",
                                snap.cycle,
                                quote.provider,
                                quote.src_amount,
                                quote.dest_amount,
                                quote.src_usd,
                                quote.dest_usd
                            ),
                        );
                    }
                }
                SessionStatus::Errored => {
                    if let Some(error) = &snap.error {
                        logger::warning(
                            LogTag::Watcher,
                            &format!("[cycle {}] {}", snap.cycle, error.user_message()),
                        );
                    }
                }
                SessionStatus::Fetching | SessionStatus::Idle => {
                    logger::debug(
                        LogTag::Watcher,
                        &format!("Session status: {}", snap.status.as_str()),
                    );
                }
            }
            last_status = snap.status;
            last_cycle = snap.cycle;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }

    watcher.shutdown();
    logger::info(LogTag::System, "Stopped");
    Ok(())
}

/// Assemble the swap request from command-line arguments
fn request_from_args(config: &Config) -> Result<SwapRequest> {
    let chain_id: u64 = required_arg("--chain")?
        .parse()
        .context("--chain must be a numeric chain id")?;
    let src_token = required_arg("--src")?;
    let src_decimals: u32 = required_arg("--src-decimals")?
        .parse()
        .context("--src-decimals must be a number")?;
    let dest_token = required_arg("--dest")?;
    let dest_decimals: u32 = required_arg("--dest-decimals")?
        .parse()
        .context("--dest-decimals must be a number")?;
    let amount = required_arg("--amount")?;

    let side = match arguments::get_arg_value("--side").as_deref() {
        None | Some("sell") => SwapSide::Sell,
        Some("buy") => SwapSide::Buy,
        Some(other) => return Err(anyhow!("unknown --side '{}': expected sell or buy", other)),
    };

    let swap_kind = match arguments::get_arg_value("--kind").as_deref() {
        None | Some("swap") => SwapKind::Swap,
        Some("collateral-switch") => SwapKind::CollateralSwitch,
        Some("debt-switch") => SwapKind::DebtSwitch,
        Some("repay-with-collateral") => SwapKind::RepayWithCollateral,
        Some(other) => return Err(anyhow!("unknown --kind '{}'", other)),
    };

    let max_slippage_pct = match arguments::get_arg_value("--slippage") {
        Some(raw) => raw.parse().context("--slippage must be a percentage")?,
        None => config.swap.default_slippage_pct,
    };

    Ok(SwapRequest {
        chain_id,
        src_token,
        src_decimals,
        dest_token,
        dest_decimals,
        amount,
        side,
        user_address: arguments::get_arg_value("--user"),
        max_slippage_pct,
        use_flashloan: arguments::is_flashloan_enabled(),
        swap_kind,
    })
}

fn required_arg(flag: &str) -> Result<String> {
    arguments::get_arg_value(flag)
        .ok_or_else(|| anyhow!("missing required argument {} (see --help)", flag))
}
