/// Centralized argument handling for swapdesk
///
/// Consolidates command-line argument parsing and debug flag checking:
/// - Thread-safe CMD_ARGS storage (overridable by tests)
/// - Debug flag helpers for the logger
/// - Value extraction for `--flag value` pairs
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Sets the global command-line arguments
/// Used by tests to override the default env::args() collection
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Gets a copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => env::args().collect(),
    }
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Gets the value of a command-line argument that follows a flag
/// Returns None if the flag is not found or has no value
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    for (i, arg) in args.iter().enumerate() {
        if arg == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

// =============================================================================
// MODE FLAGS
// =============================================================================

/// Watch mode keeps a refresh session alive and prints state transitions
pub fn is_watch_enabled() -> bool {
    has_arg("--watch")
}

/// Force the flash-loan execution path for provider selection
pub fn is_flashloan_enabled() -> bool {
    has_arg("--flashloan")
}

/// Help requested
pub fn is_help_requested() -> bool {
    has_arg("--help") || has_arg("-h")
}

/// Prints usage for the CLI
pub fn print_help() {
    println!("swapdesk - swap rate and route orchestration");
    println!();
    println!("USAGE:");
    println!("  swapdesk --chain <id> --src <address> --src-decimals <n> \\");
    println!("           --dest <address> --dest-decimals <n> --amount <amount> [options]");
    println!();
    println!("OPTIONS:");
    println!("  --config <path>        Config file path (default: swapdesk.json)");
    println!("  --side <sell|buy>      Swap side (default: sell)");
    println!("  --slippage <pct>       Max slippage percent (default from config)");
    println!("  --user <address>       User address attached to quote requests");
    println!("  --kind <kind>          collateral-switch | debt-switch | repay-with-collateral | swap");
    println!("  --flashloan            Force the flash-loan execution path");
    println!("  --build                Also build the swap transaction (requires --user)");
    println!("  --watch                Keep refreshing the quote until Ctrl-C");
    println!();
    println!("DEBUG:");
    println!("  --debug-quotes --debug-providers --debug-watcher --debug-all");
    println!("  --verbose --quiet");
}
