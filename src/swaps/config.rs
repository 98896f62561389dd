/// Swap orchestration constants - hardcoded parameters
/// Policy values that are fixed per deployment, not user-configurable

// =============================================================================
// CHAIN IDENTIFIERS
// =============================================================================

pub const ETHEREUM_MAINNET: u64 = 1;
pub const GNOSIS: u64 = 100;
pub const BASE: u64 = 8453;
pub const ARBITRUM_ONE: u64 = 42161;

// =============================================================================
// FEE CLAIMER CONFIGURATION
// =============================================================================

/// Fee recipient contract attached to every built swap transaction
pub const DEFAULT_FEE_CLAIMER: &str = "0x9abf798f5314bfd793a9e57a654bed35af4a1d60";

/// Base settles fees through a dedicated claimer deployment
pub const BASE_FEE_CLAIMER: &str = "0x74b1c1f27b9efcfbbd30e78fb71b5a9c5fbf6a4e";

// =============================================================================
// PARASWAP PROVIDER CONFIGURATION
// =============================================================================

/// Liquidity sources excluded from ParaSwap routing. These are RFQ/intent
/// style sources whose settlement is incompatible with the flash-loan
/// execution path (the swap must be atomically repayable within one
/// transaction). Fixed policy, not a computed decision.
pub const EXCLUDED_LIQUIDITY_SOURCES: [&str; 6] = [
    "ParaSwapPool",
    "ParaSwapLimitOrders",
    "SwaapV2",
    "Hashflow",
    "Dexalot",
    "Bebop",
];

/// Retry attempts for transient quote-fetch failures
pub const QUOTE_RETRY_ATTEMPTS: u32 = 3;

/// Delay between quote retries (milliseconds)
pub const QUOTE_RETRY_DELAY_MS: u64 = 500;

// =============================================================================
// COW PROVIDER CONFIGURATION
// =============================================================================

/// Sentinel in an unsupported-asset list meaning "all assets unsupported"
pub const ALL_ASSETS_SENTINEL: &str = "*";

/// App-data identifier attached to intent orders
pub const COW_APP_DATA: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000000";

// =============================================================================
// SLIPPAGE AND APPROVAL CONFIGURATION
// =============================================================================

/// Default margin applied to signed approval amounts (percent)
pub const APPROVAL_MARGIN_PCT: f64 = 10.0;
