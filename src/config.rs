use crate::swaps::selection::UnsupportedAssetRule;
use crate::swaps::SwapKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Runtime configuration for swapdesk
///
/// Loaded from a JSON file at startup and passed explicitly into the
/// constructors that need it (provider clients, registry, watcher). There is
/// no process-global configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub providers: ProvidersConfig,
    pub watcher: WatcherConfig,
    pub swap: SwapConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    pub paraswap: ParaswapConfig,
    pub cow: CowConfig,
    pub price_oracle: PriceOracleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParaswapConfig {
    pub base_url: String,
    pub partner: String,
    pub supported_chains: Vec<u64>,
    pub api_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CowConfig {
    pub base_url: String,
    pub supported_chains: Vec<u64>,
    /// Assets the intent venue cannot handle, per chain and swap kind.
    /// An entry of "*" marks every asset on that chain/kind as unsupported.
    pub unsupported_assets: Vec<UnsupportedAssetRule>,
    pub api_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceOracleConfig {
    pub base_url: String,
    pub api_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Delay between an input change and the fetch it triggers
    pub debounce_ms: u64,
    /// Refresh interval while a quote is available
    pub ready_refresh_secs: u64,
    /// Retry interval after a failed fetch
    pub error_retry_secs: u64,
    /// Hard per-fetch network timeout; a hung provider call becomes an error
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapConfig {
    pub default_slippage_pct: f64,
    /// Margin added to signed approval amounts so accruing balances do not
    /// immediately exceed them
    pub approval_margin_pct: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: ProvidersConfig {
                paraswap: ParaswapConfig {
                    base_url: "https://api.paraswap.io".to_string(),
                    partner: "swapdesk".to_string(),
                    supported_chains: vec![1, 10, 56, 100, 137, 8453, 42161, 43114],
                    api_timeout_secs: 30,
                },
                cow: CowConfig {
                    base_url: "https://api.cow.fi".to_string(),
                    supported_chains: vec![1, 100, 8453, 42161],
                    unsupported_assets: vec![
                        // Rebasing collateral cannot settle through the batch auction
                        UnsupportedAssetRule {
                            chain_id: 1,
                            swap_kind: SwapKind::CollateralSwitch,
                            assets: vec![
                                "0xae7ab96520de3a18e5e111b5eaab095312d7fe84".to_string(),
                            ],
                        },
                        UnsupportedAssetRule {
                            chain_id: 100,
                            swap_kind: SwapKind::DebtSwitch,
                            assets: vec!["*".to_string()],
                        },
                    ],
                    api_timeout_secs: 30,
                },
                price_oracle: PriceOracleConfig {
                    base_url: "https://prices.swapdesk.io".to_string(),
                    api_timeout_secs: 10,
                },
            },
            watcher: WatcherConfig {
                debounce_ms: 400,
                ready_refresh_secs: 30,
                error_retry_secs: 4,
                fetch_timeout_secs: 20,
            },
            swap: SwapConfig {
                default_slippage_pct: 0.5,
                approval_margin_pct: crate::swaps::config::APPROVAL_MARGIN_PCT,
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            let default_config = Self::default();
            default_config.save(path)?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path))?;

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let slippage = self.swap.default_slippage_pct;
        if !(0.0..100.0).contains(&slippage) {
            return Err(anyhow::anyhow!(
                "swap.default_slippage_pct must be in [0, 100), got {}",
                slippage
            ));
        }
        if self.watcher.fetch_timeout_secs == 0 {
            return Err(anyhow::anyhow!("watcher.fetch_timeout_secs must be nonzero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_slippage() {
        let mut config = Config::default();
        config.swap.default_slippage_pct = 100.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(
            parsed.providers.cow.supported_chains,
            config.providers.cow.supported_chains
        );
        assert_eq!(parsed.watcher.debounce_ms, config.watcher.debounce_ms);
    }
}
