/// Provider selection policy
///
/// Decides, per swap request, which provider serves the quote. Pure function
/// over an injected policy struct so the decision is deterministic and
/// testable without any configured process state.
use super::config::ALL_ASSETS_SENTINEL;
use super::{ProviderId, SwapKind};
use crate::config::CowConfig;
use serde::{Deserialize, Serialize};

/// Assets the intent venue cannot handle for one chain/swap-kind pair.
/// The sentinel "*" marks every asset on that pair as unsupported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsupportedAssetRule {
    pub chain_id: u64,
    pub swap_kind: SwapKind,
    pub assets: Vec<String>,
}

/// Support tables consulted by `select_provider`
#[derive(Debug, Clone, Default)]
pub struct SelectionPolicy {
    pub cow_supported_chains: Vec<u64>,
    pub cow_unsupported_assets: Vec<UnsupportedAssetRule>,
}

impl SelectionPolicy {
    pub fn from_config(config: &CowConfig) -> Self {
        Self {
            cow_supported_chains: config.supported_chains.clone(),
            cow_unsupported_assets: config.unsupported_assets.clone(),
        }
    }
}

/// Inputs the selection decision depends on
#[derive(Debug, Clone)]
pub struct SelectionContext<'a> {
    pub chain_id: u64,
    pub asset_from: &'a str,
    pub asset_to: &'a str,
    pub use_flashloan: bool,
    pub swap_kind: SwapKind,
}

/// Select the provider for a swap request:
/// 1. Flash-loan execution always goes through ParaSwap; the intent venue
///    cannot settle inside a flash-loan-mediated transaction. This holds even
///    for chains ParaSwap does not serve; the rate client then fails fast
///    with an unsupported-chain error at fetch time.
/// 2. Otherwise CoW is preferred when it supports the chain and neither
///    asset is in the chain/kind unsupported list.
/// 3. Otherwise ParaSwap.
pub fn select_provider(ctx: &SelectionContext<'_>, policy: &SelectionPolicy) -> ProviderId {
    if ctx.use_flashloan {
        return ProviderId::Paraswap;
    }

    if policy.cow_supported_chains.contains(&ctx.chain_id)
        && !cow_asset_unsupported(ctx, policy)
    {
        return ProviderId::Cow;
    }

    ProviderId::Paraswap
}

fn cow_asset_unsupported(ctx: &SelectionContext<'_>, policy: &SelectionPolicy) -> bool {
    for rule in &policy.cow_unsupported_assets {
        if rule.chain_id != ctx.chain_id || rule.swap_kind != ctx.swap_kind {
            continue;
        }
        for asset in &rule.assets {
            if asset == ALL_ASSETS_SENTINEL
                || asset.eq_ignore_ascii_case(ctx.asset_from)
                || asset.eq_ignore_ascii_case(ctx.asset_to)
            {
                return true;
            }
        }
    }
    false
}
