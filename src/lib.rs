//! Swap rate and route orchestration across aggregator venues.
//!
//! Fetches exchange rates for collateral/debt switches and generic token
//! swaps from multiple liquidity providers behind one interface, selects the
//! provider per request, keeps quotes fresh through a debounced refresh
//! watcher, and turns a fetched route into slippage-bounded transaction
//! parameters.

pub mod arguments;
pub mod config;
pub mod errors;
pub mod logger;
pub mod pricing;
pub mod swaps;
