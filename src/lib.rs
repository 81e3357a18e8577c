//! KLAYswap Swap Router
//!
//! Finds the output-maximising path between two tokens across a network of
//! constant-product pools and sizes the swap under a fixed trading fee.
//!
//! # Architecture
//! ```text
//! ┌──────────────────────┐   ┌──────────────────────┐
//! │  PoolListProvider    │──▶│ PoolReserveProvider  │   (collaborators, async)
//! └──────────────────────┘   └──────────┬───────────┘
//!                                       │ Vec<PoolReserves>
//!                                       ▼
//!                            ┌──────────────────────┐
//!                            │  graph::build_graph  │
//!                            └──────────┬───────────┘
//!                                       │ SwapGraph (immutable)
//!                                       ▼
//!                            ┌──────────────────────┐
//!                            │ PathFinder           │◀── amount::swap_output
//!                            └──────────┬───────────┘
//!                                       │ PathSearch
//!                                       ▼
//!                            ┌──────────────────────┐
//!                            │ RouteSelector        │◀── DecimalCache
//!                            │ (slippage, decimals) │
//!                            └──────────────────────┘
//! ```
//!
//! Graph, path search and amount math are pure and synchronous; only the
//! selector touches the collaborators.

pub mod amount;
pub mod config;
pub mod decimals;
pub mod error;
pub mod feed;
pub mod graph;
pub mod models;
pub mod path_finder;
pub mod route;

// Re-export commonly used types
pub use amount::{path_output, swap_input, swap_output, DEFAULT_FEE_RATE};
pub use config::{RouterConfig, SlippageDefaults};
pub use decimals::{fold_amount, unfold_amount, DecimalCache};
pub use error::{Result, RouterError};
pub use feed::{
    DecimalsProvider, KlayswapStatFeed, MockPoolFeed, NativePriceProvider, PoolListProvider,
    PoolReserveProvider, PoolStatusColumns,
};
pub use graph::{build_graph, Edge, SwapGraph};
pub use models::{
    DepositEstimate, DepositLimits, PathSearch, PoolQuote, PoolReserves, Route, SwapPlan,
    TokenAddress, TokenPrice, NATIVE_TOKEN,
};
pub use path_finder::{find_path, PathFinder};
pub use route::{deposit_limits, min_amount, withdraw_limits, RouteSelector};

/// Version of the router
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the package
pub const NAME: &str = env!("CARGO_PKG_NAME");
