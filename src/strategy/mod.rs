//! Trading strategy implementation.
//!
//! Contains the core logic for:
//! - Scanning the watchlist for the steepest recent decline
//! - Kelly-criterion position sizing
//! - Order execution with lot-size normalization
//! - Waiting out the rebound to the target gain
//! - The single-position trading loop tying it all together

mod executor;
mod monitor;
mod scanner;
mod sizer;
mod trader;

pub use executor::OrderExecutor;
pub use monitor::ReboundMonitor;
pub use scanner::{MarketScanner, ScanPick};
pub use sizer::{kelly_fraction, PositionSizer};
pub use trader::{ActiveTrade, Trader, TraderState};
