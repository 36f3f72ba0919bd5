//! Exchange integration.
//!
//! The Binance spot REST client lives here alongside the [`ExchangeApi`]
//! trait that abstracts it, and a scriptable [`MockExchange`] for
//! deterministic tests.

mod client;
pub mod mock;
mod traits;
mod types;

pub use client::BinanceClient;
pub use mock::MockExchange;
pub use traits::ExchangeApi;
pub use types::*;
