//! Type definitions for Binance spot API responses.

use crate::utils::decimal::{safe_div, step_precision, weighted_average};
use rust_decimal::Decimal;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// One kline bucket from `GET /api/v3/klines`.
///
/// Binance delivers klines as heterogeneous JSON arrays
/// (`[open_time, "open", "high", "low", "close", "volume", close_time, ...]`),
/// so deserialization is by position rather than by field name.
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub open_time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub close_time: i64,
}

impl Candle {
    /// Build a candle from just open/close, for simulated market data.
    pub fn from_open_close(open: Decimal, close: Decimal) -> Self {
        Self {
            open_time: 0,
            open,
            high: open.max(close),
            low: open.min(close),
            close,
            volume: Decimal::ZERO,
            close_time: 0,
        }
    }
}

impl<'de> Deserialize<'de> for Candle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let row = Vec::<serde_json::Value>::deserialize(deserializer)?;
        if row.len() < 7 {
            return Err(de::Error::invalid_length(row.len(), &"at least 7 kline fields"));
        }

        fn int<E: de::Error>(value: &serde_json::Value) -> Result<i64, E> {
            value
                .as_i64()
                .ok_or_else(|| E::custom("kline timestamp is not an integer"))
        }

        fn decimal<E: de::Error>(value: &serde_json::Value) -> Result<Decimal, E> {
            value
                .as_str()
                .ok_or_else(|| E::custom("kline price field is not a string"))?
                .parse::<Decimal>()
                .map_err(|e| E::custom(format!("invalid kline decimal: {e}")))
        }

        Ok(Self {
            open_time: int(&row[0])?,
            open: decimal(&row[1])?,
            high: decimal(&row[2])?,
            low: decimal(&row[3])?,
            close: decimal(&row[4])?,
            volume: decimal(&row[5])?,
            close_time: int(&row[6])?,
        })
    }
}

/// Last traded price for a symbol.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

/// Spot account snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    pub balances: Vec<AssetBalance>,
}

/// Free/locked balance for one asset.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetBalance {
    pub asset: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub free: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub locked: Decimal,
}

/// Exchange information (symbol trading rules).
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeInfo {
    pub symbols: Vec<SymbolInfo>,
}

/// Per-symbol metadata and filters.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    pub status: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub filters: Vec<SymbolFilter>,
}

/// Exchange filters attached to a symbol. Only LOT_SIZE is consumed.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "filterType")]
pub enum SymbolFilter {
    #[serde(rename = "LOT_SIZE", rename_all = "camelCase")]
    LotSize {
        #[serde(with = "rust_decimal::serde::str")]
        min_qty: Decimal,
        #[serde(with = "rust_decimal::serde::str")]
        max_qty: Decimal,
        #[serde(with = "rust_decimal::serde::str")]
        step_size: Decimal,
    },
    #[serde(other)]
    Other,
}

/// Quantity constraints for order submission, derived from the LOT_SIZE filter.
///
/// Fetched per buy attempt so the current exchange rules are always used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradingRules {
    pub min_qty: Decimal,
    pub step_size: Decimal,
    /// Decimal scale implied by `step_size` (0.001 -> 3).
    pub quantity_precision: u32,
}

impl TradingRules {
    pub fn new(min_qty: Decimal, step_size: Decimal) -> Self {
        Self {
            min_qty,
            step_size,
            quantity_precision: step_precision(step_size),
        }
    }
}

impl SymbolInfo {
    /// Extract the LOT_SIZE constraints, if the symbol carries that filter.
    pub fn lot_size_rules(&self) -> Option<TradingRules> {
        self.filters.iter().find_map(|f| match f {
            SymbolFilter::LotSize {
                min_qty, step_size, ..
            } => Some(TradingRules::new(*min_qty, *step_size)),
            SymbolFilter::Other => None,
        })
    }
}

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
    Expired,
    ExpiredInMatch,
}

/// One execution within a filled order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fill {
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub qty: Decimal,
}

/// Order response from the exchange (FULL response type).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub symbol: String,
    pub order_id: i64,
    pub status: OrderStatus,
    #[serde(with = "rust_decimal::serde::str")]
    pub executed_qty: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub cummulative_quote_qty: Decimal,
    pub side: OrderSide,
    #[serde(default)]
    pub fills: Vec<Fill>,
}

impl OrderResponse {
    /// Volume-weighted average fill price. Falls back to
    /// quote-quantity / executed-quantity when fills are not reported.
    pub fn avg_fill_price(&self) -> Decimal {
        if self.fills.is_empty() {
            safe_div(self.cummulative_quote_qty, self.executed_qty)
        } else {
            let pairs: Vec<(Decimal, Decimal)> =
                self.fills.iter().map(|f| (f.price, f.qty)).collect();
            weighted_average(&pairs)
        }
    }
}

/// Normalized result of a market order: what filled, at what average price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderFill {
    pub quantity: Decimal,
    pub price: Decimal,
}

impl From<&OrderResponse> for OrderFill {
    fn from(response: &OrderResponse) -> Self {
        Self {
            quantity: response.executed_qty,
            price: response.avg_fill_price(),
        }
    }
}
