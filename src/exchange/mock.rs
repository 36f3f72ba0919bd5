//! Deterministic in-memory exchange for tests.
//!
//! Candles, prices, balances, and trading rules are scripted up front;
//! market orders fill instantly at the current scripted price and move the
//! simulated balances. Failure injection covers every call site the trading
//! loop has to survive: per-symbol candle fetches, price polls, and order
//! placement.

use crate::exchange::traits::ExchangeApi;
use crate::exchange::types::{Candle, OrderFill, OrderSide, TradingRules};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// A market order the mock accepted, recorded for assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOrder {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub price: Decimal,
}

#[derive(Debug, Default)]
struct MockState {
    candles: HashMap<String, Vec<Candle>>,
    /// Per-symbol price scripts; `get_price` consumes entries, the last one
    /// repeats forever.
    prices: HashMap<String, VecDeque<Decimal>>,
    balances: HashMap<String, Decimal>,
    rules: HashMap<String, TradingRules>,
    fail_candles: HashSet<String>,
    fail_price: HashSet<String>,
    fail_buy: bool,
    fail_sell: bool,
    orders: Vec<PlacedOrder>,
}

/// Scriptable fake implementing [`ExchangeApi`].
///
/// Cloning yields a handle to the same shared state, so tests can keep
/// scripting an exchange they have handed to the trading loop.
#[derive(Clone)]
pub struct MockExchange {
    state: Arc<RwLock<MockState>>,
    quote_asset: String,
}

impl Default for MockExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExchange {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockState::default())),
            quote_asset: "USDT".to_string(),
        }
    }

    pub async fn set_candles(&self, symbol: &str, candles: Vec<Candle>) {
        self.state
            .write()
            .await
            .candles
            .insert(symbol.to_string(), candles);
    }

    /// Set a fixed price for a symbol.
    pub async fn set_price(&self, symbol: &str, price: Decimal) {
        self.script_prices(symbol, vec![price]).await;
    }

    /// Script a sequence of prices; each `get_price` call advances the
    /// script, and the last price repeats once the script is exhausted.
    pub async fn script_prices(&self, symbol: &str, prices: Vec<Decimal>) {
        self.state
            .write()
            .await
            .prices
            .insert(symbol.to_string(), prices.into());
    }

    pub async fn set_balance(&self, asset: &str, amount: Decimal) {
        self.state
            .write()
            .await
            .balances
            .insert(asset.to_string(), amount);
    }

    pub async fn set_trading_rules(&self, symbol: &str, rules: TradingRules) {
        self.state
            .write()
            .await
            .rules
            .insert(symbol.to_string(), rules);
    }

    /// Make candle fetches for a symbol fail.
    pub async fn fail_candles_for(&self, symbol: &str) {
        self.state
            .write()
            .await
            .fail_candles
            .insert(symbol.to_string());
    }

    /// Make the next price fetches for a symbol fail until cleared.
    pub async fn fail_price_for(&self, symbol: &str) {
        self.state
            .write()
            .await
            .fail_price
            .insert(symbol.to_string());
    }

    pub async fn clear_price_failure(&self, symbol: &str) {
        self.state.write().await.fail_price.remove(symbol);
    }

    pub async fn set_fail_buy(&self, fail: bool) {
        self.state.write().await.fail_buy = fail;
    }

    pub async fn set_fail_sell(&self, fail: bool) {
        self.state.write().await.fail_sell = fail;
    }

    /// All orders accepted so far, in placement order.
    pub async fn orders(&self) -> Vec<PlacedOrder> {
        self.state.read().await.orders.clone()
    }

    pub async fn balance_of(&self, asset: &str) -> Decimal {
        self.state
            .read()
            .await
            .balances
            .get(asset)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    fn base_asset(&self, symbol: &str) -> String {
        symbol
            .strip_suffix(self.quote_asset.as_str())
            .unwrap_or(symbol)
            .to_string()
    }

    fn current_price(state: &MockState, symbol: &str) -> Result<Decimal> {
        state
            .prices
            .get(symbol)
            .and_then(|script| script.front().copied())
            .ok_or_else(|| anyhow!("No scripted price for {}", symbol))
    }
}

#[async_trait]
impl ExchangeApi for MockExchange {
    async fn get_candles(&self, symbol: &str, _interval: &str, limit: u16) -> Result<Vec<Candle>> {
        let state = self.state.read().await;
        if state.fail_candles.contains(symbol) {
            return Err(anyhow!("Simulated candle fetch failure for {}", symbol));
        }
        let candles = state
            .candles
            .get(symbol)
            .ok_or_else(|| anyhow!("No scripted candles for {}", symbol))?;
        let start = candles.len().saturating_sub(limit as usize);
        Ok(candles[start..].to_vec())
    }

    async fn get_price(&self, symbol: &str) -> Result<Decimal> {
        let mut state = self.state.write().await;
        if state.fail_price.contains(symbol) {
            return Err(anyhow!("Simulated price fetch failure for {}", symbol));
        }
        let script = state
            .prices
            .get_mut(symbol)
            .ok_or_else(|| anyhow!("No scripted price for {}", symbol))?;
        let price = match script.len() {
            0 => return Err(anyhow!("Price script exhausted for {}", symbol)),
            1 => *script.front().expect("non-empty script"),
            _ => script.pop_front().expect("non-empty script"),
        };
        Ok(price)
    }

    async fn get_balance(&self, asset: &str) -> Result<Decimal> {
        Ok(self.balance_of(asset).await)
    }

    async fn get_trading_rules(&self, symbol: &str) -> Result<TradingRules> {
        Ok(self
            .state
            .read()
            .await
            .rules
            .get(symbol)
            .copied()
            // Permissive default keeps simple tests terse.
            .unwrap_or_else(|| TradingRules::new(dec!(0.00000001), dec!(0.00000001))))
    }

    async fn market_buy(&self, symbol: &str, quantity: Decimal) -> Result<OrderFill> {
        let mut state = self.state.write().await;
        if state.fail_buy {
            return Err(anyhow!("Simulated order rejection: BUY {}", symbol));
        }
        let price = Self::current_price(&state, symbol)?;
        let cost = quantity * price;

        let quote = state
            .balances
            .entry(self.quote_asset.clone())
            .or_insert(Decimal::ZERO);
        if *quote < cost {
            return Err(anyhow!(
                "Insufficient {} balance: have {}, need {}",
                self.quote_asset,
                quote,
                cost
            ));
        }
        *quote -= cost;
        *state
            .balances
            .entry(self.base_asset(symbol))
            .or_insert(Decimal::ZERO) += quantity;

        state.orders.push(PlacedOrder {
            symbol: symbol.to_string(),
            side: OrderSide::Buy,
            quantity,
            price,
        });
        debug!(%symbol, %quantity, %price, "Mock buy filled");
        Ok(OrderFill { quantity, price })
    }

    async fn market_sell(&self, symbol: &str, quantity: Decimal) -> Result<OrderFill> {
        let mut state = self.state.write().await;
        if state.fail_sell {
            return Err(anyhow!("Simulated order rejection: SELL {}", symbol));
        }
        let price = Self::current_price(&state, symbol)?;
        let base = self.base_asset(symbol);

        let held = state
            .balances
            .entry(base.clone())
            .or_insert(Decimal::ZERO);
        if *held < quantity {
            return Err(anyhow!(
                "Insufficient {} balance: have {}, need {}",
                base,
                held,
                quantity
            ));
        }
        *held -= quantity;
        *state
            .balances
            .entry(self.quote_asset.clone())
            .or_insert(Decimal::ZERO) += quantity * price;

        state.orders.push(PlacedOrder {
            symbol: symbol.to_string(),
            side: OrderSide::Sell,
            quantity,
            price,
        });
        debug!(%symbol, %quantity, %price, "Mock sell filled");
        Ok(OrderFill { quantity, price })
    }
}
