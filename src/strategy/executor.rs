//! Order execution with exchange quantity normalization.

use crate::exchange::{ExchangeApi, OrderFill, TradingRules};
use crate::utils::decimal::round_down_to_lot;
use anyhow::{ensure, Result};
use rust_decimal::Decimal;
use tracing::info;

/// Sell quantities are rounded to a fixed 6-decimal precision, independent of
/// the symbol's step size. Coarser than the buy path on purpose: this mirrors
/// the strategy's original rounding policy, asymmetry included.
const SELL_QTY_PRECISION: u32 = 6;

/// Places market buy/sell orders, normalizing quantities to the exchange's
/// lot-size constraints.
///
/// Every call places a real, irreversible order on live exchanges.
#[derive(Debug, Default)]
pub struct OrderExecutor;

impl OrderExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Quantize a raw buy quantity to the symbol's trading rules: floored to
    /// the step size, bumped up to the minimum quantity, then rounded to the
    /// precision the step size implies.
    pub fn normalize_buy_quantity(raw: Decimal, rules: &TradingRules) -> Decimal {
        let stepped = round_down_to_lot(raw, rules.step_size);
        stepped.max(rules.min_qty).round_dp(rules.quantity_precision)
    }

    /// Spend `amount_to_invest` of quote currency on a market buy.
    ///
    /// The returned fill carries the ticker price quoted just before
    /// submission as the buy price; trading rules are re-fetched on every
    /// attempt so current exchange constraints always apply.
    pub async fn buy<E: ExchangeApi>(
        &self,
        exchange: &E,
        symbol: &str,
        amount_to_invest: Decimal,
    ) -> Result<OrderFill> {
        let price = exchange.get_price(symbol).await?;
        ensure!(price > Decimal::ZERO, "Non-positive price for {}", symbol);

        let raw_quantity = amount_to_invest / price;
        let rules = exchange.get_trading_rules(symbol).await?;
        let quantity = Self::normalize_buy_quantity(raw_quantity, &rules);

        let fill = exchange.market_buy(symbol, quantity).await?;
        info!(
            %symbol,
            quantity = %fill.quantity,
            %price,
            spent = %amount_to_invest,
            "Buy order filled"
        );

        Ok(OrderFill {
            quantity: fill.quantity,
            price,
        })
    }

    /// Liquidate a previously bought quantity with a market sell.
    pub async fn sell<E: ExchangeApi>(
        &self,
        exchange: &E,
        symbol: &str,
        quantity: Decimal,
    ) -> Result<OrderFill> {
        let quantity = quantity.round_dp(SELL_QTY_PRECISION);
        let fill = exchange.market_sell(symbol, quantity).await?;
        info!(
            %symbol,
            quantity = %fill.quantity,
            price = %fill.price,
            "Sell order filled"
        );
        Ok(fill)
    }
}
