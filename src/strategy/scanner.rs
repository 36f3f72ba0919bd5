//! Market scanner for picking the steepest recent decline.

use crate::exchange::ExchangeApi;
use crate::utils::decimal::percent_change;
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

/// Outcome of a watchlist scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPick {
    pub symbol: String,
    /// Percent change over the two-candle window (negative = decline).
    pub change_percent: Decimal,
}

/// Ranks a fixed watchlist by recent percent price change and picks the
/// largest decline.
pub struct MarketScanner {
    timeframe: String,
}

impl MarketScanner {
    pub fn new(timeframe: impl Into<String>) -> Self {
        Self {
            timeframe: timeframe.into(),
        }
    }

    /// Return the watchlist symbol with the most negative price change over
    /// its two most recent candles of the configured timeframe.
    ///
    /// The change is measured from the older candle's open to the newest
    /// candle's close. A per-symbol fetch failure is logged and the symbol
    /// skipped; `None` only when every symbol failed. Ties resolve to the
    /// earliest watchlist entry.
    ///
    /// There is deliberately no floor on the decline: when the whole
    /// watchlist is up, the least-positive symbol still wins.
    #[instrument(skip(self, exchange, watchlist))]
    pub async fn select_worst_performer<E: ExchangeApi>(
        &self,
        exchange: &E,
        watchlist: &[String],
    ) -> Option<ScanPick> {
        let mut pick: Option<ScanPick> = None;
        let mut skipped = 0usize;

        for symbol in watchlist {
            let candles = match exchange.get_candles(symbol, &self.timeframe, 2).await {
                Ok(candles) => candles,
                Err(e) => {
                    warn!(%symbol, error = %e, "Failed to fetch candles; skipping symbol");
                    skipped += 1;
                    continue;
                }
            };

            let (older, newest) = match candles.as_slice() {
                [older, newest] => (older, newest),
                _ => {
                    warn!(
                        %symbol,
                        count = candles.len(),
                        "Expected two candles; skipping symbol"
                    );
                    skipped += 1;
                    continue;
                }
            };

            let change = percent_change(older.open, newest.close);
            if pick
                .as_ref()
                .map(|best| change < best.change_percent)
                .unwrap_or(true)
            {
                pick = Some(ScanPick {
                    symbol: symbol.clone(),
                    change_percent: change,
                });
            }
        }

        match &pick {
            Some(best) => info!(
                scanned = watchlist.len(),
                skipped,
                symbol = %best.symbol,
                change_percent = %best.change_percent,
                timeframe = %self.timeframe,
                "Scan complete"
            ),
            None => warn!(
                scanned = watchlist.len(),
                skipped, "Scan complete with no usable symbol"
            ),
        }

        pick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::{Candle, MockExchange};
    use rust_decimal_macros::dec;

    fn watchlist(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    fn window(open: Decimal, close: Decimal) -> Vec<Candle> {
        // Older candle carries the open, newest carries the close.
        vec![
            Candle::from_open_close(open, (open + close) / dec!(2)),
            Candle::from_open_close((open + close) / dec!(2), close),
        ]
    }

    #[tokio::test]
    async fn test_selects_steepest_decline() {
        let mock = MockExchange::new();
        mock.set_candles("BTCUSDT", window(dec!(100), dec!(98))).await; // -2%
        mock.set_candles("ETHUSDT", window(dec!(2000), dec!(1900))).await; // -5%
        mock.set_candles("SOLUSDT", window(dec!(50), dec!(51))).await; // +2%

        let scanner = MarketScanner::new("1h");
        let pick = scanner
            .select_worst_performer(&mock, &watchlist(&["BTCUSDT", "ETHUSDT", "SOLUSDT"]))
            .await
            .unwrap();
        assert_eq!(pick.symbol, "ETHUSDT");
        assert_eq!(pick.change_percent, dec!(-5));
    }

    #[tokio::test]
    async fn test_tie_breaks_to_first_watchlist_entry() {
        let mock = MockExchange::new();
        mock.set_candles("BTCUSDT", window(dec!(100), dec!(97))).await;
        mock.set_candles("ETHUSDT", window(dec!(200), dec!(194))).await; // same -3%

        let scanner = MarketScanner::new("1h");
        let pick = scanner
            .select_worst_performer(&mock, &watchlist(&["BTCUSDT", "ETHUSDT"]))
            .await
            .unwrap();
        assert_eq!(pick.symbol, "BTCUSDT");
    }

    #[tokio::test]
    async fn test_skips_failing_symbol() {
        let mock = MockExchange::new();
        mock.set_candles("BTCUSDT", window(dec!(100), dec!(99))).await;
        mock.set_candles("ETHUSDT", window(dec!(2000), dec!(1800))).await;
        mock.fail_candles_for("ETHUSDT").await;

        let scanner = MarketScanner::new("1h");
        let pick = scanner
            .select_worst_performer(&mock, &watchlist(&["BTCUSDT", "ETHUSDT"]))
            .await
            .unwrap();
        // The steeper decline failed to fetch, so the survivor wins.
        assert_eq!(pick.symbol, "BTCUSDT");
    }

    #[tokio::test]
    async fn test_all_symbols_failing_yields_none() {
        let mock = MockExchange::new();
        mock.fail_candles_for("BTCUSDT").await;
        mock.fail_candles_for("ETHUSDT").await;

        let scanner = MarketScanner::new("1h");
        let pick = scanner
            .select_worst_performer(&mock, &watchlist(&["BTCUSDT", "ETHUSDT"]))
            .await;
        assert!(pick.is_none());
    }

    #[tokio::test]
    async fn test_all_positive_still_picks_least_positive() {
        let mock = MockExchange::new();
        mock.set_candles("BTCUSDT", window(dec!(100), dec!(104))).await; // +4%
        mock.set_candles("ETHUSDT", window(dec!(100), dec!(101))).await; // +1%

        let scanner = MarketScanner::new("1h");
        let pick = scanner
            .select_worst_performer(&mock, &watchlist(&["BTCUSDT", "ETHUSDT"]))
            .await
            .unwrap();
        assert_eq!(pick.symbol, "ETHUSDT");
        assert_eq!(pick.change_percent, dec!(1));
    }
}
