//! Rebound monitor: polls until the target gain is reached.

use crate::exchange::ExchangeApi;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, trace, warn};

/// Polls the current price of a held symbol until it recovers past the
/// target gain over the buy price.
pub struct ReboundMonitor {
    target_gain: Decimal,
    poll_interval: Duration,
    shutdown: Arc<AtomicBool>,
}

impl ReboundMonitor {
    pub fn new(target_gain: Decimal, poll_interval: Duration, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            target_gain,
            poll_interval,
            shutdown,
        }
    }

    /// Block until `price >= buy_price * target_gain`, returning the price
    /// that crossed the threshold.
    ///
    /// The wait is unbounded: a price-fetch failure is logged and polling
    /// continues after the same delay. Returns `None` only when shutdown is
    /// requested, leaving the position untouched.
    pub async fn wait_for_target<E: ExchangeApi>(
        &self,
        exchange: &E,
        symbol: &str,
        buy_price: Decimal,
    ) -> Option<Decimal> {
        let target_price = buy_price * self.target_gain;
        info!(%symbol, %buy_price, %target_price, "Waiting for rebound");

        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                return None;
            }

            match exchange.get_price(symbol).await {
                Ok(price) if price >= target_price => {
                    info!(%symbol, %price, %target_price, "Rebound target reached");
                    return Some(price);
                }
                Ok(price) => {
                    trace!(%symbol, %price, %target_price, "Below target; polling");
                }
                Err(e) => {
                    warn!(%symbol, error = %e, "Failed to fetch price; continuing to poll");
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::MockExchange;
    use rust_decimal_macros::dec;

    fn monitor(shutdown: Arc<AtomicBool>) -> ReboundMonitor {
        ReboundMonitor::new(dec!(1.005), Duration::from_millis(1), shutdown)
    }

    #[tokio::test]
    async fn test_fires_once_target_reached() {
        let mock = MockExchange::new();
        mock.script_prices("ETHUSDT", vec![dec!(2000), dec!(2005), dec!(2009.9), dec!(2010)])
            .await;

        let price = monitor(Arc::new(AtomicBool::new(false)))
            .wait_for_target(&mock, "ETHUSDT", dec!(2000))
            .await
            .unwrap();
        assert_eq!(price, dec!(2010));
    }

    #[tokio::test]
    async fn test_survives_price_fetch_failures() {
        let mock = MockExchange::new();
        mock.set_price("ETHUSDT", dec!(2010)).await;
        mock.fail_price_for("ETHUSDT").await;

        let recover = mock.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            recover.clear_price_failure("ETHUSDT").await;
        });

        let price = monitor(Arc::new(AtomicBool::new(false)))
            .wait_for_target(&mock, "ETHUSDT", dec!(2000))
            .await
            .unwrap();
        assert_eq!(price, dec!(2010));
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_wait() {
        let mock = MockExchange::new();
        // Price never reaches the target.
        mock.set_price("ETHUSDT", dec!(1990)).await;

        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            flag.store(true, Ordering::SeqCst);
        });

        let result = monitor(shutdown)
            .wait_for_target(&mock, "ETHUSDT", dec!(2000))
            .await;
        assert!(result.is_none());
    }
}
