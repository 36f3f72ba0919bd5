//! End-to-end trading cycle scenarios against the scriptable mock exchange.

use dip_rebound_trader::config::StrategyConfig;
use dip_rebound_trader::exchange::{Candle, MockExchange, OrderSide, TradingRules};
use dip_rebound_trader::strategy::{Trader, TraderState};
use rust_decimal_macros::dec;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn test_config(watchlist: &[&str]) -> StrategyConfig {
    StrategyConfig {
        watchlist: watchlist.iter().map(|s| s.to_string()).collect(),
        poll_interval_secs: 0,
        cycle_delay_secs: 0,
        ..StrategyConfig::default()
    }
}

fn two_candle_window(open: rust_decimal::Decimal, close: rust_decimal::Decimal) -> Vec<Candle> {
    vec![
        Candle::from_open_close(open, (open + close) / dec!(2)),
        Candle::from_open_close((open + close) / dec!(2), close),
    ]
}

#[tokio::test]
async fn full_cycle_buys_the_dip_and_sells_the_rebound() {
    let mock = MockExchange::new();
    mock.set_balance("USDT", dec!(100)).await;

    // BTC is down 1%, ETH down 5% -> scanner must pick ETH.
    mock.set_candles("BTCUSDT", two_candle_window(dec!(50000), dec!(49500)))
        .await;
    mock.set_candles("ETHUSDT", two_candle_window(dec!(2105), dec!(2000)))
        .await;
    mock.set_price("BTCUSDT", dec!(49500)).await;
    // Quote at 2000 for the buy, climb to the 0.5% target, then hold there.
    mock.script_prices("ETHUSDT", vec![dec!(2000), dec!(2000), dec!(2004), dec!(2010)])
        .await;
    mock.set_trading_rules("ETHUSDT", TradingRules::new(dec!(0.001), dec!(0.001)))
        .await;

    let mut trader = Trader::new(
        mock.clone(),
        test_config(&["BTCUSDT", "ETHUSDT"]),
        Arc::new(AtomicBool::new(false)),
    );

    // Idle -> Holding: Kelly sizes 40 USDT of the 100 balance, 0.02 ETH at 2000.
    trader.step().await.unwrap();
    let trade = match trader.state() {
        TraderState::Holding(trade) => trade.clone(),
        other => panic!("expected Holding, got {:?}", other),
    };
    assert_eq!(trade.symbol, "ETHUSDT");
    assert_eq!(trade.buy_price, dec!(2000));
    assert_eq!(trade.quantity, dec!(0.02));
    assert_eq!(mock.balance_of("USDT").await, dec!(60));

    // Holding -> Idle: rebound fires at 2010 (>= 2000 * 1.005), position sold.
    trader.step().await.unwrap();
    assert_eq!(*trader.state(), TraderState::Idle);
    assert_eq!(mock.balance_of("ETH").await, dec!(0));
    assert_eq!(mock.balance_of("USDT").await, dec!(100.2));

    let orders = mock.orders().await;
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].side, OrderSide::Buy);
    assert_eq!(orders[1].side, OrderSide::Sell);
    assert_eq!(orders[1].quantity, dec!(0.02));
    assert_eq!(orders[1].price, dec!(2010));

    // The loop keeps going: the next cycle scans and buys again with the
    // updated balance.
    trader.step().await.unwrap();
    match trader.state() {
        TraderState::Holding(next) => {
            assert_eq!(next.symbol, "ETHUSDT");
            // 40.08 USDT at 2010, floored to the 0.001 step.
            assert_eq!(next.quantity, dec!(0.019));
        }
        other => panic!("expected Holding after re-entry, got {:?}", other),
    }
    assert_eq!(mock.orders().await.len(), 3);
}

#[tokio::test]
async fn insufficient_balance_never_places_orders() {
    let mock = MockExchange::new();
    mock.set_balance("USDT", dec!(5)).await;
    mock.set_candles("ETHUSDT", two_candle_window(dec!(2100), dec!(2000)))
        .await;
    mock.set_price("ETHUSDT", dec!(2000)).await;

    let mut trader = Trader::new(
        mock.clone(),
        test_config(&["ETHUSDT"]),
        Arc::new(AtomicBool::new(false)),
    );

    for _ in 0..3 {
        trader.step().await.unwrap();
        assert_eq!(*trader.state(), TraderState::Idle);
    }
    assert!(mock.orders().await.is_empty());
}

#[tokio::test]
async fn scan_with_every_symbol_failing_attempts_no_buy() {
    let mock = MockExchange::new();
    mock.set_balance("USDT", dec!(100)).await;
    mock.fail_candles_for("BTCUSDT").await;
    mock.fail_candles_for("ETHUSDT").await;

    let mut trader = Trader::new(
        mock.clone(),
        test_config(&["BTCUSDT", "ETHUSDT"]),
        Arc::new(AtomicBool::new(false)),
    );

    trader.step().await.unwrap();
    assert_eq!(*trader.state(), TraderState::Idle);
    assert!(mock.orders().await.is_empty());
}

#[tokio::test]
async fn sell_rejection_holds_the_position_across_cycles() {
    let mock = MockExchange::new();
    mock.set_balance("USDT", dec!(100)).await;
    mock.set_candles("ETHUSDT", two_candle_window(dec!(2100), dec!(2000)))
        .await;
    mock.script_prices("ETHUSDT", vec![dec!(2000), dec!(2010)]).await;
    mock.set_trading_rules("ETHUSDT", TradingRules::new(dec!(0.001), dec!(0.001)))
        .await;

    let mut trader = Trader::new(
        mock.clone(),
        test_config(&["ETHUSDT"]),
        Arc::new(AtomicBool::new(false)),
    );

    trader.step().await.unwrap();
    let trade = match trader.state() {
        TraderState::Holding(trade) => trade.clone(),
        other => panic!("expected Holding, got {:?}", other),
    };

    mock.set_fail_sell(true).await;
    for _ in 0..2 {
        trader.step().await.unwrap();
        assert_eq!(*trader.state(), TraderState::Holding(trade.clone()));
    }

    mock.set_fail_sell(false).await;
    trader.step().await.unwrap();
    assert_eq!(*trader.state(), TraderState::Idle);
    assert_eq!(mock.balance_of("ETH").await, dec!(0));
}
