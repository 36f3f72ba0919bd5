//! Binance spot REST API client.

use crate::config::BinanceConfig;
use crate::exchange::traits::ExchangeApi;
use crate::exchange::types::*;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use rust_decimal::Decimal;
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, instrument};

const SPOT_BASE_URL: &str = "https://api.binance.com";
const SPOT_TESTNET_URL: &str = "https://testnet.binance.vision";

/// Binance API client for the spot market.
pub struct BinanceClient {
    http: Client,
    api_key: String,
    secret_key: String,
    base_url: String,
}

impl BinanceClient {
    /// Create a new Binance client from configuration.
    pub fn new(config: &BinanceConfig) -> Result<Self> {
        let base_url = if config.testnet {
            SPOT_TESTNET_URL.to_string()
        } else {
            SPOT_BASE_URL.to_string()
        };
        Self::with_base_url(config, base_url)
    }

    /// Create a client against an explicit base URL (testnet, local stub).
    pub fn with_base_url(config: &BinanceConfig, base_url: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            secret_key: config.secret_key.clone(),
            base_url,
        })
    }

    /// Generate HMAC-SHA256 signature for authenticated requests.
    fn sign(&self, query_string: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret_key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(query_string.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Get current timestamp in milliseconds.
    fn timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_millis() as u64
    }

    // ==================== Market Data (Public) ====================

    /// Fetch the most recent klines for a symbol, oldest first.
    #[instrument(skip(self))]
    pub async fn get_klines(&self, symbol: &str, interval: &str, limit: u16) -> Result<Vec<Candle>> {
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.base_url, symbol, interval, limit
        );
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("Failed to fetch klines")?
            .error_for_status()
            .context("Kline request rejected")?;

        response.json().await.context("Failed to parse kline response")
    }

    /// Current ticker price for a symbol.
    #[instrument(skip(self))]
    pub async fn get_ticker_price(&self, symbol: &str) -> Result<TickerPrice> {
        let url = format!("{}/api/v3/ticker/price?symbol={}", self.base_url, symbol);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("Failed to fetch ticker price")?
            .error_for_status()
            .context("Ticker request rejected")?;

        response.json().await.context("Failed to parse ticker response")
    }

    /// Exchange trading rules for one symbol.
    #[instrument(skip(self))]
    pub async fn get_exchange_info(&self, symbol: &str) -> Result<ExchangeInfo> {
        let url = format!("{}/api/v3/exchangeInfo?symbol={}", self.base_url, symbol);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("Failed to fetch exchange info")?
            .error_for_status()
            .context("Exchange info request rejected")?;

        response
            .json()
            .await
            .context("Failed to parse exchange info response")
    }

    // ==================== Account (Authenticated) ====================

    /// Fetch the spot account snapshot.
    #[instrument(skip(self))]
    pub async fn get_account(&self) -> Result<AccountInfo> {
        let timestamp = Self::timestamp();
        let query = format!("timestamp={}", timestamp);
        let signature = self.sign(&query);

        let url = format!(
            "{}/api/v3/account?{}&signature={}",
            self.base_url, query, signature
        );

        let response = self
            .http
            .get(&url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await
            .context("Failed to fetch account")?
            .error_for_status()
            .context("Account request rejected")?;

        response.json().await.context("Failed to parse account response")
    }

    // ==================== Orders (Authenticated) ====================

    /// Place a spot market order.
    ///
    /// Requests the FULL response type so the per-fill breakdown is
    /// available for average-price computation.
    #[instrument(skip(self))]
    pub async fn place_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<OrderResponse> {
        let timestamp = Self::timestamp();
        let params = [
            ("symbol".to_string(), symbol.to_string()),
            ("side".to_string(), format!("{:?}", side).to_uppercase()),
            ("type".to_string(), "MARKET".to_string()),
            ("quantity".to_string(), quantity.to_string()),
            ("newOrderRespType".to_string(), "FULL".to_string()),
            ("timestamp".to_string(), timestamp.to_string()),
        ];

        let query_string: String = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let signature = self.sign(&query_string);
        let url = format!(
            "{}/api/v3/order?{}&signature={}",
            self.base_url, query_string, signature
        );

        debug!(%symbol, ?side, %quantity, "Placing market order");

        let response = self
            .http
            .post(&url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await
            .context("Failed to place market order")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Order rejected ({}): {}", status, body));
        }

        response.json().await.context("Failed to parse order response")
    }
}

#[async_trait]
impl ExchangeApi for BinanceClient {
    async fn get_candles(&self, symbol: &str, interval: &str, limit: u16) -> Result<Vec<Candle>> {
        self.get_klines(symbol, interval, limit).await
    }

    async fn get_price(&self, symbol: &str) -> Result<Decimal> {
        Ok(self.get_ticker_price(symbol).await?.price)
    }

    async fn get_balance(&self, asset: &str) -> Result<Decimal> {
        let account = self.get_account().await?;
        Ok(account
            .balances
            .iter()
            .find(|b| b.asset == asset)
            .map(|b| b.free)
            .unwrap_or(Decimal::ZERO))
    }

    async fn get_trading_rules(&self, symbol: &str) -> Result<TradingRules> {
        let info = self.get_exchange_info(symbol).await?;
        info.symbols
            .iter()
            .find(|s| s.symbol == symbol)
            .and_then(|s| s.lot_size_rules())
            .ok_or_else(|| anyhow!("No LOT_SIZE filter for {}", symbol))
    }

    async fn market_buy(&self, symbol: &str, quantity: Decimal) -> Result<OrderFill> {
        let response = self
            .place_market_order(symbol, OrderSide::Buy, quantity)
            .await?;
        Ok(OrderFill::from(&response))
    }

    async fn market_sell(&self, symbol: &str, quantity: Decimal) -> Result<OrderFill> {
        let response = self
            .place_market_order(symbol, OrderSide::Sell, quantity)
            .await?;
        Ok(OrderFill::from(&response))
    }
}
