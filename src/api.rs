//! Upstream data providers.
//!
//! Views talk to these traits only; `HttpClient` is the real implementation
//! and tests plug in fakes. Every method returns the raw JSON body so the
//! view modules own normalization.

use crate::config::Config;
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;

#[async_trait]
pub trait WeatherApi: Send + Sync {
    /// Current conditions for a city. Any non-2xx status is `NotFound`.
    async fn current(&self, city: &str) -> Result<Value, FetchError>;
}

#[async_trait]
pub trait CryptoApi: Send + Sync {
    /// Combined price, 24h change, 24h volume and market cap for `ids`.
    async fn simple_price(&self, ids: &[String], vs_currency: &str) -> Result<Value, FetchError>;

    /// Historical `[timestamp_ms, price]` series for one coin.
    async fn market_chart(&self, id: &str, vs_currency: &str, days: u32) -> Result<Value, FetchError>;
}

#[async_trait]
pub trait StockApi: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<Value, FetchError>;
}

/// The set of providers the dashboard pulls from.
#[derive(Clone)]
pub struct Services {
    pub weather: Arc<dyn WeatherApi>,
    pub crypto: Arc<dyn CryptoApi>,
    pub stock: Arc<dyn StockApi>,
}

impl Services {
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let http = Arc::new(HttpClient::new(config)?);
        let stock: Arc<dyn StockApi> = if config.demo {
            Arc::new(OfflineQuotes)
        } else {
            http.clone()
        };
        Ok(Self {
            weather: http.clone(),
            crypto: http,
            stock,
        })
    }
}

pub struct HttpClient {
    client: Client,
    weather_base: String,
    weather_key: String,
    units: String,
    crypto_base: String,
    stock_base: String,
    stock_key: String,
}

impl HttpClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.http.timeout())
            .user_agent(config.http.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            weather_base: config.weather.base_url.trim_end_matches('/').to_string(),
            weather_key: config.weather.api_key.clone(),
            units: config.weather.units.clone(),
            crypto_base: config.crypto.base_url.trim_end_matches('/').to_string(),
            stock_base: config.stock.base_url.trim_end_matches('/').to_string(),
            stock_key: config.stock.api_key.clone(),
        })
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, FetchError> {
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl WeatherApi for HttpClient {
    async fn current(&self, city: &str) -> Result<Value, FetchError> {
        let url = format!("{}/weather", self.weather_base);
        let query = [
            ("q", city),
            ("units", self.units.as_str()),
            ("appid", self.weather_key.as_str()),
        ];
        match self.get_json(&url, &query).await {
            Err(FetchError::Status(code)) => {
                tracing::debug!(city, code, "weather lookup rejected");
                Err(FetchError::NotFound)
            }
            other => other,
        }
    }
}

#[async_trait]
impl CryptoApi for HttpClient {
    async fn simple_price(&self, ids: &[String], vs_currency: &str) -> Result<Value, FetchError> {
        let url = format!("{}/simple/price", self.crypto_base);
        let ids = ids.join(",");
        let query = [
            ("ids", ids.as_str()),
            ("vs_currencies", vs_currency),
            ("include_24hr_change", "true"),
            ("include_market_cap", "true"),
            ("include_24hr_vol", "true"),
        ];
        self.get_json(&url, &query).await
    }

    async fn market_chart(&self, id: &str, vs_currency: &str, days: u32) -> Result<Value, FetchError> {
        let url = format!("{}/coins/{}/market_chart", self.crypto_base, id);
        let days = days.to_string();
        let query = [("vs_currency", vs_currency), ("days", days.as_str())];
        self.get_json(&url, &query).await
    }
}

#[async_trait]
impl StockApi for HttpClient {
    async fn quote(&self, symbol: &str) -> Result<Value, FetchError> {
        let url = format!("{}/quote", self.stock_base);
        let query = [("symbol", symbol), ("token", self.stock_key.as_str())];
        self.get_json(&url, &query).await
    }
}

/// Stock source for demo mode: never touches the network and reports every
/// quote as absent, so the roster is filled with synthetic data.
pub struct OfflineQuotes;

#[async_trait]
impl StockApi for OfflineQuotes {
    async fn quote(&self, _symbol: &str) -> Result<Value, FetchError> {
        Ok(Value::Null)
    }
}
