//! Dashboard configuration.
//!
//! Loaded from `~/.config/findash/config.toml` when present, otherwise every
//! value falls back to its default. API keys can also come from the
//! environment so they never have to live in the file.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{fs, path::PathBuf, time::Duration};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub weather: WeatherConfig,
    pub crypto: CryptoConfig,
    pub stock: StockConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
    /// Set from the `DEMO` env var; stock quotes are then generated offline.
    #[serde(skip)]
    pub demo: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub base_url: String,
    pub api_key: String,
    pub default_city: String,
    pub units: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            api_key: String::new(),
            default_city: "Mumbai".to_string(),
            units: "metric".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CoinInfo {
    pub id: String,
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    pub base_url: String,
    pub vs_currency: String,
    pub assets: Vec<CoinInfo>,
    /// Asset id whose price history is charted.
    pub chart_coin: String,
    pub chart_days: u32,
    pub refresh_ms: u64,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".to_string(),
            vs_currency: "usd".to_string(),
            assets: vec![
                CoinInfo {
                    id: "bitcoin".to_string(),
                    name: "Bitcoin".to_string(),
                    symbol: "BTC".to_string(),
                },
                CoinInfo {
                    id: "ethereum".to_string(),
                    name: "Ethereum".to_string(),
                    symbol: "ETH".to_string(),
                },
            ],
            chart_coin: "bitcoin".to_string(),
            chart_days: 7,
            refresh_ms: 60_000,
        }
    }
}

impl CryptoConfig {
    pub fn refresh_period(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    pub fn chart_asset(&self) -> Option<&CoinInfo> {
        self.assets.iter().find(|a| a.id == self.chart_coin)
    }
}

/// One entry of the fixed stock roster.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StockInfo {
    pub symbol: String,
    pub name: String,
    /// Brand color as `#RRGGBB` (an alpha suffix is ignored).
    #[serde(default)]
    pub color: String,
}

impl StockInfo {
    fn new(symbol: &str, name: &str, color: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            color: color.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StockConfig {
    pub base_url: String,
    pub api_key: String,
    pub refresh_ms: u64,
    pub roster: Vec<StockInfo>,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            base_url: "https://finnhub.io/api/v1".to_string(),
            api_key: String::new(),
            refresh_ms: 30_000,
            roster: default_roster(),
        }
    }
}

impl StockConfig {
    pub fn refresh_period(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }
}

fn default_roster() -> Vec<StockInfo> {
    vec![
        StockInfo::new("AAPL", "Apple Inc.", "#A2AAAD"),
        StockInfo::new("MSFT", "Microsoft", "#00A4EF"),
        StockInfo::new("GOOGL", "Alphabet Inc.", "#4285F4"),
        StockInfo::new("AMZN", "Amazon", "#FF9900"),
        StockInfo::new("TSLA", "Tesla Inc.", "#E82127"),
        StockInfo::new("META", "Meta Platforms", "#0668E1"),
        StockInfo::new("NVDA", "NVIDIA", "#76B900"),
        StockInfo::new("NFLX", "Netflix", "#411215ff"),
        StockInfo::new("AMD", "AMD", "#ED1C24"),
        StockInfo::new("INTC", "Intel", "#0071C5"),
        StockInfo::new("ORCL", "Oracle", "#F80000"),
        StockInfo::new("PYPL", "PayPal", "#003087"),
    ]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            user_agent: concat!("findash/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Log file path; defaults to the user cache dir.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn file_path(&self) -> PathBuf {
        self.file.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("findash")
                .join("findash.log")
        })
    }
}

impl Config {
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_default()
            .join(".config/findash/config.toml")
    }

    fn is_demo_mode() -> bool {
        std::env::var("DEMO").map(|v| v == "true" || v == "1").unwrap_or(false)
    }

    /// Load the config file (if any), apply env overrides and validate.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        let mut config = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Self::from_toml_str(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            Self::default()
        };

        if let Ok(key) = std::env::var("OPENWEATHER_API_KEY") {
            config.weather.api_key = key;
        }
        if let Ok(key) = std::env::var("FINNHUB_API_KEY") {
            config.stock.api_key = key;
        }
        config.demo = Self::is_demo_mode();

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw).context("invalid config TOML")?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.crypto.refresh_ms == 0 {
            bail!("crypto.refresh_ms must be > 0");
        }
        if self.stock.refresh_ms == 0 {
            bail!("stock.refresh_ms must be > 0");
        }
        if self.stock.roster.is_empty() {
            bail!("stock.roster must list at least one symbol");
        }
        if self.crypto.assets.is_empty() {
            bail!("crypto.assets must list at least one coin");
        }
        if self.crypto.chart_days == 0 {
            bail!("crypto.chart_days must be > 0");
        }
        if self.crypto.chart_asset().is_none() {
            bail!(
                "crypto.chart_coin '{}' is not one of the configured assets",
                self.crypto.chart_coin
            );
        }
        Ok(())
    }
}
