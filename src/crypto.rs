use crate::api::CryptoApi;
use crate::app::Update;
use crate::config::{CoinInfo, CryptoConfig};
use crate::error::FetchError;
use crate::poller::Reporter;
use chrono::{DateTime, Local};
use serde_json::Value;
use std::sync::Arc;

/// Horizontal extent of the price chart in chart units.
pub const CHART_WIDTH: f64 = 800.0;

#[derive(Clone, Debug, PartialEq)]
pub struct CoinSnapshot {
    pub name: String,
    pub symbol: String,
    pub price: Option<f64>,
    pub change_24h_pct: Option<f64>,
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,
}

/// One normalized simple-price response, in configured asset order.
pub type CryptoPrices = Vec<CoinSnapshot>;

#[derive(Clone, Debug, PartialEq)]
pub struct PricePoint {
    pub label: String,
    pub price: f64,
}

/// Map a simple-price body onto one snapshot per asset.
pub fn normalize_prices(data: &Value, assets: &[CoinInfo], vs_currency: &str) -> CryptoPrices {
    assets
        .iter()
        .map(|asset| {
            let coin = &data[asset.id.as_str()];
            CoinSnapshot {
                name: asset.name.clone(),
                symbol: asset.symbol.clone(),
                price: coin[vs_currency].as_f64(),
                change_24h_pct: coin[format!("{vs_currency}_24h_change").as_str()].as_f64(),
                market_cap: coin[format!("{vs_currency}_market_cap").as_str()].as_f64(),
                volume_24h: coin[format!("{vs_currency}_24h_vol").as_str()].as_f64(),
            }
        })
        .collect()
}

/// Map a market-chart body onto price points, one per raw sample.
pub fn normalize_history(data: &Value) -> Vec<PricePoint> {
    data["prices"]
        .as_array()
        .map(|samples| {
            samples
                .iter()
                .map(|sample| PricePoint {
                    label: sample[0].as_i64().map(date_label).unwrap_or_else(|| "--".to_string()),
                    price: sample[1].as_f64().map(round2).unwrap_or(0.0).max(0.0),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn date_label(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|t| t.with_timezone(&Local).format("%b %-d").to_string())
        .unwrap_or_else(|| "--".to_string())
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Chart coordinates: x spread evenly over `0..=CHART_WIDTH`, y is the price.
pub fn chart_points(series: &[PricePoint]) -> Vec<(f64, f64)> {
    let last = series.len().saturating_sub(1).max(1) as f64;
    series
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64 / last * CHART_WIDTH, p.price))
        .collect()
}

/// Lowest and highest price in the series.
pub fn price_range(series: &[PricePoint]) -> Option<(f64, f64)> {
    if series.is_empty() {
        return None;
    }
    let low = series.iter().map(|p| p.price).fold(f64::INFINITY, f64::min);
    let high = series.iter().map(|p| p.price).fold(f64::NEG_INFINITY, f64::max);
    Some((low, high))
}

#[derive(Debug)]
pub struct CryptoView {
    pub prices: Option<CryptoPrices>,
    pub history: Vec<PricePoint>,
    pub loading: bool,
    pub last_update: Option<DateTime<Local>>,
}

impl Default for CryptoView {
    fn default() -> Self {
        Self {
            prices: None,
            history: Vec::new(),
            loading: true,
            last_update: None,
        }
    }
}

/// One crypto polling cycle.
///
/// Prices are reported as soon as they arrive, so a failed history request
/// still leaves fresh prices next to the previous cycle's chart.
pub async fn refresh(api: Arc<dyn CryptoApi>, settings: Arc<CryptoConfig>, reporter: Reporter) {
    let outcome = run_cycle(api.as_ref(), &settings, &reporter).await;
    if let Err(e) = &outcome {
        tracing::error!(error = %e, "crypto fetch failed");
    }
    reporter.send(Update::CryptoCycleDone {
        completed: outcome.is_ok(),
    });
}

async fn run_cycle(api: &dyn CryptoApi, settings: &CryptoConfig, reporter: &Reporter) -> Result<(), FetchError> {
    let ids: Vec<String> = settings.assets.iter().map(|a| a.id.clone()).collect();
    let raw = api.simple_price(&ids, &settings.vs_currency).await?;
    reporter.send(Update::CryptoPrices(normalize_prices(
        &raw,
        &settings.assets,
        &settings.vs_currency,
    )));

    let raw = api
        .market_chart(&settings.chart_coin, &settings.vs_currency, settings.chart_days)
        .await?;
    let history = normalize_history(&raw);
    tracing::debug!(points = history.len(), coin = %settings.chart_coin, "price history updated");
    reporter.send(Update::CryptoHistory(history));
    Ok(())
}
