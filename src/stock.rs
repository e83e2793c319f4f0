use crate::api::StockApi;
use crate::config::StockInfo;
use chrono::{DateTime, Local};
use rand::Rng;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinSet;

pub const ADVISORY: &str = "Unable to fetch live data. Displaying demo data.";

/// Market data for one roster symbol, live or synthetic.
#[derive(Clone, Debug, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub display_name: String,
    pub price: f64,
    pub previous_close: f64,
    pub change: f64,
    pub change_percent: f64,
    pub day_high: f64,
    pub day_low: f64,
    pub volume: u64,
    pub market_cap: f64,
    pub color_hint: String,
    pub synthetic: bool,
}

/// Percent move relative to the price before `change` was applied.
pub fn percent_change(price: f64, change: f64) -> f64 {
    let base = price - change;
    if base == 0.0 {
        0.0
    } else {
        change / base * 100.0
    }
}

impl Quote {
    /// Map a Finnhub quote body. `None` when there is no usable price.
    pub fn from_finnhub<R: Rng>(info: &StockInfo, data: &Value, rng: &mut R) -> Option<Quote> {
        let price = data["c"].as_f64().filter(|c| *c != 0.0)?;
        let prev = data["pc"].as_f64();
        let change = data["d"]
            .as_f64()
            .or_else(|| prev.map(|pc| price - pc))
            .unwrap_or(0.0);

        Some(Quote {
            symbol: info.symbol.clone(),
            display_name: info.name.clone(),
            price,
            previous_close: prev.unwrap_or(price - change),
            change,
            change_percent: data["dp"]
                .as_f64()
                .unwrap_or_else(|| percent_change(price, change)),
            day_high: data["h"].as_f64().unwrap_or(price),
            day_low: data["l"].as_f64().unwrap_or(price),
            // The free quote endpoint carries neither volume nor market cap.
            volume: rng.random_range(0..100_000_000),
            market_cap: price * rng.random_range(0.0..1e9),
            color_hint: info.color.clone(),
            synthetic: false,
        })
    }

    pub fn synthetic<R: Rng>(info: &StockInfo, rng: &mut R) -> Quote {
        let price = rng.random_range(50.0..550.0);
        let change = rng.random_range(-10.0..10.0);
        Quote {
            symbol: info.symbol.clone(),
            display_name: info.name.clone(),
            price,
            previous_close: price - change,
            change,
            change_percent: percent_change(price, change),
            day_high: price + rng.random_range(0.0..10.0),
            day_low: price - rng.random_range(0.0..10.0),
            volume: rng.random_range(0..100_000_000),
            market_cap: price * rng.random_range(0.0..1e9),
            color_hint: info.color.clone(),
            synthetic: true,
        }
    }
}

pub fn synthetic_roster(roster: &[StockInfo]) -> Vec<Quote> {
    let mut rng = rand::rng();
    roster.iter().map(|info| Quote::synthetic(info, &mut rng)).collect()
}

async fn fetch_one(api: &dyn StockApi, info: &StockInfo) -> Quote {
    match api.quote(&info.symbol).await {
        Ok(data) => {
            let mut rng = rand::rng();
            Quote::from_finnhub(info, &data, &mut rng).unwrap_or_else(|| {
                tracing::warn!(symbol = %info.symbol, "no usable price, using synthetic quote");
                Quote::synthetic(info, &mut rng)
            })
        }
        Err(e) => {
            tracing::warn!(symbol = %info.symbol, error = %e, "quote fetch failed, using synthetic quote");
            Quote::synthetic(info, &mut rand::rng())
        }
    }
}

/// Fetch the whole roster concurrently.
///
/// Each symbol falls back to synthetic data on its own. If the batch itself
/// breaks (a task dies), every symbol is replaced and the advisory is
/// returned. The result always has one quote per roster entry, in roster
/// order.
pub async fn refresh(api: Arc<dyn StockApi>, roster: Arc<[StockInfo]>) -> (Vec<Quote>, Option<String>) {
    let mut set = JoinSet::new();
    for (idx, info) in roster.iter().cloned().enumerate() {
        let api = api.clone();
        set.spawn(async move { (idx, fetch_one(api.as_ref(), &info).await) });
    }

    let mut slots: Vec<Option<Quote>> = vec![None; roster.len()];
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((idx, quote)) => slots[idx] = Some(quote),
            Err(e) => {
                tracing::error!(error = %e, "stock batch failed");
                set.abort_all();
                return (synthetic_roster(&roster), Some(ADVISORY.to_string()));
            }
        }
    }

    let mut rng = rand::rng();
    let quotes = slots
        .into_iter()
        .zip(roster.iter())
        .map(|(slot, info)| slot.unwrap_or_else(|| Quote::synthetic(info, &mut rng)))
        .collect();
    (quotes, None)
}

/// The roster twice back-to-back, for a seamless scrolling tape.
pub fn ticker_tape(quotes: &[Quote]) -> impl Iterator<Item = &Quote> {
    quotes.iter().chain(quotes.iter())
}

#[derive(Debug)]
pub struct StockView {
    pub quotes: Vec<Quote>,
    pub advisory: Option<String>,
    pub loading: bool,
    pub last_update: Option<DateTime<Local>>,
}

impl Default for StockView {
    fn default() -> Self {
        Self {
            quotes: Vec::new(),
            advisory: None,
            loading: true,
            last_update: None,
        }
    }
}
