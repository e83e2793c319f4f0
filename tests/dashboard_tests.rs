use async_trait::async_trait;
use findash::api::{CryptoApi, OfflineQuotes, Services, StockApi, WeatherApi};
use findash::app::{App, Page};
use findash::config::Config;
use findash::error::FetchError;
use serde_json::{json, Value};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::time::timeout;

struct Fake {
    weather_calls: AtomicUsize,
    fail_history: bool,
}

impl Fake {
    fn new(fail_history: bool) -> Arc<Self> {
        Arc::new(Fake {
            weather_calls: AtomicUsize::new(0),
            fail_history,
        })
    }
}

#[async_trait]
impl WeatherApi for Fake {
    async fn current(&self, city: &str) -> Result<Value, FetchError> {
        self.weather_calls.fetch_add(1, Ordering::SeqCst);
        match city {
            "Mumbai" => Ok(json!({
                "name": "Mumbai",
                "sys": { "country": "IN" },
                "main": { "temp": 29.5, "feels_like": 33.0, "humidity": 74, "pressure": 1009 },
                "weather": [{ "description": "mist" }],
                "wind": { "speed": 3.6 },
                "visibility": 2500,
                "clouds": { "all": 40 }
            })),
            _ => Err(FetchError::NotFound),
        }
    }
}

#[async_trait]
impl CryptoApi for Fake {
    async fn simple_price(&self, _ids: &[String], _vs: &str) -> Result<Value, FetchError> {
        Ok(json!({
            "bitcoin": { "usd": 64000.0, "usd_24h_change": 1.2, "usd_market_cap": 1.26e12, "usd_24h_vol": 2.8e10 },
            "ethereum": { "usd": 3100.0, "usd_24h_change": -0.4, "usd_market_cap": 3.7e11, "usd_24h_vol": 1.1e10 }
        }))
    }

    async fn market_chart(&self, _id: &str, _vs: &str, _days: u32) -> Result<Value, FetchError> {
        if self.fail_history {
            return Err(FetchError::Status(429));
        }
        Ok(json!({ "prices": [
            [1_710_504_000_000_i64, 64000.111],
            [1_710_590_400_000_i64, 64500.5],
            [1_710_676_800_000_i64, 63900.0]
        ]}))
    }
}

#[async_trait]
impl StockApi for Fake {
    async fn quote(&self, symbol: &str) -> Result<Value, FetchError> {
        match symbol {
            "AAPL" => Ok(json!({ "c": 189.9, "pc": 187.0, "d": 2.9, "dp": 1.55, "h": 190.4, "l": 186.8 })),
            "MSFT" => Ok(json!({ "c": 0, "pc": 0 })),
            _ => Err(FetchError::Status(502)),
        }
    }
}

fn app_with(fake: Arc<Fake>) -> App {
    let services = Services {
        weather: fake.clone(),
        crypto: fake.clone(),
        stock: fake,
    };
    App::new(&Config::default(), services)
}

async fn pump(app: &mut App) {
    assert!(timeout(Duration::from_secs(2), app.next_update()).await.expect("update timed out"));
}

#[tokio::test]
async fn weather_search_moves_from_snapshot_to_error() {
    let fake = Fake::new(false);
    let mut app = app_with(fake.clone());

    app.navigate_to(Page::Weather);
    assert!(app.weather.loading);
    pump(&mut app).await;

    let snap = app.weather.snapshot.as_ref().expect("Mumbai snapshot");
    assert_eq!(snap.location_name.as_deref(), Some("Mumbai"));
    assert_eq!(snap.visibility_km, Some(2.5));
    assert!(app.weather.error.is_none());

    assert!(app.search_weather("  Zzqqxx123 "));
    assert_eq!(app.weather.city, "Zzqqxx123");
    assert!(app.weather.loading);
    pump(&mut app).await;

    assert!(app.weather.snapshot.is_none());
    assert_eq!(app.weather.error.as_deref(), Some("City not found"));
    assert!(!app.weather.loading);
}

#[tokio::test]
async fn weather_blank_search_issues_no_request() {
    let fake = Fake::new(false);
    let mut app = app_with(fake.clone());

    app.navigate_to(Page::Weather);
    pump(&mut app).await;
    let calls = fake.weather_calls.load(Ordering::SeqCst);

    assert!(!app.search_weather(""));
    assert!(!app.search_weather(" \t "));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(fake.weather_calls.load(Ordering::SeqCst), calls);
}

#[tokio::test]
async fn crypto_cycle_fills_prices_and_chart() {
    let mut app = app_with(Fake::new(false));
    app.navigate_to(Page::Crypto);

    // prices, history, cycle done
    for _ in 0..3 {
        pump(&mut app).await;
    }

    let prices = app.crypto.prices.as_ref().expect("prices");
    assert_eq!(prices.len(), 2);
    assert_eq!(prices[1].symbol, "ETH");
    assert_eq!(app.crypto.history.len(), 3);
    assert_eq!(app.crypto.history[0].price, 64000.11);
    assert!(!app.crypto.loading);
    assert!(app.crypto.last_update.is_some());
}

#[tokio::test]
async fn crypto_history_failure_keeps_fresh_prices() {
    let mut app = app_with(Fake::new(true));
    app.navigate_to(Page::Crypto);

    // prices, cycle done
    for _ in 0..2 {
        pump(&mut app).await;
    }

    assert!(app.crypto.prices.is_some());
    assert!(app.crypto.history.is_empty());
    assert!(!app.crypto.loading);
    assert!(app.crypto.last_update.is_none());
}

#[tokio::test]
async fn stock_cycle_has_one_quote_per_symbol() {
    let mut app = app_with(Fake::new(false));
    app.navigate_to(Page::Stock);
    pump(&mut app).await;

    let roster: Vec<String> = app.roster().iter().map(|s| s.symbol.clone()).collect();
    let symbols: Vec<String> = app.stock.quotes.iter().map(|q| q.symbol.clone()).collect();
    assert_eq!(symbols, roster);
    assert!(app.stock.advisory.is_none());

    let aapl = &app.stock.quotes[0];
    assert!(!aapl.synthetic);
    assert_eq!(aapl.price, 189.9);
    assert!(app.stock.quotes[1..].iter().all(|q| q.synthetic));
}

#[tokio::test]
async fn demo_mode_roster_is_all_synthetic() {
    let services = Services {
        weather: Fake::new(false),
        crypto: Fake::new(false),
        stock: Arc::new(OfflineQuotes),
    };
    let mut app = App::new(&Config::default(), services);
    app.navigate_to(Page::Stock);
    pump(&mut app).await;

    assert_eq!(app.stock.quotes.len(), 12);
    for q in &app.stock.quotes {
        assert!(q.synthetic);
        assert!((q.change_percent * (q.price - q.change) - q.change * 100.0).abs() < 1e-6);
    }
}

#[tokio::test]
async fn leaving_a_page_discards_its_pending_results() {
    let mut app = app_with(Fake::new(false));
    app.navigate_to(Page::Stock);
    app.navigate_to(Page::Home);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!app.process_updates());
    assert!(app.stock.quotes.is_empty());
    assert!(app.stock.last_update.is_none());
}
