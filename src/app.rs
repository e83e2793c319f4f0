use crate::api::Services;
use crate::config::{Config, CryptoConfig, StockInfo};
use crate::crypto::{self, CryptoPrices, CryptoView, PricePoint};
use crate::error::FetchError;
use crate::poller::{CancelToken, Poller};
use crate::stock::{self, Quote, StockView};
use crate::weather::{self, WeatherSnapshot, WeatherView};
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Weather,
    Crypto,
    Stock,
}

/// Cards on the home page, in display order.
pub const HOME_CARDS: [(Page, &str, &str); 3] = [
    (Page::Weather, "Weather", "Check live weather conditions"),
    (Page::Crypto, "Cryptocurrency", "Check live crypto"),
    (Page::Stock, "Stock Market", "Monitor stock prices & trends"),
];

/// Result of a background fetch, applied on the UI task.
#[derive(Debug)]
pub enum Update {
    /// Outcome of weather lookup number `lookup`.
    Weather {
        lookup: u64,
        result: Result<WeatherSnapshot, FetchError>,
    },
    CryptoPrices(CryptoPrices),
    CryptoHistory(Vec<PricePoint>),
    CryptoCycleDone { completed: bool },
    Stocks { quotes: Vec<Quote>, advisory: Option<String> },
}

/// An update tagged with the session that produced it.
#[derive(Debug)]
pub struct Envelope {
    pub(crate) token: CancelToken,
    pub(crate) update: Update,
}

pub struct App {
    pub page: Page,
    pub home_selected: usize,
    pub weather: WeatherView,
    pub crypto: CryptoView,
    pub stock: StockView,
    /// Frame counter driving the ticker tape.
    pub tape_offset: usize,
    pub should_quit: bool,
    default_city: String,
    crypto_settings: Arc<CryptoConfig>,
    crypto_period: Duration,
    roster: Arc<[StockInfo]>,
    stock_period: Duration,
    services: Services,
    session: Option<Poller>,
    tx: UnboundedSender<Envelope>,
    rx: UnboundedReceiver<Envelope>,
}

impl App {
    pub fn new(config: &Config, services: Services) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        App {
            page: Page::Home,
            home_selected: 0,
            weather: WeatherView::default(),
            crypto: CryptoView::default(),
            stock: StockView::default(),
            tape_offset: 0,
            should_quit: false,
            default_city: config.weather.default_city.clone(),
            crypto_settings: Arc::new(config.crypto.clone()),
            crypto_period: config.crypto.refresh_period(),
            roster: config.stock.roster.clone().into(),
            stock_period: config.stock.refresh_period(),
            services,
            session: None,
            tx,
            rx,
        }
    }

    pub fn roster(&self) -> &[StockInfo] {
        &self.roster
    }

    pub fn chart_coin_name(&self) -> &str {
        self.crypto_settings
            .chart_asset()
            .map(|a| a.name.as_str())
            .unwrap_or(self.crypto_settings.chart_coin.as_str())
    }

    pub fn chart_days(&self) -> u32 {
        self.crypto_settings.chart_days
    }

    /// Switch pages. Leaving a page ends its session; entering one starts a
    /// fresh session with fresh state.
    pub fn navigate_to(&mut self, page: Page) {
        if self.page == page {
            return;
        }
        if let Some(mut session) = self.session.take() {
            session.stop();
        }
        tracing::info!(from = ?self.page, to = ?page, "navigate");
        self.page = page;
        self.activate();
    }

    fn activate(&mut self) {
        let tx = self.tx.clone();
        self.session = match self.page {
            Page::Home => None,
            Page::Weather => {
                self.weather = WeatherView::new(&self.default_city);
                let api = self.services.weather.clone();
                let city = self.default_city.clone();
                let lookup = self.weather.lookup;
                Some(Poller::start(None, tx, move |reporter| {
                    weather::refresh(api.clone(), city.clone(), lookup, reporter)
                }))
            }
            Page::Crypto => {
                self.crypto = CryptoView::default();
                let api = self.services.crypto.clone();
                let settings = self.crypto_settings.clone();
                Some(Poller::start(Some(self.crypto_period), tx, move |reporter| {
                    crypto::refresh(api.clone(), settings.clone(), reporter)
                }))
            }
            Page::Stock => {
                self.stock = StockView::default();
                let api = self.services.stock.clone();
                let roster = self.roster.clone();
                Some(Poller::start(Some(self.stock_period), tx, move |reporter| {
                    let api = api.clone();
                    let roster = roster.clone();
                    async move {
                        let (quotes, advisory) = stock::refresh(api, roster).await;
                        tracing::info!(count = quotes.len(), fallback = advisory.is_some(), "stock cycle finished");
                        reporter.send(Update::Stocks { quotes, advisory });
                    }
                }))
            }
        };
    }

    /// Look up the city typed by the user. Returns false when nothing was
    /// issued (blank input or not on the weather page).
    pub fn search_weather(&mut self, input: &str) -> bool {
        let city = input.trim();
        if city.is_empty() || self.page != Page::Weather {
            return false;
        }
        let Some(session) = &self.session else {
            return false;
        };
        let reporter = session.reporter();
        let lookup = self.weather.begin_lookup(city);
        self.weather.input.clear();
        tokio::spawn(weather::refresh(
            self.services.weather.clone(),
            city.to_string(),
            lookup,
            reporter,
        ));
        true
    }

    /// Apply one update unless its session has ended.
    pub(crate) fn apply(&mut self, envelope: Envelope) {
        if envelope.token.is_cancelled() {
            tracing::debug!("dropping update from a closed session");
            return;
        }
        match envelope.update {
            Update::Weather { lookup, .. } if lookup != self.weather.lookup => {
                tracing::debug!(lookup, current = self.weather.lookup, "dropping superseded weather result");
            }
            Update::Weather { result: Ok(snapshot), .. } => {
                self.weather.snapshot = Some(snapshot);
                self.weather.error = None;
                self.weather.loading = false;
            }
            Update::Weather { result: Err(e), .. } => {
                self.weather.snapshot = None;
                self.weather.error = Some(e.to_string());
                self.weather.loading = false;
            }
            Update::CryptoPrices(prices) => self.crypto.prices = Some(prices),
            Update::CryptoHistory(history) => self.crypto.history = history,
            Update::CryptoCycleDone { completed } => {
                self.crypto.loading = false;
                if completed {
                    self.crypto.last_update = Some(Local::now());
                }
            }
            Update::Stocks { quotes, advisory } => {
                self.stock.quotes = quotes;
                self.stock.advisory = advisory;
                self.stock.loading = false;
                self.stock.last_update = Some(Local::now());
            }
        }
    }

    /// Drain pending updates without blocking. Returns true if any arrived.
    pub fn process_updates(&mut self) -> bool {
        let mut updated = false;
        while let Ok(envelope) = self.rx.try_recv() {
            self.apply(envelope);
            updated = true;
        }
        updated
    }

    /// Wait for the next update and apply it.
    pub async fn next_update(&mut self) -> bool {
        match self.rx.recv().await {
            Some(envelope) => {
                self.apply(envelope);
                true
            }
            None => false,
        }
    }

    pub fn tick(&mut self) {
        self.tape_offset = self.tape_offset.wrapping_add(1);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.page {
            Page::Home => match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('1') | KeyCode::Char('w') => self.navigate_to(Page::Weather),
                KeyCode::Char('2') | KeyCode::Char('c') => self.navigate_to(Page::Crypto),
                KeyCode::Char('3') | KeyCode::Char('s') => self.navigate_to(Page::Stock),
                KeyCode::Down | KeyCode::Char('j') => {
                    self.home_selected = (self.home_selected + 1).min(HOME_CARDS.len() - 1);
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.home_selected = self.home_selected.saturating_sub(1);
                }
                KeyCode::Enter => {
                    let (page, _, _) = HOME_CARDS[self.home_selected];
                    self.navigate_to(page);
                }
                _ => {}
            },
            Page::Weather => match key.code {
                KeyCode::Esc => self.navigate_to(Page::Home),
                KeyCode::Enter => {
                    let input = self.weather.input.clone();
                    self.search_weather(&input);
                }
                KeyCode::Backspace => {
                    self.weather.input.pop();
                }
                KeyCode::Char(c) => self.weather.input.push(c),
                _ => {}
            },
            Page::Crypto | Page::Stock => match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Esc | KeyCode::Left | KeyCode::Char('b') | KeyCode::Char('h') => {
                    self.navigate_to(Page::Home)
                }
                _ => {}
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CryptoApi, StockApi, WeatherApi};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::sync::Notify;

    /// Weather knows Mumbai only; crypto blocks until released.
    struct Fake {
        gate: Notify,
    }

    #[async_trait]
    impl WeatherApi for Fake {
        async fn current(&self, city: &str) -> Result<Value, FetchError> {
            if city == "Mumbai" {
                Ok(json!({ "name": "Mumbai", "main": { "temp": 30.0 } }))
            } else {
                Err(FetchError::NotFound)
            }
        }
    }

    #[async_trait]
    impl CryptoApi for Fake {
        async fn simple_price(&self, _ids: &[String], _vs: &str) -> Result<Value, FetchError> {
            self.gate.notified().await;
            Ok(json!({ "bitcoin": { "usd": 1.0 } }))
        }

        async fn market_chart(&self, _id: &str, _vs: &str, _days: u32) -> Result<Value, FetchError> {
            Ok(json!({ "prices": [[0, 1.0]] }))
        }
    }

    #[async_trait]
    impl StockApi for Fake {
        async fn quote(&self, _symbol: &str) -> Result<Value, FetchError> {
            Err(FetchError::Status(500))
        }
    }

    fn app() -> (App, Arc<Fake>) {
        let fake = Arc::new(Fake { gate: Notify::new() });
        let services = Services {
            weather: fake.clone(),
            crypto: fake.clone(),
            stock: fake.clone(),
        };
        (App::new(&Config::default(), services), fake)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn test_navigation_is_a_single_variable() {
        let (mut app, _fake) = app();
        assert_eq!(app.page, Page::Home);

        app.handle_key(key(KeyCode::Char('3')));
        assert_eq!(app.page, Page::Stock);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.page, Page::Home);
        assert!(app.session.is_none());

        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.page, Page::Crypto);
    }

    #[tokio::test]
    async fn test_dropped_after_deactivation() {
        let (mut app, _fake) = app();
        app.navigate_to(Page::Weather);
        let token = app.session.as_ref().unwrap().token().clone();
        app.navigate_to(Page::Home);

        app.weather.loading = true;
        app.apply(Envelope {
            token,
            update: Update::Weather {
                lookup: 0,
                result: Ok(WeatherSnapshot::default()),
            },
        });
        assert!(app.weather.snapshot.is_none());
        assert!(app.weather.loading);
    }

    #[tokio::test]
    async fn test_late_crypto_response_changes_nothing() {
        let (mut app, fake) = app();
        app.navigate_to(Page::Crypto);
        tokio::task::yield_now().await;
        app.navigate_to(Page::Home);

        fake.gate.notify_one();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!app.process_updates());
        assert!(app.crypto.prices.is_none());
        assert!(app.crypto.history.is_empty());
        assert!(app.crypto.last_update.is_none());
    }

    #[tokio::test]
    async fn test_blank_search_is_ignored() {
        let (mut app, _fake) = app();
        assert!(!app.search_weather("Mumbai"));

        app.navigate_to(Page::Weather);
        assert!(!app.search_weather("   "));
        assert_eq!(app.weather.city, "Mumbai");
    }

    #[tokio::test]
    async fn test_stale_default_lookup_does_not_overwrite_search() {
        let (mut app, _fake) = app();
        app.navigate_to(Page::Weather);
        let token = app.session.as_ref().unwrap().token().clone();

        assert!(app.search_weather("Zzqqxx123"));
        while app.weather.loading {
            assert!(app.next_update().await);
        }
        assert_eq!(app.weather.city, "Zzqqxx123");
        assert_eq!(app.weather.error.as_deref(), Some("City not found"));

        // The mount-time lookup resolving after the search
        app.apply(Envelope {
            token,
            update: Update::Weather {
                lookup: 0,
                result: Ok(WeatherSnapshot::from_json(&json!({ "name": "Mumbai" }))),
            },
        });
        assert_eq!(app.weather.city, "Zzqqxx123");
        assert!(app.weather.snapshot.is_none());
        assert_eq!(app.weather.error.as_deref(), Some("City not found"));
    }

    #[tokio::test]
    async fn test_renavigating_same_page_keeps_session() {
        let (mut app, _fake) = app();
        app.navigate_to(Page::Stock);
        let token = app.session.as_ref().unwrap().token().clone();
        app.navigate_to(Page::Stock);
        assert!(!token.is_cancelled());
    }
}
