use crate::app::{App, Page, HOME_CARDS};
use crate::crypto::{self, CoinSnapshot};
use crate::stock::{self, Quote};
use crate::weather::WeatherSnapshot;
use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table},
    Frame,
};

const PLACEHOLDER: &str = "--";

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Page content
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    match app.page {
        Page::Home => render_home(f, app, chunks[1]),
        Page::Weather => render_weather(f, app, chunks[1]),
        Page::Crypto => render_crypto(f, app, chunks[1]),
        Page::Stock => render_stock(f, app, chunks[1]),
    }
    render_footer(f, app, chunks[2]);
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let (title, subtitle) = match app.page {
        Page::Home => ("Financial Dashboard", "Real-time data at your fingertips"),
        Page::Weather => ("Weather Dashboard", "Live weather conditions worldwide"),
        Page::Crypto => ("Cryptocurrency Dashboard", "Real-time crypto prices and market trends"),
        Page::Stock => ("Live Stock Market", "Real-time market data & insights"),
    };

    let line = Line::from(vec![
        Span::styled(format!(" {} ", title), Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!(" {}", subtitle), Style::default().fg(Color::DarkGray)),
    ]);
    let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, area);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let keys = match app.page {
        Page::Home => " 1-3/wcs=Open | ↑↓jk=Select | Enter=Open | q=Quit ",
        Page::Weather => " Type a city + Enter=Search | Backspace=Delete | Esc=Home | Ctrl-C=Quit ",
        Page::Crypto | Page::Stock => " Esc/b=Home | q=Quit ",
    };
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(keys, Style::default().fg(Color::Yellow)))),
        area,
    );
}

fn render_home(f: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(5); HOME_CARDS.len()])
        .margin(1)
        .split(area);

    for (i, (_, title, description)) in HOME_CARDS.iter().enumerate() {
        let selected = i == app.home_selected;
        let border = if selected {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let lines = vec![
            Line::from(Span::styled(format!(" {}", description), Style::default().fg(Color::Gray))),
            Line::from(Span::styled(" View Dashboard ⏵", Style::default().fg(if selected { Color::Cyan } else { Color::DarkGray }))),
        ];
        let card = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {}: {} ", i + 1, title))
                .title_style(if selected { Style::default().bold() } else { Style::default() })
                .border_style(border),
        );
        f.render_widget(card, rows[i]);
    }
}

fn render_weather(f: &mut Frame, app: &App, area: Rect) {
    let view = &app.weather;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Search box
            Constraint::Min(6),    // Result
        ])
        .split(area);

    let search = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(format!("{}█", view.input), Style::default().fg(Color::Yellow)),
    ]))
    .block(Block::default().borders(Borders::ALL).title(" Enter city name... "));
    f.render_widget(search, chunks[0]);

    if view.loading {
        let loading = Paragraph::new("  Loading weather data...")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(format!(" {} ", view.city)));
        f.render_widget(loading, chunks[1]);
        return;
    }

    if let Some(err) = &view.error {
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(format!("  Error: {}", err), Style::default().fg(Color::Red).bold())),
            Line::from(Span::styled("  Please check the city name and try again.", Style::default().fg(Color::DarkGray))),
        ];
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Red)));
        f.render_widget(paragraph, chunks[1]);
        return;
    }

    if let Some(snapshot) = &view.snapshot {
        render_weather_snapshot(f, snapshot, chunks[1]);
    }
}

fn render_weather_snapshot(f: &mut Frame, snap: &WeatherSnapshot, area: Rect) {
    let text = |v: &Option<String>| v.clone().unwrap_or_else(|| PLACEHOLDER.to_string());
    let label = Style::default().fg(Color::DarkGray);

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Location     ", label),
            Span::styled(text(&snap.location_name), Style::default().bold()),
            Span::raw(format!("  {}", text(&snap.country_code))),
        ]),
        Line::from(vec![
            Span::styled("  Temperature  ", label),
            Span::styled(format!("{}°C", fmt_opt(snap.temperature_c, 1)), Style::default().fg(Color::Yellow).bold()),
            Span::raw(format!("  Feels like {}°C", fmt_opt(snap.feels_like_c, 1))),
        ]),
        Line::from(vec![
            Span::styled("  Conditions   ", label),
            Span::raw(text(&snap.condition)),
            Span::raw(format!("  Humidity: {}%", fmt_opt(snap.humidity_pct, 0))),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Wind Speed ", label),
            Span::raw(format!("{} m/s", fmt_opt(snap.wind_speed, 1))),
            Span::styled("  |  Pressure ", label),
            Span::raw(format!("{} hPa", fmt_opt(snap.pressure_hpa, 0))),
            Span::styled("  |  Visibility ", label),
            Span::raw(format!("{} km", fmt_opt(snap.visibility_km, 1))),
            Span::styled("  |  Clouds ", label),
            Span::raw(format!("{}%", fmt_opt(snap.cloud_pct, 0))),
        ]),
    ];

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Current Conditions ")
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(paragraph, area);
}

fn render_crypto(f: &mut Frame, app: &App, area: Rect) {
    let view = &app.crypto;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Live indicator
            Constraint::Length(6), // Coin cards
            Constraint::Min(8),    // Chart
        ])
        .split(area);

    let updated = view
        .last_update
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(" ● ", Style::default().fg(Color::Green)),
            Span::styled(format!("Live Data • Updated {}", updated), Style::default().fg(Color::DarkGray)),
        ])),
        chunks[0],
    );

    if view.loading {
        let loading = Paragraph::new("  Loading live crypto data...")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(loading, chunks[1].union(chunks[2]));
        return;
    }

    let coins = view.prices.as_deref().unwrap_or(&[]);
    if !coins.is_empty() {
        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, coins.len() as u32); coins.len()])
            .split(chunks[1]);
        for (coin, rect) in coins.iter().zip(cards.iter()) {
            render_coin_card(f, coin, *rect);
        }
    }

    render_price_chart(f, app, chunks[2]);
}

fn render_coin_card(f: &mut Frame, coin: &CoinSnapshot, area: Rect) {
    let change = coin.change_24h_pct.unwrap_or(0.0);
    let color = if change >= 0.0 { Color::Green } else { Color::Red };
    let arrow = if change >= 0.0 { "▲" } else { "▼" };

    let lines = vec![
        Line::from(vec![
            Span::styled(
                coin.price.map(|p| format!("${:.2}", p)).unwrap_or_else(|| PLACEHOLDER.to_string()),
                Style::default().bold(),
            ),
            Span::raw("  "),
            Span::styled(
                coin.change_24h_pct
                    .map(|c| format!("{}{:.2}%", arrow, c.abs()))
                    .unwrap_or_else(|| PLACEHOLDER.to_string()),
                Style::default().fg(color),
            ),
        ]),
        Line::from(""),
        Line::from(format!("Market Cap  {}", coin.market_cap.map(format_money).unwrap_or_else(|| PLACEHOLDER.to_string()))),
        Line::from(format!("24h Volume  {}", coin.volume_24h.map(format_money).unwrap_or_else(|| PLACEHOLDER.to_string()))),
    ];

    let card = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} {} ", coin.name, coin.symbol))
            .border_style(Style::default().fg(color)),
    );
    f.render_widget(card, area);
}

fn render_price_chart(f: &mut Frame, app: &App, area: Rect) {
    let history = &app.crypto.history;
    let title = format!(" {} - {} Day Price Chart ", app.chart_coin_name(), app.chart_days());

    // Min and max are recomputed every frame from the current series.
    let Some((low, high)) = crypto::price_range(history) else {
        let empty = Paragraph::new("  No price history yet")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(empty, area);
        return;
    };

    let data = crypto::chart_points(history);
    let pad = ((high - low) * 0.05).max(0.01);
    let first = history.first().map(|p| p.label.clone()).unwrap_or_default();
    let last = history.last().map(|p| p.label.clone()).unwrap_or_default();

    let datasets = vec![Dataset::default()
        .name(app.chart_coin_name().to_string())
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Rgb(0xff, 0xa5, 0x00)))
        .data(&data)];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Line::from(vec![
                    Span::raw(title),
                    Span::styled(format!(" High ${:.2} ", high), Style::default().fg(Color::Green)),
                    Span::styled(format!(" Low ${:.2} ", low), Style::default().fg(Color::Red)),
                ])),
        )
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, crypto::CHART_WIDTH])
                .labels(vec![Span::raw(first), Span::raw(last)]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([low - pad, high + pad])
                .labels(vec![
                    Span::raw(format!("{:.0}", low)),
                    Span::raw(format!("{:.0}", high)),
                ]),
        );

    f.render_widget(chart, area);
}

fn render_stock(f: &mut Frame, app: &App, area: Rect) {
    let view = &app.stock;
    let banner_height = if view.advisory.is_some() { 1 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),             // Status
            Constraint::Length(banner_height), // Advisory
            Constraint::Length(3),             // Ticker tape
            Constraint::Min(5),                // Table
        ])
        .split(area);

    let updated = view
        .last_update
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| Local::now().format("%H:%M:%S").to_string());
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(" ● LIVE ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::styled(format!(" Updated: {}", updated), Style::default().fg(Color::DarkGray)),
        ])),
        chunks[0],
    );

    if let Some(advisory) = &view.advisory {
        f.render_widget(
            Paragraph::new(format!(" {}", advisory)).style(Style::default().fg(Color::Black).bg(Color::Yellow)),
            chunks[1],
        );
    }

    if view.loading {
        let loading = Paragraph::new("  Loading real-time market data...")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(loading, chunks[2].union(chunks[3]));
        return;
    }

    render_ticker_tape(f, &view.quotes, app.tape_offset, chunks[2]);
    render_quote_table(f, &view.quotes, chunks[3]);
}

fn render_ticker_tape(f: &mut Frame, quotes: &[Quote], offset: usize, area: Rect) {
    let items: Vec<(String, Color)> = stock::ticker_tape(quotes)
        .map(|q| {
            let arrow = if q.change >= 0.0 { "▲" } else { "▼" };
            let color = if q.change >= 0.0 { Color::Green } else { Color::Red };
            (format!(" {} ${:.2} {}{:.2}%  ", q.symbol, q.price, arrow, q.change_percent.abs()), color)
        })
        .collect();

    // One pass of the roster; scrolling wraps after it so the loop is seamless.
    let cycle: usize = items.iter().take(quotes.len()).map(|(s, _)| s.chars().count()).sum();
    let scroll = if cycle == 0 { 0 } else { (offset % cycle) as u16 };

    let spans: Vec<Span> = items
        .into_iter()
        .map(|(s, color)| Span::styled(s, Style::default().fg(color)))
        .collect();
    let tape = Paragraph::new(Line::from(spans))
        .scroll((0, scroll))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(tape, area);
}

fn render_quote_table(f: &mut Frame, quotes: &[Quote], area: Rect) {
    let header = Row::new(vec!["Symbol", "Name", "Price", "Change", "Change%", "High", "Low", "Volume", "Mkt Cap"])
        .style(Style::default().fg(Color::Yellow).bold());

    let rows: Vec<Row> = quotes.iter().map(quote_to_row).collect();
    let widths = [
        Constraint::Length(7),
        Constraint::Min(14),
        Constraint::Length(10),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(9),
        Constraint::Length(10),
    ];

    let synthetic = quotes.iter().filter(|q| q.synthetic).count();
    let title = if synthetic > 0 {
        format!(" Quotes ({} demo) ", synthetic)
    } else {
        " Quotes ".to_string()
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(table, area);
}

fn quote_to_row(q: &Quote) -> Row<'static> {
    let color = if q.change >= 0.0 { Color::Green } else { Color::Red };
    let sign = if q.change >= 0.0 { "+" } else { "" };
    let brand = parse_hex_color(&q.color_hint).unwrap_or(Color::White);

    let right = |s: String| Cell::from(Line::from(s).alignment(Alignment::Right));
    Row::new(vec![
        Cell::from(q.symbol.clone()).style(Style::default().fg(brand).bold()),
        Cell::from(q.display_name.clone()),
        right(format!("${:.2}", q.price)),
        right(format!("{}{:.2}", sign, q.change)).style(Style::default().fg(color)),
        right(format!("{}{:.2}%", sign, q.change_percent)).style(Style::default().fg(color)),
        right(format!("{:.2}", q.day_high)),
        right(format!("{:.2}", q.day_low)),
        right(format_volume(q.volume as f64)),
        right(format_money(q.market_cap)),
    ])
}

/// Dollar amount with B/M/K suffixes.
pub fn format_money(v: f64) -> String {
    if v >= 1e9 {
        format!("${:.2}B", v / 1e9)
    } else if v >= 1e6 {
        format!("${:.2}M", v / 1e6)
    } else if v >= 1e3 {
        format!("${:.2}K", v / 1e3)
    } else {
        format!("${:.2}", v)
    }
}

pub fn format_volume(v: f64) -> String {
    if v >= 1e9 {
        format!("{:.2}B", v / 1e9)
    } else if v >= 1e6 {
        format!("{:.2}M", v / 1e6)
    } else {
        format!("{:.0}", v)
    }
}

fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    v.map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Parse `#RRGGBB` or `#RRGGBBAA` (alpha ignored).
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 && hex.len() != 8 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}
