use findash::config::Config;

#[test]
fn defaults_match_dashboard_cadence() {
    let config = Config::default();
    assert_eq!(config.weather.default_city, "Mumbai");
    assert_eq!(config.crypto.refresh_ms, 60_000);
    assert_eq!(config.stock.refresh_ms, 30_000);
    assert_eq!(config.crypto.chart_days, 7);
    assert_eq!(config.stock.roster.len(), 12);
    assert_eq!(config.crypto.chart_asset().map(|a| a.symbol.as_str()), Some("BTC"));
    assert!(config.validate().is_ok());
}

#[test]
fn parse_partial_toml_keeps_defaults() {
    let toml_str = r##"
[weather]
default_city = "Pune"

[stock]
refresh_ms = 15000

[[stock.roster]]
symbol = "AAPL"
name = "Apple Inc."
color = "#A2AAAD"

[[stock.roster]]
symbol = "IBM"
name = "IBM"

[logging]
level = "debug"
"##;
    let config = Config::from_toml_str(toml_str).unwrap();
    assert_eq!(config.weather.default_city, "Pune");
    assert_eq!(config.weather.units, "metric");
    assert_eq!(config.stock.refresh_ms, 15_000);
    assert_eq!(config.stock.roster.len(), 2);
    assert_eq!(config.stock.roster[1].symbol, "IBM");
    assert!(config.stock.roster[1].color.is_empty());
    assert_eq!(config.crypto.refresh_ms, 60_000);
    assert_eq!(config.logging.level, "debug");
    assert!(config.validate().is_ok());
}

#[test]
fn empty_toml_is_all_defaults() {
    let config = Config::from_toml_str("").unwrap();
    assert_eq!(config.stock.roster.len(), 12);
    assert!(!config.demo);
}

#[test]
fn rejects_bad_values() {
    let zero_period = Config::from_toml_str("[crypto]\nrefresh_ms = 0\n").unwrap();
    assert!(zero_period.validate().is_err());

    let empty_roster = Config::from_toml_str("[stock]\nroster = []\n").unwrap();
    assert!(empty_roster.validate().is_err());

    let unknown_chart = Config::from_toml_str("[crypto]\nchart_coin = \"dogecoin\"\n").unwrap();
    let err = unknown_chart.validate().unwrap_err();
    assert!(err.to_string().contains("dogecoin"));

    assert!(Config::from_toml_str("[stock]\nrefresh_ms = \"soon\"\n").is_err());
}
