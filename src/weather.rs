use crate::api::WeatherApi;
use crate::app::Update;
use crate::poller::Reporter;
use serde_json::Value;
use std::sync::Arc;

/// Current conditions for one queried location.
///
/// Every field is optional: whatever the provider leaves out renders as a
/// placeholder instead of failing the whole view.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeatherSnapshot {
    pub location_name: Option<String>,
    pub country_code: Option<String>,
    pub temperature_c: Option<f64>,
    pub feels_like_c: Option<f64>,
    pub condition: Option<String>,
    pub humidity_pct: Option<f64>,
    pub wind_speed: Option<f64>,
    pub pressure_hpa: Option<f64>,
    pub visibility_km: Option<f64>,
    pub cloud_pct: Option<f64>,
}

impl WeatherSnapshot {
    pub fn from_json(data: &Value) -> Self {
        let main = &data["main"];
        Self {
            location_name: data["name"].as_str().map(str::to_string),
            country_code: data["sys"]["country"].as_str().map(str::to_string),
            temperature_c: main["temp"].as_f64(),
            feels_like_c: main["feels_like"].as_f64(),
            condition: data["weather"][0]["description"].as_str().map(str::to_string),
            humidity_pct: main["humidity"].as_f64(),
            wind_speed: data["wind"]["speed"].as_f64(),
            pressure_hpa: main["pressure"].as_f64(),
            visibility_km: data["visibility"].as_f64().map(|m| m / 1000.0),
            cloud_pct: data["clouds"]["all"].as_f64(),
        }
    }
}

/// State of the weather page for the current visit.
#[derive(Debug, Default)]
pub struct WeatherView {
    /// City of the most recent lookup.
    pub city: String,
    /// Search box contents.
    pub input: String,
    pub snapshot: Option<WeatherSnapshot>,
    pub loading: bool,
    pub error: Option<String>,
    /// Id of the lookup whose result the view is waiting for.
    pub lookup: u64,
}

impl WeatherView {
    pub fn new(city: &str) -> Self {
        Self {
            city: city.to_string(),
            loading: true,
            ..Default::default()
        }
    }

    /// Start a new lookup, superseding any still in flight. Returns its id.
    pub fn begin_lookup(&mut self, city: &str) -> u64 {
        self.lookup += 1;
        self.city = city.to_string();
        self.loading = true;
        self.error = None;
        self.lookup
    }
}

/// Look up `city` and report the outcome tagged with `lookup`.
pub async fn refresh(api: Arc<dyn WeatherApi>, city: String, lookup: u64, reporter: Reporter) {
    let result = api
        .current(&city)
        .await
        .map(|data| WeatherSnapshot::from_json(&data));

    match &result {
        Ok(_) => tracing::info!(city = %city, "weather updated"),
        Err(e) => tracing::warn!(city = %city, error = %e, "weather lookup failed"),
    }

    reporter.send(Update::Weather { lookup, result });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_maps_full_response() {
        let data = json!({
            "name": "Mumbai",
            "sys": { "country": "IN" },
            "main": { "temp": 31.4, "feels_like": 36.2, "humidity": 70, "pressure": 1008 },
            "weather": [{ "description": "haze" }],
            "wind": { "speed": 4.1 },
            "visibility": 3500,
            "clouds": { "all": 20 }
        });

        let snap = WeatherSnapshot::from_json(&data);
        assert_eq!(snap.location_name.as_deref(), Some("Mumbai"));
        assert_eq!(snap.country_code.as_deref(), Some("IN"));
        assert_eq!(snap.temperature_c, Some(31.4));
        assert_eq!(snap.feels_like_c, Some(36.2));
        assert_eq!(snap.condition.as_deref(), Some("haze"));
        assert_eq!(snap.humidity_pct, Some(70.0));
        assert_eq!(snap.pressure_hpa, Some(1008.0));
        assert_eq!(snap.wind_speed, Some(4.1));
        assert_eq!(snap.visibility_km, Some(3.5));
        assert_eq!(snap.cloud_pct, Some(20.0));
    }

    #[test]
    fn test_partial_response_yields_placeholders() {
        let data = json!({ "name": "Nowhere", "main": {}, "weather": [] });
        let snap = WeatherSnapshot::from_json(&data);
        assert_eq!(snap.location_name.as_deref(), Some("Nowhere"));
        assert!(snap.temperature_c.is_none());
        assert!(snap.condition.is_none());
        assert!(snap.country_code.is_none());
        assert!(snap.visibility_km.is_none());
    }

    #[test]
    fn test_begin_lookup_supersedes_previous() {
        let mut view = WeatherView::new("Mumbai");
        assert_eq!(view.lookup, 0);
        assert_eq!(view.begin_lookup("Pune"), 1);
        assert_eq!(view.begin_lookup("Delhi"), 2);
        assert_eq!(view.city, "Delhi");
        assert!(view.loading);
    }

    #[test]
    fn test_non_object_body_does_not_panic() {
        for data in [Value::Null, json!([1, 2, 3]), json!("oops"), json!({ "main": 5 })] {
            assert_eq!(WeatherSnapshot::from_json(&data), WeatherSnapshot::default());
        }
    }
}
