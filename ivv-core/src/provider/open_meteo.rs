use async_trait::async_trait;
use serde_json::Value;

use crate::{http::RetryingClient, model::WeatherSample};

use super::{SourceKind, WeatherSource};

/// Open-Meteo forecast API. No API key required.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    client: RetryingClient,
    url: String,
}

impl OpenMeteoProvider {
    pub fn new(client: RetryingClient, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoProvider {
    async fn current_weather(&self, lat: f64, lon: f64) -> Option<WeatherSample> {
        let params = [
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            ("current_weather", "true".to_string()),
            ("hourly", "precipitation_probability,temperature_2m".to_string()),
            ("forecast_days", "1".to_string()),
            ("timezone", "auto".to_string()),
        ];

        let body = self
            .client
            .get_json(SourceKind::Weather, &self.url, &params, &[])
            .await?;

        sample_from_response(body)
    }
}

/// Normalize a forecast response; `None` if it carries neither current nor hourly data.
///
/// Fields are read one by one, so a malformed field only makes that value unknown.
fn sample_from_response(body: Value) -> Option<WeatherSample> {
    let current = body.get("current_weather").filter(|v| v.is_object());
    let hourly = body.get("hourly").filter(|v| v.is_object());

    if current.is_none() && hourly.is_none() {
        return None;
    }

    let field = |name: &str| current.and_then(|c| c.get(name));

    Some(WeatherSample {
        temperature_c: field("temperature").and_then(Value::as_f64),
        wind_speed: field("windspeed").and_then(Value::as_f64),
        observed_at: field("time").and_then(Value::as_str).map(str::to_string),
        precipitation_pct: hourly
            .and_then(|h| h.get("precipitation_probability"))
            .and_then(max_probability),
    })
}

/// Worst case over the day. Nulls are gaps; any other non-numeric entry makes the
/// whole series unknown.
fn max_probability(series: &Value) -> Option<f64> {
    let Some(entries) = series.as_array() else {
        tracing::warn!(%series, "precipitation series is not an array");
        return None;
    };

    let mut max: Option<f64> = None;
    for entry in entries {
        if entry.is_null() {
            continue;
        }
        let Some(p) = entry.as_f64() else {
            tracing::warn!(%entry, "non-numeric precipitation probability");
            return None;
        };
        max = Some(max.map_or(p, |m| m.max(p)));
    }
    max
}
