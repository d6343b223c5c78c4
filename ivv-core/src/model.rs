use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::score::{IvvLabel, ScoreResult};

/// A city tracked by the pipeline, as listed in the `[[cities]]` roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityTarget {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// IANA timezone identifier, e.g. "Europe/London".
    pub timezone: String,
    /// ISO-4217 currency code, e.g. "GBP".
    pub currency: String,
}

/// Normalized weather for one city in one run. `None` means unknown, not zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub temperature_c: Option<f64>,
    pub wind_speed: Option<f64>,
    pub observed_at: Option<String>,
    /// Highest hourly precipitation probability (0-100) for the current day.
    pub precipitation_pct: Option<f64>,
}

/// Exchange rate of a currency against the reference currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrencySample {
    pub rate: Option<f64>,
    /// Percent change of `rate` against the previous calendar day.
    pub variation_pct: Option<f64>,
}

impl CurrencySample {
    /// The reference currency against itself.
    pub const REFERENCE: Self = Self {
        rate: Some(1.0),
        variation_pct: Some(0.0),
    };

    pub const UNKNOWN: Self = Self {
        rate: None,
        variation_pct: None,
    };
}

/// One persisted record: a city joined with everything fetched and derived for it
/// during a single run.
///
/// The serde names are the column names of the cumulative table, so field order
/// here is the column order on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp_utc: DateTime<Utc>,
    #[serde(rename = "ciudad")]
    pub city: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(rename = "hora_local")]
    pub local_time: Option<String>,
    #[serde(rename = "temperatura_c")]
    pub temperature_c: Option<f64>,
    #[serde(rename = "viento")]
    pub wind_speed: Option<f64>,
    #[serde(rename = "prob_lluvia_pct")]
    pub precipitation_pct: Option<f64>,
    #[serde(rename = "moneda")]
    pub currency: String,
    #[serde(rename = "tasa_cambio_usd")]
    pub exchange_rate: Option<f64>,
    #[serde(rename = "variacion_divisa_pct")]
    pub variation_pct: Option<f64>,
    pub ivv_score: f64,
    #[serde(rename = "ivv_color")]
    pub ivv_label: IvvLabel,
}

impl Observation {
    /// Column names of the cumulative table, in order.
    pub const COLUMNS: [&'static str; 13] = [
        "timestamp_utc",
        "ciudad",
        "lat",
        "lon",
        "hora_local",
        "temperatura_c",
        "viento",
        "prob_lluvia_pct",
        "moneda",
        "tasa_cambio_usd",
        "variacion_divisa_pct",
        "ivv_score",
        "ivv_color",
    ];

    pub fn new(
        run_at: DateTime<Utc>,
        city: &CityTarget,
        weather: &WeatherSample,
        currency: CurrencySample,
        local_time: Option<String>,
        score: ScoreResult,
    ) -> Self {
        Self {
            timestamp_utc: run_at,
            city: city.name.clone(),
            lat: city.lat,
            lon: city.lon,
            local_time,
            temperature_c: weather.temperature_c,
            wind_speed: weather.wind_speed,
            precipitation_pct: weather.precipitation_pct,
            currency: city.currency.clone(),
            exchange_rate: currency.rate,
            variation_pct: currency.variation_pct,
            ivv_score: score.score,
            ivv_label: score.label,
        }
    }
}

/// Everything one pipeline run produced, in roster order.
#[derive(Debug, Clone)]
pub struct RunBatch {
    pub started_at: DateTime<Utc>,
    pub observations: Vec<Observation>,
}

impl RunBatch {
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }
}
