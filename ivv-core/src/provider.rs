use crate::{
    Config,
    http::{RetryPolicy, RetryingClient},
    model::{CurrencySample, WeatherSample},
    provider::{
        exchange_rate::ExchangeRateProvider, open_meteo::OpenMeteoProvider,
        world_time::WorldTimeProvider,
    },
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod exchange_rate;
pub mod open_meteo;
pub mod world_time;

/// The three upstream categories the pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Weather,
    Currency,
    LocalTime,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Weather => "weather",
            SourceKind::Currency => "currency",
            SourceKind::LocalTime => "local_time",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current conditions plus today's worst-case rain probability at a coordinate.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    /// `None` when the source has nothing usable for this run.
    async fn current_weather(&self, lat: f64, lon: f64) -> Option<WeatherSample>;
}

/// Exchange rate and day-over-day variation against the reference currency.
#[async_trait]
pub trait CurrencySource: Send + Sync + Debug {
    /// Never fails; unknown values are `None` inside the sample.
    async fn exchange_rate(&self, currency: &str) -> CurrencySample;
}

/// Current local datetime (ISO-8601) for an IANA timezone.
#[async_trait]
pub trait LocalTimeSource: Send + Sync + Debug {
    async fn local_time(&self, timezone: &str) -> Option<String>;
}

/// One of each source, as consumed by the city processor.
#[derive(Debug)]
pub struct Sources {
    pub weather: Box<dyn WeatherSource>,
    pub currency: Box<dyn CurrencySource>,
    pub local_time: Box<dyn LocalTimeSource>,
}

/// Construct the HTTP-backed sources from config, sharing one retrying client.
pub fn sources_from_config(config: &Config) -> anyhow::Result<Sources> {
    let client = RetryingClient::new(RetryPolicy::from(&config.retry))?;

    Ok(Sources {
        weather: Box::new(OpenMeteoProvider::new(
            client.clone(),
            config.endpoints.weather.clone(),
        )),
        currency: Box::new(ExchangeRateProvider::new(
            client.clone(),
            config.endpoints.currency.clone(),
            config.reference_currency.clone(),
        )),
        local_time: Box::new(WorldTimeProvider::new(
            client,
            config.endpoints.local_time.clone(),
        )),
    })
}
