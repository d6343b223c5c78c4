use chrono::{DateTime, Utc};

use crate::{
    alert::{self, Alert},
    model::{CityTarget, Observation},
    provider::Sources,
    score::score,
};

/// What one city contributed to a run.
#[derive(Debug, Clone)]
pub struct CityReport {
    pub observation: Observation,
    pub alerts: Vec<Alert>,
}

/// Fetches, scores and checks alerts for a single city.
#[derive(Debug)]
pub struct CityProcessor {
    sources: Sources,
}

impl CityProcessor {
    pub fn new(sources: Sources) -> Self {
        Self { sources }
    }

    /// Query weather, currency and local time in that order and build the observation.
    ///
    /// Returns `None` when no weather data could be obtained; currency and local
    /// time gaps are carried as `None` in the observation instead.
    pub async fn process(&self, city: &CityTarget, run_at: DateTime<Utc>) -> Option<CityReport> {
        tracing::info!(city = %city.name, "processing city");

        let Some(weather) = self.sources.weather.current_weather(city.lat, city.lon).await else {
            tracing::warn!(city = %city.name, "no weather data, skipping city");
            return None;
        };

        let currency = self.sources.currency.exchange_rate(&city.currency).await;
        let local_time = self.sources.local_time.local_time(&city.timezone).await;

        let result = score(
            weather.precipitation_pct,
            weather.temperature_c,
            currency.variation_pct,
        );
        let observation = Observation::new(run_at, city, &weather, currency, local_time, result);

        tracing::info!(
            city = %city.name,
            score = result.score,
            label = %result.label,
            "city scored"
        );

        let alerts = alert::evaluate(&observation);
        if !alerts.is_empty() {
            tracing::warn!(
                city = %city.name,
                at = %Utc::now().to_rfc3339(),
                "ALERTS: {}",
                alert::summary(&alerts)
            );
        }

        Some(CityReport {
            observation,
            alerts,
        })
    }
}
