//! Threshold alerts raised after a city is scored. Alerts are logged, never persisted.

use crate::model::Observation;

pub const RAIN_ALERT_PCT: f64 = 70.0;
pub const CURRENCY_DROP_ALERT_PCT: f64 = -3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Alert {
    /// Today's precipitation probability, in percent.
    HeavyRain(f64),
    /// Day-over-day variation of the local currency, in percent.
    CurrencyDrop(f64),
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Alert::HeavyRain(pct) => write!(f, "high rain probability ({pct}%)"),
            Alert::CurrencyDrop(pct) => write!(f, "currency drop {pct:.2}%"),
        }
    }
}

/// Evaluate both predicates; both thresholds are inclusive.
pub fn evaluate(observation: &Observation) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if let Some(p) = observation.precipitation_pct.filter(|p| *p >= RAIN_ALERT_PCT) {
        alerts.push(Alert::HeavyRain(p));
    }
    if let Some(v) = observation.variation_pct.filter(|v| *v <= CURRENCY_DROP_ALERT_PCT) {
        alerts.push(Alert::CurrencyDrop(v));
    }

    alerts
}

/// Single log line for every alert of one city.
pub fn summary(alerts: &[Alert]) -> String {
    alerts
        .iter()
        .map(Alert::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{CityTarget, CurrencySample, WeatherSample},
        score::score,
    };
    use chrono::Utc;

    fn observation(precipitation_pct: Option<f64>, variation_pct: Option<f64>) -> Observation {
        let city = CityTarget {
            name: "London".into(),
            lat: 51.5074,
            lon: -0.1278,
            timezone: "Europe/London".into(),
            currency: "GBP".into(),
        };
        let weather = WeatherSample {
            temperature_c: Some(14.0),
            precipitation_pct,
            ..WeatherSample::default()
        };
        let currency = CurrencySample {
            rate: Some(0.79),
            variation_pct,
        };
        Observation::new(
            Utc::now(),
            &city,
            &weather,
            currency,
            None,
            score(precipitation_pct, Some(14.0), variation_pct),
        )
    }

    #[test]
    fn rain_threshold_is_inclusive() {
        assert_eq!(evaluate(&observation(Some(70.0), None)), vec![Alert::HeavyRain(70.0)]);
        assert!(evaluate(&observation(Some(69.9), None)).is_empty());
    }

    #[test]
    fn currency_threshold_is_inclusive() {
        assert_eq!(evaluate(&observation(None, Some(-3.0))), vec![Alert::CurrencyDrop(-3.0)]);
        assert!(evaluate(&observation(None, Some(-2.9))).is_empty());
    }

    #[test]
    fn unknown_values_never_alert() {
        assert!(evaluate(&observation(None, None)).is_empty());
    }

    #[test]
    fn simultaneous_alerts_share_one_summary() {
        let alerts = evaluate(&observation(Some(95.0), Some(-4.5)));
        assert_eq!(alerts.len(), 2);
        assert_eq!(
            summary(&alerts),
            "high rain probability (95%); currency drop -4.50%"
        );
    }
}
