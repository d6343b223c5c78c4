use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::Value;

use crate::{http::RetryingClient, model::CurrencySample};

use super::{CurrencySource, SourceKind};

/// exchangerate.host: `/latest` for today's rate and `/<YYYY-MM-DD>` for history.
#[derive(Debug, Clone)]
pub struct ExchangeRateProvider {
    client: RetryingClient,
    base_url: String,
    reference: String,
}

impl ExchangeRateProvider {
    pub fn new(client: RetryingClient, base_url: String, reference: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            reference: reference.to_uppercase(),
        }
    }

    async fn rate_at(&self, path: &str, currency: &str) -> Option<f64> {
        let url = format!("{}/{}", self.base_url, path);
        let params = [
            ("base", self.reference.clone()),
            ("symbols", currency.to_string()),
        ];

        let body = self
            .client
            .get_json(SourceKind::Currency, &url, &params, &[])
            .await?;

        rate_from_response(&body, currency)
    }
}

#[async_trait]
impl CurrencySource for ExchangeRateProvider {
    async fn exchange_rate(&self, currency: &str) -> CurrencySample {
        let currency = currency.to_uppercase();
        if currency == self.reference {
            return CurrencySample::REFERENCE;
        }

        let today = Utc::now().date_naive();
        let yesterday = previous_day(today);

        let rate_today = self.rate_at("latest", &currency).await;
        let rate_yesterday = self.rate_at(&yesterday.to_string(), &currency).await;

        let (Some(rate_today), Some(rate_yesterday)) = (rate_today, rate_yesterday) else {
            tracing::warn!(
                currency = %currency,
                today = rate_today.is_some(),
                yesterday = rate_yesterday.is_some(),
                "exchange rate unavailable"
            );
            return CurrencySample::UNKNOWN;
        };

        match variation_pct(rate_today, rate_yesterday) {
            Some(variation) => CurrencySample {
                rate: Some(rate_today),
                variation_pct: Some(variation),
            },
            None => {
                tracing::warn!(
                    currency = %currency,
                    rate_yesterday,
                    "previous rate is zero, variation undefined"
                );
                CurrencySample::UNKNOWN
            }
        }
    }
}

fn previous_day(day: NaiveDate) -> NaiveDate {
    day.pred_opt().unwrap_or(day)
}

fn rate_from_response(body: &Value, currency: &str) -> Option<f64> {
    let rate = body.get("rates").and_then(|r| r.get(currency)).and_then(Value::as_f64);
    if rate.is_none() {
        tracing::warn!(currency, "response carries no rate for currency");
    }
    rate
}

/// Percent change from `yesterday` to `today`; undefined when `yesterday` is zero.
pub fn variation_pct(today: f64, yesterday: f64) -> Option<f64> {
    if yesterday == 0.0 {
        return None;
    }
    Some((today / yesterday - 1.0) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn variation_is_percent_change() {
        let v = variation_pct(1.05, 1.0).unwrap();
        assert!((v - 5.0).abs() < 1e-9);

        let v = variation_pct(0.97, 1.0).unwrap();
        assert!((v + 3.0).abs() < 1e-9);
    }

    #[test]
    fn zero_previous_rate_has_no_variation() {
        assert_eq!(variation_pct(1.2, 0.0), None);
    }

    #[test]
    fn reads_rate_for_requested_symbol() {
        let body = json!({ "base": "USD", "rates": { "GBP": 0.79, "EUR": 0.92 } });
        assert_eq!(rate_from_response(&body, "GBP"), Some(0.79));
        assert_eq!(rate_from_response(&body, "JPY"), None);
        assert_eq!(rate_from_response(&json!({ "success": false }), "GBP"), None);
    }

    #[test]
    fn previous_day_crosses_month_boundary() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(previous_day(day), NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
    }
}
