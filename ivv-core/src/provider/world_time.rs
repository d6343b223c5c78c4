use async_trait::async_trait;
use chrono::DateTime;
use serde_json::Value;

use crate::http::RetryingClient;

use super::{LocalTimeSource, SourceKind};

/// WorldTimeAPI: `GET <base>/<Area/City>`.
#[derive(Debug, Clone)]
pub struct WorldTimeProvider {
    client: RetryingClient,
    base_url: String,
}

impl WorldTimeProvider {
    pub fn new(client: RetryingClient, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl LocalTimeSource for WorldTimeProvider {
    async fn local_time(&self, timezone: &str) -> Option<String> {
        let url = format!("{}/{}", self.base_url, timezone);
        let body = self
            .client
            .get_json(SourceKind::LocalTime, &url, &[], &[])
            .await?;

        let datetime = datetime_from_response(&body);
        if datetime.is_none() {
            tracing::warn!(timezone, "local time response has no usable datetime");
        }
        datetime
    }
}

/// The `datetime` field, kept verbatim, if it parses as RFC 3339.
fn datetime_from_response(body: &Value) -> Option<String> {
    let raw = body.get("datetime")?.as_str()?;
    DateTime::parse_from_rfc3339(raw).ok()?;
    Some(raw.to_string())
}
