//! Benzinga adapters: Edge rankings (`edge`) and analyst ratings (`ratings`).
//!
//! The two endpoints live on different hosts and take different keys, so each
//! gets its own client.

pub mod edge;
pub mod ratings;

pub use edge::BenzingaEdgeClient;
pub use ratings::{BenzingaRatingsClient, RatingBucket, RatingEvent};

use enrichment_core::EnrichmentError;
use reqwest::Client;
use std::time::Duration;

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn build_http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// One attempt; non-success status is `SourceUnavailable`, an unparseable body `MalformedResponse`.
pub(crate) async fn get_json(
    source: &'static str,
    builder: reqwest::RequestBuilder,
) -> Result<serde_json::Value, EnrichmentError> {
    let response = builder
        .send()
        .await
        .map_err(|e| EnrichmentError::unavailable(source, e.to_string()))?;

    if !response.status().is_success() {
        return Err(EnrichmentError::unavailable(
            source,
            format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            ),
        ));
    }

    response
        .json()
        .await
        .map_err(|e| EnrichmentError::malformed(source, e.to_string()))
}

/// Numeric field that may arrive as a JSON number or a numeric string.
pub(crate) fn number(value: Option<&serde_json::Value>) -> Option<f64> {
    let parsed = match value? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_accepts_strings_and_numbers() {
        let body = json!({"a": 12.5, "b": "7.25", "c": "n/a", "d": null});
        assert_eq!(number(body.get("a")), Some(12.5));
        assert_eq!(number(body.get("b")), Some(7.25));
        assert_eq!(number(body.get("c")), None);
        assert_eq!(number(body.get("d")), None);
        assert_eq!(number(body.get("missing")), None);
    }
}
