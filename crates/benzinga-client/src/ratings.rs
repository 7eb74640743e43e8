use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use enrichment_core::{AnalystRatingSummary, AnalystSource, EnrichmentError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::{build_http_client, get_json, number, DEFAULT_TIMEOUT};

const BASE_URL: &str = "https://api.benzinga.com";
const SOURCE: &str = "benzinga-ratings";

/// Trailing window passed to the calendar endpoint.
pub const RATINGS_RANGE: &str = "6m";

/// Benzinga calendar ratings client.
#[derive(Clone)]
pub struct BenzingaRatingsClient {
    api_key: String,
    client: Client,
    base_url: String,
}

impl BenzingaRatingsClient {
    pub fn new(api_key: String) -> Self {
        Self::with_timeout(api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(api_key: String, timeout: Duration) -> Self {
        Self {
            api_key,
            client: build_http_client(timeout),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Rating events for `symbol` over the trailing [`RATINGS_RANGE`].
    pub async fn get_ratings(&self, symbol: &str) -> Result<Vec<RatingEvent>, EnrichmentError> {
        let url = format!("{}/api/v2.1/calendar/ratings", self.base_url);
        let symbol = symbol.trim().to_uppercase();

        let body = get_json(
            SOURCE,
            self.client
                .get(&url)
                .header(reqwest::header::ACCEPT, "application/json")
                .query(&[
                    ("token", self.api_key.as_str()),
                    ("parameters[tickers]", symbol.as_str()),
                    ("parameters[range]", RATINGS_RANGE),
                ]),
        )
        .await?;

        Ok(parse_rating_events(&body))
    }
}

#[async_trait]
impl AnalystSource for BenzingaRatingsClient {
    async fn fetch_analyst_summary(&self, symbol: &str) -> AnalystRatingSummary {
        match self.get_ratings(symbol).await {
            Ok(events) => {
                if events.is_empty() {
                    tracing::debug!("No analyst ratings found for {}", symbol);
                }
                summarize(&events)
            }
            Err(e) => {
                tracing::warn!("Analyst ratings unavailable for {}, using empty summary: {}", symbol, e);
                AnalystRatingSummary::default()
            }
        }
    }
}

/// One row of the ratings calendar.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatingEvent {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub rating_current: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub pt_current: Option<Value>,
    #[serde(default)]
    pub price_target: Option<Value>,
    #[serde(default)]
    pub analyst: Option<String>,
}

impl RatingEvent {
    /// Current rating, then the action, then "Hold".
    pub fn label(&self) -> &str {
        [&self.rating_current, &self.action]
            .into_iter()
            .flatten()
            .map(|s| s.as_str())
            .find(|s| !s.trim().is_empty())
            .unwrap_or("Hold")
    }

    pub fn target(&self) -> Option<f64> {
        number(self.pt_current.as_ref())
            .filter(|t| *t > 0.0)
            .or_else(|| number(self.price_target.as_ref()))
            .filter(|t| *t > 0.0)
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
    }
}

/// The calendar answers with either a bare array or `{ "ratings": [...] }`.
/// Rows that do not deserialize are dropped.
pub fn parse_rating_events(body: &Value) -> Vec<RatingEvent> {
    let rows = match body {
        Value::Array(rows) => rows.as_slice(),
        Value::Object(map) => map
            .get("ratings")
            .and_then(|r| r.as_array())
            .map(|r| r.as_slice())
            .unwrap_or(&[]),
        _ => &[],
    };

    rows.iter()
        .filter_map(|row| serde_json::from_value(row.clone()).ok())
        .collect()
}

/// Latest event by date. Ties keep list order; undated events rank last.
pub fn most_recent(events: &[RatingEvent]) -> Option<&RatingEvent> {
    let mut best: Option<(&RatingEvent, Option<NaiveDate>)> = None;
    for event in events {
        let date = event.parsed_date();
        match best {
            Some((_, best_date)) if date <= best_date => {}
            _ => best = Some((event, date)),
        }
    }
    best.map(|(event, _)| event)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingBucket {
    Buy,
    Hold,
    Sell,
}

/// Map a broker's label onto buy/hold/sell. Unknown labels map to nothing.
pub fn normalize_label(label: &str) -> Option<RatingBucket> {
    match label.trim().to_ascii_lowercase().as_str() {
        "buy" | "strong buy" | "outperform" | "overweight" => Some(RatingBucket::Buy),
        "hold" | "neutral" | "market perform" | "sector perform" | "equal-weight" => {
            Some(RatingBucket::Hold)
        }
        "sell" | "strong sell" | "underperform" | "underweight" => Some(RatingBucket::Sell),
        _ => None,
    }
}

/// Single-vote summary of the latest rating, with targets bracketed at ±10%.
pub fn summarize(events: &[RatingEvent]) -> AnalystRatingSummary {
    let Some(latest) = most_recent(events) else {
        return AnalystRatingSummary::default();
    };

    let bucket = normalize_label(latest.label());
    let target = latest.target().unwrap_or(0.0);

    AnalystRatingSummary {
        buy: u32::from(bucket == Some(RatingBucket::Buy)),
        hold: u32::from(bucket == Some(RatingBucket::Hold)),
        sell: u32::from(bucket == Some(RatingBucket::Sell)),
        average_target: target,
        high_target: if target > 0.0 { target * 1.1 } else { 0.0 },
        low_target: if target > 0.0 { target * 0.9 } else { 0.0 },
    }
}
