use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use enrichment_core::{
    EnrichmentError, MacdSignal, MovingAverages, QuoteIndicators, QuoteSnapshot, QuoteSource,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const BASE_URL: &str = "https://api.polygon.io";
const SOURCE: &str = "polygon";

/// Calendar days of history the indicator endpoints may look back over.
pub const INDICATOR_LOOKBACK_DAYS: i64 = 250;
pub const RSI_WINDOW: u32 = 14;
pub const MACD_SHORT_WINDOW: u32 = 12;
pub const MACD_LONG_WINDOW: u32 = 26;
pub const MACD_SIGNAL_WINDOW: u32 = 9;

#[derive(Clone)]
pub struct PolygonClient {
    api_key: String,
    client: Client,
    base_url: String,
}

impl PolygonClient {
    pub fn new(api_key: String) -> Self {
        Self::with_timeout(api_key, Duration::from_secs(30))
    }

    pub fn with_timeout(api_key: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            client,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Point the client at another host (a proxy, or a fake server in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Single attempt. A failed call is reported straight back to the caller.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, EnrichmentError> {
        let response = builder
            .send()
            .await
            .map_err(|e| EnrichmentError::unavailable(SOURCE, e.to_string()))?;

        if !response.status().is_success() {
            return Err(EnrichmentError::unavailable(
                SOURCE,
                format!(
                    "HTTP {}: {}",
                    response.status(),
                    response.text().await.unwrap_or_default()
                ),
            ));
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, EnrichmentError> {
        self.send_request(builder)
            .await?
            .json()
            .await
            .map_err(|e| EnrichmentError::malformed(SOURCE, e.to_string()))
    }

    /// Previous session's aggregate bar.
    pub async fn get_previous_bar(&self, symbol: &str) -> Result<PreviousBar, EnrichmentError> {
        let url = format!("{}/v2/aggs/ticker/{}/prev", self.base_url, symbol);

        let body: AggregateResponse = self
            .get_json(
                self.client
                    .get(&url)
                    .query(&[("adjusted", "true"), ("apiKey", self.api_key.as_str())]),
            )
            .await?;

        body.results
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| EnrichmentError::malformed(SOURCE, format!("no price data available for {}", symbol)))
    }

    /// Market capitalization from ticker details; `None` when the provider omits it.
    pub async fn get_market_cap(&self, symbol: &str) -> Result<Option<f64>, EnrichmentError> {
        let url = format!("{}/v3/reference/tickers/{}", self.base_url, symbol);

        let body: TickerDetailsResponse = self
            .get_json(self.client.get(&url).query(&[("apiKey", self.api_key.as_str())]))
            .await?;

        Ok(body.results.and_then(|r| r.market_cap))
    }

    /// Latest SMA value inside the lookback window.
    pub async fn get_sma(&self, symbol: &str, window: u32) -> Result<Option<f64>, EnrichmentError> {
        let url = format!("{}/v1/indicators/sma/{}", self.base_url, symbol);
        let window = window.to_string();

        let body: IndicatorResponse<IndicatorValue> = self
            .get_json(self.indicator_request(&url, &[("window", window.as_str())]))
            .await?;

        Ok(body.latest().and_then(|v| v.value))
    }

    /// Latest RSI value inside the lookback window.
    pub async fn get_rsi(&self, symbol: &str, window: u32) -> Result<Option<f64>, EnrichmentError> {
        let url = format!("{}/v1/indicators/rsi/{}", self.base_url, symbol);
        let window = window.to_string();

        let body: IndicatorResponse<IndicatorValue> = self
            .get_json(self.indicator_request(&url, &[("window", window.as_str())]))
            .await?;

        Ok(body.latest().and_then(|v| v.value))
    }

    /// Latest MACD line/signal pair inside the lookback window.
    pub async fn get_macd(&self, symbol: &str) -> Result<Option<MacdValue>, EnrichmentError> {
        let url = format!("{}/v1/indicators/macd/{}", self.base_url, symbol);
        let (short, long, signal) = (
            MACD_SHORT_WINDOW.to_string(),
            MACD_LONG_WINDOW.to_string(),
            MACD_SIGNAL_WINDOW.to_string(),
        );

        let body: IndicatorResponse<MacdValue> = self
            .get_json(self.indicator_request(
                &url,
                &[
                    ("short_window", short.as_str()),
                    ("long_window", long.as_str()),
                    ("signal_window", signal.as_str()),
                ],
            ))
            .await?;

        Ok(body.latest().cloned())
    }

    fn indicator_request(&self, url: &str, extra: &[(&str, &str)]) -> reqwest::RequestBuilder {
        let (from, to) = indicator_window(Utc::now().date_naive());
        self.client
            .get(url)
            .query(&[
                ("timespan", "day"),
                ("adjusted", "true"),
                ("series_type", "close"),
                ("order", "desc"),
                ("limit", "1"),
                ("timestamp.gte", from.as_str()),
                ("timestamp.lte", to.as_str()),
                ("apiKey", self.api_key.as_str()),
            ])
            .query(extra)
    }
}

#[async_trait]
impl QuoteSource for PolygonClient {
    /// Only the price bar is mandatory; details and indicators degrade to 0.
    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteSnapshot, EnrichmentError> {
        tracing::debug!("Fetching Polygon quote for {}", symbol);

        let bar = self.get_previous_bar(symbol).await?;

        let (market_cap, sma50, sma200, rsi, macd) = tokio::join!(
            self.get_market_cap(symbol),
            self.get_sma(symbol, 50),
            self.get_sma(symbol, 200),
            self.get_rsi(symbol, RSI_WINDOW),
            self.get_macd(symbol),
        );

        let market_cap = optional_value(symbol, "market cap", market_cap);
        let sma50 = optional_value(symbol, "SMA(50)", sma50);
        let sma200 = optional_value(symbol, "SMA(200)", sma200);
        let rsi = optional_value(symbol, "RSI", rsi);
        let macd = match macd {
            Ok(Some(v)) => v.classify(),
            Ok(None) => MacdSignal::Neutral,
            Err(e) => {
                tracing::warn!("MACD unavailable for {}: {}", symbol, e);
                MacdSignal::Neutral
            }
        };

        let indicators = QuoteIndicators {
            rsi,
            macd,
            moving_averages: MovingAverages {
                sma20: 0.0,
                sma50,
                sma100: 0.0,
                sma200,
            },
        };

        Ok(quote_from_bar(symbol, &bar, market_cap, indicators))
    }
}

fn optional_value(symbol: &str, what: &str, result: Result<Option<f64>, EnrichmentError>) -> f64 {
    match result {
        Ok(value) => value.filter(|v| v.is_finite()).unwrap_or(0.0),
        Err(e) => {
            tracing::warn!("{} unavailable for {}: {}", what, symbol, e);
            0.0
        }
    }
}

/// `[today - lookback, today]` as `YYYY-MM-DD` strings.
pub fn indicator_window(today: NaiveDate) -> (String, String) {
    let from = today - ChronoDuration::days(INDICATOR_LOOKBACK_DAYS);
    (from.format("%Y-%m-%d").to_string(), today.format("%Y-%m-%d").to_string())
}

/// The previous-day bar stands in for today's session: change is measured
/// from its open, and its open doubles as the previous close.
pub fn quote_from_bar(
    symbol: &str,
    bar: &PreviousBar,
    market_cap: f64,
    technical_indicators: QuoteIndicators,
) -> QuoteSnapshot {
    let change = bar.c - bar.o;
    let change_percent = if bar.o != 0.0 { change / bar.o * 100.0 } else { 0.0 };

    QuoteSnapshot {
        symbol: symbol.to_string(),
        price: bar.c,
        change,
        change_percent,
        volume: bar.v,
        market_cap,
        open: bar.o,
        high: bar.h,
        low: bar.l,
        previous_close: bar.o,
        technical_indicators,
    }
}

// Response structures
#[derive(Debug, Deserialize)]
struct AggregateResponse {
    #[serde(default)]
    results: Option<Vec<PreviousBar>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviousBar {
    #[serde(default)]
    pub o: f64, // open
    #[serde(default)]
    pub h: f64, // high
    #[serde(default)]
    pub l: f64, // low
    #[serde(default)]
    pub c: f64, // close
    #[serde(default)]
    pub v: f64, // volume
}

#[derive(Debug, Deserialize)]
struct TickerDetailsResponse {
    results: Option<TickerDetails>,
}

#[derive(Debug, Deserialize)]
struct TickerDetails {
    market_cap: Option<f64>,
}

// Technical indicator types
#[derive(Debug, Deserialize)]
struct IndicatorResponse<T> {
    results: Option<IndicatorResults<T>>,
}

impl<T> IndicatorResponse<T> {
    /// Requests are ordered newest-first, so the first value is the latest.
    fn latest(&self) -> Option<&T> {
        self.results
            .as_ref()
            .and_then(|r| r.values.as_ref())
            .and_then(|v| v.first())
    }
}

#[derive(Debug, Deserialize)]
struct IndicatorResults<T> {
    values: Option<Vec<T>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndicatorValue {
    pub timestamp: Option<i64>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MacdValue {
    pub timestamp: Option<i64>,
    pub value: Option<f64>,
    pub signal: Option<f64>,
    pub histogram: Option<f64>,
}

impl MacdValue {
    pub fn classify(&self) -> MacdSignal {
        MacdSignal::classify(self.value.unwrap_or(0.0), self.signal.unwrap_or(0.0))
    }
}

#[cfg(test)]
mod tests;
