use super::*;
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::collections::HashMap;
use tokio_test::{assert_err, assert_ok};

async fn spawn_fake(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client_for(base_url: &str) -> PolygonClient {
    PolygonClient::with_timeout("test-key".to_string(), Duration::from_secs(5)).with_base_url(base_url)
}

fn prev_bar_route() -> Router {
    Router::new().route(
        "/v2/aggs/ticker/:symbol/prev",
        get(
            |Path(symbol): Path<String>, Query(q): Query<HashMap<String, String>>| async move {
                if q.get("apiKey").map(String::as_str) != Some("test-key") {
                    return (StatusCode::UNAUTHORIZED, Json(json!({"status": "ERROR"})));
                }
                (
                    StatusCode::OK,
                    Json(json!({
                        "ticker": symbol,
                        "results": [{"o": 100.0, "h": 112.0, "l": 99.0, "c": 110.0, "v": 2500000.0}]
                    })),
                )
            },
        ),
    )
}

fn indicator_routes() -> Router {
    Router::new()
        .route(
            "/v1/indicators/sma/:symbol",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let value = match q.get("window").map(String::as_str) {
                    Some("200") => 95.0,
                    _ => 105.0,
                };
                Json(json!({"results": {"values": [{"timestamp": 1, "value": value}]}}))
            }),
        )
        .route(
            "/v1/indicators/rsi/:symbol",
            get(|| async { Json(json!({"results": {"values": [{"timestamp": 1, "value": 64.2}]}})) }),
        )
        .route(
            "/v1/indicators/macd/:symbol",
            get(|| async {
                Json(json!({"results": {"values": [
                    {"timestamp": 2, "value": 1.5, "signal": 1.0, "histogram": 0.5},
                    {"timestamp": 1, "value": 0.2, "signal": 0.9, "histogram": -0.7}
                ]}}))
            }),
        )
}

#[test]
fn test_quote_from_bar_uses_open_as_reference() {
    let bar = PreviousBar {
        o: 200.0,
        h: 210.0,
        l: 190.0,
        c: 190.0,
        v: 1000.0,
    };
    let quote = quote_from_bar("XYZ", &bar, 0.0, QuoteIndicators::default());

    assert_eq!(quote.price, 190.0);
    assert_eq!(quote.change, -10.0);
    assert!((quote.change_percent + 5.0).abs() < 1e-9);
    assert_eq!(quote.previous_close, 200.0);
    assert_eq!(quote.technical_indicators.macd, MacdSignal::Neutral);
}

#[test]
fn test_quote_from_bar_zero_open_has_no_percent_change() {
    let bar = PreviousBar {
        o: 0.0,
        h: 0.0,
        l: 0.0,
        c: 5.0,
        v: 0.0,
    };
    let quote = quote_from_bar("XYZ", &bar, 0.0, QuoteIndicators::default());
    assert_eq!(quote.change_percent, 0.0);
}

#[test]
fn test_indicator_window_spans_lookback() {
    let today = NaiveDate::from_ymd_opt(2024, 9, 7).unwrap();
    let (from, to) = indicator_window(today);
    assert_eq!(to, "2024-09-07");
    assert_eq!(from, "2024-01-01");
}

#[test]
fn test_macd_value_classification() {
    let macd = |value: f64, signal: f64| MacdValue {
        timestamp: None,
        value: Some(value),
        signal: Some(signal),
        histogram: None,
    };
    let bullish = macd(1.5, 1.0);
    let bearish = macd(1.0, 1.5);
    let flat = macd(1.0, 1.0);
    assert_eq!(bullish.classify(), MacdSignal::Bullish);
    assert_eq!(bearish.classify(), MacdSignal::Bearish);
    assert_eq!(flat.classify(), MacdSignal::Neutral);
}

#[test]
fn test_indicator_body_without_results_has_no_latest() {
    let missing: IndicatorResponse<IndicatorValue> = serde_json::from_value(json!({})).unwrap();
    assert!(missing.latest().is_none());

    let empty: IndicatorResponse<MacdValue> =
        serde_json::from_value(json!({"results": {}})).unwrap();
    assert!(empty.latest().is_none());

    let newest_first: IndicatorResponse<IndicatorValue> = serde_json::from_value(json!({
        "results": {"values": [{"timestamp": 2, "value": 51.5}, {"timestamp": 1, "value": 49.0}]}
    }))
    .unwrap();
    assert_eq!(newest_first.latest().and_then(|v| v.value), Some(51.5));
}

#[tokio::test]
async fn test_fetch_quote_merges_bar_details_and_indicators() {
    let app = prev_bar_route().merge(indicator_routes()).route(
        "/v3/reference/tickers/:symbol",
        get(|| async { Json(json!({"results": {"ticker": "AAPL", "market_cap": 2.5e12}})) }),
    );
    let base = spawn_fake(app).await;

    let quote = assert_ok!(client_for(&base).fetch_quote("AAPL").await);

    assert_eq!(quote.symbol, "AAPL");
    assert_eq!(quote.price, 110.0);
    assert_eq!(quote.change, 10.0);
    assert!((quote.change_percent - 10.0).abs() < 1e-9);
    assert_eq!(quote.volume, 2500000.0);
    assert_eq!(quote.market_cap, 2.5e12);
    assert_eq!(quote.technical_indicators.rsi, 64.2);
    assert_eq!(quote.technical_indicators.macd, MacdSignal::Bullish);
    assert_eq!(quote.technical_indicators.moving_averages.sma50, 105.0);
    assert_eq!(quote.technical_indicators.moving_averages.sma200, 95.0);
    assert_eq!(quote.technical_indicators.moving_averages.sma20, 0.0);
    assert_eq!(quote.technical_indicators.moving_averages.sma100, 0.0);
}

#[tokio::test]
async fn test_fetch_quote_degrades_optional_calls_to_zero() {
    let app = prev_bar_route()
        .route(
            "/v3/reference/tickers/:symbol",
            get(|| async { (StatusCode::FORBIDDEN, "plan does not include this endpoint") }),
        )
        .route(
            "/v1/indicators/sma/:symbol",
            get(|| async { Json(json!({"results": {"values": []}})) }),
        )
        .route("/v1/indicators/rsi/:symbol", get(|| async { Json(json!({"results": {}})) }))
        .route(
            "/v1/indicators/macd/:symbol",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
    let base = spawn_fake(app).await;

    let quote = assert_ok!(client_for(&base).fetch_quote("AAPL").await);

    assert_eq!(quote.price, 110.0);
    assert_eq!(quote.market_cap, 0.0);
    assert_eq!(quote.technical_indicators.rsi, 0.0);
    assert_eq!(quote.technical_indicators.macd, MacdSignal::Neutral);
    assert_eq!(quote.technical_indicators.moving_averages, MovingAverages::default());
}

#[tokio::test]
async fn test_fetch_quote_fails_when_price_bar_unavailable() {
    let app = Router::new().route(
        "/v2/aggs/ticker/:symbol/prev",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
    );
    let base = spawn_fake(app).await;

    let err = assert_err!(client_for(&base).fetch_quote("AAPL").await);
    assert!(matches!(err, EnrichmentError::SourceUnavailable { .. }));
}

#[tokio::test]
async fn test_fetch_quote_empty_results_is_malformed() {
    let app = Router::new().route(
        "/v2/aggs/ticker/:symbol/prev",
        get(|| async { Json(json!({"resultsCount": 0, "results": []})) }),
    );
    let base = spawn_fake(app).await;

    let err = assert_err!(client_for(&base).fetch_quote("NOPE").await);
    assert!(matches!(err, EnrichmentError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_connection_refused_is_unavailable() {
    // Nothing listens on port 9 locally.
    let err = assert_err!(client_for("http://127.0.0.1:9").get_previous_bar("AAPL").await);
    assert!(err.is_source_failure());
}
