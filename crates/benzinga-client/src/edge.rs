use async_trait::async_trait;
use enrichment_core::{
    derive_edge_score, EdgeScoreSnapshot, EdgeSource, EnrichmentError, PeerComparison,
    PercentileRankings, RiskMetrics,
};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::{build_http_client, get_json, number, DEFAULT_TIMEOUT};

const BASE_URL: &str = "https://data-api-next.benzinga.com";
const SOURCE: &str = "benzinga-edge";

/// Benzinga Edge ticker-detail client (momentum/value/growth/quality rankings).
#[derive(Clone)]
pub struct BenzingaEdgeClient {
    api_key: String,
    client: Client,
    base_url: String,
}

impl BenzingaEdgeClient {
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

    /// Raw ticker-detail body for one symbol.
    pub async fn get_ticker_detail(&self, symbol: &str) -> Result<Value, EnrichmentError> {
        let url = format!("{}/rest/v3/tickerDetail", self.base_url);
        let symbol = symbol.trim().to_uppercase();

        get_json(
            SOURCE,
            self.client
                .get(&url)
                .query(&[("apikey", self.api_key.as_str()), ("symbols", symbol.as_str())]),
        )
        .await
    }
}

#[async_trait]
impl EdgeSource for BenzingaEdgeClient {
    async fn fetch_edge(&self, symbol: &str) -> Result<EdgeScoreSnapshot, EnrichmentError> {
        tracing::debug!("Fetching Benzinga Edge rankings for {}", symbol);
        let body = self.get_ticker_detail(symbol).await?;
        let snapshot = parse_edge_rankings(symbol, &body)?;
        tracing::debug!("Edge score for {}: {:.2}", symbol, snapshot.edge_score);
        Ok(snapshot)
    }
}

/// Shape a ticker-detail body into an [`EdgeScoreSnapshot`].
///
/// `result[0].rankings` must exist (and must not be flagged `exists: false`).
/// Every individual field is optional and defaults to 0. The edge score is the
/// mean of the present component scores.
pub fn parse_edge_rankings(symbol: &str, body: &Value) -> Result<EdgeScoreSnapshot, EnrichmentError> {
    let result = body
        .get("result")
        .and_then(|r| r.as_array())
        .and_then(|r| r.first())
        .ok_or_else(|| EnrichmentError::malformed(SOURCE, format!("no edge data available for {}", symbol)))?;

    let rankings = result
        .get("rankings")
        .filter(|r| r.is_object())
        .ok_or_else(|| EnrichmentError::malformed(SOURCE, format!("no rankings object for {}", symbol)))?;

    if rankings.get("exists").and_then(|v| v.as_bool()) == Some(false) {
        return Err(EnrichmentError::malformed(
            SOURCE,
            format!("no edge rankings data found for {}", symbol),
        ));
    }

    let field = |key: &str| number(rankings.get(key)).unwrap_or(0.0);

    let momentum = field("momentum");
    let value = field("value");
    let growth = field("growth");
    let quality = field("quality");
    let edge_score = derive_edge_score([momentum, value, growth, quality]);

    Ok(EdgeScoreSnapshot {
        symbol: symbol.to_string(),
        edge_score,
        momentum_score: momentum,
        value_score: value,
        growth_score: growth,
        quality_score: quality,
        percentile_rankings: PercentileRankings {
            momentum: field("momentum_percentile"),
            value: field("value_percentile"),
            growth: field("growth_percentile"),
            quality: field("quality_percentile"),
            overall: edge_score,
        },
        peer_comparison: PeerComparison {
            industry_average: field("industry_average"),
            sector_average: field("sector_average"),
            market_average: field("market_average"),
            rank_in_industry: field("industry_rank"),
            rank_in_sector: field("sector_rank"),
        },
        risk_metrics: RiskMetrics {
            volatility: field("volatility"),
            sharpe_ratio: field("sharpe_ratio"),
            max_drawdown: field("max_drawdown"),
            correlation_to_spy: field("correlation_to_spy"),
        },
    })
}
