use async_trait::async_trait;
use crate::{AnalystRatingSummary, EdgeScoreSnapshot, EnrichmentError, QuoteSnapshot};

/// Price, volume and technical indicators for one symbol.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteSnapshot, EnrichmentError>;
}

/// Momentum/value/growth/quality rankings for one symbol.
#[async_trait]
pub trait EdgeSource: Send + Sync {
    async fn fetch_edge(&self, symbol: &str) -> Result<EdgeScoreSnapshot, EnrichmentError>;
}

/// Most recent analyst rating. Optional enrichment: implementations absorb their
/// own failures and answer with the zero summary.
#[async_trait]
pub trait AnalystSource: Send + Sync {
    async fn fetch_analyst_summary(&self, symbol: &str) -> AnalystRatingSummary;
}
