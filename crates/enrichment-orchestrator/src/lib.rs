//! Per-symbol enrichment: fan out to the quote, edge and analyst sources, then merge.

use benzinga_client::{BenzingaEdgeClient, BenzingaRatingsClient};
use enrichment_core::{
    AnalystSource, EdgeSource, EnrichedStockRecord, EnrichmentError, QuoteSource,
    SourceCredentials,
};
use polygon_client::PolygonClient;
use std::sync::Arc;
use std::time::Duration;

pub mod batch;
pub mod merge;

pub use batch::BatchEnricher;
pub use merge::merge_sources;

#[derive(Clone)]
pub struct EnrichmentOrchestrator {
    quote_source: Arc<dyn QuoteSource>,
    edge_source: Arc<dyn EdgeSource>,
    analyst_source: Arc<dyn AnalystSource>,
}

impl EnrichmentOrchestrator {
    pub fn new(
        quote_source: Arc<dyn QuoteSource>,
        edge_source: Arc<dyn EdgeSource>,
        analyst_source: Arc<dyn AnalystSource>,
    ) -> Self {
        Self {
            quote_source,
            edge_source,
            analyst_source,
        }
    }

    /// Build the Polygon and Benzinga adapters. Fails before any network work
    /// when a credential is missing.
    pub fn from_credentials(
        credentials: &SourceCredentials,
        timeout: Duration,
    ) -> Result<Self, EnrichmentError> {
        let keys = credentials.validate()?;

        Ok(Self::new(
            Arc::new(PolygonClient::with_timeout(keys.polygon_api_key, timeout)),
            Arc::new(BenzingaEdgeClient::with_timeout(keys.benzinga_edge_api_key, timeout)),
            Arc::new(BenzingaRatingsClient::with_timeout(keys.benzinga_api_key, timeout)),
        ))
    }

    /// Never fails: sources that cannot answer collapse the record to the placeholder.
    pub async fn enrich_symbol(&self, symbol: &str) -> EnrichedStockRecord {
        tracing::debug!("Enriching {}", symbol);

        let (quote, edge, analyst_ratings) = tokio::join!(
            self.quote_source.fetch_quote(symbol),
            self.edge_source.fetch_edge(symbol),
            self.analyst_source.fetch_analyst_summary(symbol),
        );

        merge_sources(symbol, quote, edge, analyst_ratings)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use enrichment_core::{
        AnalystRatingSummary, AnalystSource, EdgeScoreSnapshot, EdgeSource, EnrichmentError,
        QuoteSnapshot, QuoteSource,
    };
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Answers with a fixed quote unless the symbol is listed as failing.
    #[derive(Default)]
    pub struct MockQuotes {
        pub failing: HashSet<String>,
        pub panicking: HashSet<String>,
        pub delay: Duration,
        pub calls: AtomicUsize,
    }

    impl MockQuotes {
        pub fn failing(symbols: &[&str]) -> Self {
            Self {
                failing: symbols.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl QuoteSource for MockQuotes {
        async fn fetch_quote(&self, symbol: &str) -> Result<QuoteSnapshot, EnrichmentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.panicking.contains(symbol) {
                panic!("quote source blew up for {}", symbol);
            }
            if self.failing.contains(symbol) {
                tokio::time::sleep(self.delay).await;
                return Err(EnrichmentError::unavailable("mock-quotes", "timed out"));
            }
            Ok(QuoteSnapshot {
                symbol: symbol.to_string(),
                price: 50.0,
                open: 49.0,
                change: 1.0,
                volume: 1_000.0,
                ..Default::default()
            })
        }
    }

    #[derive(Default)]
    pub struct MockEdge {
        pub failing: HashSet<String>,
    }

    #[async_trait]
    impl EdgeSource for MockEdge {
        async fn fetch_edge(&self, symbol: &str) -> Result<EdgeScoreSnapshot, EnrichmentError> {
            if self.failing.contains(symbol) {
                return Err(EnrichmentError::malformed("mock-edge", "no rankings"));
            }
            Ok(EdgeScoreSnapshot {
                symbol: symbol.to_string(),
                edge_score: 65.0,
                momentum_score: 65.0,
                ..Default::default()
            })
        }
    }

    pub struct MockAnalysts;

    #[async_trait]
    impl AnalystSource for MockAnalysts {
        async fn fetch_analyst_summary(&self, _symbol: &str) -> AnalystRatingSummary {
            AnalystRatingSummary {
                hold: 1,
                ..Default::default()
            }
        }
    }
}
