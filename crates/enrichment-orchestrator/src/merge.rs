use enrichment_core::{
    AnalystRatingSummary, EdgeScoreSnapshot, EnrichedStockRecord, EnrichmentError, QuoteSnapshot,
    StockData,
};

/// Combine the three adapter outcomes for one symbol.
///
/// Quote and Edge are both required: if either failed the whole record is the
/// placeholder. The analyst summary is already absorbed by its adapter.
pub fn merge_sources(
    symbol: &str,
    quote: Result<QuoteSnapshot, EnrichmentError>,
    edge: Result<EdgeScoreSnapshot, EnrichmentError>,
    analyst_ratings: AnalystRatingSummary,
) -> EnrichedStockRecord {
    match (quote, edge) {
        (Ok(quote), Ok(edge_data)) => EnrichedStockRecord {
            stock_data: StockData::from_quote(quote, analyst_ratings),
            edge_data,
        },
        (quote, edge) => {
            if let Err(e) = &quote {
                tracing::warn!("Quote failed for {}: {}", symbol, e);
            }
            if let Err(e) = &edge {
                tracing::warn!("Edge rankings failed for {}: {}", symbol, e);
            }
            EnrichedStockRecord::placeholder(symbol)
        }
    }
}
