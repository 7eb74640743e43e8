use super::EnrichmentOrchestrator;
use enrichment_core::{positive_opt, CanonicalRankingRecord, EnrichedStockRecord};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Enriches a whole symbol list concurrently.
pub struct BatchEnricher {
    orchestrator: Arc<EnrichmentOrchestrator>,
    limit: Option<Arc<Semaphore>>,
}

impl BatchEnricher {
    pub fn new(orchestrator: Arc<EnrichmentOrchestrator>) -> Self {
        Self {
            orchestrator,
            limit: None,
        }
    }

    /// Cap the number of symbols in flight. Unbounded unless set.
    pub fn with_concurrency_limit(mut self, max_in_flight: usize) -> Self {
        self.limit = Some(Arc::new(Semaphore::new(max_in_flight.max(1))));
        self
    }

    /// One entry per distinct symbol, whatever the providers did. Duplicates are
    /// fetched more than once and the last result to finish is kept.
    pub async fn enrich_batch(&self, symbols: &[String]) -> HashMap<String, EnrichedStockRecord> {
        tracing::info!("📊 Enriching batch of {} symbols", symbols.len());

        let mut tasks = JoinSet::new();

        for symbol in symbols {
            let orchestrator = Arc::clone(&self.orchestrator);
            let limit = self.limit.clone();
            let symbol = symbol.clone();
            tasks.spawn(async move {
                let _permit = match limit {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                let record = orchestrator.enrich_symbol(&symbol).await;
                (symbol, record)
            });
        }

        let mut results = HashMap::with_capacity(symbols.len());

        while let Some(result) = tasks.join_next().await {
            match result {
                Ok((symbol, record)) => {
                    results.insert(symbol, record);
                }
                Err(e) => {
                    tracing::error!("Task error: {}", e);
                }
            }
        }

        // A task that panicked never reported its symbol.
        for symbol in symbols {
            if !results.contains_key(symbol) {
                results.insert(symbol.clone(), EnrichedStockRecord::placeholder(symbol));
            }
        }

        let placeholders = results.values().filter(|r| r.is_placeholder()).count();
        tracing::info!(
            "✅ Batch complete: {} symbols, {} without provider data",
            results.len(),
            placeholders
        );

        results
    }

    /// Enrich spreadsheet rows, then lay the spreadsheet's own fundamentals over
    /// the provider data.
    pub async fn enrich_rankings(
        &self,
        records: &[CanonicalRankingRecord],
    ) -> HashMap<String, EnrichedStockRecord> {
        let symbols: Vec<String> = records.iter().map(|r| r.symbol.clone()).collect();
        let mut results = self.enrich_batch(&symbols).await;

        for record in records {
            if let Some(enriched) = results.get_mut(&record.symbol) {
                apply_ranking_overlay(enriched, record);
            }
        }

        results
    }
}

/// Company name always wins when the sheet has one. Ratios only fill records
/// that carry real provider data.
pub fn apply_ranking_overlay(enriched: &mut EnrichedStockRecord, record: &CanonicalRankingRecord) {
    let has_provider_data = !enriched.is_placeholder();
    let stock = &mut enriched.stock_data;

    if !record.company_name.trim().is_empty() {
        stock.company_name = Some(record.company_name.clone());
    }

    if !has_provider_data {
        return;
    }

    if let Some(pe) = positive_opt(record.pe_ratio) {
        stock.pe_ratio = Some(pe);
    }
    if let Some(dividend_yield) = positive_opt(record.dividend_yield) {
        stock.dividend_yield = Some(dividend_yield);
    }
    if let Some(beta) = positive_opt(record.beta) {
        stock.beta = Some(beta);
    }
}
