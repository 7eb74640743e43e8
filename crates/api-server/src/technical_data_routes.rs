//! Batch enrichment endpoints for ranking spreadsheets.

use axum::{extract::State, routing::post, Extension, Json, Router};
use enrichment_core::{CanonicalRankingRecord, EnrichedStockRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::request_id::RequestId;
use crate::{ApiResponse, AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct TechnicalDataRequest {
    #[serde(default)]
    pub stocks: Vec<CanonicalRankingRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalDataResponse {
    pub technical_data: HashMap<String, EnrichedStockRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockNarratives {
    pub technical: String,
    pub fundamental: String,
    pub risk: String,
}

pub fn technical_data_routes() -> axum::Router<AppState> {
    Router::new()
        .route("/api/technical-data", post(generate_technical_data))
        .route("/api/technical-analysis", post(generate_technical_analysis))
}

/// Shared front half of both endpoints: reject bad input, then missing keys,
/// before any provider is called.
async fn enrich_request(
    state: &AppState,
    request_id: &str,
    payload: Option<Json<TechnicalDataRequest>>,
) -> Result<HashMap<String, EnrichedStockRecord>, AppError> {
    let stocks = match payload {
        Some(Json(body)) if !body.stocks.is_empty() => body.stocks,
        _ => return Err(AppError::bad_request("Invalid stocks data")),
    };

    let enricher = state.enricher()?;

    tracing::info!(request_id, "Enriching {} ranking rows", stocks.len());
    let records = enricher.enrich_rankings(&stocks).await;
    tracing::debug!(
        request_id,
        "Enriched symbols: {:?}",
        records.keys().collect::<Vec<_>>()
    );

    Ok(records)
}

async fn generate_technical_data(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    payload: Option<Json<TechnicalDataRequest>>,
) -> Result<Json<TechnicalDataResponse>, AppError> {
    let technical_data = enrich_request(&state, &request_id, payload).await?;
    Ok(Json(TechnicalDataResponse { technical_data }))
}

async fn generate_technical_analysis(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    payload: Option<Json<TechnicalDataRequest>>,
) -> Result<Json<ApiResponse<HashMap<String, StockNarratives>>>, AppError> {
    let records = enrich_request(&state, &request_id, payload).await?;

    let narratives = records
        .into_iter()
        .map(|(symbol, record)| (symbol, narrate(&record)))
        .collect();

    Ok(Json(ApiResponse::success(narratives)))
}

pub fn narrate(record: &EnrichedStockRecord) -> StockNarratives {
    StockNarratives {
        technical: narratives::technical_narrative(&record.stock_data),
        fundamental: narratives::fundamental_narrative(&record.stock_data, &record.edge_data),
        risk: narratives::risk_narrative(&record.stock_data, &record.edge_data),
    }
}
