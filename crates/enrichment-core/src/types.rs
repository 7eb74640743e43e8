use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Providers encode "not supplied" as a zero. Every presence check goes through here.
pub fn reported(value: f64) -> Option<f64> {
    if value != 0.0 && value.is_finite() {
        Some(value)
    } else {
        None
    }
}

/// Same convention for optional spreadsheet overlays: `None` and `Some(0.0)` are both absent.
pub fn reported_opt(value: Option<f64>) -> Option<f64> {
    value.and_then(reported)
}

/// Ratios that are only meaningful above zero (P/E, dividend yield, beta).
/// A negative P/E from a loss-making company is treated as not reported.
pub fn positive_opt(value: Option<f64>) -> Option<f64> {
    reported_opt(value).filter(|v| *v > 0.0)
}

/// One row of the ranking spreadsheet after column mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRankingRecord {
    pub symbol: String,
    #[serde(default)]
    pub company_name: String,
    pub momentum_score: f64,
    #[serde(default)]
    pub previous_momentum_score: Option<f64>,
    #[serde(default)]
    pub value_score: Option<f64>,
    #[serde(default)]
    pub growth_score: Option<f64>,
    #[serde(default)]
    pub quality_score: Option<f64>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub price_change: Option<f64>,
    #[serde(default)]
    pub price_change_percent: Option<f64>,
    #[serde(default)]
    pub pe_ratio: Option<f64>,
    #[serde(default)]
    pub forward_pe_ratio: Option<f64>,
    #[serde(default)]
    pub dividend_yield: Option<f64>,
    #[serde(default)]
    pub beta: Option<f64>,
    #[serde(default, rename = "fiftyDayMA")]
    pub fifty_day_ma: Option<f64>,
    #[serde(default, rename = "hundredDayMA")]
    pub hundred_day_ma: Option<f64>,
    #[serde(default, rename = "twoHundredDayMA")]
    pub two_hundred_day_ma: Option<f64>,
    #[serde(default)]
    pub rsi: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    /// Spreadsheet columns with no canonical mapping.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// MACD line relative to its signal line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacdSignal {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl MacdSignal {
    pub fn classify(macd_line: f64, signal_line: f64) -> Self {
        if macd_line > signal_line {
            MacdSignal::Bullish
        } else if macd_line < signal_line {
            MacdSignal::Bearish
        } else {
            MacdSignal::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MacdSignal::Bullish => "Bullish",
            MacdSignal::Bearish => "Bearish",
            MacdSignal::Neutral => "Neutral",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovingAverages {
    pub sma20: f64,
    pub sma50: f64,
    pub sma100: f64,
    pub sma200: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteIndicators {
    pub rsi: f64,
    pub macd: MacdSignal,
    pub moving_averages: MovingAverages,
}

/// Point-in-time market data for one symbol from the quote provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSnapshot {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: f64,
    pub market_cap: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub previous_close: f64,
    pub technical_indicators: QuoteIndicators,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentileRankings {
    pub momentum: f64,
    pub value: f64,
    pub growth: f64,
    pub quality: f64,
    pub overall: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerComparison {
    pub industry_average: f64,
    pub sector_average: f64,
    pub market_average: f64,
    pub rank_in_industry: f64,
    pub rank_in_sector: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    #[serde(rename = "correlationToSPY")]
    pub correlation_to_spy: f64,
}

/// Ranking provider scores for one symbol. `edge_score` is derived, never sourced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeScoreSnapshot {
    pub symbol: String,
    pub edge_score: f64,
    pub momentum_score: f64,
    pub value_score: f64,
    pub growth_score: f64,
    pub quality_score: f64,
    pub percentile_rankings: PercentileRankings,
    pub peer_comparison: PeerComparison,
    pub risk_metrics: RiskMetrics,
}

impl EdgeScoreSnapshot {
    pub fn placeholder(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            ..Default::default()
        }
    }
}

/// Mean of the present (non-zero) components; 0 when none are present.
pub fn derive_edge_score(components: [f64; 4]) -> f64 {
    let present: Vec<f64> = components.iter().copied().filter_map(reported).collect();
    if present.is_empty() {
        return 0.0;
    }
    present.iter().sum::<f64>() / present.len() as f64
}

/// Single-vote view of the most recent analyst rating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalystRatingSummary {
    pub buy: u32,
    pub hold: u32,
    pub sell: u32,
    pub average_target: f64,
    pub high_target: f64,
    pub low_target: f64,
}

impl AnalystRatingSummary {
    pub fn total(&self) -> u32 {
        self.buy + self.hold + self.sell
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalIndicators {
    pub rsi: f64,
    pub macd: MacdSignal,
    pub moving_averages: MovingAverages,
    pub support: f64,
    pub resistance: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsSentiment {
    pub bullish: u32,
    pub bearish: u32,
    pub neutral: u32,
    pub total_articles: u32,
}

/// The quote-shaped half of an enriched record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockData {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: f64,
    pub market_cap: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub previous_close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dividend_yield: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    pub technical_indicators: TechnicalIndicators,
    pub news_sentiment: NewsSentiment,
    pub analyst_ratings: AnalystRatingSummary,
}

impl StockData {
    pub fn from_quote(quote: QuoteSnapshot, analyst_ratings: AnalystRatingSummary) -> Self {
        let indicators = quote.technical_indicators;
        Self {
            symbol: quote.symbol,
            company_name: None,
            price: quote.price,
            change: quote.change,
            change_percent: quote.change_percent,
            volume: quote.volume,
            market_cap: quote.market_cap,
            open: quote.open,
            high: quote.high,
            low: quote.low,
            previous_close: quote.previous_close,
            pe_ratio: None,
            dividend_yield: None,
            beta: None,
            technical_indicators: TechnicalIndicators {
                rsi: indicators.rsi,
                macd: indicators.macd,
                moving_averages: indicators.moving_averages,
                support: 0.0,
                resistance: 0.0,
            },
            news_sentiment: NewsSentiment::default(),
            analyst_ratings,
        }
    }

    pub fn placeholder(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            ..Default::default()
        }
    }
}

/// Merged per-symbol output of the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedStockRecord {
    pub stock_data: StockData,
    pub edge_data: EdgeScoreSnapshot,
}

impl EnrichedStockRecord {
    /// All-zero record standing in for a symbol with no usable provider data.
    pub fn placeholder(symbol: &str) -> Self {
        Self {
            stock_data: StockData::placeholder(symbol),
            edge_data: EdgeScoreSnapshot::placeholder(symbol),
        }
    }

    /// Spreadsheet-provided names do not count as provider data.
    pub fn is_placeholder(&self) -> bool {
        let mut stock_data = self.stock_data.clone();
        stock_data.company_name = None;
        stock_data == StockData::placeholder(&self.stock_data.symbol)
            && self.edge_data == EdgeScoreSnapshot::placeholder(&self.edge_data.symbol)
    }
}
