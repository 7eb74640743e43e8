use crate::finish;
use enrichment_core::{positive_opt, reported, EdgeScoreSnapshot, StockData};

pub const RISK_FALLBACK: &str = "Risk profile shows no standout factors for this stock.";

pub fn risk_narrative(stock: &StockData, edge: &EdgeScoreSnapshot) -> String {
    let risk = &edge.risk_metrics;
    let mut clauses = Vec::new();

    if let Some(volatility) = reported(risk.volatility) {
        if volatility > 30.0 {
            clauses.push("High volatility indicates significant price swings and increased risk");
        } else if volatility < 15.0 {
            clauses.push("Low volatility suggests stable price action and reduced risk");
        }
    }

    if let Some(beta) = positive_opt(stock.beta) {
        if beta > 1.2 {
            clauses.push("High beta indicates above-market sensitivity to market movements");
        } else if beta < 0.8 {
            clauses.push("Low beta suggests defensive characteristics with below-market sensitivity");
        }
    }

    if let Some(correlation) = reported(risk.correlation_to_spy) {
        clauses.push(if correlation.abs() > 0.7 {
            "High correlation to market suggests limited diversification benefits"
        } else {
            "Low correlation to market provides potential diversification benefits"
        });
    }

    finish(clauses.into_iter().map(String::from).collect(), RISK_FALLBACK)
}
