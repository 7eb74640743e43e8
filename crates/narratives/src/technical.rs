use crate::{finish, with_thousands};
use enrichment_core::{reported, MacdSignal, StockData};

pub const TECHNICAL_FALLBACK: &str = "Technical analysis shows mixed signals for this stock.";

/// Support or resistance closer than this (percent of price) gets a callout.
const PROXIMITY_PCT: f64 = 5.0;
const STRONG_VOLUME: f64 = 1_000_000.0;

pub fn technical_narrative(stock: &StockData) -> String {
    let indicators = &stock.technical_indicators;
    let mut clauses = Vec::new();

    if let Some(rsi) = reported(indicators.rsi) {
        clauses.push(if rsi > 70.0 {
            format!(
                "RSI at {:.1} indicates overbought conditions, suggesting potential for a pullback",
                rsi
            )
        } else if rsi < 30.0 {
            format!(
                "RSI at {:.1} shows oversold conditions, indicating potential for a bounce",
                rsi
            )
        } else {
            format!(
                "RSI at {:.1} is in neutral territory, showing balanced buying and selling pressure",
                rsi
            )
        });
    }

    if let Some(clause) = moving_average_clause(stock) {
        clauses.push(clause);
    }

    if let Some(clause) = support_resistance_clause(stock) {
        clauses.push(clause);
    }

    if let Some(volume) = reported(stock.volume) {
        clauses.push(format!(
            "Volume of {} shares indicates {} trading activity",
            with_thousands(volume),
            if volume > STRONG_VOLUME { "strong" } else { "moderate" }
        ));
    }

    match indicators.macd {
        MacdSignal::Bullish => {
            clauses.push("MACD signals bullish momentum with positive divergence".to_string())
        }
        MacdSignal::Bearish => {
            clauses.push("MACD indicates bearish momentum with negative divergence".to_string())
        }
        MacdSignal::Neutral => {}
    }

    finish(clauses, TECHNICAL_FALLBACK)
}

fn moving_average_clause(stock: &StockData) -> Option<String> {
    let ma = &stock.technical_indicators.moving_averages;
    let price = reported(stock.price)?;
    let sma50 = reported(ma.sma50)?;
    let sma200 = reported(ma.sma200)?;

    if let Some(sma20) = reported(ma.sma20) {
        let levels = format!(
            "20-day: ${:.2}, 50-day: ${:.2}, 200-day: ${:.2}",
            sma20, sma50, sma200
        );
        return Some(if price > sma20 && sma20 > sma50 && sma50 > sma200 {
            format!(
                "Price at ${:.2} is above all major moving averages ({}), indicating strong bullish momentum",
                price, levels
            )
        } else if price < sma20 && sma20 < sma50 && sma50 < sma200 {
            format!(
                "Price at ${:.2} is below all major moving averages ({}), suggesting bearish pressure",
                price, levels
            )
        } else {
            format!(
                "Mixed signals from moving averages with price at ${:.2} vs {}, indicating potential consolidation",
                price, levels
            )
        });
    }

    // Polygon does not serve a 20-day average; judge against the long averages alone.
    let levels = format!("50-day: ${:.2}, 200-day: ${:.2}", sma50, sma200);
    Some(if price > sma50 && price > sma200 {
        format!(
            "Price at ${:.2} is above both its 50-day and 200-day moving averages ({}), indicating a bullish trend",
            price, levels
        )
    } else if price < sma50 && price < sma200 {
        format!(
            "Price at ${:.2} is below both its 50-day and 200-day moving averages ({}), suggesting a bearish trend",
            price, levels
        )
    } else {
        format!(
            "Price at ${:.2} sits between its 50-day and 200-day moving averages ({}), indicating a mixed trend",
            price, levels
        )
    })
}

fn support_resistance_clause(stock: &StockData) -> Option<String> {
    let indicators = &stock.technical_indicators;
    let support = reported(indicators.support)?;
    let resistance = reported(indicators.resistance)?;
    let price = reported(stock.price)?;

    let support_distance = (price - support) / price * 100.0;
    let resistance_distance = (resistance - price) / price * 100.0;

    if support_distance < PROXIMITY_PCT {
        Some(format!(
            "Price is near support at ${:.2} ({:.1}% away), which could provide a floor",
            support, support_distance
        ))
    } else if resistance_distance < PROXIMITY_PCT {
        Some(format!(
            "Price is near resistance at ${:.2} ({:.1}% away), which could cap upside",
            resistance, resistance_distance
        ))
    } else {
        None
    }
}
