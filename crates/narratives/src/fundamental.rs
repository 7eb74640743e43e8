use crate::finish;
use enrichment_core::{positive_opt, reported, EdgeScoreSnapshot, StockData};

pub const FUNDAMENTAL_FALLBACK: &str = "Fundamental analysis shows mixed indicators for this stock.";

pub fn fundamental_narrative(stock: &StockData, edge: &EdgeScoreSnapshot) -> String {
    let mut clauses = Vec::new();

    if let Some(pe) = positive_opt(stock.pe_ratio) {
        clauses.push(if pe < 15.0 {
            format!(
                "Trading at an attractive P/E ratio of {:.1}, suggesting potential value opportunity",
                pe
            )
        } else if pe > 25.0 {
            format!(
                "High P/E ratio of {:.1} indicates premium valuation, requiring strong growth to justify",
                pe
            )
        } else {
            format!("P/E ratio of {:.1} is in line with market averages", pe)
        });
    }

    if let Some(dividend_yield) = positive_opt(stock.dividend_yield) {
        clauses.push(format!(
            "Dividend yield of {:.2}% provides income potential",
            dividend_yield
        ));
    }

    if let Some(market_cap) = reported(stock.market_cap) {
        let billions = market_cap / 1_000_000_000.0;
        let tier = if billions > 100.0 {
            "Large-cap"
        } else if billions > 10.0 {
            "Mid-cap"
        } else {
            "Small-cap"
        };
        clauses.push(format!("{} stock with market cap of ${:.1}B", tier, billions));
    }

    if let Some(edge_score) = reported(edge.edge_score) {
        edge_clauses(edge, edge_score, &mut clauses);
    }

    let ratings = &stock.analyst_ratings;
    let total = ratings.total();
    if total > 0 {
        let buy_pct = f64::from(ratings.buy) / f64::from(total) * 100.0;
        clauses.push(format!(
            "Analyst coverage: {} buy, {} hold, {} sell ratings ({:.0}% buy)",
            ratings.buy, ratings.hold, ratings.sell, buy_pct
        ));

        if let (Some(target), Some(price)) =
            (reported(ratings.average_target), reported(stock.price))
        {
            let upside = (target - price) / price * 100.0;
            clauses.push(format!(
                "Average price target of ${:.2} represents {}{:.1}% upside potential",
                target,
                if upside > 0.0 { "+" } else { "" },
                upside
            ));
        }
    }

    let news = &stock.news_sentiment;
    if news.total_articles > 0 && news.total_articles < 100 {
        let articles = f64::from(news.total_articles);
        let bullish_pct = f64::from(news.bullish) / articles * 100.0;
        let bearish_pct = f64::from(news.bearish) / articles * 100.0;
        clauses.push(if bullish_pct > 60.0 {
            format!("News sentiment is bullish with {:.0}% positive coverage", bullish_pct)
        } else if bearish_pct > 60.0 {
            format!("News sentiment is bearish with {:.0}% negative coverage", bearish_pct)
        } else {
            "News sentiment is neutral with balanced coverage".to_string()
        });
    }

    finish(clauses, FUNDAMENTAL_FALLBACK)
}

fn edge_clauses(edge: &EdgeScoreSnapshot, edge_score: f64, clauses: &mut Vec<String>) {
    clauses.push(if edge_score > 80.0 {
        format!(
            "Excellent overall Edge score of {:.2} indicates strong fundamentals across all metrics",
            edge_score
        )
    } else if edge_score > 60.0 {
        format!(
            "Good Edge score of {:.2} shows solid fundamental strength",
            edge_score
        )
    } else {
        format!(
            "Below-average Edge score of {:.2} suggests fundamental challenges",
            edge_score
        )
    });

    let breakdown: Vec<String> = [
        ("Momentum", edge.momentum_score),
        ("Value", edge.value_score),
        ("Growth", edge.growth_score),
        ("Quality", edge.quality_score),
    ]
    .into_iter()
    .filter_map(|(name, score)| reported(score).map(|s| format!("{} {:.2}", name, s)))
    .collect();

    if !breakdown.is_empty() {
        clauses.push(format!("Edge breakdown: {}", breakdown.join(", ")));
    }

    if let Some(overall) = reported(edge.percentile_rankings.overall) {
        if overall > 80.0 {
            clauses.push(format!("Ranks in the top {:.0}% of all stocks", 100.0 - overall));
        } else if overall < 20.0 {
            clauses.push(format!("Ranks in the bottom {:.0}% of all stocks", overall));
        }
    }

    if let Some(rank) = reported(edge.peer_comparison.rank_in_industry) {
        clauses.push(format!("Ranks {} in its industry", rank));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enrichment_core::{AnalystRatingSummary, NewsSentiment, PeerComparison, PercentileRankings};

    fn edge(momentum: f64, value: f64, growth: f64, quality: f64) -> EdgeScoreSnapshot {
        let edge_score = enrichment_core::derive_edge_score([momentum, value, growth, quality]);
        EdgeScoreSnapshot {
            symbol: "AAPL".into(),
            edge_score,
            momentum_score: momentum,
            value_score: value,
            growth_score: growth,
            quality_score: quality,
            percentile_rankings: PercentileRankings {
                overall: edge_score,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_nothing_reported_falls_back() {
        let text = fundamental_narrative(
            &StockData::placeholder("AAPL"),
            &EdgeScoreSnapshot::placeholder("AAPL"),
        );
        assert_eq!(text, FUNDAMENTAL_FALLBACK);
    }

    #[test]
    fn test_edge_breakdown_skips_missing_components() {
        let text = fundamental_narrative(&StockData::placeholder("AAPL"), &edge(80.0, 0.0, 60.0, 0.0));
        assert_eq!(
            text,
            "Good Edge score of 70.00 shows solid fundamental strength. \
             Edge breakdown: Momentum 80.00, Growth 60.00. "
        );
    }

    #[test]
    fn test_percentile_and_industry_rank() {
        let mut snapshot = edge(95.0, 90.0, 0.0, 0.0);
        snapshot.peer_comparison = PeerComparison {
            rank_in_industry: 3.0,
            ..Default::default()
        };
        let text = fundamental_narrative(&StockData::placeholder("AAPL"), &snapshot);
        assert!(text.starts_with("Excellent overall Edge score of 92.50"));
        assert!(text.contains("Ranks in the top 8% of all stocks. "));
        assert!(text.ends_with("Ranks 3 in its industry. "));

        let weak = edge(10.0, 12.0, 0.0, 0.0);
        let text = fundamental_narrative(&StockData::placeholder("AAPL"), &weak);
        assert!(text.starts_with("Below-average Edge score of 11.00"));
        assert!(text.contains("Ranks in the bottom 11% of all stocks"));
    }

    #[test]
    fn test_rank_needs_an_edge_score() {
        let mut snapshot = EdgeScoreSnapshot::placeholder("AAPL");
        snapshot.peer_comparison.rank_in_industry = 4.0;
        assert_eq!(
            fundamental_narrative(&StockData::placeholder("AAPL"), &snapshot),
            FUNDAMENTAL_FALLBACK
        );
    }

    #[test]
    fn test_valuation_clauses_in_order() {
        let stock = StockData {
            symbol: "KO".into(),
            pe_ratio: Some(12.34),
            dividend_yield: Some(3.1),
            market_cap: 265_000_000_000.0,
            ..Default::default()
        };
        assert_eq!(
            fundamental_narrative(&stock, &EdgeScoreSnapshot::placeholder("KO")),
            "Trading at an attractive P/E ratio of 12.3, suggesting potential value opportunity. \
             Dividend yield of 3.10% provides income potential. \
             Large-cap stock with market cap of $265.0B. "
        );
    }

    #[test]
    fn test_negative_ratios_are_not_narrated() {
        let stock = StockData {
            pe_ratio: Some(-12.0),
            dividend_yield: Some(-0.5),
            ..Default::default()
        };
        assert_eq!(
            fundamental_narrative(&stock, &EdgeScoreSnapshot::default()),
            FUNDAMENTAL_FALLBACK
        );
    }

    #[test]
    fn test_market_cap_tiers() {
        let text_for = |cap: f64| {
            let stock = StockData {
                market_cap: cap,
                ..Default::default()
            };
            fundamental_narrative(&stock, &EdgeScoreSnapshot::default())
        };
        assert!(text_for(50.0e9).starts_with("Mid-cap stock with market cap of $50.0B"));
        assert!(text_for(2.5e9).starts_with("Small-cap stock with market cap of $2.5B"));
    }

    #[test]
    fn test_analyst_upside_signs() {
        let mut stock = StockData {
            price: 100.0,
            analyst_ratings: AnalystRatingSummary {
                buy: 1,
                average_target: 120.0,
                high_target: 132.0,
                low_target: 108.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let text = fundamental_narrative(&stock, &EdgeScoreSnapshot::default());
        assert_eq!(
            text,
            "Analyst coverage: 1 buy, 0 hold, 0 sell ratings (100% buy). \
             Average price target of $120.00 represents +20.0% upside potential. "
        );

        stock.analyst_ratings.average_target = 90.0;
        let text = fundamental_narrative(&stock, &EdgeScoreSnapshot::default());
        assert!(text.contains("represents -10.0% upside potential"));

        stock.price = 0.0;
        let text = fundamental_narrative(&stock, &EdgeScoreSnapshot::default());
        assert!(!text.contains("price target"));
    }

    #[test]
    fn test_news_sentiment_window() {
        let mut stock = StockData {
            news_sentiment: NewsSentiment {
                bullish: 7,
                bearish: 1,
                neutral: 2,
                total_articles: 10,
            },
            ..Default::default()
        };
        assert_eq!(
            fundamental_narrative(&stock, &EdgeScoreSnapshot::default()),
            "News sentiment is bullish with 70% positive coverage. "
        );

        stock.news_sentiment.total_articles = 150;
        assert_eq!(
            fundamental_narrative(&stock, &EdgeScoreSnapshot::default()),
            FUNDAMENTAL_FALLBACK
        );
    }

    #[test]
    fn test_idempotent() {
        let stock = StockData {
            pe_ratio: Some(30.0),
            ..Default::default()
        };
        let snapshot = edge(50.0, 40.0, 0.0, 0.0);
        assert_eq!(
            fundamental_narrative(&stock, &snapshot),
            fundamental_narrative(&stock, &snapshot)
        );
    }
}
