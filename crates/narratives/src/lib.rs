//! Plain-English commentary over an enriched record.
//!
//! Every narrator is a pure function. A field is only talked about when it was
//! actually reported (see [`enrichment_core::reported`]); each satisfied clause
//! ends in ". " and a narrator with nothing to say returns its fallback sentence.

pub mod fundamental;
pub mod risk;
pub mod technical;

pub use fundamental::fundamental_narrative;
pub use risk::risk_narrative;
pub use technical::technical_narrative;

/// Concatenate clauses, or fall back when none applied.
pub(crate) fn finish(clauses: Vec<String>, fallback: &str) -> String {
    if clauses.is_empty() {
        return fallback.to_string();
    }
    clauses.into_iter().map(|c| format!("{}. ", c)).collect()
}

/// Whole number with comma thousands separators, e.g. `1234567.4` -> `1,234,567`.
pub fn with_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
