// src/prediction.rs
//! PredictionResponse schema, tolerant JSON extraction from free-form model
//! output, strict validation, and the date-forwarding rule.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::OracleError;
use crate::prompt::CATEGORIES;

pub const OPTION_IDS: [&str; 4] = ["A", "B", "C", "D"];

const DATE_FMT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChoiceOption {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PredictionResponse {
    pub headline: String,
    pub question: String,
    pub date_pattern: String,
    pub category: String,
    /// Cleaned publisher name; may legitimately be empty.
    #[serde(default)]
    pub source: String,
    pub options: Vec<ChoiceOption>,
}

/// Resolution timeframe of a prediction: a relative term or an absolute date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePattern {
    Today,
    ThisWeek,
    On(NaiveDate),
}

impl DatePattern {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "today" => Some(DatePattern::Today),
            "this week" => Some(DatePattern::ThisWeek),
            _ => NaiveDate::parse_from_str(trimmed, DATE_FMT)
                .ok()
                .map(DatePattern::On),
        }
    }
}

/// Pull the JSON object out of free-form model text (code fences, surrounding
/// prose) and parse it strictly.
pub fn extract_json(raw: &str) -> Result<PredictionResponse, OracleError> {
    let candidate = json_candidate(raw).ok_or_else(|| {
        OracleError::SchemaViolation("no JSON object found in model output".to_string())
    })?;
    serde_json::from_str(candidate)
        .map_err(|e| OracleError::SchemaViolation(format!("invalid JSON: {e}")))
}

fn json_candidate(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end >= start).then(|| &raw[start..=end])
}

/// Roll a past date forward to its nearest future occurrence (same month and
/// day, first year on or after the reference that has that calendar day).
pub fn roll_forward(date: NaiveDate, reference: NaiveDate) -> NaiveDate {
    if date >= reference {
        return date;
    }
    let mut year = reference.year();
    loop {
        if let Some(candidate) = NaiveDate::from_ymd_opt(year, date.month(), date.day()) {
            if candidate >= reference {
                return candidate;
            }
        }
        year += 1;
    }
}

/// Apply the date rule in place: a concrete `date_pattern` before the
/// reference date is moved forward. Returns true when the date moved.
pub fn enforce_date_rule(resp: &mut PredictionResponse, reference: NaiveDate) -> bool {
    if let Some(DatePattern::On(date)) = DatePattern::parse(&resp.date_pattern) {
        if date < reference {
            let rolled = roll_forward(date, reference);
            resp.date_pattern = rolled.format(DATE_FMT).to_string();
            return true;
        }
    }
    false
}

/// Strict schema validation. Every failed rule is named in the error.
pub fn validate(resp: &PredictionResponse, reference: NaiveDate) -> Result<(), OracleError> {
    let violation = |msg: String| Err(OracleError::SchemaViolation(msg));

    if resp.headline.trim().is_empty() {
        return violation("headline is empty".to_string());
    }
    if resp.question.trim().is_empty() {
        return violation("question is empty".to_string());
    }

    match DatePattern::parse(&resp.date_pattern) {
        None => {
            return violation(format!(
                "date_pattern {:?} is not \"today\", \"this week\" or YYYY-MM-DD",
                resp.date_pattern
            ));
        }
        Some(DatePattern::On(date)) if date < reference => {
            return violation(format!(
                "date_pattern {date} precedes the reference date {reference}"
            ));
        }
        Some(_) => {}
    }

    if !CATEGORIES.contains(&resp.category.as_str()) {
        return violation(format!("category {:?} is not in the closed set", resp.category));
    }

    if resp.options.len() != OPTION_IDS.len() {
        return violation(format!("expected 4 options, got {}", resp.options.len()));
    }
    let mut ids: Vec<&str> = resp.options.iter().map(|o| o.id.as_str()).collect();
    ids.sort_unstable();
    if ids != OPTION_IDS {
        return violation(format!("option ids must be A..D, got {ids:?}"));
    }
    if resp.options.iter().any(|o| o.text.trim().is_empty()) {
        return violation("option text is empty".to_string());
    }

    Ok(())
}
