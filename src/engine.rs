// src/engine.rs
//! Prediction Formatter orchestration: one linear pass from a cleaned
//! headline to a validated prediction. On a schema violation the raw model
//! text is surfaced with a warning instead of crashing or re-prompting.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::llm::TextGenerator;
use crate::news::anon_hash;
use crate::prediction::{self, PredictionResponse};
use crate::prompt;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("predictions_total", "Prediction formatter invocations.");
        describe_counter!(
            "schema_violations_total",
            "Model outputs rejected by the strict schema validator."
        );
    });
}

/// Outcome of one formatter pass. Exactly one of `prediction` / `raw_output`
/// is populated; `warning` accompanies `raw_output`.
#[derive(Debug, Clone, Serialize)]
pub struct FormatterResult {
    pub prediction: Option<PredictionResponse>,
    pub raw_output: Option<String>,
    pub warning: Option<String>,
    /// True when a past `date_pattern` was rolled forward.
    pub date_adjusted: bool,
}

/// Invoke the backend once with the fixed instruction and the headline, then
/// parse, roll dates forward, and validate. Transport failures propagate as
/// errors for the API layer to surface; malformed output does not.
pub async fn run_prediction(
    generator: &dyn TextGenerator,
    headline: &str,
    reference: NaiveDate,
) -> Result<FormatterResult> {
    ensure_metrics_described();
    tracing::debug!(
        id = %anon_hash(headline),
        provider = generator.name(),
        %reference,
        "prediction requested"
    );

    let instruction = prompt::build_instruction(reference);
    let raw = generator
        .generate(&instruction, headline)
        .await
        .context("text generation failed")?;
    counter!("predictions_total").increment(1);

    let mut date_adjusted = false;
    let rejected = match prediction::extract_json(&raw) {
        Ok(mut resp) => {
            date_adjusted = prediction::enforce_date_rule(&mut resp, reference);
            match prediction::validate(&resp, reference) {
                Ok(()) => {
                    return Ok(FormatterResult {
                        prediction: Some(resp),
                        raw_output: None,
                        warning: None,
                        date_adjusted,
                    });
                }
                Err(e) => e,
            }
        }
        Err(e) => e,
    };

    counter!("schema_violations_total").increment(1);
    tracing::warn!(
        provider = generator.name(),
        error = %rejected,
        "model output failed schema validation; passing through raw text"
    );
    Ok(FormatterResult {
        prediction: None,
        raw_output: Some(raw),
        warning: Some(rejected.to_string()),
        date_adjusted,
    })
}
