// tests/engine_pipeline.rs
//
// End-to-end formatter pass with deterministic generators:
// - mock backend output yields a validated prediction (category, 4 options,
//   forwarded date on or after the reference)
// - malformed output is passed through raw with a warning, never a crash
// - transport failure propagates as an error for the API layer

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use headline_oracle::engine::run_prediction;
use headline_oracle::llm::{MockGenerator, TextGenerator};
use headline_oracle::prediction::OPTION_IDS;

fn reference() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

#[tokio::test]
async fn mock_backend_produces_a_validated_financials_prediction() {
    let result = run_prediction(&MockGenerator, "Fed hints at June rate pause", reference())
        .await
        .expect("mock generation must succeed");

    let prediction = result.prediction.expect("must validate");
    assert!(result.raw_output.is_none());
    assert!(result.warning.is_none());

    assert_eq!(prediction.headline, "Fed hints at June rate pause");
    assert_eq!(prediction.category, "Financials");
    assert!(prediction.question.ends_with('?'));

    // The mock emits 2024-01-01; the date rule must roll it forward.
    assert!(result.date_adjusted);
    let resolved = NaiveDate::parse_from_str(&prediction.date_pattern, "%Y-%m-%d")
        .expect("forwarded pattern is a concrete date");
    assert!(resolved >= reference(), "{resolved} is before the reference");

    assert_eq!(prediction.options.len(), 4);
    let mut ids: Vec<&str> = prediction.options.iter().map(|o| o.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, OPTION_IDS);
}

/// Returns a fixed canned string, valid JSON or not.
struct CannedGenerator(&'static str);

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, _system: &str, _user: &str) -> Result<String> {
        Ok(self.0.to_string())
    }

    fn name(&self) -> &'static str {
        "canned"
    }
}

#[tokio::test]
async fn malformed_output_is_passed_through_with_a_warning() {
    let gen = CannedGenerator("Sorry, I can only answer questions about cooking.");
    let result = run_prediction(&gen, "Fed hints at June rate pause", reference())
        .await
        .expect("malformed output is not a pipeline error");

    assert!(result.prediction.is_none());
    assert_eq!(
        result.raw_output.as_deref(),
        Some("Sorry, I can only answer questions about cooking.")
    );
    let warning = result.warning.expect("warning must explain the rejection");
    assert!(warning.contains("schema violation"), "{warning}");
}

#[tokio::test]
async fn wrong_option_count_is_rejected_by_the_strict_parse_step() {
    let gen = CannedGenerator(
        r#"{"headline":"h","question":"Will it happen?","date_pattern":"today",
            "category":"Financials","source":"",
            "options":[{"id":"A","text":"Yes"},{"id":"B","text":"No"},{"id":"C","text":"Maybe"}]}"#,
    );
    let result = run_prediction(&gen, "h", reference()).await.unwrap();

    assert!(result.prediction.is_none());
    assert!(result.warning.unwrap().contains("expected 4 options"));
}

/// Always fails at the transport layer.
struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _system: &str, _user: &str) -> Result<String> {
        anyhow::bail!("connection reset by peer")
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

#[tokio::test]
async fn transport_failure_propagates_as_an_error() {
    let err = run_prediction(&FailingGenerator, "h", reference())
        .await
        .expect_err("transport failure must surface");
    assert!(format!("{err:#}").contains("text generation failed"));
}
