// tests/prediction_schema.rs
//
// Strict validator contract:
// - wrong option count and wrong id set are rejected
// - a well-formed response with ids {A,B,C,D} is accepted
// - a concrete past date_pattern is rejected by validate, and rolled forward
//   by the date rule before validation in the pipeline

use chrono::NaiveDate;
use headline_oracle::prediction::{
    enforce_date_rule, extract_json, roll_forward, validate, PredictionResponse,
};
use headline_oracle::OracleError;

fn reference() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

fn well_formed(options: &[(&str, &str)]) -> PredictionResponse {
    let body = serde_json::json!({
        "headline": "Fed hints at June rate pause",
        "question": "Will the Fed announce a rate pause in June?",
        "date_pattern": "2025-06-18",
        "category": "Financials",
        "source": "Reuters",
        "options": options
            .iter()
            .map(|(id, text)| serde_json::json!({"id": id, "text": text}))
            .collect::<Vec<_>>(),
    });
    serde_json::from_value(body).expect("fixture must deserialize")
}

const FOUR: [(&str, &str); 4] = [
    ("A", "Pause announced"),
    ("B", "Rate hike instead"),
    ("C", "Rate cut instead"),
    ("D", "No decision in June"),
];

#[test]
fn four_options_with_ids_a_to_d_are_accepted() {
    let resp = well_formed(&FOUR);
    validate(&resp, reference()).expect("well-formed response must pass");
}

#[test]
fn three_options_are_rejected() {
    let resp = well_formed(&FOUR[..3]);
    let err = validate(&resp, reference()).expect_err("3 options must fail");
    assert!(err.to_string().contains("expected 4 options"), "{err}");
}

#[test]
fn duplicate_ids_are_rejected_even_with_four_entries() {
    let resp = well_formed(&[
        ("A", "Pause announced"),
        ("B", "Rate hike instead"),
        ("C", "Rate cut instead"),
        ("C", "No decision in June"),
    ]);
    let err = validate(&resp, reference()).expect_err("id set mismatch must fail");
    assert!(matches!(err, OracleError::SchemaViolation(_)));
    assert!(err.to_string().contains("option ids"), "{err}");
}

#[test]
fn category_outside_the_closed_set_is_rejected() {
    let mut resp = well_formed(&FOUR);
    resp.category = "Markets".to_string();
    let err = validate(&resp, reference()).expect_err("unknown category must fail");
    assert!(err.to_string().contains("closed set"), "{err}");
}

#[test]
fn past_concrete_date_is_rejected_by_the_validator() {
    let mut resp = well_formed(&FOUR);
    resp.date_pattern = "2024-01-01".to_string();
    let err = validate(&resp, reference()).expect_err("past date must fail");
    assert!(err.to_string().contains("precedes"), "{err}");
}

#[test]
fn relative_terms_pass_the_date_rule() {
    for term in ["today", "this week"] {
        let mut resp = well_formed(&FOUR);
        resp.date_pattern = term.to_string();
        validate(&resp, reference()).expect("relative terms are always valid");
    }
}

#[test]
fn date_rule_rolls_a_past_guess_forward_not_through() {
    let mut resp = well_formed(&FOUR);
    resp.date_pattern = "2024-01-01".to_string();

    let moved = enforce_date_rule(&mut resp, reference());
    assert!(moved, "past date must be adjusted");
    assert_ne!(resp.date_pattern, "2024-01-01");

    let rolled = NaiveDate::parse_from_str(&resp.date_pattern, "%Y-%m-%d").unwrap();
    assert!(rolled >= reference(), "rolled date {rolled} is still in the past");
    validate(&resp, reference()).expect("adjusted response must now pass");
}

#[test]
fn roll_forward_keeps_month_and_day() {
    let rolled = roll_forward(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        reference(),
    );
    // 2025-01-01 is still before the reference, so the next occurrence is 2026.
    assert_eq!(rolled, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());

    let untouched = roll_forward(NaiveDate::from_ymd_opt(2025, 7, 4).unwrap(), reference());
    assert_eq!(untouched, NaiveDate::from_ymd_opt(2025, 7, 4).unwrap());
}

#[test]
fn extract_json_handles_fenced_and_prose_wrapped_output() {
    let object = serde_json::to_string(&well_formed(&FOUR)).unwrap();

    let fenced = format!("```json\n{object}\n```");
    extract_json(&fenced).expect("fenced JSON must parse");

    let prose = format!("Here is your prediction question:\n{object}\nLet me know!");
    extract_json(&prose).expect("prose-wrapped JSON must parse");

    let err = extract_json("I cannot help with that.").expect_err("no object present");
    assert!(matches!(err, OracleError::SchemaViolation(_)));
}

#[test]
fn extract_json_rejects_missing_required_fields() {
    let err = extract_json(r#"{"options":[{"id":"A","text":"x"}]}"#)
        .expect_err("missing fields must fail");
    assert!(matches!(err, OracleError::SchemaViolation(_)));
}
