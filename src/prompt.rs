// src/prompt.rs
//! The fixed instruction template sent to every backend: extraction rule,
//! question rule, option rule, the closed category set, and the date rule
//! anchored to the supplied reference date.

use chrono::NaiveDate;

/// Closed category set. Exactly these labels are accepted back from the model.
pub const CATEGORIES: [&str; 13] = [
    "Politics",
    "Geopolitics",
    "Financials",
    "Economy",
    "Business",
    "Technology",
    "Science",
    "Health",
    "Sports",
    "Entertainment",
    "Crypto",
    "Climate",
    "Culture",
];

pub fn build_instruction(reference_date: NaiveDate) -> String {
    let date = reference_date.format("%Y-%m-%d");
    let categories = CATEGORIES.join(", ");
    format!(
        r#"You turn news headlines into structured prediction questions. Today's date is {date}.

From the headline the user gives you, produce ONE prediction question as a single JSON object with exactly these fields:

- "headline": the original headline text.
- "question": one well-formed interrogative sentence about an outcome that can be verified later. Use only entities, numbers and dates that literally appear in the headline; never invent values.
- "date_pattern": when the question resolves. One of "today", "this week", or a concrete date in YYYY-MM-DD format. A concrete date must never be before {date}; if your natural guess falls in the past, move it forward to the nearest future occurrence.
- "category": exactly one of: {categories}.
- "source": the publisher name if the headline carries one, with separators removed, otherwise an empty string.
- "options": exactly 4 objects of the form {{"id": "...", "text": "..."}} with ids "A", "B", "C", "D". The options must be mutually exclusive and together cover every plausible outcome of the question.

Strip any source attribution or trailing extra information from the headline before writing the question. Respond with the JSON object only, no code fences and no commentary."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_embeds_reference_date_and_categories() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let text = build_instruction(date);
        assert!(text.contains("2025-06-01"));
        for category in CATEGORIES {
            assert!(text.contains(category), "missing category {category}");
        }
        for id in ["\"A\"", "\"B\"", "\"C\"", "\"D\""] {
            assert!(text.contains(id), "missing option id {id}");
        }
    }

    #[test]
    fn category_set_is_exactly_thirteen_unique_labels() {
        let mut set = std::collections::BTreeSet::new();
        for c in CATEGORIES {
            set.insert(c);
        }
        assert_eq!(set.len(), 13);
        assert!(set.contains("Financials"));
    }
}
