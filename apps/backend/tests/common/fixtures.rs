//! Test fixtures and factory functions for creating test data.

use serde_json::{json, Value};
use vocab_core::{Card, ReviewDate};

/// Session date used throughout the study tests.
pub const TODAY: &str = "30/05/2025";

pub fn today() -> ReviewDate {
    TODAY.parse().expect("fixture date")
}

/// A fresh card due on `next_review_on`.
pub fn card(id: &str, source: &str, target: &str, next_review_on: &str) -> Card {
    let mut card = Card::new(id.into(), source.into(), target.into(), today());
    card.next_review_on = next_review_on.into();
    card
}

/// Two cards due on [`TODAY`] and one due the day after.
pub fn sample_deck() -> Vec<Card> {
    vec![
        card("VW001", "Xin chào", "Hello", TODAY),
        card("VW002", "Cảm ơn", "Thank you", TODAY),
        card("VW003", "Tạm biệt", "Goodbye", "31/05/2025"),
    ]
}

/// Import payload in the remote sheet's column naming, with one incomplete row.
pub fn legacy_import_request() -> Value {
    json!({
        "records": [
            {
                "Id": "VW005",
                "Vietnamese": "Xin chào",
                "English": "Hello",
                "Next_date": TODAY,
                "Status": "Medium",
                "Count": "2"
            },
            {
                "Vietnamese": "Cảm ơn",
                "English": "Thank you",
                "Status": "Impossible"
            },
            {
                "English": "No source"
            }
        ]
    })
}

pub fn start_session_request() -> Value {
    json!({ "today": TODAY })
}
