//! Due-card selection, review rescheduling and session traversal.

use crate::dates::{self, ReviewDate};
use crate::error::{CoreError, Result};
use crate::types::{Card, Tier};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Accepted review intervals, in days.
pub const INTERVAL_RANGE: RangeInclusive<u32> = 1..=365;

/// Cards whose next-review date is exactly `today` and whose tier is valid.
///
/// Cards with other or unparseable dates are left out silently.
pub fn select_due(deck: &[Card], today: ReviewDate) -> Vec<Card> {
    let today = today.to_string();
    deck.iter()
        .filter(|card| card.next_review_on == today && Tier::ALL.contains(&card.tier))
        .cloned()
        .collect()
}

/// Validate a requested interval at the boundary: a whole number of days in [`INTERVAL_RANGE`].
pub fn validate_interval(days: f64) -> Result<u32> {
    let invalid = || CoreError::InvalidInterval {
        value: days.to_string(),
    };

    if !days.is_finite() || days.fract() != 0.0 {
        return Err(invalid());
    }
    if days < f64::from(*INTERVAL_RANGE.start()) || days > f64::from(*INTERVAL_RANGE.end()) {
        return Err(invalid());
    }
    Ok(days as u32)
}

/// Compute a card's new next-review date: its current one (or `today` when
/// that doesn't parse) plus `interval_days`.
pub fn reschedule(card: &Card, interval_days: u32, today: ReviewDate) -> Result<ReviewDate> {
    if !INTERVAL_RANGE.contains(&interval_days) {
        return Err(CoreError::InvalidInterval {
            value: interval_days.to_string(),
        });
    }

    let base = dates::parse_or(&card.next_review_on, today);
    base.plus_days(interval_days)
        .ok_or_else(|| CoreError::DateOutOfRange {
            value: base.to_string(),
        })
}

/// Result of stepping forward through the due subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Advance {
    Next { index: usize },
    SessionComplete,
}

/// Step to the card after `current_index`, or signal completion at the end.
pub fn advance(due_len: usize, current_index: usize) -> Advance {
    if current_index + 1 < due_len {
        Advance::Next {
            index: current_index + 1,
        }
    } else {
        Advance::SessionComplete
    }
}
