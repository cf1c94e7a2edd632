//! Rolling performance history and difficulty-tier suggestions.
//!
//! The tracker only advises. Changing a card's tier is a separate, explicit
//! action taken by the caller.

use crate::types::{AttemptRecord, Card, Tier};
use serde::{Deserialize, Serialize};

/// Number of attempts kept per card.
pub const HISTORY_LIMIT: usize = 5;

/// Number of most recent attempts examined for a suggestion.
pub const WINDOW: usize = 3;

/// Fewer attempts than this in the window yield no suggestion.
pub const MIN_ATTEMPTS: usize = 2;

/// Average similarity a clean streak must beat to suggest an easier tier.
pub const PROMOTE_SIMILARITY: f64 = 0.95;

/// Average similarity a failing streak must stay under to suggest a harder tier.
pub const DEMOTE_SIMILARITY: f64 = 0.5;

/// Proposed move between adjacent tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTransition {
    pub from: Tier,
    pub to: Tier,
}

/// Append an attempt to the card's history (keeping the last [`HISTORY_LIMIT`])
/// and derive a tier suggestion from the last [`WINDOW`] attempts.
pub fn record_and_suggest(card: &mut Card, attempt: AttemptRecord) -> Option<TierTransition> {
    card.recent_attempts.push(attempt);
    if card.recent_attempts.len() > HISTORY_LIMIT {
        let excess = card.recent_attempts.len() - HISTORY_LIMIT;
        card.recent_attempts.drain(..excess);
    }

    suggest(card.tier, &card.recent_attempts)
}

/// Suggest a tier for `current` given an attempt history, oldest first.
pub fn suggest(current: Tier, history: &[AttemptRecord]) -> Option<TierTransition> {
    let recent = &history[history.len().saturating_sub(WINDOW)..];
    if recent.len() < MIN_ATTEMPTS {
        return None;
    }

    let correct_count = recent.iter().filter(|a| a.correct).count();
    let avg_similarity = recent.iter().map(|a| a.similarity).sum::<f64>() / recent.len() as f64;

    let to = if correct_count == recent.len() && avg_similarity > PROMOTE_SIMILARITY {
        current.easier()
    } else if correct_count == 0 && avg_similarity < DEMOTE_SIMILARITY {
        current.harder()
    } else {
        None
    }?;

    (to != current).then_some(TierTransition { from: current, to })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::ReviewDate;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn attempt(correct: bool, similarity: f64) -> AttemptRecord {
        AttemptRecord::new(correct, similarity, Utc.with_ymd_and_hms(2025, 5, 30, 9, 0, 0).unwrap())
    }

    fn card(tier: Tier) -> Card {
        let mut card = Card::new(
            "VW001".into(),
            "Xin chào".into(),
            "Hello".into(),
            ReviewDate::from_dmy(30, 5, 2025).unwrap(),
        );
        card.tier = tier;
        card
    }

    #[test]
    fn test_single_attempt_gives_no_suggestion() {
        let mut card = card(Tier::Hard);
        assert_eq!(record_and_suggest(&mut card, attempt(true, 1.0)), None);
        assert_eq!(card.recent_attempts.len(), 1);
    }

    #[test]
    fn test_clean_streak_suggests_easier() {
        let mut card = card(Tier::Hard);
        card.recent_attempts = vec![attempt(true, 0.97), attempt(true, 0.96)];
        let suggestion = record_and_suggest(&mut card, attempt(true, 1.0));
        assert_eq!(
            suggestion,
            Some(TierTransition {
                from: Tier::Hard,
                to: Tier::Medium
            })
        );
        // Advisory only
        assert_eq!(card.tier, Tier::Hard);
    }

    #[test]
    fn test_failing_streak_suggests_harder() {
        let mut card = card(Tier::Easy);
        card.recent_attempts = vec![attempt(false, 0.1)];
        let suggestion = record_and_suggest(&mut card, attempt(false, 0.2));
        assert_eq!(
            suggestion,
            Some(TierTransition {
                from: Tier::Easy,
                to: Tier::Medium
            })
        );
    }

    #[test]
    fn test_floor_and_ceiling() {
        let mut easy = card(Tier::Easy);
        easy.recent_attempts = vec![attempt(true, 1.0), attempt(true, 1.0)];
        assert_eq!(record_and_suggest(&mut easy, attempt(true, 1.0)), None);

        let mut hard = card(Tier::Hard);
        hard.recent_attempts = vec![attempt(false, 0.0), attempt(false, 0.0)];
        assert_eq!(record_and_suggest(&mut hard, attempt(false, 0.1)), None);
    }

    #[test]
    fn test_mixed_results_give_no_suggestion() {
        let mut card = card(Tier::Medium);
        card.recent_attempts = vec![attempt(true, 1.0), attempt(false, 0.4)];
        assert_eq!(record_and_suggest(&mut card, attempt(true, 1.0)), None);
    }

    #[test]
    fn test_thresholds_are_strict() {
        // All correct but average exactly 0.95 is not enough
        let history = vec![attempt(true, 0.95), attempt(true, 0.95)];
        assert_eq!(suggest(Tier::Medium, &history), None);

        // All wrong but average exactly 0.5 is not enough
        let history = vec![attempt(false, 0.5), attempt(false, 0.5)];
        assert_eq!(suggest(Tier::Medium, &history), None);
    }

    #[test]
    fn test_only_last_three_count() {
        let history = vec![
            attempt(false, 0.0),
            attempt(false, 0.0),
            attempt(true, 1.0),
            attempt(true, 1.0),
            attempt(true, 0.99),
        ];
        assert_eq!(
            suggest(Tier::Medium, &history),
            Some(TierTransition {
                from: Tier::Medium,
                to: Tier::Easy
            })
        );
    }

    #[test]
    fn test_history_is_capped_at_five() {
        let mut card = card(Tier::Medium);
        for i in 0..8 {
            record_and_suggest(&mut card, attempt(i % 2 == 0, i as f64 / 10.0));
        }
        assert_eq!(card.recent_attempts.len(), HISTORY_LIMIT);
        // Oldest dropped first: the survivors are attempts 3..8
        assert_eq!(card.recent_attempts[0].similarity, 0.3);
        assert_eq!(card.recent_attempts[4].similarity, 0.7);
    }
}
