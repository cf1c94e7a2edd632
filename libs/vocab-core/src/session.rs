//! Study session state: the due subset, traversal position and per-session progress.
//!
//! A session owns copies of its due cards. Every operation updates those copies
//! first and hands back a [`CardPatch`] for the caller to persist; persistence
//! outcomes never flow back into the session.

use crate::dates::ReviewDate;
use crate::error::{CoreError, Result};
use crate::matching::{self, Comparison, Verdict, HINT_THRESHOLD};
use crate::scheduler::{self, Advance};
use crate::tracker::{self, TierTransition};
use crate::types::{AttemptRecord, Card, CardPatch, Tier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

/// Result of checking one answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutcome {
    pub card_id: String,
    pub verdict: Verdict,
    pub miss_count: u32,
    /// Reference answer, revealed only when the answer was accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Character hint for a wrong answer that was close enough to help.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<Comparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<TierTransition>,
    #[serde(skip)]
    pub patch: CardPatch,
}

/// Result of rescheduling the current card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleOutcome {
    pub card_id: String,
    pub next_review_on: String,
    #[serde(skip)]
    pub patch: CardPatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub index: usize,
    pub completed: usize,
    pub total: usize,
    pub finished: bool,
}

/// One row of the end-of-session table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub id: String,
    pub target_text: String,
    pub source_text: String,
    pub miss_count: u32,
    pub completed: bool,
}

/// A single study session over the cards due on one day.
#[derive(Debug, Clone)]
pub struct StudySession {
    today: ReviewDate,
    cards: Vec<Card>,
    index: usize,
    completed: HashSet<String>,
    finished: bool,
}

impl StudySession {
    /// Start a session: the due subset is fixed here for the session's lifetime.
    pub fn start(deck: &[Card], today: ReviewDate) -> Self {
        let cards = scheduler::select_due(deck, today);
        tracing::debug!(due = cards.len(), deck = deck.len(), %today, "study session started");
        Self {
            today,
            cards,
            index: 0,
            completed: HashSet::new(),
            finished: false,
        }
    }

    pub fn today(&self) -> ReviewDate {
        self.today
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn due_cards(&self) -> &[Card] {
        &self.cards
    }

    /// The card being studied, or `None` once the session is over or had nothing due.
    pub fn current(&self) -> Option<&Card> {
        if self.finished {
            return None;
        }
        self.cards.get(self.index)
    }

    fn current_mut(&mut self) -> Result<&mut Card> {
        if self.finished {
            return Err(CoreError::EmptyDeck);
        }
        self.cards.get_mut(self.index).ok_or(CoreError::EmptyDeck)
    }

    pub fn progress(&self) -> Progress {
        Progress {
            index: self.index,
            completed: self.completed.len(),
            total: self.cards.len(),
            finished: self.finished || self.cards.is_empty(),
        }
    }

    /// Judge `input` against the current card and fold the result into it.
    pub fn check_answer(&mut self, input: &str, now: DateTime<Utc>) -> Result<CheckOutcome> {
        let input = input.trim();
        let card = self.current_mut()?;

        let verdict = matching::judge(input, &card.target_text);
        if !verdict.is_correct {
            card.miss_count += 1;
        }
        let suggestion = tracker::record_and_suggest(
            card,
            AttemptRecord::new(verdict.is_correct, verdict.similarity, now),
        );

        let hint = (!verdict.is_correct && verdict.similarity > HINT_THRESHOLD)
            .then(|| matching::compare(&input.to_lowercase(), &card.target_text.to_lowercase()));

        let outcome = CheckOutcome {
            card_id: card.id.clone(),
            verdict,
            miss_count: card.miss_count,
            answer: verdict.is_correct.then(|| card.target_text.clone()),
            hint,
            suggestion,
            patch: CardPatch {
                miss_count: Some(card.miss_count),
                recent_attempts: Some(card.recent_attempts.clone()),
                ..CardPatch::for_id(card.id.clone())
            },
        };

        if verdict.is_correct && self.completed.insert(outcome.card_id.clone()) {
            tracing::debug!(card_id = %outcome.card_id, "card completed for session");
        }

        Ok(outcome)
    }

    /// Set the current card's tier, on confirmation of a suggestion or as a direct override.
    pub fn set_tier(&mut self, tier: Tier) -> Result<CardPatch> {
        let card = self.current_mut()?;
        card.tier = tier;
        Ok(CardPatch {
            tier: Some(tier),
            ..CardPatch::for_id(card.id.clone())
        })
    }

    /// Push the current card's next review `interval_days` past its current date.
    pub fn schedule(&mut self, interval_days: u32) -> Result<ScheduleOutcome> {
        let today = self.today;
        let card = self.current_mut()?;

        let next = scheduler::reschedule(card, interval_days, today)?;
        card.next_review_on = next.to_string();

        Ok(ScheduleOutcome {
            card_id: card.id.clone(),
            next_review_on: card.next_review_on.clone(),
            patch: CardPatch {
                next_review_on: Some(card.next_review_on.clone()),
                ..CardPatch::for_id(card.id.clone())
            },
        })
    }

    /// Move to the next card, or finish the session after the last one.
    pub fn advance(&mut self) -> Advance {
        if self.finished {
            return Advance::SessionComplete;
        }
        let step = scheduler::advance(self.cards.len(), self.index);
        match step {
            Advance::Next { index } => self.index = index,
            Advance::SessionComplete => self.finished = true,
        }
        step
    }

    /// Move back one card. Returns the new index, or `None` at the first card.
    pub fn previous(&mut self) -> Option<usize> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.finished = false;
        Some(self.index)
    }

    /// End-of-session table over every due card.
    pub fn summary(&self) -> Vec<SummaryRow> {
        self.cards
            .iter()
            .map(|card| SummaryRow {
                id: card.id.clone(),
                target_text: card.target_text.clone(),
                source_text: card.source_text.clone(),
                miss_count: card.miss_count,
                completed: self.completed.contains(&card.id),
            })
            .collect()
    }
}

/// In-flight flag for answer checks on one session.
///
/// A second check attempted while a [`CheckTicket`] is alive is refused, not queued.
#[derive(Debug, Default)]
pub struct CheckGate {
    busy: AtomicBool,
}

impl CheckGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate, or `None` if a check is already in flight.
    pub fn try_enter(&self) -> Option<CheckTicket<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| CheckTicket { gate: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases its [`CheckGate`] when dropped.
#[derive(Debug)]
pub struct CheckTicket<'a> {
    gate: &'a CheckGate,
}

impl Drop for CheckTicket<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}
