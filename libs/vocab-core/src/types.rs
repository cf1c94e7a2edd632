//! Core types for the vocabulary trainer.

use crate::dates::ReviewDate;
use crate::error::CoreError;
use crate::tracker::HISTORY_LIMIT;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Difficulty tier of a card, ordered Easy < Medium < Hard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Easy,
    Medium,
    Hard,
}

impl Default for Tier {
    fn default() -> Self {
        Self::Easy
    }
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Easy, Tier::Medium, Tier::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }

    /// One step towards Easy. `None` at the floor.
    pub fn easier(self) -> Option<Self> {
        match self {
            Self::Easy => None,
            Self::Medium => Some(Self::Easy),
            Self::Hard => Some(Self::Medium),
        }
    }

    /// One step towards Hard. `None` at the ceiling.
    pub fn harder(self) -> Option<Self> {
        match self {
            Self::Easy => Some(Self::Medium),
            Self::Medium => Some(Self::Hard),
            Self::Hard => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Easy" => Ok(Self::Easy),
            "Medium" => Ok(Self::Medium),
            "Hard" => Ok(Self::Hard),
            other => Err(CoreError::UnknownTier(other.to_string())),
        }
    }
}

/// One judged answer, folded into a card's recent history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub correct: bool,
    pub similarity: f64,
    pub timestamp: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn new(correct: bool, similarity: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            correct,
            similarity,
            timestamp,
        }
    }
}

/// A vocabulary flashcard.
///
/// Dates are kept in their stored `DD/MM/YYYY` form so that values which fail
/// to parse survive a round trip through the repository untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub source_text: String,
    pub target_text: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub image_link: String,
    pub created_on: String,
    pub next_review_on: String,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default)]
    pub miss_count: u32,
    #[serde(default)]
    pub recent_attempts: Vec<AttemptRecord>,
}

impl Card {
    /// Create a fresh card due on `today`.
    pub fn new(id: String, source_text: String, target_text: String, today: ReviewDate) -> Self {
        Self {
            id,
            source_text,
            target_text,
            note: String::new(),
            image_link: String::new(),
            created_on: today.to_string(),
            next_review_on: today.to_string(),
            tier: Tier::Easy,
            miss_count: 0,
            recent_attempts: Vec::new(),
        }
    }

    /// Merge a partial record into this card. The id never changes and
    /// only the newest [`HISTORY_LIMIT`] attempts are kept.
    pub fn apply(&mut self, patch: &CardPatch) {
        if let Some(v) = &patch.source_text {
            self.source_text = v.clone();
        }
        if let Some(v) = &patch.target_text {
            self.target_text = v.clone();
        }
        if let Some(v) = &patch.note {
            self.note = v.clone();
        }
        if let Some(v) = &patch.image_link {
            self.image_link = v.clone();
        }
        if let Some(v) = &patch.created_on {
            self.created_on = v.clone();
        }
        if let Some(v) = &patch.next_review_on {
            self.next_review_on = v.clone();
        }
        if let Some(v) = patch.tier {
            self.tier = v;
        }
        if let Some(v) = patch.miss_count {
            self.miss_count = v;
        }
        if let Some(v) = &patch.recent_attempts {
            let skip = v.len().saturating_sub(HISTORY_LIMIT);
            self.recent_attempts = v[skip..].to_vec();
        }
    }

    /// Build a card from a patch for an unknown id.
    ///
    /// Returns `None` when source or target text is missing.
    pub fn from_patch(patch: &CardPatch) -> Option<Self> {
        let source_text = patch.source_text.clone().filter(|s| !s.trim().is_empty())?;
        let target_text = patch.target_text.clone().filter(|s| !s.trim().is_empty())?;

        let mut card = Self {
            id: patch.id.clone(),
            source_text,
            target_text,
            note: String::new(),
            image_link: String::new(),
            created_on: String::new(),
            next_review_on: String::new(),
            tier: Tier::Easy,
            miss_count: 0,
            recent_attempts: Vec::new(),
        };
        card.apply(patch);
        Some(card)
    }
}

/// Partial card record identified by `id`: the mutation request sent to the repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardPatch {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_review_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miss_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_attempts: Option<Vec<AttemptRecord>>,
}

impl CardPatch {
    /// Empty patch for `id`.
    pub fn for_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

impl From<&Card> for CardPatch {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id.clone(),
            source_text: Some(card.source_text.clone()),
            target_text: Some(card.target_text.clone()),
            note: Some(card.note.clone()),
            image_link: Some(card.image_link.clone()),
            created_on: Some(card.created_on.clone()),
            next_review_on: Some(card.next_review_on.clone()),
            tier: Some(card.tier),
            miss_count: Some(card.miss_count),
            recent_attempts: Some(card.recent_attempts.clone()),
        }
    }
}
