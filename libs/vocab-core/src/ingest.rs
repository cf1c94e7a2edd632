//! Normalization of loosely typed card records into [`Card`]s, and card id allocation.
//!
//! # Record shape
//! Records may use canonical field names or the legacy sheet columns:
//! ```json
//! {"Id": "VW001", "Vietnamese": "Xin chào", "English": "Hello",
//!  "Next_date": "30/05/2025", "Status": "Easy", "Count": "2"}
//! ```

use crate::dates::ReviewDate;
use crate::error::{CoreError, Result};
use crate::types::{Card, Tier};
use serde::{Deserialize, Serialize};

/// Prefix of every generated card id.
pub const ID_PREFIX: &str = "VW";

/// Largest ordinal the allocator hands out. The high-water mark (one past it)
/// must fit a signed 64-bit column.
pub const MAX_ORDINAL: u64 = i64::MAX as u64 - 1;

/// Count field as it arrives from external sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseCount {
    Number(f64),
    Text(String),
}

impl LooseCount {
    /// Non-negative count, or `0` when the value isn't a usable number.
    pub fn to_count(&self) -> u32 {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        };
        if value.is_finite() && value > 0.0 {
            value.trunc().min(f64::from(u32::MAX)) as u32
        } else {
            0
        }
    }
}

/// A card record before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    #[serde(default, alias = "Id")]
    pub id: Option<String>,
    #[serde(default, alias = "Vietnamese")]
    pub source_text: Option<String>,
    #[serde(default, alias = "English")]
    pub target_text: Option<String>,
    #[serde(default, alias = "Note")]
    pub note: Option<String>,
    #[serde(default, alias = "Image_link")]
    pub image_link: Option<String>,
    #[serde(default, alias = "Created_date")]
    pub created_on: Option<String>,
    #[serde(default, alias = "Next_date")]
    pub next_review_on: Option<String>,
    #[serde(default, alias = "Status")]
    pub tier: Option<String>,
    #[serde(default, alias = "Count")]
    pub miss_count: Option<LooseCount>,
}

/// A record that couldn't become a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRecord {
    /// Position in the input.
    pub index: usize,
    pub reason: String,
}

/// Output of [`normalize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ingested {
    pub cards: Vec<Card>,
    pub rejected: Vec<RejectedRecord>,
}

/// Hands out `VW001`, `VW002`, ... and never reissues an ordinal it has seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    /// Allocator whose next ordinal is `next` (at least 1).
    ///
    /// A `next` past [`MAX_ORDINAL`] leaves the allocator exhausted.
    pub fn starting_at(next: u64) -> Self {
        Self { next: next.max(1) }
    }

    /// Allocator seeded past the largest ordinal among `ids`.
    pub fn seeded<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let mut alloc = Self::default();
        for id in ids {
            alloc.observe(id);
        }
        alloc
    }

    /// Make sure `id` will never be handed out.
    ///
    /// Ids outside the allocator's range can't collide with it and are ignored.
    pub fn observe(&mut self, id: &str) {
        if let Some(n) = ordinal(id) {
            self.next = self.next.max(n + 1);
        }
    }

    /// Next ordinal that would be assigned.
    pub fn peek(&self) -> u64 {
        self.next
    }

    pub fn next_id(&mut self) -> Result<String> {
        if self.next > MAX_ORDINAL {
            return Err(CoreError::IdsExhausted);
        }
        let id = format!("{}{:03}", ID_PREFIX, self.next);
        self.next += 1;
        Ok(id)
    }
}

/// Numeric suffix of a `VW…` id, when it lies in the allocator's range.
pub fn ordinal(id: &str) -> Option<u64> {
    id.strip_prefix(ID_PREFIX)?
        .parse()
        .ok()
        .filter(|n| *n <= MAX_ORDINAL)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Normalize records into cards.
///
/// Missing counts become `0`, missing or unknown tiers become [`Tier::Easy`],
/// missing ids are allocated, and a missing creation date becomes `today`.
/// Records without source or target text are rejected.
pub fn normalize(records: Vec<CardRecord>, today: ReviewDate, ids: &mut IdAllocator) -> Ingested {
    for record in &records {
        if let Some(id) = record.id.as_deref() {
            ids.observe(id.trim());
        }
    }

    let mut out = Ingested::default();
    for (index, record) in records.into_iter().enumerate() {
        let Some(source_text) = non_empty(record.source_text) else {
            out.rejected.push(RejectedRecord {
                index,
                reason: "missing source text".to_string(),
            });
            continue;
        };
        let Some(target_text) = non_empty(record.target_text) else {
            out.rejected.push(RejectedRecord {
                index,
                reason: "missing target text".to_string(),
            });
            continue;
        };

        let id = match non_empty(record.id) {
            Some(id) => id,
            None => match ids.next_id() {
                Ok(id) => id,
                Err(err) => {
                    out.rejected.push(RejectedRecord {
                        index,
                        reason: err.to_string(),
                    });
                    continue;
                }
            },
        };
        let tier = record
            .tier
            .as_deref()
            .and_then(|t| t.trim().parse::<Tier>().ok())
            .unwrap_or_default();

        out.cards.push(Card {
            id,
            source_text,
            target_text,
            note: record.note.unwrap_or_default(),
            image_link: record.image_link.unwrap_or_default(),
            created_on: non_empty(record.created_on).unwrap_or_else(|| today.to_string()),
            next_review_on: record.next_review_on.unwrap_or_default().trim().to_string(),
            tier,
            miss_count: record.miss_count.map(|c| c.to_count()).unwrap_or(0),
            recent_attempts: Vec::new(),
        });
    }

    if !out.rejected.is_empty() {
        tracing::debug!(rejected = out.rejected.len(), "skipped incomplete card records");
    }
    out
}
