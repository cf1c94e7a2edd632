//! Repository pattern for card storage.

use crate::db::error::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use vocab_core::{AttemptRecord, Card, CardPatch, Tier};

type Result<T> = std::result::Result<T, DbError>;

/// What an upsert did with a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Updated,
    Inserted,
    /// Unknown id and not enough fields to create a card.
    Skipped,
}

/// Card persistence with upsert-by-id semantics.
pub trait CardRepository {
    /// All cards in insertion order.
    fn list_cards(&self) -> Result<Vec<Card>>;
    fn get_card(&self, id: &str) -> Result<Option<Card>>;
    /// Merge `patch` into the card with the same id, or insert it if the id is unknown.
    fn upsert_card(&self, patch: &CardPatch) -> Result<UpsertOutcome>;
    /// Returns whether a card was removed.
    fn delete_card(&self, id: &str) -> Result<bool>;
    /// Persisted id high-water mark: the next ordinal to hand out.
    fn next_ordinal(&self) -> Result<u64>;
    fn save_next_ordinal(&self, next: u64) -> Result<()>;
}

/// SQLite-backed repository.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Open database at path, creating if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(super::schema::SCHEMA)?;
        self.conn.execute_batch(super::schema::INIT_ID_COUNTER)?;
        Ok(())
    }

    fn insert_card(&self, card: &Card) -> Result<()> {
        self.conn.execute(
            "INSERT INTO cards (id, source_text, target_text, note, image_link, created_on, next_review_on, tier, miss_count, recent_attempts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                card.id,
                card.source_text,
                card.target_text,
                card.note,
                card.image_link,
                card.created_on,
                card.next_review_on,
                card.tier.as_str(),
                card.miss_count,
                serde_json::to_string(&card.recent_attempts)?,
            ],
        )?;
        Ok(())
    }

    fn update_card(&self, card: &Card) -> Result<()> {
        self.conn.execute(
            "UPDATE cards SET source_text = ?2, target_text = ?3, note = ?4, image_link = ?5,
                 created_on = ?6, next_review_on = ?7, tier = ?8, miss_count = ?9, recent_attempts = ?10
             WHERE id = ?1",
            params![
                card.id,
                card.source_text,
                card.target_text,
                card.note,
                card.image_link,
                card.created_on,
                card.next_review_on,
                card.tier.as_str(),
                card.miss_count,
                serde_json::to_string(&card.recent_attempts)?,
            ],
        )?;
        Ok(())
    }
}

const CARD_COLUMNS: &str = "id, source_text, target_text, note, image_link, created_on, next_review_on, tier, miss_count, recent_attempts";

/// Raw column values before decoding.
struct CardRow {
    id: String,
    source_text: String,
    target_text: String,
    note: String,
    image_link: String,
    created_on: String,
    next_review_on: String,
    tier: String,
    miss_count: u32,
    recent_attempts: String,
}

impl CardRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            source_text: row.get(1)?,
            target_text: row.get(2)?,
            note: row.get(3)?,
            image_link: row.get(4)?,
            created_on: row.get(5)?,
            next_review_on: row.get(6)?,
            tier: row.get(7)?,
            miss_count: row.get(8)?,
            recent_attempts: row.get(9)?,
        })
    }

    fn into_card(self) -> Result<Card> {
        let tier = self.tier.parse::<Tier>().unwrap_or_else(|_| {
            tracing::warn!(card_id = %self.id, tier = %self.tier, "unknown stored tier, using Easy");
            Tier::Easy
        });
        let recent_attempts: Vec<AttemptRecord> = serde_json::from_str(&self.recent_attempts)?;

        Ok(Card {
            id: self.id,
            source_text: self.source_text,
            target_text: self.target_text,
            note: self.note,
            image_link: self.image_link,
            created_on: self.created_on,
            next_review_on: self.next_review_on,
            tier,
            miss_count: self.miss_count,
            recent_attempts,
        })
    }
}

impl CardRepository for SqliteRepository {
    fn list_cards(&self) -> Result<Vec<Card>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {CARD_COLUMNS} FROM cards ORDER BY rowid"))?;
        let rows = stmt
            .query_map([], CardRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(CardRow::into_card).collect()
    }

    fn get_card(&self, id: &str) -> Result<Option<Card>> {
        self.conn
            .query_row(
                &format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = ?1"),
                params![id],
                CardRow::from_row,
            )
            .optional()?
            .map(CardRow::into_card)
            .transpose()
    }

    fn upsert_card(&self, patch: &CardPatch) -> Result<UpsertOutcome> {
        if patch.id.trim().is_empty() {
            return Err(DbError::InvalidData("card id is empty".to_string()));
        }

        if let Some(mut card) = self.get_card(&patch.id)? {
            card.apply(patch);
            self.update_card(&card)?;
            return Ok(UpsertOutcome::Updated);
        }

        match Card::from_patch(patch) {
            Some(card) => {
                self.insert_card(&card)?;
                Ok(UpsertOutcome::Inserted)
            }
            None => {
                tracing::warn!(card_id = %patch.id, "patch for unknown card lacks texts, skipped");
                Ok(UpsertOutcome::Skipped)
            }
        }
    }

    fn delete_card(&self, id: &str) -> Result<bool> {
        let count = self
            .conn
            .execute("DELETE FROM cards WHERE id = ?1", params![id])?;
        Ok(count > 0)
    }

    fn next_ordinal(&self) -> Result<u64> {
        let next: i64 = self
            .conn
            .query_row("SELECT next_ordinal FROM id_counter WHERE id = 1", [], |row| {
                row.get(0)
            })?;
        u64::try_from(next).map_err(|_| DbError::InvalidData(format!("negative id ordinal {next}")))
    }

    fn save_next_ordinal(&self, next: u64) -> Result<()> {
        let next = i64::try_from(next)
            .map_err(|_| DbError::InvalidData(format!("id ordinal {next} out of range")))?;
        // Never lower the high-water mark
        self.conn.execute(
            "UPDATE id_counter SET next_ordinal = MAX(next_ordinal, ?1) WHERE id = 1",
            params![next],
        )?;
        Ok(())
    }
}
