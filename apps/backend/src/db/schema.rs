//! SQLite schema definitions.

/// Schema for the local card store.
pub const SCHEMA: &str = r#"
-- Cards, keyed by their VW-prefixed id
CREATE TABLE IF NOT EXISTS cards (
    id TEXT PRIMARY KEY,
    source_text TEXT NOT NULL,
    target_text TEXT NOT NULL,
    note TEXT NOT NULL DEFAULT '',
    image_link TEXT NOT NULL DEFAULT '',
    created_on TEXT NOT NULL DEFAULT '',
    next_review_on TEXT NOT NULL DEFAULT '',
    tier TEXT NOT NULL DEFAULT 'Easy',
    miss_count INTEGER NOT NULL DEFAULT 0,
    recent_attempts TEXT NOT NULL DEFAULT '[]'
);

-- High-water mark of allocated id ordinals
CREATE TABLE IF NOT EXISTS id_counter (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    next_ordinal INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_cards_next_review ON cards(next_review_on);
"#;

/// Initialize the id counter if not exists.
pub const INIT_ID_COUNTER: &str = r#"
INSERT OR IGNORE INTO id_counter (id, next_ordinal) VALUES (1, 1);
"#;
