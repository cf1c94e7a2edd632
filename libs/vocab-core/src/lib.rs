//! Scoring and scheduling core for the vocabulary trainer.
//!
//! Provides:
//! - Answer matching (Levenshtein similarity, positional character diff)
//! - The correctness policy for typed answers
//! - Rolling performance tracking with difficulty-tier suggestions
//! - Due-card selection and review rescheduling
//! - Card ingestion and id allocation
//! - Study session state

pub mod dates;
pub mod error;
pub mod ingest;
pub mod matching;
pub mod scheduler;
pub mod session;
pub mod tracker;
pub mod types;

pub use dates::ReviewDate;
pub use error::{CoreError, Result};
pub use ingest::{normalize, CardRecord, IdAllocator, Ingested, RejectedRecord};
pub use matching::{char_diff, compare, judge, similarity, CharDiff, Comparison, DiffTag, Verdict};
pub use scheduler::{advance, reschedule, select_due, validate_interval, Advance};
pub use session::{CheckGate, CheckOutcome, CheckTicket, Progress, ScheduleOutcome, StudySession, SummaryRow};
pub use tracker::{record_and_suggest, TierTransition};
pub use types::{AttemptRecord, Card, CardPatch, Tier};
