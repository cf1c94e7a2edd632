//! Card store: the local repository, id allocation and remote replication behind one lock.
//!
//! SQLite calls are blocking, so every operation runs on tokio's blocking
//! pool while holding the lock.

use std::sync::Arc;
use tokio::sync::Mutex;
use vocab_core::{normalize, Card, CardPatch, CardRecord, IdAllocator, Ingested, ReviewDate};

use crate::db::{CardRepository, DbError, UpsertOutcome};
use crate::services::replication::RemoteReplicator;

type Result<T> = std::result::Result<T, DbError>;

/// Fields for a card created through the API.
#[derive(Debug, Clone, Default)]
pub struct NewCard {
    pub source_text: String,
    pub target_text: String,
    pub note: String,
    pub image_link: String,
}

struct StoreInner {
    repo: Box<dyn CardRepository + Send>,
    ids: IdAllocator,
    remote: Option<Arc<RemoteReplicator>>,
}

impl StoreInner {
    fn allocate_id(&mut self) -> Result<String> {
        let id = self.ids.next_id()?;
        self.repo.save_next_ordinal(self.ids.peek())?;
        Ok(id)
    }

    /// Queue the current deck for the remote copy.
    fn replicate(&self) {
        let Some(remote) = &self.remote else {
            return;
        };
        match self.repo.list_cards() {
            Ok(cards) => remote.spawn_replace(cards),
            Err(e) => tracing::warn!(error = %e, "could not snapshot cards for remote sync"),
        }
    }
}

/// Shared handle on the deck.
pub struct CardStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl CardStore {
    /// Wrap a repository. The id allocator starts past both the persisted
    /// high-water mark and every stored id.
    pub fn new<R>(repo: R, remote: Option<Arc<RemoteReplicator>>) -> Result<Self>
    where
        R: CardRepository + Send + 'static,
    {
        let cards = repo.list_cards()?;
        let mut ids = IdAllocator::starting_at(repo.next_ordinal()?);
        for card in &cards {
            ids.observe(&card.id);
        }
        tracing::info!(cards = cards.len(), next_ordinal = ids.peek(), "card store opened");

        Ok(Self {
            inner: Arc::new(Mutex::new(StoreInner {
                repo: Box::new(repo),
                ids,
                remote,
            })),
        })
    }

    /// Run `work` against the locked store on the blocking pool.
    async fn with_inner<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&mut StoreInner) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let mut inner = Arc::clone(&self.inner).lock_owned().await;
        tokio::task::spawn_blocking(move || work(&mut inner)).await?
    }

    /// Every card in insertion order.
    pub async fn snapshot(&self) -> Result<Vec<Card>> {
        self.with_inner(|inner| inner.repo.list_cards()).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Card>> {
        let id = id.to_string();
        self.with_inner(move |inner| inner.repo.get_card(&id)).await
    }

    /// Apply a mutation produced by a study session.
    ///
    /// Never fails: the in-memory session state is already updated, so local
    /// write errors are logged and the remote copy is refreshed in the background.
    pub async fn persist(&self, patch: &CardPatch) {
        let card_id = patch.id.clone();
        let patch = patch.clone();
        let result = self
            .with_inner(move |inner| {
                if inner.repo.upsert_card(&patch)? != UpsertOutcome::Skipped {
                    inner.replicate();
                }
                Ok(())
            })
            .await;
        if let Err(e) = result {
            tracing::error!(%card_id, error = %e, "failed to persist card locally");
        }
    }

    /// Create a card with a fresh id, due today.
    pub async fn create(&self, new: NewCard, today: ReviewDate) -> Result<Card> {
        self.with_inner(move |inner| {
            let id = inner.allocate_id()?;

            let mut card = Card::new(id, new.source_text, new.target_text, today);
            card.note = new.note;
            card.image_link = new.image_link;
            inner.repo.upsert_card(&CardPatch::from(&card))?;
            tracing::info!(card_id = %card.id, "card created");

            inner.replicate();
            Ok(card)
        })
        .await
    }

    /// Normalize loose records and upsert every resulting card.
    pub async fn import(&self, records: Vec<CardRecord>, today: ReviewDate) -> Result<Ingested> {
        self.with_inner(move |inner| {
            let ingested = normalize(records, today, &mut inner.ids);
            inner.repo.save_next_ordinal(inner.ids.peek())?;
            for card in &ingested.cards {
                inner.repo.upsert_card(&CardPatch::from(card))?;
            }
            tracing::info!(
                imported = ingested.cards.len(),
                rejected = ingested.rejected.len(),
                "cards imported"
            );

            inner.replicate();
            Ok(ingested)
        })
        .await
    }

    /// Upsert a patch and return the stored card, or `None` when the id is
    /// unknown and the patch can't create one.
    pub async fn update(&self, patch: CardPatch) -> Result<Option<Card>> {
        self.with_inner(move |inner| {
            // The mark goes first so no stored id is ever below it
            let mut ids = inner.ids.clone();
            ids.observe(&patch.id);
            inner.repo.save_next_ordinal(ids.peek())?;
            inner.ids = ids;

            if inner.repo.upsert_card(&patch)? == UpsertOutcome::Skipped {
                return Ok(None);
            }
            inner.replicate();
            inner.repo.get_card(&patch.id)
        })
        .await
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.with_inner(move |inner| {
            let removed = inner.repo.delete_card(&id)?;
            if removed {
                tracing::info!(card_id = %id, "card deleted");
                inner.replicate();
            }
            Ok(removed)
        })
        .await
    }

    /// Fill an empty local store from the remote copy. Returns the number of cards loaded.
    pub async fn seed_from_remote(&self, today: ReviewDate) -> usize {
        let Some(remote) = self.inner.lock().await.remote.clone() else {
            return 0;
        };
        match self.snapshot().await {
            Ok(cards) if cards.is_empty() => {}
            Ok(_) => return 0,
            Err(e) => {
                tracing::warn!(error = %e, "could not read local store before seeding");
                return 0;
            }
        }

        let records = match remote.fetch_all().await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, url = remote.url(), "could not fetch remote deck");
                return 0;
            }
        };

        let result = self
            .with_inner(move |inner| {
                let ingested = normalize(records, today, &mut inner.ids);
                inner.repo.save_next_ordinal(inner.ids.peek())?;
                let mut loaded = 0;
                for card in &ingested.cards {
                    match inner.repo.upsert_card(&CardPatch::from(card)) {
                        Ok(_) => loaded += 1,
                        Err(e) => tracing::warn!(card_id = %card.id, error = %e, "skipped remote card"),
                    }
                }
                Ok(loaded)
            })
            .await;

        match result {
            Ok(loaded) => {
                tracing::info!(loaded, "local store seeded from remote");
                loaded
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not seed local store from remote");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteRepository;
    use pretty_assertions::assert_eq;
    use vocab_core::Tier;

    fn today() -> ReviewDate {
        ReviewDate::from_dmy(30, 5, 2025).unwrap()
    }

    fn store() -> CardStore {
        CardStore::new(SqliteRepository::open_in_memory().unwrap(), None).unwrap()
    }

    fn new_card(source: &str, target: &str) -> NewCard {
        NewCard {
            source_text: source.into(),
            target_text: target.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_allocates_sequential_ids() {
        let store = store();
        let a = store.create(new_card("Xin chào", "Hello"), today()).await.unwrap();
        let b = store.create(new_card("Cảm ơn", "Thank you"), today()).await.unwrap();
        assert_eq!(a.id, "VW001");
        assert_eq!(b.id, "VW002");
        assert_eq!(b.next_review_on, "30/05/2025");
        assert_eq!(b.tier, Tier::Easy);
    }

    #[tokio::test]
    async fn test_deleted_ids_are_not_reissued() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let store = CardStore::new(repo, None).unwrap();
        store.create(new_card("Xin chào", "Hello"), today()).await.unwrap();
        let last = store.create(new_card("Cảm ơn", "Thank you"), today()).await.unwrap();
        assert!(store.delete(&last.id).await.unwrap());

        let next = store.create(new_card("Tạm biệt", "Goodbye"), today()).await.unwrap();
        assert_eq!(next.id, "VW003");
    }

    #[tokio::test]
    async fn test_allocator_seeded_from_existing_cards() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let card = Card::new("VW041".into(), "Xin chào".into(), "Hello".into(), today());
        repo.upsert_card(&CardPatch::from(&card)).unwrap();

        let store = CardStore::new(repo, None).unwrap();
        let created = store.create(new_card("Cảm ơn", "Thank you"), today()).await.unwrap();
        assert_eq!(created.id, "VW042");
    }

    #[tokio::test]
    async fn test_persist_merges_patch() {
        let store = store();
        let card = store.create(new_card("Xin chào", "Hello"), today()).await.unwrap();
        store
            .persist(&CardPatch {
                miss_count: Some(3),
                ..CardPatch::for_id(card.id.clone())
            })
            .await;
        assert_eq!(store.get(&card.id).await.unwrap().unwrap().miss_count, 3);
    }

    #[tokio::test]
    async fn test_update_unknown_partial_returns_none() {
        let store = store();
        let result = store
            .update(CardPatch {
                note: Some("orphan".into()),
                ..CardPatch::for_id("VW999")
            })
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_update_with_id_past_allocator_range() {
        let store = store();
        let stored = store
            .update(CardPatch {
                source_text: Some("Xin chào".into()),
                target_text: Some("Hello".into()),
                ..CardPatch::for_id("VW18446744073709551615")
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, "VW18446744073709551615");

        let created = store.create(new_card("Cảm ơn", "Thank you"), today()).await.unwrap();
        assert_eq!(created.id, "VW001");
    }

    #[tokio::test]
    async fn test_update_raises_mark_before_write() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let store = CardStore::new(repo, None).unwrap();
        store
            .update(CardPatch {
                source_text: Some("Xin chào".into()),
                target_text: Some("Hello".into()),
                ..CardPatch::for_id("VW020")
            })
            .await
            .unwrap();

        let created = store.create(new_card("Cảm ơn", "Thank you"), today()).await.unwrap();
        assert_eq!(created.id, "VW021");
    }

    #[tokio::test]
    async fn test_exhausted_allocator_rejects_create() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let last = Card::new("VW9223372036854775806".into(), "Xin chào".into(), "Hello".into(), today());
        repo.upsert_card(&CardPatch::from(&last)).unwrap();

        let store = CardStore::new(repo, None).unwrap();
        let result = store.create(new_card("Cảm ơn", "Thank you"), today()).await;
        assert!(matches!(result, Err(DbError::Core(vocab_core::CoreError::IdsExhausted))));
        assert_eq!(store.snapshot().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_seed_without_remote_is_noop() {
        assert_eq!(store().seed_from_remote(today()).await, 0);
    }
}
