//! Registry of live study sessions.
//!
//! Sessions idle for longer than the TTL are dropped on the next sweep, and
//! the least recently used one makes room once the cap is reached.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;
use vocab_core::{CheckGate, StudySession};

pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(2 * 60 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 256;

/// A session plus the gate that keeps answer checks from overlapping.
pub struct LiveSession {
    pub gate: CheckGate,
    pub session: Mutex<StudySession>,
}

struct Entry {
    live: Arc<LiveSession>,
    last_used: Instant,
    /// Recency order; higher is more recent.
    tick: u64,
}

#[derive(Default)]
struct Sessions {
    entries: HashMap<Uuid, Entry>,
    ticks: u64,
}

impl Sessions {
    fn next_tick(&mut self) -> u64 {
        self.ticks += 1;
        self.ticks
    }

    fn sweep(&mut self, idle_ttl: Duration) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.last_used.elapsed() < idle_ttl);
        before - self.entries.len()
    }

    fn evict_least_recent(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.tick)
            .map(|(id, _)| *id);
        if let Some(id) = oldest {
            self.entries.remove(&id);
            tracing::debug!(session_id = %id, "session cap reached, evicted least recently used");
        }
    }
}

pub struct SessionRegistry {
    sessions: RwLock<Sessions>,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_limits(DEFAULT_IDLE_TTL, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with an idle TTL and a cap on live sessions (at least 1).
    pub fn with_limits(idle_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(Sessions::default()),
            idle_ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    pub async fn insert(&self, session: StudySession) -> (Uuid, Arc<LiveSession>) {
        let id = Uuid::new_v4();
        let live = Arc::new(LiveSession {
            gate: CheckGate::new(),
            session: Mutex::new(session),
        });

        let mut sessions = self.sessions.write().await;
        sessions.sweep(self.idle_ttl);
        while sessions.entries.len() >= self.max_sessions {
            sessions.evict_least_recent();
        }
        let tick = sessions.next_tick();
        sessions.entries.insert(
            id,
            Entry {
                live: Arc::clone(&live),
                last_used: Instant::now(),
                tick,
            },
        );
        (id, live)
    }

    /// Look up a session and mark it used. Expired sessions are dropped.
    pub async fn get(&self, id: Uuid) -> Option<Arc<LiveSession>> {
        let mut sessions = self.sessions.write().await;
        let tick = sessions.next_tick();
        let entry = sessions.entries.get_mut(&id)?;
        if entry.last_used.elapsed() >= self.idle_ttl {
            sessions.entries.remove(&id);
            tracing::debug!(session_id = %id, "session expired");
            return None;
        }
        entry.last_used = Instant::now();
        entry.tick = tick;
        Some(Arc::clone(&entry.live))
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.entries.remove(&id).is_some()
    }

    /// Drop every session idle for longer than the TTL. Returns how many went.
    pub async fn sweep(&self) -> usize {
        self.sessions.write().await.sweep(self.idle_ttl)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vocab_core::ReviewDate;

    fn session() -> StudySession {
        StudySession::start(&[], ReviewDate::from_dmy(30, 5, 2025).unwrap())
    }

    #[tokio::test]
    async fn test_insert_get_remove() {
        let registry = SessionRegistry::new();
        let (id, _) = registry.insert(session()).await;

        assert!(registry.get(id).await.is_some());
        assert_eq!(registry.len().await, 1);
        assert!(registry.remove(id).await);
        assert!(registry.get(id).await.is_none());
        assert!(!registry.remove(id).await);
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let registry = SessionRegistry::with_limits(Duration::ZERO, 8);
        let (first, _) = registry.insert(session()).await;
        assert!(registry.get(first).await.is_none());
        assert_eq!(registry.len().await, 0);

        registry.insert(session()).await;
        registry.insert(session()).await;
        // Each insert sweeps what expired before it
        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.sweep().await, 1);
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn test_active_sessions_survive_sweep() {
        let registry = SessionRegistry::new();
        let (id, _) = registry.insert(session()).await;
        assert_eq!(registry.sweep().await, 0);
        assert!(registry.get(id).await.is_some());
    }

    #[tokio::test]
    async fn test_cap_evicts_least_recently_used() {
        let registry = SessionRegistry::with_limits(DEFAULT_IDLE_TTL, 2);
        let (a, _) = registry.insert(session()).await;
        let (b, _) = registry.insert(session()).await;
        assert!(registry.get(a).await.is_some());

        let (c, _) = registry.insert(session()).await;

        assert_eq!(registry.len().await, 2);
        assert!(registry.get(b).await.is_none());
        assert!(registry.get(a).await.is_some());
        assert!(registry.get(c).await.is_some());
    }
}
