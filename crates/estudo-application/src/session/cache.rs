use estudo_core::session::{Session, SessionKey};
use estudo_execution::SessionHandle;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-lifetime store of live sessions, keyed by tab.
///
/// Entries are never evicted automatically; the number of sessions is
/// bounded by the tabs a user keeps open. `get` hands out the same
/// `Arc<SessionHandle>` every time, so a tab that comes back sees the
/// session the generation controller is still writing into.
pub struct TabSessionCache {
    sessions: Arc<RwLock<HashMap<SessionKey, Arc<SessionHandle>>>>,
}

impl TabSessionCache {
    /// Creates a new empty cache.
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Gets a cached session by key.
    ///
    /// # Returns
    ///
    /// `Some(handle)` if the session is cached, `None` otherwise.
    pub async fn get(&self, key: &SessionKey) -> Option<Arc<SessionHandle>> {
        let sessions = self.sessions.read().await;
        sessions.get(key).cloned()
    }

    /// Inserts a session handle, replacing any previous entry for `key`.
    pub async fn put(&self, key: SessionKey, handle: Arc<SessionHandle>) {
        if &key != handle.key() {
            tracing::warn!(
                "[TabSessionCache] Caching session '{}' under foreign key '{}'",
                handle.key(),
                key
            );
        }
        let mut sessions = self.sessions.write().await;
        sessions.insert(key, handle);
    }

    /// Returns the cached session for `key`, creating a fresh one if absent.
    pub async fn get_or_create(&self, key: &SessionKey) -> Arc<SessionHandle> {
        if let Some(handle) = self.get(key).await {
            return handle;
        }

        let mut sessions = self.sessions.write().await;
        // Another caller may have created it while we waited for the lock.
        sessions
            .entry(key.clone())
            .or_insert_with(|| {
                tracing::debug!("[TabSessionCache] Creating session '{}'", key);
                Arc::new(SessionHandle::new(Session::from_key(key.clone())))
            })
            .clone()
    }

    pub async fn has(&self, key: &SessionKey) -> bool {
        self.sessions.read().await.contains_key(key)
    }

    /// Removes one session. Returns whether it was cached.
    pub async fn clear(&self, key: &SessionKey) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(key).is_some()
    }

    /// Removes every session opened on `note_id`, whatever its mode.
    ///
    /// # Returns
    ///
    /// The removed handles, so callers can stop their generations.
    pub async fn clear_all_for_note(&self, note_id: &str) -> Vec<Arc<SessionHandle>> {
        let mut sessions = self.sessions.write().await;
        let keys: Vec<SessionKey> = sessions
            .keys()
            .filter(|key| key.note_id() == note_id)
            .cloned()
            .collect();

        let removed: Vec<Arc<SessionHandle>> = keys
            .iter()
            .filter_map(|key| sessions.remove(key))
            .collect();
        tracing::debug!(
            "[TabSessionCache] Cleared {} session(s) for note '{}'",
            removed.len(),
            note_id
        );
        removed
    }

    pub async fn keys(&self) -> Vec<SessionKey> {
        self.sessions.read().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for TabSessionCache {
    fn default() -> Self {
        Self::new()
    }
}
