//! Shared, observable handle to a live session.

use estudo_core::session::{Session, SessionKey};
use tokio::sync::{RwLock, RwLockReadGuard, watch};

/// The live session object a tab and the generation controller share.
///
/// Every mutation goes through [`SessionHandle::update`], which bumps a
/// revision counter right after the change so subscribers re-render.
pub struct SessionHandle {
    key: SessionKey,
    state: RwLock<Session>,
    revision: watch::Sender<u64>,
}

impl SessionHandle {
    pub fn new(session: Session) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            key: session.key().clone(),
            state: RwLock::new(session),
            revision,
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Read access for rendering. Do not hold the guard across awaits.
    pub async fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.state.read().await
    }

    /// A detached copy of the current state.
    pub async fn snapshot(&self) -> Session {
        self.state.read().await.clone()
    }

    /// Applies `f` to the session and notifies subscribers.
    pub async fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Session) -> R,
    {
        let result = {
            let mut session = self.state.write().await;
            f(&mut session)
        };
        self.revision.send_modify(|rev| *rev += 1);
        result
    }

    /// Receives the revision number after each mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }
}
