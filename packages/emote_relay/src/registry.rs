use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

use crate::session::{SessionHandle, SessionId};

/// Registry of live sessions, shared by every context.
///
/// The map itself is never handed out; callers get cloned handles, either one
/// at a time or as a point-in-time [`snapshot`](Self::snapshot).
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, handle: SessionHandle) {
        debug!(session = %handle.id(), "Registering session");
        self.sessions.write().await.insert(handle.id(), handle);
    }

    /// Remove a session, returning its handle if it was registered
    pub async fn remove(&self, id: SessionId) -> Option<SessionHandle> {
        let removed = self.sessions.write().await.remove(&id);
        if removed.is_some() {
            debug!(session = %id, "Unregistered session");
        }
        removed
    }

    pub async fn get(&self, id: SessionId) -> Option<SessionHandle> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Handles of every session registered right now, ordered by id.
    ///
    /// Sessions registered after the call are not included; sessions removed
    /// after the call keep a valid (closed) handle.
    pub async fn snapshot(&self) -> Vec<SessionHandle> {
        let mut handles: Vec<SessionHandle> =
            self.sessions.read().await.values().cloned().collect();
        handles.sort_by_key(|h| h.id());
        handles
    }

    pub async fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.read().await.keys().copied().collect();
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
