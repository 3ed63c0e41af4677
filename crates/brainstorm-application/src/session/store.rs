use brainstorm_core::session::Session;
use brainstorm_core::{BrainstormError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Shared handle to one session. The mutex serializes mutation within the
/// session; it is never held across a generator call.
pub type SessionHandle = Arc<Mutex<Session>>;

/// In-memory session table keyed by connection id.
///
/// Sessions live exactly as long as their connection: `open` on connect,
/// `close` on disconnect. Sessions share no mutable state with each other.
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
}

impl SessionStore {
    /// Creates a new empty SessionStore.
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the session for `connection_id`, creating it if needed.
    pub async fn open(&self, connection_id: &str) -> SessionHandle {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(connection_id.to_string())
            .or_insert_with(|| {
                tracing::info!("[SessionStore] Opened session {}", connection_id);
                Arc::new(Mutex::new(Session::new(connection_id)))
            })
            .clone()
    }

    /// Gets a session by connection id.
    pub async fn get(&self, connection_id: &str) -> Result<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions
            .get(connection_id)
            .cloned()
            .ok_or_else(|| BrainstormError::not_found("Session", connection_id))
    }

    /// Drops the session for `connection_id`. Returns whether one existed.
    pub async fn close(&self, connection_id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(connection_id).is_some();
        if removed {
            tracing::info!("[SessionStore] Closed session {}", connection_id);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_is_idempotent_per_connection() {
        let store = SessionStore::new();
        let first = store.open("conn-1").await;
        first.lock().await.record_message(brainstorm_core::session::MessageRole::User, "hi");

        let again = store.open("conn-1").await;
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(again.lock().await.chat_history.len(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new();
        let a = store.open("a").await;
        let b = store.open("b").await;
        a.lock().await.record_message(brainstorm_core::session::MessageRole::User, "only a");

        assert!(b.lock().await.chat_history.is_empty());
    }

    #[tokio::test]
    async fn test_close_removes_session() {
        let store = SessionStore::new();
        store.open("conn-1").await;

        assert!(store.close("conn-1").await);
        assert!(!store.close("conn-1").await);
        assert!(store.get("conn-1").await.unwrap_err().is_not_found());
        assert!(store.is_empty().await);
    }
}
