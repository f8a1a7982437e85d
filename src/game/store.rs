use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::session::Session;

/// Keyed storage for live sessions, injected into the command handlers
/// instead of living in a global. Sessions are caller-owned: nothing
/// here expires them.
///
/// Each session sits behind its own mutex, so commands against one
/// session are serialized while distinct sessions proceed in parallel.
#[allow(async_fn_in_trait)]
pub trait SessionStore {
    async fn get(&self, id: Uuid) -> Option<Arc<Mutex<Session>>>;
    async fn put(&self, id: Uuid, session: Session);
    async fn remove(&self, id: Uuid) -> bool;
}

#[derive(Default)]
pub struct InMemoryStore {
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemoryStore {
    async fn get(&self, id: Uuid) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().await.get(&id).cloned()
    }

    async fn put(&self, id: Uuid, session: Session) {
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
    }

    async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }
}
