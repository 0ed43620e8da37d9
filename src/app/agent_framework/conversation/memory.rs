//! Per-thread conversation memory
//!
//! The session loop only talks to [`ConversationMemory`]; the in-process store below keeps
//! turns in a map and hands out one async mutex per thread so turns for the same thread run
//! one at a time while different threads proceed independently.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::messages::Turn;

/// Held for the duration of one turn on a thread
pub struct ThreadGuard {
    _guard: OwnedMutexGuard<()>,
}

#[async_trait]
pub trait ConversationMemory: Send + Sync {
    /// All turns of a thread in order (empty for an unknown thread)
    async fn get(&self, thread_id: &str) -> Vec<Turn>;

    /// Append a turn, creating the thread on first use
    async fn append(&self, thread_id: &str, turn: Turn);

    /// Wait for exclusive use of a thread
    async fn lock(&self, thread_id: &str) -> ThreadGuard;
}

/// Volatile in-process store
#[derive(Default)]
pub struct InMemoryConversationStore {
    threads: RwLock<HashMap<String, Vec<Turn>>>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationMemory for InMemoryConversationStore {
    async fn get(&self, thread_id: &str) -> Vec<Turn> {
        self.threads
            .read()
            .await
            .get(thread_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn append(&self, thread_id: &str, turn: Turn) {
        self.threads
            .write()
            .await
            .entry(thread_id.to_string())
            .or_default()
            .push(turn);
    }

    async fn lock(&self, thread_id: &str) -> ThreadGuard {
        let thread_lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(thread_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        ThreadGuard {
            _guard: thread_lock.lock_owned().await,
        }
    }
}
