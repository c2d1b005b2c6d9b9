//! Session tracking for the stateful transport mode.
//!
//! A session binds an opaque id to one dispatcher instance for the lifetime
//! of the process. The store is an explicit abstraction injected into the
//! transport layer so expiry policies can be tested without a live server;
//! the in-memory implementation never evicts (process-lifetime sessions).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::transport::Dispatcher;

/// Server-side mapping from session id to its bound dispatcher.
///
/// Insertion happens once per session at initialization; lookups are
/// read-only; entries are never mutated in place.
pub trait SessionStore: Send + Sync {
    /// Bind a dispatcher to a fresh id. Existing entries are never replaced.
    fn insert(&self, id: String, dispatcher: Arc<Dispatcher>);

    fn get(&self, id: &str) -> Option<Arc<Dispatcher>>;

    fn remove(&self, id: &str) -> Option<Arc<Dispatcher>>;
}

/// Process-lifetime session table.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, Arc<Dispatcher>>>,
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, id: String, dispatcher: Arc<Dispatcher>) {
        self.sessions
            .lock()
            .unwrap()
            .entry(id)
            .or_insert(dispatcher);
    }

    fn get(&self, id: &str) -> Option<Arc<Dispatcher>> {
        self.sessions.lock().unwrap().get(id).cloned()
    }

    fn remove(&self, id: &str) -> Option<Arc<Dispatcher>> {
        self.sessions.lock().unwrap().remove(id)
    }
}
