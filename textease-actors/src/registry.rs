use crate::actor::{Actor, Addr};
use dashmap::{mapref::entry::Entry, DashMap};
use std::{hash::Hash, sync::Arc};

/// Thread-safe map from a key (a user, a channel) to the actor serving it.
///
/// Lookups and inserts lock a single shard, so unrelated keys never contend.
pub struct Registry<K, A: Actor> {
    entries: Arc<DashMap<K, Addr<A>>>,
}

impl<K: Eq + Hash, A: Actor> Default for Registry<K, A> {
    fn default() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }
}

impl<K, A: Actor> Clone for Registry<K, A> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<K: Eq + Hash + Clone, A: Actor> Registry<K, A> {
    /// Address registered for `key`, spawning one with `spawn` when absent or
    /// when the registered actor has already stopped.
    pub fn get_or_spawn(&self, key: &K, spawn: impl FnOnce() -> Addr<A>) -> Addr<A> {
        match self.entries.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_closed() {
                    entry.insert(spawn());
                }
                entry.get().clone()
            }
            Entry::Vacant(entry) => entry.insert(spawn()).value().clone(),
        }
    }

    pub fn remove(&self, key: &K) -> Option<Addr<A>> {
        self.entries.remove(key).map(|(_, addr)| addr)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
