//! Per-kind punishment table and its deferred-write journal.
//!
//! A [`Table`] holds the active punishments for one kind together with the
//! creates and deletes that have not reached the store yet. Both live behind
//! the same lock in the registry, so a mutation and its journal entry are
//! never observed apart.

use super::types::{Punishment, TableKey};
use std::collections::HashMap;

/// Active punishments of one kind plus their pending writes.
#[derive(Debug)]
pub struct Table<K> {
    active: HashMap<K, Punishment>,
    pending_creates: HashMap<K, Punishment>,
    pending_deletes: Vec<K>,
}

/// Journal contents taken by a flush.
#[derive(Debug)]
pub struct Drained<K> {
    /// Keys to delete from the store, oldest first, without repeats.
    pub deletes: Vec<K>,
    /// Punishments to write.
    pub creates: Vec<(K, Punishment)>,
}

impl<K> Drained<K> {
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.creates.is_empty()
    }
}

impl<K: TableKey> Default for Table<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: TableKey> Table<K> {
    pub fn new() -> Self {
        Self {
            active: HashMap::new(),
            pending_creates: HashMap::new(),
            pending_deletes: Vec::new(),
        }
    }

    pub fn get(&self, key: &K) -> Option<&Punishment> {
        self.active.get(key)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn pending_creates(&self) -> usize {
        self.pending_creates.len()
    }

    pub fn pending_deletes(&self) -> usize {
        self.pending_deletes.len()
    }

    /// Insert a punishment and journal it. Returns `false` if `key` is
    /// already punished, leaving the table untouched.
    pub fn punish(&mut self, key: K, punishment: Punishment) -> bool {
        if self.active.contains_key(&key) {
            return false;
        }
        self.pending_creates.insert(key, punishment.clone());
        self.active.insert(key, punishment);
        true
    }

    /// Remove a punishment and journal the delete. Returns `None` if `key`
    /// is not punished.
    ///
    /// A create still waiting in the journal is dropped: the delete that
    /// follows covers any older row the store may hold.
    pub fn pardon(&mut self, key: &K) -> Option<Punishment> {
        let removed = self.active.remove(key)?;
        self.pending_creates.remove(key);
        self.pending_deletes.push(*key);
        Some(removed)
    }

    /// Fill from storage. Skips keys punished in memory meanwhile and keys
    /// whose delete has not been flushed.
    pub fn load(&mut self, key: K, punishment: Punishment) -> bool {
        if self.active.contains_key(&key) || self.pending_deletes.contains(&key) {
            return false;
        }
        self.active.insert(key, punishment);
        true
    }

    /// Take the whole journal, leaving it empty.
    pub fn drain(&mut self) -> Drained<K> {
        let mut deletes = Vec::with_capacity(self.pending_deletes.len());
        for key in self.pending_deletes.drain(..) {
            if !deletes.contains(&key) {
                deletes.push(key);
            }
        }
        Drained {
            deletes,
            creates: self.pending_creates.drain().collect(),
        }
    }

    /// Put back a create whose write failed. Dropped if the key has been
    /// pardoned or re-punished since the drain.
    pub fn requeue_create(&mut self, key: K, punishment: Punishment) -> bool {
        let still_current = self.active.get(&key) == Some(&punishment);
        if !still_current
            || self.pending_creates.contains_key(&key)
            || self.pending_deletes.contains(&key)
        {
            return false;
        }
        self.pending_creates.insert(key, punishment);
        true
    }

    /// Put back deletes whose write failed, ahead of newer ones.
    pub fn requeue_deletes(&mut self, keys: Vec<K>) {
        if keys.is_empty() {
            return;
        }
        let newer = std::mem::replace(&mut self.pending_deletes, keys);
        self.pending_deletes.extend(newer);
    }
}
