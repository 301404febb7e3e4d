use crate::RequestId;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Concurrency-safe mapping from [`RequestId`] to its digest.
///
/// An entry is reserved as pending (`None`) when the id is handed out and is
/// filled in exactly once by the corresponding hash job. Reads take a shared
/// lock, writes an exclusive one; the lock is never held across an await or
/// while calling into another component.
///
/// The store never evicts.
#[derive(Debug, Default)]
pub struct DigestStore {
    records: RwLock<HashMap<RequestId, Option<String>>>,
}

impl DigestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `id` as pending. Does nothing if the id is already known.
    pub fn reserve(&self, id: RequestId) {
        self.records.write().entry(id).or_insert(None);
    }

    /// Records the digest for `id`.
    ///
    /// Each id is written once in practice; a repeated write replaces the
    /// previous value.
    pub fn put(&self, id: RequestId, digest: String) {
        let previous = self.records.write().insert(id, Some(digest));
        if let Some(Some(_)) = previous {
            tracing::warn!(%id, "Digest overwritten for an id that was already complete");
        }
    }

    /// Returns the digest for `id` if its job has completed.
    pub fn get(&self, id: RequestId) -> Option<String> {
        self.records.read().get(&id).cloned().flatten()
    }

    /// Whether `id` has been reserved but not yet written.
    pub fn is_pending(&self, id: RequestId) -> bool {
        matches!(self.records.read().get(&id), Some(None))
    }

    /// Number of known ids, pending or complete.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread::scope};

    #[test]
    fn reserved_ids_are_pending_until_written() {
        let store = DigestStore::new();
        let id = RequestId::new(1);
        assert!(store.is_empty());

        store.reserve(id);
        assert!(!store.is_empty());
        assert!(store.is_pending(id));
        assert_eq!(store.get(id), None);
        assert_eq!(store.len(), 1);

        store.put(id, "digest".to_string());
        assert!(!store.is_pending(id));
        assert_eq!(store.get(id).as_deref(), Some("digest"));
    }

    #[test]
    fn unknown_and_pending_look_the_same() {
        let store = DigestStore::new();
        store.reserve(RequestId::new(1));
        assert_eq!(store.get(RequestId::new(1)), store.get(RequestId::new(2)));
    }

    #[test]
    fn reserve_does_not_clobber_digest() {
        let store = DigestStore::new();
        let id = RequestId::new(7);
        store.put(id, "done".to_string());
        store.reserve(id);
        assert_eq!(store.get(id).as_deref(), Some("done"));
    }

    #[test]
    fn last_write_wins() {
        let store = DigestStore::new();
        let id = RequestId::new(3);
        store.put(id, "first".to_string());
        store.put(id, "second".to_string());
        assert_eq!(store.get(id).as_deref(), Some("second"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn concurrent_writers_do_not_lose_updates() {
        const THREADS: u64 = 8;
        const PER_THREAD: u64 = 1000;

        let store = Arc::new(DigestStore::new());
        scope(|s| {
            for t in 0..THREADS {
                let store = Arc::clone(&store);
                s.spawn(move || {
                    for i in 0..PER_THREAD {
                        let id = RequestId::new(t * PER_THREAD + i + 1);
                        store.reserve(id);
                        store.put(id, id.to_string());
                        let _ = store.get(id);
                    }
                });
            }
        });

        assert_eq!(store.len(), (THREADS * PER_THREAD) as usize);
        for raw in 1..=THREADS * PER_THREAD {
            let id = RequestId::new(raw);
            assert_eq!(store.get(id), Some(raw.to_string()));
        }
    }
}
