use crate::request::{EventId, TuningRequest};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Append-only map from region name to its tuning request.
///
/// Lookups of existing regions take only a shard read lock. The insert path
/// holds the shard write lock across construction, so at most one request
/// is ever built per name no matter how many threads race on first touch.
#[derive(Debug, Default)]
pub struct TuningRegistry {
    entries: DashMap<String, Arc<TuningRequest>>,
    by_trigger: DashMap<EventId, Vec<Arc<TuningRequest>>>,
    next_sequence: AtomicUsize,
}

impl TuningRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<TuningRequest>> {
        self.entries.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns the request for `name`, building it with `create` if absent.
    /// The flag is true only for the caller whose `create` ran.
    ///
    /// `create` receives the creation sequence number and must not call back
    /// into this registry.
    pub fn get_or_create<F>(&self, name: &str, create: F) -> (Arc<TuningRequest>, bool)
    where
        F: FnOnce(usize) -> TuningRequest,
    {
        if let Some(existing) = self.get(name) {
            return (existing, false);
        }

        match self.entries.entry(name.to_string()) {
            Entry::Occupied(entry) => (Arc::clone(entry.get()), false),
            Entry::Vacant(entry) => {
                let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
                let request = Arc::new(create(sequence));
                self.by_trigger
                    .entry(request.trigger())
                    .or_default()
                    .push(Arc::clone(&request));
                entry.insert(Arc::clone(&request));
                (request, true)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All requests in creation order.
    pub fn snapshot(&self) -> Vec<Arc<TuningRequest>> {
        let mut requests: Vec<_> = self
            .entries
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        requests.sort_by_key(|r| r.sequence());
        requests
    }

    pub fn triggered_by(&self, event: EventId) -> Vec<Arc<TuningRequest>> {
        self.by_trigger
            .get(&event)
            .map(|bound| bound.value().clone())
            .unwrap_or_default()
    }

    /// Runs `f` on every request bound to `event`.
    ///
    /// Holds a read lock on that event's bucket, so `f` must not create
    /// requests in this registry.
    pub fn for_each_triggered<F>(&self, event: EventId, mut f: F)
    where
        F: FnMut(&TuningRequest),
    {
        if let Some(bound) = self.by_trigger.get(&event) {
            for request in bound.iter() {
                f(request);
            }
        }
    }
}
