use crate::error::AppError;
use crate::event::DetectionEvent;
use crate::feed::{
    EventSource, FeedFilter, FeedUpdate, Subscription, UpdateCallback, sort_newest_first,
};
use serde_json::Value;
use std::sync::{Arc, Mutex, Weak};
use tracing::debug;

/// In-process document store with live queries.
///
/// Every insert, replace or removal bumps the store revision, re-runs each
/// subscriber's filter and hands it the complete matching set at that
/// revision. Callbacks run after the store lock is released, so a callback may
/// read the store or resubscribe.
#[derive(Clone, Default)]
pub struct MemoryFeed {
    inner: Arc<Mutex<FeedInner>>,
}

#[derive(Default)]
struct FeedInner {
    documents: Vec<DetectionEvent>,
    subscribers: Vec<Subscriber>,
    revision: u64,
    next_subscriber_id: u64,
    next_document_id: u64,
}

struct Subscriber {
    id: u64,
    filter: FeedFilter,
    on_update: UpdateCallback,
}

type Delivery = (UpdateCallback, FeedUpdate);

impl MemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<DetectionEvent>) -> Self {
        let feed = Self::new();
        if let Ok(mut inner) = feed.inner.lock() {
            inner.documents = events;
        }
        feed
    }

    /// Insert a new document or replace the one with the same id.
    pub fn upsert(&self, event: DetectionEvent) -> Result<(), AppError> {
        let deliveries = {
            let mut inner = self.lock()?;
            inner.put(event);
            inner.pending_deliveries()
        };
        deliver(deliveries);
        Ok(())
    }

    /// Store a raw document under a generated id and return the id. Ids
    /// already taken, including client-supplied ones, are skipped.
    pub fn insert_document(&self, document: &Value) -> Result<String, AppError> {
        let (id, deliveries) = {
            let mut inner = self.lock()?;
            let id = loop {
                inner.next_document_id += 1;
                let candidate = format!("doc-{}", inner.next_document_id);
                if !inner.documents.iter().any(|doc| doc.id == candidate) {
                    break candidate;
                }
            };
            inner.put(DetectionEvent::from_document(id.clone(), document));
            (id, inner.pending_deliveries())
        };
        deliver(deliveries);
        Ok(id)
    }

    pub fn remove(&self, id: &str) -> Result<bool, AppError> {
        let deliveries = {
            let mut inner = self.lock()?;
            let before = inner.documents.len();
            inner.documents.retain(|doc| doc.id != id);
            if inner.documents.len() == before {
                return Ok(false);
            }
            inner.revision += 1;
            inner.pending_deliveries()
        };
        deliver(deliveries);
        Ok(true)
    }

    /// Every stored document, newest first.
    pub fn snapshot(&self) -> Result<Vec<DetectionEvent>, AppError> {
        let inner = self.lock()?;
        let mut documents = inner.documents.clone();
        sort_newest_first(&mut documents);
        Ok(documents)
    }

    pub fn revision(&self) -> u64 {
        self.inner.lock().map(|inner| inner.revision).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.subscribers.len())
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, FeedInner>, AppError> {
        self.inner
            .lock()
            .map_err(|_| AppError::Feed("feed lock poisoned".to_string()))
    }
}

impl FeedInner {
    fn put(&mut self, event: DetectionEvent) {
        match self.documents.iter().position(|doc| doc.id == event.id) {
            Some(index) => self.documents[index] = event,
            None => self.documents.push(event),
        }
        self.revision += 1;
    }

    fn matching(&self, filter: &FeedFilter) -> FeedUpdate {
        let mut events: Vec<DetectionEvent> = self
            .documents
            .iter()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .collect();
        sort_newest_first(&mut events);
        FeedUpdate {
            revision: self.revision,
            events,
        }
    }

    fn pending_deliveries(&self) -> Vec<Delivery> {
        self.subscribers
            .iter()
            .map(|sub| (Arc::clone(&sub.on_update), self.matching(&sub.filter)))
            .collect()
    }
}

fn deliver(deliveries: Vec<Delivery>) {
    for (on_update, update) in deliveries {
        on_update(update);
    }
}

impl EventSource for MemoryFeed {
    fn subscribe(
        &self,
        filter: FeedFilter,
        on_update: UpdateCallback,
    ) -> Result<Subscription, AppError> {
        let (id, initial) = {
            let mut inner = self.lock()?;
            inner.next_subscriber_id += 1;
            let id = inner.next_subscriber_id;
            let initial = inner.matching(&filter);
            debug!(
                subscriber = id,
                device_id = %filter.device_id,
                matching = initial.events.len(),
                revision = initial.revision,
                "Feed subscription opened"
            );
            inner.subscribers.push(Subscriber {
                id,
                filter,
                on_update: Arc::clone(&on_update),
            });
            (id, initial)
        };

        on_update(initial);

        let weak: Weak<Mutex<FeedInner>> = Arc::downgrade(&self.inner);
        Ok(Subscription::new(move || {
            if let Some(shared) = weak.upgrade()
                && let Ok(mut inner) = shared.lock()
            {
                inner.subscribers.retain(|sub| sub.id != id);
                debug!(subscriber = id, "Feed subscription closed");
            }
        }))
    }
}
