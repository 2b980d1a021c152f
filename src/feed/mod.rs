//! Push-based detection feed.
//!
//! An `EventSource` delivers the full set of documents matching a filter on
//! every change, newest first, tagged with the source revision it was taken
//! at. Deliveries from concurrent writers can arrive out of order; consumers
//! keep the highest revision they have seen. Dropping the returned
//! `Subscription` stops delivery.

use crate::error::AppError;
use crate::event::{DetectionEvent, DeviceId};
use serde_json::Value;
use std::cmp::Reverse;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;

pub mod memory;

/// Full matching set as of `revision`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedUpdate {
    pub revision: u64,
    pub events: Vec<DetectionEvent>,
}

pub type UpdateCallback = Arc<dyn Fn(FeedUpdate) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFilter {
    pub device_id: DeviceId,
    pub timestamp_gte: OffsetDateTime,
}

impl FeedFilter {
    pub fn matches(&self, event: &DetectionEvent) -> bool {
        event.device_id.as_deref() == Some(self.device_id.as_str())
            && event.timestamp.is_some_and(|ts| ts >= self.timestamp_gte)
    }
}

pub trait EventSource: Send + Sync {
    fn subscribe(
        &self,
        filter: FeedFilter,
        on_update: UpdateCallback,
    ) -> Result<Subscription, AppError>;
}

/// Handle for a live subscription. Unsubscribes when dropped.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

pub(crate) fn sort_newest_first(events: &mut [DetectionEvent]) {
    events.sort_by_key(|event| Reverse(event.timestamp));
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to read seed file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse seed file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Load a JSON array of detection documents. Documents without an `id` get
/// `seed-<index>`.
pub fn load_seed_from_path(path: impl AsRef<Path>) -> Result<Vec<DetectionEvent>, FeedError> {
    let contents = std::fs::read_to_string(path)?;
    let documents: Vec<Value> = serde_json::from_str(&contents)?;
    Ok(documents
        .iter()
        .enumerate()
        .map(|(index, document)| {
            let id = document
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("seed-{index}"));
            DetectionEvent::from_document(id, document)
        })
        .collect())
}
