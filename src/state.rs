use crate::aggregate::AggregateResult;
use crate::event::{DetectionEvent, DeviceId};
use crate::window::Period;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::watch;

pub const DEFAULT_PERIOD: Period = Period::Week;

/// Device and period the analytics session currently aggregates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub device_id: Option<DeviceId>,
    pub period: Period,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            device_id: None,
            period: DEFAULT_PERIOD,
        }
    }
}

/// What the analytics screen should show. `Empty` still carries the all-zero
/// result so the generic health insight can be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum AnalyticsView {
    Loading,
    NoDeviceLinked,
    Empty(AggregateResult),
    Ready(AggregateResult),
}

impl AnalyticsView {
    pub fn from_result(result: AggregateResult) -> Self {
        if result.is_empty() {
            AnalyticsView::Empty(result)
        } else {
            AnalyticsView::Ready(result)
        }
    }

    pub fn result(&self) -> Option<&AggregateResult> {
        match self {
            AnalyticsView::Empty(result) | AnalyticsView::Ready(result) => Some(result),
            AnalyticsView::Loading | AnalyticsView::NoDeviceLinked => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewUpdate {
    pub view: AnalyticsView,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct AppState {
    selection: Selection,
    snapshot: Vec<DetectionEvent>,
    snapshot_revision: Option<u64>,
    view: ViewUpdate,
    view_tx: watch::Sender<ViewUpdate>,
}

impl AppState {
    pub fn new() -> Self {
        let view = ViewUpdate {
            view: AnalyticsView::NoDeviceLinked,
            updated_at: OffsetDateTime::now_utc(),
        };
        let (view_tx, _view_rx) = watch::channel(view.clone());
        Self {
            selection: Selection::default(),
            snapshot: Vec::new(),
            snapshot_revision: None,
            view,
            view_tx,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    /// Last event set delivered by the feed for the active selection.
    pub fn snapshot(&self) -> &[DetectionEvent] {
        &self.snapshot
    }

    /// Feed revision the snapshot was taken at, `None` before the first delivery.
    pub fn snapshot_revision(&self) -> Option<u64> {
        self.snapshot_revision
    }

    pub fn set_snapshot(&mut self, snapshot: Vec<DetectionEvent>, revision: Option<u64>) {
        self.snapshot = snapshot;
        self.snapshot_revision = revision;
    }

    pub fn view(&self) -> &ViewUpdate {
        &self.view
    }

    pub fn subscribe_view(&self) -> watch::Receiver<ViewUpdate> {
        self.view_tx.subscribe()
    }

    pub fn set_view(&mut self, view: AnalyticsView, updated_at: OffsetDateTime) {
        let update = ViewUpdate { view, updated_at };
        self.view = update.clone();
        self.view_tx.send_replace(update);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
