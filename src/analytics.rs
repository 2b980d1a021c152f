//! Live analytics pipeline.
//!
//! The session keeps one feed subscription for the active selection and
//! republishes a fresh aggregate into `AppState` on every delivered snapshot.
//! Switching selection drops the previous subscription before the next one is
//! opened; a generation counter makes any late callback from the old
//! subscription a no-op. Within one subscription, a delivery older than the
//! applied snapshot's feed revision is dropped.

use crate::aggregate::aggregate_in;
use crate::error::AppError;
use crate::event::DeviceId;
use crate::feed::{EventSource, FeedFilter, FeedUpdate, Subscription, UpdateCallback};
use crate::state::{AnalyticsView, AppState, Selection};
use crate::window::{AggregationWindow, Period};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

pub struct AnalyticsSession {
    source: Arc<dyn EventSource>,
    state: Arc<RwLock<AppState>>,
    clock: Arc<dyn Clock>,
    generation: Arc<AtomicU64>,
    subscription: Option<Subscription>,
}

impl AnalyticsSession {
    pub fn new(
        source: Arc<dyn EventSource>,
        state: Arc<RwLock<AppState>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            state,
            clock,
            generation: Arc::new(AtomicU64::new(0)),
            subscription: None,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Switch to a new device/period. `None` means no device is paired.
    pub fn select(&mut self, device_id: Option<DeviceId>, period: Period) -> Result<(), AppError> {
        if let Some(previous) = self.subscription.take() {
            previous.unsubscribe();
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let now = self.clock.now();
        {
            let mut guard = self.state.write().map_err(|_| AppError::StateLock)?;
            guard.set_selection(Selection {
                device_id: device_id.clone(),
                period,
            });
            guard.set_snapshot(Vec::new(), None);
            let view = if device_id.is_some() {
                AnalyticsView::Loading
            } else {
                AnalyticsView::NoDeviceLinked
            };
            guard.set_view(view, now);
        }

        let Some(device_id) = device_id else {
            info!(%period, "No device linked, analytics idle");
            return Ok(());
        };

        let window = AggregationWindow::resolve(period, now);
        let filter = FeedFilter {
            device_id: device_id.clone(),
            timestamp_gte: window.start,
        };
        info!(
            device_id = %device_id,
            %period,
            window_start = %window.start,
            generation,
            "Subscribing to detection feed"
        );

        let state = Arc::clone(&self.state);
        let clock = Arc::clone(&self.clock);
        let current = Arc::clone(&self.generation);
        let scope = device_id.clone();
        let on_update: UpdateCallback = Arc::new(move |delivery: FeedUpdate| {
            let update = Update {
                state: &state,
                clock: clock.as_ref(),
                current: &current,
                generation,
                device_id: &scope,
                period,
            };
            if let Err(err) = update.publish(Some(delivery)) {
                warn!(error = %err, "Failed to publish analytics update");
            }
        });

        match self.source.subscribe(filter, on_update) {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, device_id = %device_id, "Feed subscription failed");
                let mut guard = self.state.write().map_err(|_| AppError::StateLock)?;
                guard.set_selection(Selection {
                    device_id: None,
                    period,
                });
                guard.set_view(AnalyticsView::NoDeviceLinked, self.clock.now());
                Err(err)
            }
        }
    }

    /// Recompute from the last delivered snapshot so events age out of the
    /// window while the feed is quiet.
    pub fn refresh(&self) -> Result<(), AppError> {
        let selection = {
            let guard = self.state.read().map_err(|_| AppError::StateLock)?;
            guard.selection().clone()
        };
        let Some(device_id) = selection.device_id else {
            return Ok(());
        };
        if self.subscription.is_none() {
            return Ok(());
        }
        let update = Update {
            state: &self.state,
            clock: self.clock.as_ref(),
            current: &self.generation,
            generation: self.generation.load(Ordering::SeqCst),
            device_id: &device_id,
            period: selection.period,
        };
        update.publish(None)
    }
}

struct Update<'a> {
    state: &'a Arc<RwLock<AppState>>,
    clock: &'a dyn Clock,
    current: &'a AtomicU64,
    generation: u64,
    device_id: &'a str,
    period: Period,
}

impl Update<'_> {
    /// `delivery == None` reuses the stored snapshot.
    fn publish(&self, delivery: Option<FeedUpdate>) -> Result<(), AppError> {
        let now = self.clock.now();
        let window = AggregationWindow::resolve(self.period, now);

        let mut guard = self.state.write().map_err(|_| AppError::StateLock)?;
        if self.current.load(Ordering::SeqCst) != self.generation {
            debug!(
                generation = self.generation,
                "Discarding update from superseded subscription"
            );
            return Ok(());
        }
        if let Some(delivery) = delivery {
            if let Some(applied) = guard.snapshot_revision()
                && delivery.revision <= applied
            {
                debug!(
                    revision = delivery.revision,
                    applied,
                    "Discarding out-of-order feed delivery"
                );
                return Ok(());
            }
            guard.set_snapshot(delivery.events, Some(delivery.revision));
        }
        let result = aggregate_in(guard.snapshot(), &window, self.device_id);
        debug!(
            device_id = self.device_id,
            total = result.total_count,
            health_score = result.health_score_percent,
            "Analytics recomputed"
        );
        guard.set_view(AnalyticsView::from_result(result), now);
        Ok(())
    }
}

pub fn spawn_refresh_thread(
    session: Arc<Mutex<AnalyticsSession>>,
    interval: Duration,
    stop: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            let cycle_start = Instant::now();

            match session.lock() {
                Ok(guard) => {
                    if let Err(err) = guard.refresh() {
                        warn!(error = %err, "Analytics refresh failed");
                    }
                }
                Err(_) => {
                    warn!("Session lock poisoned, stopping refresh thread");
                    break;
                }
            }

            sleep_with_stop(interval, &stop, cycle_start);
        }
    })
}

fn sleep_with_stop(duration: Duration, stop: &AtomicBool, start: Instant) {
    let elapsed = start.elapsed();
    if elapsed >= duration {
        return;
    }
    let remaining = duration - elapsed;
    let step = Duration::from_millis(100);
    let mut slept = Duration::ZERO;

    while slept < remaining {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        std::thread::sleep(step);
        slept += step;
    }
}
