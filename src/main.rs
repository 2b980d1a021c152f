use organic_eye::analytics::{self, AnalyticsSession, SystemClock};
use organic_eye::api::{self, ApiContext};
use organic_eye::config;
use organic_eye::feed::{self, EventSource, memory::MemoryFeed};
use organic_eye::state::{AnalyticsView, AppState};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

fn init_tracing(level: tracing::Level) {
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_default()?;
    let level = config.log_level();
    init_tracing(level.unwrap_or(tracing::Level::INFO));
    if level.is_none() {
        tracing::warn!(
            level = %config.logging.level,
            "Unknown [logging] level, falling back to info"
        );
    }
    tracing::info!(
        config_path = config::DEFAULT_CONFIG_PATH,
        app = %config.app.name,
        "organic-eye starting"
    );

    let feed = match config.seed_path() {
        Some(path) => match feed::load_seed_from_path(path) {
            Ok(events) => {
                tracing::info!(path = %path.display(), count = events.len(), "Seed detections loaded");
                MemoryFeed::with_events(events)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load seed detections, starting empty");
                MemoryFeed::new()
            }
        },
        None => {
            tracing::info!("No seed path configured, starting with an empty store");
            MemoryFeed::new()
        }
    };

    let state = Arc::new(RwLock::new(AppState::new()));
    let source: Arc<dyn EventSource> = Arc::new(feed.clone());
    let session = Arc::new(Mutex::new(AnalyticsSession::new(
        source,
        Arc::clone(&state),
        Arc::new(SystemClock),
    )));

    let device_id = config.paired_device_id().map(str::to_string);
    let period = config.default_period()?;
    if device_id.is_none() {
        tracing::warn!("No paired device configured in [device].paired_device_id");
    }
    match session.lock() {
        Ok(mut guard) => guard.select(device_id, period)?,
        Err(_) => return Err("analytics session lock poisoned".into()),
    }

    let stop_flag = Arc::new(AtomicBool::new(false));
    let refresh_interval = config.refresh_interval();
    tracing::info!(
        interval_ms = refresh_interval.as_millis(),
        "Starting analytics refresh thread"
    );
    let refresh_handle =
        analytics::spawn_refresh_thread(Arc::clone(&session), refresh_interval, Arc::clone(&stop_flag));

    let view_rx = match state.read() {
        Ok(guard) => guard.subscribe_view(),
        Err(_) => return Err("state lock poisoned".into()),
    };
    tokio::spawn(log_view_changes(view_rx));

    let app = api::router(ApiContext {
        state: Arc::clone(&state),
        feed,
        session,
    });
    let port = config.server_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    stop_flag.store(true, Ordering::Relaxed);
    if refresh_handle.join().is_err() {
        tracing::warn!("Refresh thread panicked");
    }

    Ok(())
}

async fn log_view_changes(mut view_rx: tokio::sync::watch::Receiver<organic_eye::state::ViewUpdate>) {
    while view_rx.changed().await.is_ok() {
        let update = view_rx.borrow_and_update().clone();
        match &update.view {
            AnalyticsView::Loading => tracing::debug!("Analytics loading"),
            AnalyticsView::NoDeviceLinked => tracing::info!("Analytics idle, no device linked"),
            AnalyticsView::Empty(result) | AnalyticsView::Ready(result) => tracing::info!(
                period = %result.period,
                total = result.total_count,
                health_score = result.health_score_percent,
                most_frequent = result.most_frequent_species.as_deref().unwrap_or("-"),
                "Analytics updated"
            ),
        }
    }
}
