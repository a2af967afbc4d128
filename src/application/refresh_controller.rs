// Dashboard refresh controller - Periodic fetch-and-render cycles
use super::error_banner::ErrorBanner;
use super::lock_unpoisoned;
use super::stats_source::{FetchError, StatsSource};
use crate::domain::snapshot::DashboardSnapshot;
use crate::domain::widgets::{ChartKind, RenderSummary, WidgetRegistry};
use chrono::{DateTime, FixedOffset, Local};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(180);
pub const DEFAULT_ERROR_BANNER_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub refresh_interval: Duration,
    pub error_banner_duration: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            error_banner_duration: DEFAULT_ERROR_BANNER_DURATION,
        }
    }
}

#[derive(Debug)]
pub enum CycleOutcome {
    Rendered(RenderSummary),
    Failed(FetchError),
}

impl CycleOutcome {
    #[cfg(test)]
    pub fn is_rendered(&self) -> bool {
        matches!(self, CycleOutcome::Rendered(_))
    }
}

#[derive(Debug)]
pub enum InitOutcome {
    Started(CycleOutcome),
    /// A timer is already armed; nothing was done.
    AlreadyRunning,
}

#[derive(Debug, Default)]
struct PageState {
    widgets: WidgetRegistry,
    last_refreshed: Option<DateTime<Local>>,
    server_time: Option<DateTime<FixedOffset>>,
    in_flight: usize,
    control_wired: bool,
}

/// Copy of everything currently on screen.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub widgets: WidgetRegistry,
    pub last_refreshed: Option<DateTime<Local>>,
    /// Generation time reported by the server for the data on screen.
    pub server_time: Option<DateTime<FixedOffset>>,
    pub loading: bool,
    pub refresh_enabled: bool,
    pub error_banner: Option<String>,
}

struct RefreshTimer {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RefreshTimer {
    /// The task only holds a weak reference, so dropping the last controller
    /// handle also ends the timer.
    fn arm(controller: Weak<ControllerInner>, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(inner) = controller.upgrade() else {
                            break;
                        };
                        let controller = DashboardController { inner };
                        tokio::spawn(async move {
                            controller.refresh().await;
                        });
                    }
                }
            }

            tracing::debug!("Dashboard refresh timer stopped");
        });

        Self { cancel, handle }
    }

    async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "Dashboard refresh timer task ended abnormally");
        }
    }
}

/// Marks a cycle as in flight; leaving the loading state happens in `Drop`,
/// so it runs on success, on error, on panic and when the cycle is cancelled.
struct LoadingGuard<'a> {
    page: &'a Mutex<PageState>,
}

impl<'a> LoadingGuard<'a> {
    fn enter(page: &'a Mutex<PageState>) -> Self {
        lock_unpoisoned(page).in_flight += 1;
        Self { page }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut page = lock_unpoisoned(self.page);
        page.in_flight = page.in_flight.saturating_sub(1);
    }
}

struct ControllerInner {
    source: Arc<dyn StatsSource>,
    settings: ControllerSettings,
    page: Mutex<PageState>,
    banner: ErrorBanner,
    timer: Mutex<Option<RefreshTimer>>,
}

impl Drop for ControllerInner {
    fn drop(&mut self) {
        let timer = self
            .timer
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(timer) = timer {
            timer.cancel.cancel();
        }
    }
}

/// Keeps the rendered dashboard eventually consistent with the statistics
/// endpoint.
///
/// Cycles are independent: a manual refresh may overlap a timer-driven one.
/// Each cycle renders only the snapshot it fetched itself, under one lock,
/// so the last render to run wins and no two snapshots are ever mixed.
#[derive(Clone)]
pub struct DashboardController {
    inner: Arc<ControllerInner>,
}

impl DashboardController {
    pub fn new(
        source: Arc<dyn StatsSource>,
        widgets: WidgetRegistry,
        settings: ControllerSettings,
    ) -> Self {
        let banner = ErrorBanner::new(settings.error_banner_duration);
        Self {
            inner: Arc::new(ControllerInner {
                source,
                settings,
                page: Mutex::new(PageState {
                    widgets,
                    ..PageState::default()
                }),
                banner,
                timer: Mutex::new(None),
            }),
        }
    }

    /// Registers chart widgets with empty series. Charts that already exist
    /// are kept as they are; returns how many were newly registered.
    pub fn initialize_charts<I, S>(&self, charts: I) -> usize
    where
        I: IntoIterator<Item = (S, ChartKind)>,
        S: Into<String>,
    {
        let mut page = lock_unpoisoned(&self.inner.page);
        charts
            .into_iter()
            .map(|(id, kind)| page.widgets.register_chart(id, kind))
            .filter(|registered| *registered)
            .count()
    }

    /// Runs one cycle immediately and arms the recurring timer.
    ///
    /// Calling this again while the timer is armed is a no-op; call
    /// [`shutdown`](Self::shutdown) first to start over.
    pub async fn initialize(&self) -> InitOutcome {
        {
            let mut timer = lock_unpoisoned(&self.inner.timer);
            if timer.is_some() {
                tracing::warn!("Dashboard controller already initialized, ignoring");
                return InitOutcome::AlreadyRunning;
            }
            *timer = Some(RefreshTimer::arm(
                Arc::downgrade(&self.inner),
                self.inner.settings.refresh_interval,
            ));
        }
        lock_unpoisoned(&self.inner.page).control_wired = true;

        tracing::info!(
            interval_secs = self.inner.settings.refresh_interval.as_secs(),
            "Dashboard refresh started"
        );

        InitOutcome::Started(self.refresh().await)
    }

    /// Runs one fetch-and-render cycle. Failures never propagate; they are
    /// logged and shown on the error banner.
    ///
    /// The loading state is entered when this is called, before the
    /// returned future is first polled.
    pub fn refresh(&self) -> impl Future<Output = CycleOutcome> + Send + '_ {
        let loading = LoadingGuard::enter(&self.inner.page);

        async move {
            let _loading = loading;
            match self.inner.source.fetch_snapshot().await {
                Ok(snapshot) => CycleOutcome::Rendered(self.render(snapshot)),
                Err(e) => {
                    tracing::warn!(error = %e, "Dashboard refresh failed");
                    self.inner.banner.show(e.banner_message());
                    CycleOutcome::Failed(e)
                }
            }
        }
    }

    /// Cancels the recurring timer and disconnects the refresh control.
    pub async fn shutdown(&self) {
        let timer = lock_unpoisoned(&self.inner.timer).take();
        lock_unpoisoned(&self.inner.page).control_wired = false;

        if let Some(timer) = timer {
            timer.stop().await;
            tracing::info!("Dashboard refresh stopped");
        }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        lock_unpoisoned(&self.inner.timer).is_some()
    }

    #[cfg(test)]
    pub fn is_loading(&self) -> bool {
        lock_unpoisoned(&self.inner.page).in_flight > 0
    }

    /// The manual refresh control is usable once wired and while no cycle
    /// is in flight.
    pub fn refresh_enabled(&self) -> bool {
        let page = lock_unpoisoned(&self.inner.page);
        page.control_wired && page.in_flight == 0
    }

    pub fn rendered(&self) -> RenderedPage {
        let error_banner = self.inner.banner.message();
        let page = lock_unpoisoned(&self.inner.page);
        RenderedPage {
            widgets: page.widgets.clone(),
            last_refreshed: page.last_refreshed,
            server_time: page.server_time,
            loading: page.in_flight > 0,
            refresh_enabled: page.control_wired && page.in_flight == 0,
            error_banner,
        }
    }

    fn render(&self, snapshot: DashboardSnapshot) -> RenderSummary {
        let server_time = snapshot.server_timestamp;
        let mut page = lock_unpoisoned(&self.inner.page);
        let summary = page.widgets.apply(snapshot);
        page.last_refreshed = Some(Local::now());
        if server_time.is_some() {
            page.server_time = server_time;
        }

        tracing::debug!(
            counters = summary.counters_updated,
            charts = summary.charts_updated,
            charts_skipped = summary.charts_skipped,
            activities = summary.activities_replaced,
            health = summary.health_updated,
            "Dashboard rendered"
        );

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::stats_source::testing::ScriptedSource;
    use crate::domain::snapshot::{ChartSeries, HealthState};
    use tokio::time::sleep;

    fn snapshot(total: i64, completed: i64) -> DashboardSnapshot {
        DashboardSnapshot::with_stats([("total_documents", total), ("completed_documents", completed)])
    }

    fn full_snapshot() -> DashboardSnapshot {
        let mut snapshot = snapshot(10, 4);
        snapshot.charts.insert(
            "daily".to_string(),
            ChartSeries::new(vec!["10/15".into(), "10/16".into()], vec![1.0, 2.0]),
        );
        snapshot.activities = Some(Vec::new());
        snapshot.system_health = Some(
            [("database_status".to_string(), "OK".to_string())]
                .into_iter()
                .collect(),
        );
        snapshot
    }

    fn controller(source: Arc<ScriptedSource>) -> DashboardController {
        let mut widgets = WidgetRegistry::new();
        widgets.register_counter("total_documents");
        widgets.register_counter("completed_documents");
        widgets.enable_activity_feed();
        widgets.register_health("database_status");
        let controller = DashboardController::new(source, widgets, ControllerSettings::default());
        controller.initialize_charts([("daily", ChartKind::Line)]);
        controller
    }

    fn failures() -> Vec<FetchError> {
        vec![
            FetchError::Status {
                status: 500,
                message: "Internal Server Error".to_string(),
            },
            FetchError::Malformed("expected value at line 1 column 1".to_string()),
            FetchError::Application("Database unavailable".to_string()),
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn test_initialize_renders_and_wires_control() {
        let source = Arc::new(ScriptedSource::new());
        source.push(Ok(full_snapshot()));
        let controller = controller(source.clone());
        assert!(!controller.refresh_enabled());

        let outcome = controller.initialize().await;

        assert!(matches!(outcome, InitOutcome::Started(CycleOutcome::Rendered(_))));
        let page = controller.rendered();
        assert!(!page.loading);
        assert!(page.refresh_enabled);
        assert!(page.last_refreshed.is_some());
        assert_eq!(page.widgets.counter("total_documents").unwrap().value, Some(10));
        assert_eq!(page.widgets.chart("daily").unwrap().revision, 1);
        controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_cleared_for_every_outcome() {
        let source = Arc::new(ScriptedSource::new());
        source.push(Ok(full_snapshot()));
        for failure in failures() {
            source.push(Err(failure));
        }
        let controller = controller(source.clone());
        controller.initialize().await;
        let rendered_before = controller.rendered();

        for _ in 0..3 {
            let outcome = controller.refresh().await;
            assert!(!outcome.is_rendered());

            let page = controller.rendered();
            assert!(!page.loading);
            assert!(page.refresh_enabled);
            assert!(page.error_banner.is_some());
            assert_eq!(page.widgets, rendered_before.widgets);
            assert_eq!(page.last_refreshed, rendered_before.last_refreshed);
        }
        controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_application_failure_message_reaches_banner() {
        let source = Arc::new(ScriptedSource::new());
        source.push(Err(FetchError::Application("Database unavailable".to_string())));
        let controller = controller(source);

        controller.refresh().await;

        assert_eq!(
            controller.rendered().error_banner.as_deref(),
            Some("Database unavailable")
        );
        sleep(Duration::from_secs(6)).await;
        assert_eq!(controller.rendered().error_banner, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_state_while_fetch_in_flight() {
        let source = Arc::new(ScriptedSource::new());
        source.push(Ok(full_snapshot()));
        source.push_delayed(Duration::from_secs(2), Ok(snapshot(15, 5)));
        let controller = controller(source);
        controller.initialize().await;

        let task = tokio::spawn({
            let controller = controller.clone();
            async move { controller.refresh().await }
        });
        sleep(Duration::from_millis(100)).await;

        assert!(controller.is_loading());
        assert!(!controller.refresh_enabled());
        assert_eq!(controller.rendered().widgets.counter("total_documents").unwrap().value, Some(10));

        assert!(task.await.unwrap().is_rendered());
        assert!(!controller.is_loading());
        assert!(controller.refresh_enabled());
        controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_cycle_still_leaves_loading_state() {
        let source = Arc::new(ScriptedSource::new());
        source.push_delayed(Duration::from_secs(60), Ok(snapshot(15, 5)));
        let controller = controller(source);

        let result = tokio::time::timeout(Duration::from_secs(1), controller.refresh()).await;

        assert!(result.is_err());
        assert!(!controller.is_loading());
        assert_eq!(controller.rendered().widgets.counter("total_documents").unwrap().value, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_only_payload_keeps_other_widgets() {
        let source = Arc::new(ScriptedSource::new());
        source.push(Ok(full_snapshot()));
        source.push(Ok(snapshot(15, 5)));
        let controller = controller(source);
        controller.refresh().await;
        let before = controller.rendered();

        controller.refresh().await;

        let after = controller.rendered();
        assert_eq!(after.widgets.counter("total_documents").unwrap().value, Some(15));
        assert_eq!(after.widgets.chart("daily"), before.widgets.chart("daily"));
        assert_eq!(after.widgets.activity_feed(), before.widgets.activity_feed());
        assert_eq!(
            after.widgets.health("database_status").unwrap().state(),
            HealthState::Healthy
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_time_follows_latest_timestamped_snapshot() {
        let stamped = |hour| {
            let mut snapshot = snapshot(10, 4);
            snapshot.server_timestamp = chrono::DateTime::parse_from_rfc3339(&format!(
                "2026-10-16T{hour:02}:00:00+05:00"
            ))
            .ok();
            snapshot
        };
        let source = Arc::new(ScriptedSource::new());
        source.push(Ok(stamped(9)));
        source.push(Ok(snapshot(11, 4)));
        source.push(Ok(stamped(10)));
        let controller = controller(source);

        controller.refresh().await;
        let first = controller.rendered().server_time;
        controller.refresh().await;
        assert_eq!(controller.rendered().server_time, first);
        controller.refresh().await;

        let latest = controller.rendered().server_time.unwrap();
        assert_eq!(latest.to_rfc3339(), "2026-10-16T10:00:00+05:00");
        assert_eq!(first.unwrap().to_rfc3339(), "2026-10-16T09:00:00+05:00");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_refreshes_last_write_wins() {
        let source = Arc::new(ScriptedSource::new());
        source.push(Ok(snapshot(10, 1)));
        source.push(Ok(snapshot(15, 2)));
        let controller = controller(source);

        controller.refresh().await;
        controller.refresh().await;

        let page = controller.rendered();
        assert_eq!(page.widgets.counter("total_documents").unwrap().value, Some(15));
        assert_eq!(page.widgets.counter("completed_documents").unwrap().value, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_refreshes_render_whole_snapshots() {
        let source = Arc::new(ScriptedSource::new());
        // First request is slower, so its render runs last.
        source.push_delayed(Duration::from_secs(5), Ok(snapshot(10, 1)));
        source.push_delayed(Duration::from_secs(1), Ok(snapshot(15, 2)));
        let controller = controller(source);

        let (first, second) = tokio::join!(controller.refresh(), controller.refresh());

        assert!(first.is_rendered() && second.is_rendered());
        let page = controller.rendered();
        assert!(!page.loading);
        assert_eq!(page.widgets.counter("total_documents").unwrap().value, Some(10));
        assert_eq!(page.widgets.counter("completed_documents").unwrap().value, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_initialize_is_noop() {
        let source = Arc::new(ScriptedSource::new());
        let controller = controller(source.clone());

        assert!(matches!(controller.initialize().await, InitOutcome::Started(_)));
        assert!(matches!(controller.initialize().await, InitOutcome::AlreadyRunning));
        assert_eq!(source.calls(), 1);

        sleep(Duration::from_secs(181)).await;
        assert_eq!(source.calls(), 2);

        sleep(Duration::from_secs(180)).await;
        assert_eq!(source.calls(), 3);
        controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_endpoint_polled_at_fixed_interval() {
        let source = Arc::new(ScriptedSource::new());
        for _ in 0..3 {
            source.push(Err(FetchError::Malformed("not json".to_string())));
        }
        let controller = controller(source.clone());
        controller.initialize().await;

        sleep(Duration::from_secs(361)).await;

        assert_eq!(source.calls(), 3);
        assert!(controller.is_running());
        controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_timer_and_allows_reinitialize() {
        let source = Arc::new(ScriptedSource::new());
        let controller = controller(source.clone());
        controller.initialize().await;

        controller.shutdown().await;
        assert!(!controller.is_running());
        assert!(!controller.refresh_enabled());

        sleep(Duration::from_secs(400)).await;
        assert_eq!(source.calls(), 1);

        assert!(matches!(controller.initialize().await, InitOutcome::Started(_)));
        assert_eq!(source.calls(), 2);
        controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_controller_stops_timer() {
        let source = Arc::new(ScriptedSource::new());
        let controller = controller(source.clone());
        controller.initialize().await;

        drop(controller);
        sleep(Duration::from_secs(400)).await;

        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn test_initialize_charts_counts_new_widgets() {
        let controller = controller(Arc::new(ScriptedSource::new()));

        let added = controller.initialize_charts([
            ("daily", ChartKind::Bar),
            ("status", ChartKind::Doughnut),
            ("errors", ChartKind::Bar),
        ]);

        assert_eq!(added, 2);
        let page = controller.rendered();
        assert_eq!(page.widgets.chart("daily").unwrap().kind, ChartKind::Line);
        assert!(page.widgets.chart("status").unwrap().series.is_empty());
    }
}
