// Serializable view of the rendered dashboard
use crate::application::refresh_controller::RenderedPage;
use crate::infrastructure::formatting::{format_date, format_number, Locale};
use serde::Serialize;

const MISSING_VALUE: &str = "-";
const MISSING_STATUS: &str = "N/A";

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub loading: bool,
    pub refresh_enabled: bool,
    pub last_refreshed: Option<String>,
    pub server_time: Option<String>,
    pub error_banner: Option<String>,
    pub counters: Vec<CounterView>,
    pub charts: Vec<ChartView>,
    /// `None` when the page has no activity feed.
    pub activities: Option<Vec<ActivityView>>,
    pub health: Vec<HealthView>,
}

#[derive(Debug, Serialize)]
pub struct CounterView {
    pub id: String,
    pub value: Option<i64>,
    pub display: String,
}

#[derive(Debug, Serialize)]
pub struct ChartView {
    pub id: String,
    pub kind: &'static str,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub revision: u64,
}

#[derive(Debug, Serialize)]
pub struct ActivityView {
    pub icon: String,
    pub title: String,
    pub time: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct HealthView {
    pub subsystem: String,
    pub status: String,
    pub class: &'static str,
}

impl DashboardView {
    pub fn render(page: &RenderedPage, locale: Locale) -> Self {
        let widgets = &page.widgets;

        let counters = widgets
            .counters()
            .map(|(id, counter)| CounterView {
                id: id.clone(),
                value: counter.value,
                display: counter
                    .value
                    .map(|v| format_number(v, locale))
                    .unwrap_or_else(|| MISSING_VALUE.to_string()),
            })
            .collect();

        let charts = widgets
            .charts()
            .map(|chart| ChartView {
                id: chart.id.clone(),
                kind: chart.kind.as_str(),
                labels: chart.series.labels.clone(),
                values: chart.series.values.clone(),
                revision: chart.revision,
            })
            .collect();

        let activities = widgets.activity_feed().map(|feed| {
            feed.items
                .iter()
                .map(|a| ActivityView {
                    icon: a.icon.clone(),
                    title: a.title.clone(),
                    time: a.time.clone(),
                    status: a.status.clone(),
                })
                .collect()
        });

        let health = widgets
            .health_indicators()
            .map(|(subsystem, indicator)| HealthView {
                subsystem: subsystem.clone(),
                status: indicator
                    .status
                    .clone()
                    .unwrap_or_else(|| MISSING_STATUS.to_string()),
                class: indicator.state().css_class(),
            })
            .collect();

        Self {
            loading: page.loading,
            refresh_enabled: page.refresh_enabled,
            last_refreshed: page.last_refreshed.map(|ts| format_date(&ts, locale)),
            server_time: page.server_time.map(|ts| format_date(&ts, locale)),
            error_banner: page.error_banner.clone(),
            counters,
            charts,
            activities,
            health,
        }
    }
}
