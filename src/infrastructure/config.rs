use crate::application::refresh_controller::{
    ControllerSettings, DEFAULT_ERROR_BANNER_DURATION, DEFAULT_REFRESH_INTERVAL,
};
use crate::domain::widgets::{ChartKind, WidgetRegistry};
use crate::infrastructure::formatting::Locale;
use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default = "default_stats_url")]
    pub stats_url: String,
    #[serde(default)]
    pub csrf_token: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_error_banner_secs")]
    pub error_banner_secs: u64,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default)]
    pub widgets: WidgetsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WidgetsConfig {
    #[serde(default = "default_counters")]
    pub counters: Vec<String>,
    #[serde(default = "default_charts")]
    pub charts: Vec<ChartConfig>,
    #[serde(default = "default_health")]
    pub health: Vec<String>,
    #[serde(default = "default_activity_feed")]
    pub activity_feed: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartConfig {
    pub id: String,
    pub kind: String,
}

impl Default for WidgetsConfig {
    fn default() -> Self {
        Self {
            counters: default_counters(),
            charts: default_charts(),
            health: default_health(),
            activity_feed: default_activity_feed(),
        }
    }
}

fn default_stats_url() -> String {
    "http://127.0.0.1:8000/admin/dashboard/api/stats/".to_string()
}

fn default_refresh_interval_secs() -> u64 {
    DEFAULT_REFRESH_INTERVAL.as_secs()
}

fn default_error_banner_secs() -> u64 {
    DEFAULT_ERROR_BANNER_DURATION.as_secs()
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_counters() -> Vec<String> {
    [
        "total_documents",
        "completed_documents",
        "pending_documents",
        "failed_documents",
        "total_products",
        "total_users",
        "telegram_sent",
        "total_errors",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_charts() -> Vec<ChartConfig> {
    [
        ("daily", "line"),
        ("status", "doughnut"),
        ("errors", "bar"),
        ("progress", "bar"),
    ]
    .into_iter()
    .map(|(id, kind)| ChartConfig {
        id: id.to_string(),
        kind: kind.to_string(),
    })
    .collect()
}

fn default_health() -> Vec<String> {
    [
        "database_status",
        "celery_status",
        "elasticsearch_status",
        "redis_status",
        "disk_usage",
        "memory_usage",
        "cpu_usage",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_activity_feed() -> bool {
    true
}

/// Loads `config/dashboard.{toml,...}` if present, then `DASHBOARD__*`
/// environment variables on top.
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(
            config::Environment::with_prefix("DASHBOARD")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings
        .try_deserialize()
        .context("Invalid dashboard configuration")
}

impl DashboardConfig {
    pub fn controller_settings(&self) -> anyhow::Result<ControllerSettings> {
        anyhow::ensure!(
            self.refresh_interval_secs > 0,
            "refresh_interval_secs must be greater than zero"
        );
        Ok(ControllerSettings {
            refresh_interval: Duration::from_secs(self.refresh_interval_secs),
            error_banner_duration: Duration::from_secs(self.error_banner_secs),
        })
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn locale(&self) -> anyhow::Result<Locale> {
        Ok(self.locale.parse::<Locale>()?)
    }
}

impl WidgetsConfig {
    /// Counters, health indicators and the activity feed. Charts are
    /// registered separately through the controller.
    pub fn registry(&self) -> WidgetRegistry {
        let mut registry = WidgetRegistry::new();
        for id in &self.counters {
            registry.register_counter(id.clone());
        }
        for subsystem in &self.health {
            registry.register_health(subsystem.clone());
        }
        if self.activity_feed {
            registry.enable_activity_feed();
        }
        registry
    }

    pub fn chart_slots(&self) -> Vec<(String, ChartKind)> {
        self.charts
            .iter()
            .map(|c| (c.id.clone(), parse_chart_kind(&c.kind)))
            .collect()
    }
}

fn parse_chart_kind(kind: &str) -> ChartKind {
    match kind {
        "line" => ChartKind::Line,
        "bar" => ChartKind::Bar,
        "doughnut" | "pie" => ChartKind::Doughnut,
        other => {
            tracing::warn!(kind = other, "Unknown chart kind, rendering as line");
            ChartKind::Line
        }
    }
}
