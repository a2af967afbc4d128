// Dashboard snapshot domain model
use chrono::{DateTime, FixedOffset};
use std::collections::BTreeMap;

/// Status string that renders a health indicator as healthy. Anything else,
/// "N/A" and lowercase "ok" included, is treated as unhealthy.
pub const HEALTHY_SENTINEL: &str = "OK";

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    pub fn new(labels: Vec<String>, values: Vec<f64>) -> Self {
        Self { labels, values }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub icon: String,
    pub title: String,
    /// Relative-time label as produced by the server, e.g. "14:05, 16.10.2026".
    pub time: String,
    pub status: String,
}

impl Activity {
    pub fn new(icon: String, title: String, time: String, status: String) -> Self {
        Self {
            icon,
            title,
            time,
            status,
        }
    }
}

/// One complete, internally consistent set of dashboard data from a single
/// successful fetch.
///
/// Sections the server left out are `None` (or missing from `charts`), which
/// tells the renderer to keep whatever it displayed before.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSnapshot {
    pub stats: Option<BTreeMap<String, i64>>,
    pub charts: BTreeMap<String, ChartSeries>,
    pub activities: Option<Vec<Activity>>,
    pub system_health: Option<BTreeMap<String, String>>,
    pub server_timestamp: Option<DateTime<FixedOffset>>,
}

impl DashboardSnapshot {
    #[cfg(test)]
    pub fn with_stats<I, K>(stats: I) -> Self
    where
        I: IntoIterator<Item = (K, i64)>,
        K: Into<String>,
    {
        Self {
            stats: Some(stats.into_iter().map(|(k, v)| (k.into(), v)).collect()),
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn stat(&self, name: &str) -> Option<i64> {
        self.stats.as_ref().and_then(|s| s.get(name).copied())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

impl HealthState {
    pub fn from_status(status: Option<&str>) -> Self {
        match status {
            Some(HEALTHY_SENTINEL) => HealthState::Healthy,
            _ => HealthState::Unhealthy,
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            HealthState::Healthy => "ok",
            HealthState::Unhealthy => "error",
        }
    }
}
