// Wire format of the dashboard stats endpoint and its mapping to a snapshot
use crate::application::stats_source::FetchError;
use crate::domain::snapshot::{Activity, ChartSeries, DashboardSnapshot};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
pub struct StatsPayload {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub stats: Option<BTreeMap<String, i64>>,
    #[serde(default)]
    pub charts: Option<ChartsPayload>,
    #[serde(default)]
    pub activities: Option<Vec<ActivityPayload>>,
    #[serde(default)]
    pub system_health: Option<BTreeMap<String, String>>,
}

/// Chart data in either shape the server has used: nested per chart
/// (`daily: {labels, data}`) or the older flat keys (`daily_labels`,
/// `daily_data`, `completed_count`, ...). Nested entries win.
#[derive(Debug, Default, Deserialize)]
pub struct ChartsPayload {
    #[serde(default)]
    daily: Option<DailySeries>,
    #[serde(default)]
    status: Option<StatusCounts>,
    #[serde(default)]
    errors: Option<ErrorBreakdown>,
    #[serde(default)]
    progress: Option<ProgressPercents>,

    #[serde(default)]
    daily_labels: Option<Vec<String>>,
    #[serde(default)]
    daily_data: Option<Vec<f64>>,
    #[serde(default)]
    completed_count: Option<i64>,
    #[serde(default)]
    processing_count: Option<i64>,
    #[serde(default)]
    failed_count: Option<i64>,
    #[serde(default)]
    pending_count: Option<i64>,
    #[serde(default)]
    error_types: Option<Vec<String>>,
    #[serde(default)]
    error_counts: Option<Vec<f64>>,
    #[serde(default)]
    download_percent: Option<f64>,
    #[serde(default)]
    parse_percent: Option<f64>,
    #[serde(default)]
    index_percent: Option<f64>,
    #[serde(default)]
    telegram_percent: Option<f64>,
    #[serde(default)]
    completed_percent: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DailySeries {
    labels: Vec<String>,
    data: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct StatusCounts {
    #[serde(default)]
    completed: i64,
    #[serde(default)]
    processing: i64,
    #[serde(default)]
    failed: i64,
    #[serde(default)]
    pending: i64,
}

#[derive(Debug, Deserialize)]
struct ErrorBreakdown {
    types: Vec<String>,
    counts: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct ProgressPercents {
    #[serde(default)]
    download: f64,
    #[serde(default)]
    parse: f64,
    #[serde(default)]
    index: f64,
    #[serde(default)]
    telegram: f64,
    #[serde(default)]
    completed: f64,
}

/// `icon` and `status` only style the entry; absent or null leaves them blank.
#[derive(Debug, Deserialize)]
pub struct ActivityPayload {
    #[serde(default)]
    icon: Option<String>,
    title: String,
    time: String,
    #[serde(default)]
    status: Option<String>,
}

impl StatsPayload {
    pub fn parse(body: &str) -> Result<Self, FetchError> {
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))
    }

    /// Validates the payload as a whole; either every section converts or
    /// no snapshot is produced.
    pub fn into_snapshot(self) -> Result<DashboardSnapshot, FetchError> {
        if !self.success {
            let message = self
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(FetchError::Application(message));
        }

        let charts = match self.charts {
            Some(charts) => charts.into_series()?,
            None => BTreeMap::new(),
        };

        let server_timestamp = self
            .timestamp
            .as_deref()
            .and_then(|ts| chrono::DateTime::parse_from_rfc3339(ts).ok());

        Ok(DashboardSnapshot {
            stats: self.stats,
            charts,
            activities: self
                .activities
                .map(|items| items.into_iter().map(ActivityPayload::into_activity).collect()),
            system_health: self.system_health,
            server_timestamp,
        })
    }
}

impl ActivityPayload {
    fn into_activity(self) -> Activity {
        Activity::new(
            self.icon.unwrap_or_default(),
            self.title,
            self.time,
            self.status.unwrap_or_default(),
        )
    }
}

impl ChartsPayload {
    fn into_series(self) -> Result<BTreeMap<String, ChartSeries>, FetchError> {
        let mut charts = BTreeMap::new();

        let daily = match (self.daily, self.daily_labels, self.daily_data) {
            (Some(daily), _, _) => Some((daily.labels, daily.data)),
            (None, Some(labels), Some(data)) => Some((labels, data)),
            (None, None, None) => None,
            (None, _, _) => {
                return Err(FetchError::Malformed(
                    "daily_labels and daily_data must be sent together".to_string(),
                ));
            }
        };
        if let Some((labels, data)) = daily {
            charts.insert("daily".to_string(), series("daily", labels, data)?);
        }

        let legacy_status = [
            self.completed_count,
            self.processing_count,
            self.failed_count,
            self.pending_count,
        ];
        let status = self.status.or_else(|| {
            legacy_status.iter().any(Option::is_some).then(|| StatusCounts {
                completed: self.completed_count.unwrap_or(0),
                processing: self.processing_count.unwrap_or(0),
                failed: self.failed_count.unwrap_or(0),
                pending: self.pending_count.unwrap_or(0),
            })
        });
        if let Some(status) = status {
            charts.insert(
                "status".to_string(),
                ChartSeries::new(
                    labels(&["Completed", "Processing", "Failed", "Pending"]),
                    vec![
                        status.completed as f64,
                        status.processing as f64,
                        status.failed as f64,
                        status.pending as f64,
                    ],
                ),
            );
        }

        let errors = match (self.errors, self.error_types, self.error_counts) {
            (Some(errors), _, _) => Some((errors.types, errors.counts)),
            (None, Some(types), Some(counts)) => Some((types, counts)),
            (None, None, None) => None,
            (None, _, _) => {
                return Err(FetchError::Malformed(
                    "error_types and error_counts must be sent together".to_string(),
                ));
            }
        };
        if let Some((types, counts)) = errors {
            charts.insert("errors".to_string(), series("errors", types, counts)?);
        }

        let legacy_progress = [
            self.download_percent,
            self.parse_percent,
            self.index_percent,
            self.telegram_percent,
            self.completed_percent,
        ];
        let progress = self.progress.or_else(|| {
            legacy_progress.iter().any(Option::is_some).then(|| ProgressPercents {
                download: self.download_percent.unwrap_or(0.0),
                parse: self.parse_percent.unwrap_or(0.0),
                index: self.index_percent.unwrap_or(0.0),
                telegram: self.telegram_percent.unwrap_or(0.0),
                completed: self.completed_percent.unwrap_or(0.0),
            })
        });
        if let Some(progress) = progress {
            charts.insert(
                "progress".to_string(),
                ChartSeries::new(
                    labels(&["Download", "Parse", "Index", "Telegram", "Completed"]),
                    vec![
                        progress.download,
                        progress.parse,
                        progress.index,
                        progress.telegram,
                        progress.completed,
                    ],
                ),
            );
        }

        Ok(charts)
    }
}

fn series(chart: &str, labels: Vec<String>, values: Vec<f64>) -> Result<ChartSeries, FetchError> {
    if labels.len() != values.len() {
        return Err(FetchError::Malformed(format!(
            "chart {} has {} labels but {} values",
            chart,
            labels.len(),
            values.len()
        )));
    }
    Ok(ChartSeries::new(labels, values))
}

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Pulls the `error` text out of a JSON error body, if it has one.
pub fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("error")?.as_str().map(str::to_string)
}
