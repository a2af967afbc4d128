// Widget registry - the rendered dashboard, keyed by widget id
use super::snapshot::{Activity, ChartSeries, DashboardSnapshot, HealthState};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bar,
    Doughnut,
}

impl ChartKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Doughnut => "doughnut",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CounterWidget {
    pub value: Option<i64>,
}

/// A chart is created once and then updated in place, so `id` and `kind`
/// never change after registration. `revision` counts data replacements.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartWidget {
    pub id: String,
    pub kind: ChartKind,
    pub series: ChartSeries,
    pub revision: u64,
}

impl ChartWidget {
    pub fn new(id: String, kind: ChartKind) -> Self {
        Self {
            id,
            kind,
            series: ChartSeries::empty(),
            revision: 0,
        }
    }

    pub fn update(&mut self, series: ChartSeries) {
        self.series = series;
        self.revision += 1;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityFeed {
    pub items: Vec<Activity>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthIndicator {
    pub status: Option<String>,
}

impl HealthIndicator {
    pub fn state(&self) -> HealthState {
        HealthState::from_status(self.status.as_deref())
    }
}

/// What a single render pass touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub counters_updated: usize,
    pub charts_updated: usize,
    pub charts_skipped: usize,
    pub activities_replaced: bool,
    pub health_updated: usize,
}

/// Capability-checked registry of the widgets present on the dashboard.
///
/// A dashboard may show any subset of widgets; a snapshot entry with no
/// registered widget is skipped, never an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetRegistry {
    counters: BTreeMap<String, CounterWidget>,
    charts: BTreeMap<String, ChartWidget>,
    activity_feed: Option<ActivityFeed>,
    health: BTreeMap<String, HealthIndicator>,
}

impl WidgetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_counter(&mut self, id: impl Into<String>) {
        self.counters.entry(id.into()).or_default();
    }

    /// Registers a chart with an empty series. Re-registering an existing id
    /// keeps the live widget untouched.
    pub fn register_chart(&mut self, id: impl Into<String>, kind: ChartKind) -> bool {
        let id = id.into();
        if self.charts.contains_key(&id) {
            return false;
        }
        self.charts.insert(id.clone(), ChartWidget::new(id, kind));
        true
    }

    pub fn enable_activity_feed(&mut self) {
        self.activity_feed.get_or_insert_with(ActivityFeed::default);
    }

    pub fn register_health(&mut self, subsystem: impl Into<String>) {
        self.health.entry(subsystem.into()).or_default();
    }

    #[cfg(test)]
    pub fn counter(&self, id: &str) -> Option<&CounterWidget> {
        self.counters.get(id)
    }

    #[cfg(test)]
    pub fn chart(&self, id: &str) -> Option<&ChartWidget> {
        self.charts.get(id)
    }

    pub fn activity_feed(&self) -> Option<&ActivityFeed> {
        self.activity_feed.as_ref()
    }

    #[cfg(test)]
    pub fn health(&self, subsystem: &str) -> Option<&HealthIndicator> {
        self.health.get(subsystem)
    }

    pub fn counters(&self) -> impl Iterator<Item = (&String, &CounterWidget)> {
        self.counters.iter()
    }

    pub fn charts(&self) -> impl Iterator<Item = &ChartWidget> {
        self.charts.values()
    }

    pub fn health_indicators(&self) -> impl Iterator<Item = (&String, &HealthIndicator)> {
        self.health.iter()
    }

    /// Distributes one snapshot to every widget it has data for.
    pub fn apply(&mut self, snapshot: DashboardSnapshot) -> RenderSummary {
        let mut summary = RenderSummary::default();

        if let Some(stats) = snapshot.stats {
            for (name, value) in stats {
                if let Some(counter) = self.counters.get_mut(&name) {
                    counter.value = Some(value);
                    summary.counters_updated += 1;
                }
            }
        }

        for (id, series) in snapshot.charts {
            match self.charts.get_mut(&id) {
                Some(chart) => {
                    chart.update(series);
                    summary.charts_updated += 1;
                }
                None => {
                    tracing::debug!(chart = %id, "No chart widget registered, skipping update");
                    summary.charts_skipped += 1;
                }
            }
        }

        if let (Some(items), Some(feed)) = (snapshot.activities, self.activity_feed.as_mut()) {
            feed.items = items;
            summary.activities_replaced = true;
        }

        if let Some(mut health) = snapshot.system_health {
            for (subsystem, indicator) in self.health.iter_mut() {
                indicator.status = health.remove(subsystem);
                summary.health_updated += 1;
            }
        }

        summary
    }
}
