use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

pub const DEFAULT_PROMETHEUS_ADDRESS: &str = "http://prometheus-0.kube-system.svc:9090";
pub const DEFAULT_CPU_UTILIZATION_METRIC: &str = "container_cpu_usage_seconds_total";
pub const DEFAULT_CPU_REQUEST_RESOURCE: &str = "cpu";

#[derive(Debug, Clone)]
pub struct Config {
    pub prometheus_address: String,
    pub cpu_metric_name: String,
    pub cpu_request_resource: String,
    pub namespace: String,
    pub selector: String,
    pub custom_metrics: Vec<String>,
    pub fail_on_missing_signal: bool,
}

impl Config {
    pub fn metrics_settings(&self) -> MetricsSettings {
        MetricsSettings {
            cpu_metric_name: self.cpu_metric_name.clone(),
            cpu_request_resource: self.cpu_request_resource.clone(),
        }
    }
}

/// Names the metrics client needs; passed in explicitly rather than read from globals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSettings {
    pub cpu_metric_name: String,
    pub cpu_request_resource: String,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            cpu_metric_name: DEFAULT_CPU_UTILIZATION_METRIC.to_string(),
            cpu_request_resource: DEFAULT_CPU_REQUEST_RESOURCE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    /// A missing or unrecognised phase string is `Unknown`, which is not pending.
    pub fn from_status(phase: Option<&str>) -> Self {
        match phase {
            Some("Pending") => PodPhase::Pending,
            Some("Running") => PodPhase::Running,
            Some("Succeeded") => PodPhase::Succeeded,
            Some("Failed") => PodPhase::Failed,
            _ => PodPhase::Unknown,
        }
    }
}

/// Which pods count toward a signal.
///
/// CPU utilization only makes sense for pods that are actually running, while
/// custom metrics keep reporting for finished pods, so only pending pods are
/// dropped there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseFilter {
    RunningOnly,
    NotPending,
}

impl PhaseFilter {
    pub fn admits(self, phase: PodPhase) -> bool {
        match self {
            PhaseFilter::RunningOnly => phase == PodPhase::Running,
            PhaseFilter::NotPending => phase != PodPhase::Pending,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            PhaseFilter::RunningOnly => "running",
            PhaseFilter::NotPending => "non-pending",
        }
    }
}

/// One element of an instant-query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub labels: BTreeMap<String, String>,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

/// A signal value together with the time the backend observed it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation<T> {
    pub value: T,
    pub timestamp: DateTime<Utc>,
}

/// Requests of the running pods. Always holds at least one pod and a
/// truncated average request of at least one milli-unit, so the average can
/// be used as a divisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSummary {
    pod_names: BTreeSet<String>,
    request_sum_millis: i64,
}

impl RequestSummary {
    /// Returns `None` when the set is empty or the average request truncates to zero.
    pub fn new(pod_names: BTreeSet<String>, request_sum_millis: i64) -> Option<Self> {
        let count = i64::try_from(pod_names.len()).ok().filter(|c| *c > 0)?;
        if request_sum_millis / count <= 0 {
            return None;
        }
        Some(Self {
            pod_names,
            request_sum_millis,
        })
    }

    pub fn pod_names(&self) -> &BTreeSet<String> {
        &self.pod_names
    }

    pub fn pod_count(&self) -> usize {
        self.pod_names.len()
    }

    pub fn request_sum_millis(&self) -> i64 {
        self.request_sum_millis
    }

    /// Truncating average.
    pub fn average_request_millis(&self) -> i64 {
        self.request_sum_millis / self.pod_names.len() as i64
    }
}
