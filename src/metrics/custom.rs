use tracing::debug;

use crate::error::{MetricsError, Result};
use crate::types::{MetricSample, Observation};

/// Per-pod average of a custom metric whose sum across `pod_count` pods is the
/// first sample of `samples`.
pub fn average_custom_metric(
    samples: &[MetricSample],
    pod_count: usize,
    metric: &str,
    pattern: &str,
) -> Result<Observation<f64>> {
    let sample = samples.first().ok_or_else(|| MetricsError::NoMatchingMetricSamples {
        metric: metric.to_string(),
        pattern: pattern.to_string(),
    })?;

    let value = sample.value / pod_count as f64;
    debug!("{} - sum {} over {} pods: {}", metric, sample.value, pod_count, value);

    Ok(Observation {
        value,
        timestamp: sample.timestamp,
    })
}
