use tracing::debug;

use crate::error::{MetricsError, Result};
use crate::types::{MetricSample, Observation, RequestSummary};

/// Turns the summed CPU usage of a pod set into a percentage of the average
/// request.
///
/// The backend already sums across pods, so only the first sample is read.
/// Its value is in cores and is converted to milli-cores before averaging
/// over the eligible pods. Both divisions truncate.
pub fn calculate_utilization(
    samples: &[MetricSample],
    requests: &RequestSummary,
    metric: &str,
    pattern: &str,
) -> Result<Observation<i64>> {
    let sample = samples.first().ok_or_else(|| MetricsError::NoMatchingMetricSamples {
        metric: metric.to_string(),
        pattern: pattern.to_string(),
    })?;
    if !sample.value.is_finite() {
        return Err(MetricsError::NonFiniteSample {
            metric: metric.to_string(),
            value: sample.value,
        });
    }

    // 1000m = 1 core
    let avg_consumption = (sample.value * 1000.0 / requests.pod_count() as f64) as i64;
    let avg_request = requests.average_request_millis();
    let utilization = avg_consumption.saturating_mul(100) / avg_request;

    debug!("avg-consumption: {}", avg_consumption);
    debug!("avg-request: {}", avg_request);
    debug!("utilization: {}", utilization);

    Ok(Observation {
        value: utilization,
        timestamp: sample.timestamp,
    })
}
