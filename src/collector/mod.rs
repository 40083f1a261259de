use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::kubernetes::{resolve_pods, PodLister};
use crate::metrics::{
    average_custom_metric, calculate_utilization, cpu_usage_query, custom_metric_query, eligible_pod_names,
    pod_name_pattern, query_vector, sum_running_requests, MetricsBackend,
};
use crate::types::{MetricsSettings, Observation, PhaseFilter};

/// Signals consumed by the horizontal pod autoscaler.
#[async_trait]
pub trait MetricsClient: Send + Sync {
    /// Average CPU usage of the running pods picked by `selector`, as a
    /// percentage of their average CPU request (70 means pods use 70% of
    /// what they requested).
    async fn cpu_utilization(
        &self,
        namespace: &str,
        selector: &str,
        cancel: &CancellationToken,
    ) -> Result<Observation<i64>>;

    /// Average value of `metric_name` across the non-pending pods picked by
    /// `selector`.
    async fn custom_metric(
        &self,
        metric_name: &str,
        namespace: &str,
        selector: &str,
        cancel: &CancellationToken,
    ) -> Result<Observation<f64>>;
}

/// [`MetricsClient`] backed by the Kubernetes pod list and a Prometheus-style
/// query backend. Holds no per-call state, so it can be shared freely.
#[derive(Clone)]
pub struct PrometheusMetricsClient {
    pods: Arc<dyn PodLister>,
    backend: Arc<dyn MetricsBackend>,
    settings: MetricsSettings,
}

impl PrometheusMetricsClient {
    pub fn new(pods: Arc<dyn PodLister>, backend: Arc<dyn MetricsBackend>, settings: MetricsSettings) -> Self {
        Self {
            pods,
            backend,
            settings,
        }
    }
}

#[async_trait]
impl MetricsClient for PrometheusMetricsClient {
    async fn cpu_utilization(
        &self,
        namespace: &str,
        selector: &str,
        cancel: &CancellationToken,
    ) -> Result<Observation<i64>> {
        let pods = resolve_pods(self.pods.as_ref(), namespace, selector, cancel).await?;
        let requests = sum_running_requests(&pods, &self.settings.cpu_request_resource, namespace)?;

        let metric = &self.settings.cpu_metric_name;
        let pattern = pod_name_pattern(requests.pod_names());
        let query = cpu_usage_query(metric, namespace, &pattern);
        let samples = query_vector(self.backend.as_ref(), &query, metric, &pattern, cancel).await?;

        calculate_utilization(&samples, &requests, metric, &pattern)
    }

    async fn custom_metric(
        &self,
        metric_name: &str,
        namespace: &str,
        selector: &str,
        cancel: &CancellationToken,
    ) -> Result<Observation<f64>> {
        let pods = resolve_pods(self.pods.as_ref(), namespace, selector, cancel).await?;
        let pod_names = eligible_pod_names(&pods, PhaseFilter::NotPending, namespace)?;

        let pattern = pod_name_pattern(&pod_names);
        let query = custom_metric_query(metric_name, namespace, &pattern);
        let samples = query_vector(self.backend.as_ref(), &query, metric_name, &pattern, cancel).await?;

        average_custom_metric(&samples, pod_names.len(), metric_name, &pattern)
    }
}
