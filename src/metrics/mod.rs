// Pod-set aggregation, query rendering, backend access and the arithmetic on top
pub mod requests;
pub mod query;
pub mod prometheus;
pub mod utilization;
pub mod custom;

// Re-export commonly used items
pub use requests::{eligible_pod_names, pod_phase, sum_running_requests};
pub use query::{cpu_usage_query, custom_metric_query, pod_name_pattern, CPU_RATE_WINDOW};
pub use prometheus::{query_vector, MetricsBackend, PrometheusClient, QueryResult, RangeSeries, SamplePair};
pub use utilization::calculate_utilization;
pub use custom::average_custom_metric;
