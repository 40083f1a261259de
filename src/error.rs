use thiserror::Error;

/// Failures surfaced by the metrics client. Every variant carries enough
/// context for the autoscaling loop to log it; nothing is retried here.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to get pod list in namespace {namespace}: {source}")]
    PodList {
        namespace: String,
        #[source]
        source: kube::Error,
    },

    #[error("no {phase} pods in namespace {namespace} ({listed} pods matched the selector)")]
    NoEligiblePods {
        namespace: String,
        phase: &'static str,
        listed: usize,
    },

    #[error("some pods in namespace {namespace} do not have a request for {resource}")]
    MissingResourceRequest { namespace: String, resource: String },

    #[error("failed to get metric {metric} for pods {pattern}: {source}")]
    Query {
        metric: String,
        pattern: String,
        #[source]
        source: BackendError,
    },

    #[error("expected a vector result for metric {metric}, got {found}")]
    UnexpectedResultShape { metric: String, found: &'static str },

    #[error("metric {metric} missing for pods {pattern}")]
    NoMatchingMetricSamples { metric: String, pattern: String },

    #[error("metric {metric} returned a non-finite value {value}")]
    NonFiniteSample { metric: String, value: f64 },

    #[error("cancelled while {stage}")]
    Cancelled { stage: &'static str },
}

/// Failures talking to the Prometheus HTTP API.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{error_type}: {message}")]
    Api { error_type: String, message: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("malformed sample: {0}")]
    MalformedSample(String),
}

pub type Result<T> = std::result::Result<T, MetricsError>;
