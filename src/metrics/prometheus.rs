use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{BackendError, MetricsError, Result};
use crate::parsing::{parse_sample_timestamp, parse_sample_value};
use crate::types::MetricSample;

/// `[<unix seconds>, "<value>"]` as sent by the query API.
pub type SamplePair = (f64, String);

#[derive(Debug, Clone, Deserialize)]
pub struct RangeSeries {
    #[serde(default)]
    pub metric: BTreeMap<String, String>,
    pub values: Vec<SamplePair>,
}

/// Every result shape the query API can return for an instant query.
#[derive(Debug, Clone)]
pub enum QueryResult {
    Vector(Vec<MetricSample>),
    Scalar(SamplePair),
    Matrix(Vec<RangeSeries>),
    String(SamplePair),
}

impl QueryResult {
    pub fn shape(&self) -> &'static str {
        match self {
            QueryResult::Vector(_) => "vector",
            QueryResult::Scalar(_) => "scalar",
            QueryResult::Matrix(_) => "matrix",
            QueryResult::String(_) => "string",
        }
    }

    /// The samples of a vector result, or the name of the shape actually received.
    pub fn into_vector(self) -> std::result::Result<Vec<MetricSample>, &'static str> {
        match self {
            QueryResult::Vector(samples) => Ok(samples),
            other => Err(other.shape()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireSample {
    #[serde(default)]
    metric: BTreeMap<String, String>,
    value: SamplePair,
}

impl WireSample {
    fn into_sample(self) -> std::result::Result<MetricSample, BackendError> {
        let (seconds, value) = self.value;
        let timestamp = parse_sample_timestamp(seconds)
            .ok_or_else(|| BackendError::MalformedSample(format!("invalid sample timestamp {}", seconds)))?;
        let value = parse_sample_value(&value)
            .ok_or_else(|| BackendError::MalformedSample(format!("invalid sample value {:?}", value)))?;
        Ok(MetricSample {
            labels: self.metric,
            value,
            timestamp,
        })
    }
}

/// `data` as it appears on the wire, before sample values are parsed.
#[derive(Debug, Deserialize)]
#[serde(tag = "resultType", content = "result", rename_all = "lowercase")]
enum WireResult {
    Vector(Vec<WireSample>),
    Scalar(SamplePair),
    Matrix(Vec<RangeSeries>),
    String(SamplePair),
}

impl TryFrom<WireResult> for QueryResult {
    type Error = BackendError;

    fn try_from(wire: WireResult) -> std::result::Result<Self, Self::Error> {
        Ok(match wire {
            WireResult::Vector(samples) => QueryResult::Vector(
                samples
                    .into_iter()
                    .map(WireSample::into_sample)
                    .collect::<std::result::Result<_, _>>()?,
            ),
            WireResult::Scalar(pair) => QueryResult::Scalar(pair),
            WireResult::Matrix(series) => QueryResult::Matrix(series),
            WireResult::String(pair) => QueryResult::String(pair),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    status: String,
    #[serde(default)]
    data: Option<WireResult>,
    #[serde(default)]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    warnings: Vec<String>,
}

/// Executes instant queries against a metrics backend.
#[async_trait]
pub trait MetricsBackend: Send + Sync {
    async fn instant_query(&self, query: &str, time: DateTime<Utc>) -> std::result::Result<QueryResult, BackendError>;
}

/// Client for the Prometheus HTTP API (`/api/v1/query`).
#[derive(Clone)]
pub struct PrometheusClient {
    http: reqwest::Client,
    base_url: String,
}

impl PrometheusClient {
    pub fn new(address: &str) -> Self {
        Self::with_http_client(reqwest::Client::new(), address)
    }

    pub fn with_http_client(http: reqwest::Client, address: &str) -> Self {
        Self {
            http,
            base_url: address.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MetricsBackend for PrometheusClient {
    async fn instant_query(&self, query: &str, time: DateTime<Utc>) -> std::result::Result<QueryResult, BackendError> {
        let url = format!("{}/api/v1/query", self.base_url);
        let time = format!("{}.{:03}", time.timestamp(), time.timestamp_subsec_millis());
        let res = self
            .http
            .get(&url)
            .query(&[("query", query), ("time", time.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        let parsed: ApiResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => return Err(BackendError::Decode(e)),
            Err(_) => {
                return Err(BackendError::Status {
                    status: status.as_u16(),
                    body,
                })
            }
        };

        for warning in &parsed.warnings {
            debug!("Prometheus warning: {}", warning);
        }
        if parsed.status != "success" {
            return Err(BackendError::Api {
                error_type: parsed.error_type.unwrap_or_else(|| "unknown".to_string()),
                message: parsed.error.unwrap_or_default(),
            });
        }
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let data = parsed.data.ok_or_else(|| BackendError::Api {
            error_type: "bad_response".to_string(),
            message: "response has no data".to_string(),
        })?;
        QueryResult::try_from(data)
    }
}

/// Runs `query` at the current time and returns its sample vector.
/// `metric` and `pattern` only label the errors.
pub async fn query_vector(
    backend: &dyn MetricsBackend,
    query: &str,
    metric: &str,
    pattern: &str,
    cancel: &CancellationToken,
) -> Result<Vec<MetricSample>> {
    debug!("Prometheus query: {}", query);

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(MetricsError::Cancelled { stage: "querying metrics" }),
        result = backend.instant_query(query, Utc::now()) => result,
    }
    .map_err(|source| MetricsError::Query {
        metric: metric.to_string(),
        pattern: pattern.to_string(),
        source,
    })?;

    let samples = result.into_vector().map_err(|found| MetricsError::UnexpectedResultShape {
        metric: metric.to_string(),
        found,
    })?;
    debug!("Prometheus metrics result: {:?}", samples);
    Ok(samples)
}
