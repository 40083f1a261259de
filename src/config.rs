use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use crate::types::{Config, DEFAULT_CPU_REQUEST_RESOURCE, DEFAULT_CPU_UTILIZATION_METRIC, DEFAULT_PROMETHEUS_ADDRESS};

/// Trait for abstracting environment variable access
pub trait EnvironmentProvider {
    fn get_var(&self, key: &str) -> Option<String>;
}

/// Production implementation using std::env
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// In-memory environment for tests
#[derive(Debug, Default)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl EnvironmentProvider for MockEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn load_config() -> Result<Config> {
    load_config_with_env(&SystemEnvironment)
}

pub fn load_config_with_env<E: EnvironmentProvider>(env: &E) -> Result<Config> {
    let prometheus_address = non_empty(env, "PROMETHEUS_ADDRESS")
        .unwrap_or_else(|| DEFAULT_PROMETHEUS_ADDRESS.to_string());
    if !prometheus_address.starts_with("http://") && !prometheus_address.starts_with("https://") {
        return Err(anyhow!("PROMETHEUS_ADDRESS must be an http(s) URL, got {}", prometheus_address));
    }

    let cpu_metric_name = non_empty(env, "CPU_UTILIZATION_METRIC")
        .unwrap_or_else(|| DEFAULT_CPU_UTILIZATION_METRIC.to_string());
    let cpu_request_resource = non_empty(env, "CPU_REQUEST_RESOURCE")
        .unwrap_or_else(|| DEFAULT_CPU_REQUEST_RESOURCE.to_string());

    let namespace = non_empty(env, "NAMESPACE")
        .ok_or_else(|| anyhow!("NAMESPACE env var must be set"))?;
    let selector = env.get_var("SELECTOR").map(|s| s.trim().to_string()).unwrap_or_default();

    let custom_metrics: Vec<String> = env
        .get_var("CUSTOM_METRICS")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let fail_on_missing_signal = env
        .get_var("FAIL_ON_MISSING_SIGNAL")
        .map(|v| parse_bool(&v))
        .transpose()
        .context("Invalid FAIL_ON_MISSING_SIGNAL")?
        .unwrap_or(false);

    Ok(Config {
        prometheus_address,
        cpu_metric_name,
        cpu_request_resource,
        namespace,
        selector,
        custom_metrics,
        fail_on_missing_signal,
    })
}

fn non_empty<E: EnvironmentProvider>(env: &E, key: &str) -> Option<String> {
    env.get_var(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "false" | "FALSE" | "False" | "" => Ok(false),
        other => Err(anyhow!("expected a boolean, got {:?}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_loading_with_env() {
        let env = MockEnvironment::new()
            .with_var("PROMETHEUS_ADDRESS", "http://prometheus.monitoring:9090")
            .with_var("CPU_UTILIZATION_METRIC", "container_cpu_usage_seconds")
            .with_var("CPU_REQUEST_RESOURCE", "example.com/vcpu")
            .with_var("NAMESPACE", "web")
            .with_var("SELECTOR", "app=frontend,tier in (web)")
            .with_var("CUSTOM_METRICS", "qos, http_requests_total")
            .with_var("FAIL_ON_MISSING_SIGNAL", "true");

        let config = load_config_with_env(&env).unwrap();

        assert_eq!(config.prometheus_address, "http://prometheus.monitoring:9090");
        assert_eq!(config.cpu_metric_name, "container_cpu_usage_seconds");
        assert_eq!(config.cpu_request_resource, "example.com/vcpu");
        assert_eq!(config.namespace, "web");
        assert_eq!(config.selector, "app=frontend,tier in (web)");
        assert_eq!(config.custom_metrics, vec!["qos", "http_requests_total"]);
        assert!(config.fail_on_missing_signal);

        let settings = config.metrics_settings();
        assert_eq!(settings.cpu_metric_name, "container_cpu_usage_seconds");
        assert_eq!(settings.cpu_request_resource, "example.com/vcpu");
    }

    #[test]
    fn test_config_loading_defaults() {
        let env = MockEnvironment::new().with_var("NAMESPACE", "default");

        let config = load_config_with_env(&env).unwrap();

        assert_eq!(config.prometheus_address, DEFAULT_PROMETHEUS_ADDRESS);
        assert_eq!(config.cpu_metric_name, "container_cpu_usage_seconds_total");
        assert_eq!(config.cpu_request_resource, "cpu");
        assert_eq!(config.selector, "");
        assert!(config.custom_metrics.is_empty());
        assert!(!config.fail_on_missing_signal);
    }

    #[test]
    fn test_config_loading_missing_namespace() {
        let result = load_config_with_env(&MockEnvironment::new());
        assert!(result.unwrap_err().to_string().contains("NAMESPACE"));

        let env = MockEnvironment::new().with_var("NAMESPACE", "   ");
        assert!(load_config_with_env(&env).is_err());
    }

    #[test]
    fn test_config_loading_invalid_address() {
        let env = MockEnvironment::new()
            .with_var("NAMESPACE", "default")
            .with_var("PROMETHEUS_ADDRESS", "prometheus:9090");

        let result = load_config_with_env(&env);
        assert!(result.unwrap_err().to_string().contains("PROMETHEUS_ADDRESS"));
    }

    #[test]
    fn test_boolean_parsing() {
        for val in ["1", "true", "TRUE", "True"] {
            let env = MockEnvironment::new()
                .with_var("NAMESPACE", "test")
                .with_var("FAIL_ON_MISSING_SIGNAL", val);
            assert!(load_config_with_env(&env).unwrap().fail_on_missing_signal, "Failed for value: {}", val);
        }

        for val in ["0", "false", "FALSE", "False", ""] {
            let env = MockEnvironment::new()
                .with_var("NAMESPACE", "test")
                .with_var("FAIL_ON_MISSING_SIGNAL", val);
            assert!(!load_config_with_env(&env).unwrap().fail_on_missing_signal, "Failed for value: {}", val);
        }

        let env = MockEnvironment::new()
            .with_var("NAMESPACE", "test")
            .with_var("FAIL_ON_MISSING_SIGNAL", "maybe");
        let result = load_config_with_env(&env);
        assert!(result.unwrap_err().to_string().contains("FAIL_ON_MISSING_SIGNAL"));
    }

    #[test]
    fn test_custom_metrics_parsing() {
        let env = MockEnvironment::new()
            .with_var("NAMESPACE", "test")
            .with_var("CUSTOM_METRICS", " qos , , latency_ms ,");

        let config = load_config_with_env(&env).unwrap();
        assert_eq!(config.custom_metrics, vec!["qos", "latency_ms"]);
    }
}
