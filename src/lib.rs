// Public modules
pub mod types;
pub mod error;
pub mod config;
pub mod parsing;
pub mod kubernetes;
pub mod metrics;
pub mod collector;

// Re-export commonly used items
pub use types::*;
pub use error::{BackendError, MetricsError};
pub use config::{load_config, load_config_with_env, EnvironmentProvider, SystemEnvironment, MockEnvironment};
pub use parsing::{parse_quantity_millis, parse_sample_timestamp, parse_sample_value};
pub use kubernetes::{resolve_pods, KubePodLister, PodLister};
pub use metrics::*;
pub use collector::{MetricsClient, PrometheusMetricsClient};
