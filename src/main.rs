use std::sync::Arc;

use anyhow::{anyhow, Result};
use kube::Client;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use prometheus_hpa_metrics::{load_config, KubePodLister, MetricsClient, PrometheusClient, PrometheusMetricsClient};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cfg = load_config()?;
    info!("prometheus = {}, namespace = {}, selector = {:?}", cfg.prometheus_address, cfg.namespace, cfg.selector);

    let client = Client::try_default().await?;
    let metrics_client = PrometheusMetricsClient::new(
        Arc::new(KubePodLister::new(client)),
        Arc::new(PrometheusClient::new(&cfg.prometheus_address)),
        cfg.metrics_settings(),
    );

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling in-flight queries");
            on_signal.cancel();
        }
    });

    let mut failures = 0;

    match metrics_client.cpu_utilization(&cfg.namespace, &cfg.selector, &cancel).await {
        Ok(obs) => info!("cpu utilization: {}% (observed at {})", obs.value, obs.timestamp),
        Err(e) => {
            warn!("cpu utilization unavailable: {}", e);
            failures += 1;
        }
    }

    for metric in &cfg.custom_metrics {
        match metrics_client.custom_metric(metric, &cfg.namespace, &cfg.selector, &cancel).await {
            Ok(obs) => info!("{}: {} per pod (observed at {})", metric, obs.value, obs.timestamp),
            Err(e) => {
                warn!("{} unavailable: {}", metric, e);
                failures += 1;
            }
        }
    }

    if failures > 0 && cfg.fail_on_missing_signal {
        return Err(anyhow!("{} signal(s) could not be computed", failures));
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .try_init();
}
