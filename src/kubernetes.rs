use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::{api::ListParams, Api, Client};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{MetricsError, Result};

/// Source of pods for a namespace and label selector.
#[async_trait]
pub trait PodLister: Send + Sync {
    async fn list_pods(&self, namespace: &str, selector: &str) -> std::result::Result<Vec<Pod>, kube::Error>;
}

/// Lists pods through the Kubernetes API.
#[derive(Clone)]
pub struct KubePodLister {
    client: Client,
}

impl KubePodLister {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PodLister for KubePodLister {
    async fn list_pods(&self, namespace: &str, selector: &str) -> std::result::Result<Vec<Pod>, kube::Error> {
        let pod_api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let mut params = ListParams::default();
        if !selector.is_empty() {
            params = params.labels(selector);
        }
        let pods = pod_api.list(&params).await?;
        Ok(pods.items)
    }
}

/// Lists every pod matching `selector` in `namespace`, regardless of phase.
/// Phase filtering is left to the caller since each signal uses its own policy.
pub async fn resolve_pods(
    lister: &dyn PodLister,
    namespace: &str,
    selector: &str,
    cancel: &CancellationToken,
) -> Result<Vec<Pod>> {
    let pods = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(MetricsError::Cancelled { stage: "listing pods" }),
        listed = lister.list_pods(namespace, selector) => listed,
    }
    .map_err(|source| MetricsError::PodList {
        namespace: namespace.to_string(),
        source,
    })?;

    debug!("{} {:?} - listed {} pods", namespace, selector, pods.len());
    Ok(pods)
}
