use std::collections::BTreeSet;

use k8s_openapi::api::core::v1::{Container, Pod};
use tracing::debug;

use crate::error::{MetricsError, Result};
use crate::parsing::parse_quantity_millis;
use crate::types::{PhaseFilter, PodPhase, RequestSummary};

pub fn pod_phase(pod: &Pod) -> PodPhase {
    PodPhase::from_status(pod.status.as_ref().and_then(|s| s.phase.as_deref()))
}

/// Names of the pods admitted by `filter`. Fails when pods were listed but
/// none of them passes the filter, or when nothing was listed at all.
pub fn eligible_pod_names(pods: &[Pod], filter: PhaseFilter, namespace: &str) -> Result<BTreeSet<String>> {
    let names: BTreeSet<String> = pods
        .iter()
        .filter(|pod| filter.admits(pod_phase(pod)))
        .filter_map(|pod| pod.metadata.name.clone())
        .collect();

    if names.is_empty() {
        return Err(MetricsError::NoEligiblePods {
            namespace: namespace.to_string(),
            phase: filter.describe(),
            listed: pods.len(),
        });
    }
    Ok(names)
}

/// Sums the `resource` request of every container in every running pod.
///
/// A container without the request (or with one that cannot be parsed)
/// poisons the whole sum, as does an average request that truncates to zero,
/// since the average is later used as a divisor.
pub fn sum_running_requests(pods: &[Pod], resource: &str, namespace: &str) -> Result<RequestSummary> {
    let mut pod_names = BTreeSet::new();
    let mut request_sum_millis: i64 = 0;
    let mut missing = false;

    for pod in pods {
        if !PhaseFilter::RunningOnly.admits(pod_phase(pod)) {
            continue;
        }
        let Some(name) = pod.metadata.name.as_ref() else {
            continue;
        };
        pod_names.insert(name.clone());

        let containers: &[Container] = pod.spec.as_ref().map(|s| s.containers.as_slice()).unwrap_or_default();
        for container in containers {
            match container_request_millis(container, resource) {
                Some(millis) => request_sum_millis = request_sum_millis.saturating_add(millis),
                None => {
                    debug!("{}/{} container {} has no {} request", namespace, name, container.name, resource);
                    missing = true;
                }
            }
        }
    }

    if pod_names.is_empty() {
        return Err(MetricsError::NoEligiblePods {
            namespace: namespace.to_string(),
            phase: PhaseFilter::RunningOnly.describe(),
            listed: pods.len(),
        });
    }
    let missing_request = || MetricsError::MissingResourceRequest {
        namespace: namespace.to_string(),
        resource: resource.to_string(),
    };
    if missing {
        return Err(missing_request());
    }

    debug!("{} - sum of {} requested: {}m over {} pods", namespace, resource, request_sum_millis, pod_names.len());
    RequestSummary::new(pod_names, request_sum_millis).ok_or_else(missing_request)
}

fn container_request_millis(container: &Container, resource: &str) -> Option<i64> {
    container
        .resources
        .as_ref()?
        .requests
        .as_ref()?
        .get(resource)
        .and_then(|q| parse_quantity_millis(&q.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{PodSpec, PodStatus, ResourceRequirements};
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    fn container(cpu: Option<&str>) -> Container {
        Container {
            name: "main".to_string(),
            resources: cpu.map(|c| ResourceRequirements {
                requests: Some(BTreeMap::from([("cpu".to_string(), Quantity(c.to_string()))])),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn create_test_pod(name: &str, phase: &str, containers: Vec<Container>) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("ns1".to_string()),
                ..Default::default()
            },
            spec: Some(PodSpec {
                containers,
                ..Default::default()
            }),
            status: Some(PodStatus {
                phase: Some(phase.to_string()),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_sum_running_requests() {
        let pods = vec![
            create_test_pod("a", "Running", vec![container(Some("100m"))]),
            create_test_pod("b", "Running", vec![container(Some("200m")), container(Some("0.1"))]),
        ];
        let summary = sum_running_requests(&pods, "cpu", "ns1").unwrap();
        assert_eq!(summary.request_sum_millis(), 400);
        assert_eq!(summary.pod_count(), 2);
        assert_eq!(summary.average_request_millis(), 200);
    }

    #[test]
    fn test_sum_running_requests_skips_other_phases() {
        let pods = vec![
            create_test_pod("a", "Running", vec![container(Some("300m"))]),
            create_test_pod("b", "Pending", vec![container(None)]),
            create_test_pod("c", "Succeeded", vec![container(None)]),
        ];
        let summary = sum_running_requests(&pods, "cpu", "ns1").unwrap();
        assert_eq!(summary.request_sum_millis(), 300);
        assert_eq!(summary.pod_names().iter().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_sum_running_requests_missing_request() {
        let pods = vec![
            create_test_pod("a", "Running", vec![container(Some("100m"))]),
            create_test_pod("b", "Running", vec![container(Some("100m")), container(None)]),
        ];
        let err = sum_running_requests(&pods, "cpu", "ns1").unwrap_err();
        assert!(matches!(err, MetricsError::MissingResourceRequest { .. }));
    }

    #[test]
    fn test_sum_running_requests_zero_sum() {
        let pods = vec![create_test_pod("a", "Running", vec![container(Some("0"))])];
        let err = sum_running_requests(&pods, "cpu", "ns1").unwrap_err();
        assert!(matches!(err, MetricsError::MissingResourceRequest { .. }));
    }

    #[test]
    fn test_sum_running_requests_average_truncates_to_zero() {
        let pods = vec![
            create_test_pod("a", "Running", vec![container(Some("1m"))]),
            create_test_pod("b", "Running", vec![container(Some("0"))]),
            create_test_pod("c", "Running", vec![container(Some("0"))]),
        ];
        let err = sum_running_requests(&pods, "cpu", "ns1").unwrap_err();
        assert!(matches!(err, MetricsError::MissingResourceRequest { .. }));
    }

    #[test]
    fn test_sum_running_requests_unparsable_request_counts_as_missing() {
        let pods = vec![create_test_pod("a", "Running", vec![container(Some("lots"))])];
        let err = sum_running_requests(&pods, "cpu", "ns1").unwrap_err();
        assert!(matches!(err, MetricsError::MissingResourceRequest { .. }));
    }

    #[test]
    fn test_sum_running_requests_no_running_pods() {
        let pods = vec![
            create_test_pod("a", "Pending", vec![container(Some("100m"))]),
            create_test_pod("b", "Failed", vec![container(Some("100m"))]),
        ];
        match sum_running_requests(&pods, "cpu", "ns1").unwrap_err() {
            MetricsError::NoEligiblePods { listed, phase, .. } => {
                assert_eq!(listed, 2);
                assert_eq!(phase, "running");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_sum_running_requests_empty_list() {
        match sum_running_requests(&[], "cpu", "ns1").unwrap_err() {
            MetricsError::NoEligiblePods { listed, .. } => assert_eq!(listed, 0),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_eligible_pod_names_not_pending() {
        let pods = vec![
            create_test_pod("a", "Running", vec![]),
            create_test_pod("b", "Pending", vec![]),
            create_test_pod("c", "Succeeded", vec![]),
            create_test_pod("d", "Failed", vec![]),
        ];
        let names = eligible_pod_names(&pods, PhaseFilter::NotPending, "ns1").unwrap();
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["a", "c", "d"]);
    }

    #[test]
    fn test_eligible_pod_names_missing_phase_is_not_pending() {
        let mut pod = create_test_pod("a", "Running", vec![]);
        pod.status = None;
        let names = eligible_pod_names(&[pod.clone()], PhaseFilter::NotPending, "ns1").unwrap();
        assert!(names.contains("a"));
        assert!(eligible_pod_names(&[pod], PhaseFilter::RunningOnly, "ns1").is_err());
    }

    #[test]
    fn test_eligible_pod_names_all_pending() {
        let pods = vec![create_test_pod("a", "Pending", vec![])];
        match eligible_pod_names(&pods, PhaseFilter::NotPending, "ns1").unwrap_err() {
            MetricsError::NoEligiblePods { listed, phase, .. } => {
                assert_eq!(listed, 1);
                assert_eq!(phase, "non-pending");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
