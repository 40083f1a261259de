use std::collections::BTreeSet;

/// Rate window for the CPU usage counter.
pub const CPU_RATE_WINDOW: &str = "30m";

/// Regex matching any pod whose name starts with one of `pod_names`, e.g.
/// `(a|b).*`. Names are used as prefixes so per-instance suffixes still match.
pub fn pod_name_pattern(pod_names: &BTreeSet<String>) -> String {
    let alternatives: Vec<&str> = pod_names.iter().map(String::as_str).collect();
    format!("({}).*", alternatives.join("|"))
}

/// Summed per-second CPU usage of the matching pods over [`CPU_RATE_WINDOW`].
pub fn cpu_usage_query(cpu_metric_name: &str, namespace: &str, pod_pattern: &str) -> String {
    format!(
        "sum(rate({{__name__='{}',namespace='{}',pod_name=~'{}'}}[{}]))",
        cpu_metric_name, namespace, pod_pattern, CPU_RATE_WINDOW
    )
}

/// Instantaneous sum of a custom metric across the matching pods.
pub fn custom_metric_query(metric_name: &str, namespace: &str, pod_pattern: &str) -> String {
    format!(
        "sum({{__name__='{}',kubernetes_namespace='{}',kubernetes_pod_name=~'{}'}})",
        metric_name, namespace, pod_pattern
    )
}
