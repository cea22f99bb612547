use std::fmt;

/// The eight per-pod measurements that make up a report row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryKind {
    CpuRequest,
    CpuUsageAvg,
    CpuUsageMax,
    CpuLimit,
    MemoryRequest,
    MemoryUsageAvg,
    MemoryUsageMax,
    MemoryLimit,
}

impl QueryKind {
    /// All kinds in column order.
    pub const ALL: [QueryKind; 8] = [
        QueryKind::CpuRequest,
        QueryKind::CpuUsageAvg,
        QueryKind::CpuUsageMax,
        QueryKind::CpuLimit,
        QueryKind::MemoryRequest,
        QueryKind::MemoryUsageAvg,
        QueryKind::MemoryUsageMax,
        QueryKind::MemoryLimit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            QueryKind::CpuRequest => "cpu_request",
            QueryKind::CpuUsageAvg => "cpu_usage_avg",
            QueryKind::CpuUsageMax => "cpu_usage_max",
            QueryKind::CpuLimit => "cpu_limit",
            QueryKind::MemoryRequest => "memory_request",
            QueryKind::MemoryUsageAvg => "memory_usage_avg",
            QueryKind::MemoryUsageMax => "memory_usage_max",
            QueryKind::MemoryLimit => "memory_limit",
        }
    }

    pub fn is_cpu(self) -> bool {
        matches!(
            self,
            QueryKind::CpuRequest | QueryKind::CpuUsageAvg | QueryKind::CpuUsageMax | QueryKind::CpuLimit
        )
    }

    /// Render the PromQL expression for one pod.
    ///
    /// CPU queries return cores, memory queries return MiB.
    pub fn promql(self, namespace: &str, pod: &str, time_range: &str) -> String {
        let ns = escape_label_value(namespace);
        let pod = escape_label_value(pod);
        match self {
            QueryKind::CpuRequest => format!(
                "avg(kube_pod_container_resource_requests_cpu_cores{{namespace=\"{ns}\",pod=\"{pod}\"}}) by (container,namespace,pod,node)"
            ),
            QueryKind::CpuUsageAvg => format!(
                "avg_over_time(namespace_pod_name_container_name:container_cpu_usage_seconds_total:sum_rate{{container_name!=\"POD\",namespace=\"{ns}\",pod_name=\"{pod}\"}}[{time_range}])"
            ),
            QueryKind::CpuUsageMax => format!(
                "max_over_time(namespace_pod_name_container_name:container_cpu_usage_seconds_total:sum_rate{{container_name!=\"POD\",namespace=\"{ns}\",pod_name=\"{pod}\"}}[{time_range}])"
            ),
            QueryKind::CpuLimit => format!(
                "avg(kube_pod_container_resource_limits_cpu_cores{{namespace=\"{ns}\",pod=\"{pod}\"}}) by (container,namespace,pod,node)"
            ),
            QueryKind::MemoryRequest => format!(
                "kube_pod_container_resource_requests_memory_bytes{{namespace=\"{ns}\",pod=\"{pod}\"}}/1024/1024"
            ),
            QueryKind::MemoryUsageAvg => format!(
                "avg_over_time(container_memory_usage_bytes{{image!=\"\",container_name!=\"POD\",namespace=\"{ns}\",pod_name=\"{pod}\"}}[{time_range}])/1024/1024"
            ),
            QueryKind::MemoryUsageMax => format!(
                "max_over_time(container_memory_usage_bytes{{image!=\"\",container_name!=\"POD\",namespace=\"{ns}\",pod_name=\"{pod}\"}}[{time_range}])/1024/1024"
            ),
            QueryKind::MemoryLimit => format!(
                "kube_pod_container_resource_limits_memory_bytes{{namespace=\"{ns}\",pod=\"{pod}\"}}/1024/1024"
            ),
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Build the full query set for a pod, in column order.
pub fn pod_queries(namespace: &str, pod: &str, time_range: &str) -> Vec<(QueryKind, String)> {
    QueryKind::ALL
        .iter()
        .map(|kind| (*kind, kind.promql(namespace, pod, time_range)))
        .collect()
}

fn escape_label_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}
