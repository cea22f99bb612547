use clap::Parser;
use std::path::PathBuf;

/// Per-container CPU and memory request/limit/usage report for Kubernetes and OpenShift
#[derive(Debug, Default, Clone, Parser)]
#[command(name = "pod-resource-report")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Only report pods in this namespace (default: all namespaces)
    #[arg(short = 'n', long = "namespace", value_name = "NAMESPACE")]
    pub namespace: Option<String>,

    /// Prometheus base URL; skips the OpenShift route lookup
    #[arg(long, value_name = "URL")]
    pub prometheus_url: Option<String>,

    /// PromQL range used for usage average/max (e.g. 2d, 12h)
    #[arg(long, value_name = "RANGE")]
    pub time_range: Option<String>,

    /// Additional namespace to exclude (repeatable)
    #[arg(long = "exclude", value_name = "NAMESPACE")]
    pub exclude: Vec<String>,

    /// Directory the CSV report is written to
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}
