// Public modules
pub mod types;
pub mod cli;
pub mod config;
pub mod parsing;
pub mod queries;
pub mod prometheus;
pub mod kubernetes;
pub mod collector;
pub mod report;

// Re-export commonly used items
pub use types::*;
pub use cli::Cli;
pub use config::{load_config, load_config_with_env, EnvironmentProvider, SystemEnvironment, MockEnvironment};
pub use parsing::{round_to, round_cores, round_mebibytes, format_decimal, container_label, parse_sample_value};
pub use queries::{pod_queries, QueryKind};
pub use prometheus::{MetricSource, PrometheusClient, PrometheusError};
pub use kubernetes::{list_pods, resolve_prometheus_url, resolve_bearer_token};
pub use collector::MetricsCollector;
pub use report::{ContainerRecord, CsvReport, ReportData, ReportSummary, RowError};
