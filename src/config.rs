use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::cli::Cli;
use crate::parsing::is_valid_time_range;
use crate::types::{Config, RouteRef};

pub const DEFAULT_TIME_RANGE: &str = "2d";
pub const DEFAULT_ROUTE_NAME: &str = "prometheus-k8s";
pub const DEFAULT_ROUTE_NAMESPACE: &str = "openshift-monitoring";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Platform namespaces left out of the report unless `EXCLUDE_NAMESPACES` overrides them.
pub const DEFAULT_EXCLUDED_NAMESPACES: &[&str] = &[
    "default",
    "glusterfs",
    "kube-public",
    "kube-service-catalog",
    "kube-system",
    "openshift",
    "openshift-console",
    "openshift-infra",
    "openshift-logging",
    "openshift-metrics-server",
    "openshift-migration",
    "openshift-monitoring",
    "openshift-node",
    "openshift-sdn",
    "openshift-template-service-broker",
    "openshift-web-console",
    "stackrox",
];

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

/// Mock implementation for testing
#[derive(Debug, Default)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn set_var<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_var<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set_var(key, value);
        self
    }
}

impl EnvironmentProvider for MockEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn load_config(cli: &Cli) -> Result<Config> {
    load_config_with_env(cli, &SystemEnvironment)
}

/// Merge CLI flags over environment variables over defaults.
pub fn load_config_with_env<E: EnvironmentProvider>(cli: &Cli, env: &E) -> Result<Config> {
    let namespace = cli
        .namespace
        .clone()
        .or_else(|| non_empty(env.get_var("REPORT_NAMESPACE")));

    let mut excluded_namespaces: Vec<String> = match env.get_var("EXCLUDE_NAMESPACES") {
        Some(list) => split_list(&list),
        None => DEFAULT_EXCLUDED_NAMESPACES.iter().map(|s| s.to_string()).collect(),
    };
    for ns in &cli.exclude {
        if !excluded_namespaces.contains(ns) {
            excluded_namespaces.push(ns.clone());
        }
    }

    let time_range = cli
        .time_range
        .clone()
        .or_else(|| non_empty(env.get_var("TIME_RANGE")))
        .unwrap_or_else(|| DEFAULT_TIME_RANGE.to_string());
    if !is_valid_time_range(&time_range) {
        return Err(anyhow!(
            "Invalid TIME_RANGE {:?}: expected <number><unit>, unit one of ms,s,m,h,d,w,y",
            time_range
        ));
    }

    let prometheus_url = cli
        .prometheus_url
        .clone()
        .or_else(|| non_empty(env.get_var("PROMETHEUS_URL")))
        .map(|url| url.trim_end_matches('/').to_string());

    let prometheus_route = RouteRef {
        name: non_empty(env.get_var("PROMETHEUS_ROUTE_NAME"))
            .unwrap_or_else(|| DEFAULT_ROUTE_NAME.to_string()),
        namespace: non_empty(env.get_var("PROMETHEUS_ROUTE_NAMESPACE"))
            .unwrap_or_else(|| DEFAULT_ROUTE_NAMESPACE.to_string()),
    };

    let bearer_token = non_empty(env.get_var("PROMETHEUS_TOKEN"));

    let insecure_skip_tls_verify = match env.get_var("PROMETHEUS_INSECURE") {
        Some(v) => parse_bool(&v).ok_or_else(|| anyhow!("Invalid PROMETHEUS_INSECURE {:?}", v))?,
        None => true,
    };

    let request_timeout_secs: u64 = env
        .get_var("PROMETHEUS_TIMEOUT_SECS")
        .unwrap_or_else(|| DEFAULT_TIMEOUT_SECS.to_string())
        .trim()
        .parse()
        .context("Invalid PROMETHEUS_TIMEOUT_SECS")?;

    let output_dir = cli
        .output_dir
        .clone()
        .or_else(|| non_empty(env.get_var("REPORT_OUTPUT_DIR")).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(Config {
        namespace,
        excluded_namespaces,
        time_range,
        prometheus_url,
        prometheus_route,
        bearer_token,
        insecure_skip_tls_verify,
        request_timeout_secs,
        output_dir,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "True" | "yes" => Some(true),
        "0" | "false" | "FALSE" | "False" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = load_config_with_env(&Cli::default(), &MockEnvironment::new()).unwrap();

        assert_eq!(config.namespace, None);
        assert_eq!(config.excluded_namespaces.len(), DEFAULT_EXCLUDED_NAMESPACES.len());
        assert!(config.is_excluded("openshift-monitoring"));
        assert!(config.is_excluded("stackrox"));
        assert!(!config.is_excluded("shop"));
        assert_eq!(config.time_range, "2d");
        assert_eq!(config.prometheus_url, None);
        assert_eq!(config.prometheus_route.name, "prometheus-k8s");
        assert_eq!(config.prometheus_route.namespace, "openshift-monitoring");
        assert_eq!(config.bearer_token, None);
        assert!(config.insecure_skip_tls_verify);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_config_loading_with_env() {
        let env = MockEnvironment::new()
            .with_var("REPORT_NAMESPACE", "shop")
            .with_var("EXCLUDE_NAMESPACES", "kube-system, infra ,")
            .with_var("TIME_RANGE", "12h")
            .with_var("PROMETHEUS_URL", "https://thanos.example.com/")
            .with_var("PROMETHEUS_ROUTE_NAME", "thanos-querier")
            .with_var("PROMETHEUS_ROUTE_NAMESPACE", "monitoring")
            .with_var("PROMETHEUS_TOKEN", "sha256~abc")
            .with_var("PROMETHEUS_INSECURE", "false")
            .with_var("PROMETHEUS_TIMEOUT_SECS", "5")
            .with_var("REPORT_OUTPUT_DIR", "/reports");

        let config = load_config_with_env(&Cli::default(), &env).unwrap();

        assert_eq!(config.namespace.as_deref(), Some("shop"));
        assert_eq!(config.excluded_namespaces, vec!["kube-system", "infra"]);
        assert_eq!(config.time_range, "12h");
        assert_eq!(config.prometheus_url.as_deref(), Some("https://thanos.example.com"));
        assert_eq!(config.prometheus_route.name, "thanos-querier");
        assert_eq!(config.prometheus_route.namespace, "monitoring");
        assert_eq!(config.bearer_token.as_deref(), Some("sha256~abc"));
        assert!(!config.insecure_skip_tls_verify);
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.output_dir, PathBuf::from("/reports"));
    }

    #[test]
    fn test_cli_overrides_env() {
        let env = MockEnvironment::new()
            .with_var("REPORT_NAMESPACE", "from-env")
            .with_var("TIME_RANGE", "12h")
            .with_var("PROMETHEUS_URL", "https://env.example.com")
            .with_var("REPORT_OUTPUT_DIR", "/env");
        let cli = Cli {
            namespace: Some("from-cli".to_string()),
            prometheus_url: Some("https://cli.example.com".to_string()),
            time_range: Some("1w".to_string()),
            exclude: vec!["batch".to_string(), "kube-system".to_string()],
            output_dir: Some(PathBuf::from("/cli")),
        };

        let config = load_config_with_env(&cli, &env).unwrap();

        assert_eq!(config.namespace.as_deref(), Some("from-cli"));
        assert_eq!(config.prometheus_url.as_deref(), Some("https://cli.example.com"));
        assert_eq!(config.time_range, "1w");
        assert_eq!(config.output_dir, PathBuf::from("/cli"));
        // --exclude appends to the default list without duplicating it
        assert!(config.is_excluded("batch"));
        assert_eq!(
            config.excluded_namespaces.iter().filter(|ns| *ns == "kube-system").count(),
            1
        );
        assert_eq!(config.excluded_namespaces.len(), DEFAULT_EXCLUDED_NAMESPACES.len() + 1);
    }

    #[test]
    fn test_empty_exclude_env_disables_default_list() {
        let env = MockEnvironment::new().with_var("EXCLUDE_NAMESPACES", "");
        let config = load_config_with_env(&Cli::default(), &env).unwrap();
        assert!(config.excluded_namespaces.is_empty());
        assert!(!config.is_excluded("kube-system"));
    }

    #[test]
    fn test_invalid_time_range() {
        let env = MockEnvironment::new().with_var("TIME_RANGE", "two days");
        let result = load_config_with_env(&Cli::default(), &env);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("TIME_RANGE"));
    }

    #[test]
    fn test_invalid_timeout() {
        let env = MockEnvironment::new().with_var("PROMETHEUS_TIMEOUT_SECS", "soon");
        let result = load_config_with_env(&Cli::default(), &env);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("PROMETHEUS_TIMEOUT_SECS"));
    }

    #[test]
    fn test_boolean_parsing() {
        for val in ["1", "true", "TRUE", "True", "yes"] {
            let env = MockEnvironment::new().with_var("PROMETHEUS_INSECURE", val);
            let config = load_config_with_env(&Cli::default(), &env).unwrap();
            assert!(config.insecure_skip_tls_verify, "Failed for value: {}", val);
        }

        for val in ["0", "false", "FALSE", "False", "no"] {
            let env = MockEnvironment::new().with_var("PROMETHEUS_INSECURE", val);
            let config = load_config_with_env(&Cli::default(), &env).unwrap();
            assert!(!config.insecure_skip_tls_verify, "Failed for value: {}", val);
        }

        let env = MockEnvironment::new().with_var("PROMETHEUS_INSECURE", "maybe");
        let result = load_config_with_env(&Cli::default(), &env);
        assert!(result.unwrap_err().to_string().contains("PROMETHEUS_INSECURE"));
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let env = MockEnvironment::new()
            .with_var("REPORT_NAMESPACE", "  ")
            .with_var("PROMETHEUS_URL", "")
            .with_var("PROMETHEUS_TOKEN", " ");
        let config = load_config_with_env(&Cli::default(), &env).unwrap();
        assert_eq!(config.namespace, None);
        assert_eq!(config.prometheus_url, None);
        assert_eq!(config.bearer_token, None);
    }
}
