use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub namespace: Option<String>,
    pub excluded_namespaces: Vec<String>,
    pub time_range: String,
    pub prometheus_url: Option<String>,
    pub prometheus_route: RouteRef,
    pub bearer_token: Option<String>,
    pub insecure_skip_tls_verify: bool,
    pub request_timeout_secs: u64,
    pub output_dir: PathBuf,
}

impl Config {
    pub fn is_excluded(&self, namespace: &str) -> bool {
        self.excluded_namespaces.iter().any(|ns| ns == namespace)
    }
}

/// Location of the OpenShift route fronting Prometheus.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRef {
    pub name: String,
    pub namespace: String,
}

/// A pod as listed from the cluster API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodRef {
    pub namespace: String,
    pub name: String,
    pub node: Option<String>,
}

impl PodRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            node: None,
        }
    }

    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }
}

/// One element of an instant-vector query result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Sample {
    #[serde(default)]
    pub metric: HashMap<String, String>,
    /// `[unix_timestamp, "value"]`
    pub value: (f64, String),
}

impl Sample {
    pub fn new<I, K, V>(labels: I, value: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            metric: labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            value: (0.0, value.into()),
        }
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.metric.get(name).map(String::as_str)
    }
}
