use anyhow::{anyhow, Context, Result};
use k8s_openapi::api::core::v1::Pod;
use kube::api::{ApiResource, DynamicObject, ListParams};
use kube::config::KubeConfigOptions;
use kube::core::GroupVersionKind;
use kube::{Api, Client};
use secrecy::ExposeSecret;
use std::path::Path;
use tracing::{debug, info};

use crate::config::EnvironmentProvider;
use crate::types::{Config, PodRef, RouteRef};

pub const SERVICE_ACCOUNT_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// List pods in one namespace, or cluster-wide when none is given.
pub async fn list_pods(client: &Client, namespace: Option<&str>) -> Result<Vec<PodRef>> {
    let api: Api<Pod> = match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    };
    let pods = api
        .list(&ListParams::default())
        .await
        .context("Failed to list pods")?
        .items;
    debug!("Listed {} pods", pods.len());
    Ok(pods.iter().filter_map(pod_ref).collect())
}

pub fn pod_ref(pod: &Pod) -> Option<PodRef> {
    let name = pod.metadata.name.clone()?;
    let namespace = pod.metadata.namespace.clone()?;
    let node = pod.spec.as_ref().and_then(|s| s.node_name.clone());
    Some(PodRef { namespace, name, node })
}

/// Look up the OpenShift route in front of Prometheus and return its https URL.
pub async fn discover_prometheus_url(client: &Client, route: &RouteRef) -> Result<String> {
    let ar = ApiResource::from_gvk(&GroupVersionKind {
        group: "route.openshift.io".to_string(),
        version: "v1".to_string(),
        kind: "Route".to_string(),
    });
    let api: Api<DynamicObject> = Api::namespaced_with(client.clone(), &route.namespace, &ar);
    let obj = api
        .get(&route.name)
        .await
        .with_context(|| format!("Failed to get route {}/{}", route.namespace, route.name))?;
    route_url(&obj).ok_or_else(|| {
        anyhow!("Route {}/{} has no spec.host", route.namespace, route.name)
    })
}

pub fn route_url(route: &DynamicObject) -> Option<String> {
    let host = route.data.get("spec")?.get("host")?.as_str()?;
    if host.is_empty() {
        return None;
    }
    Some(format!("https://{}", host))
}

pub async fn resolve_prometheus_url(client: &Client, cfg: &Config) -> Result<String> {
    if let Some(url) = &cfg.prometheus_url {
        return Ok(url.clone());
    }
    discover_prometheus_url(client, &cfg.prometheus_route).await
}

/// Token sent to Prometheus: explicit setting, then service account, then kubeconfig.
pub async fn resolve_bearer_token(cfg: &Config, kube_config: &kube::Config) -> Result<String> {
    resolve_bearer_token_from(cfg, kube_config, Path::new(SERVICE_ACCOUNT_TOKEN_PATH)).await
}

pub async fn resolve_bearer_token_from(
    cfg: &Config,
    kube_config: &kube::Config,
    service_account_token: &Path,
) -> Result<String> {
    if let Some(token) = &cfg.bearer_token {
        return Ok(token.clone());
    }
    if let Some(token) = read_token_file(service_account_token).await {
        debug!("Using service account token");
        return Ok(token);
    }
    kube_config
        .auth_info
        .token
        .as_ref()
        .map(|t| t.expose_secret().trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| anyhow!("No bearer token available; set PROMETHEUS_TOKEN or log in with a token"))
}

pub async fn read_token_file(path: &Path) -> Option<String> {
    let raw = tokio::fs::read_to_string(path).await.ok()?;
    let token = raw.trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    InCluster,
    Kubeconfig,
}

/// In-cluster whenever `KUBERNETES_SERVICE_HOST` is set, kubeconfig otherwise.
pub fn config_source<E: EnvironmentProvider>(env: &E) -> ConfigSource {
    match env.get_var("KUBERNETES_SERVICE_HOST") {
        Some(host) if !host.trim().is_empty() => ConfigSource::InCluster,
        _ => ConfigSource::Kubeconfig,
    }
}

pub async fn load_kube_config<E: EnvironmentProvider>(env: &E) -> Result<kube::Config> {
    match config_source(env) {
        ConfigSource::InCluster => {
            info!("Running inside the cluster, using service account");
            kube::Config::incluster().context("Failed to load in-cluster configuration")
        }
        ConfigSource::Kubeconfig => kube::Config::from_kubeconfig(&KubeConfigOptions::default())
            .await
            .context("Failed to load kubeconfig"),
    }
}

pub fn connect(kube_config: kube::Config) -> Result<Client> {
    info!("K8s Host: {}", kube_config.cluster_url);
    Client::try_from(kube_config).context("Failed to build Kubernetes client")
}
