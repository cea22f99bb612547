use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::types::Sample;

#[derive(Debug, Error)]
pub enum PrometheusError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Prometheus returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("failed to decode Prometheus response: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("query failed ({error_type}): {error}")]
    Query { error_type: String, error: String },
    #[error("unexpected result type {0:?}, expected vector")]
    ResultType(String),
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default, rename = "errorType")]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(rename = "resultType")]
    result_type: String,
    #[serde(default)]
    result: Vec<Sample>,
}

/// Anything that can answer a PromQL instant query.
#[allow(async_fn_in_trait)]
pub trait MetricSource {
    async fn query(&self, promql: &str) -> Result<Vec<Sample>, PrometheusError>;
}

/// HTTP client for the Prometheus `/api/v1/query` endpoint.
pub struct PrometheusClient {
    http: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

impl PrometheusClient {
    pub fn new(
        base_url: &str,
        bearer_token: impl Into<String>,
        insecure_skip_tls_verify: bool,
        timeout: Duration,
    ) -> Result<Self, PrometheusError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(insecure_skip_tls_verify)
            .build()
            .map_err(PrometheusError::Client)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: bearer_token.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl MetricSource for PrometheusClient {
    async fn query(&self, promql: &str) -> Result<Vec<Sample>, PrometheusError> {
        let url = format!("{}/api/v1/query", self.base_url);
        debug!("PromQL: {}", promql);
        let res = self
            .http
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .query(&[("query", promql)])
            .send()
            .await
            .map_err(|source| PrometheusError::Transport { url: url.clone(), source })?;

        let status = res.status();
        // Prometheus answers bad queries with 400 plus an error envelope
        let has_envelope = status.is_success()
            || status == reqwest::StatusCode::BAD_REQUEST
            || status == reqwest::StatusCode::UNPROCESSABLE_ENTITY;
        if !has_envelope {
            let body = res.text().await.unwrap_or_default();
            return Err(PrometheusError::Status { status, body });
        }

        let body: QueryResponse = res.json().await.map_err(PrometheusError::Decode)?;
        into_samples(body)
    }
}

fn into_samples(body: QueryResponse) -> Result<Vec<Sample>, PrometheusError> {
    if body.status != "success" {
        return Err(PrometheusError::Query {
            error_type: body.error_type.unwrap_or_else(|| "unknown".to_string()),
            error: body.error.unwrap_or_default(),
        });
    }
    match body.data {
        Some(data) if data.result_type == "vector" => Ok(data.result),
        Some(data) => Err(PrometheusError::ResultType(data.result_type)),
        None => Ok(Vec::new()),
    }
}
