use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::parsing::{container_label, parse_sample_value, round_to};
use crate::prometheus::MetricSource;
use crate::queries::{pod_queries, QueryKind};
use crate::report::ReportData;
use crate::types::{Config, PodRef, Sample};

/// Runs the per-pod query set and folds the samples into a [`ReportData`].
pub struct MetricsCollector<'a, S> {
    source: &'a S,
    config: &'a Config,
}

impl<'a, S: MetricSource> MetricsCollector<'a, S> {
    pub fn new(source: &'a S, config: &'a Config) -> Self {
        Self { source, config }
    }

    pub async fn collect(&self, pods: &[PodRef]) -> Result<ReportData> {
        let mut data = ReportData::new();
        for pod in pods {
            info!("Process Namespace: {} - Pod {}", pod.namespace, pod.name);
            if self.config.is_excluded(&pod.namespace) {
                info!("Skip Namespace: {}", pod.namespace);
                continue;
            }
            self.collect_pod(pod, &mut data).await?;
        }
        Ok(data)
    }

    async fn collect_pod(&self, pod: &PodRef, data: &mut ReportData) -> Result<()> {
        for (kind, promql) in pod_queries(&pod.namespace, &pod.name, &self.config.time_range) {
            let samples = self
                .source
                .query(&promql)
                .await
                .with_context(|| format!("{} query failed for {}/{}", kind, pod.namespace, pod.name))?;
            debug!("{} returned {} samples for {}", kind, samples.len(), pod.name);
            for sample in &samples {
                fold_sample(data, pod, kind, sample);
            }
        }
        Ok(())
    }
}

/// Merge one sample into the container's record.
pub fn fold_sample(data: &mut ReportData, pod: &PodRef, kind: QueryKind, sample: &Sample) {
    let Some(container) = container_label(sample) else {
        warn!("{} sample for pod {} has no container label, ignoring: {:?}", kind, pod.name, sample.metric);
        return;
    };
    let Some(value) = parse_sample_value(&sample.value.1) else {
        warn!(
            "{} sample for {}/{} has unusable value {:?}, ignoring",
            kind, pod.name, container, sample.value.1
        );
        return;
    };

    let record = data.entry(&pod.namespace, &pod.name, container);
    if record.namespace.is_none() {
        record.namespace = Some(
            sample
                .label("namespace")
                .map(str::to_string)
                .unwrap_or_else(|| pod.namespace.clone()),
        );
    }
    if record.node.is_none() {
        record.node = sample
            .label("node")
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .or_else(|| pod.node.clone());
    }
    let value = round_to(value, 2);
    debug!("Add {} = {} to {}/{}", kind, value, pod.name, container);
    record.set(kind, value);
}
