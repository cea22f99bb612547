use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::error;

use crate::parsing::{format_decimal, round_cores, round_mebibytes};
use crate::queries::QueryKind;

pub const CSV_DELIMITER: char = ';';

pub const CSV_HEADER: [&str; 12] = [
    "Namespace",
    "Node",
    "POD",
    "ContainerName",
    "CPU_Request(m)",
    "CPU_UsageAVG(m)",
    "CPU_UsageMAX(m)",
    "CPU_Limit(m)",
    "Memory_Request(Mi)",
    "Memory_UsageAVG(Mi)",
    "Memory_UsageMAX(Mi)",
    "Memory_Limit(Mi)",
];

#[derive(Debug, Error, PartialEq)]
pub enum RowError {
    #[error("missing {0} value")]
    MissingField(QueryKind),
}

/// Figures gathered for one container: CPU in cores, memory in MiB.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerRecord {
    pub namespace: Option<String>,
    pub node: Option<String>,
    pub pod: String,
    pub container: String,
    values: BTreeMap<QueryKind, f64>,
}

impl ContainerRecord {
    pub fn new(pod: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            pod: pod.into(),
            container: container.into(),
            ..Default::default()
        }
    }

    pub fn set(&mut self, kind: QueryKind, value: f64) {
        self.values.insert(kind, value);
    }

    pub fn get(&self, kind: QueryKind) -> Option<f64> {
        self.values.get(&kind).copied()
    }

    pub fn is_complete(&self) -> bool {
        QueryKind::ALL.iter().all(|k| self.values.contains_key(k))
    }

    /// Build the CSV fields; every one of the eight values must be present.
    pub fn to_row(&self) -> Result<Vec<String>, RowError> {
        let mut row = vec![
            self.namespace.clone().unwrap_or_default(),
            self.node.clone().unwrap_or_default(),
            self.pod.clone(),
            self.container.clone(),
        ];
        for kind in QueryKind::ALL {
            let value = self.get(kind).ok_or(RowError::MissingField(kind))?;
            let field = if kind.is_cpu() {
                format_decimal(round_cores(value))
            } else {
                round_mebibytes(value).to_string()
            };
            row.push(field);
        }
        Ok(row)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PodKey {
    pub namespace: String,
    pub pod: String,
}

/// Pod -> container -> record, ordered for stable output.
#[derive(Debug, Default)]
pub struct ReportData {
    pods: BTreeMap<PodKey, BTreeMap<String, ContainerRecord>>,
}

impl ReportData {
    pub fn new() -> Self {
        Self::default()
    }

    /// The record for a container, created on first sight.
    pub fn entry(&mut self, namespace: &str, pod: &str, container: &str) -> &mut ContainerRecord {
        let key = PodKey {
            namespace: namespace.to_string(),
            pod: pod.to_string(),
        };
        self.pods
            .entry(key)
            .or_default()
            .entry(container.to_string())
            .or_insert_with(|| ContainerRecord::new(pod, container))
    }

    pub fn pod_count(&self) -> usize {
        self.pods.len()
    }

    pub fn container_count(&self) -> usize {
        self.pods.values().map(BTreeMap::len).sum()
    }

    pub fn records(&self) -> impl Iterator<Item = &ContainerRecord> {
        self.pods.values().flat_map(BTreeMap::values)
    }

    /// Render every complete container; incomplete ones are logged and left out.
    pub fn into_csv(self, generated_at: DateTime<Utc>) -> CsvReport {
        let mut report = CsvReport::new(generated_at);
        for record in self.records() {
            match record.to_row() {
                Ok(row) => report.rows.push(row),
                Err(err) => {
                    error!(
                        pod = %record.pod,
                        container = %record.container,
                        "Skipping row: {}. Container data: {:?}",
                        err,
                        record
                    );
                    report.skipped += 1;
                }
            }
        }
        report
    }
}

#[derive(Debug, Clone)]
pub struct CsvReport {
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<Vec<String>>,
    pub skipped: usize,
}

impl CsvReport {
    pub fn new(generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            rows: Vec::new(),
            skipped: 0,
        }
    }

    /// `Report-pod_consuming-YYYY-MM-DD_HHMM.csv`
    pub fn file_name(&self) -> String {
        format!(
            "Report-pod_consuming-{}.csv",
            self.generated_at.format("%Y-%m-%d_%H%M")
        )
    }

    pub fn render(&self) -> String {
        let delim = CSV_DELIMITER.to_string();
        let mut out = CSV_HEADER.join(&delim);
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.join(&delim));
            out.push('\n');
        }
        out
    }

    pub async fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        let path = dir.join(self.file_name());
        tokio::fs::write(&path, self.render())
            .await
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        Ok(path)
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            rows: self.rows.len(),
            skipped: self.skipped,
        }
    }
}

pub struct ReportSummary {
    pub rows: usize,
    pub skipped: usize,
}

impl ReportSummary {
    pub fn total_containers(&self) -> usize {
        self.rows + self.skipped
    }

    pub fn has_skipped(&self) -> bool {
        self.skipped > 0
    }
}
