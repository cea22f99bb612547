use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};

use pod_resource_report::{
    kubernetes, load_config, Cli, MetricsCollector, PrometheusClient, SystemEnvironment,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = load_config(&cli)?;
    let generated_at = Utc::now();

    let kube_config = kubernetes::load_kube_config(&SystemEnvironment).await?;
    let token = kubernetes::resolve_bearer_token(&cfg, &kube_config).await?;
    let client = kubernetes::connect(kube_config)?;

    let prometheus_url = kubernetes::resolve_prometheus_url(&client, &cfg).await?;
    info!("Prometheus Host: {}", prometheus_url);
    let prometheus = PrometheusClient::new(
        &prometheus_url,
        token,
        cfg.insecure_skip_tls_verify,
        Duration::from_secs(cfg.request_timeout_secs),
    )?;
    info!("Time range for usage queries: {}", cfg.time_range);

    info!("Get Pod List");
    let pods = kubernetes::list_pods(&client, cfg.namespace.as_deref()).await?;

    let collector = MetricsCollector::new(&prometheus, &cfg);
    let data = collector.collect(&pods).await?;

    info!("Create CSV Report");
    let report = data.into_csv(generated_at);
    let path = report.write_to(&cfg.output_dir).await?;

    let summary = report.summary();
    info!("Report written to {} ({} rows)", path.display(), summary.rows);
    if summary.has_skipped() {
        warn!(
            "{} of {} containers skipped due to missing metrics",
            summary.skipped,
            summary.total_containers()
        );
    }
    info!("Final CSV report: \n{}", report.render());

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
