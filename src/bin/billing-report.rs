use anyhow::{Context, Result};
use billing_reporter::providers::{
    aws::{CostExplorerApi, OrganizationsDirectory, OrganizationsIdentity, S3ArtifactStore},
    slack::SlackTransport,
};
use billing_reporter::{ReportConfig, ReportJob};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Generate the monthly AWS billing report and distribute it
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a JSON trigger/event payload (e.g. an SNS notification)
    #[arg(long)]
    event_file: Option<std::path::PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with environment-based filtering
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    info!("Starting billing-report v{}", billing_reporter::VERSION);

    let trigger = match &cli.event_file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read event file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("event file {} is not valid JSON", path.display()))?
        }
        None => serde_json::Value::Null,
    };

    let config = ReportConfig::from_env();
    let job = build_job(&config).await;

    match job.execute(&trigger).await {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Err(e) => {
            error!("Billing report run failed: {:?}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn build_job(config: &ReportConfig) -> ReportJob {
    let shared = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let cost_api = CostExplorerApi::new(&config.cost_explorer_region).await;

    let mut job = ReportJob::new(
        config.clone(),
        Arc::new(cost_api),
        Arc::new(OrganizationsIdentity::new(&shared)),
        Arc::new(OrganizationsDirectory::new(&shared)),
    );

    match &config.report_bucket {
        Some(bucket) => {
            job = job.with_artifact_store(Arc::new(S3ArtifactStore::new(&shared, bucket.clone())));
        }
        None => warn!("REPORT_BUCKET is not set; the report will not be archived"),
    }

    match &config.slack_webhook_url {
        Some(webhook) => {
            job = job.with_transport(Arc::new(SlackTransport::new(
                webhook.clone(),
                config.slack_api_token.clone(),
                config.slack_channel_id.clone(),
            )));
        }
        None => warn!("SLACK_WEBHOOK_URL is not set; no notification will be sent"),
    }

    job
}
