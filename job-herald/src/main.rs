use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use tracing::{error, info, warn};

use job_herald::config::AppConfig;
use job_herald::dispatcher::Dispatcher;
use job_herald::feed::{Fetcher, FixtureFetcher, HttpFetcher};
use job_herald::logging::{self, LOG_RETENTION_DAYS};
use job_herald::normalizer::Normalizer;
use job_herald::notification::{MessageTemplate, SlackConfig, SlackNotifier};
use job_herald::pipeline::Pipeline;
use job_herald::store::{JobStore, RunLock};
use job_herald::utils::http_client;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::parse();

    let _log_guard = logging::init_logging(config.log_dir.as_deref())?;
    if let Some(log_dir) = &config.log_dir
        && let Err(e) = logging::cleanup_old_logs(log_dir, LOG_RETENTION_DAYS).await
    {
        warn!(error = %e, "Failed to cleanup old logs");
    }

    if let Err(e) = run(&config).await {
        error!("Run failed: {:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(config: &AppConfig) -> anyhow::Result<()> {
    // Fail fast: nothing is fetched without somewhere to announce it.
    let webhook_url = config.validate()?;

    let _lock = RunLock::acquire(&config.store)?;
    let mut store = JobStore::open(&config.store)
        .await
        .with_context(|| format!("Failed to open job store {}", config.store.display()))?;

    let client = http_client::build_client(Duration::from_secs(config.timeout_secs));
    let fetcher: Box<dyn Fetcher> = match &config.fixture {
        Some(path) => {
            info!(path = %path.display(), "Sandbox mode: reading feed fixture");
            Box::new(FixtureFetcher::new(path))
        }
        None => Box::new(HttpFetcher::new(client.clone(), &config.feed_url)),
    };

    let notifier = SlackNotifier::with_client(
        SlackConfig {
            webhook_url,
            timeout_secs: config.timeout_secs,
        },
        client,
    );
    let template = MessageTemplate::new(config.variant, &config.region)
        .with_offset(*Local::now().offset());
    let pipeline = Pipeline::new(
        fetcher,
        Normalizer::new(config.variant),
        Dispatcher::new(notifier, template),
    );

    match pipeline.run(&mut store).await {
        Ok(summary) => {
            info!(
                fetched = summary.fetched,
                skipped = summary.skipped,
                inserted = summary.inserted,
                delivered = summary.delivered,
                "Run complete"
            );
            Ok(())
        }
        Err(e) if e.is_quiet() => {
            info!("{}", e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
