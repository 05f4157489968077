//! Process configuration.
//!
//! Every option can come from a command-line flag or an environment variable
//! (a `.env` file is loaded first). The webhook url is the only required value
//! and is checked before anything is fetched.

use std::path::PathBuf;

use clap::Parser;
use url::Url;

use crate::feed::FeedVariant;
use crate::{Error, Result};

/// Feed polled when no `--feed-url` is given.
pub const DEFAULT_FEED_URL: &str = "http://jobslondrina.com/job-category/programador/feed/?emprego=show&estagio=show&freelance=show&temporario=show&action=Filter&location=Londrina";

/// Webhook variable read by earlier deployments, used when `SLACK_WEBHOOK_URL`
/// and `--webhook-url` are both absent.
pub const LEGACY_WEBHOOK_ENV: &str = "LABS_SLACK_WEBHOOK_URL_DEVPARANA_BOT_LONDRINA";

/// Store location when no `--store` is given.
pub const DEFAULT_STORE_PATH: &str = "data/db.json";

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct AppConfig {
    /// Slack incoming-webhook URL that receives announcements
    #[arg(long, env = "SLACK_WEBHOOK_URL", hide_env_values = true)]
    pub webhook_url: Option<String>,

    /// RSS feed to poll
    #[arg(long, env = "JOB_HERALD_FEED_URL", default_value = DEFAULT_FEED_URL)]
    pub feed_url: String,

    /// Shape of the feed
    #[arg(long, env = "JOB_HERALD_VARIANT", value_enum, default_value_t = FeedVariant::JobListing)]
    pub variant: FeedVariant,

    /// Path of the JSON job store
    #[arg(long, env = "JOB_HERALD_STORE", default_value = DEFAULT_STORE_PATH)]
    pub store: PathBuf,

    /// Read the feed from this file instead of fetching it
    #[arg(long, env = "JOB_HERALD_FIXTURE")]
    pub fixture: Option<PathBuf>,

    /// Region named in the announcement banner
    #[arg(long, env = "JOB_HERALD_REGION", default_value = "Londrina")]
    pub region: String,

    /// Directory for rolling log files (console only when unset)
    #[arg(long, env = "JOB_HERALD_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// HTTP timeout in seconds for feed and webhook requests (0 disables)
    #[arg(long, env = "JOB_HERALD_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl AppConfig {
    /// Check the configuration and return the validated webhook url.
    pub fn validate(&self) -> Result<String> {
        self.validate_with_legacy(std::env::var(LEGACY_WEBHOOK_ENV).ok())
    }

    fn validate_with_legacy(&self, legacy_webhook: Option<String>) -> Result<String> {
        let webhook_url = self
            .webhook_url
            .clone()
            .or(legacy_webhook)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                Error::config(format!(
                    "Slack webhook URL not found (set SLACK_WEBHOOK_URL, {} or --webhook-url)",
                    LEGACY_WEBHOOK_ENV
                ))
            })?;
        validate_http_url("webhook url", &webhook_url)?;

        if self.fixture.is_none() {
            validate_http_url("feed url", &self.feed_url)?;
        }

        Ok(webhook_url)
    }
}

fn validate_http_url(what: &str, raw: &str) -> Result<()> {
    let url = Url::parse(raw).map_err(|e| Error::config(format!("invalid {}: {}", what, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(Error::config(format!(
            "invalid {}: unsupported scheme '{}'",
            what, scheme
        ))),
    }
}
