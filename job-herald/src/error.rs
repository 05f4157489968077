//! Application-wide error types.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// The feed or the notification endpoint could not be reached.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Feed parse error: {0}")]
    FeedParse(String),

    /// The feed was fetched successfully but carried no entries.
    #[error("No job entries were found in {source_name}")]
    EmptyFeed { source_name: String },

    #[error("Normalization error: {0}")]
    Normalization(#[from] NormalizationError),

    #[error("Job not found: {id}")]
    NotFound { id: String },

    #[error("Job {id} was already delivered at {delivered_at}")]
    AlreadyDelivered { id: String, delivered_at: i64 },

    /// Delivery stopped partway through a batch. `delivered` counts the
    /// records confirmed before the failing one.
    #[error("Delivery halted at item {position} (job {id}) after {delivered} delivered: {reason}")]
    DeliveryHalted {
        index: usize,
        position: usize,
        id: String,
        delivered: usize,
        reason: String,
    },

    #[error("Another run holds the lock at {}", .0.display())]
    RunInProgress(PathBuf),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error while {op} {}: {source}", path.display())]
    IoPath {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn feed_parse(msg: impl Into<String>) -> Self {
        Self::FeedParse(msg.into())
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn io_path(op: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::IoPath {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether the run should end quietly instead of failing the process.
    pub fn is_quiet(&self) -> bool {
        matches!(self, Self::EmptyFeed { .. })
    }
}

/// Why a single posting could not be turned into a job record.
///
/// These never abort a batch: the posting is skipped and the rest continue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("posting '{title}' has no link")]
    MissingLink { title: String },

    #[error("posting {url} has an unparsable date '{raw}'")]
    InvalidDate { url: String, raw: String },
}
