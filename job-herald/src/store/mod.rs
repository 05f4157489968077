//! Durable job store.
//!
//! Every posting ever seen is kept in a single JSON document:
//!
//! ```json
//! { "jobs": [ { "id": "…", "title": "…", … } ], "settings": {} }
//! ```
//!
//! The whole document is held in memory during a run and rewritten after each
//! mutation, so a mutation that returned `Ok` is already on disk.

mod lock;

pub use lock::RunLock;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::utils::fs;
use crate::{Error, Result};

/// A normalized posting as persisted in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Lowercase hex SHA-1 of `url`.
    pub id: String,
    pub title: String,
    pub url: String,
    pub description: String,
    #[serde(default)]
    pub employer: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub job_type: String,
    /// Epoch seconds the posting was published.
    pub published_at: i64,
    /// Epoch seconds the posting was first normalized.
    pub observed_at: i64,
    #[serde(default)]
    pub delivered: bool,
    /// Epoch seconds of the confirmed delivery.
    #[serde(default)]
    pub delivered_at: Option<i64>,
}

/// On-disk layout of the store file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    jobs: Vec<JobRecord>,
    /// Reserved for future use; preserved as-is.
    #[serde(default)]
    settings: Map<String, Value>,
}

/// File-backed store of [`JobRecord`]s keyed by id.
///
/// Records are only ever appended; the sole mutation is the one-way
/// `delivered` transition made by [`JobStore::mark_delivered`].
#[derive(Debug)]
pub struct JobStore {
    path: PathBuf,
    doc: StoreDocument,
    index: HashMap<String, usize>,
}

impl JobStore {
    /// Open the store at `path`, creating it (and its directory) if absent.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let doc = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<StoreDocument>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                fs::ensure_parent_dir(&path).await?;
                let doc = StoreDocument::default();
                fs::write_atomic(&path, &serde_json::to_vec_pretty(&doc)?).await?;
                info!(path = %path.display(), "Initialized empty job store");
                doc
            }
            Err(e) => return Err(fs::io_error("reading store", &path, e)),
        };

        let mut store = Self {
            path,
            doc,
            index: HashMap::new(),
        };
        store.rebuild_index();
        debug!(
            path = %store.path.display(),
            jobs = store.doc.jobs.len(),
            "Opened job store"
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.doc.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.jobs.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&JobRecord> {
        self.index.get(id).map(|&i| &self.doc.jobs[i])
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[JobRecord] {
        &self.doc.jobs
    }

    pub fn settings(&self) -> &Map<String, Value> {
        &self.doc.settings
    }

    /// Insert every candidate whose id is not yet stored, keeping feed order.
    ///
    /// Candidates with a known id are dropped without touching the stored
    /// record. Returns how many were inserted.
    pub async fn reconcile(&mut self, candidates: Vec<JobRecord>) -> Result<usize> {
        let before = self.doc.jobs.len();

        for candidate in candidates {
            if self.index.contains_key(&candidate.id) {
                continue;
            }
            self.index
                .insert(candidate.id.clone(), self.doc.jobs.len());
            self.doc.jobs.push(candidate);
        }

        let inserted = self.doc.jobs.len() - before;
        if inserted == 0 {
            return Ok(0);
        }

        if let Err(e) = self.flush().await {
            self.doc.jobs.truncate(before);
            self.rebuild_index();
            return Err(e);
        }

        debug!(inserted, total = self.doc.jobs.len(), "Reconciled jobs");
        Ok(inserted)
    }

    /// Undelivered records, newest published first.
    ///
    /// Records are stably sorted by `published_at` ascending and the result is
    /// reversed, so among equal dates the later-inserted record comes first.
    pub fn pending(&self) -> Vec<JobRecord> {
        let mut pending: Vec<JobRecord> = self
            .doc
            .jobs
            .iter()
            .filter(|job| !job.delivered)
            .cloned()
            .collect();
        pending.sort_by_key(|job| job.published_at);
        pending.reverse();
        pending
    }

    /// Record a confirmed delivery. The change is on disk when this returns.
    pub async fn mark_delivered(&mut self, id: &str, at: i64) -> Result<()> {
        let &i = self.index.get(id).ok_or_else(|| Error::not_found(id))?;

        let job = &mut self.doc.jobs[i];
        if job.delivered {
            return Err(Error::AlreadyDelivered {
                id: id.to_string(),
                delivered_at: job.delivered_at.unwrap_or_default(),
            });
        }
        job.delivered = true;
        job.delivered_at = Some(at);

        if let Err(e) = self.flush().await {
            let job = &mut self.doc.jobs[i];
            job.delivered = false;
            job.delivered_at = None;
            return Err(e);
        }

        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.doc)?;
        fs::write_atomic(&self.path, &bytes).await
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .doc
            .jobs
            .iter()
            .enumerate()
            .map(|(i, job)| (job.id.clone(), i))
            .collect();
    }
}
