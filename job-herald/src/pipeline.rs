//! One fetch-to-delivery run.

use chrono::Utc;
use tracing::info;

use crate::Result;
use crate::dispatcher::Dispatcher;
use crate::feed::Fetcher;
use crate::normalizer::Normalizer;
use crate::notification::Notifier;
use crate::store::JobStore;

/// Counters for a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Postings returned by the fetcher.
    pub fetched: usize,
    /// Postings dropped by normalization.
    pub skipped: usize,
    /// Postings not seen before this run.
    pub inserted: usize,
    /// Jobs announced in this run.
    pub delivered: usize,
}

/// Fetch → normalize → reconcile → deliver.
pub struct Pipeline<F, N> {
    fetcher: F,
    normalizer: Normalizer,
    dispatcher: Dispatcher<N>,
}

impl<F, N> Pipeline<F, N>
where
    F: Fetcher,
    N: Notifier,
{
    pub fn new(fetcher: F, normalizer: Normalizer, dispatcher: Dispatcher<N>) -> Self {
        Self {
            fetcher,
            normalizer,
            dispatcher,
        }
    }

    /// Run every stage once against `store`.
    ///
    /// Fetch failures (including an empty feed) return before the store is
    /// touched. A halted delivery returns its error after the jobs delivered so
    /// far have been committed.
    pub async fn run(&self, store: &mut JobStore) -> Result<RunSummary> {
        info!(source = self.fetcher.source_name(), "Searching for new job offers");
        let raws = self.fetcher.fetch().await?;

        let batch = self
            .normalizer
            .normalize_batch(&raws, Utc::now().timestamp());
        let skipped = batch.skipped.len();

        let inserted = store.reconcile(batch.records).await?;
        info!(
            fetched = raws.len(),
            skipped,
            inserted,
            pending = store.pending().len(),
            "Found job offers"
        );

        let report = self.dispatcher.deliver_pending(store).await?;

        Ok(RunSummary {
            fetched: raws.len(),
            skipped,
            inserted,
            delivered: report.delivered_count(),
        })
    }
}
