//! Sequential delivery of pending jobs.
//!
//! The dispatcher walks [`JobStore::pending`] in order and delivers one job at
//! a time. A job is marked delivered only after the notifier confirms it; the
//! first failure stops the run, leaving that job and every later one pending
//! for the next invocation. Deliveries confirmed before the failure stay
//! committed.
//!
//! ```text
//! Idle -> Delivering(i) -> Delivering(i + 1) | Halted(i) | Done
//! ```

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info};

use crate::notification::{MessageTemplate, Notifier};
use crate::store::JobStore;
use crate::{Error, Result};

/// Pause between two successful deliveries.
pub const DELIVERY_PACING: Duration = Duration::from_secs(1);

/// Progress of one dispatch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Delivering(usize),
    Halted { index: usize, id: String },
    Done,
}

/// Outcome of a dispatch run that did not halt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Ids delivered in this run, in delivery order.
    pub delivered: Vec<String>,
}

impl DispatchReport {
    pub fn delivered_count(&self) -> usize {
        self.delivered.len()
    }
}

/// Delivers pending jobs through a [`Notifier`].
pub struct Dispatcher<N> {
    notifier: N,
    template: MessageTemplate,
    pacing: Duration,
}

impl<N: Notifier> Dispatcher<N> {
    pub fn new(notifier: N, template: MessageTemplate) -> Self {
        Self {
            notifier,
            template,
            pacing: DELIVERY_PACING,
        }
    }

    /// Override the pause between deliveries.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Deliver every pending job, newest first.
    ///
    /// Returns [`Error::DeliveryHalted`] on the first failed delivery, naming
    /// the failing job and how many were delivered before it. Store errors
    /// while committing a delivery are returned as-is.
    pub async fn deliver_pending(&self, store: &mut JobStore) -> Result<DispatchReport> {
        let pending = store.pending();
        let total = pending.len();
        let mut report = DispatchReport::default();
        let mut state = DispatchState::Idle;
        debug!(?state, pending = total, "Dispatch state");

        if total == 0 {
            info!("No new jobs to send");
            return Ok(report);
        }
        info!(
            count = total,
            channel = self.notifier.channel_type(),
            "Sending new jobs"
        );

        for (index, job) in pending.iter().enumerate() {
            state = DispatchState::Delivering(index);
            debug!(?state, id = %job.id, "Dispatch state");
            info!(
                position = index + 1,
                total,
                title = %job.title,
                "Processing item"
            );

            let message = self.template.compose(job, index, total);
            let reason = match self.notifier.deliver(&message).await {
                Ok(result) if result.is_success() => None,
                Ok(result) => Some(result.to_string()),
                Err(e) => Some(e.to_string()),
            };

            if let Some(reason) = reason {
                state = DispatchState::Halted {
                    index,
                    id: job.id.clone(),
                };
                debug!(?state, "Dispatch state");
                error!(
                    position = index + 1,
                    id = %job.id,
                    error = %reason,
                    "Error processing item; halting delivery"
                );
                return Err(Error::DeliveryHalted {
                    index,
                    position: index + 1,
                    id: job.id.clone(),
                    delivered: report.delivered.len(),
                    reason,
                });
            }

            store.mark_delivered(&job.id, Utc::now().timestamp()).await?;
            report.delivered.push(job.id.clone());
            info!(position = index + 1, "Done posting item");

            if index + 1 < total {
                tokio::time::sleep(self.pacing).await;
            }
        }

        state = DispatchState::Done;
        debug!(?state, delivered = report.delivered.len(), "Dispatch state");
        Ok(report)
    }
}
