//! Endpoint status reconciliation loop.
//!
//! The reporter:
//! - Tracks which endpoints upstream reports as policy-programmed
//! - Mirrors that set onto marker files once upstream is in sync
//! - Retries failed passes with backoff, resetting after a clean pass
//!
//! Only one event is handled at a time, and all filesystem work for that
//! event finishes before the next one is read.

use std::path::PathBuf;

use statusrep_events::EndpointUpdate;
use statusrep_id::EndpointId;
use statusrep_reconcile::{BackoffFactory, BackoffManager, IterAction, SetDeltaTracker};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::StatusError;
use crate::status_dir::{StatusDir, StatusFiles};

/// Counts from a reconcile pass in which every operation succeeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassOutcome {
    /// Marker files created.
    pub created: usize,

    /// Marker files removed (or found already absent).
    pub removed: usize,
}

/// Writes a marker file for every endpoint whose policy is programmed.
pub struct EndpointStatusFileReporter<F = StatusDir> {
    endpoint_updates: mpsc::Receiver<EndpointUpdate>,
    in_sync: mpsc::Receiver<bool>,
    files: F,

    /// Desired vs on-disk markers for the policy directory.
    policy: SetDeltaTracker<EndpointId>,

    backoff: BackoffManager,

    /// Upstream has reported in-sync at least once.
    in_sync_with_upstream: bool,

    /// Deadline of the single outstanding retry, if any.
    retry_at: Option<Instant>,
}

impl EndpointStatusFileReporter<StatusDir> {
    /// Create a reporter writing under `status_dir/policy`.
    pub fn new(
        endpoint_updates: mpsc::Receiver<EndpointUpdate>,
        in_sync: mpsc::Receiver<bool>,
        status_dir: impl Into<PathBuf>,
    ) -> Self {
        Self::with_status_files(endpoint_updates, in_sync, StatusDir::new(status_dir))
    }
}

impl<F: StatusFiles> EndpointStatusFileReporter<F> {
    /// Create a reporter over an arbitrary marker file store.
    pub fn with_status_files(
        endpoint_updates: mpsc::Receiver<EndpointUpdate>,
        in_sync: mpsc::Receiver<bool>,
        files: F,
    ) -> Self {
        Self {
            endpoint_updates,
            in_sync,
            files,
            policy: SetDeltaTracker::new(),
            backoff: BackoffManager::default(),
            in_sync_with_upstream: false,
            retry_at: None,
        }
    }

    /// Replace the backoff used between failed passes.
    pub fn with_backoff(mut self, factory: BackoffFactory) -> Self {
        self.backoff = BackoffManager::new(factory);
        self
    }

    /// The marker file store.
    pub fn files(&self) -> &F {
        &self.files
    }

    /// Returns true once upstream has reported in-sync.
    pub fn is_in_sync(&self) -> bool {
        self.in_sync_with_upstream
    }

    /// Returns true if a retry is scheduled.
    pub fn retry_armed(&self) -> bool {
        self.retry_at.is_some()
    }

    /// When the scheduled retry fires.
    pub fn retry_deadline(&self) -> Option<Instant> {
        self.retry_at
    }

    /// Number of endpoints that should have a marker file.
    pub fn desired_len(&self) -> usize {
        self.policy.desired_len()
    }

    /// Number of endpoints believed to have a marker file.
    pub fn dataplane_len(&self) -> usize {
        self.policy.dataplane_len()
    }

    /// Number of marker files still to be created or removed.
    pub fn pending_len(&self) -> usize {
        self.policy.pending_len()
    }

    /// Returns true if the endpoint is believed to have a marker file.
    pub fn has_marker(&self, id: &EndpointId) -> bool {
        self.policy.in_dataplane(id)
    }

    /// Run until `shutdown` flips to true.
    ///
    /// Returns an error only if one of the input channels closes.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), StatusError> {
        info!("Starting endpoint status reporter");

        if *shutdown.borrow() {
            debug!("Shutdown already signaled, stopping");
            return Ok(());
        }

        loop {
            let retry_at = self.retry_at;

            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("Shutdown signaled, stopping");
                        return Ok(());
                    }
                }

                msg = self.in_sync.recv() => {
                    let Some(in_sync) = msg else {
                        return Err(StatusError::InputClosed("in-sync"));
                    };
                    self.handle_in_sync(in_sync);
                }

                msg = self.endpoint_updates.recv() => {
                    let Some(update) = msg else {
                        return Err(StatusError::InputClosed("endpoint update"));
                    };
                    self.handle_endpoint_update(update);
                }

                _ = tokio::time::sleep_until(retry_at.unwrap_or_else(Instant::now)),
                    if retry_at.is_some() =>
                {
                    self.handle_retry();
                }
            }
        }
    }

    /// Handle a value from the in-sync channel.
    pub(crate) fn handle_in_sync(&mut self, in_sync: bool) {
        if !in_sync {
            debug!("Upstream reported not in sync");
            return;
        }

        if !self.in_sync_with_upstream {
            info!(
                desired = self.policy.desired_len(),
                "Upstream in sync, starting full resync"
            );
        }
        self.in_sync_with_upstream = true;

        let result = self.reconcile(true);
        self.schedule_after(result);
    }

    /// Handle one endpoint update.
    pub(crate) fn handle_endpoint_update(&mut self, update: EndpointUpdate) {
        debug!(?update, "Handling endpoint update");

        match update {
            EndpointUpdate::StatusUpdate { id } => self.policy.desired().add(id),
            EndpointUpdate::StatusRemove { id } => self.policy.desired().delete(&id),
            EndpointUpdate::Unknown => {
                warn!("Skipping unrecognized endpoint update");
                return;
            }
        }

        // Nothing on disk is trusted until the first full resync.
        if !self.in_sync_with_upstream {
            return;
        }

        let result = self.reconcile(false);
        self.schedule_after(result);
    }

    /// Handle the retry timer firing.
    pub(crate) fn handle_retry(&mut self) {
        self.retry_at = None;
        debug!("Retrying status reconciliation");

        let result = self.reconcile(true);
        self.schedule_after(result);
    }

    fn schedule_after(&mut self, result: Result<PassOutcome, StatusError>) {
        match result {
            Ok(outcome) => {
                if outcome != PassOutcome::default() {
                    debug!(
                        created = outcome.created,
                        removed = outcome.removed,
                        "Reconciled policy status files"
                    );
                }
                self.backoff.reset();
                self.retry_at = None;
            }
            Err(e) => {
                let delay = self.backoff.step();
                warn!(
                    error = %e,
                    backoff_ms = delay.as_millis() as u64,
                    pending = self.policy.pending_len(),
                    "Failed to reconcile policy status files, will retry after a backoff"
                );
                self.retry_at = Some(Instant::now() + delay);
            }
        }
    }

    /// Converge marker files with the desired set.
    ///
    /// A full resync first replaces the dataplane set with what is actually
    /// on disk. If that listing fails the pass stops there and the previous
    /// dataplane set is kept.
    ///
    /// File operations that fail leave their endpoint pending and do not
    /// stop the pass. The last such error is returned.
    pub fn reconcile(&mut self, full_resync: bool) -> Result<PassOutcome, StatusError> {
        if full_resync {
            let existing = self.files.list()?;
            debug!(existing = existing.len(), "Loaded existing policy status files");
            self.policy.dataplane().replace_all(existing);
        }

        let files = &self.files;
        let mut outcome = PassOutcome::default();
        let mut last_error: Option<StatusError> = None;

        self.policy.pending_additions().iter(|id| match files.create(id) {
            Ok(()) => {
                outcome.created += 1;
                IterAction::UpdateDataplane
            }
            Err(e) => {
                warn!(endpoint = %id, error = %e, "Failed to write policy status file");
                last_error = Some(e);
                IterAction::NoOp
            }
        });

        self.policy.pending_deletions().iter(|id| match files.remove(id) {
            Ok(()) => {
                outcome.removed += 1;
                IterAction::UpdateDataplane
            }
            Err(e) if e.is_not_found() => {
                debug!(endpoint = %id, "Policy status file already deleted");
                outcome.removed += 1;
                IterAction::UpdateDataplane
            }
            Err(e) => {
                warn!(endpoint = %id, error = %e, "Failed to delete policy status file");
                last_error = Some(e);
                IterAction::NoOp
            }
        });

        match last_error {
            Some(e) => Err(e),
            None => Ok(outcome),
        }
    }
}
