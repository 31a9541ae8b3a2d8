//! Test harness for status reporter integration tests.
//!
//! Runs a reporter against a real temporary status directory, wrapped so
//! tests can inject file operation failures and inspect every call made.

#![allow(dead_code)]

use std::collections::HashSet;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use statusrep_agent::{EndpointStatusFileReporter, StatusDir, StatusError, StatusFiles};
use statusrep_events::EndpointUpdate;
use statusrep_id::EndpointId;
use statusrep_reconcile::SequenceBackoff;
use tempfile::TempDir;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

pub type Reporter = EndpointStatusFileReporter<FaultyDir>;

pub fn ep(name: &str) -> EndpointId {
    EndpointId::new("k8s", format!("default/{name}"), "eth0")
}

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Let the reporter drain everything already queued.
///
/// Tests run with paused time, so the clock only moves once every task is
/// idle. Keep this shorter than any retry delay under test.
pub async fn settle() {
    tokio::time::sleep(ms(1)).await;
}

// =============================================================================
// Fault Injection
// =============================================================================

/// A call made against the status directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Create(EndpointId),
    Remove(EndpointId),
}

#[derive(Debug, Default)]
pub struct FaultState {
    pub fail_list: bool,
    pub fail_create: HashSet<EndpointId>,
    pub fail_remove: HashSet<EndpointId>,
    pub calls: Vec<Call>,
}

/// Shared handle on injected faults and the call log.
#[derive(Debug, Clone, Default)]
pub struct Faults(Arc<Mutex<FaultState>>);

impl Faults {
    pub fn lock(&self) -> MutexGuard<'_, FaultState> {
        self.0.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.lock().calls.iter().filter(|c| *c == call).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

fn denied(op: &'static str, dir: &StatusDir) -> StatusError {
    StatusError::Io {
        op,
        path: dir.policy_dir(),
        source: io::Error::from(io::ErrorKind::PermissionDenied),
    }
}

/// [`StatusDir`] with injectable failures.
pub struct FaultyDir {
    pub dir: StatusDir,
    pub faults: Faults,
}

impl StatusFiles for FaultyDir {
    fn list(&self) -> Result<Vec<EndpointId>, StatusError> {
        let mut state = self.faults.lock();
        state.calls.push(Call::List);
        if state.fail_list {
            return Err(denied("list", &self.dir));
        }
        self.dir.list()
    }

    fn create(&self, id: &EndpointId) -> Result<(), StatusError> {
        let mut state = self.faults.lock();
        state.calls.push(Call::Create(id.clone()));
        if state.fail_create.contains(id) {
            return Err(denied("create", &self.dir));
        }
        self.dir.create(id)
    }

    fn remove(&self, id: &EndpointId) -> Result<(), StatusError> {
        let mut state = self.faults.lock();
        state.calls.push(Call::Remove(id.clone()));
        if state.fail_remove.contains(id) {
            return Err(denied("remove", &self.dir));
        }
        self.dir.remove(id)
    }
}

// =============================================================================
// Running Reporter
// =============================================================================

pub struct Harness {
    pub tmp: TempDir,
    pub dir: StatusDir,
    pub faults: Faults,
    pub updates: Option<mpsc::Sender<EndpointUpdate>>,
    pub in_sync: Option<mpsc::Sender<bool>>,
    pub shutdown: watch::Sender<bool>,
    task: JoinHandle<(Reporter, Result<(), StatusError>)>,
}

impl Harness {
    /// Start a reporter over a status directory already holding `seed`.
    ///
    /// Retries back off 100ms, 200ms, then 400ms forever.
    pub fn start(seed: &[EndpointId]) -> Self {
        let tmp = TempDir::new().unwrap();
        let dir = StatusDir::new(tmp.path());
        if !seed.is_empty() {
            dir.ensure_directory().unwrap();
            for id in seed {
                dir.create(id).unwrap();
            }
        }

        let faults = Faults::default();
        let (updates_tx, updates_rx) = mpsc::channel(64);
        let (in_sync_tx, in_sync_rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let files = FaultyDir {
            dir: dir.clone(),
            faults: faults.clone(),
        };
        let mut reporter =
            EndpointStatusFileReporter::with_status_files(updates_rx, in_sync_rx, files)
                .with_backoff(SequenceBackoff::new([ms(100), ms(200), ms(400)]).factory());

        let task = tokio::spawn(async move {
            let result = reporter.run(shutdown_rx).await;
            (reporter, result)
        });

        Self {
            tmp,
            dir,
            faults,
            updates: Some(updates_tx),
            in_sync: Some(in_sync_tx),
            shutdown: shutdown_tx,
            task,
        }
    }

    pub async fn update(&self, id: EndpointId) {
        self.send(EndpointUpdate::StatusUpdate { id }).await;
    }

    pub async fn remove(&self, id: EndpointId) {
        self.send(EndpointUpdate::StatusRemove { id }).await;
    }

    pub async fn send(&self, update: EndpointUpdate) {
        self.updates.as_ref().unwrap().send(update).await.unwrap();
    }

    pub async fn sync(&self) {
        self.in_sync.as_ref().unwrap().send(true).await.unwrap();
    }

    /// Marker files currently on disk, sorted.
    pub fn markers(&self) -> Vec<EndpointId> {
        let mut ids = self.dir.list().unwrap();
        ids.sort();
        ids
    }

    /// Signal shutdown and wait for the reporter to return.
    pub async fn stop(self) -> (Reporter, Result<(), StatusError>) {
        let _ = self.shutdown.send(true);
        self.join().await
    }

    /// Wait for the reporter to return on its own.
    pub async fn join(self) -> (Reporter, Result<(), StatusError>) {
        self.task.await.unwrap()
    }
}

pub fn sorted(mut ids: Vec<EndpointId>) -> Vec<EndpointId> {
    ids.sort();
    ids
}
