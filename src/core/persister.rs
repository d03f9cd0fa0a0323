// src/core/persister.rs

//! # Debounced Persistence
//!
//! The store hands every new snapshot to a `Persister`, which owns one background task.
//! The task keeps only the latest snapshot and a deadline; each new snapshot pushes the
//! deadline out by the debounce window, so a burst of mutations produces a single save
//! once the burst goes quiet.
//!
//! If every change since the last save only touched per-environment settings, the task
//! uses the collaborator's patch operation for those environments instead of replacing
//! the whole document.
//!
//! Failures never reach the caller: they are logged and recorded in [`PersistStatus`].
//! The next scheduled snapshot tries again.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::models::{Environment, OpsMatrixConfig};
use crate::system::config_service::ConfigService;

/// What a mutation touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeScope {
    Document,
    Environment(Environment),
}

/// Outcome counters and the last failure, shared with the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistStatus {
    pub last_error: Option<String>,
    pub saves: u64,
    pub patches: u64,
    pub is_saving: bool,
}

#[derive(Debug)]
enum PendingSave {
    Full(Arc<OpsMatrixConfig>),
    EnvOnly {
        snapshot: Arc<OpsMatrixConfig>,
        envs: BTreeSet<Environment>,
    },
}

impl PendingSave {
    fn merge(previous: Option<Self>, snapshot: Arc<OpsMatrixConfig>, scope: ChangeScope) -> Self {
        match (previous, scope) {
            (None, ChangeScope::Document) | (Some(PendingSave::Full(_)), _) => {
                PendingSave::Full(snapshot)
            }
            (Some(PendingSave::EnvOnly { .. }), ChangeScope::Document) => {
                PendingSave::Full(snapshot)
            }
            (None, ChangeScope::Environment(env)) => PendingSave::EnvOnly {
                snapshot,
                envs: BTreeSet::from([env]),
            },
            (Some(PendingSave::EnvOnly { mut envs, .. }), ChangeScope::Environment(env)) => {
                envs.insert(env);
                PendingSave::EnvOnly { snapshot, envs }
            }
        }
    }
}

#[derive(Debug)]
enum Command {
    Schedule {
        snapshot: Arc<OpsMatrixConfig>,
        scope: ChangeScope,
    },
    Flush(oneshot::Sender<()>),
}

fn lock(status: &Mutex<PersistStatus>) -> MutexGuard<'_, PersistStatus> {
    status.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to the background persistence task.
#[derive(Debug)]
pub struct Persister {
    tx: mpsc::UnboundedSender<Command>,
    status: Arc<Mutex<PersistStatus>>,
    worker: JoinHandle<()>,
}

impl Persister {
    /// Spawns the persistence task on the current tokio runtime.
    pub fn spawn(service: Arc<dyn ConfigService>, window: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let status = Arc::new(Mutex::new(PersistStatus::default()));
        let worker = tokio::spawn(run(rx, service, window, Arc::clone(&status)));
        Self {
            tx,
            status,
            worker,
        }
    }

    /// Queues `snapshot` for saving and re-arms the debounce timer. Never blocks.
    pub fn schedule(&self, snapshot: Arc<OpsMatrixConfig>, scope: ChangeScope) {
        if self.tx.send(Command::Schedule { snapshot, scope }).is_err() {
            log::error!("Persistence task is gone; change will not be saved.");
            lock(&self.status).last_error = Some("persistence task stopped".to_string());
        }
    }

    /// Saves any pending snapshot now and waits for it.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(ack_tx)).is_err() {
            return;
        }
        if ack_rx.await.is_err() {
            log::warn!("Persistence task stopped before acknowledging a flush.");
        }
    }

    pub fn status(&self) -> PersistStatus {
        lock(&self.status).clone()
    }

    pub fn is_running(&self) -> bool {
        !self.worker.is_finished()
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<Command>,
    service: Arc<dyn ConfigService>,
    window: Duration,
    status: Arc<Mutex<PersistStatus>>,
) {
    let mut pending: Option<PendingSave> = None;
    let mut deadline: Option<Instant> = None;

    loop {
        let command = match deadline {
            Some(at) => tokio::select! {
                command = rx.recv() => command,
                _ = tokio::time::sleep_until(at) => {
                    deadline = None;
                    if let Some(save) = pending.take() {
                        pending = persist(service.as_ref(), save, &status).await;
                    }
                    continue;
                }
            },
            None => rx.recv().await,
        };

        match command {
            Some(Command::Schedule { snapshot, scope }) => {
                pending = Some(PendingSave::merge(pending.take(), snapshot, scope));
                deadline = Some(Instant::now() + window);
            }
            Some(Command::Flush(ack)) => {
                deadline = None;
                if let Some(save) = pending.take() {
                    pending = persist(service.as_ref(), save, &status).await;
                }
                let _ = ack.send(());
            }
            None => {
                // Every sender is gone; save what is left and stop.
                if let Some(save) = pending.take() {
                    if persist(service.as_ref(), save, &status).await.is_some() {
                        log::warn!("Persistence task exiting with unsaved changes.");
                    }
                }
                log::trace!("Persistence task exiting.");
                break;
            }
        }
    }
}

/// Runs one save. A failed save is handed back so it can be merged with the next
/// change and retried; a change is never dropped because a later one was smaller.
async fn persist(
    service: &dyn ConfigService,
    save: PendingSave,
    status: &Mutex<PersistStatus>,
) -> Option<PendingSave> {
    lock(status).is_saving = true;

    let outcome = match &save {
        PendingSave::Full(snapshot) => {
            log::debug!("Saving config document to {}", service.describe());
            let result = service.save_config(snapshot).await.map(|_| ());
            if result.is_ok() {
                lock(status).saves += 1;
            }
            result
        }
        PendingSave::EnvOnly { snapshot, envs } => {
            let mut result = Ok(());
            for env in envs {
                let env_config = snapshot.env_configs.get(env).cloned().unwrap_or_default();
                log::debug!("Patching settings for env '{}' on {}", env, service.describe());
                match service.patch_env_config(env, &env_config).await {
                    Ok(_) => {
                        lock(status).patches += 1;
                    }
                    Err(e) => {
                        result = Err(e);
                        break;
                    }
                }
            }
            result
        }
    };

    let mut guard = lock(status);
    guard.is_saving = false;
    match outcome {
        Ok(()) => {
            guard.last_error = None;
            None
        }
        Err(e) => {
            log::error!("Failed to save config, will retry with the next change: {}", e);
            guard.last_error = Some(e.to_string());
            Some(save)
        }
    }
}
