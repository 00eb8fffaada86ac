// SPDX-License-Identifier: MIT

//! The fleet controller: resolves model artifacts, starts and tracks worker
//! subprocesses, and retires them, keeping at most one ready worker per model
//! at any instant.
//!
//! Concurrency is governed by two locks. A `shutdown_lock` is held for the
//! full duration of a `stop`; `ensure_worker` only ever holds the short-lived
//! `state` lock. A `Starting` placeholder is recorded under that lock before
//! the process is spawned, so a second caller racing the first sees the
//! reservation immediately instead of spawning its own worker, and a
//! concurrent `stop` can find and terminate it (see `try_ensure_worker`).

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Instant;

use parking_lot::Mutex;
use signrt_core::{ChapterId, LessonId, ModelId};
use tokio::process::Child;
use tokio::sync::watch;

use crate::artifact::{ArtifactResolver, ObjectStore};
use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::port::PortAllocator;
use crate::process;
use crate::store::DocumentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Starting,
    Ready,
    ShuttingDown,
    Dead,
}

/// A reservation moves from `Starting` to `Ready` in place, under the same
/// lock hold that checks for a concurrent shutdown marker (I6). `done` fires
/// (via either a send or the sender dropping) once the owning start
/// finalizes, one way or another; cloning a `watch::Receiver` registers it
/// as of the clone, so a waiter can never miss the signal regardless of when
/// it starts waiting relative to the send.
enum RecordState {
    Starting { done: watch::Receiver<bool> },
    Ready { child: Child },
}

pub struct WorkerRecord {
    pub model_id: ModelId,
    pub port: u16,
    pub started_at: Instant,
    state: RecordState,
}

#[derive(Debug, Clone)]
pub struct WorkerStatus {
    pub model_id: ModelId,
    pub port: u16,
    pub liveness: Liveness,
}

#[derive(Debug, Clone, Default)]
pub struct DeployResult {
    pub endpoints: Vec<String>,
    pub lesson_endpoints: HashMap<LessonId, String>,
}

#[derive(Default)]
struct FleetState {
    records: HashMap<ModelId, WorkerRecord>,
    shutting_down: HashSet<ModelId>,
}

/// Outcome of a single reservation attempt.
enum TryEnsureOutcome {
    /// A ready worker exists (or was just started); here is its endpoint.
    Ready(String),
    /// Another caller's start is already in flight; wait on this signal and
    /// retry.
    WaitForStart(watch::Receiver<bool>),
    /// A concurrent `stop` won the race for this model; retry from scratch.
    Aborted,
}

pub struct FleetController<D: DocumentStore, O: ObjectStore> {
    config: ControllerConfig,
    document_store: D,
    resolver: ArtifactResolver<O>,
    ports: PortAllocator,
    state: Mutex<FleetState>,
    shutdown_lock: tokio::sync::Mutex<()>,
}

impl<D: DocumentStore, O: ObjectStore> FleetController<D, O> {
    pub fn new(
        config: ControllerConfig,
        document_store: D,
        object_store: O,
        weights_cache_dir: impl Into<PathBuf>,
    ) -> Self {
        let ports = PortAllocator::new(config.port_range_low, config.port_range_high);
        let resolver = ArtifactResolver::new(object_store, weights_cache_dir);
        Self {
            config,
            document_store,
            resolver,
            ports,
            state: Mutex::new(FleetState::default()),
            shutdown_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Resolve a chapter's distinct models to ready worker endpoints.
    pub async fn deploy(&self, chapter_id: &ChapterId) -> Result<DeployResult, ControllerError> {
        let chapter = self
            .document_store
            .get_chapter(chapter_id)
            .await
            .map_err(|e| ControllerError::DocumentStore(e.to_string()))?
            .ok_or_else(|| ControllerError::ChapterNotFound(chapter_id.to_string()))?;

        self.cleanup_dead_workers();

        let mut endpoint_by_model: HashMap<ModelId, String> = HashMap::new();
        for lesson in &chapter.lessons {
            let Some(model_id) = &lesson.model_id else { continue };
            if !endpoint_by_model.contains_key(model_id) {
                let endpoint = self.ensure_worker(model_id).await?;
                endpoint_by_model.insert(model_id.clone(), endpoint);
            }
        }

        let mut lesson_endpoints = HashMap::new();
        for lesson in &chapter.lessons {
            if let Some(model_id) = &lesson.model_id {
                if let Some(endpoint) = endpoint_by_model.get(model_id) {
                    lesson_endpoints.insert(lesson.lesson_id.clone(), endpoint.clone());
                }
            }
        }

        Ok(DeployResult { endpoints: endpoint_by_model.into_values().collect(), lesson_endpoints })
    }

    /// Ensure a ready worker exists for `model_id` and return its endpoint.
    pub async fn ensure_worker(&self, model_id: &ModelId) -> Result<String, ControllerError> {
        // A concurrent stop can win the race exactly once per attempt; two
        // losses in a row would mean something is stuck in a shutdown loop.
        // Waiting on another caller's in-flight start does not count against
        // this budget: it is a bounded wait (readiness_timeout), not a race.
        let mut aborted_attempts = 0;
        loop {
            match self.try_ensure_worker(model_id).await? {
                TryEnsureOutcome::Ready(endpoint) => return Ok(endpoint),
                TryEnsureOutcome::WaitForStart(mut done) => {
                    let _ = done.changed().await;
                }
                TryEnsureOutcome::Aborted => {
                    aborted_attempts += 1;
                    if aborted_attempts >= 2 {
                        return Err(ControllerError::WorkerStartFailed {
                            model_id: model_id.clone(),
                            cause: "start repeatedly lost the race to a concurrent shutdown".into(),
                        });
                    }
                }
            }
        }
    }

    async fn try_ensure_worker(&self, model_id: &ModelId) -> Result<TryEnsureOutcome, ControllerError> {
        let port;
        let done_tx;
        {
            let mut state = self.state.lock();
            if state.shutting_down.contains(model_id) {
                return Ok(TryEnsureOutcome::Aborted);
            }

            if let Some(record) = state.records.get_mut(model_id) {
                if let RecordState::Starting { done } = &record.state {
                    return Ok(TryEnsureOutcome::WaitForStart(done.clone()));
                }
                if is_alive(record) {
                    return Ok(TryEnsureOutcome::Ready(self.config.endpoint_url(record.port)));
                }
                let stale = state.records.remove(model_id).expect("checked present above");
                self.ports.release(stale.port);
            }

            // Reserve a placeholder under the lock, before the process is
            // even spawned, so a racing caller sees it on its very next
            // acquisition instead of starting a second worker (I1/P2).
            port = self.ports.allocate()?;
            let (tx, rx) = watch::channel(false);
            done_tx = tx;
            state.records.insert(
                model_id.clone(),
                WorkerRecord {
                    model_id: model_id.clone(),
                    port,
                    started_at: Instant::now(),
                    state: RecordState::Starting { done: rx },
                },
            );
        }

        let resolved = self.resolver.resolve(model_id).await;
        let (_descriptor, descriptor_path, weights_path) = match resolved {
            Ok(v) => v,
            Err(e) => {
                self.abandon_start(model_id, port, done_tx);
                return Err(e);
            }
        };

        let spawned = process::spawn_worker(
            &self.config.worker_bin,
            model_id,
            &descriptor_path,
            &weights_path,
            port,
            self.config.readiness_timeout,
        )
        .await;

        let child = match spawned {
            Ok(child) => child,
            Err(e) => {
                self.abandon_start(model_id, port, done_tx);
                return Err(e);
            }
        };

        // Re-acquire the mutex to finalize. A stop recorded while we were
        // resolving/spawning (P3) must be honored here: discard the worker
        // we just brought up instead of registering it ready. The lock is
        // scoped to this block (not held across the `.await` below) since
        // `parking_lot::MutexGuard` is not `Send`.
        enum Finalize {
            Aborted(Child),
            Ready,
        }

        let finalize = {
            let mut state = self.state.lock();
            if state.shutting_down.contains(model_id) {
                state.records.remove(model_id);
                state.shutting_down.remove(model_id);
                Finalize::Aborted(child)
            } else {
                if let Some(record) = state.records.get_mut(model_id) {
                    record.state = RecordState::Ready { child };
                }
                Finalize::Ready
            }
        };

        match finalize {
            Finalize::Aborted(mut child) => {
                self.ports.release(port);
                process::terminate_gracefully(&mut child, self.config.shutdown_grace).await;
                let _ = done_tx.send(true);
                Ok(TryEnsureOutcome::Aborted)
            }
            Finalize::Ready => {
                let _ = done_tx.send(true);
                Ok(TryEnsureOutcome::Ready(self.config.endpoint_url(port)))
            }
        }
    }

    /// Tears down our own `Starting` reservation after the artifact resolve
    /// or the process spawn itself failed: releases the port, clears any
    /// shutdown marker we were racing (we are now the one responsible for
    /// it), and wakes concurrent callers waiting on our start.
    fn abandon_start(&self, model_id: &ModelId, port: u16, done_tx: watch::Sender<bool>) {
        let mut state = self.state.lock();
        state.records.remove(model_id);
        state.shutting_down.remove(model_id);
        drop(state);
        self.ports.release(port);
        let _ = done_tx.send(true);
    }

    /// Stop a model's worker, waiting gracefully before a hard kill. Takes
    /// precedence over any in-flight `ensure_worker` for the same model.
    pub async fn stop(&self, model_id: &ModelId) {
        let _guard = self.shutdown_lock.lock().await;

        let mut state = self.state.lock();
        state.shutting_down.insert(model_id.clone());
        let is_starting = matches!(
            state.records.get(model_id).map(|r| &r.state),
            Some(RecordState::Starting { .. })
        );
        // A record still `Starting` has no child yet to kill and its port is
        // still in active use by the subprocess that is about to bind it;
        // leave it in place. The in-flight start will observe the marker
        // when it finalizes, kill the worker it just spawned, and clear the
        // marker itself.
        let record = if is_starting { None } else { state.records.remove(model_id) };
        drop(state);

        if let Some(record) = record {
            if let RecordState::Ready { mut child } = record.state {
                process::terminate_gracefully(&mut child, self.config.shutdown_grace).await;
            }
            self.ports.release(record.port);
        }

        if !is_starting {
            self.state.lock().shutting_down.remove(model_id);
        }
    }

    pub fn status(&self, model_id: &ModelId) -> Option<WorkerStatus> {
        let mut state = self.state.lock();
        state.records.get_mut(model_id).map(to_status)
    }

    pub fn health(&self) -> Vec<WorkerStatus> {
        let mut state = self.state.lock();
        state.records.values_mut().map(to_status).collect()
    }

    /// Drop records whose process has exited and free their ports. Skips
    /// models currently being stopped, whose teardown already owns cleanup.
    pub fn cleanup_dead_workers(&self) {
        let mut state = self.state.lock();
        let shutting_down = state.shutting_down.clone();
        let mut dead: Vec<ModelId> = Vec::new();
        for (id, record) in state.records.iter_mut() {
            if !shutting_down.contains(id) && !is_alive(record) {
                dead.push(id.clone());
            }
        }

        for id in dead {
            if let Some(record) = state.records.remove(&id) {
                tracing::info!(model_id = %id, port = record.port, "reaped dead worker");
                self.ports.release(record.port);
            }
        }
    }
}

/// A `Starting` reservation has no process yet to check; it is treated as
/// alive until its owner finalizes or abandons it.
fn is_alive(record: &mut WorkerRecord) -> bool {
    match &mut record.state {
        RecordState::Starting { .. } => true,
        RecordState::Ready { child } => matches!(child.try_wait(), Ok(None)),
    }
}

fn to_status(record: &mut WorkerRecord) -> WorkerStatus {
    let liveness = if matches!(record.state, RecordState::Starting { .. }) {
        Liveness::Starting
    } else if is_alive(record) {
        Liveness::Ready
    } else {
        Liveness::Dead
    };
    WorkerStatus { model_id: record.model_id.clone(), port: record.port, liveness }
}

#[cfg(test)]
#[path = "fleet_tests.rs"]
mod tests;
