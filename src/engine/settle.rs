// src/engine/settle.rs

//! The convergence loop ("settle").
//!
//! Each iteration takes the state lock just long enough to pick runnable
//! tasks and flip them to `Doing`; handlers then run unlocked on spawned
//! tokio tasks and report back over an mpsc channel. The loop ends when the
//! change converges, the deadline elapses, or the caller aborts.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::errors::SettleError;
use crate::exec::{HandlerRegistry, TaskView};
use crate::state::{ChangeId, State, Status, TaskFailure, TaskId};

use super::{SettleOptions, TaskOutcome};

/// Non-blocking check of the abort channel.
///
/// A dropped sender (`Closed`) means the caller never intends to abort.
fn abort_requested(abort: &mut oneshot::Receiver<()>) -> bool {
    matches!(abort.try_recv(), Ok(()))
}

/// Completion report from a spawned handler.
struct TaskFinished {
    task: TaskId,
    outcome: TaskOutcome,
}

/// Verdict of a convergence check over an idle graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    /// Every task is done, failed, or legitimately parked behind the
    /// preseed checkpoint.
    Converged,
    /// Non-terminal tasks remain that nothing currently running can
    /// unblock.
    Stuck,
}

/// Drives a change to convergence against a shared [`State`].
pub struct SettleRunner {
    state: Arc<Mutex<State>>,
    registry: Arc<HandlerRegistry>,
    options: SettleOptions,
}

impl SettleRunner {
    pub fn new(
        state: Arc<Mutex<State>>,
        registry: Arc<HandlerRegistry>,
        options: SettleOptions,
    ) -> Self {
        Self {
            state,
            registry,
            options,
        }
    }

    /// Settle `change` to convergence or time out.
    ///
    /// Task failures do not surface here; read them back through the
    /// change's `err()` after the call.
    pub async fn settle(&self, change: &ChangeId) -> Result<(), SettleError> {
        // No sender: the abort branch stays permanently silent.
        let (aborter, abort_rx) = oneshot::channel();
        drop(aborter);
        self.settle_abortable(change, abort_rx).await
    }

    /// Like [`settle`](Self::settle), but stops dispatching as soon as the
    /// abort channel fires. Tasks already `Doing` are allowed to finish and
    /// their outcomes are applied; tasks still `Do` are left untouched so a
    /// later settle call resumes from the recorded statuses.
    pub async fn settle_abortable(
        &self,
        change: &ChangeId,
        mut abort: oneshot::Receiver<()>,
    ) -> Result<(), SettleError> {
        let deadline = Instant::now() + self.options.timeout;
        let (tx, mut rx) = mpsc::channel::<TaskFinished>(self.options.max_workers.max(1));
        let mut in_flight = 0usize;
        let mut aborted = false;

        info!(change = %change, "settle started");

        loop {
            if !aborted && abort_requested(&mut abort) {
                info!(change = %change, in_flight, "abort requested; letting in-flight tasks finish");
                aborted = true;
            }

            if !aborted {
                let budget = self.options.max_workers.saturating_sub(in_flight);
                if budget > 0 {
                    for view in self.collect_runnable(change, budget) {
                        in_flight += 1;
                        self.spawn_handler(view, tx.clone());
                    }
                }
            }

            if in_flight == 0 {
                if aborted {
                    info!(change = %change, "settle aborted");
                    return Err(SettleError::Aborted);
                }
                match self.convergence_verdict(change) {
                    Verdict::Converged => {
                        info!(change = %change, "settle converged");
                        return Ok(());
                    }
                    Verdict::Stuck => {
                        if Instant::now() >= deadline {
                            warn!(change = %change, "settle timed out with non-terminal tasks");
                            return Err(SettleError::Timeout(self.options.timeout));
                        }
                        tokio::time::sleep(self.options.poll_interval).await;
                    }
                }
            } else {
                let finished = match tokio::time::timeout_at(deadline, rx.recv()).await {
                    Ok(Some(finished)) => finished,
                    Ok(None) => {
                        // Cannot happen while we hold `tx`; bail out rather
                        // than spin.
                        warn!(change = %change, "completion channel closed");
                        return Err(SettleError::Timeout(self.options.timeout));
                    }
                    Err(_elapsed) => {
                        warn!(
                            change = %change,
                            in_flight,
                            "settle deadline elapsed while handlers were still running"
                        );
                        return Err(SettleError::Timeout(self.options.timeout));
                    }
                };
                in_flight -= 1;
                self.apply_outcome(change, finished);
            }
        }
    }

    /// Lock the state, pick up to `budget` runnable tasks of the change and
    /// mark them `Doing`, returning unlocked snapshots for dispatch.
    fn collect_runnable(&self, change: &ChangeId, budget: usize) -> Vec<TaskView> {
        let mut state = self.state.lock();

        let Some(chg) = state.change(change) else {
            warn!(change = %change, "settle: unknown change");
            return Vec::new();
        };

        let candidates: Vec<TaskId> = chg
            .task_ids()
            .iter()
            .filter(|id| match state.task(id) {
                Some(task) => task.status() == Status::Do && state.wait_satisfied(task),
                None => false,
            })
            .take(budget)
            .cloned()
            .collect();

        let mut ready = Vec::with_capacity(candidates.len());
        for id in candidates {
            if let Some(task) = state.task_mut(&id) {
                task.set_status(Status::Doing);
                debug!(task = %id, kind = %task.kind(), "task runnable; marking Doing");
                ready.push(TaskView {
                    task: id.clone(),
                    change: change.clone(),
                    kind: task.kind(),
                    params: task.params().clone(),
                });
            }
        }
        ready
    }

    /// Run one task's handler on a spawned tokio task, unlocked.
    fn spawn_handler(&self, view: TaskView, tx: mpsc::Sender<TaskFinished>) {
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            let id = view.task.clone();
            let kind = view.kind;

            let outcome = match registry.handler_for(kind) {
                Some(handler) => match handler.run(view).await {
                    Ok(()) => TaskOutcome::Success,
                    Err(err) => TaskOutcome::Failed(format!("{err:#}")),
                },
                None => TaskOutcome::Failed(format!("no handler registered for kind {kind}")),
            };

            if tx.send(TaskFinished { task: id, outcome }).await.is_err() {
                debug!("settle loop gone before completion could be reported");
            }
        });
    }

    /// Apply one handler outcome under the lock.
    fn apply_outcome(&self, change: &ChangeId, finished: TaskFinished) {
        let mut state = self.state.lock();
        let TaskFinished { task: id, outcome } = finished;

        let Some(task) = state.task_mut(&id) else {
            warn!(task = %id, "completion for unknown task; ignoring");
            return;
        };

        match outcome {
            TaskOutcome::Success => {
                if task.is_checkpoint() {
                    // Terminal for this run: the checkpoint rests in Doing
                    // until a later boot finalizes it.
                    debug!(task = %id, kind = %task.kind(), "checkpoint reached; leaving Doing");
                } else {
                    task.set_status(Status::Done);
                    debug!(task = %id, kind = %task.kind(), "task done");
                }
            }
            TaskOutcome::Failed(message) => {
                task.set_status(Status::Error);
                task.add_log(format!("ERROR: {message}"));
                let kind = task.kind();
                warn!(task = %id, kind = %kind, error = %message, "task failed");

                let failed_dependents = state.mark_dependents_failed(&id);
                if !failed_dependents.is_empty() {
                    debug!(
                        task = %id,
                        dependents = failed_dependents.len(),
                        "failed dependents of errored task"
                    );
                }

                if let Some(chg) = state.change_mut(change) {
                    chg.record_failure(TaskFailure {
                        task: id,
                        kind,
                        message,
                    });
                }
            }
        }
    }

    /// Decide whether an idle graph has converged.
    fn convergence_verdict(&self, change: &ChangeId) -> Verdict {
        let state = self.state.lock();

        let Some(chg) = state.change(change) else {
            return Verdict::Converged;
        };

        for id in chg.task_ids() {
            let Some(task) = state.task(id) else {
                continue;
            };
            match task.status() {
                Status::Done | Status::Error => {}
                Status::Doing if task.is_checkpoint() => {}
                Status::Do if state.checkpoint_reached_in_wait_chain(id) => {
                    // Parked behind the preseed checkpoint; deferred to the
                    // next boot.
                }
                _ => return Verdict::Stuck,
            }
        }
        Verdict::Converged
    }
}
