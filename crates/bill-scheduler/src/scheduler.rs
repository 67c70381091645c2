//! Phase-gated concurrent task execution.
//!
//! A single coordinator loop owns every task state and reacts to
//! completion messages from the worker pool; readiness is recomputed
//! only when something finishes. Outcomes are deterministic for
//! identical inputs regardless of interleaving.

use std::sync::Arc;

use bill_core::subproject::Subproject;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task::JoinSet;

use crate::phase::Phase;
use crate::report::{RunReport, TaskOutcome};
use crate::runner::PhaseRunner;
use crate::topology::SubprojectGraph;

/// Lifecycle of one (subproject, phase) task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Ready,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Skipped
        )
    }
}

/// Progress notification for one task transition.
#[derive(Debug, Clone, Serialize)]
pub struct TaskEvent {
    pub subproject: String,
    pub phase: Phase,
    pub status: TaskStatus,
    pub error: Option<String>,
}

/// Scheduling knobs.
pub struct ScheduleOptions {
    /// Worker pool size.
    pub concurrency: usize,
    /// Optional progress stream; transitions are sent as they happen.
    pub events: Option<mpsc::UnboundedSender<TaskEvent>>,
    /// Cooperative cancellation: flip the watched value to `true` to
    /// stop dispatching. Running tasks finish their current body.
    pub cancel: Option<watch::Receiver<bool>>,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            events: None,
            cancel: None,
        }
    }
}

/// Completion message from a worker back to the coordinator.
struct TaskDone {
    project: usize,
    phase: usize,
    error: Option<String>,
}

/// Coordinator-owned task state. Only the coordinator loop writes it.
struct Board<'a> {
    projects: &'a [Arc<Subproject>],
    phases: &'a [Phase],
    /// Per project, the indices of the projects it path-depends on.
    deps: Vec<Vec<usize>>,
    status: Vec<Vec<TaskStatus>>,
    errors: Vec<Vec<Option<String>>>,
    events: Option<mpsc::UnboundedSender<TaskEvent>>,
}

impl Board<'_> {
    fn transition(&mut self, p: usize, ph: usize, next: TaskStatus, error: Option<String>) {
        self.status[p][ph] = next;
        tracing::debug!(
            "task {} ({}) -> {:?}",
            self.projects[p].name,
            self.phases[ph],
            next
        );
        if error.is_some() {
            self.errors[p][ph].clone_from(&error);
        }
        if let Some(tx) = &self.events {
            let _ = tx.send(TaskEvent {
                subproject: self.projects[p].name.clone(),
                phase: self.phases[ph],
                status: next,
                error,
            });
        }
    }

    /// Skip every pending task whose predecessors can no longer succeed,
    /// to a fixpoint so skips cascade through dependents.
    fn propagate_skips(&mut self) {
        let mut changed = true;
        while changed {
            changed = false;
            for p in 0..self.projects.len() {
                for ph in 0..self.phases.len() {
                    if self.status[p][ph] != TaskStatus::Pending {
                        continue;
                    }
                    let dead = |s: TaskStatus| {
                        matches!(s, TaskStatus::Failed | TaskStatus::Skipped)
                    };
                    let blocked_phase = ph > 0 && dead(self.status[p][ph - 1]);
                    let blocked_dep =
                        self.deps[p].iter().any(|&d| dead(self.status[d][ph]));
                    if blocked_phase || blocked_dep {
                        self.transition(p, ph, TaskStatus::Skipped, None);
                        changed = true;
                    }
                }
            }
        }
    }

    /// Promote pending tasks whose predecessors have all succeeded.
    fn mark_ready(&mut self) {
        for p in 0..self.projects.len() {
            for ph in 0..self.phases.len() {
                if self.status[p][ph] != TaskStatus::Pending {
                    continue;
                }
                let phase_done = ph == 0 || self.status[p][ph - 1] == TaskStatus::Succeeded;
                let deps_done = self.deps[p]
                    .iter()
                    .all(|&d| self.status[d][ph] == TaskStatus::Succeeded);
                if phase_done && deps_done {
                    self.transition(p, ph, TaskStatus::Ready, None);
                }
            }
        }
    }

    /// Ready tasks in deterministic dispatch order.
    fn ready(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for p in 0..self.projects.len() {
            for ph in 0..self.phases.len() {
                if self.status[p][ph] == TaskStatus::Ready {
                    out.push((p, ph));
                }
            }
        }
        out
    }

    /// Skip everything that has not started, after a cancellation.
    fn skip_unstarted(&mut self) {
        for p in 0..self.projects.len() {
            for ph in 0..self.phases.len() {
                if matches!(self.status[p][ph], TaskStatus::Pending | TaskStatus::Ready) {
                    self.transition(p, ph, TaskStatus::Skipped, None);
                }
            }
        }
    }

    fn into_report(mut self, cancelled: bool) -> RunReport {
        let mut outcomes = Vec::new();
        for p in 0..self.projects.len() {
            for ph in 0..self.phases.len() {
                outcomes.push(TaskOutcome {
                    subproject: self.projects[p].name.clone(),
                    phase: self.phases[ph],
                    status: self.status[p][ph],
                    error: self.errors[p][ph].take(),
                });
            }
        }
        RunReport {
            outcomes,
            cancelled,
        }
    }
}

/// Resolve cancellation: completes when the watched flag flips to `true`,
/// never when no cancellation channel was supplied.
async fn cancelled_signal(cancel: &mut Option<watch::Receiver<bool>>) {
    match cancel {
        Some(rx) => loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                // Sender gone: cancellation can never arrive.
                std::future::pending::<()>().await;
            }
        },
        None => std::future::pending::<()>().await,
    }
}

/// Execute `phases` for every subproject in `graph`, overlapping
/// independent subprojects.
///
/// A task becomes ready when its subproject finished the previous phase
/// and every path dependency finished the same phase. Failures skip all
/// downstream tasks; independent branches run to completion. The report
/// carries every task's terminal status distinctly.
pub async fn schedule<R: PhaseRunner>(
    graph: &SubprojectGraph,
    phases: &[Phase],
    runner: Arc<R>,
    mut options: ScheduleOptions,
) -> RunReport {
    let projects: Vec<Arc<Subproject>> = graph
        .topological_order()
        .into_iter()
        .cloned()
        .map(Arc::new)
        .collect();
    let deps: Vec<Vec<usize>> = projects
        .iter()
        .map(|p| {
            graph
                .dependencies_of(&p.name)
                .into_iter()
                .filter_map(|dep| projects.iter().position(|q| q.name == dep))
                .collect()
        })
        .collect();

    let n = projects.len();
    let m = phases.len();
    let mut board = Board {
        projects: &projects,
        phases,
        deps,
        status: vec![vec![TaskStatus::Pending; m]; n],
        errors: vec![vec![None; m]; n],
        events: options.events.take(),
    };

    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<TaskDone>();
    let mut workers = JoinSet::new();
    let mut running = 0usize;
    let mut cancelled = false;

    loop {
        if !cancelled {
            if let Some(rx) = &options.cancel {
                cancelled = *rx.borrow();
            }
        }

        if cancelled {
            board.skip_unstarted();
        } else {
            board.propagate_skips();
            board.mark_ready();
            for (p, ph) in board.ready() {
                let Ok(permit) = Arc::clone(&semaphore).try_acquire_owned() else {
                    // Pool saturated; the task stays ready until a
                    // worker frees up.
                    break;
                };
                board.transition(p, ph, TaskStatus::Running, None);
                running += 1;

                let runner = Arc::clone(&runner);
                let project = Arc::clone(&projects[p]);
                let phase = phases[ph];
                let done_tx = done_tx.clone();
                workers.spawn(async move {
                    let _permit = permit;
                    let error = runner
                        .run(&project, phase)
                        .await
                        .err()
                        .map(|e| e.to_string());
                    let _ = done_tx.send(TaskDone {
                        project: p,
                        phase: ph,
                        error,
                    });
                });
            }
        }

        if running == 0 {
            break;
        }

        tokio::select! {
            done = done_rx.recv() => {
                if let Some(done) = done {
                    running -= 1;
                    let next = if done.error.is_some() {
                        TaskStatus::Failed
                    } else {
                        TaskStatus::Succeeded
                    };
                    board.transition(done.project, done.phase, next, done.error);
                }
            }
            _ = cancelled_signal(&mut options.cancel), if !cancelled => {
                cancelled = true;
                tracing::warn!("cancellation requested; draining running tasks");
            }
        }
    }

    // Workers are never aborted mid-body: every spawned task has sent
    // its completion by the time the loop exits.
    drop(workers);

    board.into_report(cancelled)
}
