//! Aggregate run results and progress rendering.

use std::fmt;

use serde::Serialize;

use crate::phase::Phase;
use crate::scheduler::{TaskEvent, TaskStatus};

/// Terminal record for one task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    pub subproject: String,
    pub phase: Phase,
    pub status: TaskStatus,
    pub error: Option<String>,
}

/// The aggregate result of a scheduled run.
///
/// Successes, failures, and skips are reported distinctly; a failed
/// branch never erases what independent branches completed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub outcomes: Vec<TaskOutcome>,
    pub cancelled: bool,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        !self.cancelled
            && self
                .outcomes
                .iter()
                .all(|o| o.status == TaskStatus::Succeeded)
    }

    pub fn with_status(&self, status: TaskStatus) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes.iter().filter(move |o| o.status == status)
    }

    pub fn status_of(&self, subproject: &str, phase: Phase) -> Option<TaskStatus> {
        self.outcomes
            .iter()
            .find(|o| o.subproject == subproject && o.phase == phase)
            .map(|o| o.status)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let succeeded = self.with_status(TaskStatus::Succeeded).count();
        let failed = self.with_status(TaskStatus::Failed).count();
        let skipped = self.with_status(TaskStatus::Skipped).count();
        write!(f, "{succeeded} succeeded, {failed} failed, {skipped} skipped")?;
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        for outcome in self.with_status(TaskStatus::Failed) {
            write!(
                f,
                "\n  {} ({}): {}",
                outcome.subproject,
                outcome.phase,
                outcome.error.as_deref().unwrap_or("unknown error")
            )?;
        }
        Ok(())
    }
}

/// Print a Cargo-style status line for a task transition.
///
/// Quiet on queue movements; only running, failed, and skipped tasks
/// produce output.
pub fn render_event(event: &TaskEvent) {
    use bill_util::progress::{status, status_error, status_warn};
    match event.status {
        TaskStatus::Running => status(event.phase.running_label(), &event.subproject),
        TaskStatus::Failed => status_error(
            "Failed",
            &format!(
                "{} ({}): {}",
                event.subproject,
                event.phase,
                event.error.as_deref().unwrap_or("unknown error")
            ),
        ),
        TaskStatus::Skipped => status_warn(
            "Skipped",
            &format!("{} ({})", event.subproject, event.phase),
        ),
        _ => {}
    }
}
