//! Phase task bodies.

use std::future::Future;

use bill_core::subproject::Subproject;

use crate::phase::Phase;

/// Executes the body of one (subproject, phase) task.
///
/// Implementations wrap the collaborators that do the actual work: the
/// resolver for [`Phase::Resolve`], the repository client for
/// [`Phase::Fetch`], the compiler, test runner, and packager for the
/// rest. The scheduler only observes success or failure.
///
/// Bodies for independent subprojects run concurrently on the worker
/// pool, so implementations must be shareable across tasks. All
/// suspension (network, external processes) happens inside the body; the
/// scheduler's coordinator never blocks on task I/O.
pub trait PhaseRunner: Send + Sync + 'static {
    fn run(
        &self,
        project: &Subproject,
        phase: Phase,
    ) -> impl Future<Output = miette::Result<()>> + Send;
}
