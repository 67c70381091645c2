use std::fmt;

use serde::{Deserialize, Serialize};

/// One stage of the build pipeline.
///
/// Within a subproject, phase `i + 1` never starts before phase `i`
/// finishes; across subprojects, a phase additionally waits for every
/// path dependency to finish that same phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Resolve,
    Fetch,
    BuildCommand,
    Compile,
    Test,
    Package,
}

impl Phase {
    /// The canonical full pipeline, in execution order.
    pub const SEQUENCE: [Phase; 6] = [
        Phase::Resolve,
        Phase::Fetch,
        Phase::BuildCommand,
        Phase::Compile,
        Phase::Test,
        Phase::Package,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Phase::Resolve => "resolve",
            Phase::Fetch => "fetch",
            Phase::BuildCommand => "build-command",
            Phase::Compile => "compile",
            Phase::Test => "test",
            Phase::Package => "package",
        }
    }

    /// Progress label for a running task, Cargo style.
    pub fn running_label(self) -> &'static str {
        match self {
            Phase::Resolve => "Resolving",
            Phase::Fetch => "Fetching",
            Phase::BuildCommand => "Generating",
            Phase::Compile => "Compiling",
            Phase::Test => "Testing",
            Phase::Package => "Packaging",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
