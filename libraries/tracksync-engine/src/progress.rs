//! Progress events emitted while reconciling

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Phase of a reconcile run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Reading identities of source files
    IdentifySource,
    /// Reading identities of destination files
    IdentifyDestination,
    /// Stage one: relocating destination files
    Move,
    /// Stage two: copying new and changed tracks
    Copy,
    /// Stage three: deleting files with no source
    Delete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::IdentifySource => "Reading source metadata",
            Stage::IdentifyDestination => "Reading destination metadata",
            Stage::Move => "Moving",
            Stage::Copy => "Copying",
            Stage::Delete => "Deleting",
        })
    }
}

/// Progress update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileProgress {
    /// A stage begins with `total` units of work
    StageStarted { stage: Stage, total: usize },
    /// One unit of work finished
    Advanced { stage: Stage, path: PathBuf },
    /// A stage is complete
    StageFinished { stage: Stage },
}

/// Receiver of progress updates
pub type ProgressCallback = Arc<dyn Fn(ReconcileProgress) + Send + Sync>;
