//! tracksync Engine
//!
//! Reconciles a source tree of audio files against a destination tree laid
//! out as `<dest>/<artist>/<album>/<title>-<signature prefix>.<ext>`.
//!
//! # Architecture
//!
//! - `scanner`: enumerates audio files and prunes empty directories
//! - `file_ops`: transactional copy, rename and delete with a dry-run mode
//! - `plan`: the pure copy decision table
//! - `identity_map`: identities grouped by content signature
//! - `reconciler`: the three-stage move / copy / delete pipeline
//! - `stats`, `progress`: run counters and progress events

pub mod file_ops;
pub mod identity_map;
pub mod plan;
pub mod progress;
pub mod reconciler;
pub mod scanner;
pub mod stats;

pub use file_ops::{FileOperator, Outcome};
pub use identity_map::IdentityMap;
pub use plan::{decide, CopyDecision, CopyReason, DestinationState, DestinationView, WarnReason};
pub use progress::{ProgressCallback, ReconcileProgress, Stage};
pub use reconciler::{ReconcileConfig, Reconciler};
pub use scanner::TreeScanner;
pub use stats::RunStats;
