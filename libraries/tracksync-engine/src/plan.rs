//! Copy planning
//!
//! Whether a source track needs copying depends on four facts about the
//! destination, evaluated against the track's expected output path. The
//! mapping from those facts to an action is a pure table so every combination
//! can be enumerated and tested.

use crate::identity_map::IdentityMap;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracksync_core::TrackIdentity;

/// What the destination looks like from one source track's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DestinationState {
    /// A file exists at the expected path
    pub destination_exists: bool,
    /// A destination file with the track's signature sits at the expected path
    pub path_matches: bool,
    /// Some destination file carries the track's signature
    pub signature_matches: bool,
    /// The file at the expected path has the track's metadata fingerprint
    pub metadata_matches: bool,
}

/// Why a copy is needed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CopyReason {
    /// Nothing exists at the expected path
    Missing,
    /// The right recording is in place but its tags differ
    MetadataMismatch,
}

/// A copy that overwrites something unexpected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarnReason {
    /// The expected path holds a different recording
    ForeignOccupant,
    /// The recording exists elsewhere and something else holds the expected path
    PathMismatch,
}

/// Action for one source track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CopyDecision {
    UpToDate,
    Copy(CopyReason),
    WarnAndCopy(WarnReason),
}

impl CopyDecision {
    pub fn needs_copy(&self) -> bool {
        !matches!(self, CopyDecision::UpToDate)
    }
}

impl fmt::Display for CopyDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CopyDecision::UpToDate => "up to date",
            CopyDecision::Copy(CopyReason::Missing) => "destination missing",
            CopyDecision::Copy(CopyReason::MetadataMismatch) => "metadata mismatch",
            CopyDecision::WarnAndCopy(WarnReason::ForeignOccupant) => {
                "expected path holds a different recording"
            }
            CopyDecision::WarnAndCopy(WarnReason::PathMismatch) => {
                "recording found at another path"
            }
        };
        f.write_str(text)
    }
}

/// Decide what to do for one source track
pub fn decide(state: DestinationState) -> CopyDecision {
    let DestinationState {
        destination_exists,
        path_matches,
        signature_matches,
        metadata_matches,
    } = state;

    match (destination_exists, signature_matches, path_matches, metadata_matches) {
        (true, true, true, true) => CopyDecision::UpToDate,
        (false, _, _, _) => CopyDecision::Copy(CopyReason::Missing),
        (true, false, _, _) => CopyDecision::WarnAndCopy(WarnReason::ForeignOccupant),
        (true, true, false, _) => CopyDecision::WarnAndCopy(WarnReason::PathMismatch),
        (true, true, true, false) => CopyDecision::Copy(CopyReason::MetadataMismatch),
    }
}

/// The destination tree as the planner sees it
///
/// Starts from the scan and the extracted identities, then follows the moves
/// of stage one (applied for real or, in dry-run, only here).
#[derive(Debug, Clone, Default)]
pub struct DestinationView {
    paths: HashSet<PathBuf>,
    identities: IdentityMap,
}

impl DestinationView {
    pub fn new(paths: HashSet<PathBuf>, identities: IdentityMap) -> Self {
        Self { paths, identities }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn paths(&self) -> &HashSet<PathBuf> {
        &self.paths
    }

    pub fn identities(&self) -> &IdentityMap {
        &self.identities
    }

    /// Record that `identity` now lives at `to`
    pub fn relocate(&mut self, identity: &TrackIdentity, to: PathBuf) {
        self.paths.remove(identity.path());
        self.identities.remove_path(identity.path());
        self.paths.insert(to.clone());
        self.identities.insert(identity.relocated(to));
    }

    /// Evaluate the four facts for `source` against `expected`
    pub fn state_for(&self, source: &TrackIdentity, expected: &Path) -> DestinationState {
        let carriers = self.identities.get(&source.signature_key());
        let at_path = carriers.iter().find(|identity| identity.path() == expected);

        DestinationState {
            destination_exists: self.contains(expected),
            path_matches: at_path.is_some(),
            signature_matches: !carriers.is_empty(),
            metadata_matches: at_path.is_some_and(|identity| {
                identity.metadata_fingerprint() == source.metadata_fingerprint()
            }),
        }
    }
}
