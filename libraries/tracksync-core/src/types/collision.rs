/// Identity collisions surfaced during a run
use crate::types::{ContentSignature, Namespace};
use std::fmt;
use std::path::PathBuf;

/// What collided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollisionKind {
    /// Several files in one tree share a content signature
    DuplicateSignature {
        namespace: Namespace,
        signature: ContentSignature,
    },
    /// Several source files map to one expected output path
    DuplicateExpectedPath { expected: PathBuf },
}

/// A collision that is reported but never resolved automatically
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionWarning {
    pub kind: CollisionKind,
    /// Every file involved, sorted
    pub paths: Vec<PathBuf>,
}

impl CollisionWarning {
    pub fn duplicate_signature(
        namespace: Namespace,
        signature: ContentSignature,
        mut paths: Vec<PathBuf>,
    ) -> Self {
        paths.sort();
        Self {
            kind: CollisionKind::DuplicateSignature {
                namespace,
                signature,
            },
            paths,
        }
    }

    pub fn duplicate_expected_path(expected: PathBuf, mut paths: Vec<PathBuf>) -> Self {
        paths.sort();
        Self {
            kind: CollisionKind::DuplicateExpectedPath { expected },
            paths,
        }
    }
}

impl fmt::Display for CollisionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            CollisionKind::DuplicateSignature {
                namespace,
                signature,
            } => write!(
                f,
                "{} files in {} tree share content signature {}",
                self.paths.len(),
                namespace,
                signature
            )?,
            CollisionKind::DuplicateExpectedPath { expected } => write!(
                f,
                "{} source files map to {}",
                self.paths.len(),
                expected.display()
            )?,
        }
        for path in &self.paths {
            write!(f, "\n  {}", path.display())?;
        }
        Ok(())
    }
}
