//! Identities grouped by content signature

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracksync_core::{ContentSignature, TrackIdentity};

/// Content signature to every identity carrying it
///
/// Keeps all identities rather than the first one seen, so duplicates can be
/// reported and excluded instead of silently shadowing each other. Files
/// without a signature share the sentinel key. Groups are sorted by path.
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    by_signature: BTreeMap<ContentSignature, Vec<TrackIdentity>>,
    by_path: HashMap<PathBuf, ContentSignature>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one identity, replacing any identity already held for its path
    pub fn insert(&mut self, identity: TrackIdentity) {
        self.remove_path(identity.path());
        let signature = identity.signature_key();
        self.by_path
            .insert(identity.path().to_path_buf(), signature.clone());

        let group = self.by_signature.entry(signature).or_default();
        let at = group.partition_point(|held| held.path() < identity.path());
        group.insert(at, identity);
    }

    /// Identities carrying `signature`, sorted by path
    pub fn get(&self, signature: &ContentSignature) -> &[TrackIdentity] {
        self.by_signature
            .get(signature)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The identity carrying `signature`, if exactly one does
    pub fn unique(&self, signature: &ContentSignature) -> Option<&TrackIdentity> {
        match self.get(signature) {
            [only] => Some(only),
            _ => None,
        }
    }

    /// Groups with more than one identity
    pub fn duplicates(&self) -> impl Iterator<Item = (&ContentSignature, &[TrackIdentity])> {
        self.by_signature
            .iter()
            .filter(|(_, group)| group.len() > 1)
            .map(|(sig, group)| (sig, group.as_slice()))
    }

    pub fn identities(&self) -> impl Iterator<Item = &TrackIdentity> {
        self.by_signature.values().flatten()
    }

    /// Number of identities
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// Remove and return the identity at `path`
    pub fn remove_path(&mut self, path: &Path) -> Option<TrackIdentity> {
        let signature = self.by_path.remove(path)?;
        let group = self.by_signature.get_mut(&signature)?;
        let index = group.binary_search_by(|held| held.path().cmp(path)).ok()?;
        let removed = group.remove(index);
        if group.is_empty() {
            self.by_signature.remove(&signature);
        }
        Some(removed)
    }
}

impl FromIterator<TrackIdentity> for IdentityMap {
    /// Groups are sorted once after every identity is in place
    fn from_iter<I: IntoIterator<Item = TrackIdentity>>(iter: I) -> Self {
        let mut by_path: HashMap<PathBuf, TrackIdentity> = HashMap::new();
        for identity in iter {
            by_path.insert(identity.path().to_path_buf(), identity);
        }

        let mut map = Self::new();
        for (path, identity) in by_path {
            let signature = identity.signature_key();
            map.by_path.insert(path, signature.clone());
            map.by_signature.entry(signature).or_default().push(identity);
        }
        for group in map.by_signature.values_mut() {
            group.sort_unstable_by(|a, b| a.path().cmp(b.path()));
        }
        map
    }
}
