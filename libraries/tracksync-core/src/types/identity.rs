/// Track identity types
use crate::hashing::HashStrategy;
use crate::types::ContentSignature;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";
pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_TRACK_NUMBER: u32 = 0;

/// What the tag collaborator found in a file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub track_number: Option<u32>,
    pub content_signature: Option<ContentSignature>,
}

impl RawTags {
    /// Split into display tags and signature
    pub fn into_parts(self) -> (TrackTags, Option<ContentSignature>) {
        (
            TrackTags {
                title: self.title,
                artist: self.artist,
                album: self.album,
                track_number: self.track_number,
            },
            self.content_signature,
        )
    }
}

/// Display fields as found in the file; absent values stay absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub track_number: Option<u32>,
}

/// Display fields with sentinels substituted for absent values
///
/// `DisplayFields::resolve` is the only place defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFields {
    pub artist: String,
    pub album: String,
    pub title: String,
    pub track_number: u32,
    pub signature: ContentSignature,
}

impl DisplayFields {
    pub fn resolve(tags: &TrackTags, signature: Option<&ContentSignature>) -> Self {
        fn non_empty(value: Option<&String>, fallback: &str) -> String {
            value
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .unwrap_or(fallback)
                .to_string()
        }

        Self {
            artist: non_empty(tags.artist.as_ref(), UNKNOWN_ARTIST),
            album: non_empty(tags.album.as_ref(), UNKNOWN_ALBUM),
            title: non_empty(tags.title.as_ref(), UNKNOWN_TITLE),
            track_number: tags.track_number.unwrap_or(UNKNOWN_TRACK_NUMBER),
            signature: signature.cloned().unwrap_or_else(ContentSignature::unknown),
        }
    }

    /// Hash over (artist, album, title, track number, signature)
    pub fn fingerprint(&self, hash: HashStrategy) -> String {
        let track_number = self.track_number.to_string();
        hash.digest(&[
            &self.artist,
            &self.album,
            &self.title,
            &track_number,
            self.signature.as_str(),
        ])
    }
}

/// The extracted record for one file
///
/// `metadata_fingerprint` is always derived from the other fields by the
/// constructors; there is no way to build an identity with a foreign one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackIdentity {
    path: PathBuf,
    tags: TrackTags,
    content_signature: Option<ContentSignature>,
    metadata_fingerprint: String,
}

impl TrackIdentity {
    /// Build an identity from freshly read tags
    pub fn from_tags(path: PathBuf, raw: RawTags, hash: HashStrategy) -> Self {
        let (tags, signature) = raw.into_parts();
        Self::from_parts(path, tags, signature, hash)
    }

    /// Build an identity from its fields, computing the fingerprint
    pub fn from_parts(
        path: PathBuf,
        tags: TrackTags,
        content_signature: Option<ContentSignature>,
        hash: HashStrategy,
    ) -> Self {
        let metadata_fingerprint =
            DisplayFields::resolve(&tags, content_signature.as_ref()).fingerprint(hash);
        Self {
            path,
            tags,
            content_signature,
            metadata_fingerprint,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tags(&self) -> &TrackTags {
        &self.tags
    }

    /// The signature as read from the file, if any
    pub fn content_signature(&self) -> Option<&ContentSignature> {
        self.content_signature.as_ref()
    }

    /// The signature used for grouping; files without one share the sentinel
    pub fn signature_key(&self) -> ContentSignature {
        self.content_signature
            .clone()
            .unwrap_or_else(ContentSignature::unknown)
    }

    pub fn metadata_fingerprint(&self) -> &str {
        &self.metadata_fingerprint
    }

    /// Display fields with defaults applied
    pub fn display(&self) -> DisplayFields {
        DisplayFields::resolve(&self.tags, self.content_signature.as_ref())
    }

    /// Lowercase extension of the underlying file
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }

    /// The same track at another location (after a move or a copy)
    pub fn relocated(&self, path: PathBuf) -> Self {
        Self {
            path,
            tags: self.tags.clone(),
            content_signature: self.content_signature.clone(),
            metadata_fingerprint: self.metadata_fingerprint.clone(),
        }
    }

    /// Whether `fingerprint` is what these fields hash to under `hash`
    pub fn verifies(&self, fingerprint: &str, hash: HashStrategy) -> bool {
        self.display().fingerprint(hash) == fingerprint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(artist: &str, title: &str) -> RawTags {
        RawTags {
            title: Some(title.to_string()),
            artist: Some(artist.to_string()),
            album: Some("Album".to_string()),
            track_number: Some(3),
            content_signature: Some(ContentSignature::new("abc123")),
        }
    }

    #[test]
    fn absent_fields_resolve_to_sentinels() {
        let display = DisplayFields::resolve(&TrackTags::default(), None);
        assert_eq!(display.artist, UNKNOWN_ARTIST);
        assert_eq!(display.album, UNKNOWN_ALBUM);
        assert_eq!(display.title, UNKNOWN_TITLE);
        assert_eq!(display.track_number, UNKNOWN_TRACK_NUMBER);
        assert!(display.signature.is_unknown());
    }

    #[test]
    fn blank_tags_count_as_absent() {
        let tags = TrackTags {
            artist: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(DisplayFields::resolve(&tags, None).artist, UNKNOWN_ARTIST);
    }

    #[test]
    fn fingerprint_tracks_every_display_field() {
        let hash = HashStrategy::default();
        let base = TrackIdentity::from_tags("/a.flac".into(), raw("X", "Z"), hash);

        let retitled = TrackIdentity::from_tags("/a.flac".into(), raw("X", "Other"), hash);
        assert_ne!(base.metadata_fingerprint(), retitled.metadata_fingerprint());

        let mut renumbered = raw("X", "Z");
        renumbered.track_number = Some(4);
        let renumbered = TrackIdentity::from_tags("/a.flac".into(), renumbered, hash);
        assert_ne!(base.metadata_fingerprint(), renumbered.metadata_fingerprint());

        let mut resigned = raw("X", "Z");
        resigned.content_signature = Some(ContentSignature::new("def456"));
        let resigned = TrackIdentity::from_tags("/a.flac".into(), resigned, hash);
        assert_ne!(base.metadata_fingerprint(), resigned.metadata_fingerprint());
    }

    #[test]
    fn fingerprint_ignores_path() {
        let hash = HashStrategy::default();
        let a = TrackIdentity::from_tags("/in/a.flac".into(), raw("X", "Z"), hash);
        let b = TrackIdentity::from_tags("/out/X/Album/Z-abc1.flac".into(), raw("X", "Z"), hash);
        assert_eq!(a.metadata_fingerprint(), b.metadata_fingerprint());
    }

    #[test]
    fn relocated_keeps_fields() {
        let hash = HashStrategy::default();
        let a = TrackIdentity::from_tags("/in/a.flac".into(), raw("X", "Z"), hash);
        let moved = a.relocated("/out/z.flac".into());
        assert_eq!(moved.path(), Path::new("/out/z.flac"));
        assert_eq!(moved.tags(), a.tags());
        assert_eq!(moved.metadata_fingerprint(), a.metadata_fingerprint());
    }

    #[test]
    fn verifies_detects_foreign_fingerprint() {
        let hash = HashStrategy::Sha256;
        let a = TrackIdentity::from_tags("/a.flac".into(), raw("X", "Z"), hash);
        assert!(a.verifies(a.metadata_fingerprint(), hash));
        assert!(!a.verifies("deadbeef", hash));
        assert!(!a.verifies(a.metadata_fingerprint(), HashStrategy::Blake3));
    }
}
