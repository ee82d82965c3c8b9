/// Tag reader implementation using lofty
use crate::error::MetadataError;
use lofty::flac::FlacFile;
use lofty::ogg::VorbisComments;
use lofty::{Accessor, AudioFile, FileType, ItemKey, ParseOptions, TaggedFileExt};
use std::fs::File;
use std::path::Path;
use tracksync_core::{ContentSignature, RawTags, TagReader};

/// Tag reader using the lofty library
///
/// FLAC files are read natively so the STREAMINFO MD5 can serve as the
/// content signature. Every other format lofty understands yields tags only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTagReader;

impl LoftyTagReader {
    /// Create a new tag reader
    pub fn new() -> Self {
        Self
    }

    fn read_flac(path: &Path) -> Result<RawTags, MetadataError> {
        let mut file = File::open(path)?;
        let flac = FlacFile::read_from(&mut file, ParseOptions::new())?;

        let mut tags = flac
            .vorbis_comments()
            .map(Self::extract_from_comments)
            .unwrap_or_default();
        tags.content_signature = ContentSignature::from_u128(flac.properties().signature());

        Ok(tags)
    }

    fn read_generic(path: &Path) -> Result<RawTags, MetadataError> {
        let tagged_file = lofty::read_from_path(path)?;

        let tag = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.tags().first());

        Ok(tag.map(Self::extract_from_tag).unwrap_or_default())
    }

    /// Artist priority: first `ARTISTS` entry, then `ALBUMARTIST`, then `ARTIST`
    fn extract_from_comments(comments: &VorbisComments) -> RawTags {
        let artist = comments
            .get("ARTISTS")
            .and_then(first_artist)
            .or_else(|| non_blank(comments.get("ALBUMARTIST")))
            .or_else(|| non_blank(comments.get("ARTIST")));

        RawTags {
            title: non_blank(comments.get("TITLE")),
            artist,
            album: non_blank(comments.get("ALBUM")),
            track_number: comments.get("TRACKNUMBER").and_then(parse_track_number),
            content_signature: None,
        }
    }

    fn extract_from_tag(tag: &lofty::Tag) -> RawTags {
        let artist = non_blank(tag.get_string(&ItemKey::AlbumArtist))
            .or_else(|| non_blank(tag.artist().as_deref()));

        RawTags {
            title: non_blank(tag.title().as_deref()),
            artist,
            album: non_blank(tag.album().as_deref()),
            track_number: tag
                .track()
                .or_else(|| tag.get_string(&ItemKey::TrackNumber).and_then(parse_track_number)),
            content_signature: None,
        }
    }
}

impl TagReader for LoftyTagReader {
    fn read(&self, path: &Path) -> tracksync_core::Result<RawTags> {
        if !path.exists() {
            return Err(MetadataError::FileNotFound.at(path));
        }

        let result = match file_type(path) {
            Some(FileType::Flac) => Self::read_flac(path),
            Some(_) => Self::read_generic(path),
            None => Err(MetadataError::UnsupportedFormat(
                path.extension()
                    .map(|ext| ext.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            )),
        };

        result.map_err(|e| e.at(path))
    }

    fn supports_format(&self, path: &Path) -> bool {
        file_type(path).is_some()
    }
}

fn file_type(path: &Path) -> Option<FileType> {
    path.extension().and_then(FileType::from_ext)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// First artist of a `;`-separated `ARTISTS` value
pub fn first_artist(artists: &str) -> Option<String> {
    non_blank(artists.split(';').next())
}

/// Parse a track number, accepting the `3/12` form
pub fn parse_track_number(value: &str) -> Option<u32> {
    value.split('/').next()?.trim().parse().ok()
}
