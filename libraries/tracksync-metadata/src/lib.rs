//! tracksync Metadata
//!
//! Turns audio files into track identities.
//!
//! - [`LoftyTagReader`] reads display tags and the FLAC STREAMINFO checksum
//! - [`IdentityExtractor`] resolves paths, consults the fingerprint cache and
//!   falls back to the tag reader on a miss

mod error;
pub mod extractor;
pub mod reader;

pub use error::{MetadataError, Result};
pub use extractor::IdentityExtractor;
pub use reader::LoftyTagReader;
