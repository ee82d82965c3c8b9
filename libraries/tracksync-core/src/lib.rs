//! tracksync core
//!
//! Platform-agnostic types, traits, and error handling shared by every
//! tracksync crate.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `TrackIdentity`, `ContentSignature`, `Namespace`
//! - **Core Traits**: `TagReader`, the tag extraction collaborator
//! - **Hashing**: `HashStrategy`, injected wherever fingerprints are computed
//! - **Naming**: the expected output path of a track under the destination root
//! - **Error Handling**: unified `SyncError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use tracksync_core::types::{ContentSignature, RawTags, TrackIdentity};
//! use tracksync_core::{HashStrategy, OutputLayout};
//! use std::path::PathBuf;
//!
//! let tags = RawTags {
//!     artist: Some("X".to_string()),
//!     album: Some("Y".to_string()),
//!     title: Some("Z".to_string()),
//!     track_number: Some(1),
//!     content_signature: Some(ContentSignature::new("0xabc123")),
//! };
//! let identity = TrackIdentity::from_tags(PathBuf::from("/in/A.flac"), tags, HashStrategy::default());
//!
//! let layout = OutputLayout::new("/out", 4);
//! assert_eq!(layout.expected_path(&identity), PathBuf::from("/out/X/Y/Z-abc1.flac"));
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod hashing;
pub mod output_path;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{Result, SyncError};
pub use hashing::HashStrategy;
pub use output_path::{sanitize_for_path, OutputLayout, MAX_COMPONENT_LEN};
pub use traits::TagReader;

pub use types::{
    CollisionWarning, ContentSignature, DisplayFields, FileStamp, Namespace, RawTags,
    TrackIdentity, TrackTags,
};
