mod collision;
mod identity;
mod namespace;
mod signature;
mod stamp;

pub use collision::{CollisionKind, CollisionWarning};
pub use identity::{
    DisplayFields, RawTags, TrackIdentity, TrackTags, UNKNOWN_ALBUM, UNKNOWN_ARTIST,
    UNKNOWN_TITLE, UNKNOWN_TRACK_NUMBER,
};
pub use namespace::Namespace;
pub use signature::ContentSignature;
pub use stamp::FileStamp;
