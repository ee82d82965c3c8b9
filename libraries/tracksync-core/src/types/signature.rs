/// Content signature of an audio stream
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of "the same audio bytes", independent of tags
///
/// Stored as lowercase hex without a `0x` prefix, so `0xABC123` and `abc123`
/// are the same signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentSignature(String);

impl ContentSignature {
    /// Signature used when a file carries no usable checksum
    pub const UNKNOWN: &'static str = "unknown";

    /// Create a signature from a hex string, normalising case and prefix
    pub fn new(hex: impl AsRef<str>) -> Self {
        let trimmed = hex.as_ref().trim();
        let stripped = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        Self(stripped.to_lowercase())
    }

    /// Create a signature from a 128-bit checksum such as a FLAC STREAMINFO MD5
    ///
    /// Returns `None` for an all-zero checksum, which encoders write when they
    /// did not compute one.
    pub fn from_u128(value: u128) -> Option<Self> {
        (value != 0).then(|| Self(format!("{:032x}", value)))
    }

    /// The sentinel signature for files without a checksum
    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    /// Whether this is the sentinel signature
    pub fn is_unknown(&self) -> bool {
        self.0 == Self::UNKNOWN
    }

    /// First `len` characters, used as the filename collision suffix
    pub fn prefix(&self, len: usize) -> &str {
        match self.0.char_indices().nth(len) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_hex_prefix_and_lowercases() {
        assert_eq!(ContentSignature::new("0xABC123").as_str(), "abc123");
        assert_eq!(ContentSignature::new("abc123"), ContentSignature::new("0xabc123"));
    }

    #[test]
    fn prefix_is_bounded_by_length() {
        let sig = ContentSignature::new("0xabc123");
        assert_eq!(sig.prefix(4), "abc1");
        assert_eq!(sig.prefix(0), "");
        assert_eq!(sig.prefix(64), "abc123");
    }

    #[test]
    fn zero_checksum_is_absent() {
        assert_eq!(ContentSignature::from_u128(0), None);
        let sig = ContentSignature::from_u128(0xabc).unwrap();
        assert_eq!(sig.as_str(), "00000000000000000000000000000abc");
    }

    #[test]
    fn unknown_sentinel() {
        assert!(ContentSignature::unknown().is_unknown());
        assert!(!ContentSignature::new("abc").is_unknown());
    }
}
