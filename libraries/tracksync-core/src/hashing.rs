//! Hashing strategy for metadata fingerprints
//!
//! The strategy is a plain value chosen from configuration and handed to every
//! component that computes or verifies a fingerprint.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Separator placed between hashed fields so `("ab", "c")` and `("a", "bc")` differ
const FIELD_SEPARATOR: u8 = 0x1f;

/// Digest algorithm used for metadata fingerprints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashStrategy {
    /// BLAKE3 (default)
    #[default]
    Blake3,
    /// SHA-256
    Sha256,
}

impl HashStrategy {
    /// Hash an ordered list of fields into a lowercase hex digest
    pub fn digest(&self, parts: &[&str]) -> String {
        match self {
            HashStrategy::Blake3 => {
                let mut hasher = blake3::Hasher::new();
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        hasher.update(&[FIELD_SEPARATOR]);
                    }
                    hasher.update(part.as_bytes());
                }
                hasher.finalize().to_hex().to_string()
            }
            HashStrategy::Sha256 => {
                let mut hasher = Sha256::new();
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        hasher.update([FIELD_SEPARATOR]);
                    }
                    hasher.update(part.as_bytes());
                }
                hex::encode(hasher.finalize())
            }
        }
    }

    /// Name used in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            HashStrategy::Blake3 => "blake3",
            HashStrategy::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for HashStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "blake3" => Ok(HashStrategy::Blake3),
            "sha256" | "sha-256" => Ok(HashStrategy::Sha256),
            other => Err(format!("unknown hash algorithm: {}", other)),
        }
    }
}
