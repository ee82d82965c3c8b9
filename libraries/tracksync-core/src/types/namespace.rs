/// Fingerprint cache namespaces
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which tree a cached fingerprint belongs to
///
/// Entries never satisfy lookups from the other namespace: the same absolute
/// path could coincidentally exist in both trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    /// Files under the input root
    Source,
    /// Files under the output root
    Destination,
}

impl Namespace {
    /// Backing table name
    pub fn table(&self) -> &'static str {
        match self {
            Namespace::Source => "source_cache",
            Namespace::Destination => "destination_cache",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Source => "source",
            Namespace::Destination => "destination",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source" | "source_cache" | "in_cache" => Ok(Namespace::Source),
            "destination" | "destination_cache" | "out_cache" => Ok(Namespace::Destination),
            other => Err(format!("invalid cache namespace: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_distinct() {
        assert_ne!(Namespace::Source.table(), Namespace::Destination.table());
    }

    #[test]
    fn parse_rejects_unknown_namespace() {
        assert_eq!("source".parse::<Namespace>(), Ok(Namespace::Source));
        assert_eq!("out_cache".parse::<Namespace>(), Ok(Namespace::Destination));
        assert!("tracks".parse::<Namespace>().is_err());
    }
}
