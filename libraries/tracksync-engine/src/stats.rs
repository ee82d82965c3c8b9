//! Run statistics

use std::fmt;

/// Counters for one reconcile run
///
/// In dry-run mode `moved`, `copied` and `deleted` count the operations that
/// would have been performed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Audio files found under the input root
    pub source_files: usize,
    /// Audio files found under the output root before any change
    pub destination_files: usize,
    /// Destination files relocated in stage one
    pub moved: usize,
    /// Copies decided in stage two
    pub planned_copies: usize,
    /// Copies completed
    pub copied: usize,
    /// Source tracks whose destination needed nothing
    pub up_to_date: usize,
    /// Destination files removed in stage three
    pub deleted: usize,
    /// Expected destination files absent after stage three
    pub missing: usize,
    /// Signature groups with more than one file, over both trees
    pub duplicate_signatures: usize,
    /// Source files skipped because another source maps to the same path
    pub collisions: usize,
    /// Per-file failures
    pub errors: usize,
    pub dry_run: bool,
}

impl RunStats {
    /// Whether the run finished without per-file failures
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }

    /// Multi-line human readable summary
    pub fn summary_text(&self) -> String {
        let mut lines = Vec::new();
        if self.dry_run {
            lines.push("[dry-run] no files were changed".to_string());
        }

        let rows: [(&str, usize); 11] = [
            ("Source files", self.source_files),
            ("Destination files", self.destination_files),
            ("Moved", self.moved),
            ("Copies planned", self.planned_copies),
            ("Copied", self.copied),
            ("Up to date", self.up_to_date),
            ("Deleted", self.deleted),
            ("Missing", self.missing),
            ("Duplicate signatures", self.duplicate_signatures),
            ("Path collisions", self.collisions),
            ("Errors", self.errors),
        ];
        lines.extend(
            rows.iter()
                .map(|(label, value)| format!("{:<22}{}", format!("{label}:"), value)),
        );

        lines.join("\n")
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_depends_on_errors_only() {
        let mut stats = RunStats {
            missing: 2,
            collisions: 1,
            ..RunStats::default()
        };
        assert!(stats.is_success());

        stats.errors = 1;
        assert!(!stats.is_success());
    }

    #[test]
    fn test_summary_lists_counters() {
        let stats = RunStats {
            source_files: 3,
            copied: 1,
            errors: 2,
            ..RunStats::default()
        };

        let text = stats.summary_text();

        assert!(text.contains("Source files:         3"));
        assert!(text.contains("Copied:               1"));
        assert!(text.contains("Errors:               2"));
        assert!(!text.contains("dry-run"));
    }

    #[test]
    fn test_dry_run_summary_is_marked() {
        let stats = RunStats {
            dry_run: true,
            ..RunStats::default()
        };

        assert!(stats.summary_text().starts_with("[dry-run]"));
    }
}
