// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Failure accumulator.

use tracing::warn;

/// Page counts and warnings collected over one export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Content pages the assembler tried to add.
    pub pages_attempted: usize,
    /// Content pages that made it into the document.
    pub pages_processed: usize,
    /// Content pages left out after a resolution or embed failure.
    pub pages_skipped: usize,
    /// Pages contributed by an image cover spread.
    pub cover_pages: usize,
    /// Human-readable notes for everything left out, in the order it happened.
    pub warnings: Vec<String>,
}

impl ExportStats {
    pub fn page_processed(&mut self) {
        self.pages_attempted += 1;
        self.pages_processed += 1;
    }

    /// Record a skipped content page along with the reason.
    pub fn page_skipped(&mut self, page_number: usize, reason: impl std::fmt::Display) {
        self.pages_attempted += 1;
        self.pages_skipped += 1;
        self.warn(format!("Page {page_number} was skipped: {reason}"));
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.warnings.push(message);
    }

    /// True when content pages were attempted and none made it.
    pub fn all_pages_failed(&self) -> bool {
        self.pages_attempted > 0 && self.pages_processed == 0
    }

    /// The partial-success warning, if anything was skipped.
    pub fn skip_summary(&self) -> Option<String> {
        (self.pages_skipped > 0).then(|| {
            format!(
                "{} of {} pages could not be added to the album",
                self.pages_skipped, self.pages_attempted
            )
        })
    }
}
