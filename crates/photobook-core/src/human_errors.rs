// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable export outcomes.
//
// A fatal export and a partial export must read differently: the first tells
// the user nothing was produced and what to try next, the second tells them a
// document exists but some pages are missing.

use crate::error::PhotobookError;
use crate::types::ExportResult;

/// Severity of an outcome from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A document was produced but some content is missing.
    Warning,
    /// Worth trying again as-is (flaky storage, interrupted download).
    Transient,
    /// The user should change something (another format, other photos).
    ActionRequired,
    /// A bug or broken input that retrying will not fix.
    Permanent,
}

/// A human-readable outcome with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether offering a Retry button makes sense.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert a `PhotobookError` into a `HumanError` suitable for an alert.
pub fn humanize_error(err: &PhotobookError) -> HumanError {
    match err {
        PhotobookError::AssemblyFailure { total, .. } => HumanError {
            message: "The album could not be created.".into(),
            suggestion: format!(
                "None of the {total} photos could be added. Check that the photos are still on this device, then try again or pick a different format."
            ),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        PhotobookError::EmptyPageSet => HumanError {
            message: "There is nothing to put in the album yet.".into(),
            suggestion: "Add at least one photo or choose a cover, then export again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PhotobookError::SerializationFailure(_) => HumanError {
            message: "The album was put together but could not be saved.".into(),
            suggestion: "The device may be low on memory. Close other apps and try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        PhotobookError::InvalidFormat(detail) | PhotobookError::InvalidConfig(detail) => {
            HumanError {
                message: "This album format can't be used.".into(),
                suggestion: format!("Pick one of the standard formats instead. ({detail})"),
                retriable: false,
                severity: Severity::Permanent,
            }
        }

        PhotobookError::Io(_) => HumanError {
            message: "A file couldn't be read.".into(),
            suggestion: "Make sure the file is still on this device and try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        PhotobookError::PdfError(_) => HumanError {
            message: "There's a problem with the cover file.".into(),
            suggestion: "The cover may be damaged. Try choosing a different cover.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PhotobookError::Serialization(_) => HumanError {
            message: "The saved project data couldn't be read.".into(),
            suggestion: "Reopen the project and save it again before exporting.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

/// Describe a partial export. Returns `None` when every page made it.
pub fn summarize_partial(result: &ExportResult) -> Option<HumanError> {
    if !result.is_partial() {
        return None;
    }
    let total = result.pages_processed + result.pages_skipped;
    Some(HumanError {
        message: "Some pages were left out.".into(),
        suggestion: format!(
            "Processed {} of {} pages. {} pages were skipped because their photos couldn't be used.",
            result.pages_processed, total, result.pages_skipped
        ),
        retriable: true,
        severity: Severity::Warning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(processed: usize, skipped: usize) -> ExportResult {
        ExportResult {
            document_bytes: Vec::new(),
            pages_processed: processed,
            pages_skipped: skipped,
            cover_pages: 0,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn total_failure_suggests_another_format() {
        let err = PhotobookError::AssemblyFailure {
            skipped: 5,
            total: 5,
        };
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(human.suggestion.contains("different format"));
        assert!(err.is_fatal_export_failure());
    }

    #[test]
    fn serialization_failure_is_transient() {
        let human = humanize_error(&PhotobookError::SerializationFailure("oom".into()));
        assert_eq!(human.severity, Severity::Transient);
        assert!(human.retriable);
    }

    #[test]
    fn partial_export_is_a_warning_with_counts() {
        let human = summarize_partial(&result(2, 3)).expect("partial");
        assert_eq!(human.severity, Severity::Warning);
        assert!(human.suggestion.contains("Processed 2 of 5 pages"));
        assert!(human.suggestion.contains("3 pages were skipped"));
    }

    #[test]
    fn complete_export_has_no_summary() {
        assert!(summarize_partial(&result(4, 0)).is_none());
    }
}
