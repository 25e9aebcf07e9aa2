// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Photobook.
//
// `ResolutionError` and `EmbedError` are recovered locally by the assembler
// (the owning page or annotation is skipped). `PhotobookError` is what reaches
// the caller when an export cannot produce a document at all.

use thiserror::Error;

/// Failure to turn a `ResourceHandle` into bytes or a cover document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("asset not found: {0}")]
    NotFound(String),

    #[error("failed to read asset {handle}: {detail}")]
    Io { handle: String, detail: String },

    #[error("malformed data URI: {0}")]
    InvalidDataUri(String),

    #[error("unsupported asset reference: {0}")]
    Unsupported(String),

    #[error("cover document could not be parsed: {0}")]
    InvalidCover(String),

    #[error("resolution task for {0} did not complete")]
    Interrupted(String),
}

/// Failure to embed fetched image bytes with either supported codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not embed image as {attempted}: {detail}")]
pub struct EmbedError {
    /// Codecs tried, in order (e.g. "PNG, JPEG").
    pub attempted: String,
    /// Decoder message from the last attempt.
    pub detail: String,
}

/// Top-level error type for all Photobook operations.
#[derive(Debug, Error)]
pub enum PhotobookError {
    // -- Input errors --
    #[error("invalid page format: {0}")]
    InvalidFormat(String),

    #[error("invalid export configuration: {0}")]
    InvalidConfig(String),

    #[error("nothing to export: the page set is empty and no cover pages were produced")]
    EmptyPageSet,

    // -- Document errors --
    #[error("no pages could be processed ({skipped} of {total} skipped)")]
    AssemblyFailure { skipped: usize, total: usize },

    #[error("document serialization failed: {0}")]
    SerializationFailure(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PhotobookError {
    /// True for the errors that abort an export with no output document.
    pub fn is_fatal_export_failure(&self) -> bool {
        matches!(
            self,
            Self::AssemblyFailure { .. } | Self::SerializationFailure(_) | Self::EmptyPageSet
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PhotobookError>;
