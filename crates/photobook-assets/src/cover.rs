// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Parsed cover insert.

use lopdf::{Document, ObjectId};
use photobook_core::ResolutionError;
use tracing::debug;

/// A decoded multi-page PDF whose pages are copied verbatim ahead of the
/// album content.
#[derive(Debug, Clone)]
pub struct CoverDocument {
    /// Parsed document with at least one page.
    document: Document,
}

impl CoverDocument {
    /// Parse PDF bytes. A document without pages is rejected.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ResolutionError> {
        let document = Document::load_mem(data)
            .map_err(|err| ResolutionError::InvalidCover(err.to_string()))?;
        Self::from_document(document)
    }

    /// Wrap an already-loaded document.
    pub fn from_document(document: Document) -> Result<Self, ResolutionError> {
        let pages = document.get_pages().len();
        if pages == 0 {
            return Err(ResolutionError::InvalidCover(
                "document has no pages".to_string(),
            ));
        }
        debug!(pages, "cover document parsed");
        Ok(Self { document })
    }

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Page object IDs in page order.
    pub fn page_ids(&self) -> Vec<ObjectId> {
        // `get_pages` is keyed by 1-based page number, so values iterate in order.
        self.document.get_pages().into_values().collect()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}
