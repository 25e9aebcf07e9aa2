// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Collaborator traits injected into the export engine.
//
// The engine never knows where an image lives. It receives an `AssetResolver`
// at construction time and a `ProgressSink` per export call.

use async_trait::async_trait;
use photobook_core::{ExportProgress, ResolutionError, ResourceHandle};

use crate::cover::CoverDocument;

/// Turns opaque handles into bytes.
///
/// Implementations must not panic on bad input; every failure is returned as
/// a `ResolutionError` value so the engine can skip just the affected item.
#[async_trait]
pub trait AssetResolver: Send + Sync {
    /// Fetch the raw encoded bytes behind `handle`.
    async fn resolve(&self, handle: &ResourceHandle) -> Result<Vec<u8>, ResolutionError>;

    /// Fetch and parse a multi-page cover document.
    ///
    /// The default fetches the bytes with [`AssetResolver::resolve`] and
    /// parses them as PDF.
    async fn resolve_cover(
        &self,
        handle: &ResourceHandle,
    ) -> Result<CoverDocument, ResolutionError> {
        let bytes = self.resolve(handle).await?;
        CoverDocument::from_bytes(&bytes)
    }
}

/// Receives progress updates during an export.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, progress: ExportProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(ExportProgress) + Send + Sync,
{
    fn on_progress(&self, progress: ExportProgress) {
        self(progress)
    }
}
