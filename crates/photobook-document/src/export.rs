// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Album export pipeline.
//
//   1. Resolve every distinct asset (bounded concurrency).
//   2. Assemble cover spreads and content pages in order.
//   3. Serialize, splicing a PDF cover in front.
//
// Only stage 1 runs concurrently. Everything that touches the document runs
// sequentially on the calling task.

use std::sync::Arc;

use photobook_assets::{AssetResolver, ProgressSink};
use photobook_core::{
    AnnotationSet, CoverInsert, ExportConfig, ExportResult, Format, PageSet,
    PhotobookError, Result,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::assembler::DocumentAssembler;
use crate::loader::{AssetBatchLoader, plan_requests};
use crate::pdf::serialize;
use crate::progress::ProgressReporter;

/// Everything needed to export one album.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Print format every content page is laid out for.
    pub format: Format,
    /// Content page images, in album order.
    pub pages: PageSet,
    /// Pages placed before the content, if any.
    #[serde(default)]
    pub cover: Option<CoverInsert>,
    /// Overlays for content pages and image covers.
    #[serde(default)]
    pub annotations: AnnotationSet,
}

impl ExportRequest {
    pub fn new(format: Format, pages: PageSet) -> Self {
        Self {
            format,
            pages,
            cover: None,
            annotations: AnnotationSet::default(),
        }
    }

    pub fn with_cover(mut self, cover: CoverInsert) -> Self {
        self.cover = Some(cover);
        self
    }

    pub fn with_annotations(mut self, annotations: AnnotationSet) -> Self {
        self.annotations = annotations;
        self
    }
}

/// Exports albums through an injected [`AssetResolver`].
///
/// Dropping the future returned by [`AlbumExporter::export`] cancels the
/// export; in-flight resolutions are aborted with it.
#[derive(Clone)]
pub struct AlbumExporter {
    /// Source of page, cover and annotation assets.
    resolver: Arc<dyn AssetResolver>,
    /// Tuning shared by every export run through this exporter.
    config: ExportConfig,
}

impl AlbumExporter {
    pub fn new(resolver: Arc<dyn AssetResolver>) -> Self {
        Self::with_config(resolver, ExportConfig::default())
    }

    pub fn with_config(resolver: Arc<dyn AssetResolver>, config: ExportConfig) -> Self {
        Self { resolver, config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Produce the album PDF for `request`.
    ///
    /// Individual pages, cover images, and annotations that fail are skipped
    /// and described in [`ExportResult::warnings`]. The export fails when
    /// there is nothing to export, when every content page fails, or when
    /// the document cannot be written.
    #[instrument(skip_all, fields(pages = request.pages.len(), cover = request.cover.is_some()))]
    pub async fn export(
        &self,
        request: &ExportRequest,
        progress: &dyn ProgressSink,
    ) -> Result<ExportResult> {
        self.config.validate()?;
        request.format.validate()?;
        if request.pages.is_empty() && !has_cover(request.cover.as_ref()) {
            return Err(PhotobookError::EmptyPageSet);
        }

        let mut progress = ProgressReporter::new(progress, self.config.progress);
        progress.start();

        // -- Loading ----------------------------------------------------------

        let requests = plan_requests(&request.pages, request.cover.as_ref(), &request.annotations);
        let loader = AssetBatchLoader::new(Arc::clone(&self.resolver), self.config.batch_size);
        let mut assets = loader
            .load_into_cache(&requests, |done, total| progress.loading(done, total))
            .await;
        progress.loaded();

        // -- Assembly ---------------------------------------------------------

        let mut assembler = DocumentAssembler::new(&request.format, &self.config)?;

        let cover_document = match &request.cover {
            Some(CoverInsert::Document(handle)) => match assets.take_cover(handle) {
                Ok(cover) => Some(cover),
                Err(err) => {
                    assembler.warn(format!("The cover could not be added: {err}"));
                    None
                }
            },
            Some(CoverInsert::Images(handles)) => {
                assembler.add_cover_images(handles, &assets, &request.annotations);
                None
            }
            None => None,
        };

        if cover_document.is_some() {
            let cover_annotations = request.annotations.on_cover().count();
            if cover_annotations > 0 {
                debug!(cover_annotations, "cover annotations are not drawn on a copied cover");
            }
        }

        let total_pages = request.pages.len();
        for (index, handle) in request.pages.iter().enumerate() {
            assembler.add_page(index + 1, handle, &assets, &request.annotations);
            progress.assembly(index + 1, total_pages);
        }

        let album = assembler.finish()?;
        if album.page_count() == 0 && cover_document.is_none() {
            return Err(PhotobookError::EmptyPageSet);
        }
        progress.assembled();

        // -- Serialization ----------------------------------------------------

        let mut stats = album.stats;
        let finalized = serialize(album.document, cover_document.as_ref(), &self.config.document_title)?;
        progress.serialized();

        if let Some(warning) = finalized.cover_warning {
            stats.warn(warning);
        }
        if finalized.cover_pages == 0 && stats.cover_pages == 0 && stats.pages_processed == 0 {
            return Err(PhotobookError::EmptyPageSet);
        }
        if let Some(summary) = stats.skip_summary() {
            stats.warnings.push(summary);
        }

        let result = ExportResult {
            document_bytes: finalized.bytes,
            pages_processed: stats.pages_processed,
            pages_skipped: stats.pages_skipped,
            cover_pages: stats.cover_pages + finalized.cover_pages,
            warnings: stats.warnings,
        };
        progress.finished();

        info!(
            pages = result.pages_processed,
            skipped = result.pages_skipped,
            cover_pages = result.cover_pages,
            bytes = result.document_bytes.len(),
            "album exported"
        );
        Ok(result)
    }
}

fn has_cover(cover: Option<&CoverInsert>) -> bool {
    match cover {
        Some(CoverInsert::Document(_)) => true,
        Some(CoverInsert::Images(handles)) => !handles.is_empty(),
        None => false,
    }
}
