// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembler — builds the content pages of an album.
//
// Pages are added strictly in input order on the calling task. Each page is
// its image aspect-fitted into the content box with the page's annotations
// composited on top. A page whose image cannot be resolved or decoded is
// skipped and counted; the export only fails if every page was skipped.

use photobook_core::{AnnotationSet, ExportConfig, Format, PhotobookError, ResourceHandle, Result};
use printpdf::{Mm, Op, PdfDocument, PdfPage, Pt, XObjectTransform};
use tracing::{debug, info, instrument};

use crate::compositor::{AnnotationCompositor, Surface};
use crate::geometry::{PageGeometry, fit_image};
use crate::image::embed;
use crate::loader::AssetCache;
use crate::stats::ExportStats;

/// printpdf sizes pages in millimetres; all layout here is in points.
fn mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

/// A finished set of pages ready for serialization.
pub struct AssembledAlbum {
    /// Image-cover and content pages, cover first.
    pub document: PdfDocument,
    /// Counts and warnings gathered while assembling.
    pub stats: ExportStats,
}

impl AssembledAlbum {
    /// Pages produced by the assembler: image-cover pages plus content pages.
    pub fn page_count(&self) -> usize {
        self.document.pages.len()
    }
}

/// Adds pages to one album document in order.
pub struct DocumentAssembler {
    /// Page and content box of the export format.
    geometry: PageGeometry,
    /// Receives every embedded image; pages are attached on `finish`.
    document: PdfDocument,
    /// Pages built so far, in output order.
    pages: Vec<PdfPage>,
    /// Shared by cover and content pages so annotation images embed once.
    compositor: AnnotationCompositor,
    /// Counts and warnings for the result.
    stats: ExportStats,
}

impl DocumentAssembler {
    /// Start a document for `format`. The format is validated here.
    pub fn new(format: &Format, config: &ExportConfig) -> Result<Self> {
        format.validate()?;
        let geometry = PageGeometry::from_format(format);
        debug!(
            page_width = geometry.page_width,
            page_height = geometry.page_height,
            content_width = geometry.content_width,
            content_height = geometry.content_height,
            "page geometry resolved"
        );

        Ok(Self {
            geometry,
            document: PdfDocument::new(&config.document_title),
            pages: Vec::new(),
            compositor: AnnotationCompositor::new(config),
            stats: ExportStats::default(),
        })
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn stats(&self) -> &ExportStats {
        &self.stats
    }

    /// Record a warning that did not come from page assembly itself.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.stats.warn(message);
    }

    // -- Cover spreads ---------------------------------------------------------

    /// Add one page per cover image, each sized to its image (1px = 1pt) and
    /// drawn from the origin, with the cover annotations on top. Unusable
    /// images are skipped with a warning.
    #[instrument(skip_all, fields(images = handles.len()))]
    pub fn add_cover_images(
        &mut self,
        handles: &[ResourceHandle],
        assets: &AssetCache,
        annotations: &AnnotationSet,
    ) {
        for (index, handle) in handles.iter().enumerate() {
            let embedded = assets
                .image(handle)
                .map_err(|err| err.to_string())
                .and_then(|bytes| embed(&mut self.document, bytes).map_err(|err| err.to_string()));

            let embedded = match embedded {
                Ok(embedded) => embedded,
                Err(reason) => {
                    self.stats
                        .warn(format!("Cover image {} was skipped: {reason}", index + 1));
                    continue;
                }
            };

            let width = embedded.width_px as f32;
            let height = embedded.height_px as f32;
            let mut ops = vec![Op::UseXobject {
                id: embedded.id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt(0.0)),
                    scale_x: Some(1.0),
                    scale_y: Some(1.0),
                    dpi: Some(72.0),
                    rotate: None,
                },
            }];

            let composited = self.compositor.composite(
                &mut self.document,
                Surface::Cover(index + 1),
                height,
                annotations.on_cover(),
                assets,
            );
            ops.extend(composited.ops);
            for warning in composited.skipped {
                self.stats.warn(warning);
            }

            self.pages.push(PdfPage::new(mm(width), mm(height), ops));
            self.stats.cover_pages += 1;
        }
    }

    // -- Content pages ---------------------------------------------------------

    /// Add content page `page_number` (1-based) showing `handle`.
    ///
    /// Returns whether the page made it into the document.
    #[instrument(skip_all, fields(page = page_number, handle = %handle))]
    pub fn add_page(
        &mut self,
        page_number: usize,
        handle: &ResourceHandle,
        assets: &AssetCache,
        annotations: &AnnotationSet,
    ) -> bool {
        let bytes = match assets.image(handle) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.stats.page_skipped(page_number, err);
                return false;
            }
        };

        let embedded = match embed(&mut self.document, bytes) {
            Ok(embedded) => embedded,
            Err(err) => {
                self.stats.page_skipped(page_number, err);
                return false;
            }
        };

        let placement = fit_image(
            embedded.width_px as f32,
            embedded.height_px as f32,
            &self.geometry,
        );

        let mut ops = vec![Op::UseXobject {
            id: embedded.id,
            transform: XObjectTransform {
                translate_x: Some(Pt(placement.x)),
                translate_y: Some(Pt(placement.y)),
                scale_x: Some(placement.width / embedded.width_px as f32),
                scale_y: Some(placement.height / embedded.height_px as f32),
                dpi: Some(72.0),
                rotate: None,
            },
        }];

        let page_index = u32::try_from(page_number).unwrap_or(u32::MAX);
        let composited = self.compositor.composite(
            &mut self.document,
            Surface::Content(page_number),
            self.geometry.page_height,
            annotations.on_page(page_index),
            assets,
        );
        ops.extend(composited.ops);
        for warning in composited.skipped {
            self.stats.warn(warning);
        }

        self.pages.push(PdfPage::new(
            mm(self.geometry.page_width),
            mm(self.geometry.page_height),
            ops,
        ));
        self.stats.page_processed();
        debug!(
            x = placement.x,
            y = placement.y,
            width = placement.width,
            height = placement.height,
            annotations = composited.drawn,
            "page assembled"
        );
        true
    }

    /// Close the page list.
    ///
    /// Fails with `AssemblyFailure` when content pages were attempted and
    /// none succeeded.
    pub fn finish(mut self) -> Result<AssembledAlbum> {
        if self.stats.all_pages_failed() {
            return Err(PhotobookError::AssemblyFailure {
                skipped: self.stats.pages_skipped,
                total: self.stats.pages_attempted,
            });
        }

        info!(
            pages = self.stats.pages_processed,
            skipped = self.stats.pages_skipped,
            cover_images = self.stats.cover_pages,
            annotation_images = self.compositor.embedded_images(),
            "assembly complete"
        );

        self.document.with_pages(self.pages);
        Ok(AssembledAlbum {
            document: self.document,
            stats: self.stats,
        })
    }
}
