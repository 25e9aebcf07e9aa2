// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// photobook-document — Album assembly engine for Photobook.
//
// Resolves page and annotation images with bounded concurrency, lays each page
// image into the content box of the chosen format, composites annotations on
// top, and serializes the result with an optional cover in front.

pub mod assembler;
pub mod compositor;
pub mod export;
pub mod geometry;
pub mod image;
pub mod loader;
pub mod pdf;
pub mod progress;
pub mod stats;

// Re-export the primary entry points so callers can use `photobook_document::AlbumExporter` etc.
pub use assembler::{AssembledAlbum, DocumentAssembler};
pub use compositor::{AnnotationCompositor, Surface};
pub use export::{AlbumExporter, ExportRequest};
pub use geometry::{PageGeometry, Placement, fit_image};
pub use self::image::{Codec, EmbeddedImage, embed, sniff_codec};
pub use loader::{AssetBatchLoader, AssetCache, AssetRequest, ResolvedAsset};
pub use pdf::{PdfReader, serialize};
pub use stats::ExportStats;
