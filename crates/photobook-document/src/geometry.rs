// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page geometry and image placement.
//
// Everything here works in PDF points with a bottom-left origin. Authoring
// coordinates (annotations) use a top-left origin and are flipped with
// `pdf_y`.

use photobook_core::Format;

/// Page box and content box derived from a `Format`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Full page width in points.
    pub page_width: f32,
    /// Full page height in points.
    pub page_height: f32,
    /// Margin on every side, in points.
    pub margin: f32,
    /// Width of the box images are fitted into.
    pub content_width: f32,
    /// Height of the box images are fitted into.
    pub content_height: f32,
}

impl PageGeometry {
    /// Derive the geometry for `format`.
    ///
    /// # Panics
    ///
    /// If the margins leave no content area. Callers validate with
    /// [`Format::validate`] first.
    pub fn from_format(format: &Format) -> Self {
        let (page_width, page_height) = format.page_size();
        let content_width = page_width - 2.0 * format.margin;
        let content_height = page_height - 2.0 * format.margin;
        assert!(
            content_width > 0.0 && content_height > 0.0,
            "margin {} leaves no content area on a {}x{} page",
            format.margin,
            page_width,
            page_height
        );
        Self {
            page_width,
            page_height,
            margin: format.margin,
            content_width,
            content_height,
        }
    }
}

/// Where an image lands on the page, bottom-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Left edge in PDF space.
    pub x: f32,
    /// Bottom edge in PDF space.
    pub y: f32,
    /// Drawn width in points.
    pub width: f32,
    /// Drawn height in points.
    pub height: f32,
}

/// Aspect-fit an image of intrinsic size `(image_width, image_height)` into the
/// content box and center it.
pub fn fit_image(image_width: f32, image_height: f32, geometry: &PageGeometry) -> Placement {
    let cw = geometry.content_width;
    let ch = geometry.content_height;
    let image_ratio = image_width / image_height;
    let box_ratio = cw / ch;

    let (width, height) = if image_ratio > box_ratio {
        (cw, cw / image_ratio)
    } else {
        (ch * image_ratio, ch)
    };

    Placement {
        x: geometry.margin + (cw - width) / 2.0,
        y: geometry.page_height - geometry.margin - height - (ch - height) / 2.0,
        width,
        height,
    }
}

/// Flip an authoring-space box top `y` of height `height` into PDF space.
pub fn pdf_y(page_height: f32, y: f32, height: f32) -> f32 {
    page_height - y - height
}

/// Inverse of [`pdf_y`].
pub fn authoring_y(page_height: f32, pdf_y: f32, height: f32) -> f32 {
    page_height - pdf_y - height
}
