// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Photobook export engine.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PhotobookError, Result};

/// Default line box height for text annotations that omit one.
pub const DEFAULT_TEXT_HEIGHT: f32 = 20.0;

/// Opaque reference to an image or a cover document.
///
/// The engine never interprets the string; only an `AssetResolver` does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceHandle(pub String);

impl ResourceHandle {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceHandle {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ResourceHandle {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // data: URIs can be megabytes long; keep log lines readable.
        if self.0.chars().count() > 64 {
            let head: String = self.0.chars().take(64).collect();
            write!(f, "{head}…")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Trim size and margin of the printed product, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Format {
    /// Trimmed page width in points.
    pub trim_width: f32,
    /// Trimmed page height in points.
    pub trim_height: f32,
    /// Uniform margin around the content box, in points.
    pub margin: f32,
    /// Landscape swaps the trim width and height.
    #[serde(default)]
    pub orientation: Orientation,
}

impl Format {
    /// Hardcover album: A4 portrait, 15 mm margins.
    pub fn hard() -> Self {
        Self {
            trim_width: 595.0,
            trim_height: 842.0,
            margin: 42.5,
            orientation: Orientation::Portrait,
        }
    }

    /// Softcover album: A5 portrait, 10 mm margins.
    pub fn soft() -> Self {
        Self {
            trim_width: 420.0,
            trim_height: 595.0,
            margin: 28.3,
            orientation: Orientation::Portrait,
        }
    }

    /// Page (width, height) after applying the orientation.
    pub fn page_size(&self) -> (f32, f32) {
        match self.orientation {
            Orientation::Portrait => (self.trim_width, self.trim_height),
            Orientation::Landscape => (self.trim_height, self.trim_width),
        }
    }

    /// Check the trim size is positive and the margins leave a content box.
    pub fn validate(&self) -> Result<()> {
        let finite = [self.trim_width, self.trim_height, self.margin]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.trim_width <= 0.0 || self.trim_height <= 0.0 {
            return Err(PhotobookError::InvalidFormat(format!(
                "trim size must be positive, got {}x{}",
                self.trim_width, self.trim_height
            )));
        }
        if self.margin < 0.0 {
            return Err(PhotobookError::InvalidFormat(format!(
                "margin must not be negative, got {}",
                self.margin
            )));
        }
        let smaller = self.trim_width.min(self.trim_height);
        if 2.0 * self.margin >= smaller {
            return Err(PhotobookError::InvalidFormat(format!(
                "margin {} leaves no content area on a {}x{} page",
                self.margin, self.trim_width, self.trim_height
            )));
        }
        Ok(())
    }
}

/// The two products offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatPreset {
    Hard,
    Soft,
}

impl FormatPreset {
    pub fn format(&self) -> Format {
        match self {
            Self::Hard => Format::hard(),
            Self::Soft => Format::soft(),
        }
    }
}

impl From<FormatPreset> for Format {
    fn from(preset: FormatPreset) -> Self {
        preset.format()
    }
}

/// Ordered page images, one per content page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageSet(pub Vec<ResourceHandle>);

impl PageSet {
    pub fn new(pages: impl IntoIterator<Item = impl Into<ResourceHandle>>) -> Self {
        Self(pages.into_iter().map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResourceHandle> {
        self.0.iter()
    }
}

/// Pre-made pages placed ahead of the content pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverInsert {
    /// A multi-page PDF whose pages are copied verbatim.
    Document(ResourceHandle),
    /// A spread delivered as one image per page; each page is sized to its image.
    Images(Vec<ResourceHandle>),
}

/// Which page an annotation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPage", into = "RawPage")]
pub enum AnnotationPage {
    /// 1-based content page index.
    Content(u32),
    /// The cover. Drawn on every page of an image spread, never on a copied
    /// PDF cover.
    Cover,
}

impl Default for AnnotationPage {
    fn default() -> Self {
        Self::Content(1)
    }
}

/// Wire shape of `page`: a number or the string `"cover"`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawPage {
    Index(u32),
    Label(String),
}

impl TryFrom<RawPage> for AnnotationPage {
    type Error = String;

    fn try_from(raw: RawPage) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawPage::Index(0) => Err("annotation page indices are 1-based".to_string()),
            RawPage::Index(n) => Ok(Self::Content(n)),
            RawPage::Label(label) if label == "cover" => Ok(Self::Cover),
            RawPage::Label(label) => Err(format!("unknown annotation page {label:?}")),
        }
    }
}

impl From<AnnotationPage> for RawPage {
    fn from(page: AnnotationPage) -> Self {
        match page {
            AnnotationPage::Content(n) => RawPage::Index(n),
            AnnotationPage::Cover => RawPage::Label("cover".to_string()),
        }
    }
}

fn default_text_height() -> f32 {
    DEFAULT_TEXT_HEIGHT
}

/// A free-form overlay authored in top-left-origin page coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Annotation {
    #[serde(rename_all = "camelCase")]
    Text {
        x: f32,
        y: f32,
        #[serde(default)]
        width: f32,
        #[serde(default = "default_text_height")]
        height: f32,
        content: String,
        #[serde(default)]
        color: Option<String>,
        #[serde(default)]
        font_size: Option<f32>,
        #[serde(default)]
        font_family: Option<String>,
        #[serde(default)]
        z_index: i32,
        #[serde(default)]
        page: AnnotationPage,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        #[serde(rename = "imageUri")]
        image_ref: ResourceHandle,
        #[serde(default)]
        z_index: i32,
        #[serde(default)]
        page: AnnotationPage,
    },
}

impl Annotation {
    pub fn page(&self) -> AnnotationPage {
        match self {
            Self::Text { page, .. } | Self::Image { page, .. } => *page,
        }
    }

    pub fn z_index(&self) -> i32 {
        match self {
            Self::Text { z_index, .. } | Self::Image { z_index, .. } => *z_index,
        }
    }

    /// Authoring-space (x, y, height).
    pub fn anchor(&self) -> (f32, f32, f32) {
        match self {
            Self::Text { x, y, height, .. } | Self::Image { x, y, height, .. } => {
                (*x, *y, *height)
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
        }
    }
}

/// All annotations of a project, supplied in full before an export starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationSet(pub Vec<Annotation>);

impl AnnotationSet {
    pub fn new(annotations: Vec<Annotation>) -> Self {
        Self(annotations)
    }

    /// Parse the persisted annotation array.
    ///
    /// Entries of types the exporter does not render (freehand `drawing`) are
    /// dropped.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let mut annotations = Vec::with_capacity(raw.len());
        for value in raw {
            let kind = value.get("type").and_then(|t| t.as_str()).unwrap_or("");
            if kind != "text" && kind != "image" {
                debug!(kind, "ignoring annotation type without an export rendering");
                continue;
            }
            annotations.push(serde_json::from_value(value)?);
        }
        Ok(Self(annotations))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.0.iter()
    }

    /// Annotations on the given content page, in input order.
    pub fn on_page(&self, page: u32) -> impl Iterator<Item = &Annotation> {
        self.0
            .iter()
            .filter(move |ann| ann.page() == AnnotationPage::Content(page))
    }

    /// Annotations placed on the cover, in input order.
    pub fn on_cover(&self) -> impl Iterator<Item = &Annotation> {
        self.0
            .iter()
            .filter(|ann| ann.page() == AnnotationPage::Cover)
    }

    /// Distinct image references, in first-seen order.
    pub fn image_refs(&self) -> Vec<ResourceHandle> {
        let mut seen = HashSet::new();
        self.0
            .iter()
            .filter_map(|ann| match ann {
                Annotation::Image { image_ref, .. } => Some(image_ref),
                Annotation::Text { .. } => None,
            })
            .filter(|handle| seen.insert((*handle).clone()))
            .cloned()
            .collect()
    }
}

/// Progress counter reported to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportProgress {
    /// Progress so far, never decreasing within one export.
    pub current: u32,
    /// Value `current` reaches when the export is done.
    pub total: u32,
}

impl ExportProgress {
    pub fn new(current: u32, total: u32) -> Self {
        Self { current, total }
    }

    pub fn is_complete(&self) -> bool {
        self.current >= self.total
    }
}

/// Outcome of a successful (possibly partial) export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResult {
    /// The serialized PDF.
    #[serde(skip)]
    pub document_bytes: Vec<u8>,
    /// Content pages that made it into the document.
    pub pages_processed: usize,
    /// Content pages dropped because their image failed.
    pub pages_skipped: usize,
    /// Pages copied from the cover insert.
    pub cover_pages: usize,
    /// Human-readable notes about everything that was skipped.
    pub warnings: Vec<String>,
}

impl ExportResult {
    /// Total pages in the output document.
    pub fn page_count(&self) -> usize {
        self.cover_pages + self.pages_processed
    }

    pub fn is_partial(&self) -> bool {
        self.pages_skipped > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert!(Format::hard().validate().is_ok());
        assert!(Format::soft().validate().is_ok());
        assert_eq!(FormatPreset::Soft.format().page_size(), (420.0, 595.0));
    }

    #[test]
    fn oversized_margin_is_rejected() {
        let format = Format {
            trim_width: 100.0,
            trim_height: 200.0,
            margin: 50.0,
            orientation: Orientation::Portrait,
        };
        assert!(matches!(
            format.validate(),
            Err(PhotobookError::InvalidFormat(_))
        ));
    }

    #[test]
    fn landscape_swaps_dimensions() {
        let format = Format {
            orientation: Orientation::Landscape,
            ..Format::hard()
        };
        assert_eq!(format.page_size(), (842.0, 595.0));
    }

    #[test]
    fn annotation_json_parses_both_variants() {
        let json = r##"[
            {"id": "a", "type": "text", "x": 10, "y": 20, "width": 100, "height": 30,
             "content": "Hello", "color": "#ff0000", "fontSize": 12, "zIndex": 2, "page": 3},
            {"id": "b", "type": "image", "x": 0, "y": 0, "width": 50, "height": 50,
             "imageUri": "asset:sticker-heart", "zIndex": 1},
            {"id": "c", "type": "drawing", "x": 0, "y": 0, "width": 1, "height": 1, "zIndex": 0},
            {"id": "d", "type": "text", "x": 0, "y": 0, "content": "Cover", "zIndex": 0, "page": "cover"}
        ]"##;

        let set = AnnotationSet::from_json(json).expect("parse");
        assert_eq!(set.len(), 3);

        match &set.0[0] {
            Annotation::Text {
                content,
                color,
                font_size,
                page,
                ..
            } => {
                assert_eq!(content, "Hello");
                assert_eq!(color.as_deref(), Some("#ff0000"));
                assert_eq!(*font_size, Some(12.0));
                assert_eq!(*page, AnnotationPage::Content(3));
            }
            other => panic!("expected text, got {other:?}"),
        }

        // Missing page defaults to the first content page.
        assert_eq!(set.0[1].page(), AnnotationPage::Content(1));
        assert_eq!(set.0[2].page(), AnnotationPage::Cover);
        // Missing height defaults to the text line box.
        assert_eq!(set.0[2].anchor().2, DEFAULT_TEXT_HEIGHT);
    }

    #[test]
    fn zero_page_index_is_rejected() {
        let json = r#"[{"type": "text", "x": 0, "y": 0, "content": "x", "page": 0}]"#;
        assert!(AnnotationSet::from_json(json).is_err());
    }

    #[test]
    fn image_refs_are_distinct_in_first_seen_order() {
        let image = |r: &str| Annotation::Image {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
            image_ref: r.into(),
            z_index: 0,
            page: AnnotationPage::Content(1),
        };
        let set = AnnotationSet::new(vec![image("b"), image("a"), image("b")]);
        assert_eq!(set.image_refs(), vec![ResourceHandle::from("b"), "a".into()]);
    }

    #[test]
    fn long_handles_are_truncated_for_display() {
        let handle = ResourceHandle::new(format!("data:image/png;base64,{}", "A".repeat(200)));
        assert!(handle.to_string().chars().count() <= 65);
    }
}
