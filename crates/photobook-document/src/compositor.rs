// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Annotation compositor — turns a page's text and image overlays into
// printpdf operations drawn on top of the page image.
//
// Annotations are authored with a top-left origin; everything emitted here is
// flipped into PDF space with `geometry::pdf_y`. A failing annotation is
// reported and skipped without touching its neighbours.

use std::collections::HashMap;
use std::fmt;

use photobook_core::{Annotation, ExportConfig, ResourceHandle};
use printpdf::color::Color;
use printpdf::{BuiltinFont, Op, PdfDocument, Point, Pt, Rgb, TextItem, XObjectTransform};
use tracing::{debug, instrument};

use crate::geometry::pdf_y;
use crate::image::{EmbeddedImage, embed};
use crate::loader::AssetCache;

/// Characters WinAnsiEncoding places in 0x80..=0x9F.
const WIN_ANSI_EXTRAS: [char; 27] = [
    '\u{20AC}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{017D}', '\u{2018}',
    '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}', '\u{02DC}',
    '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{017E}', '\u{0178}',
];

/// The page an annotation batch is drawn on, used to label warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// 1-based content page.
    Content(usize),
    /// 1-based page of an image cover spread.
    Cover(usize),
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content(n) => write!(f, "Page {n}"),
            Self::Cover(n) => write!(f, "Cover page {n}"),
        }
    }
}

/// Operations for one page plus the annotations that could not be drawn.
#[derive(Debug, Default)]
pub struct Composited {
    /// Drawing operations in paint order, appended after the page image.
    pub ops: Vec<Op>,
    /// Annotations that produced operations.
    pub drawn: usize,
    /// One warning per annotation that was left out.
    pub skipped: Vec<String>,
}

/// Renders annotations for every page of one document.
///
/// Annotation images are embedded the first time they are used and the
/// resulting XObject is shared by later pages.
pub struct AnnotationCompositor {
    /// Font size for text annotations that carry none.
    default_font_size: f32,
    /// Font for text annotations whose family is absent or unknown.
    default_font: BuiltinFont,
    /// Embedding outcome per annotation image, kept for the whole document.
    images: HashMap<ResourceHandle, Result<EmbeddedImage, String>>,
}

impl AnnotationCompositor {
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            default_font_size: config.default_font_size,
            default_font: builtin_font(&config.default_font).unwrap_or(BuiltinFont::Helvetica),
            images: HashMap::new(),
        }
    }

    /// Number of distinct annotation images embedded so far.
    pub fn embedded_images(&self) -> usize {
        self.images.values().filter(|entry| entry.is_ok()).count()
    }

    /// Draw `annotations` on a page `page_height` points tall, in ascending
    /// z-index order. Equal z-indices keep their input order.
    #[instrument(skip_all, fields(surface = %surface))]
    pub fn composite<'a>(
        &mut self,
        doc: &mut PdfDocument,
        surface: Surface,
        page_height: f32,
        annotations: impl IntoIterator<Item = &'a Annotation>,
        assets: &AssetCache,
    ) -> Composited {
        let mut ordered: Vec<&Annotation> = annotations.into_iter().collect();
        ordered.sort_by_key(|ann| ann.z_index());

        let mut out = Composited::default();
        for (index, annotation) in ordered.into_iter().enumerate() {
            let result = match annotation {
                Annotation::Text {
                    x,
                    y,
                    height,
                    content,
                    color,
                    font_size,
                    font_family,
                    ..
                } => self.text_ops(
                    page_height,
                    *x,
                    *y,
                    *height,
                    content,
                    color.as_deref(),
                    *font_size,
                    font_family.as_deref(),
                ),
                Annotation::Image {
                    x,
                    y,
                    width,
                    height,
                    image_ref,
                    ..
                } => self.image_ops(doc, page_height, *x, *y, *width, *height, image_ref, assets),
            };

            match result {
                Ok(ops) => {
                    out.ops.extend(ops);
                    out.drawn += 1;
                }
                Err(reason) => {
                    debug!(index, kind = annotation.kind(), %reason, "annotation skipped");
                    out.skipped.push(format!(
                        "{surface}: {} annotation skipped ({reason})",
                        annotation.kind()
                    ));
                }
            }
        }
        out
    }

    // -- Text ------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn text_ops(
        &self,
        page_height: f32,
        x: f32,
        y: f32,
        height: f32,
        content: &str,
        color: Option<&str>,
        font_size: Option<f32>,
        font_family: Option<&str>,
    ) -> Result<Vec<Op>, String> {
        if content.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(c) = content.chars().find(|c| !win_ansi_encodable(*c)) {
            return Err(format!("{c:?} cannot be set in a built-in font"));
        }

        let size = font_size
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(self.default_font_size);
        let font = font_family
            .and_then(builtin_font)
            .unwrap_or(self.default_font);
        let (r, g, b) = color.and_then(parse_hex_color).unwrap_or((0.0, 0.0, 0.0));

        Ok(vec![
            Op::SaveGraphicsState,
            Op::SetFillColor {
                col: Color::Rgb(Rgb::new(r, g, b, None)),
            },
            Op::StartTextSection,
            Op::SetTextCursor {
                pos: Point {
                    x: Pt(x),
                    y: Pt(pdf_y(page_height, y, height)),
                },
            },
            Op::SetFontSizeBuiltinFont {
                size: Pt(size),
                font,
            },
            Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(content.to_string())],
                font,
            },
            Op::EndTextSection,
            Op::RestoreGraphicsState,
        ])
    }

    // -- Images ----------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn image_ops(
        &mut self,
        doc: &mut PdfDocument,
        page_height: f32,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image_ref: &ResourceHandle,
        assets: &AssetCache,
    ) -> Result<Vec<Op>, String> {
        if !(width > 0.0 && height > 0.0) {
            return Err(format!("non-positive size {width}x{height}"));
        }

        let embedded = self
            .images
            .entry(image_ref.clone())
            .or_insert_with(|| match assets.image(image_ref) {
                Ok(bytes) => embed(doc, bytes).map_err(|err| err.to_string()),
                Err(err) => Err(err.to_string()),
            })
            .as_ref()
            .map_err(Clone::clone)?;

        // Drawn at the authored size; no aspect correction.
        Ok(vec![Op::UseXobject {
            id: embedded.id.clone(),
            transform: XObjectTransform {
                translate_x: Some(Pt(x)),
                translate_y: Some(Pt(pdf_y(page_height, y, height))),
                scale_x: Some(width / embedded.width_px as f32),
                scale_y: Some(height / embedded.height_px as f32),
                dpi: Some(72.0),
                rotate: None,
            },
        }])
    }
}

// -- Helpers ------------------------------------------------------------------

/// Parse `#RRGGBB` or `#RGB` (leading `#` optional) into 0..=1 channels.
pub fn parse_hex_color(input: &str) -> Option<(f32, f32, f32)> {
    let hex = input.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| f32::from(v) / 255.0);

    match hex.len() {
        6 => Some((channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        3 => {
            let short = |i: usize| channel(&hex[i..=i].repeat(2));
            Some((short(0)?, short(1)?, short(2)?))
        }
        _ => None,
    }
}

/// Whether the base-14 fonts' WinAnsiEncoding has a code for `c`.
fn win_ansi_encodable(c: char) -> bool {
    matches!(u32::from(c), 0x20..=0x7E | 0xA0..=0xFF) || WIN_ANSI_EXTRAS.contains(&c)
}

/// Map a font family name onto one of the PDF base-14 fonts.
pub fn builtin_font(family: &str) -> Option<BuiltinFont> {
    let font = match family.trim().to_ascii_lowercase().as_str() {
        "helvetica" | "arial" | "sans-serif" | "default" => BuiltinFont::Helvetica,
        "helvetica-bold" | "arial-bold" => BuiltinFont::HelveticaBold,
        "times" | "times-roman" | "times new roman" | "serif" | "georgia" => BuiltinFont::TimesRoman,
        "times-bold" => BuiltinFont::TimesBold,
        "courier" | "monospace" => BuiltinFont::Courier,
        "courier-bold" => BuiltinFont::CourierBold,
        _ => return None,
    };
    Some(font)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use photobook_assets::InMemoryResolver;
    use photobook_core::AnnotationPage;

    use super::*;
    use crate::image::codec::fixtures;
    use crate::loader::{AssetBatchLoader, AssetRequest};

    fn text(content: &str, z_index: i32) -> Annotation {
        Annotation::Text {
            x: 10.0,
            y: 30.0,
            width: 100.0,
            height: 20.0,
            content: content.to_string(),
            color: Some("#ff0000".to_string()),
            font_size: None,
            font_family: None,
            z_index,
            page: AnnotationPage::Content(1),
        }
    }

    fn image(image_ref: &str, z_index: i32) -> Annotation {
        Annotation::Image {
            x: 50.0,
            y: 100.0,
            width: 40.0,
            height: 20.0,
            image_ref: image_ref.into(),
            z_index,
            page: AnnotationPage::Content(1),
        }
    }

    async fn cache_with(assets: Vec<(&str, Vec<u8>)>, requested: &[&str]) -> AssetCache {
        let mut resolver = InMemoryResolver::new();
        for (handle, bytes) in assets {
            resolver.insert(handle, bytes);
        }
        let requests: Vec<AssetRequest> = requested
            .iter()
            .map(|h| AssetRequest::Image((*h).into()))
            .collect();
        AssetBatchLoader::new(Arc::new(resolver), 4)
            .load_into_cache(&requests, |_, _| {})
            .await
    }

    fn written_text(ops: &[Op]) -> Vec<String> {
        ops.iter()
            .filter_map(|op| match op {
                Op::WriteTextBuiltinFont { items, .. } => match items.first() {
                    Some(TextItem::Text(s)) => Some(s.clone()),
                    _ => None,
                },
                _ => None,
            })
            .collect()
    }

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("#ff0000"), Some((1.0, 0.0, 0.0)));
        assert_eq!(parse_hex_color("00FF00"), Some((0.0, 1.0, 0.0)));
        assert_eq!(parse_hex_color("#fff"), Some((1.0, 1.0, 1.0)));
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#gg0000"), None);
        assert_eq!(parse_hex_color("#ффф"), None);
    }

    #[test]
    fn win_ansi_coverage() {
        assert!("Caf\u{e9} \u{2014} \u{201C}ok\u{201D} \u{20AC}5".chars().all(win_ansi_encodable));
        assert!(!win_ansi_encodable('\u{41F}'));
        assert!(!win_ansi_encodable('\u{65E5}'));
        assert!(!win_ansi_encodable('\u{81}'));
        assert!(!win_ansi_encodable('\n'));
    }

    #[test]
    fn font_families() {
        assert_eq!(builtin_font("Helvetica"), Some(BuiltinFont::Helvetica));
        assert_eq!(builtin_font("serif"), Some(BuiltinFont::TimesRoman));
        assert_eq!(builtin_font("Courier-Bold"), Some(BuiltinFont::CourierBold));
        assert_eq!(builtin_font("Comic Sans"), None);
    }

    #[tokio::test]
    async fn draws_in_z_order_and_keeps_ties_stable() {
        let assets = cache_with(vec![], &[]).await;
        let mut doc = PdfDocument::new("t");
        let mut compositor = AnnotationCompositor::new(&ExportConfig::default());

        let annotations = [text("top", 5), text("first", 0), text("second", 0), text("under", -1)];
        let out = compositor.composite(&mut doc, Surface::Content(1), 842.0, annotations.iter(), &assets);

        assert_eq!(out.drawn, 4);
        assert!(out.skipped.is_empty());
        assert_eq!(written_text(&out.ops), vec!["under", "first", "second", "top"]);
    }

    #[tokio::test]
    async fn text_is_flipped_into_pdf_space() {
        let assets = cache_with(vec![], &[]).await;
        let mut doc = PdfDocument::new("t");
        let mut compositor = AnnotationCompositor::new(&ExportConfig::default());

        let out = compositor.composite(&mut doc, Surface::Content(1), 842.0, [text("hi", 0)].iter(), &assets);
        let cursor = out.ops.iter().find_map(|op| match op {
            Op::SetTextCursor { pos } => Some((pos.x.0, pos.y.0)),
            _ => None,
        });
        assert_eq!(cursor, Some((10.0, 842.0 - 30.0 - 20.0)));

        let size = out.ops.iter().find_map(|op| match op {
            Op::SetFontSizeBuiltinFont { size, .. } => Some(size.0),
            _ => None,
        });
        assert_eq!(size, Some(16.0));
    }

    #[tokio::test]
    async fn text_outside_win_ansi_is_skipped_with_a_warning() {
        let assets = cache_with(vec![], &[]).await;
        let mut doc = PdfDocument::new("t");
        let mut compositor = AnnotationCompositor::new(&ExportConfig::default());

        let annotations = [text("\u{41F}\u{440}\u{438}\u{432}\u{435}\u{442}", 0), text("Hello", 1)];
        let out = compositor.composite(&mut doc, Surface::Content(2), 842.0, annotations.iter(), &assets);

        assert_eq!(out.drawn, 1);
        assert_eq!(written_text(&out.ops), vec!["Hello"]);
        assert_eq!(out.skipped.len(), 1);
        assert!(out.skipped[0].starts_with("Page 2: text annotation skipped"));
    }

    #[tokio::test]
    async fn cover_surface_flips_against_its_own_height() {
        let assets = cache_with(vec![], &[]).await;
        let mut doc = PdfDocument::new("t");
        let mut compositor = AnnotationCompositor::new(&ExportConfig::default());

        let out = compositor.composite(&mut doc, Surface::Cover(1), 300.0, [text("hi", 0)].iter(), &assets);
        let cursor_y = out.ops.iter().find_map(|op| match op {
            Op::SetTextCursor { pos } => Some(pos.y.0),
            _ => None,
        });
        assert_eq!(cursor_y, Some(300.0 - 30.0 - 20.0));
    }

    #[tokio::test]
    async fn failing_image_is_skipped_alone() {
        let assets = cache_with(
            vec![("good", fixtures::png(4, 2)), ("broken", b"nope".to_vec())],
            &["good", "broken", "missing"],
        )
        .await;
        let mut doc = PdfDocument::new("t");
        let mut compositor = AnnotationCompositor::new(&ExportConfig::default());

        let annotations = [image("broken", 0), image("good", 1), image("missing", 2), text("ok", 3)];
        let out = compositor.composite(&mut doc, Surface::Content(3), 842.0, annotations.iter(), &assets);

        assert_eq!(out.drawn, 2);
        assert_eq!(out.skipped.len(), 2);
        assert!(out.skipped.iter().all(|w| w.starts_with("Page 3: image annotation skipped")));

        let transform = out.ops.iter().find_map(|op| match op {
            Op::UseXobject { transform, .. } => Some(transform.clone()),
            _ => None,
        });
        let transform = transform.expect("image drawn");
        assert_eq!(transform.translate_y.map(|p| p.0), Some(842.0 - 100.0 - 20.0));
        assert_eq!(transform.scale_x, Some(10.0));
        assert_eq!(transform.scale_y, Some(10.0));
    }

    #[tokio::test]
    async fn annotation_images_are_embedded_once() {
        let assets = cache_with(vec![("sticker", fixtures::png(2, 2))], &["sticker"]).await;
        let mut doc = PdfDocument::new("t");
        let mut compositor = AnnotationCompositor::new(&ExportConfig::default());

        compositor.composite(&mut doc, Surface::Content(1), 842.0, [image("sticker", 0)].iter(), &assets);
        compositor.composite(
            &mut doc,
            Surface::Cover(1),
            300.0,
            [image("sticker", 0), image("sticker", 1)].iter(),
            &assets,
        );

        assert_eq!(compositor.embedded_images(), 1);
        assert_eq!(doc.resources.xobjects.map.len(), 1);
    }
}
