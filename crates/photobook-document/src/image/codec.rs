// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Codec sniffing and image embedding.
//
// Only PNG and JPEG are accepted. The leading bytes pick the first decoder to
// try; the other codec is the fallback, so a mislabelled or truncated header
// still gets a second chance before the image is rejected.

use image::{DynamicImage, ImageFormat};
use photobook_core::EmbedError;
use printpdf::{PdfDocument, RawImage, RawImageData, RawImageFormat, XObjectId};
use tracing::{debug, instrument};

const PNG_SIGNATURE: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];
const JPEG_SIGNATURE: [u8; 2] = [0xFF, 0xD8];

/// The two codecs an album page or annotation image may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Png,
    Jpeg,
}

impl Codec {
    /// The fallback codec.
    pub fn other(self) -> Self {
        match self {
            Self::Png => Self::Jpeg,
            Self::Jpeg => Self::Png,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
        }
    }
}

/// Guess the codec from the leading signature bytes.
pub fn sniff_codec(bytes: &[u8]) -> Option<Codec> {
    if bytes.starts_with(&PNG_SIGNATURE) {
        Some(Codec::Png)
    } else if bytes.starts_with(&JPEG_SIGNATURE) {
        Some(Codec::Jpeg)
    } else {
        None
    }
}

/// An image registered with the output document.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    /// XObject registered with the document.
    pub id: XObjectId,
    /// Decoded width in pixels.
    pub width_px: u32,
    /// Decoded height in pixels.
    pub height_px: u32,
    /// Codec that decoded the bytes.
    pub codec: Codec,
}

/// Decode `bytes` with the sniffed codec, falling back to the other one.
///
/// Unrecognised signatures try PNG first, then JPEG.
pub fn decode(bytes: &[u8]) -> Result<(DynamicImage, Codec), EmbedError> {
    let first = sniff_codec(bytes).unwrap_or(Codec::Png);
    let order = [first, first.other()];

    let mut last_error = String::from("no decoder attempted");
    for codec in order {
        match image::load_from_memory_with_format(bytes, codec.image_format()) {
            Ok(img) => {
                if codec != first {
                    debug!(sniffed = first.name(), used = codec.name(), "codec fallback");
                }
                return Ok((img, codec));
            }
            Err(err) => last_error = err.to_string(),
        }
    }

    Err(EmbedError {
        attempted: format!("{}, {}", order[0].name(), order[1].name()),
        detail: last_error,
    })
}

/// Convert a decoded image into printpdf's raw pixel form.
///
/// Images with an alpha channel keep it; everything else is flattened to RGB.
pub fn to_raw_image(img: &DynamicImage) -> RawImage {
    let width = img.width() as usize;
    let height = img.height() as usize;

    if img.color().has_alpha() {
        RawImage {
            pixels: RawImageData::U8(img.to_rgba8().into_raw()),
            width,
            height,
            data_format: RawImageFormat::RGBA8,
            tag: Vec::new(),
        }
    } else {
        RawImage {
            pixels: RawImageData::U8(img.to_rgb8().into_raw()),
            width,
            height,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        }
    }
}

/// Decode `bytes` and register the pixels with `doc`.
#[instrument(skip_all, fields(bytes_len = bytes.len()))]
pub fn embed(doc: &mut PdfDocument, bytes: &[u8]) -> Result<EmbeddedImage, EmbedError> {
    let (img, codec) = decode(bytes)?;
    if img.width() == 0 || img.height() == 0 {
        return Err(EmbedError {
            attempted: codec.name().to_string(),
            detail: "image has zero width or height".to_string(),
        });
    }

    let raw = to_raw_image(&img);
    let id = doc.add_image(&raw);
    debug!(width = img.width(), height = img.height(), codec = codec.name(), "image embedded");

    Ok(EmbeddedImage {
        id,
        width_px: img.width(),
        height_px: img.height(),
        codec,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

    pub fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
        encode(DynamicImage::ImageRgb8(img), ImageFormat::Png)
    }

    pub fn png_with_alpha(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 128]));
        encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
    }

    pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([40, 120, 200]));
        encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
    }

    fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), format)
            .expect("encode fixture");
        buffer
    }
}
