// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Serializer — finalizes the assembled album into PDF bytes.
//
// printpdf 0.8 writes the generated pages. It cannot import pages from another
// file, so when a PDF cover is present the output is reloaded with `lopdf` and
// the cover pages are spliced in front of the content. Neither writer is asked
// to build object streams.

use lopdf::{Document, Object, dictionary};
use photobook_assets::CoverDocument;
use photobook_core::{PhotobookError, Result};
use printpdf::{PdfDocument, PdfSaveOptions, PdfWarnMsg};
use tracing::{debug, info, instrument, warn};

use crate::pdf::reader::prepend_pages;

/// Output of [`serialize`].
#[derive(Debug)]
pub struct Finalized {
    /// The finished PDF.
    pub bytes: Vec<u8>,
    /// Pages copied from the cover document.
    pub cover_pages: usize,
    /// Set when the cover could not be copied and was left out.
    pub cover_warning: Option<String>,
}

/// Serialize `content`, placing every page of `cover` (if any) first.
///
/// A cover that cannot be copied is dropped with a warning; the content is
/// still written. Failing to write the document at all is fatal.
#[instrument(skip_all, fields(content_pages = content.pages.len(), cover = cover.is_some()))]
pub fn serialize(content: PdfDocument, cover: Option<&CoverDocument>, title: &str) -> Result<Finalized> {
    let content_bytes = if content.pages.is_empty() {
        None
    } else {
        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let bytes = content.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!(count = warnings.len(), "printpdf reported warnings while saving");
        }
        Some(bytes)
    };

    let Some(cover) = cover else {
        let bytes = match content_bytes {
            Some(bytes) => bytes,
            None => save(&mut empty_document(title))?,
        };
        info!(bytes = bytes.len(), "album serialized");
        return Ok(Finalized {
            bytes,
            cover_pages: 0,
            cover_warning: None,
        });
    };

    let mut base = match &content_bytes {
        Some(bytes) => Document::load_mem(bytes).map_err(|err| {
            PhotobookError::SerializationFailure(format!("generated document unreadable: {err}"))
        })?,
        None => empty_document(title),
    };

    // Splice into a copy so a half-finished splice never reaches the output.
    let mut spliced = base.clone();
    let (cover_pages, cover_warning) =
        match prepend_pages(&mut spliced, cover.document(), &cover.page_ids()) {
            Ok(copied) => {
                base = spliced;
                (copied, None)
            }
            Err(err) => {
                warn!(%err, "cover pages could not be copied");
                (0, Some(format!("The cover could not be added: {err}")))
            }
        };

    let bytes = match (cover_pages, content_bytes) {
        // Nothing changed; keep printpdf's output as written.
        (0, Some(bytes)) => bytes,
        _ => save(&mut base)?,
    };

    info!(bytes = bytes.len(), cover_pages, "album serialized");
    Ok(Finalized {
        bytes,
        cover_pages,
        cover_warning,
    })
}

fn save(doc: &mut Document) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|err| PhotobookError::SerializationFailure(err.to_string()))?;
    Ok(output)
}

/// A valid document with an empty page tree and a title.
fn empty_document(title: &str) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => Vec::<Object>::new(),
        "Count" => Object::Integer(0),
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(title),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc
}

#[cfg(test)]
mod tests {
    use printpdf::{Mm, PdfPage};

    use super::*;
    use crate::pdf::reader::PdfReader;

    fn content(pages: usize) -> PdfDocument {
        let mut doc = PdfDocument::new("Album");
        let pages = (0..pages)
            .map(|_| PdfPage::new(Mm(210.0), Mm(297.0), Vec::new()))
            .collect();
        doc.with_pages(pages);
        doc
    }

    fn cover(pages: usize) -> CoverDocument {
        let bytes = serialize(content(pages), None, "Cover").expect("cover").bytes;
        CoverDocument::from_bytes(&bytes).expect("parse cover")
    }

    #[test]
    fn content_only() {
        let out = serialize(content(3), None, "Album").expect("serialize");
        assert_eq!(out.cover_pages, 0);
        assert!(out.cover_warning.is_none());
        assert_eq!(PdfReader::from_bytes(&out.bytes).expect("read").page_count(), 3);
    }

    #[test]
    fn cover_pages_come_first() {
        let cover = cover(2);
        let out = serialize(content(3), Some(&cover), "Album").expect("serialize");
        assert_eq!(out.cover_pages, 2);

        let reader = PdfReader::from_bytes(&out.bytes).expect("read");
        assert_eq!(reader.page_count(), 5);
    }

    #[test]
    fn cover_only_album() {
        let cover = cover(2);
        let out = serialize(content(0), Some(&cover), "Just a cover").expect("serialize");
        let reader = PdfReader::from_bytes(&out.bytes).expect("read");
        assert_eq!(reader.page_count(), 2);
        assert_eq!(reader.title().as_deref(), Some("Just a cover"));
    }

    #[test]
    fn empty_album_is_still_a_valid_document() {
        let out = serialize(content(0), None, "Empty").expect("serialize");
        let reader = PdfReader::from_bytes(&out.bytes).expect("read");
        assert_eq!(reader.page_count(), 0);
    }
}
