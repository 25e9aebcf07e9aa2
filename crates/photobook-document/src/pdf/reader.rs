// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — inspect finished albums and copy pages between documents using
// the `lopdf` crate.

use std::collections::HashMap;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};
use photobook_core::{PhotobookError, Result};
use tracing::{debug, info, instrument, warn};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Read-only view of an existing PDF.
pub struct PdfReader {
    /// The parsed document.
    document: Document,
    /// Where the document was read from, if it came from disk.
    source_path: Option<String>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let mut reader = Self::from_bytes(&bytes)?;
        reader.source_path = Some(path.display().to_string());

        info!(pages = reader.page_count(), "PDF opened");
        Ok(reader)
    }

    /// Create a reader from PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            PhotobookError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
        })
    }

    // -- Inspection -----------------------------------------------------------

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Width and height in points of page `page_number` (1-based), taken from
    /// its own or an inherited /MediaBox.
    pub fn page_size(&self, page_number: u32) -> Option<(f32, f32)> {
        let page_id = *self.document.get_pages().get(&page_number)?;
        let media_box = inherited(&self.document, page_id, b"MediaBox")?;
        let values = resolve(&self.document, &media_box).as_array().ok()?;
        let nums: Vec<f32> = values.iter().filter_map(number).collect();
        match nums.as_slice() {
            [x0, y0, x1, y1] => Some(((x1 - x0).abs(), (y1 - y0).abs())),
            _ => None,
        }
    }

    /// The /Title entry of the /Info dictionary, if it is a plain string.
    pub fn title(&self) -> Option<String> {
        let info = self.document.trailer.get(b"Info").ok()?;
        let info = resolve(&self.document, info).as_dict().ok()?;
        match info.get(b"Title").ok()? {
            Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        }
    }
}

// -- Page copying ---------------------------------------------------------------

/// Copy `page_ids` from `source` to the front of `target`'s page tree, in the
/// given order. Returns the number of pages inserted.
///
/// Objects shared between the copied pages (fonts, images) are copied once.
#[instrument(skip_all, fields(pages = page_ids.len()))]
pub fn prepend_pages(target: &mut Document, source: &Document, page_ids: &[ObjectId]) -> Result<usize> {
    let pages_id = pages_root(target)?;
    let mut copier = ObjectCopier::new(source);

    let mut new_ids = Vec::with_capacity(page_ids.len());
    for &page_id in page_ids {
        new_ids.push(copier.copy_page(target, page_id)?);
    }

    for &id in &new_ids {
        if let Ok(Object::Dictionary(page)) = target.get_object_mut(id) {
            page.set("Parent", Object::Reference(pages_id));
        }
    }

    let pages = target
        .get_object_mut(pages_id)
        .and_then(Object::as_dict_mut)
        .map_err(|err| PhotobookError::PdfError(format!("page tree root unreadable: {err}")))?;

    let mut kids: Vec<Object> = new_ids.iter().map(|&id| Object::Reference(id)).collect();
    if let Ok(Object::Array(existing)) = pages.get(b"Kids") {
        kids.extend(existing.iter().cloned());
    }
    pages.set("Kids", Object::Array(kids));

    let count = match pages.get(b"Count") {
        Ok(Object::Integer(count)) => *count,
        _ => 0,
    };
    pages.set("Count", Object::Integer(count + new_ids.len() as i64));

    debug!(copied = new_ids.len(), objects = copier.copied(), "pages prepended");
    Ok(new_ids.len())
}

fn pages_root(doc: &Document) -> Result<ObjectId> {
    doc.catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|err| PhotobookError::PdfError(format!("no /Pages in catalog: {err}")))
}

/// Deep-copies objects from one document into another, remembering what was
/// already copied so shared and cyclic references map to one target object.
struct ObjectCopier<'a> {
    /// Document the objects are read from.
    source: &'a Document,
    /// Source id to target id for every object copied or reserved so far.
    mapped: HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    fn new(source: &'a Document) -> Self {
        Self {
            source,
            mapped: HashMap::new(),
        }
    }

    fn copied(&self) -> usize {
        self.mapped.len()
    }

    /// Copy a page with its inherited attributes made explicit. /Parent is
    /// left for the caller to set.
    fn copy_page(&mut self, target: &mut Document, page_id: ObjectId) -> Result<ObjectId> {
        let page = self
            .source
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(|err| PhotobookError::PdfError(format!("cover page {page_id:?}: {err}")))?;

        let mut flattened = page.clone();
        for key in INHERITABLE {
            if !flattened.has(key) {
                if let Some(value) = inherited(self.source, page_id, key) {
                    flattened.set(key.to_vec(), value);
                }
            }
        }

        // A page reached earlier through a reference (a link /Dest) keeps
        // the id it was given; otherwise reserve one before recursing.
        let new_id = match self.mapped.get(&page_id) {
            Some(&reserved) => reserved,
            None => {
                let id = target.new_object_id();
                self.mapped.insert(page_id, id);
                id
            }
        };
        let copied = self.copy_dict(target, &flattened);
        target.objects.insert(new_id, Object::Dictionary(copied));
        Ok(new_id)
    }

    fn copy_reference(&mut self, target: &mut Document, id: ObjectId) -> ObjectId {
        if let Some(&mapped) = self.mapped.get(&id) {
            return mapped;
        }
        let new_id = target.new_object_id();
        self.mapped.insert(id, new_id);

        let copied = match self.source.get_object(id) {
            Ok(object) => self.copy_object(target, object),
            Err(err) => {
                warn!(?id, %err, "unresolvable reference copied as null");
                Object::Null
            }
        };
        target.objects.insert(new_id, copied);
        new_id
    }

    fn copy_dict(&mut self, target: &mut Document, dict: &Dictionary) -> Dictionary {
        let mut copied = Dictionary::new();
        for (key, value) in dict.iter() {
            // Parents point back into the source page tree.
            if key == b"Parent" {
                continue;
            }
            copied.set(key.clone(), self.copy_object(target, value));
        }
        copied
    }

    fn copy_object(&mut self, target: &mut Document, object: &Object) -> Object {
        match object {
            Object::Reference(id) => Object::Reference(self.copy_reference(target, *id)),
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dict(target, dict)),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.copy_object(target, item))
                    .collect(),
            ),
            Object::Stream(stream) => {
                let mut copied = stream.clone();
                copied.dict = self.copy_dict(target, &stream.dict);
                Object::Stream(copied)
            }
            other => other.clone(),
        }
    }
}

// -- Helpers ----------------------------------------------------------------------

/// Look up `key` on a page, walking up /Parent links if the page lacks it.
fn inherited(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_object(page_id).and_then(Object::as_dict).ok()?;
    // Page trees are shallow; the bound only guards against malformed cycles.
    for _ in 0..64 {
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
        let parent = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_object(parent).and_then(Object::as_dict).ok()?;
    }
    None
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        other => other,
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use lopdf::{Stream, dictionary};

    use super::*;

    /// Two-page document whose pages inherit MediaBox from the tree root and
    /// share one font object.
    fn sample(width: i64, height: i64, label: &str) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources = dictionary! { "Font" => dictionary! { "F1" => font_id } };

        let mut kids = Vec::new();
        for n in 0..2 {
            let content = format!("BT /F1 12 Tf 10 10 Td ({label}{n}) Tj ET");
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources.clone(),
            });
            kids.push(Object::Reference(page_id));
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => Object::Integer(2),
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(width),
                    Object::Integer(height),
                ],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    fn to_bytes(mut doc: Document) -> Vec<u8> {
        let mut out = Vec::new();
        doc.save_to(&mut out).expect("save");
        out
    }

    #[test]
    fn reads_inherited_page_size() {
        let reader = PdfReader::from_bytes(&to_bytes(sample(300, 200, "a"))).expect("load");
        assert_eq!(reader.page_count(), 2);
        assert_eq!(reader.page_size(1), Some((300.0, 200.0)));
        assert_eq!(reader.page_size(3), None);
        assert_eq!(reader.source_path(), None);
    }

    #[test]
    fn garbage_is_a_pdf_error() {
        assert!(matches!(
            PdfReader::from_bytes(b"hello"),
            Err(PhotobookError::PdfError(_))
        ));
    }

    #[test]
    fn prepends_pages_in_order_with_flattened_attributes() {
        let mut target = sample(595, 842, "content");
        let cover = sample(1200, 600, "cover");
        let cover_pages: Vec<ObjectId> = cover.get_pages().into_values().collect();

        let copied = prepend_pages(&mut target, &cover, &cover_pages).expect("prepend");
        assert_eq!(copied, 2);

        let reader = PdfReader::from_bytes(&to_bytes(target)).expect("reload");
        assert_eq!(reader.page_count(), 4);
        assert_eq!(reader.page_size(1), Some((1200.0, 600.0)));
        assert_eq!(reader.page_size(2), Some((1200.0, 600.0)));
        assert_eq!(reader.page_size(3), Some((595.0, 842.0)));

        let first = reader.document().get_pages()[&1];
        let content = reader.document().get_page_content(first).expect("content");
        let content = String::from_utf8_lossy(&content);
        assert!(content.contains("(cover0)"), "got {content:?}");
    }

    #[test]
    fn opens_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("album.pdf");
        std::fs::write(&path, to_bytes(sample(400, 300, "disk"))).expect("write");

        let reader = PdfReader::open(&path).expect("open");
        assert_eq!(reader.page_count(), 2);
        assert_eq!(reader.page_size(2), Some((400.0, 300.0)));
        assert_eq!(reader.source_path(), Some(path.display().to_string().as_str()));

        assert!(matches!(
            PdfReader::open(dir.path().join("missing.pdf")),
            Err(PhotobookError::Io(_))
        ));
    }

    #[test]
    fn links_to_later_cover_pages_point_into_the_page_tree() {
        let mut cover = sample(500, 500, "cover");
        let pages = cover.get_pages();
        let (first, second) = (pages[&1], pages[&2]);
        let link = cover.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(50),
                Object::Integer(50),
            ],
            "Dest" => vec![Object::Reference(second), Object::Name(b"Fit".to_vec())],
        });
        if let Ok(Object::Dictionary(page)) = cover.get_object_mut(first) {
            page.set("Annots", vec![Object::Reference(link)]);
        }

        let mut target = sample(595, 842, "content");
        prepend_pages(&mut target, &cover, &[first, second]).expect("prepend");

        let pages = target.get_pages();
        assert_eq!(pages.len(), 4);
        let copied_link = target
            .get_dictionary(pages[&1])
            .and_then(|page| page.get(b"Annots"))
            .and_then(Object::as_array)
            .and_then(|annots| annots[0].as_reference())
            .and_then(|id| target.get_dictionary(id))
            .expect("copied link");
        let dest = copied_link
            .get(b"Dest")
            .and_then(Object::as_array)
            .and_then(|dest| dest[0].as_reference())
            .expect("dest");
        assert_eq!(dest, pages[&2]);

        let page_objects = target
            .objects
            .values()
            .filter(|object| {
                object
                    .as_dict()
                    .and_then(|dict| dict.get(b"Type"))
                    .and_then(Object::as_name)
                    .is_ok_and(|name| name == b"Page")
            })
            .count();
        assert_eq!(page_objects, 4);
    }

    #[test]
    fn shared_objects_are_copied_once() {
        let mut target = sample(595, 842, "content");
        let before = target.objects.len();
        let cover = sample(100, 100, "cover");
        let cover_pages: Vec<ObjectId> = cover.get_pages().into_values().collect();

        prepend_pages(&mut target, &cover, &cover_pages).expect("prepend");
        // Two pages, two content streams, one shared font.
        assert_eq!(target.objects.len(), before + 5);
    }
}
