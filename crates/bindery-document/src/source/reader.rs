// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page source adapter. Decodes a document buffer once with `lopdf` and
// exposes its pages, dimensions, metadata, and bookmarks read-only.

use std::collections::HashMap;

use bindery_core::{BinderyError, Bookmark, DocumentMetadata, Result};
use lopdf::{Document, ObjectId};
use tracing::{debug, instrument};

use super::{content, outline};
use crate::pdf::objects::{dictionary, media_box, resolve, text_of};

/// Letter, for pages without a readable MediaBox.
const FALLBACK_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Size of one page in points, with its /Rotate value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDimensions {
    pub width: f32,
    pub height: f32,
    /// Clockwise rotation in degrees, normalised to 0/90/180/270.
    pub rotation: i64,
}

/// Immutable view over a decoded document.
///
/// Owned by whoever opened it; the engine only ever reads from it.
pub struct SourceDocument {
    /// The underlying lopdf document.
    document: Document,
    /// Page object ids in page order.
    page_ids: Vec<ObjectId>,
    /// Declared name, if the caller supplied one.
    name: Option<String>,
    metadata: DocumentMetadata,
    bookmarks: Vec<Bookmark>,
}

impl SourceDocument {
    // -- Construction ---------------------------------------------------------

    /// Decode a document from raw bytes.
    pub fn open(data: &[u8]) -> Result<Self> {
        Self::open_named(data, None)
    }

    /// Decode a document and remember its declared name.
    #[instrument(skip(data), fields(bytes_len = data.len()))]
    pub fn open_named(data: &[u8], name: Option<String>) -> Result<Self> {
        let document = Document::load_mem(data)
            .map_err(|err| BinderyError::Decode(format!("failed to parse document: {err}")))?;

        if document.trailer.get(b"Encrypt").is_ok() {
            return Err(BinderyError::Decode(
                "document is encrypted; encrypted input is not supported".into(),
            ));
        }

        let page_ids: Vec<ObjectId> = document.get_pages().into_values().collect();
        if page_ids.is_empty() {
            return Err(BinderyError::Decode("document has no pages".into()));
        }

        let page_numbers: HashMap<ObjectId, u32> = page_ids
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index as u32 + 1))
            .collect();
        let bookmarks = outline::read_outline(&document, &page_numbers);
        let metadata = read_metadata(&document);

        debug!(
            pages = page_ids.len(),
            bookmarks = bookmarks.len(),
            "Document decoded"
        );

        Ok(Self {
            document,
            page_ids,
            name,
            metadata,
            bookmarks,
        })
    }

    // -- Inspection -----------------------------------------------------------

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn page_count(&self) -> u32 {
        self.page_ids.len() as u32
    }

    /// Dimensions of page `page` (1-based).
    pub fn page_dimensions(&self, page: u32) -> Result<PageDimensions> {
        let page_id = self.page_id(page)?;
        let (width, height) = media_box(&self.document, page_id)
            .map(|[x0, y0, x1, y1]| ((x1 - x0).abs(), (y1 - y0).abs()))
            .unwrap_or(FALLBACK_PAGE_SIZE);
        let rotation = crate::pdf::objects::inherited(&self.document, page_id, b"Rotate")
            .and_then(|rotate| resolve(&self.document, rotate).as_i64().ok())
            .unwrap_or(0)
            .rem_euclid(360);
        Ok(PageDimensions {
            width,
            height,
            rotation: rotation - rotation % 90,
        })
    }

    /// Top-level bookmarks, with nested children.
    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    /// Object id of page `page` (1-based).
    pub fn page_id(&self, page: u32) -> Result<ObjectId> {
        page.checked_sub(1)
            .and_then(|index| self.page_ids.get(index as usize))
            .copied()
            .ok_or_else(|| BinderyError::Range {
                start: page,
                end: page,
                reason: format!("document has {} pages", self.page_ids.len()),
            })
    }

    /// Whether page `page` has no drawable content. See [`content::is_blank_page`].
    pub fn is_blank(&self, page: u32) -> bool {
        self.page_id(page)
            .map(|id| content::is_blank_page(&self.document, id))
            .unwrap_or(false)
    }

    /// Objects the page would carry into a new document, with estimated
    /// serialised sizes.
    pub fn page_footprint(&self, page: u32) -> Result<Vec<(ObjectId, usize)>> {
        Ok(content::page_footprint(&self.document, self.page_id(page)?))
    }

    pub(crate) fn document(&self) -> &Document {
        &self.document
    }

    /// Hand the decoded document over for in-place rewriting.
    pub(crate) fn into_document(self) -> Document {
        self.document
    }
}

fn read_metadata(document: &Document) -> DocumentMetadata {
    let Some(info) = document
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|info| dictionary(document, info))
    else {
        return DocumentMetadata::default();
    };
    let field = |key: &[u8]| {
        info.get(key)
            .ok()
            .and_then(|value| text_of(document, value))
            .filter(|text| !text.trim().is_empty())
    };
    DocumentMetadata {
        title: field(b"Title"),
        author: field(b"Author"),
        subject: field(b"Subject"),
        keywords: field(b"Keywords"),
        creator: field(b"Creator"),
        producer: field(b"Producer"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, FixturePage};

    #[test]
    fn opens_pages_and_dimensions() {
        let bytes = fixtures::pdf_with_pages(3);
        let source = SourceDocument::open(&bytes).unwrap();
        assert_eq!(source.page_count(), 3);
        let dims = source.page_dimensions(1).unwrap();
        assert_eq!((dims.width, dims.height, dims.rotation), (612.0, 792.0, 0));
        assert!(source.page_dimensions(4).is_err());
        assert!(source.page_dimensions(0).is_err());
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = SourceDocument::open(b"definitely not a pdf").err().unwrap();
        assert!(matches!(err, BinderyError::Decode(_)));
    }

    #[test]
    fn reads_info_dictionary() {
        let bytes = fixtures::pdf_with_metadata(1, "Annual Report", "Jane Doe");
        let source = SourceDocument::open(&bytes).unwrap();
        assert_eq!(source.metadata().title.as_deref(), Some("Annual Report"));
        assert_eq!(source.metadata().author.as_deref(), Some("Jane Doe"));
        assert_eq!(source.metadata().subject, None);
    }

    #[test]
    fn reads_nested_outline() {
        let bytes = fixtures::pdf_with_bookmarks(
            6,
            &[
                ("Intro", 1, vec![]),
                ("Body", 3, vec![("Detail", 4)]),
                ("End", 6, vec![]),
            ],
        );
        let source = SourceDocument::open(&bytes).unwrap();
        let bookmarks = source.bookmarks();
        assert_eq!(bookmarks.len(), 3);
        assert_eq!(bookmarks[1].title, "Body");
        assert_eq!(bookmarks[1].page, 3);
        assert_eq!(bookmarks[1].children, vec![Bookmark::new("Detail", 4)]);
        assert_eq!(bookmarks[2].page, 6);
    }

    #[test]
    fn blank_pages_have_no_painting_operators() {
        let bytes = fixtures::pdf_from_pages(&[
            FixturePage::Text("hello"),
            FixturePage::Blank,
            FixturePage::Raw("q 1 0 0 1 0 0 cm Q"),
            FixturePage::Raw("0 0 10 10 re f"),
        ]);
        let source = SourceDocument::open(&bytes).unwrap();
        assert!(!source.is_blank(1));
        assert!(source.is_blank(2));
        // State changes only: still blank.
        assert!(source.is_blank(3));
        assert!(!source.is_blank(4));
    }

    #[test]
    fn footprint_includes_content_stream() {
        let bytes = fixtures::pdf_with_pages(2);
        let source = SourceDocument::open(&bytes).unwrap();
        let footprint = source.page_footprint(1).unwrap();
        // Page dictionary, its content stream, and the shared font.
        assert!(footprint.len() >= 3);
        let page_two = source.page_footprint(2).unwrap();
        assert!(page_two.iter().all(|(id, _)| *id != source.page_id(1).unwrap()));
    }
}
