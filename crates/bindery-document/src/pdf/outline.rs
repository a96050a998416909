// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Outline (bookmark tree) writing.

use bindery_core::Bookmark;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;

use super::objects::encode_text;

/// Write `bookmarks` as the document outline and hook it into the catalog.
///
/// `pages[i]` is the object id of output page `i + 1`. Bookmarks pointing
/// outside the document are dropped with their children. Returns the id of
/// the /Outlines dictionary, or `None` when nothing was written.
pub(crate) fn write_outline(
    doc: &mut Document,
    bookmarks: &[Bookmark],
    pages: &[ObjectId],
) -> Option<ObjectId> {
    if !bookmarks.iter().any(|bookmark| target_page(bookmark, pages).is_some()) {
        return None;
    }
    let outlines_id = doc.new_object_id();
    let (first, last, count) = write_level(doc, bookmarks, pages, outlines_id)?;

    let mut outlines = Dictionary::new();
    outlines.set("Type", Object::Name(b"Outlines".to_vec()));
    outlines.set("First", Object::Reference(first));
    outlines.set("Last", Object::Reference(last));
    outlines.set("Count", Object::Integer(count));
    doc.objects.insert(outlines_id, Object::Dictionary(outlines));

    let catalog = doc.catalog_mut().ok()?;
    catalog.set("Outlines", Object::Reference(outlines_id));
    // Show the outline panel when the document opens.
    catalog.set("PageMode", Object::Name(b"UseOutlines".to_vec()));

    debug!(items = count, "Outline written");
    Some(outlines_id)
}

fn target_page(bookmark: &Bookmark, pages: &[ObjectId]) -> Option<ObjectId> {
    let index = usize::try_from(bookmark.page.checked_sub(1)?).ok()?;
    pages.get(index).copied()
}

/// Write one sibling list under `parent`; returns `(first, last, visible
/// descendants)`.
fn write_level(
    doc: &mut Document,
    bookmarks: &[Bookmark],
    pages: &[ObjectId],
    parent: ObjectId,
) -> Option<(ObjectId, ObjectId, i64)> {
    let placed: Vec<(&Bookmark, ObjectId)> = bookmarks
        .iter()
        .filter_map(|bookmark| target_page(bookmark, pages).map(|page| (bookmark, page)))
        .collect();
    if placed.is_empty() {
        return None;
    }

    let ids: Vec<ObjectId> = placed.iter().map(|_| doc.new_object_id()).collect();
    let mut visible = 0i64;

    for (index, ((bookmark, page_id), item_id)) in placed.iter().zip(&ids).enumerate() {
        let mut item = Dictionary::new();
        item.set("Title", encode_text(&bookmark.title));
        item.set("Parent", Object::Reference(parent));
        item.set(
            "Dest",
            Object::Array(vec![
                Object::Reference(*page_id),
                Object::Name(b"XYZ".to_vec()),
                Object::Null,
                Object::Null,
                Object::Null,
            ]),
        );
        if index > 0 {
            item.set("Prev", Object::Reference(ids[index - 1]));
        }
        if let Some(next) = ids.get(index + 1) {
            item.set("Next", Object::Reference(*next));
        }

        visible += 1;
        if let Some((first, last, count)) = write_level(doc, &bookmark.children, pages, *item_id) {
            item.set("First", Object::Reference(first));
            item.set("Last", Object::Reference(last));
            // Open entries count their visible descendants.
            item.set("Count", Object::Integer(count));
            visible += count;
        }
        doc.objects.insert(*item_id, Object::Dictionary(item));
    }

    Some((ids[0], ids[ids.len() - 1], visible))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::source::SourceDocument;

    #[test]
    fn written_outline_reads_back() {
        let mut doc = Document::load_mem(&fixtures::pdf_with_pages(5)).unwrap();
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        let mut part = Bookmark::new("Part One", 2);
        part.children.push(Bookmark::new("Section", 3));
        let bookmarks = vec![Bookmark::new("Cover", 1), part, Bookmark::new("Ghost", 9)];

        assert!(write_outline(&mut doc, &bookmarks, &pages).is_some());
        let bytes = fixtures::save(&mut doc);

        let source = SourceDocument::open(&bytes).unwrap();
        assert_eq!(source.bookmarks(), &bookmarks[..2]);
    }

    #[test]
    fn nothing_written_without_targets() {
        let mut doc = Document::load_mem(&fixtures::pdf_with_pages(1)).unwrap();
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        let max_id = doc.max_id;
        assert!(write_outline(&mut doc, &[Bookmark::new("Far", 4)], &pages).is_none());
        assert!(doc.catalog().unwrap().get(b"Outlines").is_err());
        assert_eq!(doc.max_id, max_id);
    }
}
