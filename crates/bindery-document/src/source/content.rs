// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page content inspection: blank-page heuristic and serialised-size
// footprint used by the size-based split planner.

use std::collections::HashSet;

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::pdf::objects::name_of;

/// Operators that put marks on the page.
const PAINTING_OPERATORS: [&str; 16] = [
    "Tj", "TJ", "'", "\"", "S", "s", "f", "F", "f*", "B", "B*", "b", "b*", "Do", "sh", "BI",
];

/// Fixed cost of one indirect object (`n 0 obj ... endobj` plus its xref row).
pub(crate) const OBJECT_OVERHEAD: usize = 40;

/// Rough serialised cost of one dictionary entry.
const ENTRY_OVERHEAD: usize = 16;

/// A page is blank when its content streams contain no painting operator and
/// it carries no annotations. Content that fails to decode counts as
/// non-blank so that nothing is dropped on a guess.
pub(crate) fn is_blank_page(doc: &Document, page_id: ObjectId) -> bool {
    let has_annotations = doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"Annots").ok())
        .map(|annots| match crate::pdf::objects::resolve(doc, annots) {
            Object::Array(items) => !items.is_empty(),
            _ => false,
        })
        .unwrap_or(false);
    if has_annotations {
        return false;
    }

    let Ok(bytes) = doc.get_page_content(page_id) else {
        debug!(?page_id, "Page content unreadable; treating as non-blank");
        return false;
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return true;
    }
    match Content::decode(&bytes) {
        Ok(content) => !content
            .operations
            .iter()
            .any(|op| PAINTING_OPERATORS.contains(&op.operator.as_str())),
        Err(err) => {
            debug!(?page_id, %err, "Page content undecodable; treating as non-blank");
            false
        }
    }
}

/// Objects reachable from a page with an estimate of their serialised size.
///
/// /Parent links and other pages are not followed, matching what page
/// copying actually duplicates.
pub(crate) fn page_footprint(doc: &Document, page_id: ObjectId) -> Vec<(ObjectId, usize)> {
    let mut visited = HashSet::new();
    let mut footprint = Vec::new();
    let mut pending = vec![page_id];
    visited.insert(page_id);

    while let Some(id) = pending.pop() {
        let Ok(object) = doc.get_object(id) else {
            continue;
        };
        footprint.push((id, OBJECT_OVERHEAD + direct_size(object)));
        collect_references(doc, object, &mut |child| {
            if visited.insert(child) {
                pending.push(child);
            }
        });
    }
    footprint
}

/// Serialised size of an object's direct content, excluding nested indirect
/// objects.
fn direct_size(object: &Object) -> usize {
    match object {
        Object::Stream(stream) => {
            stream.content.len() + stream.dict.len() * ENTRY_OVERHEAD + "stream\nendstream".len()
        }
        Object::Dictionary(dict) => {
            dict.len() * ENTRY_OVERHEAD + dict.iter().map(|(_, v)| direct_size(v)).sum::<usize>()
        }
        Object::Array(items) => 2 + items.iter().map(|item| direct_size(item) + 1).sum::<usize>(),
        Object::String(bytes, _) | Object::Name(bytes) => bytes.len() + 2,
        _ => 8,
    }
}

fn collect_references(doc: &Document, object: &Object, visit: &mut impl FnMut(ObjectId)) {
    match object {
        Object::Reference(id) => {
            if !is_page(doc, *id) {
                visit(*id);
            }
        }
        Object::Array(items) => {
            for item in items {
                collect_references(doc, item, visit);
            }
        }
        Object::Dictionary(dict) => {
            for (key, value) in dict.iter() {
                if key.as_slice() != b"Parent" {
                    collect_references(doc, value, visit);
                }
            }
        }
        Object::Stream(stream) => {
            for (key, value) in stream.dict.iter() {
                if key.as_slice() != b"Parent" {
                    collect_references(doc, value, visit);
                }
            }
        }
        _ => {}
    }
}

pub(crate) fn is_page(doc: &Document, id: ObjectId) -> bool {
    doc.get_dictionary(id)
        .ok()
        .and_then(|dict| dict.get(b"Type").ok())
        .and_then(name_of)
        == Some(b"Page".as_slice())
}
