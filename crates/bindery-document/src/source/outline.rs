// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Outline (bookmark tree) reading.

use std::collections::{HashMap, HashSet};

use bindery_core::Bookmark;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;

use crate::pdf::objects::{dictionary, name_of, resolve, text_of};

/// Maximum nesting followed in outlines and name trees.
const MAX_NESTING: usize = 32;

/// Read the document outline as a tree of bookmarks with 1-based page numbers.
///
/// Entries whose destination cannot be resolved to a page of this document are
/// skipped together with their children.
pub(crate) fn read_outline(doc: &Document, page_numbers: &HashMap<ObjectId, u32>) -> Vec<Bookmark> {
    let Ok(catalog) = doc.catalog() else {
        return Vec::new();
    };
    let Some(outlines) = catalog
        .get(b"Outlines")
        .ok()
        .and_then(|object| dictionary(doc, object))
    else {
        return Vec::new();
    };

    let mut reader = OutlineReader {
        doc,
        catalog,
        page_numbers,
        visited: HashSet::new(),
    };
    reader.siblings(outlines.get(b"First").ok(), 0)
}

struct OutlineReader<'a> {
    doc: &'a Document,
    catalog: &'a Dictionary,
    page_numbers: &'a HashMap<ObjectId, u32>,
    visited: HashSet<ObjectId>,
}

impl<'a> OutlineReader<'a> {
    fn siblings(&mut self, first: Option<&Object>, depth: usize) -> Vec<Bookmark> {
        let mut bookmarks = Vec::new();
        if depth >= MAX_NESTING {
            return bookmarks;
        }

        let mut cursor = first.and_then(|object| object.as_reference().ok());
        while let Some(item_id) = cursor {
            // Malformed outlines can loop through Next or First.
            if !self.visited.insert(item_id) {
                break;
            }
            let Ok(item) = self.doc.get_dictionary(item_id) else {
                break;
            };

            let title = item
                .get(b"Title")
                .ok()
                .and_then(|title| text_of(self.doc, title))
                .unwrap_or_default();

            match self.item_page(item) {
                Some(page) => {
                    let children = self.siblings(item.get(b"First").ok(), depth + 1);
                    bookmarks.push(Bookmark {
                        title,
                        page,
                        children,
                    });
                }
                None => debug!(%title, "Outline entry has no resolvable destination"),
            }

            cursor = item
                .get(b"Next")
                .ok()
                .and_then(|next| next.as_reference().ok());
        }
        bookmarks
    }

    fn item_page(&self, item: &Dictionary) -> Option<u32> {
        if let Ok(dest) = item.get(b"Dest") {
            return self.destination_page(dest, 0);
        }
        let action = dictionary(self.doc, item.get(b"A").ok()?)?;
        if action.get(b"S").ok().and_then(name_of) != Some(b"GoTo".as_slice()) {
            return None;
        }
        self.destination_page(action.get(b"D").ok()?, 0)
    }

    /// Resolve an explicit (`[page /XYZ ...]`) or named destination.
    fn destination_page(&self, dest: &Object, depth: usize) -> Option<u32> {
        if depth >= MAX_NESTING {
            return None;
        }
        match resolve(self.doc, dest) {
            Object::Array(parts) => match parts.first()? {
                Object::Reference(page_id) => self.page_numbers.get(page_id).copied(),
                // Some producers write a 0-based page index instead of a reference.
                Object::Integer(index) => u32::try_from(*index)
                    .ok()
                    .filter(|index| (*index as usize) < self.page_numbers.len())
                    .map(|index| index + 1),
                _ => None,
            },
            Object::Dictionary(dict) => self.destination_page(dict.get(b"D").ok()?, depth + 1),
            Object::Name(name) | Object::String(name, _) => {
                let target = self.named_destination(name)?;
                self.destination_page(target, depth + 1)
            }
            _ => None,
        }
    }

    /// Look a name up in the catalog's /Dests dictionary or /Names name tree.
    fn named_destination(&self, name: &[u8]) -> Option<&'a Object> {
        if let Some(dests) = self
            .catalog
            .get(b"Dests")
            .ok()
            .and_then(|object| dictionary(self.doc, object))
            && let Ok(target) = dests.get(name)
        {
            return Some(target);
        }

        let names = dictionary(self.doc, self.catalog.get(b"Names").ok()?)?;
        let tree = dictionary(self.doc, names.get(b"Dests").ok()?)?;
        self.search_name_tree(tree, name, 0)
    }

    fn search_name_tree(&self, node: &'a Dictionary, name: &[u8], depth: usize) -> Option<&'a Object> {
        if depth >= MAX_NESTING {
            return None;
        }
        if let Ok(Object::Array(pairs)) = node.get(b"Names").map(|names| resolve(self.doc, names)) {
            for pair in pairs.chunks_exact(2) {
                if let Object::String(key, _) = resolve(self.doc, &pair[0])
                    && key.as_slice() == name
                {
                    return Some(&pair[1]);
                }
            }
        }
        if let Ok(Object::Array(kids)) = node.get(b"Kids").map(|kids| resolve(self.doc, kids)) {
            for kid in kids {
                if let Some(kid) = dictionary(self.doc, kid)
                    && let Some(found) = self.search_name_tree(kid, name, depth + 1)
                {
                    return Some(found);
                }
            }
        }
        None
    }
}
