// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Deep page copying between lopdf documents.

use std::collections::HashMap;

use bindery_core::{BinderyError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, warn};

use super::objects::{INHERITABLE_KEYS, inherited};
use crate::source::is_page;

/// Copies pages of one source document into a target.
///
/// Every object reachable from the copied pages is cloned exactly once per
/// copier, so fonts and images shared between pages stay shared in the
/// target. References to pages that are not part of the copy become null.
pub(crate) struct PageCopier<'a> {
    source: &'a Document,
    /// Source object id -> target object id.
    memo: HashMap<ObjectId, ObjectId>,
}

impl<'a> PageCopier<'a> {
    /// Reserve target ids for `pages` so cross-page references (annotation
    /// links, /P entries) resolve inside the copy.
    pub(crate) fn new(source: &'a Document, target: &mut Document, pages: &[ObjectId]) -> Self {
        let memo = pages
            .iter()
            .map(|page_id| (*page_id, target.new_object_id()))
            .collect();
        Self { source, memo }
    }

    /// Target id reserved for a source page.
    pub(crate) fn target_of(&self, page_id: ObjectId) -> Option<ObjectId> {
        self.memo.get(&page_id).copied()
    }

    /// Copy one page under the target /Pages node `parent`, returning its
    /// new id. The page must have been passed to [`PageCopier::new`].
    pub(crate) fn copy_page(
        &mut self,
        target: &mut Document,
        page_id: ObjectId,
        parent: ObjectId,
    ) -> Result<ObjectId> {
        let new_id = self.target_of(page_id).ok_or_else(|| {
            BinderyError::Encode(format!("page {page_id:?} was not reserved for copying"))
        })?;
        let source = self.source;
        let page = source.get_dictionary(page_id).map_err(|err| {
            BinderyError::Decode(format!("cannot read page object {page_id:?}: {err}"))
        })?;

        let mut copy = self.clone_dictionary(target, page);
        for key in INHERITABLE_KEYS {
            if copy.has(key) {
                continue;
            }
            if let Some(value) = inherited(source, page_id, key) {
                let value = self.clone_object(target, value);
                copy.set(key.to_vec(), value);
            }
        }
        copy.set("Parent", Object::Reference(parent));

        target.objects.insert(new_id, Object::Dictionary(copy));
        debug!(?page_id, ?new_id, "Page copied");
        Ok(new_id)
    }

    fn clone_dictionary(&mut self, target: &mut Document, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            // The caller re-parents copied pages; other /Parent links would
            // drag in the source page tree.
            if key.as_slice() == b"Parent" {
                continue;
            }
            copy.set(key.clone(), self.clone_object(target, value));
        }
        copy
    }

    fn clone_object(&mut self, target: &mut Document, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self.clone_reference(target, *id),
            Object::Dictionary(dict) => Object::Dictionary(self.clone_dictionary(target, dict)),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.clone_object(target, item))
                    .collect(),
            ),
            Object::Stream(stream) => {
                let dict = self.clone_dictionary(target, &stream.dict);
                let mut copy = Stream::new(dict, stream.content.clone());
                copy.allows_compression = stream.allows_compression;
                Object::Stream(copy)
            }
            other => other.clone(),
        }
    }

    fn clone_reference(&mut self, target: &mut Document, id: ObjectId) -> Object {
        if let Some(mapped) = self.memo.get(&id) {
            return Object::Reference(*mapped);
        }
        if is_page(self.source, id) {
            // Link to a page outside the copied set.
            return Object::Null;
        }
        let source = self.source;
        let Ok(referenced) = source.get_object(id) else {
            warn!(?id, "Cannot resolve reference, using Null");
            return Object::Null;
        };

        // Register before recursing so cycles terminate.
        let new_id = target.new_object_id();
        self.memo.insert(id, new_id);
        let copy = self.clone_object(target, referenced);
        target.objects.insert(new_id, copy);
        Object::Reference(new_id)
    }
}
