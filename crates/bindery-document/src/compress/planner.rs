// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Compression planning: level presets and the structural size-reduction
// passes they enable.

use std::collections::HashMap;

use bindery_core::{CancelToken, CompressSpec, CompressionLevel, Result};
use lopdf::{Document, Object, ObjectId};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

/// Fixed knobs implied by a compression level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelPreset {
    /// Objects processed between cancellation checks. Smaller is more
    /// thorough and slower.
    pub objects_per_batch: usize,
    pub dedupe_streams: bool,
    pub strip_thumbnails: bool,
    pub image_quality: u8,
    pub max_image_dpi: u32,
}

impl LevelPreset {
    pub fn for_level(level: CompressionLevel) -> Self {
        let (objects_per_batch, dedupe_streams, strip_thumbnails, image_quality, max_image_dpi) =
            match level {
                CompressionLevel::Low => (100, false, false, 85, 300),
                CompressionLevel::Medium => (50, false, true, 75, 200),
                CompressionLevel::High => (25, true, true, 60, 150),
                CompressionLevel::Maximum => (10, true, true, 40, 96),
            };
        Self {
            objects_per_batch,
            dedupe_streams,
            strip_thumbnails,
            image_quality,
            max_image_dpi,
        }
    }
}

/// Everything one compression run will do, resolved from a [`CompressSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompressionPlan {
    pub level: CompressionLevel,
    pub preset: LevelPreset,
    pub image_quality: u8,
    /// `None` when downsampling is disabled.
    pub max_image_dpi: Option<u32>,
    pub optimize_images: bool,
    pub grayscale: bool,
    pub remove_metadata: bool,
    pub remove_annotations: bool,
    pub remove_bookmarks: bool,
}

impl CompressionPlan {
    /// Level defaults, then explicit overrides from `spec`. The additive
    /// flags only ever add work.
    pub fn for_spec(spec: &CompressSpec) -> Self {
        let preset = LevelPreset::for_level(spec.level);
        Self {
            level: spec.level,
            preset,
            image_quality: spec.image_quality.unwrap_or(preset.image_quality),
            max_image_dpi: spec
                .downsample_images
                .then(|| spec.max_image_dpi.unwrap_or(preset.max_image_dpi)),
            optimize_images: spec.optimize_images,
            grayscale: spec.grayscale,
            remove_metadata: spec.remove_metadata,
            remove_annotations: spec.remove_annotations,
            remove_bookmarks: spec.remove_bookmarks,
        }
    }

    /// Drop the document parts this plan removes.
    #[instrument(skip_all, fields(level = ?self.level))]
    pub(crate) fn strip(&self, doc: &mut Document, cancel: &CancelToken) -> Result<()> {
        if self.remove_metadata {
            doc.trailer.remove(b"Info");
            if let Ok(catalog) = doc.catalog_mut() {
                catalog.remove(b"Metadata");
            }
        }
        if self.remove_bookmarks
            && let Ok(catalog) = doc.catalog_mut()
        {
            catalog.remove(b"Outlines");
            if catalog
                .get(b"PageMode")
                .and_then(Object::as_name)
                .is_ok_and(|mode| mode == b"UseOutlines")
            {
                catalog.remove(b"PageMode");
            }
        }

        let mut page_keys: Vec<&[u8]> = Vec::new();
        if self.remove_annotations {
            page_keys.push(b"Annots");
        }
        if self.preset.strip_thumbnails {
            page_keys.push(b"Thumb");
        }
        if !page_keys.is_empty() {
            let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
            for batch in pages.chunks(self.preset.objects_per_batch) {
                cancel.check()?;
                for page_id in batch {
                    if let Ok(page) = doc.get_dictionary_mut(*page_id) {
                        for key in &page_keys {
                            page.remove(key);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Collapse byte-identical streams into one object and repoint every
    /// reference. Returns the number of streams removed.
    pub(crate) fn dedupe_streams(&self, doc: &mut Document, cancel: &CancelToken) -> Result<usize> {
        if !self.preset.dedupe_streams {
            return Ok(0);
        }

        let ids: Vec<ObjectId> = doc.objects.keys().copied().collect();
        let mut canonical: HashMap<[u8; 32], ObjectId> = HashMap::new();
        let mut replace: HashMap<ObjectId, ObjectId> = HashMap::new();
        for batch in ids.chunks(self.preset.objects_per_batch) {
            cancel.check()?;
            for id in batch {
                let Some(Object::Stream(stream)) = doc.objects.get(id) else {
                    continue;
                };
                let mut hasher = Sha256::new();
                for (key, value) in stream.dict.iter() {
                    if key.as_slice() == b"Length" {
                        continue;
                    }
                    hasher.update(key);
                    hasher.update(format!("{value:?}").as_bytes());
                }
                hasher.update(&stream.content);
                let digest: [u8; 32] = hasher.finalize().into();
                match canonical.get(&digest) {
                    Some(first) => {
                        replace.insert(*id, *first);
                    }
                    None => {
                        canonical.insert(digest, *id);
                    }
                }
            }
        }
        if replace.is_empty() {
            return Ok(0);
        }

        for id in replace.keys() {
            doc.objects.remove(id);
        }
        let mut objects: Vec<&mut Object> = doc.objects.values_mut().collect();
        for batch in objects.chunks_mut(self.preset.objects_per_batch) {
            cancel.check()?;
            for object in batch.iter_mut() {
                repoint(object, &replace);
            }
        }
        for (_, value) in doc.trailer.iter_mut() {
            repoint(value, &replace);
        }

        debug!(removed = replace.len(), "Duplicate streams merged");
        Ok(replace.len())
    }
}

fn repoint(object: &mut Object, replace: &HashMap<ObjectId, ObjectId>) {
    match object {
        Object::Reference(id) => {
            if let Some(target) = replace.get(id) {
                *id = *target;
            }
        }
        Object::Array(items) => items.iter_mut().for_each(|item| repoint(item, replace)),
        Object::Dictionary(dict) => dict.iter_mut().for_each(|(_, value)| repoint(value, replace)),
        Object::Stream(stream) => stream
            .dict
            .iter_mut()
            .for_each(|(_, value)| repoint(value, replace)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use lopdf::{Stream, dictionary};

    #[test]
    fn level_granularity_matches_table() {
        let batches: Vec<usize> = [
            CompressionLevel::Low,
            CompressionLevel::Medium,
            CompressionLevel::High,
            CompressionLevel::Maximum,
        ]
        .into_iter()
        .map(|level| LevelPreset::for_level(level).objects_per_batch)
        .collect();
        assert_eq!(batches, [100, 50, 25, 10]);
    }

    #[test]
    fn overrides_beat_level_defaults() {
        let spec = CompressSpec {
            level: CompressionLevel::High,
            image_quality: Some(90),
            ..CompressSpec::default()
        };
        let plan = CompressionPlan::for_spec(&spec);
        assert_eq!(plan.image_quality, 90);
        assert_eq!(plan.max_image_dpi, Some(150));

        let no_downsample = CompressionPlan::for_spec(&CompressSpec {
            downsample_images: false,
            max_image_dpi: Some(72),
            ..CompressSpec::default()
        });
        assert_eq!(no_downsample.max_image_dpi, None);
    }

    #[test]
    fn strip_removes_requested_parts() {
        let bytes = fixtures::pdf_with_bookmarks(2, &[("One", 1, vec![])]);
        let mut doc = Document::load_mem(&fixtures::pdf_with_metadata(1, "T", "A")).unwrap();
        let mut with_outline = Document::load_mem(&bytes).unwrap();
        let plan = CompressionPlan::for_spec(&CompressSpec {
            remove_metadata: true,
            remove_bookmarks: true,
            ..CompressSpec::default()
        });
        plan.strip(&mut doc, &CancelToken::none()).unwrap();
        plan.strip(&mut with_outline, &CancelToken::none()).unwrap();
        assert!(doc.trailer.get(b"Info").is_err());
        assert!(with_outline.catalog().unwrap().get(b"Outlines").is_err());
    }

    #[test]
    fn identical_streams_are_merged() {
        let mut doc = Document::with_version("1.5");
        let a = doc.add_object(Stream::new(dictionary! {}, b"same bytes".to_vec()));
        let b = doc.add_object(Stream::new(dictionary! {}, b"same bytes".to_vec()));
        let c = doc.add_object(Stream::new(dictionary! {}, b"other".to_vec()));
        let holder = doc.add_object(dictionary! { "A" => a, "B" => b, "C" => c });

        let plan = CompressionPlan::for_spec(&CompressSpec {
            level: CompressionLevel::Maximum,
            ..CompressSpec::default()
        });
        assert_eq!(plan.dedupe_streams(&mut doc, &CancelToken::none()).unwrap(), 1);

        let holder = doc.get_dictionary(holder).unwrap();
        let a_ref = holder.get(b"A").unwrap().as_reference().unwrap();
        let b_ref = holder.get(b"B").unwrap().as_reference().unwrap();
        assert_eq!(a_ref, b_ref);
        assert!(doc.get_object(a_ref).is_ok());
    }

    #[test]
    fn cancelled_token_stops_dedupe() {
        let mut doc = Document::with_version("1.5");
        doc.add_object(Stream::new(dictionary! {}, b"x".to_vec()));
        let token = CancelToken::none();
        token.cancel();
        let plan = CompressionPlan::for_spec(&CompressSpec {
            level: CompressionLevel::High,
            ..CompressSpec::default()
        });
        assert!(plan.dedupe_streams(&mut doc, &token).is_err());
    }
}
