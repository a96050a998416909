// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Merge: concatenate two or more documents into one, with optional title
// page, per-source bookmarks, page numbers and watermark.

use bindery_core::{BinderyError, Bookmark, CancelToken, EngineConfig, MergeSource, MergeSpec, Result};
use tracing::{info, instrument};

use crate::pdf::DocumentBuilder;
use crate::source::SourceDocument;

#[instrument(skip_all, fields(sources = sources.len()))]
pub(crate) fn merge(
    config: &EngineConfig,
    sources: &[MergeSource],
    spec: &MergeSpec,
    cancel: &CancelToken,
) -> Result<Vec<u8>> {
    spec.validate(sources.len())?;

    // Every source is decoded before anything is built: one bad input fails
    // the whole merge.
    let mut decoded = Vec::with_capacity(sources.len());
    for (index, source) in sources.iter().enumerate() {
        cancel.check()?;
        let document = SourceDocument::open_named(&source.bytes, source.name.clone()).map_err(|err| match err {
            BinderyError::Decode(detail) => BinderyError::Decode(format!("source {}: {detail}", index + 1)),
            other => other,
        })?;
        decoded.push(document);
    }

    let mut builder = DocumentBuilder::new(config);
    if let Some(title_page) = &spec.title_page {
        let (width, height) = decoded[0]
            .page_dimensions(1)
            .map(|dims| {
                if dims.rotation % 180 == 90 {
                    (dims.height, dims.width)
                } else {
                    (dims.width, dims.height)
                }
            })
            .unwrap_or_else(|_| config.default_page_size.dimensions_pt());
        builder.insert_title_page(title_page, width, height)?;
    }

    for (index, source) in decoded.iter().enumerate() {
        cancel.check()?;
        let copied = builder.copy_pages(source, 1..=source.page_count(), spec.remove_blank_pages)?;

        if spec.add_bookmarks
            && let Some(first_page) = copied.first_page
        {
            let title = source
                .name()
                .filter(|name| !name.trim().is_empty())
                .map(str::to_owned)
                .unwrap_or_else(|| format!("Document {}", index + 1));
            let mut bookmark = Bookmark::new(title, first_page);
            if spec.preserve_source_bookmarks {
                bookmark.children = copied.remap(source.bookmarks());
            }
            builder.add_bookmark(bookmark);
        }
    }
    builder.fill_metadata(decoded[0].metadata());

    cancel.check()?;
    if let Some(numbering) = &spec.page_numbers {
        builder.stamp_page_numbers(numbering)?;
    }
    if let Some(watermark) = &spec.watermark {
        builder.stamp_watermark(watermark)?;
    }

    let output = builder.finish(spec.optimize_for_print)?;
    info!(
        sources = sources.len(),
        pages = builder.page_count(),
        output_bytes = output.len(),
        "Merge complete"
    );
    Ok(output)
}
