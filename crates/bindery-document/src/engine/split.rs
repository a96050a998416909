// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Split: cut one document into ordered outputs along planned page ranges.

use bindery_core::{CancelToken, EngineConfig, PageRange, Result, SplitSpec, SplitStrategy};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::pdf::DocumentBuilder;
use crate::plan;
use crate::source::SourceDocument;

/// One document produced by a split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitOutput {
    /// `{base_name}_{label}.pdf`.
    pub name: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub page_count: u32,
    /// Source pages this output holds.
    pub range: PageRange,
}

#[instrument(skip_all, fields(bytes_len = data.len(), strategy = ?spec.strategy))]
pub(crate) fn split(
    config: &EngineConfig,
    data: &[u8],
    spec: &SplitSpec,
    cancel: &CancelToken,
) -> Result<Vec<SplitOutput>> {
    spec.validate()?;
    let source = SourceDocument::open(data)?;
    let total = source.page_count();

    let (ranges, size_limit) = match &spec.strategy {
        SplitStrategy::ByPageCount { pages_per_file } => (plan::by_page_count(total, *pages_per_file)?, None),
        SplitStrategy::ByMaxSize { max_bytes } => {
            let footprints = (1..=total)
                .map(|page| source.page_footprint(page))
                .collect::<Result<Vec<_>>>()?;
            (plan::by_max_size(&footprints, *max_bytes)?, Some(*max_bytes))
        }
        SplitStrategy::ByBookmark => (plan::by_bookmark(total, source.bookmarks())?, None),
        SplitStrategy::Custom { ranges } => (plan::custom(total, ranges)?, None),
    };
    debug!(ranges = ranges.len(), "Split planned");

    let build = |range: &PageRange| build_part(config, &source, range.clone(), spec, size_limit, cancel);
    let parts: Vec<Vec<SplitOutput>> = if config.parallel {
        ranges.par_iter().map(build).collect::<Result<_>>()?
    } else {
        ranges.iter().map(build).collect::<Result<_>>()?
    };
    let outputs: Vec<SplitOutput> = parts.into_iter().flatten().collect();

    info!(outputs = outputs.len(), source_pages = total, "Split complete");
    Ok(outputs)
}

/// Build the output for `range`. Under a size limit, an output that comes
/// out too large is bisected until every part fits or is a single page.
fn build_part(
    config: &EngineConfig,
    source: &SourceDocument,
    range: PageRange,
    spec: &SplitSpec,
    size_limit: Option<u64>,
    cancel: &CancelToken,
) -> Result<Vec<SplitOutput>> {
    cancel.check()?;
    let bytes = build_range(config, source, &range, spec)?;

    if let Some(limit) = size_limit
        && bytes.len() as u64 > limit
    {
        if range.len() > 1 {
            let middle = range.start + range.len() / 2 - 1;
            debug!(
                start = range.start,
                end = range.end,
                bytes = bytes.len(),
                limit,
                "Output over size limit, bisecting"
            );
            let mut parts = build_part(
                config,
                source,
                PageRange::new(range.start, middle),
                spec,
                size_limit,
                cancel,
            )?;
            parts.extend(build_part(
                config,
                source,
                PageRange::new(middle + 1, range.end),
                spec,
                size_limit,
                cancel,
            )?);
            return Ok(parts);
        }
        warn!(page = range.start, bytes = bytes.len(), limit, "Single page exceeds the size limit");
    }

    Ok(vec![SplitOutput {
        name: format!("{}_{}.pdf", spec.base_name, sanitise_label(&range.label)),
        bytes,
        page_count: range.len(),
        range,
    }])
}

fn build_range(
    config: &EngineConfig,
    source: &SourceDocument,
    range: &PageRange,
    spec: &SplitSpec,
) -> Result<Vec<u8>> {
    let mut builder = DocumentBuilder::new(config);
    let copied = builder.copy_pages(source, range.pages(), false)?;
    if spec.preserve_bookmarks {
        for bookmark in copied.remap(source.bookmarks()) {
            builder.add_bookmark(bookmark);
        }
    }
    if spec.preserve_metadata {
        builder.fill_metadata(source.metadata());
    }
    builder.finish(false)
}

/// Characters outside `[A-Za-z0-9._-]` become `_`.
fn sanitise_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "part".into()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_sanitised() {
        assert_eq!(sanitise_label("Chapter 1: Intro/Part"), "Chapter_1__Intro_Part");
        assert_eq!(sanitise_label("pages-1-3"), "pages-1-3");
        assert_eq!(sanitise_label(""), "part");
    }
}
