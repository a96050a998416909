// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Range planner: turns a split strategy into an ordered list of page ranges.

use std::collections::HashSet;
use std::hash::Hash;

use bindery_core::{BinderyError, Bookmark, PageRange, Result};
use tracing::{debug, warn};

use crate::source::OBJECT_OVERHEAD;

/// Label of the range before the first bookmark.
pub const FRONT_MATTER_LABEL: &str = "front-matter";

/// Header, catalog, page tree, trailer and xref of an otherwise empty output.
pub const DOCUMENT_OVERHEAD: usize = 4 * OBJECT_OVERHEAD + 200;

/// Contiguous chunks of `per_file` pages; the last one may be shorter.
pub fn by_page_count(total: u32, per_file: u32) -> Result<Vec<PageRange>> {
    if per_file == 0 {
        return Err(BinderyError::invalid("pages per file must be at least 1"));
    }
    let ranges: Vec<PageRange> = (0..total.div_ceil(per_file))
        .map(|chunk| {
            let start = chunk * per_file + 1;
            PageRange::new(start, (start + per_file - 1).min(total))
        })
        .collect();
    debug!(total, per_file, ranges = ranges.len(), "Planned page-count split");
    Ok(ranges)
}

/// Greedy size-bounded chunks.
///
/// `footprints[i]` lists the objects page `i + 1` drags into an output with
/// their estimated sizes. Objects shared by several pages of one chunk are
/// counted once. A page that alone exceeds `max_bytes` still gets a chunk.
pub fn by_max_size<K>(footprints: &[Vec<(K, usize)>], max_bytes: u64) -> Result<Vec<PageRange>>
where
    K: Copy + Eq + Hash,
{
    if max_bytes == 0 {
        return Err(BinderyError::invalid("maximum output size must be positive"));
    }
    let limit = usize::try_from(max_bytes).unwrap_or(usize::MAX);

    let mut ranges = Vec::new();
    let mut seen: HashSet<K> = HashSet::new();
    let mut size = DOCUMENT_OVERHEAD;
    let mut start = 1u32;

    for (index, footprint) in footprints.iter().enumerate() {
        let page = index as u32 + 1;
        let mut added = new_bytes(footprint, &seen);
        if page > start && size + added > limit {
            ranges.push(PageRange::new(start, page - 1));
            seen.clear();
            size = DOCUMENT_OVERHEAD;
            start = page;
            added = new_bytes(footprint, &seen);
        }
        seen.extend(footprint.iter().map(|(key, _)| *key));
        size += added;
    }
    if !footprints.is_empty() {
        ranges.push(PageRange::new(start, footprints.len() as u32));
    }

    debug!(max_bytes, ranges = ranges.len(), "Planned size-bounded split");
    Ok(ranges)
}

fn new_bytes<K: Eq + Hash>(footprint: &[(K, usize)], seen: &HashSet<K>) -> usize {
    let mut local = HashSet::new();
    footprint
        .iter()
        .filter(|(key, _)| !seen.contains(key) && local.insert(key))
        .map(|(_, size)| size)
        .sum()
}

/// One range per top-level bookmark, running to the page before the next
/// bookmark's target.
///
/// Bookmarks are ordered by target page and those sharing a target collapse
/// to the first. Pages before the first target become a `front-matter` range.
pub fn by_bookmark(total: u32, bookmarks: &[Bookmark]) -> Result<Vec<PageRange>> {
    let mut targets: Vec<&Bookmark> = bookmarks
        .iter()
        .filter(|bookmark| (1..=total).contains(&bookmark.page))
        .collect();
    targets.sort_by_key(|bookmark| bookmark.page);
    targets.dedup_by_key(|bookmark| bookmark.page);

    let Some(first) = targets.first() else {
        return Err(BinderyError::invalid(
            "document has no bookmarks to split on",
        ));
    };

    let mut ranges = Vec::with_capacity(targets.len() + 1);
    if first.page > 1 {
        ranges.push(PageRange::with_label(1, first.page - 1, FRONT_MATTER_LABEL));
    }
    for (index, bookmark) in targets.iter().enumerate() {
        let end = targets
            .get(index + 1)
            .map(|next| next.page - 1)
            .unwrap_or(total);
        let label = if bookmark.title.trim().is_empty() {
            PageRange::default_label(bookmark.page, end)
        } else {
            bookmark.title.clone()
        };
        ranges.push(PageRange::with_label(bookmark.page, end, label));
    }

    debug!(total, ranges = ranges.len(), "Planned bookmark split");
    Ok(ranges)
}

/// Caller-supplied ranges, clamped to the document.
///
/// Ranges may overlap and come in any order; they are emitted as given. A zero
/// start becomes 1 and an end past the document becomes the last page. Ranges
/// that start past the end, or end before they start, are dropped.
pub fn custom(total: u32, ranges: &[PageRange]) -> Result<Vec<PageRange>> {
    let mut planned = Vec::with_capacity(ranges.len());
    for range in ranges {
        let start = range.start.max(1);
        let end = range.end.min(total);
        if start > total || end < start {
            let diagnostic = BinderyError::Range {
                start: range.start,
                end: range.end,
                reason: format!("outside a {total} page document"),
            };
            warn!(%diagnostic, "Dropping custom range");
            continue;
        }
        if (start, end) != (range.start, range.end) {
            warn!(
                requested_start = range.start,
                requested_end = range.end,
                start,
                end,
                "Clamping custom range"
            );
        }
        let label = if range.label.trim().is_empty() {
            PageRange::default_label(start, end)
        } else {
            range.label.clone()
        };
        planned.push(PageRange::with_label(start, end, label));
    }

    if planned.is_empty() {
        return Err(BinderyError::invalid(format!(
            "no custom range falls inside the {total} page document"
        )));
    }
    Ok(planned)
}
