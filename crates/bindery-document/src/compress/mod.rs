// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Size reduction of a whole document: structural clean-up, image
// re-encoding, stream dedupe, and a final flate pass.

mod images;
pub mod planner;

use bindery_core::{BinderyError, CancelToken, CompressSpec, EngineConfig, Result};
use serde::Serialize;
use tracing::{info, instrument};

use crate::source::SourceDocument;
pub use planner::{CompressionPlan, LevelPreset};

/// Outputs below this fraction of the input size count as worthwhile.
pub const WORTHWHILE_RATIO: f64 = 0.95;

/// What a compression run achieved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionReport {
    pub original_size: u64,
    pub compressed_size: u64,
    /// Percentage of the original size saved; negative when the output grew.
    pub compression_ratio: f64,
    pub images_total: usize,
    pub images_recompressed: usize,
    pub images_skipped: usize,
}

impl CompressionReport {
    fn new(original_size: u64, compressed_size: u64, images_total: usize, images_recompressed: usize) -> Self {
        let compression_ratio = if original_size == 0 {
            0.0
        } else {
            (1.0 - compressed_size as f64 / original_size as f64) * 100.0
        };
        Self {
            original_size,
            compressed_size,
            compression_ratio,
            images_total,
            images_recompressed,
            images_skipped: images_total - images_recompressed,
        }
    }

    /// True when the output is under 95% of the input.
    pub fn is_worthwhile(&self) -> bool {
        (self.compressed_size as f64) < self.original_size as f64 * WORTHWHILE_RATIO
    }
}

/// Compress `data` according to `spec`, returning the new bytes and a report.
#[instrument(skip_all, fields(bytes_len = data.len(), level = ?spec.level))]
pub fn compress_document(
    data: &[u8],
    spec: &CompressSpec,
    config: &EngineConfig,
    cancel: &CancelToken,
) -> Result<(Vec<u8>, CompressionReport)> {
    spec.validate()?;
    cancel.check()?;
    let plan = CompressionPlan::for_spec(spec);
    let mut doc = SourceDocument::open(data)?.into_document();

    plan.strip(&mut doc, cancel)?;

    let tally = if plan.optimize_images {
        images::recompress_images(
            &mut doc,
            images::ImageSettings {
                quality: plan.image_quality,
                max_dpi: plan.max_image_dpi,
                grayscale: plan.grayscale,
            },
            config.parallel,
            cancel,
        )?
    } else {
        images::ImageTally {
            total: images::count_images(&doc),
            recompressed: 0,
        }
    };

    plan.dedupe_streams(&mut doc, cancel)?;
    cancel.check()?;
    doc.prune_objects();
    doc.compress();

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|err| BinderyError::Encode(format!("failed to write compressed document: {err}")))?;

    let report = CompressionReport::new(
        data.len() as u64,
        output.len() as u64,
        tally.total,
        tally.recompressed,
    );
    info!(
        original = report.original_size,
        compressed = report.compressed_size,
        saved_percent = report.compression_ratio,
        images = report.images_recompressed,
        "Compression complete"
    );
    Ok((output, report))
}
