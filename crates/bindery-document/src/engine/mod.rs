// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Assembly orchestrator: the four public entry points. Each call decodes its
// inputs, plans, builds and returns owned output buffers; nothing is kept
// between calls.

mod assemble;
mod merge;
mod split;

use bindery_core::{
    CancelToken, CompressSpec, EngineConfig, ImageAssemblySpec, MergeSource, MergeSpec, Result,
    SplitSpec,
};

use crate::compress::{CompressionReport, compress_document};
pub use split::SplitOutput;

/// Document assembly engine.
///
/// Holds only its configuration. Cloning is cheap and clones never share
/// mutable state, so one instance can serve concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct Bindery {
    config: EngineConfig,
}

impl Bindery {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -- Merge ----------------------------------------------------------------

    /// Concatenate `sources` in order into one document.
    pub fn merge(&self, sources: &[MergeSource], spec: &MergeSpec) -> Result<Vec<u8>> {
        self.merge_with_cancel(sources, spec, &CancelToken::none())
    }

    pub fn merge_with_cancel(
        &self,
        sources: &[MergeSource],
        spec: &MergeSpec,
        cancel: &CancelToken,
    ) -> Result<Vec<u8>> {
        merge::merge(&self.config, sources, spec, cancel)
    }

    // -- Split ----------------------------------------------------------------

    /// Cut `data` into outputs, in planned range order.
    pub fn split(&self, data: &[u8], spec: &SplitSpec) -> Result<Vec<SplitOutput>> {
        self.split_with_cancel(data, spec, &CancelToken::none())
    }

    pub fn split_with_cancel(
        &self,
        data: &[u8],
        spec: &SplitSpec,
        cancel: &CancelToken,
    ) -> Result<Vec<SplitOutput>> {
        split::split(&self.config, data, spec, cancel)
    }

    // -- Compress -------------------------------------------------------------

    /// Shrink `data`. The report says whether the result is worth keeping;
    /// that decision is left to the caller.
    pub fn compress(&self, data: &[u8], spec: &CompressSpec) -> Result<(Vec<u8>, CompressionReport)> {
        self.compress_with_cancel(data, spec, &CancelToken::none())
    }

    pub fn compress_with_cancel(
        &self,
        data: &[u8],
        spec: &CompressSpec,
        cancel: &CancelToken,
    ) -> Result<(Vec<u8>, CompressionReport)> {
        compress_document(data, spec, &self.config, cancel)
    }

    // -- Images to document ---------------------------------------------------

    /// Lay `images` out on new pages. Images that cannot be decoded are
    /// logged and left out.
    pub fn images_to_document(&self, images: &[Vec<u8>], spec: &ImageAssemblySpec) -> Result<Vec<u8>> {
        self.images_to_document_with_cancel(images, spec, &CancelToken::none())
    }

    pub fn images_to_document_with_cancel(
        &self,
        images: &[Vec<u8>],
        spec: &ImageAssemblySpec,
        cancel: &CancelToken,
    ) -> Result<Vec<u8>> {
        assemble::images_to_document(&self.config, images, spec, cancel)
    }
}
