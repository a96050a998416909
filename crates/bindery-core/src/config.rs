// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration. Passed in at construction; the engine reads no
// ambient process state.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Settings shared by every operation of one engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Written to the /Producer entry of every output.
    pub producer: String,
    /// Page size used when nothing else determines one (e.g. a title page
    /// ahead of sources without a readable MediaBox).
    pub default_page_size: crate::PageSize,
    /// Resolution assumed for raster images placed at their original size.
    pub assumed_image_dpi: f32,
    /// Gap between image cells when several images share a page, in points.
    pub image_spacing: f32,
    /// chrono format string for page timestamps.
    pub timestamp_format: String,
    /// Flate-compress content streams when finalising an output.
    pub compress_output: bool,
    /// Serialise split outputs and re-encode images on the rayon pool.
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            producer: "Bindery".into(),
            default_page_size: crate::PageSize::A4,
            assumed_image_dpi: 72.0,
            image_spacing: 10.0,
            timestamp_format: "%Y-%m-%d %H:%M".into(),
            compress_output: true,
            parallel: true,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"producer":"Acme"}"#).unwrap();
        assert_eq!(config.producer, "Acme");
        assert_eq!(config.assumed_image_dpi, 72.0);
        assert!(config.parallel);
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = EngineConfig::from_json("{producer").unwrap_err();
        assert!(matches!(err, crate::BinderyError::Serialization(_)));
    }
}
