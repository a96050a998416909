// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: decode, downsample, grayscale, and JPEG re-encode of single
// in-memory images with the `image` crate.

use bindery_core::{BinderyError, Result};
use image::{DynamicImage, GrayImage, RgbImage};
use tracing::{debug, instrument};

/// Processing pipeline over one decoded image.
///
/// Transformations consume `self` and return the transformed processor,
/// so steps chain:
///
/// ```ignore
/// let jpeg = ImageProcessor::from_bytes(&bytes)?
///     .downsample(1200, 1600)
///     .grayscale()
///     .to_jpeg_bytes(60)?;
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode encoded bytes (JPEG, PNG, ...), sniffing the format.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(data)
            .map_err(|err| BinderyError::Decode(format!("failed to decode image: {err}")))?;
        debug!(
            width = image.width(),
            height = image.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image })
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Build from raw 8-bit samples with `components` channels (1 gray,
    /// 3 RGB, 4 CMYK).
    pub fn from_samples(width: u32, height: u32, components: u8, samples: Vec<u8>) -> Result<Self> {
        let pixels = width as usize * height as usize;
        let expected = pixels * components as usize;
        if samples.len() < expected {
            return Err(BinderyError::Unsupported(format!(
                "image data is {} bytes, expected {expected}",
                samples.len()
            )));
        }
        let short = || BinderyError::Unsupported("image buffer size mismatch".into());
        let image = match components {
            1 => DynamicImage::ImageLuma8(
                GrayImage::from_raw(width, height, samples[..expected].to_vec()).ok_or_else(short)?,
            ),
            3 => DynamicImage::ImageRgb8(
                RgbImage::from_raw(width, height, samples[..expected].to_vec()).ok_or_else(short)?,
            ),
            4 => {
                let rgb = samples[..expected]
                    .chunks_exact(4)
                    .flat_map(|cmyk| cmyk_to_rgb(cmyk[0], cmyk[1], cmyk[2], cmyk[3]))
                    .collect();
                DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, rgb).ok_or_else(short)?)
            }
            other => {
                return Err(BinderyError::Unsupported(format!(
                    "{other} colour components per pixel"
                )));
            }
        };
        Ok(Self { image })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn has_alpha(&self) -> bool {
        self.image.color().has_alpha()
    }

    pub fn is_grayscale(&self) -> bool {
        !self.image.color().has_color()
    }

    // -- Transformations ------------------------------------------------------

    /// Shrink to fit within `max_width` x `max_height`, keeping the aspect
    /// ratio. Images already inside the bounds are left alone.
    #[instrument(skip(self), fields(max_width, max_height))]
    pub fn downsample(self, max_width: u32, max_height: u32) -> Self {
        if self.width() <= max_width && self.height() <= max_height {
            return self;
        }
        let resized = self.image.resize(
            max_width.max(1),
            max_height.max(1),
            image::imageops::FilterType::Lanczos3,
        );
        debug!(
            new_w = resized.width(),
            new_h = resized.height(),
            "Downsample complete"
        );
        Self { image: resized }
    }

    pub fn grayscale(self) -> Self {
        if self.is_grayscale() && !self.has_alpha() {
            return self;
        }
        Self {
            image: DynamicImage::ImageLuma8(self.image.to_luma8()),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode as baseline JPEG at `quality` (1-100). Grayscale images stay
    /// single-channel; anything else is encoded as RGB. Alpha is dropped.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        let encoded = if self.is_grayscale() {
            self.image.to_luma8().write_with_encoder(encoder)
        } else {
            self.image.to_rgb8().write_with_encoder(encoder)
        };
        encoded.map_err(|err| BinderyError::Encode(format!("JPEG encoding failed: {err}")))?;
        Ok(buffer)
    }

    /// Raw 8-bit RGB samples, row-major.
    pub fn to_rgb_samples(&self) -> Vec<u8> {
        self.image.to_rgb8().into_raw()
    }

    /// The alpha channel as 8-bit gray samples, if the image has one.
    pub fn alpha_samples(&self) -> Option<Vec<u8>> {
        if !self.has_alpha() {
            return None;
        }
        Some(self.image.to_rgba8().pixels().map(|pixel| pixel.0[3]).collect())
    }
}

/// Naive CMYK to RGB conversion without colour management.
fn cmyk_to_rgb(c: u8, m: u8, y: u8, k: u8) -> [u8; 3] {
    let k = 255 - k as u16;
    let channel = |value: u8| ((255 - value as u16) * k / 255) as u8;
    [channel(c), channel(m), channel(y)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn downsample_keeps_aspect_and_never_upscales() {
        let processor = ImageProcessor::from_dynamic(DynamicImage::ImageRgb8(fixtures::gradient(400, 200)));
        let shrunk = processor.downsample(100, 100);
        assert_eq!((shrunk.width(), shrunk.height()), (100, 50));
        let same = shrunk.downsample(1000, 1000);
        assert_eq!((same.width(), same.height()), (100, 50));
    }

    #[test]
    fn grayscale_jpeg_is_smaller_than_colour() {
        let processor = ImageProcessor::from_bytes(&fixtures::png_bytes(64, 64)).unwrap();
        let colour = processor.to_jpeg_bytes(80).unwrap();
        let gray = processor.grayscale();
        assert!(gray.is_grayscale());
        let gray_bytes = gray.to_jpeg_bytes(80).unwrap();
        assert!(gray_bytes.len() < colour.len());
    }

    #[test]
    fn cmyk_samples_convert_to_rgb() {
        let processor = ImageProcessor::from_samples(1, 1, 4, vec![0, 255, 255, 0]).unwrap();
        assert_eq!(processor.to_rgb_samples(), vec![255, 0, 0]);
    }

    #[test]
    fn short_sample_buffer_is_unsupported() {
        let err = ImageProcessor::from_samples(4, 4, 3, vec![0; 10]).err().unwrap();
        assert!(matches!(err, BinderyError::Unsupported(_)));
    }

    #[test]
    fn alpha_channel_is_extracted() {
        let processor = ImageProcessor::from_bytes(&fixtures::png_with_alpha(8, 2)).unwrap();
        assert!(processor.has_alpha());
        let alpha = processor.alpha_samples().unwrap();
        assert_eq!(alpha.len(), 16);
        assert_eq!(alpha[3], 3);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            ImageProcessor::from_bytes(b"not an image").err().unwrap(),
            BinderyError::Decode(_)
        ));
    }
}
