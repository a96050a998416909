// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Format sniffing and image XObject construction for embedding raster images.

use std::io::Cursor;

use bindery_core::{BinderyError, Result};
use image::{ExtendedColorType, ImageDecoder, ImageFormat, ImageReader};
use lopdf::{Dictionary, Object, Stream, dictionary};
use tracing::debug;

use super::processor::ImageProcessor;

/// Colour space of a JPEG embedded as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColor {
    Gray,
    Rgb,
}

impl JpegColor {
    fn color_space(self) -> &'static str {
        match self {
            Self::Gray => "DeviceGray",
            Self::Rgb => "DeviceRGB",
        }
    }
}

/// An input image classified by how it will be embedded.
pub enum EmbeddableImage {
    /// 8-bit gray or RGB JPEG copied verbatim behind DCTDecode.
    Jpeg {
        data: Vec<u8>,
        width: u32,
        height: u32,
        color: JpegColor,
    },
    /// Decoded pixels stored as flate-compressed RGB, with an optional soft
    /// mask holding the alpha channel.
    Raster {
        rgb: Vec<u8>,
        alpha: Option<Vec<u8>>,
        width: u32,
        height: u32,
    },
}

impl EmbeddableImage {
    /// Sniff `data` and classify it. Unknown formats are `Unsupported`;
    /// known formats that fail to decode are `Decode` errors.
    pub fn sniff(data: &[u8]) -> Result<Self> {
        let format = image::guess_format(data)
            .map_err(|_| BinderyError::Unsupported("unrecognised image format".into()))?;

        if format == ImageFormat::Jpeg
            && let Some(jpeg) = Self::jpeg_passthrough(data)
        {
            return Ok(jpeg);
        }

        let decoded = image::load_from_memory_with_format(data, format)
            .map_err(|err| BinderyError::Decode(format!("failed to decode {format:?} image: {err}")))?;
        let processor = ImageProcessor::from_dynamic(decoded);
        debug!(?format, width = processor.width(), height = processor.height(), "Image rasterised");
        Ok(Self::Raster {
            rgb: processor.to_rgb_samples(),
            alpha: processor.alpha_samples(),
            width: processor.width(),
            height: processor.height(),
        })
    }

    /// JPEG headers are read without decoding pixels. CMYK and other
    /// layouts return `None` and fall back to rasterising.
    fn jpeg_passthrough(data: &[u8]) -> Option<Self> {
        let decoder = ImageReader::with_format(Cursor::new(data), ImageFormat::Jpeg)
            .into_decoder()
            .ok()?;
        let (width, height) = decoder.dimensions();
        let color = match decoder.original_color_type() {
            ExtendedColorType::L8 => JpegColor::Gray,
            ExtendedColorType::Rgb8 => JpegColor::Rgb,
            _ => return None,
        };
        Some(Self::Jpeg {
            data: data.to_vec(),
            width,
            height,
            color,
        })
    }

    /// Pixel dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Jpeg { width, height, .. } | Self::Raster { width, height, .. } => {
                (*width, *height)
            }
        }
    }

    pub fn is_jpeg(&self) -> bool {
        matches!(self, Self::Jpeg { .. })
    }

    /// The image XObject and, for rasters with alpha, its soft mask. The
    /// caller links the mask by setting /SMask on the image.
    pub fn into_streams(self) -> (Stream, Option<Stream>) {
        match self {
            Self::Jpeg {
                data,
                width,
                height,
                color,
            } => {
                let mut dict = image_dict(width, height, color.color_space());
                dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
                let mut stream = Stream::new(dict, data);
                stream.allows_compression = false;
                (stream, None)
            }
            Self::Raster {
                rgb,
                alpha,
                width,
                height,
            } => {
                let image = compressed(Stream::new(image_dict(width, height, "DeviceRGB"), rgb));
                let mask = alpha.map(|alpha| {
                    compressed(Stream::new(image_dict(width, height, "DeviceGray"), alpha))
                });
                (image, mask)
            }
        }
    }
}

fn image_dict(width: u32, height: u32, color_space: &str) -> Dictionary {
    dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => Object::Name(color_space.as_bytes().to_vec()),
        "BitsPerComponent" => 8,
    }
}

fn compressed(mut stream: Stream) -> Stream {
    // Falls back to the raw samples if deflate fails.
    let _ = stream.compress();
    stream
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn rgb_jpeg_is_passed_through() {
        let jpeg = fixtures::jpeg_bytes(&fixtures::gradient(30, 20), 80);
        let image = EmbeddableImage::sniff(&jpeg).unwrap();
        assert!(image.is_jpeg());
        assert_eq!(image.dimensions(), (30, 20));

        let (stream, mask) = image.into_streams();
        assert!(mask.is_none());
        assert_eq!(stream.content, jpeg);
        assert_eq!(stream.dict.get(b"Filter").unwrap().as_name().unwrap(), b"DCTDecode");
    }

    #[test]
    fn png_becomes_flate_raster() {
        let image = EmbeddableImage::sniff(&fixtures::png_bytes(64, 64)).unwrap();
        assert!(!image.is_jpeg());
        let (stream, mask) = image.into_streams();
        assert!(mask.is_none());
        assert_eq!(stream.dict.get(b"Filter").unwrap().as_name().unwrap(), b"FlateDecode");
        assert_eq!(stream.decompressed_content().unwrap().len(), 64 * 64 * 3);
    }

    #[test]
    fn alpha_becomes_soft_mask() {
        let image = EmbeddableImage::sniff(&fixtures::png_with_alpha(4, 4)).unwrap();
        let (_, mask) = image.into_streams();
        let mask = mask.unwrap();
        assert_eq!(mask.dict.get(b"ColorSpace").unwrap().as_name().unwrap(), b"DeviceGray");
    }

    #[test]
    fn unknown_bytes_are_unsupported() {
        let err = EmbeddableImage::sniff(b"plain text, not pixels").err().unwrap();
        assert!(matches!(err, BinderyError::Unsupported(_)));
    }

    #[test]
    fn truncated_png_is_a_decode_error() {
        let png = fixtures::png_bytes(16, 16);
        let err = EmbeddableImage::sniff(&png[..40]).err().unwrap();
        assert!(matches!(err, BinderyError::Decode(_)));
    }
}
