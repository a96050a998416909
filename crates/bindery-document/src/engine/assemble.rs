// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Images to document: lay raster images out on new pages.

use std::fmt::Write as _;

use bindery_core::{
    BinderyError, CancelToken, DocumentMetadata, EngineConfig, ImageAssemblySpec, Result, Rgb,
};
use chrono::Utc;
use lopdf::{Dictionary, Object, dictionary};
use tracing::{debug, info, instrument, warn};

use crate::image::EmbeddableImage;
use crate::layout::{Rect, fit_image, grid_cells, page_dimensions_for};
use crate::pdf::{DocumentBuilder, stamp};

/// Font size of the assembly timestamp.
const TIMESTAMP_FONT_SIZE: f32 = 9.0;

#[instrument(skip_all, fields(images = images.len(), per_page = spec.images_per_page))]
pub(crate) fn images_to_document(
    config: &EngineConfig,
    images: &[Vec<u8>],
    spec: &ImageAssemblySpec,
    cancel: &CancelToken,
) -> Result<Vec<u8>> {
    spec.validate(images.len())?;

    let (page_width, page_height) = page_dimensions_for(spec.page_size, spec.orientation);
    let page = Rect::new(0.0, 0.0, page_width, page_height);
    let cells = grid_cells(page.inset(spec.margin), spec.images_per_page, config.image_spacing);
    // Pixels to points for images placed at their original size.
    let points_per_pixel = 72.0 / config.assumed_image_dpi.max(1.0);

    let mut builder = DocumentBuilder::new(config);
    let mut placed = 0usize;
    for (page_index, chunk) in images.chunks(spec.images_per_page as usize).enumerate() {
        cancel.check()?;
        let mut operations = Vec::new();
        let mut xobjects = Dictionary::new();
        if let Some(background) = spec.background {
            operations.extend(stamp::fill_rect(page, background));
        }

        for (slot, (data, cell)) in chunk.iter().zip(&cells).enumerate() {
            let index = page_index * spec.images_per_page as usize + slot;
            let image = match EmbeddableImage::sniff(data) {
                Ok(image) => image,
                Err(err) => {
                    let skipped = BinderyError::Element {
                        index,
                        reason: err.to_string(),
                    };
                    warn!(error = %skipped, "Image left out");
                    continue;
                }
            };

            let (pixel_width, pixel_height) = image.dimensions();
            let target = fit_image(
                pixel_width as f32 * points_per_pixel,
                pixel_height as f32 * points_per_pixel,
                cell.width,
                cell.height,
                spec.layout_mode,
            )
            .offset(cell.x, cell.y);

            let (mut stream, mask) = image.into_streams();
            if let Some(mask) = mask {
                let mask_id = builder.add_object(mask);
                stream.dict.set("SMask", mask_id);
            }
            let image_id = builder.add_object(stream);
            let name = format!("Im{}", slot + 1);
            xobjects.set(name.as_str(), Object::Reference(image_id));
            operations.extend(stamp::draw_image(&name, target));
            if let Some(border) = spec.border {
                operations.extend(stamp::stroke_rect(target, border.width, border.color));
            }
            placed += 1;
        }

        let resources = if xobjects.is_empty() {
            Dictionary::new()
        } else {
            dictionary! { "XObject" => xobjects }
        };
        let page_number = builder.add_page(page_width, page_height, operations, resources)?;
        debug!(page = page_number, images = chunk.len(), "Image page laid out");
    }

    if placed == 0 {
        return Err(BinderyError::Decode(format!(
            "none of the {} images could be decoded",
            images.len()
        )));
    }

    if let Some(numbering) = &spec.page_numbers {
        builder.stamp_page_numbers(numbering)?;
    }
    if let Some(anchor) = spec.timestamp {
        let mut stamp_text = String::new();
        write!(stamp_text, "{}", Utc::now().format(&config.timestamp_format)).map_err(|_| {
            BinderyError::invalid(format!("invalid timestamp format {:?}", config.timestamp_format))
        })?;
        builder.stamp_text(&stamp_text, anchor, TIMESTAMP_FONT_SIZE, Rgb::GRAY)?;
    }
    if let Some(watermark) = &spec.watermark {
        builder.stamp_watermark(watermark)?;
    }
    builder.fill_metadata(&DocumentMetadata {
        title: spec.title.clone(),
        author: spec.author.clone(),
        ..DocumentMetadata::default()
    });

    let output = builder.finish(false)?;
    info!(
        images = images.len(),
        placed,
        pages = builder.page_count(),
        output_bytes = output.len(),
        "Image document assembled"
    );
    Ok(output)
}
