// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image XObject re-encoding: decode embedded samples, downsample to a DPI
// cap, optionally convert to gray, and store as JPEG when that is smaller.

use std::collections::{HashMap, HashSet};

use bindery_core::{BinderyError, CancelToken, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use rayon::prelude::*;
use tracing::{debug, instrument, warn};

use crate::image::ImageProcessor;
use crate::pdf::objects::{as_number, dictionary, filter_names, inherited, media_box, name_of, resolve};

/// Form XObjects nested deeper than this are not searched for images.
const MAX_FORM_DEPTH: usize = 8;

/// How images are rewritten.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ImageSettings {
    pub quality: u8,
    /// `None` leaves pixel dimensions alone.
    pub max_dpi: Option<u32>,
    pub grayscale: bool,
}

/// Counts reported back to the compressor.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ImageTally {
    pub total: usize,
    pub recompressed: usize,
}

#[derive(Debug, Clone, Copy)]
enum SampleEncoding {
    Dct,
    Flate,
    Raw,
}

/// An image the pipeline knows how to decode, detached from the document
/// so it can move to a worker thread.
struct ImageJob {
    index: usize,
    id: ObjectId,
    stream: Stream,
    encoding: SampleEncoding,
    components: u8,
    width: u32,
    height: u32,
    /// Largest page (in points) the image is drawn on.
    page_bounds: Option<(f32, f32)>,
}

/// Count every image XObject in `doc`.
pub(crate) fn count_images(doc: &Document) -> usize {
    doc.objects
        .values()
        .filter(|object| matches!(object, Object::Stream(stream) if is_image(&stream.dict)))
        .count()
}

/// Re-encode every supported image in place.
///
/// Unsupported images are left as they are. A failure on one image is
/// logged and skipped; only cancellation aborts the pass.
#[instrument(skip_all, fields(quality = settings.quality, max_dpi = ?settings.max_dpi))]
pub(crate) fn recompress_images(
    doc: &mut Document,
    settings: ImageSettings,
    parallel: bool,
    cancel: &CancelToken,
) -> Result<ImageTally> {
    let bounds = image_page_bounds(doc);
    let mut image_ids: Vec<ObjectId> = doc
        .objects
        .iter()
        .filter(|(_, object)| matches!(object, Object::Stream(stream) if is_image(&stream.dict)))
        .map(|(id, _)| *id)
        .collect();
    image_ids.sort_unstable();

    let mut tally = ImageTally {
        total: image_ids.len(),
        recompressed: 0,
    };
    let mut jobs = Vec::new();
    for (index, id) in image_ids.into_iter().enumerate() {
        match prepare_job(doc, index, id, bounds.get(&id).copied()) {
            Ok(job) => jobs.push(job),
            Err(err) => debug!(index, object = ?id, error = %err, "Image left unchanged"),
        }
    }

    let run = |job: ImageJob| {
        let (index, id) = (job.index, job.id);
        (index, id, reencode(job, settings, cancel))
    };
    let results: Vec<(usize, ObjectId, Result<Option<Stream>>)> = if parallel {
        jobs.into_par_iter().map(run).collect()
    } else {
        jobs.into_iter().map(run).collect()
    };

    for (index, id, result) in results {
        match result {
            Ok(Some(stream)) => {
                doc.objects.insert(id, Object::Stream(stream));
                tally.recompressed += 1;
            }
            Ok(None) => debug!(index, object = ?id, "Re-encoded image was not smaller"),
            Err(err @ (BinderyError::Cancelled | BinderyError::DeadlineExceeded)) => return Err(err),
            Err(err) => {
                let skipped = BinderyError::Element {
                    index,
                    reason: err.to_string(),
                };
                warn!(object = ?id, error = %skipped, "Image re-encode failed");
            }
        }
    }

    debug!(total = tally.total, recompressed = tally.recompressed, "Image pass complete");
    Ok(tally)
}

fn is_image(dict: &Dictionary) -> bool {
    dict.get(b"Subtype").ok().and_then(name_of) == Some(b"Image".as_slice())
}

/// Check the image is one the pipeline handles and copy out what it needs.
fn prepare_job(
    doc: &Document,
    index: usize,
    id: ObjectId,
    page_bounds: Option<(f32, f32)>,
) -> Result<ImageJob> {
    let Ok(Object::Stream(stream)) = doc.get_object(id) else {
        return Err(BinderyError::Unsupported("image is not a stream".into()));
    };
    let dict = &stream.dict;
    let unsupported = |reason: &str| Err(BinderyError::Unsupported(reason.into()));

    if matches!(dict.get(b"ImageMask").map(|mask| resolve(doc, mask)), Ok(Object::Boolean(true))) {
        return unsupported("stencil mask");
    }
    // Colour-key masking matches exact sample values, which lossy
    // re-encoding or a colour-space change would break.
    if matches!(dict.get(b"Mask").map(|mask| resolve(doc, mask)), Ok(Object::Array(_))) {
        return unsupported("colour-key mask");
    }
    if dict.get(b"Decode").is_ok() {
        return unsupported("custom decode array");
    }
    if dict.get(b"DecodeParms").is_ok() {
        return unsupported("predictor-encoded samples");
    }

    let number = |key: &[u8]| {
        dict.get(key)
            .ok()
            .and_then(|value| as_number(resolve(doc, value)))
            .map(|value| value as i64)
    };
    let (Some(width), Some(height)) = (number(b"Width"), number(b"Height")) else {
        return unsupported("missing dimensions");
    };
    if width <= 0 || height <= 0 {
        return unsupported("empty image");
    }

    let filters = filter_names(doc, dict);
    let encoding = match filters.as_slice() {
        [] => SampleEncoding::Raw,
        [filter] if filter.as_slice() == b"FlateDecode" => SampleEncoding::Flate,
        [filter] if filter.as_slice() == b"DCTDecode" => SampleEncoding::Dct,
        _ => return unsupported("unsupported filter chain"),
    };
    if number(b"BitsPerComponent").unwrap_or(8) != 8 {
        return unsupported("not 8 bits per component");
    }
    let components = colour_components(doc, dict)?;

    Ok(ImageJob {
        index,
        id,
        stream: stream.clone(),
        encoding,
        components,
        width: width as u32,
        height: height as u32,
        page_bounds,
    })
}

/// Channel count of DeviceGray, DeviceRGB, DeviceCMYK, or an ICC profile
/// standing in for one of them.
fn colour_components(doc: &Document, dict: &Dictionary) -> Result<u8> {
    let space = dict
        .get(b"ColorSpace")
        .map(|space| resolve(doc, space))
        .map_err(|_| BinderyError::Unsupported("missing colour space".into()))?;
    let family = match space {
        Object::Name(name) => name.as_slice(),
        Object::Array(items) => items
            .first()
            .and_then(|first| name_of(resolve(doc, first)))
            .unwrap_or_default(),
        _ => b"".as_slice(),
    };
    match family {
        b"DeviceGray" | b"CalGray" => Ok(1),
        b"DeviceRGB" | b"CalRGB" => Ok(3),
        b"DeviceCMYK" => Ok(4),
        b"ICCBased" => {
            let Object::Array(items) = space else {
                return Err(BinderyError::Unsupported("malformed ICC colour space".into()));
            };
            items
                .get(1)
                .and_then(|profile| dictionary(doc, profile))
                .and_then(|profile| profile.get(b"N").ok())
                .and_then(|n| as_number(resolve(doc, n)))
                .map(|n| n as u8)
                .filter(|n| matches!(n, 1 | 3 | 4))
                .ok_or_else(|| BinderyError::Unsupported("ICC profile without a usable /N".into()))
        }
        other => Err(BinderyError::Unsupported(format!(
            "colour space {}",
            String::from_utf8_lossy(other)
        ))),
    }
}

/// Decode, transform, and re-encode one image. `Ok(None)` means the result
/// would not be smaller than what is already stored.
fn reencode(job: ImageJob, settings: ImageSettings, cancel: &CancelToken) -> Result<Option<Stream>> {
    cancel.check()?;

    let mut processor = match job.encoding {
        SampleEncoding::Dct => ImageProcessor::from_bytes(&job.stream.content)?,
        SampleEncoding::Flate => {
            let samples = job.stream.decompressed_content().map_err(|err| {
                BinderyError::Decode(format!("failed to inflate image samples: {err}"))
            })?;
            ImageProcessor::from_samples(job.width, job.height, job.components, samples)?
        }
        SampleEncoding::Raw => ImageProcessor::from_samples(
            job.width,
            job.height,
            job.components,
            job.stream.content.clone(),
        )?,
    };

    if let (Some(dpi), Some((page_width, page_height))) = (settings.max_dpi, job.page_bounds) {
        let cap = |points: f32| ((points / 72.0) * dpi as f32).ceil().max(1.0) as u32;
        processor = processor.downsample(cap(page_width), cap(page_height));
    }
    if settings.grayscale {
        processor = processor.grayscale();
    }

    let jpeg = processor.to_jpeg_bytes(settings.quality)?;
    if jpeg.len() >= job.stream.content.len() {
        return Ok(None);
    }

    let mut dict = job.stream.dict.clone();
    dict.remove(b"Filter");
    dict.remove(b"DecodeParms");
    dict.remove(b"Length");
    dict.set("Width", processor.width() as i64);
    dict.set("Height", processor.height() as i64);
    dict.set("BitsPerComponent", 8);
    let space: &[u8] = if processor.is_grayscale() {
        b"DeviceGray"
    } else {
        b"DeviceRGB"
    };
    dict.set("ColorSpace", Object::Name(space.to_vec()));
    dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));

    let mut stream = Stream::new(dict, jpeg);
    stream.allows_compression = false;
    Ok(Some(stream))
}

// -- Page bounds --------------------------------------------------------------

/// For every image reachable from a page's resources (directly or through
/// form XObjects), the largest page size it appears on.
fn image_page_bounds(doc: &Document) -> HashMap<ObjectId, (f32, f32)> {
    let mut bounds: HashMap<ObjectId, (f32, f32)> = HashMap::new();
    for page_id in doc.get_pages().into_values() {
        let Some([x0, y0, x1, y1]) = media_box(doc, page_id) else {
            continue;
        };
        let size = ((x1 - x0).abs(), (y1 - y0).abs());
        let Some(resources) = inherited(doc, page_id, b"Resources").and_then(|r| dictionary(doc, r))
        else {
            continue;
        };
        let mut found = HashSet::new();
        collect_images(doc, resources, 0, &mut found);
        for image in found {
            let entry = bounds.entry(image).or_insert(size);
            entry.0 = entry.0.max(size.0);
            entry.1 = entry.1.max(size.1);
        }
    }
    bounds
}

fn collect_images(doc: &Document, resources: &Dictionary, depth: usize, found: &mut HashSet<ObjectId>) {
    if depth > MAX_FORM_DEPTH {
        return;
    }
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|xobjects| dictionary(doc, xobjects))
    else {
        return;
    };
    for (_, value) in xobjects.iter() {
        let Object::Reference(id) = value else {
            continue;
        };
        let Ok(Object::Stream(stream)) = doc.get_object(*id) else {
            continue;
        };
        if is_image(&stream.dict) {
            found.insert(*id);
        } else if !found.contains(id)
            && let Some(inner) = stream
                .dict
                .get(b"Resources")
                .ok()
                .and_then(|inner| dictionary(doc, inner))
        {
            found.insert(*id);
            collect_images(doc, inner, depth + 1, found);
            found.remove(id);
        }
    }
}
