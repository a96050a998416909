// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory documents and images for unit tests.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

/// Content of one fixture page.
pub(crate) enum FixturePage<'a> {
    /// A line of Helvetica text.
    Text(&'a str),
    /// No content stream data at all.
    Blank,
    /// Content stream bytes used verbatim.
    Raw(&'a str),
}

struct FixtureDoc {
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    page_ids: Vec<ObjectId>,
}

impl FixtureDoc {
    fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        Self {
            doc,
            pages_id,
            font_id,
            page_ids: Vec::new(),
        }
    }

    fn add_page(&mut self, content: Vec<u8>, extra_resources: Dictionary) -> ObjectId {
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, content));
        let mut resources = dictionary! {
            "Font" => dictionary! { "F1" => self.font_id },
        };
        for (key, value) in extra_resources.iter() {
            resources.set(key.clone(), value.clone());
        }
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.page_ids.push(page_id);
        page_id
    }

    fn finish(mut self) -> Document {
        let kids: Vec<Object> = self.page_ids.iter().map(|id| (*id).into()).collect();
        let count = kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc
    }
}

fn text_content(text: &str) -> Vec<u8> {
    format!("BT /F1 24 Tf 72 700 Td ({text}) Tj ET").into_bytes()
}

pub(crate) fn save(doc: &mut Document) -> Vec<u8> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

pub(crate) fn pdf_from_pages(pages: &[FixturePage<'_>]) -> Vec<u8> {
    let mut fixture = FixtureDoc::new();
    for page in pages {
        let content = match page {
            FixturePage::Text(text) => text_content(text),
            FixturePage::Blank => Vec::new(),
            FixturePage::Raw(raw) => raw.as_bytes().to_vec(),
        };
        fixture.add_page(content, Dictionary::new());
    }
    save(&mut fixture.finish())
}

/// A Letter-sized document whose page `n` shows the text `Page n`.
pub(crate) fn pdf_with_pages(count: u32) -> Vec<u8> {
    pdf_labelled("Page", count)
}

/// Like [`pdf_with_pages`] with a custom label prefix.
pub(crate) fn pdf_labelled(prefix: &str, count: u32) -> Vec<u8> {
    let labels: Vec<String> = (1..=count).map(|n| format!("{prefix} {n}")).collect();
    let pages: Vec<FixturePage<'_>> = labels.iter().map(|l| FixturePage::Text(l)).collect();
    pdf_from_pages(&pages)
}

pub(crate) fn pdf_with_metadata(count: u32, title: &str, author: &str) -> Vec<u8> {
    let mut doc = Document::load_mem(&pdf_with_pages(count)).unwrap();
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(title),
        "Author" => Object::string_literal(author),
    });
    doc.trailer.set("Info", info_id);
    save(&mut doc)
}

/// One text page with a /Rotate value and an optional /CropBox.
pub(crate) fn pdf_with_page_geometry(rotate: i64, crop: Option<[f32; 4]>) -> Vec<u8> {
    let mut doc = Document::load_mem(&pdf_labelled("Turned", 1)).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    let page = doc.get_dictionary_mut(page_id).unwrap();
    page.set("Rotate", rotate);
    if let Some(crop) = crop {
        page.set("CropBox", crop.iter().map(|v| Object::Real(*v)).collect::<Vec<_>>());
    }
    save(&mut doc)
}

/// A document with an outline. Each entry is `(title, page, children)`.
pub(crate) fn pdf_with_bookmarks(count: u32, entries: &[(&str, u32, Vec<(&str, u32)>)]) -> Vec<u8> {
    let mut doc = Document::load_mem(&pdf_with_pages(count)).unwrap();
    let pages = doc.get_pages();
    let outlines_id = doc.new_object_id();

    let mut top_ids = Vec::new();
    for (title, page, children) in entries {
        let item_id = doc.new_object_id();
        let mut child_ids = Vec::new();
        for (child_title, child_page) in children {
            let child_id = doc.new_object_id();
            let dest = vec![pages[child_page].into(), Object::Name(b"Fit".to_vec())];
            doc.objects.insert(
                child_id,
                Object::Dictionary(dictionary! {
                    "Title" => Object::string_literal(*child_title),
                    "Parent" => item_id,
                    "Dest" => dest,
                }),
            );
            child_ids.push(child_id);
        }
        link_siblings(&mut doc, &child_ids);

        let dest = vec![pages[page].into(), Object::Name(b"Fit".to_vec())];
        let mut item = dictionary! {
            "Title" => Object::string_literal(*title),
            "Parent" => outlines_id,
            "Dest" => dest,
        };
        if let (Some(first), Some(last)) = (child_ids.first(), child_ids.last()) {
            item.set("First", *first);
            item.set("Last", *last);
            item.set("Count", child_ids.len() as i64);
        }
        doc.objects.insert(item_id, Object::Dictionary(item));
        top_ids.push(item_id);
    }
    link_siblings(&mut doc, &top_ids);

    let mut outlines = dictionary! { "Type" => "Outlines", "Count" => top_ids.len() as i64 };
    if let (Some(first), Some(last)) = (top_ids.first(), top_ids.last()) {
        outlines.set("First", *first);
        outlines.set("Last", *last);
    }
    doc.objects.insert(outlines_id, Object::Dictionary(outlines));
    doc.catalog_mut().unwrap().set("Outlines", outlines_id);
    save(&mut doc)
}

fn link_siblings(doc: &mut Document, ids: &[ObjectId]) {
    for (index, id) in ids.iter().enumerate() {
        let dict = doc.get_dictionary_mut(*id).unwrap();
        if index > 0 {
            dict.set("Prev", ids[index - 1]);
        }
        if let Some(next) = ids.get(index + 1) {
            dict.set("Next", *next);
        }
    }
}

/// A one-page document drawing a `width` x `height` image XObject full-page.
/// JPEG images are stored with DCTDecode, others as raw RGB.
pub(crate) fn pdf_with_image(width: u32, height: u32, as_jpeg: bool) -> Vec<u8> {
    let mut fixture = FixtureDoc::new();
    let picture = gradient(width, height);
    let stream = if as_jpeg {
        Stream::new(
            image_dict(width, height, Some("DCTDecode")),
            jpeg_bytes(&picture, 95),
        )
    } else {
        Stream::new(image_dict(width, height, None), picture.into_raw())
    };
    let image_id = fixture.doc.add_object(stream);
    let content = b"q 612 0 0 792 0 0 cm /Im1 Do Q".to_vec();
    fixture.add_page(
        content,
        dictionary! { "XObject" => dictionary! { "Im1" => image_id } },
    );
    save(&mut fixture.finish())
}

fn image_dict(width: u32, height: u32, filter: Option<&str>) -> Dictionary {
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };
    if let Some(filter) = filter {
        dict.set("Filter", Object::Name(filter.as_bytes().to_vec()));
    }
    dict
}

/// A noisy-ish RGB gradient that compresses like a photo.
pub(crate) fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let noise = ((x * 7919 + y * 104729) % 37) as u8;
        Rgb([
            ((x * 255) / width.max(1)) as u8 ^ noise,
            ((y * 255) / height.max(1)) as u8,
            ((x + y) % 256) as u8,
        ])
    })
}

pub(crate) fn jpeg_bytes(picture: &RgbImage, quality: u8) -> Vec<u8> {
    let mut buffer = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
    picture.write_with_encoder(encoder).unwrap();
    buffer
}

pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let picture = DynamicImage::ImageRgb8(gradient(width, height));
    let mut buffer = Vec::new();
    picture
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

pub(crate) fn png_with_alpha(width: u32, height: u32) -> Vec<u8> {
    let picture = DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, _| {
        Rgba([200, 10, 10, (x % 256) as u8])
    }));
    let mut buffer = Vec::new();
    picture
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

/// Decoded content operations of every page, in page order.
pub(crate) fn page_operations(bytes: &[u8]) -> Vec<Vec<lopdf::content::Operation>> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|page_id| {
            let content = doc.get_page_content(*page_id).unwrap();
            Content::decode(&content).unwrap().operations
        })
        .collect()
}

/// Strings shown with `Tj` on each page.
pub(crate) fn shown_text(bytes: &[u8]) -> Vec<Vec<String>> {
    page_operations(bytes)
        .into_iter()
        .map(|ops| {
            ops.iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| match op.operands.first() {
                    Some(Object::String(text, _)) => Some(String::from_utf8_lossy(text).into_owned()),
                    _ => None,
                })
                .collect()
        })
        .collect()
}
