// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content-stream fragments for decorations (text stamps, watermarks, fills,
// borders, image placement) and the plumbing that overlays them on a page.

use bindery_core::{BinderyError, Result, Rgb};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};

use super::objects::{dictionary, win_ansi_bytes};
use crate::layout::Rect;

/// Resource name of the Helvetica font added for stamps.
pub(crate) const STAMP_FONT: &str = "BdHelv";

/// Resource-name prefix of the transparency states added for watermarks.
pub(crate) const GSTATE_PREFIX: &str = "BdGs";

fn real(value: f32) -> Object {
    Object::Real(value)
}

fn colour_operands(color: Rgb) -> Vec<Object> {
    let color = color.clamped();
    vec![real(color.r), real(color.g), real(color.b)]
}

/// Standard Type1 Helvetica with WinAnsi encoding.
pub(crate) fn helvetica() -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Graphics state with fill and stroke alpha set to `opacity`.
pub(crate) fn transparency(opacity: f32) -> Dictionary {
    dictionary! {
        "Type" => "ExtGState",
        "ca" => real(opacity),
        "CA" => real(opacity),
    }
}

// -- Operation builders -------------------------------------------------------

/// One line of Helvetica text with its baseline origin at `(x, y)`.
pub(crate) fn text(value: &str, x: f32, y: f32, font_size: f32, color: Rgb) -> Vec<Operation> {
    let mut ops = vec![Operation::new("BT", vec![])];
    ops.push(Operation::new(
        "Tf",
        vec![Object::Name(STAMP_FONT.as_bytes().to_vec()), real(font_size)],
    ));
    ops.push(Operation::new("rg", colour_operands(color)));
    ops.push(Operation::new("Td", vec![real(x), real(y)]));
    ops.push(show(value));
    ops.push(Operation::new("ET", vec![]));
    ops
}

/// Text rotated by `degrees` around `(x, y)`, drawn through graphics state
/// `gstate`. With `centred` the text's midpoint sits on the pivot instead of
/// its baseline start.
#[allow(clippy::too_many_arguments)]
pub(crate) fn rotated_text(
    value: &str,
    x: f32,
    y: f32,
    degrees: f32,
    font_size: f32,
    color: Rgb,
    gstate: &str,
    text_width: f32,
    centred: bool,
) -> Vec<Operation> {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let mut ops = vec![
        Operation::new("q", vec![]),
        Operation::new("gs", vec![Object::Name(gstate.as_bytes().to_vec())]),
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(STAMP_FONT.as_bytes().to_vec()), real(font_size)],
        ),
        Operation::new("rg", colour_operands(color)),
        Operation::new(
            "Tm",
            vec![real(cos), real(sin), real(-sin), real(cos), real(x), real(y)],
        ),
    ];
    if centred {
        // Cap height of Helvetica is roughly 0.7 em; centre on half of it.
        ops.push(Operation::new(
            "Td",
            vec![real(-text_width / 2.0), real(-font_size * 0.35)],
        ));
    }
    ops.push(show(value));
    ops.push(Operation::new("ET", vec![]));
    ops.push(Operation::new("Q", vec![]));
    ops
}

fn show(value: &str) -> Operation {
    Operation::new(
        "Tj",
        vec![Object::String(win_ansi_bytes(value), StringFormat::Literal)],
    )
}

/// Solid fill of `rect`.
pub(crate) fn fill_rect(rect: Rect, color: Rgb) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new("rg", colour_operands(color)),
        Operation::new(
            "re",
            vec![real(rect.x), real(rect.y), real(rect.width), real(rect.height)],
        ),
        Operation::new("f", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// Stroke around `rect` with the given line width.
pub(crate) fn stroke_rect(rect: Rect, width: f32, color: Rgb) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new("w", vec![real(width)]),
        Operation::new("RG", colour_operands(color)),
        Operation::new(
            "re",
            vec![real(rect.x), real(rect.y), real(rect.width), real(rect.height)],
        ),
        Operation::new("S", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// Paint image XObject `name` into `rect`.
pub(crate) fn draw_image(name: &str, rect: Rect) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                real(rect.width),
                real(0.0),
                real(0.0),
                real(rect.height),
                real(rect.x),
                real(rect.y),
            ],
        ),
        Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

/// Concatenate `matrix` onto the current transformation.
pub(crate) fn transform(matrix: [f32; 6]) -> Operation {
    Operation::new("cm", matrix.into_iter().map(real).collect())
}

pub(crate) fn encode(operations: Vec<Operation>) -> Result<Vec<u8>> {
    Content { operations }
        .encode()
        .map_err(|err| BinderyError::Encode(format!("failed to encode content stream: {err}")))
}

// -- Page plumbing ------------------------------------------------------------

/// Register `value` as `/category /name` in the page's own resources.
///
/// Referenced or inherited resource dictionaries are copied onto the page
/// first so the change never leaks into other pages sharing them.
pub(crate) fn add_page_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &str,
    name: &str,
    value: ObjectId,
) -> Result<()> {
    let page = doc
        .get_dictionary(page_id)
        .map_err(|err| BinderyError::Encode(format!("missing page {page_id:?}: {err}")))?;
    let mut resources = page
        .get(b"Resources")
        .ok()
        .and_then(|resources| dictionary(doc, resources))
        .cloned()
        .unwrap_or_else(Dictionary::new);
    let mut entries = resources
        .get(category.as_bytes())
        .ok()
        .and_then(|entries| dictionary(doc, entries))
        .cloned()
        .unwrap_or_else(Dictionary::new);
    entries.set(name, Object::Reference(value));
    resources.set(category, Object::Dictionary(entries));

    doc.get_dictionary_mut(page_id)
        .map_err(|err| BinderyError::Encode(format!("missing page {page_id:?}: {err}")))?
        .set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Wrap the page's existing content in `q ... Q` and append `overlay` after
/// it, so decorations draw on top with a clean graphics state.
pub(crate) fn overlay_page(doc: &mut Document, page_id: ObjectId, overlay: Vec<Operation>) -> Result<()> {
    let stream_refs = |items: &[Object]| -> Vec<Object> {
        items
            .iter()
            .filter(|item| matches!(item, Object::Reference(_)))
            .cloned()
            .collect()
    };
    let existing: Vec<Object> = match doc
        .get_dictionary(page_id)
        .map_err(|err| BinderyError::Encode(format!("missing page {page_id:?}: {err}")))?
        .get(b"Contents")
    {
        // An indirect array of streams is flattened into the new array.
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => stream_refs(items),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => stream_refs(items),
        _ => Vec::new(),
    };

    let mut suffix = vec![Operation::new("Q", vec![])];
    suffix.extend(overlay);
    let prefix_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    // Readers concatenate content streams verbatim; keep tokens apart.
    let mut suffix_bytes = b"\n".to_vec();
    suffix_bytes.extend(encode(suffix)?);
    let suffix_id = doc.add_object(Stream::new(Dictionary::new(), suffix_bytes));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(prefix_id));
    contents.extend(existing);
    contents.push(Object::Reference(suffix_id));

    doc.get_dictionary_mut(page_id)
        .map_err(|err| BinderyError::Encode(format!("missing page {page_id:?}: {err}")))?
        .set("Contents", Object::Array(contents));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn text_stamp_positions_and_shows() {
        let ops = text("12", 100.0, 20.0, 10.0, Rgb::BLACK);
        let operators: Vec<&str> = ops.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(operators, ["BT", "Tf", "rg", "Td", "Tj", "ET"]);
        assert_eq!(ops[3].operands, vec![real(100.0), real(20.0)]);
    }

    #[test]
    fn rotated_text_uses_graphics_state() {
        let ops = rotated_text("DRAFT", 300.0, 400.0, 90.0, 48.0, Rgb::GRAY, "BdGs0", 120.0, true);
        assert_eq!(ops[1].operands, vec![Object::Name(b"BdGs0".to_vec())]);
        let tm = ops.iter().find(|op| op.operator == "Tm").unwrap();
        let Object::Real(sin) = tm.operands[1] else {
            panic!("expected a real operand");
        };
        assert!((sin - 1.0).abs() < 1e-6);
        assert!(ops.iter().any(|op| op.operator == "Td"));
    }

    #[test]
    fn overlay_keeps_shared_resources_untouched() {
        let mut doc = Document::load_mem(&fixtures::pdf_with_pages(2)).unwrap();
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        let font_id = doc.add_object(helvetica());

        add_page_resource(&mut doc, pages[0], "Font", STAMP_FONT, font_id).unwrap();
        overlay_page(&mut doc, pages[0], text("1", 20.0, 20.0, 10.0, Rgb::BLACK)).unwrap();

        let fonts = |page: ObjectId| {
            let page = doc.get_dictionary(page).unwrap();
            let resources = dictionary(&doc, page.get(b"Resources").unwrap()).unwrap();
            dictionary(&doc, resources.get(b"Font").unwrap()).unwrap().len()
        };
        assert_eq!(fonts(pages[0]), 2);
        assert_eq!(fonts(pages[1]), 1);

        let page = doc.get_dictionary(pages[0]).unwrap();
        let Ok(Object::Array(contents)) = page.get(b"Contents") else {
            panic!("contents should become an array");
        };
        assert_eq!(contents.len(), 3);
        let text = String::from_utf8(doc.get_page_content(pages[0]).unwrap()).unwrap();
        assert!(text.trim_start().starts_with('q'));
        assert!(text.contains("BdHelv"));
    }
}
