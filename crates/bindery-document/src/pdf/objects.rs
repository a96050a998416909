// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Small helpers over lopdf's object model shared by the reader, builder and
// compressor.

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};

/// Page attributes a page may inherit from its /Pages ancestors.
pub(crate) const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Bound on reference chains and parent walks in malformed files.
const MAX_DEPTH: usize = 64;

/// Follow references until a direct object is reached.
pub(crate) fn resolve<'a>(doc: &'a Document, mut object: &'a Object) -> &'a Object {
    for _ in 0..MAX_DEPTH {
        match object {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(target) => object = target,
                Err(_) => return &Object::Null,
            },
            _ => return object,
        }
    }
    &Object::Null
}

/// Numeric value of an Integer or Real.
pub(crate) fn as_number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}

pub(crate) fn name_of(object: &Object) -> Option<&[u8]> {
    match object {
        Object::Name(name) => Some(name.as_slice()),
        _ => None,
    }
}

/// Dictionary behind `object`, following references.
pub(crate) fn dictionary<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, object) {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// Look up `key` on a page, walking up /Parent for inheritable attributes.
pub(crate) fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// The page's MediaBox as `[x0, y0, x1, y1]`, or `None` if absent or malformed.
pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> Option<[f32; 4]> {
    page_rect(doc, page_id, b"MediaBox")
}

/// A page rectangle such as /MediaBox or /CropBox, resolving inheritance.
pub(crate) fn page_rect(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<[f32; 4]> {
    let object = resolve(doc, inherited(doc, page_id, key)?);
    let Object::Array(values) = object else {
        return None;
    };
    if values.len() != 4 {
        return None;
    }
    let mut rect = [0.0f32; 4];
    for (slot, value) in rect.iter_mut().zip(values) {
        *slot = as_number(resolve(doc, value))?;
    }
    Some(rect)
}

/// Names listed in a stream's /Filter entry (a single name or an array).
pub(crate) fn filter_names(doc: &Document, dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter").map(|filter| resolve(doc, filter)) {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| name_of(resolve(doc, item)).map(<[u8]>::to_vec))
            .collect(),
        _ => Vec::new(),
    }
}

/// Decode a PDF text string: UTF-16BE when it starts with a byte-order mark,
/// PDFDocEncoding (treated as Latin-1) otherwise.
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    if let Some(body) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Encode a text string for /Info or outline titles. ASCII text is kept as a
/// literal string; anything else becomes UTF-16BE with a byte-order mark.
pub(crate) fn encode_text(text: &str) -> Object {
    if text.chars().all(|c| (c as u32) < 0x80) {
        return Object::String(text.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Bytes for a content-stream string drawn with a WinAnsi-encoded standard
/// font. Characters outside Latin-1 become `?`.
pub(crate) fn win_ansi_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) < 0x100 { c as u8 } else { b'?' })
        .collect()
}

/// Text of a string object, if it is one.
pub(crate) fn text_of(doc: &Document, object: &Object) -> Option<String> {
    match resolve(doc, object) {
        Object::String(bytes, _) => Some(decode_text(bytes)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn numbers_from_integer_and_real() {
        assert_eq!(as_number(&Object::Integer(612)), Some(612.0));
        assert_eq!(as_number(&Object::Real(0.5)), Some(0.5));
        assert_eq!(as_number(&Object::Null), None);
    }

    #[test]
    fn utf16_text_round_trips() {
        let encoded = encode_text("Résumé — two");
        let Object::String(bytes, _) = encoded else {
            panic!("expected a string object");
        };
        assert_eq!(decode_text(&bytes), "Résumé — two");
    }

    #[test]
    fn ascii_text_stays_literal() {
        assert_eq!(
            encode_text("Chapter 1"),
            Object::String(b"Chapter 1".to_vec(), StringFormat::Literal)
        );
    }

    #[test]
    fn media_box_is_inherited_from_parent() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        assert_eq!(media_box(&doc, page_id), Some([0.0, 0.0, 595.0, 842.0]));
    }

    #[test]
    fn filter_accepts_name_or_array() {
        let doc = Document::with_version("1.5");
        let single = dictionary! { "Filter" => "DCTDecode" };
        assert_eq!(filter_names(&doc, &single), vec![b"DCTDecode".to_vec()]);
        let chain = dictionary! {
            "Filter" => vec![Object::Name(b"FlateDecode".to_vec()), Object::Name(b"DCTDecode".to_vec())],
        };
        assert_eq!(filter_names(&doc, &chain).len(), 2);
    }

    #[test]
    fn win_ansi_replaces_wide_characters() {
        assert_eq!(win_ansi_bytes("a→b"), b"a?b".to_vec());
    }
}
