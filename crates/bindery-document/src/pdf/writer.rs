// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Title page generation with `printpdf` 0.8.
//
// printpdf builds pages from `Vec<Op>` operation lists; the one-page result is
// serialised and then copied into the output like any other source page.

use bindery_core::TitlePage;
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, TextItem,
};
use tracing::{debug, instrument};

use crate::layout::text_width;

const MM_PER_PT: f32 = 25.4 / 72.0;

const TITLE_SIZE: f32 = 28.0;
const AUTHOR_SIZE: f32 = 16.0;
const SUBJECT_SIZE: f32 = 13.0;
const LINE_GAP: f32 = 1.6;

/// Render a single centred title page of `width` x `height` points.
#[instrument(skip(title_page), fields(title = %title_page.title))]
pub(crate) fn render_title_page(title_page: &TitlePage, width: f32, height: f32) -> Vec<u8> {
    let mut lines: Vec<(&str, f32)> = vec![(title_page.title.as_str(), TITLE_SIZE)];
    if let Some(author) = title_page.author.as_deref() {
        lines.push((author, AUTHOR_SIZE));
    }
    if let Some(subject) = title_page.subject.as_deref() {
        lines.push((subject, SUBJECT_SIZE));
    }

    // The block starts a little above the vertical centre.
    let mut baseline = height * 0.62;
    let mut ops: Vec<Op> = Vec::new();
    for (text, size) in lines {
        if text.trim().is_empty() {
            continue;
        }
        let x = ((width - text_width(text, size)) / 2.0).max(0.0);
        ops.push(Op::StartTextSection);
        ops.push(Op::SetTextCursor {
            pos: Point {
                x: Pt(x),
                y: Pt(baseline),
            },
        });
        ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(size),
            font: BuiltinFont::Helvetica,
        });
        ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(text.to_string())],
            font: BuiltinFont::Helvetica,
        });
        ops.push(Op::EndTextSection);
        baseline -= size * LINE_GAP;
    }

    let mut doc = PdfDocument::new(&title_page.title);
    doc.with_pages(vec![PdfPage::new(
        Mm(width * MM_PER_PT),
        Mm(height * MM_PER_PT),
        ops,
    )]);

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
    debug!(bytes = output.len(), warnings = warnings.len(), "Title page rendered");
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceDocument;

    #[test]
    fn title_page_has_requested_size() {
        let title_page = TitlePage {
            title: "Quarterly Results".into(),
            author: Some("Finance".into()),
            subject: None,
        };
        let bytes = render_title_page(&title_page, 612.0, 792.0);
        let source = SourceDocument::open(&bytes).unwrap();
        assert_eq!(source.page_count(), 1);
        let dims = source.page_dimensions(1).unwrap();
        assert!((dims.width - 612.0).abs() < 1.0, "{dims:?}");
        assert!((dims.height - 792.0).abs() < 1.0, "{dims:?}");
        assert!(!source.is_blank(1));
    }
}
