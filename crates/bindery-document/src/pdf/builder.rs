// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document builder. Assembles a new document from copied and generated pages,
// applies decorations, and serialises the result.

use std::collections::HashMap;

use bindery_core::{
    Anchor, BinderyError, Bookmark, DocumentMetadata, EngineConfig, PageNumbering, Result, Rgb,
    TitlePage, Watermark, WatermarkPosition,
};
use chrono::Utc;
use lopdf::content::Operation;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use tracing::{debug, info, instrument};

use super::clone::PageCopier;
use super::objects::{encode_text, inherited, media_box, page_rect, resolve};
use super::outline::write_outline;
use super::stamp::{self, GSTATE_PREFIX, STAMP_FONT};
use super::writer::render_title_page;
use crate::layout::{PageFrame, Rect, format_page_number, text_position, text_width};
use crate::source::SourceDocument;

/// Letter, for copied pages without a readable MediaBox.
const FALLBACK_BOX: Rect = Rect {
    x: 0.0,
    y: 0.0,
    width: 612.0,
    height: 792.0,
};

const IDENTITY: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Lifecycle of one build. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildStage {
    Init,
    CopyingPages,
    Decorating,
    Finalized,
}

/// Result of copying pages from one source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopiedPages {
    /// Output page number of the first copied page; `None` when every
    /// requested page was skipped.
    pub first_page: Option<u32>,
    /// Source page number -> output page number.
    pub page_map: HashMap<u32, u32>,
    pub skipped_blank: u32,
}

impl CopiedPages {
    pub fn copied(&self) -> u32 {
        self.page_map.len() as u32
    }

    /// Re-target `bookmarks` from source pages to output pages.
    ///
    /// An entry whose page was not copied is dropped, and its surviving
    /// children take its place in the parent list.
    pub fn remap(&self, bookmarks: &[Bookmark]) -> Vec<Bookmark> {
        bookmarks
            .iter()
            .flat_map(|bookmark| {
                let children = self.remap(&bookmark.children);
                match self.page_map.get(&bookmark.page) {
                    Some(&page) => vec![Bookmark {
                        title: bookmark.title.clone(),
                        page,
                        children,
                    }],
                    None => children,
                }
            })
            .collect()
    }
}

/// Builds one output document.
pub struct DocumentBuilder {
    config: EngineConfig,
    doc: Document,
    pages_id: ObjectId,
    pages: Vec<ObjectId>,
    /// Visible box and rotation of each output page.
    frames: Vec<PageFrame>,
    /// Decorations queued per page, drawn over the content on finish.
    overlays: Vec<Vec<Operation>>,
    bookmarks: Vec<Bookmark>,
    metadata: DocumentMetadata,
    stage: BuildStage,
    font_id: Option<ObjectId>,
    /// Opacity in thousandths -> (resource name, object id).
    gstates: HashMap<u32, (String, ObjectId)>,
}

impl DocumentBuilder {
    // -- Construction ---------------------------------------------------------

    pub fn new(config: &EngineConfig) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        Self {
            config: config.clone(),
            doc,
            pages_id,
            pages: Vec::new(),
            frames: Vec::new(),
            overlays: Vec::new(),
            bookmarks: Vec::new(),
            metadata: DocumentMetadata::default(),
            stage: BuildStage::Init,
            font_id: None,
            gstates: HashMap::new(),
        }
    }

    pub fn stage(&self) -> BuildStage {
        self.stage
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn enter(&mut self, stage: BuildStage) -> Result<()> {
        if self.stage == BuildStage::Finalized {
            return Err(BinderyError::invalid("document is already finalized"));
        }
        if stage < self.stage {
            return Err(BinderyError::invalid(format!(
                "cannot return to {stage:?} from {:?}",
                self.stage
            )));
        }
        if stage == BuildStage::Decorating && self.pages.is_empty() {
            return Err(BinderyError::invalid("no pages to decorate"));
        }
        self.stage = stage;
        Ok(())
    }

    // -- Copying pages ---------------------------------------------------------

    /// Render `title_page` at `width` x `height` points and insert it as
    /// output page 1. Its title, author and subject become the document's.
    pub fn insert_title_page(&mut self, title_page: &TitlePage, width: f32, height: f32) -> Result<()> {
        self.enter(BuildStage::CopyingPages)?;
        if !self.pages.is_empty() {
            return Err(BinderyError::invalid("the title page must be the first page"));
        }

        let rendered = render_title_page(title_page, width, height);
        let source = SourceDocument::open(&rendered)?;
        self.copy_pages(&source, 1..=1, false)?;

        self.metadata.title = Some(title_page.title.clone());
        if title_page.author.is_some() {
            self.metadata.author = title_page.author.clone();
        }
        if title_page.subject.is_some() {
            self.metadata.subject = title_page.subject.clone();
        }
        Ok(())
    }

    /// Append pages `pages` (1-based, in the given order) of `source`.
    ///
    /// With `skip_blank`, pages that [`SourceDocument::is_blank`] reports as
    /// blank are left out.
    #[instrument(skip_all, fields(source = source.name().unwrap_or("unnamed"), skip_blank))]
    pub fn copy_pages(
        &mut self,
        source: &SourceDocument,
        pages: impl IntoIterator<Item = u32>,
        skip_blank: bool,
    ) -> Result<CopiedPages> {
        self.enter(BuildStage::CopyingPages)?;

        let mut selected = Vec::new();
        let mut result = CopiedPages::default();
        for page in pages {
            let page_id = source.page_id(page)?;
            if skip_blank && source.is_blank(page) {
                debug!(page, "Skipping blank page");
                result.skipped_blank += 1;
                continue;
            }
            selected.push((page, page_id));
        }

        let ids: Vec<ObjectId> = selected.iter().map(|(_, id)| *id).collect();
        let mut copier = PageCopier::new(source.document(), &mut self.doc, &ids);
        for (page, page_id) in selected {
            let new_id = copier.copy_page(&mut self.doc, page_id, self.pages_id)?;
            let frame = read_frame(&self.doc, new_id);
            let output_page = self.push_page(new_id, frame);
            result.first_page.get_or_insert(output_page);
            result.page_map.insert(page, output_page);
        }

        debug!(
            copied = result.copied(),
            skipped = result.skipped_blank,
            "Source pages copied"
        );
        Ok(result)
    }

    /// Append a generated `width` x `height` page drawing `operations` with
    /// `resources`. Returns its output page number.
    pub fn add_page(
        &mut self,
        width: f32,
        height: f32,
        operations: Vec<Operation>,
        resources: Dictionary,
    ) -> Result<u32> {
        self.enter(BuildStage::CopyingPages)?;
        let content = stamp::encode(operations)?;
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), content));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(width),
                Object::Real(height),
            ],
            "Contents" => content_id,
            "Resources" => resources,
        });
        Ok(self.push_page(page_id, PageFrame::upright(Rect::new(0.0, 0.0, width, height))))
    }

    /// Add an object (an image XObject, for instance) to the output.
    pub(crate) fn add_object(&mut self, object: impl Into<Object>) -> ObjectId {
        self.doc.add_object(object)
    }

    fn push_page(&mut self, page_id: ObjectId, frame: PageFrame) -> u32 {
        self.pages.push(page_id);
        self.frames.push(frame);
        self.overlays.push(Vec::new());
        self.pages.len() as u32
    }

    pub fn add_bookmark(&mut self, bookmark: Bookmark) {
        self.bookmarks.push(bookmark);
    }

    /// Fill metadata fields that are still unset.
    pub fn fill_metadata(&mut self, metadata: &DocumentMetadata) {
        let fill = |slot: &mut Option<String>, value: &Option<String>| {
            if slot.is_none() {
                slot.clone_from(value);
            }
        };
        fill(&mut self.metadata.title, &metadata.title);
        fill(&mut self.metadata.author, &metadata.author);
        fill(&mut self.metadata.subject, &metadata.subject);
        fill(&mut self.metadata.keywords, &metadata.keywords);
        fill(&mut self.metadata.creator, &metadata.creator);
    }

    // -- Decorating -----------------------------------------------------------

    /// Stamp a page number on every output page.
    pub fn stamp_page_numbers(&mut self, numbering: &PageNumbering) -> Result<()> {
        numbering.validate(self.page_count())?;
        self.enter(BuildStage::Decorating)?;
        let font = self.stamp_font();
        let last = numbering.last_number(self.page_count())?;

        for (index, number) in (numbering.start_at..=last).enumerate() {
            let label = format_page_number(number, last, numbering.style);
            let (x, y) = anchored(self.frames[index], &label, numbering.font_size, numbering.position);
            stamp::add_page_resource(&mut self.doc, self.pages[index], "Font", STAMP_FONT, font)?;
            self.overlays[index].extend(stamp::text(
                &label,
                x,
                y,
                numbering.font_size,
                numbering.color,
            ));
        }
        debug!(pages = self.pages.len(), style = ?numbering.style, "Page numbers stamped");
        Ok(())
    }

    /// Stamp `watermark` on every output page.
    pub fn stamp_watermark(&mut self, watermark: &Watermark) -> Result<()> {
        watermark.validate()?;
        self.enter(BuildStage::Decorating)?;
        let font = self.stamp_font();
        let (gstate_name, gstate) = self.gstate(watermark.opacity);
        let width = text_width(&watermark.text, watermark.font_size);

        for index in 0..self.pages.len() {
            let frame = self.frames[index];
            let ((x, y), centred) = match watermark.position {
                WatermarkPosition::Center => {
                    let (width, height) = frame.display_size();
                    ((width / 2.0, height / 2.0), true)
                }
                WatermarkPosition::At(anchor) => (
                    anchored(frame, &watermark.text, watermark.font_size, anchor),
                    false,
                ),
            };
            let page_id = self.pages[index];
            stamp::add_page_resource(&mut self.doc, page_id, "Font", STAMP_FONT, font)?;
            stamp::add_page_resource(&mut self.doc, page_id, "ExtGState", &gstate_name, gstate)?;
            self.overlays[index].extend(stamp::rotated_text(
                &watermark.text,
                x,
                y,
                watermark.rotation_degrees,
                watermark.font_size,
                watermark.color,
                &gstate_name,
                width,
                centred,
            ));
        }
        debug!(pages = self.pages.len(), text = %watermark.text, "Watermark stamped");
        Ok(())
    }

    /// Stamp the same line of text at `anchor` on every output page.
    pub fn stamp_text(&mut self, text: &str, anchor: Anchor, font_size: f32, color: Rgb) -> Result<()> {
        self.enter(BuildStage::Decorating)?;
        let font = self.stamp_font();
        for index in 0..self.pages.len() {
            let (x, y) = anchored(self.frames[index], text, font_size, anchor);
            stamp::add_page_resource(&mut self.doc, self.pages[index], "Font", STAMP_FONT, font)?;
            self.overlays[index].extend(stamp::text(text, x, y, font_size, color));
        }
        Ok(())
    }

    fn stamp_font(&mut self) -> ObjectId {
        if let Some(font) = self.font_id {
            return font;
        }
        let font = self.doc.add_object(stamp::helvetica());
        self.font_id = Some(font);
        font
    }

    fn gstate(&mut self, opacity: f32) -> (String, ObjectId) {
        let key = (opacity.clamp(0.0, 1.0) * 1000.0).round() as u32;
        if let Some(existing) = self.gstates.get(&key) {
            return existing.clone();
        }
        let name = format!("{GSTATE_PREFIX}{}", self.gstates.len());
        let id = self.doc.add_object(stamp::transparency(opacity));
        self.gstates.insert(key, (name.clone(), id));
        (name, id)
    }

    // -- Finalizing -----------------------------------------------------------

    /// Write outline, metadata and page tree, then serialise.
    ///
    /// `print_ready` asks viewers not to scale when printing and always
    /// flate-compresses streams.
    #[instrument(skip(self), fields(pages = self.pages.len()))]
    pub fn finish(&mut self, print_ready: bool) -> Result<Vec<u8>> {
        if self.stage == BuildStage::Finalized {
            return Err(BinderyError::invalid("document is already finalized"));
        }
        if self.pages.is_empty() {
            return Err(BinderyError::invalid("output document would have no pages"));
        }

        let mut doc = std::mem::replace(&mut self.doc, Document::with_version("1.5"));
        self.stage = BuildStage::Finalized;

        let overlays = std::mem::take(&mut self.overlays);
        for ((page_id, frame), overlay) in self.pages.iter().zip(&self.frames).zip(overlays) {
            if overlay.is_empty() {
                continue;
            }
            // Decorations are laid out in display space.
            let matrix = frame.display_matrix();
            let overlay = if matrix == IDENTITY {
                overlay
            } else {
                let mut placed = vec![stamp::transform(matrix)];
                placed.extend(overlay);
                placed
            };
            stamp::overlay_page(&mut doc, *page_id, overlay)?;
        }

        let kids: Vec<Object> = self.pages.iter().map(|id| Object::Reference(*id)).collect();
        doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.pages.len() as i64,
            }),
        );

        write_outline(&mut doc, &self.bookmarks, &self.pages);
        self.write_info(&mut doc);

        if print_ready {
            let catalog = doc
                .catalog_mut()
                .map_err(|err| BinderyError::Encode(format!("no catalog: {err}")))?;
            catalog.set(
                "ViewerPreferences",
                dictionary! { "PrintScaling" => "None" },
            );
        }
        if print_ready || self.config.compress_output {
            doc.compress();
        }

        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|err| BinderyError::Encode(format!("failed to serialise document: {err}")))?;

        info!(
            pages = self.pages.len(),
            bookmarks = self.bookmarks.len(),
            output_bytes = output.len(),
            "Document finalized"
        );
        Ok(output)
    }

    fn write_info(&self, doc: &mut Document) {
        let mut info = Dictionary::new();
        let fields = [
            ("Title", &self.metadata.title),
            ("Author", &self.metadata.author),
            ("Subject", &self.metadata.subject),
            ("Keywords", &self.metadata.keywords),
            ("Creator", &self.metadata.creator),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                info.set(key, encode_text(value));
            }
        }
        info.set("Producer", encode_text(&self.config.producer));
        let created = Utc::now().format("D:%Y%m%d%H%M%SZ").to_string();
        info.set("CreationDate", encode_text(&created));

        let info_id = doc.add_object(info);
        doc.trailer.set("Info", info_id);
    }
}

/// Baseline origin of `text` at `anchor`, in the display space of `frame`.
fn anchored(frame: PageFrame, text: &str, font_size: f32, anchor: Anchor) -> (f32, f32) {
    let (width, height) = frame.display_size();
    text_position(width, height, text_width(text, font_size), anchor)
}

/// Visible box and display rotation of a page in `doc`.
fn read_frame(doc: &Document, page_id: ObjectId) -> PageFrame {
    let to_rect = |[x0, y0, x1, y1]: [f32; 4]| {
        Rect::new(x0.min(x1), y0.min(y1), (x1 - x0).abs(), (y1 - y0).abs())
    };
    let media = media_box(doc, page_id).map(to_rect).unwrap_or(FALLBACK_BOX);
    let crop = page_rect(doc, page_id, b"CropBox").map(to_rect);
    let rotate = inherited(doc, page_id, b"Rotate")
        .and_then(|rotate| resolve(doc, rotate).as_i64().ok())
        .unwrap_or(0);
    PageFrame::from_boxes(media, crop, rotate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, FixturePage};
    use crate::pdf::objects::as_number;

    fn builder() -> DocumentBuilder {
        DocumentBuilder::new(&EngineConfig::default())
    }

    #[test]
    fn stages_only_move_forward() {
        let source = SourceDocument::open(&fixtures::pdf_with_pages(2)).unwrap();
        let mut builder = builder();
        assert_eq!(builder.stage(), BuildStage::Init);
        assert!(builder.stamp_page_numbers(&PageNumbering::default()).is_err());

        builder.copy_pages(&source, 1..=2, false).unwrap();
        assert_eq!(builder.stage(), BuildStage::CopyingPages);
        builder.stamp_page_numbers(&PageNumbering::default()).unwrap();
        assert_eq!(builder.stage(), BuildStage::Decorating);
        assert!(builder.copy_pages(&source, 1..=1, false).is_err());

        builder.finish(false).unwrap();
        assert_eq!(builder.stage(), BuildStage::Finalized);
        assert!(builder.finish(false).is_err());
    }

    #[test]
    fn copied_pages_keep_their_text() {
        let first = SourceDocument::open(&fixtures::pdf_labelled("Alpha", 2)).unwrap();
        let second = SourceDocument::open(&fixtures::pdf_labelled("Beta", 1)).unwrap();
        let mut builder = builder();
        builder.copy_pages(&first, [2, 1], false).unwrap();
        let copied = builder.copy_pages(&second, 1..=1, false).unwrap();
        assert_eq!(copied.first_page, Some(3));

        let bytes = builder.finish(false).unwrap();
        let texts = fixtures::shown_text(&bytes);
        assert_eq!(texts, [vec!["Alpha 2"], vec!["Alpha 1"], vec!["Beta 1"]]);
    }

    #[test]
    fn blank_pages_are_skipped_on_request() {
        let source = SourceDocument::open(&fixtures::pdf_from_pages(&[
            FixturePage::Text("one"),
            FixturePage::Blank,
            FixturePage::Text("three"),
        ]))
        .unwrap();
        let mut builder = builder();
        let copied = builder.copy_pages(&source, 1..=3, true).unwrap();
        assert_eq!(copied.skipped_blank, 1);
        assert_eq!(copied.page_map.get(&3), Some(&2));
        assert_eq!(builder.page_count(), 2);
    }

    #[test]
    fn title_page_comes_first_and_sets_metadata() {
        let source = SourceDocument::open(&fixtures::pdf_with_metadata(1, "Old", "Someone")).unwrap();
        let mut builder = builder();
        let title = TitlePage {
            title: "Bound Volume".into(),
            author: None,
            subject: Some("Collected papers".into()),
        };
        builder.insert_title_page(&title, 612.0, 792.0).unwrap();
        let copied = builder.copy_pages(&source, 1..=1, false).unwrap();
        builder.fill_metadata(source.metadata());
        assert_eq!(copied.first_page, Some(2));

        let bytes = builder.finish(false).unwrap();
        let output = SourceDocument::open(&bytes).unwrap();
        assert_eq!(output.page_count(), 2);
        assert_eq!(output.metadata().title.as_deref(), Some("Bound Volume"));
        assert_eq!(output.metadata().author.as_deref(), Some("Someone"));
        assert_eq!(output.metadata().subject.as_deref(), Some("Collected papers"));
        assert_eq!(output.metadata().producer.as_deref(), Some("Bindery"));
    }

    #[test]
    fn remap_follows_copied_pages() {
        let mut copied = CopiedPages::default();
        copied.page_map.insert(2, 5);
        copied.page_map.insert(3, 6);
        let mut chapter = Bookmark::new("Chapter", 2);
        chapter.children.push(Bookmark::new("Dropped", 4));
        chapter.children.push(Bookmark::new("Kept", 3));

        let remapped = copied.remap(&[chapter, Bookmark::new("Gone", 1)]);
        assert_eq!(remapped.len(), 1);
        assert_eq!(remapped[0].page, 5);
        assert_eq!(remapped[0].children, vec![Bookmark::new("Kept", 6)]);
    }

    #[test]
    fn remap_promotes_children_of_uncopied_entries() {
        let mut copied = CopiedPages::default();
        copied.page_map.insert(3, 1);
        copied.page_map.insert(4, 2);
        let mut chapter = Bookmark::new("Chapter", 1);
        chapter.children.push(Bookmark::new("Section", 4));
        chapter.children.push(Bookmark::new("Gone", 2));

        let remapped = copied.remap(&[chapter, Bookmark::new("Appendix", 3)]);
        assert_eq!(
            remapped,
            vec![Bookmark::new("Section", 2), Bookmark::new("Appendix", 1)]
        );
    }

    /// Page number stamp on the single page of `bytes`: the `cm` operands
    /// (if any) and the `Td` origin.
    fn number_placement(bytes: &[u8]) -> (Option<Vec<f32>>, (f32, f32)) {
        let ops = fixtures::page_operations(bytes).remove(0);
        let numbers = |op: &Operation| -> Vec<f32> {
            op.operands.iter().map(|o| as_number(o).unwrap()).collect()
        };
        let cm = ops.iter().rfind(|op| op.operator == "cm").map(numbers);
        let td = numbers(ops.iter().rfind(|op| op.operator == "Td").unwrap());
        (cm, (td[0], td[1]))
    }

    fn stamp_bottom_right(bytes: &[u8]) -> Vec<u8> {
        let source = SourceDocument::open(bytes).unwrap();
        let mut builder = builder();
        builder.copy_pages(&source, 1..=1, false).unwrap();
        builder
            .stamp_page_numbers(&PageNumbering {
                position: Anchor::BottomRight,
                ..PageNumbering::default()
            })
            .unwrap();
        builder.finish(false).unwrap()
    }

    #[test]
    fn numbers_follow_page_rotation() {
        let bytes = stamp_bottom_right(&fixtures::pdf_with_page_geometry(90, None));
        let (cm, (x, y)) = number_placement(&bytes);
        // Displayed 792 wide; "1" at 10pt is 5pt wide.
        assert_eq!((x, y), (767.0, 20.0));
        assert_eq!(cm, Some(vec![0.0, 1.0, -1.0, 0.0, 612.0, 0.0]));
    }

    #[test]
    fn numbers_stay_inside_the_crop_box() {
        let crop = [100.0, 100.0, 400.0, 500.0];
        let bytes = stamp_bottom_right(&fixtures::pdf_with_page_geometry(0, Some(crop)));
        let (cm, (x, y)) = number_placement(&bytes);
        assert_eq!((x, y), (275.0, 20.0));
        assert_eq!(cm, Some(vec![1.0, 0.0, 0.0, 1.0, 100.0, 100.0]));
    }

    #[test]
    fn upright_pages_need_no_transform() {
        let bytes = stamp_bottom_right(&fixtures::pdf_with_pages(1));
        let (cm, (x, y)) = number_placement(&bytes);
        assert_eq!(cm, None);
        assert_eq!((x, y), (587.0, 20.0));
    }

    #[test]
    fn overflowing_page_numbers_are_rejected() {
        let source = SourceDocument::open(&fixtures::pdf_with_pages(2)).unwrap();
        let mut builder = builder();
        builder.copy_pages(&source, 1..=2, false).unwrap();
        let numbering = PageNumbering {
            start_at: u32::MAX,
            ..PageNumbering::default()
        };
        let err = builder.stamp_page_numbers(&numbering).unwrap_err();
        assert!(matches!(err, BinderyError::InvalidOptions(_)));
    }

    #[test]
    fn print_ready_sets_viewer_preferences() {
        let source = SourceDocument::open(&fixtures::pdf_with_pages(1)).unwrap();
        let mut builder = builder();
        builder.copy_pages(&source, 1..=1, false).unwrap();
        let bytes = builder.finish(true).unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let prefs = doc.catalog().unwrap().get(b"ViewerPreferences").unwrap();
        let prefs = crate::pdf::objects::dictionary(&doc, prefs).unwrap();
        assert_eq!(prefs.get(b"PrintScaling").unwrap().as_name().unwrap(), b"None");
    }
}
