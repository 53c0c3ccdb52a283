//! Study-notes documents
//!
//! Turns a chapter's question records into flow elements (header, titles,
//! one block group per question, footer), composes them onto watermarked A4
//! pages and writes the PDF.

use crate::answers::{parse_answers, QaRecord};
use crate::canvas::Color;
use crate::composer::{Document, PageComposer, PageGeometry};
use crate::config::LayoutConfig;
use crate::decorator::Watermark;
use crate::error::Result;
use crate::flow::{Align, FlowElement, RtlTextBlock, Run, Separator, TextBlock, TextStyle};
use crate::fonts::{FontContext, FontId};
use crate::pdf_canvas::{PdfCanvas, PdfMetadata};
use crate::shaping::ShapeCache;
use log::info;
use std::fs;
use std::path::Path;

/// Label drawn above every Urdu answer.
pub const URDU_ANSWER_LABEL: &str = "جواب (اردو):";
pub const NO_QUESTIONS_TEXT: &str = "No questions found in the processed data.";
pub const URDU_MISSING_LABEL: &str = "Jawab (Urdu):";
pub const URDU_MISSING_TEXT: &str = "Urdu text not available";

const HEADER_COLOR: u32 = 0x7F8C8D;
const TITLE_COLOR: u32 = 0x2C3E50;
const QUESTION_COLOR: u32 = 0x34495E;
const ENGLISH_COLOR: u32 = 0x2E7D32;
const URDU_COLOR: u32 = 0x1976D2;
const RULE_COLOR: u32 = 0xBDC3C7;
const FOOTER_COLOR: u32 = 0x95A5A6;

fn title_style() -> TextStyle {
    TextStyle::new(26.0, 32.0)
        .color(Color::hex(TITLE_COLOR))
        .align(Align::Center)
        .space_after(18.0)
}

fn english_answer_style() -> TextStyle {
    TextStyle::new(12.0, 18.0).color(Color::hex(ENGLISH_COLOR)).space_after(4.0)
}

/// Flow elements for one chapter, in reading order.
pub fn build_story(
    chapter: &str,
    records: &[QaRecord],
    config: &LayoutConfig,
    cache: &mut ShapeCache,
) -> Vec<FlowElement> {
    let mut story = Vec::new();

    let header = TextStyle::new(10.0, 12.0).color(Color::hex(HEADER_COLOR)).align(Align::Right);
    story.push(
        TextBlock::new(
            vec![
                Run::new(config.header_brand.as_str(), FontId::HelveticaBold),
                Run::new(format!(" | Chapter: {}", chapter), FontId::Helvetica),
            ],
            header,
        )
        .into(),
    );
    story.push(FlowElement::Spacer(16.0));

    story.push(TextBlock::plain(chapter, FontId::HelveticaBold, title_style()).into());
    story.push(TextBlock::plain("Questions & Answers", FontId::HelveticaBold, title_style()).into());
    story.push(FlowElement::Spacer(24.0));

    if records.is_empty() {
        story.push(TextBlock::plain(NO_QUESTIONS_TEXT, FontId::Helvetica, TextStyle::new(10.0, 12.0)).into());
    }

    for (i, record) in records.iter().enumerate() {
        let question = TextStyle::new(14.0, 20.0).color(Color::hex(QUESTION_COLOR)).space_after(6.0);
        story.push(
            TextBlock::plain(
                format!("Q{}. {}", i + 1, record.question),
                FontId::HelveticaBold,
                question,
            )
            .into(),
        );
        story.push(FlowElement::Spacer(2.0));

        story.push(
            TextBlock::new(
                vec![
                    Run::new("Answer (English):", FontId::HelveticaBold),
                    Run::new(format!(" {}", record.answer_en), FontId::Helvetica),
                ],
                english_answer_style(),
            )
            .into(),
        );

        if record.has_urdu() {
            let label = RtlTextBlock::new(cache.shape(URDU_ANSWER_LABEL), FontId::Urdu, 13.0)
                .with_leading(20.0)
                .with_color(Color::hex(URDU_COLOR));
            let answer = RtlTextBlock::new(cache.shape(record.answer_ur.trim()), FontId::Urdu, 14.0)
                .with_leading(22.0)
                .with_color(Color::hex(URDU_COLOR));
            story.push(label.into());
            story.push(answer.into());
        } else {
            story.push(
                TextBlock::new(
                    vec![
                        Run::new(URDU_MISSING_LABEL, FontId::HelveticaBold),
                        Run::new(format!(" {}", URDU_MISSING_TEXT), FontId::Helvetica),
                    ],
                    english_answer_style(),
                )
                .into(),
            );
        }

        story.push(FlowElement::Spacer(8.0));
        story.push(Separator::new(0.85, Color::hex(RULE_COLOR)).into());
        story.push(FlowElement::Spacer(10.0));
    }

    let footer = TextStyle::new(10.0, 12.0).color(Color::hex(FOOTER_COLOR)).align(Align::Center);
    story.push(FlowElement::Spacer(30.0));
    story.push(
        TextBlock::new(
            vec![
                Run::new(config.footer_title.as_str(), FontId::HelveticaBold),
                Run::new(format!("\n{}", config.footer_tagline), FontId::Helvetica),
                Run::new(format!("\n{}", config.footer_motto), FontId::HelveticaOblique),
            ],
            footer,
        )
        .into(),
    );

    story
}

/// A rendered chapter: the PDF bytes and where every element landed.
#[derive(Debug, Clone)]
pub struct RenderedNotes {
    pub pdf: Vec<u8>,
    pub layout: Document,
}

/// Notes PDF generator
pub struct NotesPdfGenerator<'a> {
    fonts: &'a FontContext,
    config: LayoutConfig,
    shape_cache: ShapeCache,
}

impl<'a> NotesPdfGenerator<'a> {
    pub fn new(fonts: &'a FontContext, config: LayoutConfig) -> Self {
        Self {
            fonts,
            config,
            shape_cache: ShapeCache::new(),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn build_story(&mut self, chapter: &str, records: &[QaRecord]) -> Vec<FlowElement> {
        build_story(chapter, records, &self.config, &mut self.shape_cache)
    }

    /// Compose and serialize a chapter without touching the filesystem.
    pub fn render(&mut self, chapter: &str, records: &[QaRecord]) -> Result<RenderedNotes> {
        let mut story = self.build_story(chapter, records);
        let geometry = PageGeometry::from_config(&self.config);
        let watermark = Watermark::from_config(&self.config);
        let metadata = PdfMetadata {
            title: chapter.to_string(),
            producer: self.config.producer.clone(),
        };

        let mut canvas = PdfCanvas::new(self.fonts, &geometry, &metadata)?;
        let layout = PageComposer::new(geometry, self.fonts, &watermark).compose(&mut story, &mut canvas)?;
        let pdf = canvas.finish()?;
        Ok(RenderedNotes { pdf, layout })
    }

    pub fn generate_pdf_bytes(&mut self, chapter: &str, records: &[QaRecord]) -> Result<Vec<u8>> {
        Ok(self.render(chapter, records)?.pdf)
    }

    /// Render a chapter and write it to `output_path` in a single write.
    pub fn generate(&mut self, chapter: &str, records: &[QaRecord], output_path: &Path) -> Result<Document> {
        let rendered = self.render(chapter, records)?;
        fs::write(output_path, &rendered.pdf)?;
        info!(
            "Notes PDF created: {} ({} questions, {} pages)",
            output_path.display(),
            records.len(),
            rendered.layout.page_count()
        );
        Ok(rendered.layout)
    }

    /// Parse a raw model response and render it.
    pub fn generate_from_response(&mut self, chapter: &str, raw_response: &str, output_path: &Path) -> Result<Document> {
        let records = parse_answers(raw_response);
        self.generate(chapter, &records, output_path)
    }
}

/// Create a notes PDF with the process-wide fonts and default layout.
pub fn create_notes_pdf(chapter: &str, records: &[QaRecord], output_path: &Path) -> Result<Document> {
    create_notes_pdf_with_context(chapter, records, output_path, FontContext::shared(), &LayoutConfig::default())
}

/// Create a notes PDF with caller-supplied fonts and layout options.
pub fn create_notes_pdf_with_context(
    chapter: &str,
    records: &[QaRecord],
    output_path: &Path,
    fonts: &FontContext,
    config: &LayoutConfig,
) -> Result<Document> {
    NotesPdfGenerator::new(fonts, config.clone()).generate(chapter, records, output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::RecordingCanvas;
    use crate::decorator::NoDecoration;
    use crate::flow::ElementKind;

    fn kinds(story: &[FlowElement]) -> Vec<ElementKind> {
        story.iter().map(FlowElement::kind).collect()
    }

    #[test]
    fn empty_chapter_gets_placeholder() {
        let story = build_story("Physics", &[], &LayoutConfig::default(), &mut ShapeCache::new());
        let placeholder = story.iter().any(|element| match element {
            FlowElement::Text(block) => block.runs().iter().any(|run| run.text == NO_QUESTIONS_TEXT),
            _ => false,
        });
        assert!(placeholder);
        assert!(!kinds(&story).contains(&ElementKind::Separator));
    }

    #[test]
    fn urdu_answers_become_label_and_answer_blocks() {
        let records = vec![
            QaRecord::new("What is a cell?", "The unit of life.", "زندگی کی بنیادی اکائی"),
            QaRecord::new("What is DNA?", "Genetic material.", ""),
        ];
        let story = build_story("Biology", &records, &LayoutConfig::default(), &mut ShapeCache::new());

        let rtl = kinds(&story).iter().filter(|k| **k == ElementKind::RtlText).count();
        assert_eq!(rtl, 2);
        assert_eq!(kinds(&story).iter().filter(|k| **k == ElementKind::Separator).count(), 2);

        let fallback = story.iter().any(|element| match element {
            FlowElement::Text(block) => block.runs().iter().any(|run| run.text.contains(URDU_MISSING_TEXT)),
            _ => false,
        });
        assert!(fallback);
    }

    #[test]
    fn urdu_label_is_shaped_once_per_chapter() {
        let records = vec![QaRecord::new("a", "b", "ایک"), QaRecord::new("c", "d", "دو")];
        let mut cache = ShapeCache::new();
        build_story("Cache", &records, &LayoutConfig::default(), &mut cache);
        // label plus two answers
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn questions_keep_their_order_on_the_canvas() {
        let records: Vec<QaRecord> = (1..=3)
            .map(|i| QaRecord::new(format!("Question number {i}"), "Answer", if i == 2 { "" } else { "جواب" }))
            .collect();
        let mut story = build_story("Order", &records, &LayoutConfig::default(), &mut ShapeCache::new());
        let fonts = FontContext::builtin_only();
        let mut canvas = RecordingCanvas::new();
        PageComposer::new(PageGeometry::a4(), &fonts, &NoDecoration)
            .compose(&mut story, &mut canvas)
            .unwrap();

        let texts = canvas.texts();
        let position = |word: &str| texts.iter().position(|t| *t == word).unwrap();
        assert!(position("Q1.") < position("Q2."));
        assert!(position("Q2.") < position("Q3."));
        assert_eq!(texts.iter().filter(|t| **t == "available").count(), 1);
    }

    #[test]
    fn renders_a_loadable_pdf_in_memory() {
        let fonts = FontContext::builtin_only();
        let mut generator = NotesPdfGenerator::new(&fonts, LayoutConfig::default());
        let rendered = generator
            .render("Chemistry", &[QaRecord::new("What is an atom?", "Smallest unit.", "ایٹم")])
            .unwrap();
        assert_eq!(rendered.layout.page_count(), 1);
        let document = lopdf::Document::load_mem(&rendered.pdf).unwrap();
        assert_eq!(document.get_pages().len(), 1);
    }
}
