use lopdf::content::Content;
use notes_pdf_creator::canvas::{DrawCall, RecordingCanvas};
use notes_pdf_creator::decorator::Watermark;
use notes_pdf_creator::flow::ElementKind;
use notes_pdf_creator::fonts::{FontId, TextMeasure};
use notes_pdf_creator::linebreak::break_lines;
use notes_pdf_creator::notes::{build_story, NO_QUESTIONS_TEXT};
use notes_pdf_creator::shaping::{shape, ShapeCache};
use notes_pdf_creator::{
    FontContext, LayoutConfig, NotesPdfGenerator, PageComposer, PageGeometry, QaRecord,
};
use std::path::PathBuf;

const LONG_URDU: &str = "یہ ایک طویل جواب ہے جو صفحے کی چوڑائی سے زیادہ ہے اور اسے کئی سطروں میں تقسیم ہونا چاہیے تاکہ پڑھنے میں آسانی ہو";

/// A system TrueType face with Arabic presentation forms, when one is installed.
fn system_arabic_font() -> Option<PathBuf> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
    ]
    .iter()
    .map(PathBuf::from)
    .find(|path| path.is_file())
}

fn truetype_fonts() -> Option<FontContext> {
    let Some(path) = system_arabic_font() else {
        eprintln!("no system TrueType font with Arabic forms, skipping");
        return None;
    };
    let config = LayoutConfig {
        urdu_font_paths: vec![path],
        ..LayoutConfig::default()
    };
    let fonts = FontContext::load(&config).unwrap();
    assert!(fonts.has_urdu());
    Some(fonts)
}

fn sample_records(count: usize) -> Vec<QaRecord> {
    (1..=count)
        .map(|i| {
            QaRecord::new(
                format!("What is the main idea of section {i} in this chapter?"),
                "The section explains how living things are organised into cells, tissues, organs and systems, \
                 and why each level depends on the one below it.",
                "یہ حصہ بتاتا ہے کہ جاندار خلیوں، بافتوں، اعضاء اور نظاموں میں کس طرح منظم ہوتے ہیں۔",
            )
        })
        .collect()
}

fn compose_on_recorder(records: &[QaRecord]) -> (notes_pdf_creator::Document, RecordingCanvas) {
    let config = LayoutConfig::default();
    let fonts = FontContext::builtin_only();
    let mut story = build_story("Biology", records, &config, &mut ShapeCache::new());
    let watermark = Watermark::from_config(&config);
    let mut canvas = RecordingCanvas::new();
    let document = PageComposer::new(PageGeometry::from_config(&config), &fonts, &watermark)
        .compose(&mut story, &mut canvas)
        .unwrap();
    (document, canvas)
}

#[test]
fn missing_urdu_answer_gets_a_fallback_line() {
    let records = vec![
        QaRecord::new("What is a cell?", "The basic unit of life.", "زندگی کی بنیادی اکائی"),
        QaRecord::new("What is a tissue?", "A group of similar cells.", ""),
        QaRecord::new("What is an organ?", "Tissues working together.", "ایک ساتھ کام کرنے والی بافتیں"),
    ];
    let (document, canvas) = compose_on_recorder(&records);

    let rtl_blocks = document.placements().filter(|p| p.kind == ElementKind::RtlText).count();
    assert_eq!(rtl_blocks, 4);

    let texts = canvas.texts();
    assert_eq!(texts.iter().filter(|t| **t == "Jawab").count(), 1);
    assert_eq!(texts.iter().filter(|t| **t == "available").count(), 1);

    let labels: Vec<&str> = texts.iter().copied().filter(|t| t.starts_with('Q') && t.ends_with('.')).collect();
    assert_eq!(labels, vec!["Q1.", "Q2.", "Q3."]);
}

#[test]
fn long_chapters_span_pages_with_a_watermark_on_each() {
    let (document, canvas) = compose_on_recorder(&sample_records(25));
    assert!(document.page_count() > 1);

    let pages = canvas.pages();
    assert_eq!(pages.len(), document.page_count());
    for page in pages {
        let marks: Vec<&str> = page
            .iter()
            .filter_map(|call| match call {
                DrawCall::RotatedText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(marks, vec!["GoodWill", "Educational Content"]);
    }

    let order: Vec<usize> = document.placements().map(|p| p.index).collect();
    assert!(order.windows(2).all(|pair| pair[0] + 1 == pair[1]));
}

#[test]
fn written_pdf_matches_the_composed_layout() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("Biology_notes.pdf");
    let fonts = FontContext::builtin_only();
    let mut generator = NotesPdfGenerator::new(&fonts, LayoutConfig::default());

    let layout = generator.generate("Biology", &sample_records(25), &output).unwrap();

    let pdf = lopdf::Document::load(&output).unwrap();
    let pages = pdf.get_pages();
    assert_eq!(pages.len(), layout.page_count());
    assert!(pages.len() > 1);

    for page_id in pages.values() {
        let content = Content::decode(&pdf.get_page_content(*page_id).unwrap()).unwrap();
        let alpha_switches = content.operations.iter().filter(|op| op.operator == "gs").count();
        assert_eq!(alpha_switches, 2);
    }

    let info_id = pdf.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let info = pdf.get_dictionary(info_id).unwrap();
    assert_eq!(info.get(b"Producer").unwrap().as_str().unwrap(), b"GoodWill Notes Maker");
    assert_eq!(info.get(b"Title").unwrap().as_str().unwrap(), b"Biology");
}

#[test]
fn unparseable_response_still_produces_a_placeholder_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("Empty_notes.pdf");
    let fonts = FontContext::builtin_only();
    let mut generator = NotesPdfGenerator::new(&fonts, LayoutConfig::default());

    let layout = generator
        .generate_from_response("Empty", "I could not read these images, sorry.", &output)
        .unwrap();
    assert_eq!(layout.page_count(), 1);
    assert!(lopdf::Document::load(&output).is_ok());

    let story = generator.build_story("Empty", &[]);
    assert!(story.iter().any(|element| matches!(
        element,
        notes_pdf_creator::flow::FlowElement::Text(block)
            if block.runs().iter().any(|run| run.text == NO_QUESTIONS_TEXT)
    )));
}

#[test]
fn writing_to_a_missing_directory_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("missing").join("notes.pdf");
    let fonts = FontContext::builtin_only();
    let mut generator = NotesPdfGenerator::new(&fonts, LayoutConfig::default());

    let result = generator.generate("Missing", &sample_records(1), &output);
    assert!(matches!(result, Err(notes_pdf_creator::NotesError::Io(_))));
}

#[test]
fn urdu_lines_fit_the_frame_with_builtin_metrics() {
    let fonts = FontContext::builtin_only();
    let shaped = shape(LONG_URDU);

    for max_width in [80.0, 150.0, 300.0, 475.0] {
        let result = break_lines(&shaped, &fonts, FontId::Urdu, 14.0, max_width);
        for line in result.lines() {
            let width = fonts.text_width(line, FontId::Urdu, 14.0);
            assert!(width <= max_width || !line.contains(' '), "{width} > {max_width}");
        }
        let expected: Vec<&str> = shaped.tokens().collect();
        assert_eq!(result.tokens(), expected);
    }
}

#[test]
fn urdu_lines_fit_the_frame_with_a_truetype_face() {
    let Some(fonts) = truetype_fonts() else {
        return;
    };
    let shaped = shape(LONG_URDU);

    for max_width in [80.0, 150.0, 300.0] {
        let result = break_lines(&shaped, &fonts, FontId::Urdu, 14.0, max_width);
        assert!(result.len() > 1);
        for line in result.lines() {
            let width = fonts.text_width(line, FontId::Urdu, 14.0);
            assert!(width > 0.0);
            assert!(width <= max_width || !line.contains(' '), "{width} > {max_width}");
        }
        let expected: Vec<&str> = shaped.tokens().collect();
        assert_eq!(result.tokens(), expected);
    }
}

#[test]
fn truetype_face_is_embedded_as_a_composite_font() {
    let Some(fonts) = truetype_fonts() else {
        return;
    };
    let font_path = fonts.urdu_face().unwrap().path.clone();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("Biology_notes.pdf");
    let mut generator = NotesPdfGenerator::new(&fonts, LayoutConfig::default());

    let layout = generator.generate("Biology", &sample_records(20), &output).unwrap();
    assert!(layout.page_count() > 1);

    let pdf = lopdf::Document::load(&output).unwrap();
    let pages = pdf.get_pages();
    assert_eq!(pages.len(), layout.page_count());

    let first_page = *pages.values().next().unwrap();
    let content = Content::decode(&pdf.get_page_content(first_page).unwrap()).unwrap();
    assert!(content.operations.iter().any(|op| op.operator == "TJ"));

    let type0 = pdf
        .objects
        .values()
        .filter_map(|object| object.as_dict().ok())
        .find(|dict| matches!(dict.get(b"Subtype").and_then(|s| s.as_name()), Ok(name) if name == b"Type0"))
        .expect("Type0 font");
    let encoding = type0.get(b"Encoding").unwrap().as_name().unwrap();
    assert_eq!(encoding, b"Identity-H");

    let descendants = type0.get(b"DescendantFonts").unwrap().as_array().unwrap();
    let cidfont = pdf.get_dictionary(descendants[0].as_reference().unwrap()).unwrap();
    assert_eq!(cidfont.get(b"Subtype").unwrap().as_name().unwrap(), b"CIDFontType2");
    assert!(cidfont.get(b"CIDToGIDMap").unwrap().as_reference().is_ok());

    let widths = cidfont.get(b"W").unwrap().as_array().unwrap();
    assert!(!widths.is_empty());
    assert_eq!(widths.len() % 2, 0);
    assert!(widths[0].as_i64().is_ok());
    assert!(widths[1].as_array().is_ok());

    let descriptor = pdf
        .get_dictionary(cidfont.get(b"FontDescriptor").unwrap().as_reference().unwrap())
        .unwrap();
    let font_file = pdf
        .get_object(descriptor.get(b"FontFile2").unwrap().as_reference().unwrap())
        .unwrap()
        .as_stream()
        .unwrap();
    let original_len = std::fs::metadata(&font_path).unwrap().len() as i64;
    assert_eq!(font_file.dict.get(b"Length1").unwrap().as_i64().unwrap(), original_len);
}
