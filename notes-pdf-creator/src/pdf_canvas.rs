//! PDF output
//!
//! A [`Canvas`] that writes pages into a lopdf document. English text uses
//! the base-14 Helvetica family with WinAnsi encoding. Urdu text uses the
//! TrueType face as a composite Type0 font (Identity-H) whose CIDs are the
//! UTF-16 code units of the shaped presentation forms.

use crate::canvas::{Canvas, Color};
use crate::composer::PageGeometry;
use crate::error::{NotesError, Result};
use crate::fonts::{winansi_byte, FontContext, FontId, UrduFace};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{
    content::{Content, Operation},
    Dictionary, Document, Object, ObjectId, Stream, StringFormat,
};
use std::collections::BTreeMap;
use std::io::Write;

/// Document metadata written to the info dictionary.
#[derive(Debug, Clone, Default)]
pub struct PdfMetadata {
    pub title: String,
    pub producer: String,
}

pub struct PdfCanvas<'a> {
    fonts: &'a FontContext,
    document: Document,
    pages_id: ObjectId,
    font_objects: BTreeMap<FontId, ObjectId>,
    urdu_cidfont: Option<ObjectId>,
    /// Advance widths (1/1000 em) of every CID drawn with the Urdu face.
    urdu_widths: BTreeMap<u16, f32>,
    /// Alpha value bits -> (resource name, ExtGState object).
    alpha_states: BTreeMap<u32, (String, ObjectId)>,
    operations: Vec<Operation>,
    page_width: f32,
    page_height: f32,
    page_count: usize,
}

impl<'a> PdfCanvas<'a> {
    pub fn new(fonts: &'a FontContext, geometry: &PageGeometry, metadata: &PdfMetadata) -> Result<Self> {
        let mut canvas = Self {
            fonts,
            document: Document::with_version("1.5"),
            pages_id: (0, 0),
            font_objects: BTreeMap::new(),
            urdu_cidfont: None,
            urdu_widths: BTreeMap::new(),
            alpha_states: BTreeMap::new(),
            operations: Vec::new(),
            page_width: geometry.width,
            page_height: geometry.height,
            page_count: 0,
        };
        canvas.initialize_document(metadata)?;
        Ok(canvas)
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Set up the page tree, catalog, info dictionary and font resources.
    fn initialize_document(&mut self, metadata: &PdfMetadata) -> Result<()> {
        for font in [FontId::Helvetica, FontId::HelveticaBold, FontId::HelveticaOblique] {
            self.add_builtin_font(font);
        }
        let fonts = self.fonts;
        if let Some(face) = fonts.urdu_face() {
            self.add_urdu_font(face);
        }

        let mut pages_dict = Dictionary::new();
        pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
        pages_dict.set("Kids", Object::Array(vec![]));
        pages_dict.set("Count", Object::Integer(0));
        self.pages_id = self.document.add_object(Object::Dictionary(pages_dict));

        let mut info_dict = Dictionary::new();
        info_dict.set("Producer", text_string(&metadata.producer));
        info_dict.set("Creator", text_string(&metadata.producer));
        if !metadata.title.is_empty() {
            info_dict.set("Title", text_string(&metadata.title));
        }
        let info_id = self.document.add_object(Object::Dictionary(info_dict));

        let mut catalog_dict = Dictionary::new();
        catalog_dict.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog_dict.set("Pages", Object::Reference(self.pages_id));
        let catalog_id = self.document.add_object(Object::Dictionary(catalog_dict));

        self.document.trailer.set("Root", Object::Reference(catalog_id));
        self.document.trailer.set("Info", Object::Reference(info_id));
        Ok(())
    }

    fn add_builtin_font(&mut self, font: FontId) {
        let mut font_dict = Dictionary::new();
        font_dict.set("Type", Object::Name(b"Font".to_vec()));
        font_dict.set("Subtype", Object::Name(b"Type1".to_vec()));
        font_dict.set("BaseFont", Object::Name(font.base_font().as_bytes().to_vec()));
        font_dict.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
        let font_id = self.document.add_object(Object::Dictionary(font_dict));
        self.font_objects.insert(font, font_id);
    }

    /// Composite font for the Urdu face. The `W` array is filled in by
    /// [`PdfCanvas::finish`] once every drawn CID is known.
    fn add_urdu_font(&mut self, face: &UrduFace) {
        let base_font = FontId::Urdu.base_font().as_bytes().to_vec();
        let (ascent, descent) = face
            .font
            .horizontal_line_metrics(1000.0)
            .map(|m| (m.ascent.round() as i64, m.descent.round() as i64))
            .unwrap_or((880, -120));

        let mut font_descriptor = Dictionary::new();
        font_descriptor.set("Type", Object::Name(b"FontDescriptor".to_vec()));
        font_descriptor.set("FontName", Object::Name(base_font.clone()));
        font_descriptor.set("Flags", Object::Integer(4));
        font_descriptor.set(
            "FontBBox",
            Object::Array(vec![
                Object::Integer(-300),
                Object::Integer(descent.min(-300)),
                Object::Integer(1500),
                Object::Integer(ascent.max(1000)),
            ]),
        );
        font_descriptor.set("ItalicAngle", Object::Integer(0));
        font_descriptor.set("Ascent", Object::Integer(ascent));
        font_descriptor.set("Descent", Object::Integer(descent));
        font_descriptor.set("CapHeight", Object::Integer(700));
        font_descriptor.set("StemV", Object::Integer(80));

        let embedded = match font_file_stream(face) {
            Some(stream) => {
                let stream_id = self.document.add_object(stream);
                font_descriptor.set("FontFile2", Object::Reference(stream_id));
                true
            }
            None => false,
        };
        let font_descriptor_id = self.document.add_object(Object::Dictionary(font_descriptor));

        let mut cidfont = Dictionary::new();
        cidfont.set("Type", Object::Name(b"Font".to_vec()));
        cidfont.set("Subtype", Object::Name(b"CIDFontType2".to_vec()));
        cidfont.set("BaseFont", Object::Name(base_font.clone()));
        cidfont.set("CIDSystemInfo", {
            let mut d = Dictionary::new();
            d.set("Registry", Object::string_literal("Adobe"));
            d.set("Ordering", Object::string_literal("Identity"));
            d.set("Supplement", Object::Integer(0));
            Object::Dictionary(d)
        });
        cidfont.set("FontDescriptor", Object::Reference(font_descriptor_id));
        cidfont.set("DW", Object::Integer(1000));
        if embedded {
            let map_id = self.document.add_object(cid_to_gid_map_stream(face));
            cidfont.set("CIDToGIDMap", Object::Reference(map_id));
        } else {
            cidfont.set("CIDToGIDMap", Object::Name(b"Identity".to_vec()));
        }
        let cidfont_id = self.document.add_object(Object::Dictionary(cidfont));

        let tounicode_id = self.document.add_object(identity_tounicode_cmap_stream());

        let mut type0 = Dictionary::new();
        type0.set("Type", Object::Name(b"Font".to_vec()));
        type0.set("Subtype", Object::Name(b"Type0".to_vec()));
        type0.set("BaseFont", Object::Name(base_font));
        type0.set("Encoding", Object::Name(b"Identity-H".to_vec()));
        type0.set("DescendantFonts", Object::Array(vec![Object::Reference(cidfont_id)]));
        type0.set("ToUnicode", Object::Reference(tounicode_id));

        let font_id = self.document.add_object(Object::Dictionary(type0));
        self.font_objects.insert(FontId::Urdu, font_id);
        self.urdu_cidfont = Some(cidfont_id);
    }

    fn pdf_y(&self, top_down_y: f32) -> f32 {
        self.page_height - top_down_y
    }

    fn set_fill(&mut self, color: Color) {
        self.operations.push(Operation::new(
            "rg",
            vec![Object::Real(color.r), Object::Real(color.g), Object::Real(color.b)],
        ));
    }

    /// Show-text operation for `text` in an already resolved font.
    fn text_operation(&mut self, text: &str, font: FontId, size: f32) -> Operation {
        match (font, self.fonts.urdu_face()) {
            (FontId::Urdu, Some(face)) => {
                let tj = urdu_tj_array(face, text, size, &mut self.urdu_widths);
                Operation::new("TJ", vec![Object::Array(tj)])
            }
            _ => {
                let bytes: Vec<u8> = text.chars().map(winansi_byte).collect();
                Operation::new("Tj", vec![Object::String(bytes, StringFormat::Literal)])
            }
        }
    }

    fn push_text(&mut self, x: f32, y: f32, text: &str, font: FontId, size: f32, color: Color) {
        let font = self.fonts.resolve(font);
        let show = self.text_operation(text, font, size);
        self.operations.push(Operation::new("BT", vec![]));
        self.operations.push(Operation::new(
            "Tf",
            vec![Object::Name(font.resource_name().as_bytes().to_vec()), Object::Real(size)],
        ));
        self.set_fill(color);
        self.operations
            .push(Operation::new("Td", vec![Object::Real(x), Object::Real(y)]));
        self.operations.push(show);
        self.operations.push(Operation::new("ET", vec![]));
    }

    /// ExtGState resource name for a fill/stroke alpha, created on first use.
    fn alpha_state(&mut self, alpha: f32) -> String {
        let alpha = alpha.clamp(0.0, 1.0);
        if let Some((name, _)) = self.alpha_states.get(&alpha.to_bits()) {
            return name.clone();
        }
        let mut state = Dictionary::new();
        state.set("Type", Object::Name(b"ExtGState".to_vec()));
        state.set("ca", Object::Real(alpha));
        state.set("CA", Object::Real(alpha));
        let id = self.document.add_object(Object::Dictionary(state));
        let name = format!("GS{}", self.alpha_states.len() + 1);
        self.alpha_states.insert(alpha.to_bits(), (name.clone(), id));
        name
    }

    fn create_resources_dict(&self) -> Dictionary {
        let mut font_dict = Dictionary::new();
        for (font, &font_id) in &self.font_objects {
            font_dict.set(font.resource_name(), Object::Reference(font_id));
        }

        let mut resources = Dictionary::new();
        resources.set("Font", Object::Dictionary(font_dict));
        if !self.alpha_states.is_empty() {
            let mut states = Dictionary::new();
            for (name, id) in self.alpha_states.values() {
                states.set(name.as_str(), Object::Reference(*id));
            }
            resources.set("ExtGState", Object::Dictionary(states));
        }
        resources
    }

    fn add_page_to_tree(&mut self, page_id: ObjectId) -> Result<()> {
        let pages_dict = self.document.get_object_mut(self.pages_id)?.as_dict_mut()?;
        let kids = pages_dict.get_mut(b"Kids")?.as_array_mut()?;
        kids.push(Object::Reference(page_id));
        let count = kids.len() as i64;
        pages_dict.set("Count", Object::Integer(count));
        Ok(())
    }

    /// Write the widths of every drawn Urdu CID into the CIDFont.
    fn write_urdu_widths(&mut self) -> Result<()> {
        let Some(cidfont_id) = self.urdu_cidfont else {
            return Ok(());
        };
        let mut widths = Vec::with_capacity(self.urdu_widths.len() * 2);
        for (&cid, &width) in &self.urdu_widths {
            widths.push(Object::Integer(cid as i64));
            widths.push(Object::Array(vec![Object::Real(width)]));
        }
        let cidfont = self.document.get_object_mut(cidfont_id)?.as_dict_mut()?;
        cidfont.set("W", Object::Array(widths));
        Ok(())
    }

    /// Finalize the document and serialize it.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if !self.operations.is_empty() {
            return Err(NotesError::Render(
                "drawing after the last page was sealed".to_string(),
            ));
        }
        if self.page_count == 0 {
            return Err(NotesError::Render("document has no pages".to_string()));
        }
        self.write_urdu_widths()?;
        self.document.compress();

        let mut bytes = Vec::new();
        self.document.save_to(&mut bytes)?;
        Ok(bytes)
    }
}

impl Canvas for PdfCanvas<'_> {
    fn draw_text(&mut self, x: f32, baseline: f32, text: &str, font: FontId, size: f32, color: Color) {
        if text.is_empty() {
            return;
        }
        let y = self.pdf_y(baseline);
        self.push_text(x, y, text, font, size, color);
    }

    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, thickness: f32, color: Color) {
        let (y1, y2) = (self.pdf_y(y1), self.pdf_y(y2));
        self.operations.push(Operation::new("q", vec![]));
        self.operations.push(Operation::new(
            "RG",
            vec![Object::Real(color.r), Object::Real(color.g), Object::Real(color.b)],
        ));
        self.operations.push(Operation::new("w", vec![Object::Real(thickness)]));
        self.operations
            .push(Operation::new("m", vec![Object::Real(x1), Object::Real(y1)]));
        self.operations
            .push(Operation::new("l", vec![Object::Real(x2), Object::Real(y2)]));
        self.operations.push(Operation::new("S", vec![]));
        self.operations.push(Operation::new("Q", vec![]));
    }

    fn draw_rotated_text(
        &mut self,
        angle: f32,
        x: f32,
        y: f32,
        text: &str,
        font: FontId,
        size: f32,
        color: Color,
        alpha: f32,
    ) {
        let state = self.alpha_state(alpha);
        let (sin, cos) = angle.to_radians().sin_cos();
        self.operations.push(Operation::new("q", vec![]));
        self.operations
            .push(Operation::new("gs", vec![Object::Name(state.into_bytes())]));
        self.operations.push(Operation::new(
            "cm",
            vec![
                Object::Real(cos),
                Object::Real(sin),
                Object::Real(-sin),
                Object::Real(cos),
                Object::Real(0.0),
                Object::Real(0.0),
            ],
        ));
        self.push_text(x, y, text, font, size, color);
        self.operations.push(Operation::new("Q", vec![]));
    }

    fn show_page(&mut self) -> Result<()> {
        let content = Content {
            operations: std::mem::take(&mut self.operations),
        };
        let content_id = self.document.add_object(Stream::new(Dictionary::new(), content.encode()?));

        let mut page_dict = Dictionary::new();
        page_dict.set("Type", Object::Name(b"Page".to_vec()));
        page_dict.set("Parent", Object::Reference(self.pages_id));
        page_dict.set("Resources", Object::Dictionary(self.create_resources_dict()));
        page_dict.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(self.page_width),
                Object::Real(self.page_height),
            ]),
        );
        page_dict.set("Contents", Object::Reference(content_id));
        let page_id = self.document.add_object(Object::Dictionary(page_dict));

        self.add_page_to_tree(page_id)?;
        self.page_count += 1;
        Ok(())
    }
}

/// TJ array for the Urdu face: one two-byte CID per character with pair
/// kerning between them. Records the width of every CID used.
fn urdu_tj_array(face: &UrduFace, text: &str, size: f32, widths: &mut BTreeMap<u16, f32>) -> Vec<Object> {
    let chars: Vec<char> = text.chars().collect();
    let mut tj = Vec::with_capacity(chars.len() * 2);

    for (i, &ch) in chars.iter().enumerate() {
        let cid = u16::try_from(ch as u32).unwrap_or(0xFFFD);
        widths
            .entry(cid)
            .or_insert_with(|| face.glyph_width_milli(char::from_u32(cid as u32).unwrap_or(ch)));
        tj.push(Object::String(cid.to_be_bytes().to_vec(), StringFormat::Hexadecimal));

        if let Some(&next) = chars.get(i + 1) {
            if let Some(kern) = face.font.horizontal_kern(ch, next, size) {
                // TJ adjustments are subtracted from the advance
                tj.push(Object::Real(-kern * 1000.0 / size));
            }
        }
    }
    tj
}

/// Info-dictionary text string: literal for ASCII, UTF-16BE with BOM otherwise.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// FontFile2 stream for TrueType files, deflated here so the font keeps
/// its `Length1`.
fn font_file_stream(face: &UrduFace) -> Option<Object> {
    if !face.is_truetype_file() || face.data.is_empty() {
        return None;
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&face.data).ok()?;
    let compressed = encoder.finish().ok()?;

    let mut stream_dict = Dictionary::new();
    stream_dict.set("Length1", Object::Integer(face.data.len() as i64));
    stream_dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
    Some(Object::Stream(Stream::new(stream_dict, compressed).with_compression(false)))
}

/// Full BMP CID -> glyph index map, two bytes per CID.
fn cid_to_gid_map_stream(face: &UrduFace) -> Object {
    let mut map = vec![0u8; 65536 * 2];
    for cid in 0u32..=0xFFFF {
        if let Some(ch) = char::from_u32(cid) {
            let gid = face.glyph_index(ch);
            let offset = (cid as usize) * 2;
            map[offset..offset + 2].copy_from_slice(&gid.to_be_bytes());
        }
    }
    Object::Stream(Stream::new(Dictionary::new(), map))
}

fn identity_tounicode_cmap_stream() -> Object {
    let cmap = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo
<< /Registry (Adobe)
/Ordering (UCS)
/Supplement 0
>> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
1 beginbfrange
<0000> <FFFF> <0000>
endbfrange
endcmap
CMapName currentdict /CMap defineresource pop
end
end"
    .to_vec();
    Object::Stream(Stream::new(Dictionary::new(), cmap))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> PdfMetadata {
        PdfMetadata {
            title: "Biology".to_string(),
            producer: "GoodWill Notes Maker".to_string(),
        }
    }

    #[test]
    fn writes_one_page_per_show_page() {
        let fonts = FontContext::builtin_only();
        let mut canvas = PdfCanvas::new(&fonts, &PageGeometry::a4(), &metadata()).unwrap();
        canvas.draw_text(60.0, 100.0, "Q1. What is a cell?", FontId::HelveticaBold, 14.0, Color::BLACK);
        canvas.show_page().unwrap();
        canvas.draw_line(60.0, 100.0, 400.0, 100.0, 1.0, Color::hex(0xBDC3C7));
        canvas.show_page().unwrap();
        assert_eq!(canvas.page_count(), 2);

        let bytes = canvas.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let document = Document::load_mem(&bytes).unwrap();
        assert_eq!(document.get_pages().len(), 2);
    }

    #[test]
    fn rotated_text_registers_an_alpha_state_once() {
        let fonts = FontContext::builtin_only();
        let mut canvas = PdfCanvas::new(&fonts, &PageGeometry::a4(), &metadata()).unwrap();
        canvas.draw_rotated_text(45.0, 200.0, 100.0, "GoodWill", FontId::HelveticaBold, 50.0, Color::BLACK, 0.2);
        canvas.draw_rotated_text(45.0, 220.0, 50.0, "Educational", FontId::Helvetica, 20.0, Color::BLACK, 0.2);
        assert_eq!(canvas.alpha_states.len(), 1);
        canvas.show_page().unwrap();

        let bytes = canvas.finish().unwrap();
        let document = Document::load_mem(&bytes).unwrap();
        let (_, page_id) = document.get_pages().into_iter().next().unwrap();
        let page = document.get_dictionary(page_id).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        assert!(resources.get(b"ExtGState").is_ok());
    }

    #[test]
    fn urdu_without_a_face_falls_back_to_helvetica() {
        let fonts = FontContext::builtin_only();
        let mut canvas = PdfCanvas::new(&fonts, &PageGeometry::a4(), &metadata()).unwrap();
        assert!(!canvas.font_objects.contains_key(&FontId::Urdu));
        canvas.draw_text(60.0, 100.0, "\u{FE8F}\u{FE8D}", FontId::Urdu, 14.0, Color::BLACK);
        let tf = canvas.operations.iter().find(|op| op.operator == "Tf").unwrap();
        assert!(matches!(&tf.operands[0], Object::Name(name) if name == b"helvetica"));
    }

    #[test]
    fn finishing_without_pages_is_an_error() {
        let fonts = FontContext::builtin_only();
        let canvas = PdfCanvas::new(&fonts, &PageGeometry::a4(), &metadata()).unwrap();
        assert!(matches!(canvas.finish(), Err(NotesError::Render(_))));
    }

    #[test]
    fn non_ascii_titles_use_utf16() {
        match text_string("اردو") {
            Object::String(bytes, StringFormat::Hexadecimal) => assert_eq!(&bytes[..2], &[0xFE, 0xFF]),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(text_string("Biology"), Object::String(bytes, StringFormat::Literal) if bytes == b"Biology"));
    }
}
