//! Font management for bilingual notes
//!
//! English text uses the PDF base-14 Helvetica family, measured with the
//! standard AFM widths. Urdu text uses a TrueType face loaded once through
//! fontdue; when no face is found, Urdu text falls back to Helvetica and
//! renders unshaped glyph boxes instead of failing.

use crate::config::LayoutConfig;
use crate::error::{NotesError, Result};
use fontdue::{Font, FontSettings};
use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Logical name the Urdu face is registered under.
pub const URDU_FONT_NAME: &str = "NotoNaskhArabic";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FontId {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    Urdu,
}

impl FontId {
    /// Name used in page resource dictionaries.
    pub fn resource_name(self) -> &'static str {
        match self {
            FontId::Helvetica => "helvetica",
            FontId::HelveticaBold => "helvetica-bold",
            FontId::HelveticaOblique => "helvetica-oblique",
            FontId::Urdu => "urdu",
        }
    }

    /// PostScript name of the base-14 fonts.
    pub fn base_font(self) -> &'static str {
        match self {
            FontId::Helvetica => "Helvetica",
            FontId::HelveticaBold => "Helvetica-Bold",
            FontId::HelveticaOblique => "Helvetica-Oblique",
            FontId::Urdu => URDU_FONT_NAME,
        }
    }

    pub fn is_builtin(self) -> bool {
        !matches!(self, FontId::Urdu)
    }
}

/// Text width measurement in points.
pub trait TextMeasure {
    fn text_width(&self, text: &str, font: FontId, size: f32) -> f32;
}

/// A loaded TrueType face with its raw bytes kept for embedding.
#[derive(Clone)]
pub struct UrduFace {
    pub font: Font,
    pub path: PathBuf,
    pub data: Vec<u8>,
}

impl UrduFace {
    fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let font = Font::from_bytes(data.clone(), FontSettings::default())
            .map_err(|e| NotesError::Font(format!("failed to load {}: {}", path.display(), e)))?;
        Ok(Self {
            font,
            path: path.to_path_buf(),
            data,
        })
    }

    /// Advance width of `ch` in 1/1000 em, as PDF width arrays expect.
    pub fn glyph_width_milli(&self, ch: char) -> f32 {
        self.font.metrics(ch, 1000.0).advance_width
    }

    pub fn glyph_index(&self, ch: char) -> u16 {
        self.font.lookup_glyph_index(ch)
    }

    /// Whether the file can go into a FontFile2 stream.
    pub fn is_truetype_file(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ttf"))
    }

    fn width(&self, text: &str, size: f32) -> f32 {
        let chars: Vec<char> = text.chars().collect();
        let mut width = 0.0;
        for (i, &ch) in chars.iter().enumerate() {
            width += self.font.metrics(ch, size).advance_width;
            if let Some(&next) = chars.get(i + 1) {
                if let Some(kern) = self.font.horizontal_kern(ch, next, size) {
                    width += kern;
                }
            }
        }
        width
    }
}

/// Diagnostics about the Urdu font, serializable for host applications.
#[derive(Debug, Clone, Serialize)]
pub struct FontStatus {
    pub font_name: String,
    pub font_path: Option<String>,
    pub font_exists: bool,
    pub font_registered: bool,
    pub searched_paths: Vec<String>,
}

/// Loaded fonts, shared by measurement and PDF output.
#[derive(Clone)]
pub struct FontContext {
    urdu: Option<UrduFace>,
    searched: Vec<PathBuf>,
}

impl FontContext {
    /// Load the Urdu face from the first configured path that exists.
    ///
    /// A missing font is not an error. A font file that exists but does not
    /// parse is.
    pub fn load(config: &LayoutConfig) -> Result<Self> {
        let searched = config.font_search_paths();
        for path in &searched {
            if path.exists() {
                let face = UrduFace::load(path)?;
                info!("Registered Urdu font {} from {}", URDU_FONT_NAME, path.display());
                return Ok(Self {
                    urdu: Some(face),
                    searched,
                });
            }
        }

        warn!(
            "Urdu font not found (searched {} paths), falling back to Helvetica",
            searched.len()
        );
        Ok(Self {
            urdu: None,
            searched,
        })
    }

    /// Fonts without any TrueType face.
    pub fn builtin_only() -> Self {
        Self {
            urdu: None,
            searched: Vec::new(),
        }
    }

    /// Process-wide fonts loaded once from the default configuration.
    pub fn shared() -> &'static FontContext {
        static SHARED: OnceLock<FontContext> = OnceLock::new();
        SHARED.get_or_init(|| {
            FontContext::load(&LayoutConfig::default()).unwrap_or_else(|e| {
                warn!("Urdu font unusable ({}), falling back to Helvetica", e);
                FontContext::builtin_only()
            })
        })
    }

    pub fn urdu_face(&self) -> Option<&UrduFace> {
        self.urdu.as_ref()
    }

    pub fn has_urdu(&self) -> bool {
        self.urdu.is_some()
    }

    /// Font actually used for `font`: the Urdu face degrades to Helvetica.
    pub fn resolve(&self, font: FontId) -> FontId {
        match font {
            FontId::Urdu if self.urdu.is_none() => FontId::Helvetica,
            other => other,
        }
    }

    pub fn status(&self) -> FontStatus {
        let path = self
            .urdu
            .as_ref()
            .map(|face| face.path.clone())
            .or_else(|| self.searched.first().cloned());
        FontStatus {
            font_name: URDU_FONT_NAME.to_string(),
            font_exists: path.as_ref().is_some_and(|p| p.exists()),
            font_path: path.map(|p| p.display().to_string()),
            font_registered: self.urdu.is_some(),
            searched_paths: self.searched.iter().map(|p| p.display().to_string()).collect(),
        }
    }
}

impl TextMeasure for FontContext {
    fn text_width(&self, text: &str, font: FontId, size: f32) -> f32 {
        match (self.resolve(font), self.urdu.as_ref()) {
            (FontId::Urdu, Some(face)) => face.width(text, size),
            (builtin, _) => builtin_text_width(text, builtin, size),
        }
    }
}

/// Encode a character for a WinAnsi base-14 font. Unencodable characters become `?`.
pub fn winansi_byte(ch: char) -> u8 {
    match ch {
        '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{FF}' => ch as u8,
        '\u{20AC}' => 0x80,
        '\u{2026}' => 0x85,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        _ => b'?',
    }
}

/// Width of `text` in a base-14 Helvetica face, in points.
pub fn builtin_text_width(text: &str, font: FontId, size: f32) -> f32 {
    let table = match font {
        FontId::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
        _ => &HELVETICA_WIDTHS,
    };
    let units: u32 = text
        .chars()
        .map(|ch| {
            let byte = winansi_byte(ch);
            match byte {
                0x20..=0x7E => table[(byte - 0x20) as usize] as u32,
                _ => table[(b'?' - 0x20) as usize] as u32,
            }
        })
        .sum();
    units as f32 * size / 1000.0
}

// AFM advance widths for codes 0x20..=0x7E.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    278, 278, 584, 584, 584, 556, 1015,
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    278, 278, 278, 469, 556, 333,
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];
