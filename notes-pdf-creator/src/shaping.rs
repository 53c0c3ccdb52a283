//! Urdu text shaping
//!
//! Converts logical-order Arabic-script text into joined presentation forms
//! laid out in visual order, so a renderer that only places glyphs left to
//! right (PDF `Tj`/`TJ` with a simple font) draws correct right-to-left text.
//!
//! Joining runs once over the whole text. Line breaking later packs the
//! joined words and reorders each finished line, never re-shaping single
//! words.

use std::collections::HashMap;
use unicode_bidi::{BidiInfo, Level};
use unicode_script::{Script, UnicodeScript};
use unicode_segmentation::UnicodeSegmentation;

const LAM: char = '\u{0644}';
const TATWEEL: char = '\u{0640}';

/// Text that has been joined and reordered for left-to-right drawing.
///
/// Keeps the joined text in logical order next to the visual string, so a
/// wrapped paragraph can be reordered line by line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShapedText {
    joined: String,
    text: String,
    rtl: bool,
}

impl ShapedText {
    /// Wrap text that needs no shaping (plain Latin paragraphs).
    pub fn plain(text: &str) -> Self {
        let text = collapse_whitespace(text);
        Self {
            joined: text.clone(),
            text,
            rtl: false,
        }
    }

    /// The whole paragraph as one visual line.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Joined presentation forms in logical (reading) order.
    pub fn logical(&self) -> &str {
        &self.joined
    }

    /// Whether the paragraph's base direction is right to left.
    pub fn is_rtl(&self) -> bool {
        self.rtl
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whitespace separated joined tokens in reading order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.joined.split_whitespace()
    }

    /// Visual order of one line cut from [`ShapedText::logical`], using this
    /// paragraph's base direction.
    pub fn reorder_line(&self, logical_line: &str) -> String {
        let level = if self.rtl { Level::rtl() } else { Level::ltr() };
        visual_order(logical_line, Some(level)).0
    }
}

/// Shape raw text: contextual letter joining first, then bidi reordering.
///
/// Whitespace runs collapse to a single space; characters without joining
/// forms pass through untouched.
pub fn shape(raw: &str) -> ShapedText {
    let normalized = collapse_whitespace(raw);
    if normalized.is_empty() {
        return ShapedText::default();
    }

    let joined = if needs_joining(&normalized) {
        join_letters(&normalized)
    } else {
        normalized
    };

    let (text, rtl) = visual_order(&joined, None);
    ShapedText { joined, text, rtl }
}

/// Shape bytes that may not be valid UTF-8. Invalid sequences become U+FFFD.
pub fn shape_bytes(raw: &[u8]) -> ShapedText {
    shape(&String::from_utf8_lossy(raw))
}

/// True when the text contains Arabic-script characters.
pub fn needs_joining(text: &str) -> bool {
    text.chars().any(|ch| ch.script() == Script::Arabic)
}

/// Memoizes [`shape`] by raw text. Output is deterministic so entries never go stale.
#[derive(Debug, Default)]
pub struct ShapeCache {
    entries: HashMap<String, ShapedText>,
}

impl ShapeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shape(&mut self, raw: &str) -> ShapedText {
        if let Some(shaped) = self.entries.get(raw) {
            return shaped.clone();
        }
        let shaped = shape(raw);
        self.entries.insert(raw.to_string(), shaped.clone());
        shaped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Presentation forms of one letter. Right-joining letters have no
/// initial/medial form.
#[derive(Debug, Clone, Copy)]
struct Forms {
    isolated: char,
    final_: char,
    initial: Option<char>,
    medial: Option<char>,
}

const fn dual(isolated: char, final_: char, initial: char, medial: char) -> Forms {
    Forms {
        isolated,
        final_,
        initial: Some(initial),
        medial: Some(medial),
    }
}

const fn right(isolated: char, final_: char) -> Forms {
    Forms {
        isolated,
        final_,
        initial: None,
        medial: None,
    }
}

fn letter_forms(ch: char) -> Option<Forms> {
    let forms = match ch {
        '\u{0622}' => right('\u{FE81}', '\u{FE82}'),
        '\u{0623}' => right('\u{FE83}', '\u{FE84}'),
        '\u{0624}' => right('\u{FE85}', '\u{FE86}'),
        '\u{0625}' => right('\u{FE87}', '\u{FE88}'),
        '\u{0626}' => dual('\u{FE89}', '\u{FE8A}', '\u{FE8B}', '\u{FE8C}'),
        '\u{0627}' => right('\u{FE8D}', '\u{FE8E}'),
        '\u{0628}' => dual('\u{FE8F}', '\u{FE90}', '\u{FE91}', '\u{FE92}'),
        '\u{0629}' => right('\u{FE93}', '\u{FE94}'),
        '\u{062A}' => dual('\u{FE95}', '\u{FE96}', '\u{FE97}', '\u{FE98}'),
        '\u{062B}' => dual('\u{FE99}', '\u{FE9A}', '\u{FE9B}', '\u{FE9C}'),
        '\u{062C}' => dual('\u{FE9D}', '\u{FE9E}', '\u{FE9F}', '\u{FEA0}'),
        '\u{062D}' => dual('\u{FEA1}', '\u{FEA2}', '\u{FEA3}', '\u{FEA4}'),
        '\u{062E}' => dual('\u{FEA5}', '\u{FEA6}', '\u{FEA7}', '\u{FEA8}'),
        '\u{062F}' => right('\u{FEA9}', '\u{FEAA}'),
        '\u{0630}' => right('\u{FEAB}', '\u{FEAC}'),
        '\u{0631}' => right('\u{FEAD}', '\u{FEAE}'),
        '\u{0632}' => right('\u{FEAF}', '\u{FEB0}'),
        '\u{0633}' => dual('\u{FEB1}', '\u{FEB2}', '\u{FEB3}', '\u{FEB4}'),
        '\u{0634}' => dual('\u{FEB5}', '\u{FEB6}', '\u{FEB7}', '\u{FEB8}'),
        '\u{0635}' => dual('\u{FEB9}', '\u{FEBA}', '\u{FEBB}', '\u{FEBC}'),
        '\u{0636}' => dual('\u{FEBD}', '\u{FEBE}', '\u{FEBF}', '\u{FEC0}'),
        '\u{0637}' => dual('\u{FEC1}', '\u{FEC2}', '\u{FEC3}', '\u{FEC4}'),
        '\u{0638}' => dual('\u{FEC5}', '\u{FEC6}', '\u{FEC7}', '\u{FEC8}'),
        '\u{0639}' => dual('\u{FEC9}', '\u{FECA}', '\u{FECB}', '\u{FECC}'),
        '\u{063A}' => dual('\u{FECD}', '\u{FECE}', '\u{FECF}', '\u{FED0}'),
        '\u{0641}' => dual('\u{FED1}', '\u{FED2}', '\u{FED3}', '\u{FED4}'),
        '\u{0642}' => dual('\u{FED5}', '\u{FED6}', '\u{FED7}', '\u{FED8}'),
        '\u{0643}' => dual('\u{FED9}', '\u{FEDA}', '\u{FEDB}', '\u{FEDC}'),
        '\u{0644}' => dual('\u{FEDD}', '\u{FEDE}', '\u{FEDF}', '\u{FEE0}'),
        '\u{0645}' => dual('\u{FEE1}', '\u{FEE2}', '\u{FEE3}', '\u{FEE4}'),
        '\u{0646}' => dual('\u{FEE5}', '\u{FEE6}', '\u{FEE7}', '\u{FEE8}'),
        '\u{0647}' => dual('\u{FEE9}', '\u{FEEA}', '\u{FEEB}', '\u{FEEC}'),
        '\u{0648}' => right('\u{FEED}', '\u{FEEE}'),
        '\u{0649}' => dual('\u{FEEF}', '\u{FEF0}', '\u{FBE8}', '\u{FBE9}'),
        '\u{064A}' => dual('\u{FEF1}', '\u{FEF2}', '\u{FEF3}', '\u{FEF4}'),
        // Urdu and Persian letters
        '\u{0671}' => right('\u{FB50}', '\u{FB51}'),
        '\u{0679}' => dual('\u{FB66}', '\u{FB67}', '\u{FB68}', '\u{FB69}'),
        '\u{067E}' => dual('\u{FB56}', '\u{FB57}', '\u{FB58}', '\u{FB59}'),
        '\u{0686}' => dual('\u{FB7A}', '\u{FB7B}', '\u{FB7C}', '\u{FB7D}'),
        '\u{0688}' => right('\u{FB88}', '\u{FB89}'),
        '\u{0691}' => right('\u{FB8C}', '\u{FB8D}'),
        '\u{0698}' => right('\u{FB8A}', '\u{FB8B}'),
        '\u{06A9}' => dual('\u{FB8E}', '\u{FB8F}', '\u{FB90}', '\u{FB91}'),
        '\u{06AF}' => dual('\u{FB92}', '\u{FB93}', '\u{FB94}', '\u{FB95}'),
        '\u{06BA}' => right('\u{FB9E}', '\u{FB9F}'),
        '\u{06BE}' => dual('\u{FBAA}', '\u{FBAB}', '\u{FBAC}', '\u{FBAD}'),
        '\u{06C0}' => right('\u{FBA4}', '\u{FBA5}'),
        '\u{06C1}' => dual('\u{FBA6}', '\u{FBA7}', '\u{FBA8}', '\u{FBA9}'),
        '\u{06CC}' => dual('\u{FBFC}', '\u{FBFD}', '\u{FBFE}', '\u{FBFF}'),
        '\u{06D2}' => right('\u{FBAE}', '\u{FBAF}'),
        '\u{06D3}' => right('\u{FBB0}', '\u{FBB1}'),
        _ => return None,
    };
    Some(forms)
}

/// Lam-alef ligature (isolated, final) for the alef that follows a lam.
fn lam_alef(next: char) -> Option<(char, char)> {
    match next {
        '\u{0622}' => Some(('\u{FEF5}', '\u{FEF6}')),
        '\u{0623}' => Some(('\u{FEF7}', '\u{FEF8}')),
        '\u{0625}' => Some(('\u{FEF9}', '\u{FEFA}')),
        '\u{0627}' => Some(('\u{FEFB}', '\u{FEFC}')),
        _ => None,
    }
}

/// Combining marks that sit on a letter without affecting its joining.
fn is_transparent(ch: char) -> bool {
    matches!(
        ch,
        '\u{0610}'..='\u{061A}'
            | '\u{064B}'..='\u{065F}'
            | '\u{0670}'
            | '\u{06D6}'..='\u{06DC}'
            | '\u{06DF}'..='\u{06E4}'
            | '\u{06E7}'
            | '\u{06E8}'
            | '\u{06EA}'..='\u{06ED}'
    )
}

fn joins_forward(ch: char) -> bool {
    match letter_forms(ch) {
        Some(forms) => forms.initial.is_some(),
        None => ch == TATWEEL,
    }
}

fn joins_backward(ch: char) -> bool {
    ch == TATWEEL || letter_forms(ch).is_some()
}

fn previous_letter(chars: &[char], index: usize) -> Option<char> {
    chars[..index].iter().rev().copied().find(|&ch| !is_transparent(ch))
}

fn next_letter(chars: &[char], index: usize) -> Option<char> {
    chars[index + 1..].iter().copied().find(|&ch| !is_transparent(ch))
}

fn join_letters(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() * 2);

    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        let Some(forms) = letter_forms(ch) else {
            out.push(ch);
            i += 1;
            continue;
        };

        let joined_prev = previous_letter(&chars, i).is_some_and(joins_forward);

        if ch == LAM {
            let alef_at = (i + 1..chars.len()).find(|&j| !is_transparent(chars[j]));
            let ligature = alef_at.and_then(|j| lam_alef(chars[j]).map(|forms| (j, forms)));
            if let Some((j, (isolated, final_))) = ligature {
                out.push(if joined_prev { final_ } else { isolated });
                // marks on the lam follow the ligature
                out.extend(&chars[i + 1..j]);
                i = j + 1;
                continue;
            }
        }

        let joined_next = forms.initial.is_some() && next_letter(&chars, i).is_some_and(joins_backward);

        let shaped = match (joined_prev, joined_next) {
            (true, true) => forms.medial.unwrap_or(forms.final_),
            (true, false) => forms.final_,
            (false, true) => forms.initial.unwrap_or(forms.isolated),
            (false, false) => forms.isolated,
        };
        out.push(shaped);
        i += 1;
    }

    out
}

fn mirrored(ch: char) -> char {
    match ch {
        '(' => ')',
        ')' => '(',
        '[' => ']',
        ']' => '[',
        '{' => '}',
        '}' => '{',
        '<' => '>',
        '>' => '<',
        '\u{00AB}' => '\u{00BB}',
        '\u{00BB}' => '\u{00AB}',
        _ => ch,
    }
}

/// Reorder a single-line paragraph into visual order. Returns the text and
/// whether the base direction is right to left. `base` forces the paragraph
/// level; `None` takes it from the first strong character.
fn visual_order(text: &str, base: Option<Level>) -> (String, bool) {
    let bidi_info = BidiInfo::new(text, base);
    let mut out = String::with_capacity(text.len());
    let mut rtl = false;

    for (index, para) in bidi_info.paragraphs.iter().enumerate() {
        if index == 0 {
            rtl = para.level.is_rtl();
        }
        let (levels, runs) = bidi_info.visual_runs(para, para.range.clone());
        for run in runs {
            let segment = &text[run.clone()];
            if levels[run.start].is_rtl() {
                // Reverse by grapheme so combining marks stay on their base letter.
                for grapheme in segment.graphemes(true).rev() {
                    let mut chars = grapheme.chars();
                    match (chars.next(), chars.next()) {
                        (Some(ch), None) => out.push(mirrored(ch)),
                        _ => out.push_str(grapheme),
                    }
                }
            } else {
                out.push_str(segment);
            }
        }
    }

    (out, rtl)
}
