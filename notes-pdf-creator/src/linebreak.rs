//! Width-aware line breaking
//!
//! Greedy word packing by measured width. Words are never split: a word
//! wider than the line gets a line of its own and overflows it.

use crate::fonts::{FontId, TextMeasure};
use crate::shaping::ShapedText;

/// Lines of a shaped text, top to bottom, each in visual order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineBreakResult {
    lines: Vec<String>,
    logical: Vec<String>,
}

impl LineBreakResult {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Tokens of all lines in reading order, matching [`ShapedText::tokens`].
    pub fn tokens(&self) -> Vec<&str> {
        self.logical.iter().flat_map(|line| line.split_whitespace()).collect()
    }

    fn push_line(&mut self, shaped: &ShapedText, words: &[&str]) {
        let logical = words.join(" ");
        self.lines.push(shaped.reorder_line(&logical));
        self.logical.push(logical);
    }
}

/// Break shaped text into lines no wider than `max_width`.
///
/// Joined tokens are packed in reading order, so the first line of a
/// right-to-left paragraph holds the beginning of the sentence. Each
/// candidate line is reordered on its own before it is measured, which keeps
/// embedded left-to-right runs in order across line breaks.
pub fn break_lines<M: TextMeasure + ?Sized>(
    shaped: &ShapedText,
    measure: &M,
    font: FontId,
    size: f32,
    max_width: f32,
) -> LineBreakResult {
    let mut result = LineBreakResult::default();
    let mut current: Vec<&str> = Vec::new();

    for token in shaped.tokens() {
        current.push(token);
        if current.len() == 1 {
            continue;
        }
        let candidate = shaped.reorder_line(&current.join(" "));
        if measure.text_width(&candidate, font, size) > max_width {
            current.pop();
            result.push_line(shaped, &current);
            current.clear();
            current.push(token);
        }
    }

    if !current.is_empty() {
        result.push_line(shaped, &current);
    }

    result
}

/// Input to [`break_styled`]: a word in some font, or a forced line break.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Piece<'a> {
    Word(&'a str, FontId),
    Break,
}

/// One left-to-right line made of words that may use different fonts.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledLine {
    pub words: Vec<(String, FontId)>,
    pub width: f32,
}

impl StyledLine {
    fn empty() -> Self {
        Self {
            words: Vec::new(),
            width: 0.0,
        }
    }

    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|(word, _)| word.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Greedy breaking for mixed-font left-to-right text, same policy as [`break_lines`].
pub fn break_styled<M: TextMeasure + ?Sized>(
    pieces: &[Piece<'_>],
    measure: &M,
    size: f32,
    max_width: f32,
) -> Vec<StyledLine> {
    let mut lines = Vec::new();
    let mut current = StyledLine::empty();

    for piece in pieces {
        match *piece {
            Piece::Break => {
                lines.push(std::mem::replace(&mut current, StyledLine::empty()));
            }
            Piece::Word(word, font) => {
                let word_width = measure.text_width(word, font, size);
                if current.words.is_empty() {
                    current.words.push((word.to_string(), font));
                    current.width = word_width;
                    continue;
                }
                let space = measure.text_width(" ", font, size);
                if current.width + space + word_width > max_width {
                    lines.push(std::mem::replace(&mut current, StyledLine::empty()));
                    current.words.push((word.to_string(), font));
                    current.width = word_width;
                } else {
                    current.words.push((word.to_string(), font));
                    current.width += space + word_width;
                }
            }
        }
    }

    if !current.words.is_empty() {
        lines.push(current);
    }
    lines
}
