//! Flow elements: self-measuring units of page content.
//!
//! Each element computes its height for a given frame width and later draws
//! itself into a box of that width. The composer places them top-down and
//! never splits one across pages.

use crate::canvas::{Canvas, Color};
use crate::fonts::{FontId, TextMeasure};
use crate::linebreak::{break_lines, break_styled, LineBreakResult, Piece, StyledLine};
use crate::shaping::ShapedText;

/// Ratio of line height to font size for right-to-left text. Naskh ascenders
/// and descenders need more room than Latin text.
pub const RTL_LEADING_RATIO: f32 = 1.55;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Text,
    RtlText,
    Spacer,
    Separator,
}

/// A run of text in one font. `\n` inside a run forces a line break.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub font: FontId,
}

impl Run {
    pub fn new(text: impl Into<String>, font: FontId) -> Self {
        Self {
            text: text.into(),
            font,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub leading: f32,
    pub color: Color,
    pub align: Align,
    pub space_after: f32,
}

impl TextStyle {
    pub fn new(size: f32, leading: f32) -> Self {
        Self {
            size,
            leading,
            color: Color::BLACK,
            align: Align::Left,
            space_after: 0.0,
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn space_after(mut self, space_after: f32) -> Self {
        self.space_after = space_after;
        self
    }
}

/// Distance from a line's top to its baseline: the glyph box is centered in
/// the line height.
fn baseline_offset(leading: f32, size: f32) -> f32 {
    leading / 2.0 + size * 0.3
}

/// Left-to-right paragraph of styled runs.
#[derive(Debug, Clone)]
pub struct TextBlock {
    runs: Vec<Run>,
    style: TextStyle,
    layout: Option<(f32, Vec<StyledLine>)>,
}

impl TextBlock {
    pub fn new(runs: Vec<Run>, style: TextStyle) -> Self {
        Self {
            runs,
            style,
            layout: None,
        }
    }

    pub fn plain(text: impl Into<String>, font: FontId, style: TextStyle) -> Self {
        Self::new(vec![Run::new(text, font)], style)
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    fn lines(&mut self, fonts: &dyn TextMeasure, width: f32) -> &[StyledLine] {
        if !matches!(&self.layout, Some((cached, _)) if *cached == width) {
            self.layout = None;
        }
        let (runs, size) = (&self.runs, self.style.size);
        &self
            .layout
            .get_or_insert_with(|| {
                let mut pieces = Vec::new();
                for run in runs {
                    for (i, segment) in run.text.split('\n').enumerate() {
                        if i > 0 {
                            pieces.push(Piece::Break);
                        }
                        pieces.extend(segment.split_whitespace().map(|word| Piece::Word(word, run.font)));
                    }
                }
                (width, break_styled(&pieces, fonts, size, width))
            })
            .1
    }

    pub fn measure(&mut self, fonts: &dyn TextMeasure, width: f32) -> f32 {
        let leading = self.style.leading;
        let space_after = self.style.space_after;
        self.lines(fonts, width).len() as f32 * leading + space_after
    }

    pub fn draw(&mut self, fonts: &dyn TextMeasure, canvas: &mut dyn Canvas, x: f32, y: f32, width: f32) {
        let style = self.style;
        let lines = self.lines(fonts, width);
        for (i, line) in lines.iter().enumerate() {
            let mut cursor = match style.align {
                Align::Left => x,
                Align::Center => x + (width - line.width) / 2.0,
                Align::Right => x + width - line.width,
            };
            let baseline = y + i as f32 * style.leading + baseline_offset(style.leading, style.size);
            for (j, (word, font)) in line.words.iter().enumerate() {
                if j > 0 {
                    cursor += fonts.text_width(" ", *font, style.size);
                }
                canvas.draw_text(cursor, baseline, word, *font, style.size, style.color);
                cursor += fonts.text_width(word, *font, style.size);
            }
        }
    }
}

/// Right-to-left paragraph of shaped text, wrapped by measured width and
/// drawn right-aligned.
#[derive(Debug, Clone)]
pub struct RtlTextBlock {
    text: ShapedText,
    font: FontId,
    size: f32,
    leading: f32,
    padding_y: f32,
    color: Color,
    layout: Option<(f32, LineBreakResult)>,
}

impl RtlTextBlock {
    pub fn new(text: ShapedText, font: FontId, size: f32) -> Self {
        Self {
            text,
            font,
            size,
            leading: (size * RTL_LEADING_RATIO).trunc(),
            padding_y: 2.0,
            color: Color::BLACK,
            layout: None,
        }
    }

    pub fn with_leading(mut self, leading: f32) -> Self {
        self.leading = leading;
        self.layout = None;
        self
    }

    pub fn with_padding(mut self, padding_y: f32) -> Self {
        self.padding_y = padding_y;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn text(&self) -> &ShapedText {
        &self.text
    }

    pub fn font(&self) -> FontId {
        self.font
    }

    pub fn leading(&self) -> f32 {
        self.leading
    }

    pub fn padding(&self) -> f32 {
        self.padding_y
    }

    /// Line layout for `width`, reusing the last one when the width matches.
    pub fn lines(&mut self, fonts: &dyn TextMeasure, width: f32) -> &LineBreakResult {
        if !matches!(&self.layout, Some((cached, _)) if *cached == width) {
            self.layout = None;
        }
        let (text, font, size) = (&self.text, self.font, self.size);
        &self
            .layout
            .get_or_insert_with(|| (width, break_lines(text, fonts, font, size, width)))
            .1
    }

    pub fn measure(&mut self, fonts: &dyn TextMeasure, width: f32) -> f32 {
        let chrome = 2.0 * self.padding_y;
        let leading = self.leading;
        self.lines(fonts, width).len() as f32 * leading + chrome
    }

    pub fn draw(&mut self, fonts: &dyn TextMeasure, canvas: &mut dyn Canvas, x: f32, y: f32, width: f32) {
        let (font, size, leading, color) = (self.font, self.size, self.leading, self.color);
        let top = y + self.padding_y;
        let lines = self.lines(fonts, width);
        for (i, line) in lines.lines().iter().enumerate() {
            let line_width = fonts.text_width(line, font, size);
            let baseline = top + i as f32 * leading + baseline_offset(leading, size);
            canvas.draw_text(x + width - line_width, baseline, line, font, size, color);
        }
    }
}

/// Horizontal rule centered in the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Separator {
    pub width_ratio: f32,
    pub thickness: f32,
    pub padding: f32,
    pub color: Color,
}

impl Separator {
    pub fn new(width_ratio: f32, color: Color) -> Self {
        Self {
            width_ratio,
            thickness: 1.0,
            padding: 1.5,
            color,
        }
    }

    fn height(&self) -> f32 {
        self.thickness + 2.0 * self.padding
    }

    fn draw(&self, canvas: &mut dyn Canvas, x: f32, y: f32, width: f32) {
        let rule = width * self.width_ratio.clamp(0.0, 1.0);
        let start = x + (width - rule) / 2.0;
        let mid = y + self.height() / 2.0;
        canvas.draw_line(start, mid, start + rule, mid, self.thickness, self.color);
    }
}

#[derive(Debug, Clone)]
pub enum FlowElement {
    Text(TextBlock),
    Rtl(RtlTextBlock),
    Spacer(f32),
    Separator(Separator),
}

impl FlowElement {
    pub fn kind(&self) -> ElementKind {
        match self {
            FlowElement::Text(_) => ElementKind::Text,
            FlowElement::Rtl(_) => ElementKind::RtlText,
            FlowElement::Spacer(_) => ElementKind::Spacer,
            FlowElement::Separator(_) => ElementKind::Separator,
        }
    }

    /// Height this element needs in a frame `available_width` wide.
    pub fn measure(&mut self, fonts: &dyn TextMeasure, available_width: f32) -> f32 {
        match self {
            FlowElement::Text(block) => block.measure(fonts, available_width),
            FlowElement::Rtl(block) => block.measure(fonts, available_width),
            FlowElement::Spacer(height) => *height,
            FlowElement::Separator(rule) => rule.height(),
        }
    }

    /// Draw into the box whose top-left corner is `(x, y)`.
    pub fn draw(&mut self, fonts: &dyn TextMeasure, canvas: &mut dyn Canvas, x: f32, y: f32, width: f32) {
        match self {
            FlowElement::Text(block) => block.draw(fonts, canvas, x, y, width),
            FlowElement::Rtl(block) => block.draw(fonts, canvas, x, y, width),
            FlowElement::Spacer(_) => {}
            FlowElement::Separator(rule) => rule.draw(canvas, x, y, width),
        }
    }
}

impl From<TextBlock> for FlowElement {
    fn from(block: TextBlock) -> Self {
        FlowElement::Text(block)
    }
}

impl From<RtlTextBlock> for FlowElement {
    fn from(block: RtlTextBlock) -> Self {
        FlowElement::Rtl(block)
    }
}

impl From<Separator> for FlowElement {
    fn from(rule: Separator) -> Self {
        FlowElement::Separator(rule)
    }
}
