//! Drawing surface used by flow elements and page decorators.
//!
//! Coordinates are in points with the origin at the page's top-left corner
//! and y growing downward, except for [`Canvas::draw_rotated_text`] which
//! works in a frame anchored at the bottom-left corner.

use crate::error::Result;
use crate::fonts::FontId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Color from a `0xRRGGBB` literal.
    pub fn hex(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xFF) as f32 / 255.0,
            g: ((value >> 8) & 0xFF) as f32 / 255.0,
            b: (value & 0xFF) as f32 / 255.0,
        }
    }
}

pub trait Canvas {
    /// Draw `text` with its left edge at `x` and its baseline at `baseline`.
    fn draw_text(&mut self, x: f32, baseline: f32, text: &str, font: FontId, size: f32, color: Color);

    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, thickness: f32, color: Color);

    /// Draw `text` in a frame rotated by `angle` degrees about the page's
    /// bottom-left corner. `(x, y)` are in that frame with y pointing up.
    #[allow(clippy::too_many_arguments)]
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
    );

    /// Seal the current page. Later calls draw on a fresh page.
    fn show_page(&mut self) -> Result<()>;
}

/// One recorded canvas call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Text {
        x: f32,
        baseline: f32,
        text: String,
        font: FontId,
        size: f32,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
    RotatedText {
        angle: f32,
        text: String,
        alpha: f32,
    },
    ShowPage,
}

/// Canvas that keeps a log of every call instead of producing output.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    pub calls: Vec<DrawCall>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages_shown(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, DrawCall::ShowPage)).count()
    }

    /// Calls grouped by page, split at each `ShowPage`.
    pub fn pages(&self) -> Vec<&[DrawCall]> {
        self.calls
            .split_inclusive(|c| matches!(c, DrawCall::ShowPage))
            .filter(|page| page.last() == Some(&DrawCall::ShowPage))
            .collect()
    }

    /// Text of every `draw_text` call in drawing order.
    pub fn texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for RecordingCanvas {
    fn draw_text(&mut self, x: f32, baseline: f32, text: &str, font: FontId, size: f32, _color: Color) {
        self.calls.push(DrawCall::Text {
            x,
            baseline,
            text: text.to_string(),
            font,
            size,
        });
    }

    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, _thickness: f32, _color: Color) {
        self.calls.push(DrawCall::Line { x1, y1, x2, y2 });
    }

    fn draw_rotated_text(
        &mut self,
        angle: f32,
        _x: f32,
        _y: f32,
        text: &str,
        _font: FontId,
        _size: f32,
        _color: Color,
        alpha: f32,
    ) {
        self.calls.push(DrawCall::RotatedText {
            angle,
            text: text.to_string(),
            alpha,
        });
    }

    fn show_page(&mut self) -> Result<()> {
        self.calls.push(DrawCall::ShowPage);
        Ok(())
    }
}
