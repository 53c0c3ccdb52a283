//! Per-page decoration, run by the composer once per page right before the
//! page is sealed.

use crate::canvas::{Canvas, Color};
use crate::composer::PageGeometry;
use crate::config::LayoutConfig;
use crate::fonts::FontId;

pub trait PageDecorator {
    fn decorate(&self, canvas: &mut dyn Canvas, geometry: &PageGeometry, page_number: usize);
}

impl<F> PageDecorator for F
where
    F: Fn(&mut dyn Canvas, &PageGeometry, usize),
{
    fn decorate(&self, canvas: &mut dyn Canvas, geometry: &PageGeometry, page_number: usize) {
        self(canvas, geometry, page_number)
    }
}

/// Leaves pages untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDecoration;

impl PageDecorator for NoDecoration {
    fn decorate(&self, _canvas: &mut dyn Canvas, _geometry: &PageGeometry, _page_number: usize) {}
}

/// Diagonal brand mark, identical on every page.
#[derive(Debug, Clone)]
pub struct Watermark {
    pub title: String,
    pub subtitle: String,
    pub angle: f32,
    pub color: Color,
    pub alpha: f32,
}

impl Watermark {
    pub fn new(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            angle: 45.0,
            color: Color::rgb(0.9, 0.9, 0.9),
            alpha: 0.2,
        }
    }

    pub fn from_config(config: &LayoutConfig) -> Self {
        Self::new(config.watermark_title.clone(), config.watermark_subtitle.clone())
    }
}

impl PageDecorator for Watermark {
    fn decorate(&self, canvas: &mut dyn Canvas, _geometry: &PageGeometry, _page_number: usize) {
        canvas.draw_rotated_text(
            self.angle,
            200.0,
            100.0,
            &self.title,
            FontId::HelveticaBold,
            50.0,
            self.color,
            self.alpha,
        );
        canvas.draw_rotated_text(
            self.angle,
            220.0,
            50.0,
            &self.subtitle,
            FontId::Helvetica,
            20.0,
            self.color,
            self.alpha,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawCall, RecordingCanvas};

    #[test]
    fn watermark_draws_title_and_subtitle() {
        let mut canvas = RecordingCanvas::new();
        let watermark = Watermark::from_config(&LayoutConfig::default());
        watermark.decorate(&mut canvas, &PageGeometry::a4(), 1);

        assert_eq!(
            canvas.calls,
            vec![
                DrawCall::RotatedText {
                    angle: 45.0,
                    text: "GoodWill".to_string(),
                    alpha: 0.2
                },
                DrawCall::RotatedText {
                    angle: 45.0,
                    text: "Educational Content".to_string(),
                    alpha: 0.2
                },
            ]
        );
    }

    #[test]
    fn closures_act_as_decorators() {
        let decorate = |canvas: &mut dyn Canvas, _: &PageGeometry, page: usize| {
            canvas.draw_text(0.0, 0.0, &format!("page {page}"), FontId::Helvetica, 8.0, Color::BLACK);
        };
        let mut canvas = RecordingCanvas::new();
        decorate.decorate(&mut canvas, &PageGeometry::a4(), 3);
        assert_eq!(canvas.texts(), vec!["page 3"]);
    }
}
