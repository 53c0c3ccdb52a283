//! Page composition
//!
//! Places flow elements top-down inside the page frame. An element that does
//! not fit in the space left on a page moves whole to the next page; an
//! element taller than an empty frame is placed anyway and overflows the
//! bottom margin.

use crate::canvas::Canvas;
use crate::config::LayoutConfig;
use crate::decorator::PageDecorator;
use crate::error::{NotesError, Result};
use crate::flow::{ElementKind, FlowElement};
use crate::fonts::TextMeasure;
use log::{debug, warn};

/// Tolerance for float comparisons against the remaining frame height.
const FIT_EPSILON: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
}

impl PageGeometry {
    pub fn a4() -> Self {
        Self::from_config(&LayoutConfig::default())
    }

    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            width: config.page_width,
            height: config.page_height,
            margin_left: config.margin_left,
            margin_right: config.margin_right,
            margin_top: config.margin_top,
            margin_bottom: config.margin_bottom,
        }
    }

    pub fn frame_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    pub fn frame_height(&self) -> f32 {
        self.height - self.margin_top - self.margin_bottom
    }

    /// Lowest y (from the top) content may reach.
    pub fn frame_bottom(&self) -> f32 {
        self.height - self.margin_bottom
    }
}

/// Where one element ended up on its page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub index: usize,
    pub kind: ElementKind,
    pub top: f32,
    pub height: f32,
    pub overflows: bool,
}

/// One page of the composed document.
///
/// `cursor` is the y offset from the top edge where the next element would
/// go; once the page is sealed it marks the bottom of the last placement.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub number: usize,
    pub geometry: PageGeometry,
    pub cursor: f32,
    pub placements: Vec<Placement>,
}

impl Page {
    fn new(number: usize, geometry: PageGeometry) -> Self {
        Self {
            number,
            geometry,
            cursor: geometry.margin_top,
            placements: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Height left in the frame below the cursor. Negative after an overflow.
    pub fn remaining(&self) -> f32 {
        self.geometry.frame_bottom() - self.cursor
    }
}

/// The composed document: pages in order, each listing its placements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub pages: Vec<Page>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn placements(&self) -> impl Iterator<Item = &Placement> {
        self.pages.iter().flat_map(|page| page.placements.iter())
    }
}

pub struct PageComposer<'a> {
    geometry: PageGeometry,
    fonts: &'a dyn TextMeasure,
    decorator: &'a dyn PageDecorator,
}

impl<'a> PageComposer<'a> {
    pub fn new(geometry: PageGeometry, fonts: &'a dyn TextMeasure, decorator: &'a dyn PageDecorator) -> Self {
        Self {
            geometry,
            fonts,
            decorator,
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Lay out `elements` in order onto `canvas`, decorating and sealing every page.
    pub fn compose(&self, elements: &mut [FlowElement], canvas: &mut dyn Canvas) -> Result<Document> {
        let geometry = self.geometry;
        let width = geometry.frame_width();
        let mut pages = Vec::new();
        let mut page = Page::new(1, geometry);

        for (index, element) in elements.iter_mut().enumerate() {
            let height = element.measure(self.fonts, width);
            if !height.is_finite() || height < 0.0 {
                return Err(NotesError::Render(format!(
                    "element {} measured an invalid height {}",
                    index, height
                )));
            }

            let remaining = page.remaining();
            if height > remaining + FIT_EPSILON && !page.is_empty() {
                debug!(
                    "page {} full ({:.1}pt left, element {} needs {:.1}pt)",
                    page.number, remaining, index, height
                );
                let next = Page::new(page.number + 1, geometry);
                self.finish_page(canvas, &page)?;
                pages.push(std::mem::replace(&mut page, next));
            }

            let overflows = height > geometry.frame_height() + FIT_EPSILON;
            if overflows {
                warn!(
                    "element {} is {:.1}pt tall, more than a page frame ({:.1}pt); it will overflow the bottom margin",
                    index,
                    height,
                    geometry.frame_height()
                );
            }

            element.draw(self.fonts, canvas, geometry.margin_left, page.cursor, width);
            page.placements.push(Placement {
                index,
                kind: element.kind(),
                top: page.cursor,
                height,
                overflows,
            });
            page.cursor += height;
        }

        self.finish_page(canvas, &page)?;
        pages.push(page);

        Ok(Document { pages })
    }

    fn finish_page(&self, canvas: &mut dyn Canvas, page: &Page) -> Result<()> {
        self.decorator.decorate(canvas, &self.geometry, page.number);
        canvas.show_page()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Color, DrawCall, RecordingCanvas};
    use crate::decorator::{NoDecoration, Watermark};
    use crate::fonts::FontId;
    use crate::flow::{Separator, TextBlock, TextStyle};

    struct Monospace;

    impl TextMeasure for Monospace {
        fn text_width(&self, text: &str, _font: FontId, size: f32) -> f32 {
            text.chars().count() as f32 * size
        }
    }

    fn small_page() -> PageGeometry {
        PageGeometry {
            width: 200.0,
            height: 200.0,
            margin_left: 10.0,
            margin_right: 10.0,
            margin_top: 20.0,
            margin_bottom: 20.0,
        }
    }

    #[test]
    fn elements_that_fit_share_a_page() {
        let mut elements = vec![FlowElement::Spacer(50.0), FlowElement::Spacer(50.0), FlowElement::Spacer(60.0)];
        let mut canvas = RecordingCanvas::new();
        let document = PageComposer::new(small_page(), &Monospace, &NoDecoration)
            .compose(&mut elements, &mut canvas)
            .unwrap();

        assert_eq!(document.page_count(), 1);
        let tops: Vec<f32> = document.placements().map(|p| p.top).collect();
        assert_eq!(tops, vec![20.0, 70.0, 120.0]);
        assert_eq!(canvas.pages_shown(), 1);
    }

    #[test]
    fn element_that_does_not_fit_moves_whole_to_next_page() {
        let mut elements = vec![FlowElement::Spacer(100.0), FlowElement::Spacer(70.0)];
        let mut canvas = RecordingCanvas::new();
        let document = PageComposer::new(small_page(), &Monospace, &NoDecoration)
            .compose(&mut elements, &mut canvas)
            .unwrap();

        assert_eq!(document.page_count(), 2);
        assert_eq!(document.pages[1].placements[0].index, 1);
        assert_eq!(document.pages[1].placements[0].top, 20.0);
    }

    #[test]
    fn pages_record_their_geometry_and_final_cursor() {
        let mut elements = vec![FlowElement::Spacer(100.0), FlowElement::Spacer(30.0), FlowElement::Spacer(70.0)];
        let mut canvas = RecordingCanvas::new();
        let document = PageComposer::new(small_page(), &Monospace, &NoDecoration)
            .compose(&mut elements, &mut canvas)
            .unwrap();

        assert_eq!(document.page_count(), 2);
        for page in &document.pages {
            assert_eq!(page.geometry, small_page());
        }
        assert_eq!(document.pages[0].cursor, 150.0);
        assert_eq!(document.pages[0].remaining(), 30.0);
        assert_eq!(document.pages[1].cursor, 90.0);
    }

    #[test]
    fn oversized_element_overflows_a_fresh_page() {
        let mut elements = vec![
            FlowElement::Spacer(10.0),
            FlowElement::Spacer(500.0),
            FlowElement::Spacer(10.0),
        ];
        let mut canvas = RecordingCanvas::new();
        let document = PageComposer::new(small_page(), &Monospace, &NoDecoration)
            .compose(&mut elements, &mut canvas)
            .unwrap();

        assert_eq!(document.page_count(), 3);
        let big = document.pages[1].placements[0];
        assert_eq!(big.index, 1);
        assert_eq!(big.top, 20.0);
        assert!(big.overflows);
        assert_eq!(document.pages[2].placements[0].index, 2);
    }

    #[test]
    fn oversized_first_element_does_not_leave_an_empty_page() {
        let mut elements = vec![FlowElement::Spacer(500.0)];
        let mut canvas = RecordingCanvas::new();
        let document = PageComposer::new(small_page(), &Monospace, &NoDecoration)
            .compose(&mut elements, &mut canvas)
            .unwrap();
        assert_eq!(document.page_count(), 1);
        assert!(document.pages[0].placements[0].overflows);
    }

    #[test]
    fn every_page_is_decorated_once_before_it_is_sealed() {
        let mut elements: Vec<FlowElement> = (0..12)
            .map(|i| {
                FlowElement::from(TextBlock::plain(
                    format!("Q{} text", i + 1),
                    FontId::Helvetica,
                    TextStyle::new(1.0, 40.0),
                ))
            })
            .collect();
        let mut canvas = RecordingCanvas::new();
        let watermark = Watermark::new("GoodWill", "Educational Content");
        let document = PageComposer::new(small_page(), &Monospace, &watermark)
            .compose(&mut elements, &mut canvas)
            .unwrap();

        assert!(document.page_count() > 1);
        let pages = canvas.pages();
        assert_eq!(pages.len(), document.page_count());
        for page in pages {
            let marks = page.iter().filter(|c| matches!(c, DrawCall::RotatedText { .. })).count();
            assert_eq!(marks, 2);
            // decoration comes after the content, right before the page is sealed
            let n = page.len();
            assert!(matches!(page[n - 2], DrawCall::RotatedText { .. }));
            assert_eq!(page[n - 1], DrawCall::ShowPage);
        }

        let order: Vec<usize> = document.placements().map(|p| p.index).collect();
        assert_eq!(order, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn no_element_crosses_the_bottom_margin_unless_oversized() {
        let mut elements: Vec<FlowElement> = (0..30)
            .map(|i| match i % 3 {
                0 => FlowElement::Spacer(23.0),
                1 => FlowElement::from(Separator::new(0.85, Color::BLACK)),
                _ => FlowElement::from(TextBlock::plain("aa bb cc dd", FontId::Helvetica, TextStyle::new(10.0, 12.0))),
            })
            .collect();
        let geometry = small_page();
        let mut canvas = RecordingCanvas::new();
        let document = PageComposer::new(geometry, &Monospace, &NoDecoration)
            .compose(&mut elements, &mut canvas)
            .unwrap();

        for placement in document.placements() {
            assert!(placement.top + placement.height <= geometry.frame_bottom() + FIT_EPSILON);
        }
    }

    #[test]
    fn empty_story_still_produces_one_decorated_page() {
        let mut canvas = RecordingCanvas::new();
        let watermark = Watermark::new("GoodWill", "Educational Content");
        let document = PageComposer::new(small_page(), &Monospace, &watermark)
            .compose(&mut [], &mut canvas)
            .unwrap();
        assert_eq!(document.page_count(), 1);
        assert_eq!(canvas.pages_shown(), 1);
    }

    #[test]
    fn invalid_heights_are_render_errors() {
        let mut elements = vec![FlowElement::Spacer(f32::NAN)];
        let mut canvas = RecordingCanvas::new();
        let result = PageComposer::new(small_page(), &Monospace, &NoDecoration).compose(&mut elements, &mut canvas);
        assert!(matches!(result, Err(NotesError::Render(_))));
    }
}
