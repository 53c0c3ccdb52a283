//! Bilingual Study Notes PDF Creator
//!
//! Renders English/Urdu question-and-answer notes into paginated PDFs:
//! Urdu shaping and bidi reordering, width-aware line breaking, self-measuring
//! flow elements, page composition with a per-page watermark, and tolerant
//! parsing of model output.

pub mod answers;
pub mod canvas;
pub mod composer;
pub mod config;
pub mod decorator;
pub mod error;
pub mod flow;
pub mod fonts;
pub mod linebreak;
pub mod notes;
pub mod pdf_canvas;
pub mod shaping;

// Re-export commonly used functions and types
pub use answers::{parse_answers, QaRecord};
pub use composer::{Document, PageComposer, PageGeometry};
pub use config::LayoutConfig;
pub use error::{NotesError, Result};
pub use fonts::{FontContext, FontStatus};
pub use notes::{create_notes_pdf, create_notes_pdf_with_context, NotesPdfGenerator};
pub use shaping::{shape, ShapedText};

use log::error;
use std::ffi::{c_void, CStr};
use std::os::raw::{c_char, c_int};
use std::path::Path;

/// Fonts and layout options owned by a C caller between init and cleanup.
pub struct PdfCreatorContext {
    pub fonts: FontContext,
    pub config: LayoutConfig,
}

/// Borrow a C string as UTF-8, replacing invalid sequences. `None` for null.
unsafe fn c_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
}

fn status_code(result: Result<Document>) -> c_int {
    match result {
        Ok(_) => 0,
        Err(e) => {
            error!("PDF generation failed: {}", e);
            -1
        }
    }
}

/// Render a chapter's raw model response into a notes PDF using the
/// process-wide fonts and the default layout.
#[no_mangle]
pub extern "C" fn generate_notes_pdf(
    chapter_name: *const c_char,
    response_json: *const c_char,
    output_path: *const c_char,
) -> c_int {
    let args = unsafe { (c_string(chapter_name), c_string(response_json), c_string(output_path)) };
    let (Some(chapter_name), Some(response_json), Some(output_path)) = args else {
        return -1;
    };

    let records = parse_answers(&response_json);
    status_code(create_notes_pdf(&chapter_name, &records, Path::new(&output_path)))
}

/// Initialize the PDF creator (load fonts, etc.)
#[no_mangle]
pub extern "C" fn init_pdf_creator() -> *mut c_void {
    let config = LayoutConfig::default();
    match FontContext::load(&config) {
        Ok(fonts) => Box::into_raw(Box::new(PdfCreatorContext { fonts, config })) as *mut c_void,
        Err(e) => {
            error!("Font initialization failed: {}", e);
            std::ptr::null_mut()
        }
    }
}

/// Cleanup PDF creator resources
#[no_mangle]
pub extern "C" fn cleanup_pdf_creator(context: *mut c_void) {
    if !context.is_null() {
        unsafe {
            drop(Box::from_raw(context as *mut PdfCreatorContext));
        }
    }
}

/// Replace the layout options from a JSON object. Keys left out keep their
/// defaults. Fonts are reloaded when the font search paths change.
#[no_mangle]
pub extern "C" fn set_pdf_options_json(context: *mut c_void, options_json: *const c_char) -> c_int {
    if context.is_null() {
        return -1;
    }
    let Some(options_json) = (unsafe { c_string(options_json) }) else {
        return -1;
    };

    let context = unsafe { &mut *(context as *mut PdfCreatorContext) };
    let config = match LayoutConfig::from_json(&options_json) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid PDF options: {}", e);
            return -1;
        }
    };

    if config.urdu_font_paths != context.config.urdu_font_paths {
        match FontContext::load(&config) {
            Ok(fonts) => context.fonts = fonts,
            Err(e) => {
                error!("Font initialization failed: {}", e);
                return -1;
            }
        }
    }
    context.config = config;

    0 // Success
}

/// Like [`generate_notes_pdf`] with the fonts and options of an initialized context.
#[no_mangle]
pub extern "C" fn generate_notes_pdf_with_context(
    context: *mut c_void,
    chapter_name: *const c_char,
    response_json: *const c_char,
    output_path: *const c_char,
) -> c_int {
    if context.is_null() {
        return -1;
    }
    let args = unsafe { (c_string(chapter_name), c_string(response_json), c_string(output_path)) };
    let (Some(chapter_name), Some(response_json), Some(output_path)) = args else {
        return -1;
    };

    let context = unsafe { &*(context as *const PdfCreatorContext) };
    let mut generator = NotesPdfGenerator::new(&context.fonts, context.config.clone());
    status_code(generator.generate_from_response(&chapter_name, &response_json, Path::new(&output_path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn null_arguments_are_rejected() {
        assert_eq!(generate_notes_pdf(std::ptr::null(), std::ptr::null(), std::ptr::null()), -1);
        assert_eq!(set_pdf_options_json(std::ptr::null_mut(), std::ptr::null()), -1);
        assert_eq!(
            generate_notes_pdf_with_context(std::ptr::null_mut(), std::ptr::null(), std::ptr::null(), std::ptr::null()),
            -1
        );
        cleanup_pdf_creator(std::ptr::null_mut());
    }

    #[test]
    fn context_lifecycle_generates_a_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("Biology_notes.pdf");

        let context = init_pdf_creator();
        assert!(!context.is_null());

        let options = CString::new(r#"{"header_brand": "Test Notes"}"#).unwrap();
        assert_eq!(set_pdf_options_json(context, options.as_ptr()), 0);
        let bad_options = CString::new("{header_brand").unwrap();
        assert_eq!(set_pdf_options_json(context, bad_options.as_ptr()), -1);

        let chapter = CString::new("Biology").unwrap();
        let response = CString::new(r#"{"questions":[{"question":"Q","answer_en":"A","answer_ur":"ج"}]}"#).unwrap();
        let path = CString::new(output.to_str().unwrap()).unwrap();
        let status = generate_notes_pdf_with_context(context, chapter.as_ptr(), response.as_ptr(), path.as_ptr());
        cleanup_pdf_creator(context);

        assert_eq!(status, 0);
        assert!(lopdf::Document::load(&output).is_ok());
    }
}
