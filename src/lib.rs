//! GoodWill Notes DLL
//!
//! FFI bridge for GUI and web hosts: chapter folder workflow, logging setup
//! and font diagnostics on top of `notes-pdf-creator`.

pub mod chapter;

pub use chapter::{
    delete_chapter, list_chapters, process_chapter_response, read_chapter_notes, sanitize_chapter_name,
    ChapterPaths, ChapterSummary,
};

use log::error;
use notes_pdf_creator::{FontContext, LayoutConfig};
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::path::Path;

/// Install an `env_logger` logger (default level `info`, overridable with
/// `RUST_LOG`). Returns `false` when a logger was already installed.
pub fn init_logging() -> bool {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init()
        .is_ok()
}

/// Font diagnostics of the process-wide fonts as JSON.
pub fn font_status_json() -> anyhow::Result<String> {
    Ok(serde_json::to_string(&FontContext::shared().status())?)
}

unsafe fn c_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
}

/// Hand a string to the caller, who releases it with [`notes_free_string`].
fn into_c_string(value: String) -> *mut c_char {
    match CString::new(value) {
        Ok(s) => s.into_raw(),
        Err(e) => {
            error!("string passed to host contains a NUL byte: {}", e);
            std::ptr::null_mut()
        }
    }
}

#[no_mangle]
pub extern "C" fn notes_init_logging() -> c_int {
    if init_logging() {
        0
    } else {
        1
    }
}

/// Store a model response for a chapter and render its notes PDF.
///
/// `options_json` may be null for the default layout. Returns the PDF path
/// (free with [`notes_free_string`]) or null on failure.
#[no_mangle]
pub extern "C" fn notes_generate_chapter_pdf(
    chapters_dir: *const c_char,
    chapter_name: *const c_char,
    response_json: *const c_char,
    options_json: *const c_char,
) -> *mut c_char {
    let args = unsafe { (c_string(chapters_dir), c_string(chapter_name), c_string(response_json)) };
    let (Some(chapters_dir), Some(chapter_name), Some(response_json)) = args else {
        return std::ptr::null_mut();
    };

    let config = match unsafe { c_string(options_json) } {
        Some(json) => match LayoutConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                error!("Invalid PDF options: {}", e);
                return std::ptr::null_mut();
            }
        },
        None => LayoutConfig::default(),
    };

    match process_chapter_response(Path::new(&chapters_dir), &chapter_name, &response_json, &config) {
        Ok(path) => into_c_string(path.to_string_lossy().into_owned()),
        Err(e) => {
            error!("{:#}", e);
            std::ptr::null_mut()
        }
    }
}

/// Chapter summaries as a JSON array, or null on failure.
#[no_mangle]
pub extern "C" fn notes_list_chapters_json(chapters_dir: *const c_char) -> *mut c_char {
    let Some(chapters_dir) = (unsafe { c_string(chapters_dir) }) else {
        return std::ptr::null_mut();
    };
    let listed = list_chapters(Path::new(&chapters_dir))
        .and_then(|chapters| Ok(serde_json::to_string(&chapters)?));
    match listed {
        Ok(json) => into_c_string(json),
        Err(e) => {
            error!("{:#}", e);
            std::ptr::null_mut()
        }
    }
}

/// `0` when the chapter was deleted, `1` when it did not exist, `-1` on error.
#[no_mangle]
pub extern "C" fn notes_delete_chapter(chapters_dir: *const c_char, chapter_name: *const c_char) -> c_int {
    let args = unsafe { (c_string(chapters_dir), c_string(chapter_name)) };
    let (Some(chapters_dir), Some(chapter_name)) = args else {
        return -1;
    };
    match delete_chapter(Path::new(&chapters_dir), &chapter_name) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            error!("{:#}", e);
            -1
        }
    }
}

#[no_mangle]
pub extern "C" fn notes_font_status_json() -> *mut c_char {
    match font_status_json() {
        Ok(json) => into_c_string(json),
        Err(e) => {
            error!("{:#}", e);
            std::ptr::null_mut()
        }
    }
}

/// Release a string returned by this library.
#[no_mangle]
pub extern "C" fn notes_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            drop(CString::from_raw(ptr));
        }
    }
}
