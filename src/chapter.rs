//! Chapter folders
//!
//! Each chapter lives in its own directory under a chapters root holding the
//! uploaded images, the raw model response dump `<name>_notes.txt` and the
//! rendered `<name>_notes.pdf`. Work on one chapter is serialized through a
//! per-chapter lock because the text dump and the PDF are written one after
//! the other.

use anyhow::{Context, Result};
use log::info;
use notes_pdf_creator::{parse_answers, FontContext, LayoutConfig, NotesPdfGenerator};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};
use std::time::UNIX_EPOCH;

/// Extensions counted as chapter images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

const NOTES_SUFFIX: &str = "_notes.txt";
const PDF_SUFFIX: &str = "_notes.pdf";
const RESPONSE_HEADING: &str = "Questions and Answers (JSON Format):";

/// Make a user-supplied chapter name safe to use as a directory and file name.
///
/// Keeps ASCII letters, digits, `.`, `_` and `-`; whitespace and path
/// separators become `_`; leading and trailing dots and underscores are
/// dropped. Names with nothing left become `chapter`.
pub fn sanitize_chapter_name(name: &str) -> String {
    let spaced: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "chapter".to_string()
    } else {
        trimmed.to_string()
    }
}

/// File locations of one chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterPaths {
    pub name: String,
    pub dir: PathBuf,
    pub notes_txt: PathBuf,
    pub notes_pdf: PathBuf,
}

impl ChapterPaths {
    /// Paths for `name`, which is sanitized first.
    pub fn new(chapters_dir: &Path, name: &str) -> Self {
        let name = sanitize_chapter_name(name);
        let dir = chapters_dir.join(&name);
        Self {
            notes_txt: dir.join(format!("{}{}", name, NOTES_SUFFIX)),
            notes_pdf: dir.join(format!("{}{}", name, PDF_SUFFIX)),
            dir,
            name,
        }
    }
}

type LockRegistry = Mutex<HashMap<String, Weak<Mutex<()>>>>;

fn lock_registry() -> &'static LockRegistry {
    static LOCKS: OnceLock<LockRegistry> = OnceLock::new();
    LOCKS.get_or_init(Default::default)
}

/// Lock serializing work on one chapter. The registry only holds weak
/// references; entries nobody holds are pruned when a new lock is made.
fn chapter_lock(name: &str) -> Arc<Mutex<()>> {
    let mut locks = lock_registry().lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(lock) = locks.get(name).and_then(Weak::upgrade) {
        return lock;
    }
    locks.retain(|_, lock| lock.strong_count() > 0);
    let lock = Arc::new(Mutex::new(()));
    locks.insert(name.to_string(), Arc::downgrade(&lock));
    lock
}

/// Contents of the raw-response dump.
pub fn notes_dump(chapter: &str, raw_response: &str) -> String {
    format!(
        "Chapter: {}\n{}\n\n{}\n{}",
        chapter,
        "=".repeat(50),
        RESPONSE_HEADING,
        raw_response
    )
}

/// Store a model response for a chapter and render its notes PDF.
///
/// Writes `<name>_notes.txt` first, then `<name>_notes.pdf`, and returns the
/// PDF path. Unparseable responses still produce a PDF with a placeholder.
pub fn process_chapter_response(
    chapters_dir: &Path,
    chapter_name: &str,
    raw_response: &str,
    config: &LayoutConfig,
) -> Result<PathBuf> {
    let paths = ChapterPaths::new(chapters_dir, chapter_name);
    let lock = chapter_lock(&paths.name);
    let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

    fs::create_dir_all(&paths.dir)
        .with_context(|| format!("failed to create chapter folder {}", paths.dir.display()))?;
    fs::write(&paths.notes_txt, notes_dump(&paths.name, raw_response))
        .with_context(|| format!("failed to write {}", paths.notes_txt.display()))?;

    let records = parse_answers(raw_response);
    info!("Processing chapter {} ({} questions)", paths.name, records.len());

    let loaded;
    let fonts = if config.urdu_font_paths == LayoutConfig::default().urdu_font_paths {
        FontContext::shared()
    } else {
        loaded = FontContext::load(config).context("failed to load the Urdu font")?;
        &loaded
    };

    NotesPdfGenerator::new(fonts, config.clone())
        .generate(&paths.name, &records, &paths.notes_pdf)
        .with_context(|| format!("PDF creation failed for chapter {}", paths.name))?;

    Ok(paths.notes_pdf)
}

/// The stored raw-response dump of a chapter.
pub fn read_chapter_notes(chapters_dir: &Path, chapter_name: &str) -> Result<String> {
    let paths = ChapterPaths::new(chapters_dir, chapter_name);
    fs::read_to_string(&paths.notes_txt).with_context(|| format!("notes file not found: {}", paths.notes_txt.display()))
}

/// Path of a chapter's notes PDF, if it has been rendered.
pub fn chapter_pdf_path(chapters_dir: &Path, chapter_name: &str) -> Option<PathBuf> {
    let paths = ChapterPaths::new(chapters_dir, chapter_name);
    paths.notes_pdf.is_file().then_some(paths.notes_pdf)
}

/// What a chapter folder currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterSummary {
    pub name: String,
    pub image_count: usize,
    pub has_notes: bool,
    pub has_pdf: bool,
    /// Modification time of the notes dump, seconds since the Unix epoch.
    pub notes_modified: Option<u64>,
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

/// Summaries of every chapter folder, sorted by name. A missing chapters
/// directory has no chapters.
pub fn list_chapters(chapters_dir: &Path) -> Result<Vec<ChapterSummary>> {
    if !chapters_dir.exists() {
        return Ok(Vec::new());
    }

    let mut chapters = Vec::new();
    for entry in fs::read_dir(chapters_dir).with_context(|| format!("failed to read {}", chapters_dir.display()))? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let mut summary = ChapterSummary {
            name: entry.file_name().to_string_lossy().into_owned(),
            image_count: 0,
            has_notes: false,
            has_pdf: false,
            notes_modified: None,
        };
        for file in fs::read_dir(entry.path())? {
            let file = file?;
            let path = file.path();
            let file_name = file.file_name().to_string_lossy().into_owned();
            if path.is_file() && is_image(&path) {
                summary.image_count += 1;
            }
            if file_name.ends_with(NOTES_SUFFIX) {
                summary.has_notes = true;
                summary.notes_modified = file
                    .metadata()
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
                    .map(|age| age.as_secs());
            }
            if file_name.ends_with(PDF_SUFFIX) {
                summary.has_pdf = true;
            }
        }
        chapters.push(summary);
    }

    chapters.sort_by(|a, b| a.name.cmp(&b.name));
    info!("Found {} chapters", chapters.len());
    Ok(chapters)
}

/// Remove a chapter folder. Returns `false` when there was nothing to delete.
pub fn delete_chapter(chapters_dir: &Path, chapter_name: &str) -> Result<bool> {
    let paths = ChapterPaths::new(chapters_dir, chapter_name);
    let lock = chapter_lock(&paths.name);
    let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

    if !paths.dir.is_dir() {
        return Ok(false);
    }
    fs::remove_dir_all(&paths.dir).with_context(|| format!("failed to delete {}", paths.dir.display()))?;
    info!("Chapter {} deleted", paths.name);
    Ok(true)
}
