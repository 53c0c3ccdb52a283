//! Layout options
//!
//! Defaults reproduce the study-notes layout: A4 pages, 60pt side margins,
//! 80pt top and 60pt bottom margin, Noto Naskh Arabic for Urdu text.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable whose value is tried before the configured font paths.
pub const URDU_FONT_ENV: &str = "NOTES_URDU_FONT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,

    /// Candidate locations of the Urdu TrueType font, tried in order.
    pub urdu_font_paths: Vec<PathBuf>,

    pub header_brand: String,
    pub watermark_title: String,
    pub watermark_subtitle: String,
    pub footer_title: String,
    pub footer_tagline: String,
    pub footer_motto: String,
    pub producer: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width: 595.2756,
            page_height: 841.8898,
            margin_left: 60.0,
            margin_right: 60.0,
            margin_top: 80.0,
            margin_bottom: 60.0,
            urdu_font_paths: vec![
                PathBuf::from("fonts/NotoNaskhArabic-Regular.ttf"),
                PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/fonts/NotoNaskhArabic-Regular.ttf")),
                PathBuf::from("/usr/share/fonts/truetype/noto/NotoNaskhArabic-Regular.ttf"),
                PathBuf::from("/usr/share/fonts/noto/NotoNaskhArabic-Regular.ttf"),
                PathBuf::from("C:\\Windows\\Fonts\\NotoNaskhArabic-Regular.ttf"),
            ],
            header_brand: "GoodWill Educational Content".to_string(),
            watermark_title: "GoodWill".to_string(),
            watermark_subtitle: "Educational Content".to_string(),
            footer_title: "Generated by GoodWill Notes Maker".to_string(),
            footer_tagline: "Educational content for exam preparation".to_string(),
            footer_motto: "Study well, succeed better!".to_string(),
            producer: "GoodWill Notes Maker".to_string(),
        }
    }
}

impl LayoutConfig {
    /// Parse options from JSON. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Font paths to try, with the environment override first.
    pub fn font_search_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::with_capacity(self.urdu_font_paths.len() + 1);
        if let Some(path) = std::env::var_os(URDU_FONT_ENV) {
            paths.push(PathBuf::from(path));
        }
        paths.extend(self.urdu_font_paths.iter().cloned());
        paths
    }

    /// Width available to flow elements between the side margins.
    pub fn frame_width(&self) -> f32 {
        self.page_width - self.margin_left - self.margin_right
    }

    pub fn frame_height(&self) -> f32 {
        self.page_height - self.margin_top - self.margin_bottom
    }
}
