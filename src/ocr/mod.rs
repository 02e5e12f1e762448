//! Text extraction over captured frames.
//!
//! Recognition is strictly per page and failures degrade to an empty string:
//! one unreadable page must not cost the other two hundred. The dual-pass
//! dark-mode path runs the recognizer twice per page (raw and inverted
//! variant) and keeps whichever result carries more characters.

pub mod preprocess;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::capture::frame_store::PageFrame;
use crate::job::events::EventSink;

use preprocess::normalize_dark_theme;

const ENABLE_LOGS: bool = true;
use crate::{log_info, log_warn};

const DARK_VARIANT_SUFFIX: &str = "_inverted";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrConfig {
    /// Language tags in priority order, as the host presents them
    /// ("ja", "en"). Mapped to engine-specific codes by the recognizer.
    pub languages: Vec<String>,
    /// Run the inverted second pass and keep the richer result.
    pub dark_mode_fallback: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: vec!["ja".into(), "en".into()],
            dark_mode_fallback: true,
        }
    }
}

/// External OCR engine. `recognize` returns the full recognized text for
/// one image; an error means the engine itself failed, not that the page
/// was blank.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image_path: &Path, languages: &[String]) -> Result<String>;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageText {
    pub index: u32,
    pub text: String,
}

/// Recognize every frame in order. The returned vector always has one entry
/// per processed frame, empty text standing in for failed pages, so page
/// numbering in the artifact stays aligned with the frames. Cancellation
/// stops between pages and the partial result is returned.
pub fn consolidate(
    recognizer: &dyn TextRecognizer,
    frames: &[PageFrame],
    config: &OcrConfig,
    token: &CancellationToken,
    events: &EventSink,
    progress_base: f32,
    progress_span: f32,
) -> Vec<PageText> {
    let total = frames.len();
    let mut pages = Vec::with_capacity(total);

    for (done, frame) in frames.iter().enumerate() {
        if token.is_cancelled() {
            events.log(format!(
                "text extraction stopped at page {done} of {total}"
            ));
            break;
        }

        let text = recognize_page(recognizer, frame, config, events);

        events.log(format!(
            "[{}/{total}] {} -> {} chars",
            done + 1,
            file_name(&frame.image_path),
            text.chars().count()
        ));
        events.progress(Some(
            progress_base + (done + 1) as f32 / total as f32 * progress_span,
        ));

        pages.push(PageText {
            index: frame.index,
            text,
        });
    }

    pages
}

/// Each pass degrades to an empty string on failure, so a crashed raw pass
/// still lets the inverted pass rescue the page and vice versa. Only when
/// every pass fails does the page stay empty.
fn recognize_page(
    recognizer: &dyn TextRecognizer,
    frame: &PageFrame,
    config: &OcrConfig,
    events: &EventSink,
) -> String {
    let raw = run_pass(recognizer, &frame.image_path, config, frame.index, events);
    if !config.dark_mode_fallback {
        return raw;
    }

    // Second pass over an inverted variant; the variant file is transient
    // and removed regardless of which pass wins.
    let variant = dark_variant_path(&frame.image_path);
    let dark = match normalize_dark_theme(&frame.image_path, &variant) {
        Ok(()) => {
            let dark = run_pass(recognizer, &variant, config, frame.index, events);
            let _ = fs::remove_file(&variant);
            dark
        }
        Err(err) => {
            log_warn!(
                "dark-theme normalization failed on page {}: {err:#}",
                frame.index + 1
            );
            String::new()
        }
    };

    // Strictly more characters wins; ties keep the raw pass.
    if dark.chars().count() > raw.chars().count() {
        log_info!(
            "page {}: inverted pass kept ({} > {} chars)",
            frame.index + 1,
            dark.chars().count(),
            raw.chars().count()
        );
        dark
    } else {
        raw
    }
}

fn run_pass(
    recognizer: &dyn TextRecognizer,
    image_path: &Path,
    config: &OcrConfig,
    index: u32,
    events: &EventSink,
) -> String {
    match recognizer.recognize(image_path, &config.languages) {
        Ok(text) => text,
        Err(err) => {
            log_warn!("ocr failed on page {}: {err:#}", index + 1);
            events.log(format!(
                "page {}: pass over {} failed, treated as empty",
                index + 1,
                file_name(image_path)
            ));
            String::new()
        }
    }
}

fn dark_variant_path(image_path: &Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = image_path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".into());
    image_path.with_file_name(format!("{stem}{DARK_VARIANT_SUFFIX}.{ext}"))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
