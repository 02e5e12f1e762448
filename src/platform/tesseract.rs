//! Recognition through the `tesseract` CLI.

use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};

use crate::ocr::TextRecognizer;

/// Map a host-facing language tag to tesseract's traineddata code.
/// Unknown tags pass through unchanged so installed custom traineddata
/// stays reachable.
fn tesseract_lang(tag: &str) -> &str {
    match tag {
        "ja" => "jpn",
        "en" => "eng",
        "de" => "deu",
        "fr" => "fra",
        "es" => "spa",
        "ko" => "kor",
        "zh" => "chi_sim",
        other => other,
    }
}

pub struct TesseractRecognizer;

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image_path: &Path, languages: &[String]) -> Result<String> {
        let langs = languages
            .iter()
            .map(|t| tesseract_lang(t))
            .collect::<Vec<_>>()
            .join("+");

        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&langs)
            .output()
            .context("spawning tesseract, is it installed?")?;
        if !output.status.success() {
            bail!(
                "tesseract failed on {}: {}",
                image_path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .trim_end()
            .to_string())
    }
}
