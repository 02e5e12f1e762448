//! In-place crop of a captured frame, applied before fingerprinting.

use std::path::Path;

use anyhow::{Context, Result};

use super::config::CropInsets;

const ENABLE_LOGS: bool = true;
use crate::log_warn;

/// Strip the configured insets from the image at `path`, rewriting the file.
/// Insets that would consume the whole image are skipped with a warning so a
/// misconfigured crop degrades to "no crop" instead of killing the job.
pub fn apply_crop(path: &Path, insets: &CropInsets) -> Result<()> {
    if insets.is_zero() {
        return Ok(());
    }

    let img = image::open(path)
        .with_context(|| format!("decoding {} for cropping", path.display()))?;
    let (width, height) = (img.width(), img.height());

    if insets.left + insets.right >= width || insets.top + insets.bottom >= height {
        log_warn!(
            "crop insets {:?} consume the whole {}x{} frame; leaving it uncropped",
            insets,
            width,
            height
        );
        return Ok(());
    }

    let cropped = img.crop_imm(
        insets.left,
        insets.top,
        width - insets.left - insets.right,
        height - insets.top - insets.bottom,
    );
    cropped
        .save(path)
        .with_context(|| format!("writing cropped frame {}", path.display()))?;
    Ok(())
}
