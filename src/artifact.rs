//! Final artifact assembly: the delimited text file or the image PDF.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use printpdf::{ImageTransform, Mm, PdfDocument};
use serde::{Deserialize, Serialize};

use crate::capture::frame_store::PageFrame;
use crate::ocr::PageText;

const ENABLE_LOGS: bool = true;
use crate::log_info;

/// Separator between pages in the text artifact. Empty pages keep their
/// slot so the separators still count pages.
pub const PAGE_DELIMITER: &str = "\n\n---\n\n";

/// Screen captures carry no density metadata; treating them as 150 dpi
/// yields pages close to the physical size of the source window.
const PDF_DPI: f32 = 150.0;

const MM_PER_INCH: f64 = 25.4;

/// What the job produces beyond the frames themselves. `FramesOnly` keeps
/// the numbered PNGs as the deliverable and skips recognition entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "camelCase")]
pub enum OutputTarget {
    Text(PathBuf),
    Pdf(PathBuf),
    FramesOnly,
}

/// Join recognized pages with the page delimiter and write them out.
pub fn write_text(pages: &[PageText], output: &Path) -> Result<()> {
    let body = pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(PAGE_DELIMITER);
    fs::write(output, body)
        .with_context(|| format!("writing text artifact {}", output.display()))?;
    log_info!("wrote {} pages to {}", pages.len(), output.display());
    Ok(())
}

/// Build a PDF with one page per frame, each page sized to its image at
/// the fixed dpi so mixed window sizes keep their proportions.
pub fn write_pdf(frames: &[PageFrame], output: &Path) -> Result<()> {
    let Some(first) = frames.first() else {
        bail!("no pages captured, nothing to write");
    };

    let first_image = load_rgb(&first.image_path)?;
    let (width, height) = page_size_mm(&first_image);
    let (doc, mut page, mut layer) = PdfDocument::new(
        output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "book".into()),
        width,
        height,
        "page",
    );

    for (i, frame) in frames.iter().enumerate() {
        let image = if i == 0 {
            first_image.clone()
        } else {
            load_rgb(&frame.image_path)?
        };
        if i > 0 {
            let (width, height) = page_size_mm(&image);
            let (p, l) = doc.add_page(width, height, "page");
            page = p;
            layer = l;
        }
        let layer_ref = doc.get_page(page).get_layer(layer);
        printpdf::Image::from_dynamic_image(&image).add_to_layer(
            layer_ref,
            ImageTransform {
                dpi: Some(PDF_DPI),
                ..Default::default()
            },
        );
    }

    let file = File::create(output)
        .with_context(|| format!("creating pdf artifact {}", output.display()))?;
    doc.save(&mut BufWriter::new(file))
        .with_context(|| format!("writing pdf artifact {}", output.display()))?;
    log_info!("wrote {} pages to {}", frames.len(), output.display());
    Ok(())
}

// printpdf bundles its own image crate version; loading through it avoids
// mixing image types across crate versions. Alpha channels render black in
// some viewers, so frames are flattened to RGB first.
fn load_rgb(path: &Path) -> Result<printpdf::image_crate::DynamicImage> {
    let image = printpdf::image_crate::open(path)
        .with_context(|| format!("opening frame {}", path.display()))?;
    Ok(printpdf::image_crate::DynamicImage::ImageRgb8(
        image.to_rgb8(),
    ))
}

fn page_size_mm(image: &printpdf::image_crate::DynamicImage) -> (Mm, Mm) {
    use printpdf::image_crate::GenericImageView;
    let (w, h) = image.dimensions();
    (
        Mm((w as f64 / PDF_DPI as f64 * MM_PER_INCH) as f32),
        Mm((h as f64 / PDF_DPI as f64 * MM_PER_INCH) as f32),
    )
}
