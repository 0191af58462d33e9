//! Page bitmaps → A4 PDF.

use std::io::BufWriter;

use printpdf::image_crate::{DynamicImage, RgbImage};
use printpdf::{Image, ImageTransform, Mm, PdfDocument};
use serde::Serialize;
use tracing::debug;

use crate::export::raster::Bitmap;
use crate::export::ExportError;

const A4_WIDTH_MM: f32 = 210.0;
const A4_HEIGHT_MM: f32 = 297.0;
const MM_PER_INCH: f32 = 25.4;

/// A finished download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdfFile {
    pub file_name: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// `My Resume!` → `My_Resume_.pdf`. Blank titles fall back to `resume.pdf`.
pub fn file_name_for(title: &str) -> String {
    if title.trim().is_empty() {
        return "resume.pdf".to_string();
    }
    let stem: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{stem}.pdf")
}

/// Places each bitmap as one full-width image on its own A4 portrait page.
pub fn assemble(title: &str, pages: &[Bitmap]) -> Result<Vec<u8>, ExportError> {
    let first = pages
        .first()
        .ok_or_else(|| ExportError::Pdf("no pages to assemble".into()))?;

    let (doc, page, layer) =
        PdfDocument::new(title, Mm(A4_WIDTH_MM), Mm(A4_HEIGHT_MM), "Layer 1");
    let mut targets = vec![(page, layer)];
    for _ in 1..pages.len() {
        targets.push(doc.add_page(Mm(A4_WIDTH_MM), Mm(A4_HEIGHT_MM), "Layer 1"));
    }

    for (bitmap, (page, layer)) in pages.iter().zip(targets) {
        let rgb = RgbImage::from_raw(bitmap.width, bitmap.height, bitmap.to_rgb())
            .ok_or_else(|| ExportError::Pdf("page bitmap has the wrong size".into()))?;
        let image = Image::from_dynamic_image(&DynamicImage::ImageRgb8(rgb));
        // Pick the dpi that makes the bitmap exactly one page wide.
        let dpi = bitmap.width as f32 / (A4_WIDTH_MM / MM_PER_INCH);
        image.add_to_layer(
            doc.get_page(page).get_layer(layer),
            ImageTransform {
                dpi: Some(dpi),
                ..Default::default()
            },
        );
    }

    let mut bytes = Vec::new();
    doc.save(&mut BufWriter::new(&mut bytes))
        .map_err(|e| ExportError::Pdf(e.to_string()))?;

    debug!(
        pages = pages.len(),
        width = first.width,
        bytes = bytes.len(),
        "assembled pdf"
    );
    Ok(bytes)
}
