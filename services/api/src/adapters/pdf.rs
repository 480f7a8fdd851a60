//! services/api/src/adapters/pdf.rs
//!
//! This module contains the PDF adapter. It implements the `ReportRenderer` port from
//! the `core` crate by drawing an already paginated `ReportLayout` with printpdf's
//! builtin Helvetica fonts and storing the result in the reports directory.

use nutrifit_core::domain::GeneratedPdf;
use nutrifit_core::layout::ReportLayout;
use nutrifit_core::ports::{PortError, PortResult, ReportRenderer};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const REPORT_FILE_PREFIX: &str = "nutrifit_report_";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A renderer that writes each report to `<reports_dir>/nutrifit_report_<uuid>.pdf`.
#[derive(Clone, Debug)]
pub struct PdfReportRenderer {
    reports_dir: PathBuf,
}

impl PdfReportRenderer {
    /// Creates a new `PdfReportRenderer`. The directory is created on first use.
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    /// Maps a client-supplied file name to a path inside the reports directory.
    /// Returns `None` for anything that is not a plain `*.pdf` file name.
    pub fn resolve(&self, file_name: &str) -> Option<PathBuf> {
        is_report_file_name(file_name).then(|| self.reports_dir.join(file_name))
    }
}

/// A fresh collision-resistant report file name. No retry on the (negligible) chance
/// of a collision.
pub fn unique_file_name() -> String {
    format!("{}{}.pdf", REPORT_FILE_PREFIX, Uuid::new_v4().simple())
}

fn is_report_file_name(name: &str) -> bool {
    name.len() > ".pdf".len()
        && name.ends_with(".pdf")
        && !name.starts_with('.')
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

//=========================================================================================
// Drawing
//=========================================================================================

fn pt_to_mm(pt: f64) -> Mm {
    Mm((pt * 25.4 / 72.0) as f32)
}

fn render_error(e: impl std::fmt::Display) -> PortError {
    PortError::Render(e.to_string())
}

/// The builtin fonts only cover Latin-1; typographic punctuation is folded to ASCII
/// and anything else becomes `?`.
fn pdf_safe(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            '\u{2022}' => '-',
            '\t' => ' ',
            c if (c as u32) < 0x20 => ' ',
            c if (c as u32) <= 0xFF => c,
            _ => '?',
        })
        .collect()
}

/// Draws every page of `layout` and returns the PDF bytes.
pub fn render_to_bytes(layout: &ReportLayout) -> PortResult<Vec<u8>> {
    let geometry = layout.geometry;
    let width = pt_to_mm(geometry.width);
    let height = pt_to_mm(geometry.height);

    let (doc, first_page, first_layer) =
        PdfDocument::new(layout.title.as_str(), width, height, "Layer 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(render_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(render_error)?;

    for (index, page) in layout.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) = doc.add_page(width, height, "Layer 1");
            doc.get_page(page_index).get_layer(layer_index)
        };

        for line in page.lines.iter().filter(|line| !line.text.is_empty()) {
            let font = if line.style.is_bold() { &bold } else { &regular };
            layer.use_text(
                pdf_safe(&line.text),
                line.style.font_size() as f32,
                pt_to_mm(line.x),
                pt_to_mm(line.y),
                font,
            );
        }
    }

    let mut writer = BufWriter::new(Vec::new());
    doc.save(&mut writer).map_err(render_error)?;
    writer.into_inner().map_err(render_error)
}

//=========================================================================================
// `ReportRenderer` Trait Implementation
//=========================================================================================

impl ReportRenderer for PdfReportRenderer {
    /// Renders the whole document in memory first, so a drawing failure leaves no
    /// partial file behind.
    fn render(&self, layout: &ReportLayout) -> PortResult<GeneratedPdf> {
        let bytes = render_to_bytes(layout)?;

        std::fs::create_dir_all(&self.reports_dir).map_err(|e| {
            PortError::Render(format!(
                "cannot create reports directory {}: {}",
                self.reports_dir.display(),
                e
            ))
        })?;

        let file_name = unique_file_name();
        let path = self.reports_dir.join(&file_name);
        std::fs::write(&path, bytes)
            .map_err(|e| PortError::Render(format!("cannot write {}: {}", path.display(), e)))?;

        Ok(GeneratedPdf { file_name, path })
    }
}
