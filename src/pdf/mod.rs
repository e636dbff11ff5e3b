pub mod acta;
pub mod canvas;
pub mod convocatoria;
pub mod fonts;
pub mod signature_image;
pub mod text;

use std::fmt;
use std::path::PathBuf;

use crate::models::acta::ActaData;
use crate::models::convocatoria::ConvocatoriaData;
use signature_image::SignatureImageError;

pub use acta::{layout_acta, render_acta};
pub use convocatoria::ConvocatoriaRenderer;

#[derive(Debug)]
pub enum RenderError {
    Pdf(lopdf::Error),
    Image(SignatureImageError),
    Raster(String),
    Template(askama::Error),
    Io(std::io::Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Pdf(e) => write!(f, "PDF error: {e}"),
            RenderError::Image(e) => write!(f, "Image error: {e}"),
            RenderError::Raster(e) => write!(f, "Rasterization error: {e}"),
            RenderError::Template(e) => write!(f, "Template error: {e}"),
            RenderError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<lopdf::Error> for RenderError {
    fn from(e: lopdf::Error) -> Self {
        RenderError::Pdf(e)
    }
}

impl From<SignatureImageError> for RenderError {
    fn from(e: SignatureImageError) -> Self {
        RenderError::Image(e)
    }
}

impl From<askama::Error> for RenderError {
    fn from(e: askama::Error) -> Self {
        RenderError::Template(e)
    }
}

impl From<std::io::Error> for RenderError {
    fn from(e: std::io::Error) -> Self {
        RenderError::Io(e)
    }
}

/// Where the PDF goes: a file in `dir`, or back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderMode {
    Download { dir: PathBuf },
    ReturnBytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutput {
    Saved(PathBuf),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub output: RenderOutput,
    pub file_name: String,
    pub page_count: usize,
    /// Problems that did not stop the render but must reach the user.
    pub warnings: Vec<String>,
    pub backend: &'static str,
}

/// `Acta_Ordinária_12_2025-03-15.pdf`
pub fn acta_file_name(acta: &ActaData) -> String {
    format!(
        "Acta_{}_{}_{}.pdf",
        acta.assembly_type.label(),
        sanitize(&acta.minute_number),
        acta.meeting_date.format("%Y-%m-%d")
    )
}

/// `convocatoria_3_2025-03-15_edifício_aurora.pdf`
pub fn convocatoria_file_name(data: &ConvocatoriaData) -> String {
    let building = sanitize(data.building_name.trim())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase();
    format!(
        "convocatoria_{}_{}_{}.pdf",
        sanitize(&data.assembly_number),
        data.meeting_date.format("%Y-%m-%d"),
        building
    )
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') { '-' } else { c })
        .collect()
}

pub(crate) fn deliver(bytes: Vec<u8>, file_name: &str, mode: &RenderMode) -> Result<RenderOutput, RenderError> {
    match mode {
        RenderMode::ReturnBytes => Ok(RenderOutput::Bytes(bytes)),
        RenderMode::Download { dir } => {
            std::fs::create_dir_all(dir)?;
            let path = dir.join(file_name);
            std::fs::write(&path, bytes)?;
            log::info!("Saved {}", path.display());
            Ok(RenderOutput::Saved(path))
        }
    }
}
