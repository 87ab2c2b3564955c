//! Error taxonomy shared by the loading, charting and reporting stages.

use std::io;
use std::path::PathBuf;

/// Failures raised by the chart and document renderers.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The plotting backend rejected a drawing operation.
    #[error("Chart rendering failed: {0}")]
    Chart(String),

    /// Encoding or decoding a raster image failed.
    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    /// Layout, font loading or serialization of the PDF document failed.
    #[error("PDF rendering failed: {0}")]
    Pdf(#[from] genpdf::error::Error),

    /// Writing a rendered artifact to disk failed.
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors produced by the report pipeline and the dataset tooling.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The input dataset does not exist.
    #[error("Input file '{}' does not exist", path.display())]
    MissingFile { path: PathBuf },

    /// A required column is absent from the dataset header.
    #[error("Required column '{field}' is missing from '{}'", path.display())]
    MissingField { field: &'static str, path: PathBuf },

    /// A row carried a value that cannot be used for aggregation.
    #[error("Invalid record on line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    /// The delimited input could not be parsed or written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A chart or the document could not be rendered.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Any other file-system failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Alias for results carrying a [`ReportError`].
pub type Result<T> = std::result::Result<T, ReportError>;
