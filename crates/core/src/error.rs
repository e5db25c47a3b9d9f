//! Error types for survey deck extraction.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while turning survey decks into records.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// An embedded picture whose encoding the primary reader cannot handle.
    #[error("Unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    /// Failed to parse the PPTX file structure.
    #[error("PPTX parsing error: {0}")]
    PptxParseError(String),

    /// The info slide of a block has no placeholder at the expected index.
    #[error("Slide {slide} has no placeholder with idx {idx}")]
    MissingPlaceholder { slide: usize, idx: u32 },

    /// Slide count cannot be split into four-slide respondent blocks.
    #[error("{total} slides cannot be grouped into blocks of four ({remaining} left after dropping the intro slide)")]
    RaggedSlideCount { total: usize, remaining: usize },

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// Image decode or encode error.
    #[error("Image error: {0}")]
    ImageError(String),

    /// CSV serialization error.
    #[error("CSV error: {0}")]
    CsvError(String),
}
