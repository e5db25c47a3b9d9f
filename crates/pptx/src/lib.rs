//! PPTX (Office Open XML) backend for survey decks.
//!
//! Parses .pptx files (ZIP archives of XML parts) into slides and shapes,
//! extracts respondent records block by block, and recovers MPO pictures
//! straight from the package's media folder when needed.

pub mod extract;
pub mod media;
pub mod parser;
pub mod pipeline;

#[cfg(test)]
mod test_support;

pub use extract::{BlockExtractor, OutcomeExtraction};
pub use media::{ImageTarget, MediaResolver};
pub use parser::PptxParser;
pub use pipeline::{process_directory, process_document, Batch, DocumentRecords};
