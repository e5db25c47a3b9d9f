//! Directory-level aggregation: documents in, respondent records out.

use crate::extract::BlockExtractor;
use crate::parser::PptxParser;
use std::fs;
use std::path::{Path, PathBuf};
use survey_core::options::DOCUMENT_EXTENSION;
use survey_core::{group_id, group_slides, Error, RespondentRecord, Result, SurveyOptions};

/// Records gathered from a run and the next unused respondent id.
#[derive(Debug, Default, Clone)]
pub struct Batch {
    pub records: Vec<RespondentRecord>,
    pub next_id: u64,
}

impl Batch {
    /// Empty batch whose first record gets `start_id`.
    pub fn starting_at(start_id: u64) -> Self {
        Self {
            records: Vec::new(),
            next_id: start_id,
        }
    }

    /// Append a document's records, advancing the id counter past them.
    pub fn extend(mut self, records: Vec<RespondentRecord>) -> Self {
        self.next_id += records.len() as u64;
        self.records.extend(records);
        self
    }
}

/// Records extracted from one document, and the error that stopped it early.
#[derive(Debug, Default)]
pub struct DocumentRecords {
    pub records: Vec<RespondentRecord>,
    pub error: Option<Error>,
}

/// Extract all respondent records from one document.
///
/// Blocks get consecutive ids starting at `first_id`. A failing block ends
/// the document; the records of the blocks before it are kept.
pub fn process_document(path: &Path, group: &str, first_id: u64, options: &SurveyOptions) -> DocumentRecords {
    let mut outcome = DocumentRecords::default();

    let presentation = match PptxParser::new().open(path) {
        Ok(presentation) => presentation,
        Err(e) => {
            outcome.error = Some(e);
            return outcome;
        }
    };
    let blocks = match group_slides(&presentation.slides) {
        Ok(blocks) => blocks,
        Err(e) => {
            outcome.error = Some(e);
            return outcome;
        }
    };

    let extractor = BlockExtractor::new(options.image_dir()).with_document(path);
    for (block, id) in blocks.iter().zip(first_id..) {
        match extractor.extract_block(block, group, id) {
            Ok(record) => outcome.records.push(record),
            Err(e) => {
                outcome.error = Some(e);
                break;
            }
        }
    }
    outcome
}

/// Documents in `dir` with the expected extension, sorted by file name.
fn list_documents(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut documents = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let filename = entry.file_name().to_string_lossy().into_owned();
        if filename.ends_with(DOCUMENT_EXTENSION) {
            documents.push((filename, entry.path()));
        }
    }
    documents.sort();
    Ok(documents)
}

/// Process every document in `dir`, numbering respondents from `start_id`.
///
/// Documents of skipped groups consume no ids. A failure inside a document
/// is logged; the respondents extracted before it keep their rows and ids.
pub fn process_directory(dir: &Path, options: &SurveyOptions, start_id: u64) -> Result<Batch> {
    fs::create_dir_all(options.image_dir())?;

    let mut batch = Batch::starting_at(start_id);
    for (filename, path) in list_documents(dir)? {
        let group = group_id(&filename);
        if options.is_skipped(&group) {
            log::info!("Skipping group {} ({})", group, filename);
            continue;
        }

        log::info!("Processing group {}", group);
        let DocumentRecords { records, error } = process_document(&path, &group, batch.next_id, options);
        log::debug!("{}: {} respondents", filename, records.len());
        if let Some(e) = error {
            log::error!(
                "Failed to process {} after {} respondents: {}",
                path.display(),
                records.len(),
                e
            );
        }
        batch = batch.extend(records);
    }

    Ok(batch)
}
