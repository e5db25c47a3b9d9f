//! CSV export of respondent records.

use crate::error::{Error, Result};
use crate::types::{OutcomeRecord, RespondentRecord};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Column names, in output order.
pub const COLUMNS: [&str; 15] = [
    "id",
    "group",
    "person name",
    "age",
    "gender",
    "postalcode",
    "fixed title",
    "fixed body",
    "fixed image dir",
    "waiting title",
    "waiting body",
    "waiting image dir",
    "not fixed title",
    "not fixed body",
    "not fixed image dir",
];

/// Flat CSV row matching [`COLUMNS`]; absent values are left empty.
#[derive(Serialize)]
struct CsvRow<'a> {
    id: u64,
    group: &'a str,
    #[serde(rename = "person name")]
    person_name: &'a str,
    age: Option<&'a str>,
    gender: Option<&'a str>,
    postalcode: Option<&'a str>,

    #[serde(rename = "fixed title")]
    fixed_title: &'a str,
    #[serde(rename = "fixed body")]
    fixed_body: &'a str,
    #[serde(rename = "fixed image dir")]
    fixed_image: Option<String>,

    #[serde(rename = "waiting title")]
    waiting_title: &'a str,
    #[serde(rename = "waiting body")]
    waiting_body: &'a str,
    #[serde(rename = "waiting image dir")]
    waiting_image: Option<String>,

    #[serde(rename = "not fixed title")]
    not_fixed_title: &'a str,
    #[serde(rename = "not fixed body")]
    not_fixed_body: &'a str,
    #[serde(rename = "not fixed image dir")]
    not_fixed_image: Option<String>,
}

impl<'a> From<&'a RespondentRecord> for CsvRow<'a> {
    fn from(record: &'a RespondentRecord) -> Self {
        fn image(outcome: &OutcomeRecord) -> Option<String> {
            outcome
                .image
                .as_ref()
                .map(|path| path.to_string_lossy().into_owned())
        }

        Self {
            id: record.id,
            group: &record.group,
            person_name: &record.person_name,
            age: record.age.as_deref(),
            gender: record.gender.as_deref(),
            postalcode: record.postal_code.as_deref(),
            fixed_title: &record.fixed.title,
            fixed_body: &record.fixed.body,
            fixed_image: image(&record.fixed),
            waiting_title: &record.waiting.title,
            waiting_body: &record.waiting.body,
            waiting_image: image(&record.waiting),
            not_fixed_title: &record.not_fixed.title,
            not_fixed_body: &record.not_fixed.body,
            not_fixed_image: image(&record.not_fixed),
        }
    }
}

/// Write records as CSV, header first.
pub fn write_csv<W: Write>(writer: W, records: &[RespondentRecord]) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer
        .write_record(COLUMNS)
        .map_err(|e| Error::CsvError(format!("Failed to write header: {}", e)))?;
    for record in records {
        csv_writer
            .serialize(CsvRow::from(record))
            .map_err(|e| Error::CsvError(format!("Failed to write row {}: {}", record.id, e)))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write records to a CSV file, replacing any existing file.
pub fn write_csv_file(path: &Path, records: &[RespondentRecord]) -> Result<()> {
    let file = File::create(path)?;
    write_csv(file, records)?;
    log::info!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}
