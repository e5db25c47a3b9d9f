//! Core domain types, respondent metadata parsing, slide grouping and CSV
//! export for survey slide decks.

pub mod error;
pub mod export;
pub mod grouping;
pub mod metadata;
pub mod options;
pub mod types;

pub use error::{Error, Result};
pub use export::{write_csv, write_csv_file};
pub use grouping::{group_slides, RespondentBlock};
pub use metadata::RespondentInfo;
pub use options::{group_id, SurveyOptions};
pub use types::{
    category_code, has_mpf_signature, image_file_name, ImageFormat, OutcomeCategory, OutcomeRecord, Picture,
    Placeholder, Presentation, RespondentRecord, Shape, ShapeKind, Slide,
};
