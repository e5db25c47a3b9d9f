//! Run options shared by the pipeline and the CLI.

use std::path::{Path, PathBuf};

/// Group ids excluded from every run unless overridden.
pub const DEFAULT_SKIP_GROUPS: &[&str] = &["04", "06"];

/// File extension of input documents.
pub const DOCUMENT_EXTENSION: &str = ".pptx";

/// Options controlling a survey extraction run.
#[derive(Debug, Clone)]
pub struct SurveyOptions {
    /// Directory receiving extracted images.
    pub image_dir: PathBuf,

    /// Group ids whose documents are skipped entirely.
    pub skip_groups: Vec<String>,
}

impl SurveyOptions {
    /// Create options writing images to `image_dir`, with the default skip list.
    pub fn new(image_dir: impl Into<PathBuf>) -> Self {
        Self {
            image_dir: image_dir.into(),
            skip_groups: DEFAULT_SKIP_GROUPS.iter().map(|g| g.to_string()).collect(),
        }
    }

    /// Replace the skip list.
    pub fn with_skip_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Whether documents of this group are excluded.
    pub fn is_skipped(&self, group: &str) -> bool {
        self.skip_groups.iter().any(|g| g == group)
    }

    /// Image output directory.
    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }
}

/// Group id of a document: the first two characters of its file name.
pub fn group_id(filename: &str) -> String {
    filename.chars().take(2).collect()
}
