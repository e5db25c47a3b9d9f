//! Turning a respondent block into a record: info parsing, body text and one
//! image per outcome slide.

use crate::media::{ImageTarget, MediaResolver};
use std::path::{Path, PathBuf};
use survey_core::{
    Error, OutcomeCategory, OutcomeRecord, Picture, RespondentBlock, RespondentInfo,
    RespondentRecord, Result, Slide,
};

/// Placeholder index holding the respondent details on the info slide.
pub const INFO_PLACEHOLDER_IDX: u32 = 1;

/// Body text and written images of one outcome slide.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OutcomeExtraction {
    pub body: String,
    pub images: Vec<PathBuf>,
}

/// Extracts records from the blocks of one document.
pub struct BlockExtractor<'a> {
    image_dir: &'a Path,
    document: Option<&'a Path>,
}

impl<'a> BlockExtractor<'a> {
    /// Create an extractor writing images to `image_dir`, without MPO recovery.
    pub fn new(image_dir: &'a Path) -> Self {
        Self {
            image_dir,
            document: None,
        }
    }

    /// Enable MPO recovery from the package at `document`.
    pub fn with_document(mut self, document: &'a Path) -> Self {
        self.document = Some(document);
        self
    }

    /// Build the record for one block.
    pub fn extract_block(&self, block: &RespondentBlock, group: &str, id: u64) -> Result<RespondentRecord> {
        let info_text = block
            .info
            .placeholder(INFO_PLACEHOLDER_IDX)
            .ok_or(Error::MissingPlaceholder {
                slide: block.info.number,
                idx: INFO_PLACEHOLDER_IDX,
            })?
            .text()
            .unwrap_or_default();
        let info = RespondentInfo::parse(info_text.trim());

        let outcome = |slide: &Slide, category: OutcomeCategory| -> Result<OutcomeRecord> {
            let target = ImageTarget {
                group,
                id,
                name: &info.name,
                category,
            };
            let extraction = self.extract_outcome(slide, &target)?;
            Ok(OutcomeRecord::new(
                category,
                extraction.body,
                extraction.images.into_iter().next(),
            ))
        };

        Ok(RespondentRecord {
            fixed: outcome(block.fixed, OutcomeCategory::Fixed)?,
            waiting: outcome(block.waiting, OutcomeCategory::Waiting)?,
            not_fixed: outcome(block.not_fixed, OutcomeCategory::NotFixed)?,
            id,
            group: group.to_string(),
            person_name: info.name.clone(),
            age: info.age.clone(),
            gender: info.gender.clone(),
            postal_code: info.postal_code.clone(),
        })
    }

    /// Extract body text and the first readable image of an outcome slide.
    ///
    /// Body text is every non-title text shape, trimmed and concatenated
    /// without a separator. Pictures are tried in order until one can be
    /// written as-is; unreadable ones trigger MPO recovery and the search
    /// moves on.
    pub fn extract_outcome(&self, slide: &Slide, target: &ImageTarget) -> Result<OutcomeExtraction> {
        let body: String = slide.body_texts().map(str::trim).collect();

        let mut images = Vec::new();
        let written = slide.pictures().find_map(|picture| match picture.ext() {
            Ok(ext) => Some(self.write_picture(picture, target, ext)),
            Err(e) => {
                log::warn!(
                    "Unsupported image format in group {}, slide '{}' by {}: {}",
                    target.group,
                    target.category.label(),
                    target.name,
                    e
                );
                images.extend(self.recover(target));
                None
            }
        });
        if let Some(path) = written.transpose()? {
            images.push(path);
        }

        Ok(OutcomeExtraction { body, images })
    }

    fn write_picture(&self, picture: &Picture, target: &ImageTarget, ext: &str) -> Result<PathBuf> {
        let path = self.image_dir.join(target.file_name(ext));
        std::fs::write(&path, &picture.blob)?;
        log::info!("Saved image {}", path.display());
        Ok(path)
    }

    fn recover(&self, target: &ImageTarget) -> Vec<PathBuf> {
        let Some(document) = self.document else {
            return Vec::new();
        };
        match MediaResolver::new(self.image_dir).resolve(document, target) {
            Ok(paths) => paths,
            Err(e) => {
                log::warn!("MPO recovery failed for {}: {}", document.display(), e);
                Vec::new()
            }
        }
    }
}
