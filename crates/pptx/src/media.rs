//! Recovery of multi-picture (MPO) images straight from the package's media
//! storage.
//!
//! The picture API rejects MPO blobs, so when a slide's picture cannot be
//! read the whole `ppt/media/` folder is scanned instead. The first MPO entry
//! that decodes is re-encoded as a plain JPEG.

use image::{DynamicImage, ImageFormat};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use survey_core::{has_mpf_signature, image_file_name, Error, OutcomeCategory, Result};
use zip::ZipArchive;

/// Package folder holding embedded media parts.
pub const MEDIA_PREFIX: &str = "ppt/media/";

/// Extension of images recovered from MPO containers.
pub const RECOVERED_EXTENSION: &str = "jpg";

/// Identity of the image being recovered; fixes the output file name.
#[derive(Debug, Clone, Copy)]
pub struct ImageTarget<'a> {
    pub group: &'a str,
    pub id: u64,
    pub name: &'a str,
    pub category: OutcomeCategory,
}

impl ImageTarget<'_> {
    /// Output file name with the given extension.
    pub fn file_name(&self, ext: &str) -> String {
        image_file_name(self.group, self.id, self.name, self.category.code(), ext)
    }
}

/// Content hashes already seen during one scan.
#[derive(Debug, Default)]
struct SeenHashes(HashSet<String>);

impl SeenHashes {
    /// Record `data`; false if identical bytes were seen before.
    fn admit(&mut self, data: &[u8]) -> bool {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let hash = format!("{:x}", hasher.finalize());
        self.0.insert(hash)
    }
}

/// Scans a document's media storage for recoverable MPO images.
pub struct MediaResolver<'a> {
    image_dir: &'a Path,
}

impl<'a> MediaResolver<'a> {
    /// Create a resolver writing recovered images to `image_dir`.
    pub fn new(image_dir: &'a Path) -> Self {
        Self { image_dir }
    }

    /// Recover the first decodable MPO image in the document at `document`.
    ///
    /// Returns at most one path. Entries that fail to decode are logged and
    /// skipped.
    pub fn resolve(&self, document: &Path, target: &ImageTarget) -> Result<Vec<PathBuf>> {
        let file = File::open(document)?;
        self.resolve_from(BufReader::new(file), target)
    }

    /// Same as [`resolve`](Self::resolve), reading the package from `reader`.
    pub fn resolve_from<R: Read + Seek>(&self, reader: R, target: &ImageTarget) -> Result<Vec<PathBuf>> {
        let scan = self.scan(reader, target)?;
        log::debug!(
            "Media scan: {} duplicate entries, {} failed MPO candidates",
            scan.duplicates,
            scan.failed
        );
        Ok(scan.recovered.into_iter().collect())
    }

    fn scan<R: Read + Seek>(&self, reader: R, target: &ImageTarget) -> Result<MediaScan> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;
        let mut seen = SeenHashes::default();
        let mut scan = MediaScan::default();

        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", index, e)))?;
            if !entry.name().starts_with(MEDIA_PREFIX) {
                continue;
            }
            let entry_name = entry.name().to_string();

            let mut data = Vec::new();
            entry
                .read_to_end(&mut data)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", entry_name, e)))?;

            if !seen.admit(&data) {
                log::debug!("Skipping duplicate media entry {}", entry_name);
                scan.duplicates += 1;
                continue;
            }
            if !has_mpf_signature(&data) {
                continue;
            }

            let output_path = self.image_dir.join(target.file_name(RECOVERED_EXTENSION));
            match write_first_frame(&data, &output_path) {
                Ok(()) => {
                    log::info!("Extracted MPO as JPEG: {}", output_path.display());
                    scan.recovered = Some(output_path);
                    break;
                }
                Err(e) => {
                    log::warn!("Failed to process MPO ({}): {}", entry_name, e);
                    scan.failed += 1;
                }
            }
        }

        Ok(scan)
    }
}

/// What one pass over the media folder did.
#[derive(Debug, Default)]
struct MediaScan {
    recovered: Option<PathBuf>,
    /// Entries skipped because identical bytes were already examined.
    duplicates: usize,
    /// MPO candidates that failed to decode or write.
    failed: usize,
}

/// Decode the leading frame of an MPO blob and save it as an RGB JPEG.
///
/// The first frame of an MPO file is a complete JPEG stream; the remaining
/// frames follow its EOI marker and are ignored by the JPEG decoder.
fn write_first_frame(data: &[u8], output_path: &Path) -> Result<()> {
    let frame = image::load_from_memory_with_format(data, ImageFormat::Jpeg)
        .map_err(|e| Error::ImageError(format!("Failed to decode: {}", e)))?;

    DynamicImage::ImageRgb8(frame.to_rgb8())
        .save_with_format(output_path, ImageFormat::Jpeg)
        .map_err(|e| Error::ImageError(format!("Failed to write {}: {}", output_path.display(), e)))
}
