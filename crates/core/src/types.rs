//! Domain types for survey decks and the records extracted from them.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Number of leading bytes searched for the multi-picture (MPO) marker.
pub const MPF_SCAN_LEN: usize = 64;

/// Marker carried in the APP2 segment of multi-picture JPEG files.
const MPF_SIGNATURE: &[u8] = b"MPF";

/// Check whether a blob announces itself as a multi-picture (MPO) container.
pub fn has_mpf_signature(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(MPF_SCAN_LEN)];
    head.windows(MPF_SIGNATURE.len())
        .any(|window| window == MPF_SIGNATURE)
}

/// A whole presentation as an ordered list of slides.
#[derive(Debug, Clone)]
pub struct Presentation {
    /// Original filename (without path).
    pub filename: String,

    /// Slides in presentation order.
    pub slides: Vec<Slide>,
}

impl Presentation {
    /// Create an empty presentation with the given filename.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            slides: Vec::new(),
        }
    }

    /// Add a slide to the presentation.
    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }
}

/// A single slide: its shapes in document order.
#[derive(Debug, Clone)]
pub struct Slide {
    /// 1-based slide number.
    pub number: usize,

    /// Top-level shapes in z-order.
    pub shapes: Vec<Shape>,
}

impl Slide {
    /// Create an empty slide with the given number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            shapes: Vec::new(),
        }
    }

    /// Add a shape to this slide.
    pub fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// Index of the title shape, i.e. the first `title`/`ctrTitle` placeholder.
    pub fn title_index(&self) -> Option<usize> {
        self.shapes.iter().position(|shape| {
            shape
                .placeholder
                .as_ref()
                .is_some_and(Placeholder::is_title)
        })
    }

    /// First shape whose placeholder has the given `idx`.
    pub fn placeholder(&self, idx: u32) -> Option<&Shape> {
        self.shapes
            .iter()
            .find(|shape| shape.placeholder.as_ref().is_some_and(|ph| ph.idx == idx))
    }

    /// Text of every text-bearing shape except the title, in shape order.
    pub fn body_texts(&self) -> impl Iterator<Item = &str> {
        let title = self.title_index();
        self.shapes
            .iter()
            .enumerate()
            .filter(move |(i, _)| Some(*i) != title)
            .filter_map(|(_, shape)| shape.text())
    }

    /// Pictures on this slide, in shape order.
    pub fn pictures(&self) -> impl Iterator<Item = &Picture> {
        self.shapes.iter().filter_map(Shape::picture)
    }
}

/// A top-level shape on a slide.
#[derive(Debug, Clone)]
pub struct Shape {
    /// Shape name from `cNvPr`, if any.
    pub name: String,

    /// Placeholder binding, if this shape is a placeholder.
    pub placeholder: Option<Placeholder>,

    /// What the shape carries.
    pub kind: ShapeKind,
}

impl Shape {
    /// Create a shape of the given kind with no name or placeholder.
    pub fn new(kind: ShapeKind) -> Self {
        Self {
            name: String::new(),
            placeholder: None,
            kind,
        }
    }

    /// Bind this shape to a placeholder.
    pub fn with_placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    /// Text frame content, if this is a text shape.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            ShapeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Embedded picture, if this is a picture shape.
    pub fn picture(&self) -> Option<&Picture> {
        match &self.kind {
            ShapeKind::Picture(picture) => Some(picture),
            _ => None,
        }
    }
}

/// The content a shape exposes.
#[derive(Debug, Clone)]
pub enum ShapeKind {
    /// A shape with a text frame; paragraphs joined by `\n`.
    Text(String),
    /// A picture with its embedded image.
    Picture(Picture),
    /// Anything else (groups, tables, connectors, empty autoshapes).
    Other,
}

/// Placeholder binding from `p:nvPr/p:ph`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Placeholder type (`title`, `body`, ...). `None` when omitted.
    pub kind: Option<String>,

    /// Placeholder index; 0 when omitted.
    pub idx: u32,
}

impl Placeholder {
    /// Create a placeholder binding.
    pub fn new(kind: Option<&str>, idx: u32) -> Self {
        Self {
            kind: kind.map(str::to_string),
            idx,
        }
    }

    /// Whether this placeholder is a slide title.
    pub fn is_title(&self) -> bool {
        matches!(self.kind.as_deref(), Some("title" | "ctrTitle"))
    }
}

/// An image embedded in a picture shape.
#[derive(Debug, Clone)]
pub struct Picture {
    /// Package path of the media part (e.g. `ppt/media/image1.png`).
    pub media_path: String,

    /// Raw bytes of the media part.
    pub blob: Vec<u8>,
}

impl Picture {
    /// Create a picture from its media path and bytes.
    pub fn new(media_path: impl Into<String>, blob: Vec<u8>) -> Self {
        Self {
            media_path: media_path.into(),
            blob,
        }
    }

    /// Detect the image format from the blob's magic bytes.
    pub fn format(&self) -> Result<ImageFormat> {
        ImageFormat::from_magic(&self.blob).ok_or_else(|| {
            let what = if has_mpf_signature(&self.blob) {
                "multi-picture (MPO) container"
            } else {
                "unrecognized image data"
            };
            Error::UnsupportedImageFormat(format!("{} in {}", what, self.media_path))
        })
    }

    /// File extension for the image, failing on unsupported encodings.
    pub fn ext(&self) -> Result<&'static str> {
        self.format().map(ImageFormat::extension)
    }
}

/// Image encodings that can be written out as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Bmp,
    Gif,
    Jpeg,
    Png,
    Tiff,
    Wmf,
}

impl ImageFormat {
    /// Detect format from magic bytes. MPO blobs are rejected.
    ///
    /// Only the first [`MPF_SCAN_LEN`] bytes are checked for the MPF marker,
    /// the same window the media fallback uses. A JPEG whose MPF segment
    /// sits behind a larger EXIF segment is written as a plain JPEG; its
    /// bytes still open as the first frame.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            if has_mpf_signature(bytes) {
                return None;
            }
            return Some(Self::Jpeg);
        }
        if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }
        if bytes.starts_with(b"BM") && bytes.len() >= 14 {
            return Some(Self::Bmp);
        }
        if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
            return Some(Self::Tiff);
        }
        // Placeable WMF header
        if bytes.starts_with(&[0xD7, 0xCD, 0xC6, 0x9A]) {
            return Some(Self::Wmf);
        }
        None
    }

    /// Extension used for written files.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Bmp => "bmp",
            Self::Gif => "gif",
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Tiff => "tiff",
            Self::Wmf => "wmf",
        }
    }
}

/// The three outcome slides that follow a respondent's info slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeCategory {
    Fixed,
    Waiting,
    NotFixed,
}

impl OutcomeCategory {
    /// All categories in block order.
    pub const ALL: [OutcomeCategory; 3] = [Self::Fixed, Self::Waiting, Self::NotFixed];

    /// Parse a category label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "fixed" => Some(Self::Fixed),
            "waiting" => Some(Self::Waiting),
            "not_fixed" => Some(Self::NotFixed),
            _ => None,
        }
    }

    /// Category label as used in log lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Waiting => "waiting",
            Self::NotFixed => "not_fixed",
        }
    }

    /// Numeric code embedded in image file names.
    pub fn code(self) -> u8 {
        match self {
            Self::Fixed => 1,
            Self::Waiting => 2,
            Self::NotFixed => 3,
        }
    }

    /// Constant title written to the output table.
    pub fn title(self) -> &'static str {
        match self {
            Self::Fixed => "En repareret ting",
            Self::Waiting => "En ting, der venter på, eller er i gang med at blive repareret",
            Self::NotFixed => "En ting, der ikke blev repareret/en ting der blev udskiftet",
        }
    }
}

/// Numeric code for a category label; 0 for labels outside the known set.
pub fn category_code(label: &str) -> u8 {
    OutcomeCategory::from_label(label).map_or(0, OutcomeCategory::code)
}

/// File name for an extracted image: `group{G}_{id}_{name}_{code}.{ext}`.
pub fn image_file_name(group: &str, id: u64, name: &str, code: u8, ext: &str) -> String {
    format!("group{}_{}_{}_{}.{}", group, id, name, code, ext)
}

/// One outcome column group of a respondent row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    /// Constant category title.
    pub title: String,

    /// Concatenated body text of the outcome slide.
    pub body: String,

    /// Path of the extracted image, if one was written.
    pub image: Option<PathBuf>,
}

impl OutcomeRecord {
    /// Create a record for the given category.
    pub fn new(category: OutcomeCategory, body: impl Into<String>, image: Option<PathBuf>) -> Self {
        Self {
            title: category.title().to_string(),
            body: body.into(),
            image,
        }
    }
}

/// Output row for one respondent block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondentRecord {
    /// Globally unique, run-wide respondent id.
    pub id: u64,

    /// Group id taken from the document's file name.
    pub group: String,

    /// Respondent name, spaces replaced by underscores.
    pub person_name: String,

    pub age: Option<String>,
    pub gender: Option<String>,
    pub postal_code: Option<String>,

    pub fixed: OutcomeRecord,
    pub waiting: OutcomeRecord,
    pub not_fixed: OutcomeRecord,
}

impl RespondentRecord {
    /// Outcome record for a category.
    pub fn outcome(&self, category: OutcomeCategory) -> &OutcomeRecord {
        match category {
            OutcomeCategory::Fixed => &self.fixed,
            OutcomeCategory::Waiting => &self.waiting,
            OutcomeCategory::NotFixed => &self.not_fixed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Shape {
        Shape::new(ShapeKind::Text(s.to_string()))
    }

    #[test]
    fn test_has_mpf_signature() {
        let mut blob = vec![0xFF, 0xD8, 0xFF, 0xE2, 0x00, 0x10];
        blob.extend_from_slice(b"MPF\0");
        assert!(has_mpf_signature(&blob));

        // Marker beyond the scanned header does not count
        let mut late = vec![0u8; MPF_SCAN_LEN];
        late.extend_from_slice(b"MPF");
        assert!(!has_mpf_signature(&late));

        assert!(!has_mpf_signature(b"MP"));
    }

    #[test]
    fn test_image_format_from_magic() {
        assert_eq!(
            ImageFormat::from_magic(b"\x89PNG\r\n\x1a\nrest"),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F']),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::from_magic(b"GIF89a...."), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::from_magic(b"II*\0...."), Some(ImageFormat::Tiff));
        assert_eq!(ImageFormat::from_magic(b"RIFF....WEBP"), None);
        assert_eq!(ImageFormat::from_magic(b""), None);
    }

    #[test]
    fn test_picture_ext_rejects_mpo() {
        let mut blob = vec![0xFF, 0xD8, 0xFF, 0xE2, 0x00, 0x10];
        blob.extend_from_slice(b"MPF\0\0\0\0\0\0\0\0\0");
        let picture = Picture::new("ppt/media/image1.jpeg", blob);

        match picture.ext() {
            Err(Error::UnsupportedImageFormat(msg)) => assert!(msg.contains("MPO")),
            other => panic!("expected unsupported format, got {:?}", other),
        }

        let png = Picture::new("ppt/media/image2.png", b"\x89PNG\r\n\x1a\n".to_vec());
        assert_eq!(png.ext().unwrap(), "png");
    }

    #[test]
    fn test_late_mpf_segment_reads_as_jpeg() {
        let mut blob = vec![0xFF, 0xD8, 0xFF, 0xE1, 0x00, 0x52];
        blob.extend_from_slice(b"Exif\0\0");
        blob.extend_from_slice(&[0u8; 74]);
        blob.extend_from_slice(&[0xFF, 0xE2, 0x00, 0x10]);
        blob.extend_from_slice(b"MPF\0\0\0\0\0\0\0\0\0");

        assert_eq!(ImageFormat::from_magic(&blob), Some(ImageFormat::Jpeg));
        let picture = Picture::new("ppt/media/image1.jpeg", blob);
        assert_eq!(picture.ext().unwrap(), "jpg");
    }

    #[test]
    fn test_category_codes() {
        assert_eq!(category_code("fixed"), 1);
        assert_eq!(category_code("waiting"), 2);
        assert_eq!(category_code("not_fixed"), 3);
        assert_eq!(category_code("broken"), 0);
        assert_eq!(category_code(""), 0);
    }

    #[test]
    fn test_image_file_name() {
        assert_eq!(
            image_file_name("07", 12, "Jane_Doe", 2, "png"),
            "group07_12_Jane_Doe_2.png"
        );
    }

    #[test]
    fn test_slide_title_and_placeholder_lookup() {
        let mut slide = Slide::new(1);
        slide.add_shape(text("Body before title").with_placeholder(Placeholder::new(None, 1)));
        slide.add_shape(text("Title").with_placeholder(Placeholder::new(Some("title"), 0)));
        slide.add_shape(text("Second title").with_placeholder(Placeholder::new(Some("ctrTitle"), 0)));

        assert_eq!(slide.title_index(), Some(1));
        assert_eq!(slide.placeholder(1).and_then(Shape::text), Some("Body before title"));
        assert!(slide.placeholder(7).is_none());
    }

    #[test]
    fn test_body_texts_skip_title_only() {
        let mut slide = Slide::new(2);
        slide.add_shape(text("Heading").with_placeholder(Placeholder::new(Some("title"), 0)));
        slide.add_shape(text("Hello "));
        slide.add_shape(Shape::new(ShapeKind::Other));
        slide.add_shape(text("World"));

        let texts: Vec<&str> = slide.body_texts().collect();
        assert_eq!(texts, vec!["Hello ", "World"]);
    }
}
