//! PPTX file parser implementation.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use survey_core::{Error, Picture, Placeholder, Presentation, Result, Shape, ShapeKind, Slide};
use zip::ZipArchive;

const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Open and parse a PPTX file from disk.
    pub fn open(&self, path: &Path) -> Result<Presentation> {
        let file = File::open(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        self.parse(BufReader::new(file), filename)
    }

    /// Parse a PPTX file from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R, filename: &str) -> Result<Presentation> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut presentation = Presentation::new(filename);

        let slide_order = self.get_slide_order(&mut archive)?;
        log::debug!("{}: {} slides", filename, slide_order.len());

        for (idx, slide_path) in slide_order.iter().enumerate() {
            let slide = self.parse_slide(&mut archive, slide_path, idx + 1)?;
            presentation.add_slide(slide);
        }

        Ok(presentation)
    }

    /// Get the ordered list of slide part paths.
    ///
    /// Order comes from `p:sldIdLst` in presentation.xml. Decks without the
    /// list fall back to the trailing numbers of the slide relationships.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_path = part_rels_path(PRESENTATION_PART);
        let rels_content = self.read_file_from_archive(archive, &rels_path)?;
        let rels = parse_relationships(&rels_content)?;

        let presentation_content = self.read_file_from_archive(archive, PRESENTATION_PART)?;
        let slide_ids = parse_slide_id_list(&presentation_content)?;

        if !slide_ids.is_empty() {
            return slide_ids
                .iter()
                .map(|id| {
                    rels.get(id)
                        .map(|rel| resolve_target(PRESENTATION_PART, &rel.target))
                        .ok_or_else(|| {
                            Error::PptxParseError(format!("Slide relationship '{}' not found", id))
                        })
                })
                .collect();
        }

        log::debug!("No sldIdLst in presentation.xml, ordering slides by relationship number");
        let mut slides: Vec<(String, Option<usize>)> = rels
            .iter()
            .filter(|(_, rel)| rel.is_slide())
            .map(|(id, rel)| {
                let order_num = extract_slide_number(id).or_else(|| extract_slide_number(&rel.target));
                (resolve_target(PRESENTATION_PART, &rel.target), order_num)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Parse a single slide and resolve its pictures.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        slide_number: usize,
    ) -> Result<Slide> {
        let content = self.read_file_from_archive(archive, slide_path)?;
        let rels = match self.read_file_from_archive(archive, &part_rels_path(slide_path)) {
            Ok(rels_content) => parse_relationships(&rels_content)?,
            Err(_) => HashMap::new(),
        };

        let mut slide = Slide::new(slide_number);
        for raw in extract_shapes_from_xml(&content)? {
            let kind = match raw.content {
                RawContent::Text(text) => ShapeKind::Text(text),
                RawContent::Picture(Some(r_id)) => {
                    self.load_picture(archive, slide_path, &rels, &r_id)
                }
                RawContent::Picture(None) | RawContent::Other => ShapeKind::Other,
            };
            slide.add_shape(Shape {
                name: raw.name,
                placeholder: raw.placeholder,
                kind,
            });
        }

        Ok(slide)
    }

    /// Resolve a picture's `r:embed` to its media bytes.
    fn load_picture<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        rels: &HashMap<String, Relationship>,
        r_id: &str,
    ) -> ShapeKind {
        let Some(rel) = rels.get(r_id) else {
            log::warn!("{}: picture references unknown relationship '{}'", slide_path, r_id);
            return ShapeKind::Other;
        };
        if rel.external {
            log::debug!("{}: skipping linked picture '{}'", slide_path, rel.target);
            return ShapeKind::Other;
        }

        let media_path = resolve_target(slide_path, &rel.target);
        match self.read_bytes_from_archive(archive, &media_path) {
            Ok(blob) => ShapeKind::Picture(Picture::new(media_path, blob)),
            Err(e) => {
                log::warn!("{}: {}", slide_path, e);
                ShapeKind::Other
            }
        }
    }

    /// Read a text part from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }

    /// Read a binary part from the ZIP archive.
    fn read_bytes_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<Vec<u8>> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = Vec::new();
        file.read_to_end(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// A relationship entry from a `.rels` part.
#[derive(Debug, Clone)]
struct Relationship {
    rel_type: String,
    target: String,
    external: bool,
}

impl Relationship {
    fn is_slide(&self) -> bool {
        self.rel_type.ends_with("/slide")
    }
}

/// Parse a `.rels` part into a map keyed by relationship id.
fn parse_relationships(xml_content: &str) -> Result<HashMap<String, Relationship>> {
    let mut rels = HashMap::new();
    let mut reader = Reader::from_str(xml_content);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut id = String::new();
                let mut rel = Relationship {
                    rel_type: String::new(),
                    target: String::new(),
                    external: false,
                };

                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"Id" => id = value,
                        b"Type" => rel.rel_type = value,
                        b"Target" => rel.target = value,
                        b"TargetMode" => rel.external = value == "External",
                        _ => {}
                    }
                }

                rels.insert(id, rel);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(rels)
}

/// Relationship ids of `p:sldId` entries, in presentation order.
fn parse_slide_id_list(xml_content: &str) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut reader = Reader::from_str(xml_content);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                // `id` is the numeric slide id; the prefixed `r:id` names the relationship
                let r_id = e.attributes().flatten().find_map(|attr| {
                    let key = attr.key.as_ref();
                    (key != b"id" && local_name(key) == b"id")
                        .then(|| String::from_utf8_lossy(&attr.value).to_string())
                });
                if let Some(r_id) = r_id {
                    ids.push(r_id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing presentation.xml: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Element that opens a top-level shape in `p:spTree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShapeElement {
    AutoShape,
    Picture,
    Group,
    GraphicFrame,
    Connector,
}

impl ShapeElement {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"sp" => Some(Self::AutoShape),
            b"pic" => Some(Self::Picture),
            b"grpSp" => Some(Self::Group),
            b"graphicFrame" => Some(Self::GraphicFrame),
            b"cxnSp" => Some(Self::Connector),
            _ => None,
        }
    }
}

/// What a shape carried in the slide XML, before media resolution.
#[derive(Debug, PartialEq)]
enum RawContent {
    Text(String),
    /// Picture with its `r:embed` relationship id, if present.
    Picture(Option<String>),
    Other,
}

/// A shape as read from slide XML.
#[derive(Debug)]
struct RawShape {
    name: String,
    placeholder: Option<Placeholder>,
    content: RawContent,
}

/// Accumulates one top-level shape while its element is open.
struct ShapeBuilder {
    element: ShapeElement,
    depth: usize,
    name: String,
    placeholder: Option<Placeholder>,
    has_text_frame: bool,
    in_text_body: bool,
    in_text_run: bool,
    paragraphs: Vec<String>,
    embed: Option<String>,
}

impl ShapeBuilder {
    fn new(element: ShapeElement, depth: usize) -> Self {
        Self {
            element,
            depth,
            name: String::new(),
            placeholder: None,
            has_text_frame: false,
            in_text_body: false,
            in_text_run: false,
            paragraphs: Vec::new(),
            embed: None,
        }
    }

    /// Handle an opening (or self-closing) child element.
    fn open(&mut self, e: &BytesStart, empty: bool) {
        let name = e.name();
        match local_name(name.as_ref()) {
            b"cNvPr" if self.name.is_empty() => {
                if let Some(value) = attribute(e, b"name") {
                    self.name = value;
                }
            }
            b"ph" if self.placeholder.is_none() && self.element != ShapeElement::Group => {
                let kind = attribute(e, b"type");
                let idx = attribute(e, b"idx")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
                self.placeholder = Some(Placeholder::new(kind.as_deref(), idx));
            }
            b"txBody" if self.element == ShapeElement::AutoShape => {
                self.has_text_frame = true;
                self.in_text_body = !empty;
            }
            b"p" if self.in_text_body => {
                self.paragraphs.push(String::new());
            }
            b"t" if self.in_text_body && !empty => {
                self.in_text_run = true;
            }
            b"br" if self.in_text_body => {
                if let Some(paragraph) = self.paragraphs.last_mut() {
                    paragraph.push('\n');
                }
            }
            b"blip" if self.element == ShapeElement::Picture && self.embed.is_none() => {
                self.embed = e.attributes().flatten().find_map(|attr| {
                    (local_name(attr.key.as_ref()) == b"embed")
                        .then(|| String::from_utf8_lossy(&attr.value).to_string())
                });
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match local_name(name) {
            b"t" => self.in_text_run = false,
            b"txBody" => self.in_text_body = false,
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_text_run {
            if let Some(paragraph) = self.paragraphs.last_mut() {
                paragraph.push_str(text);
            }
        }
    }

    fn finish(self) -> RawShape {
        let content = match self.element {
            ShapeElement::AutoShape if self.has_text_frame => {
                RawContent::Text(self.paragraphs.join("\n"))
            }
            ShapeElement::Picture => RawContent::Picture(self.embed),
            _ => RawContent::Other,
        };
        RawShape {
            name: self.name,
            placeholder: self.placeholder,
            content,
        }
    }
}

/// Extract the top-level shapes of `p:spTree` in document order.
///
/// Shapes nested in groups are not surfaced individually; the group itself
/// becomes one `Other` shape.
fn extract_shapes_from_xml(xml_content: &str) -> Result<Vec<RawShape>> {
    let mut shapes = Vec::new();
    let mut reader = Reader::from_str(xml_content);

    let mut depth = 0usize;
    let mut tree_depth: Option<usize> = None;
    let mut tree_closed = false;
    let mut current: Option<ShapeBuilder> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                let name = e.name();
                let local = local_name(name.as_ref());

                if let Some(builder) = current.as_mut() {
                    builder.open(e, false);
                } else if !tree_closed && tree_depth.is_none() && local == b"spTree" {
                    tree_depth = Some(depth);
                } else if tree_depth == Some(depth - 1) {
                    if let Some(element) = ShapeElement::from_local_name(local) {
                        current = Some(ShapeBuilder::new(element, depth));
                    }
                }
            }
            Ok(Event::Empty(ref e)) => {
                if let Some(builder) = current.as_mut() {
                    builder.open(e, true);
                } else if tree_depth == Some(depth) {
                    let name = e.name();
                    if let Some(element) = ShapeElement::from_local_name(local_name(name.as_ref())) {
                        shapes.push(ShapeBuilder::new(element, depth + 1).finish());
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(builder) = current.as_mut() {
                    let text = e.unescape().unwrap_or_default();
                    builder.text(&text);
                }
            }
            Ok(Event::End(ref e)) => {
                if current.as_ref().is_some_and(|b| b.depth == depth) {
                    if let Some(builder) = current.take() {
                        shapes.push(builder.finish());
                    }
                } else if let Some(builder) = current.as_mut() {
                    builder.close(e.name().as_ref());
                } else if tree_depth == Some(depth) {
                    tree_depth = None;
                    tree_closed = true;
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing slide: {}", e)));
            }
            _ => {}
        }
    }

    Ok(shapes)
}

/// Unescaped value of an unprefixed attribute.
fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// Path of the relationships part belonging to `part`.
fn part_rels_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the part that owns it.
fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = source_part.split('/').collect();
    segments.pop();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
