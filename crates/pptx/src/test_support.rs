//! In-memory PPTX fixtures for unit tests.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::ZipWriter;

const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

struct SlideFixture {
    shapes: Vec<String>,
    images: Vec<(String, String)>,
}

/// Builds a minimal but well-formed PPTX package.
pub struct DeckBuilder {
    slides: Vec<SlideFixture>,
    media: Vec<(String, Vec<u8>)>,
    slide_id_list: bool,
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self {
            slides: Vec::new(),
            media: Vec::new(),
            slide_id_list: true,
        }
    }

    /// Leave `p:sldIdLst` out of presentation.xml.
    pub fn without_slide_id_list(mut self) -> Self {
        self.slide_id_list = false;
        self
    }

    /// Add a slide from shape XML snippets.
    pub fn slide(self, shapes: &[String]) -> Self {
        self.slide_with_images(shapes, &[])
    }

    /// Add a slide whose relationships map ids to `ppt/media/<file>`.
    pub fn slide_with_images(mut self, shapes: &[String], images: &[(&str, &str)]) -> Self {
        self.slides.push(SlideFixture {
            shapes: shapes.to_vec(),
            images: images
                .iter()
                .map(|(id, file)| (id.to_string(), file.to_string()))
                .collect(),
        });
        self
    }

    /// Add a part under `ppt/media/`.
    pub fn media(mut self, file: &str, bytes: Vec<u8>) -> Self {
        self.media.push((file.to_string(), bytes));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();
        let count = self.slides.len();

        // Slide relationship ids run backwards so id order differs from deck order
        let slide_rid = |i: usize| format!("rId{}", 10 + count - i);

        let put = |zip: &mut ZipWriter<Cursor<Vec<u8>>>, name: &str, bytes: &[u8]| {
            zip.start_file(name, options).unwrap();
            zip.write_all(bytes).unwrap();
        };

        put(&mut zip, "[Content_Types].xml", CONTENT_TYPES.as_bytes());

        let mut pres_rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{}/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#,
            REL_NS
        );
        let mut id_list = String::new();
        for i in 0..count {
            pres_rels.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}/slide" Target="slides/slide{}.xml"/>"#,
                slide_rid(i),
                REL_NS,
                i + 1
            ));
            id_list.push_str(&format!(r#"<p:sldId id="{}" r:id="{}"/>"#, 256 + i, slide_rid(i)));
        }
        pres_rels.push_str("</Relationships>");
        put(&mut zip, "ppt/_rels/presentation.xml.rels", pres_rels.as_bytes());

        let id_list = if self.slide_id_list {
            format!("<p:sldIdLst>{}</p:sldIdLst>", id_list)
        } else {
            String::new()
        };
        let presentation = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="{}" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>{}<p:sldSz cx="12192000" cy="6858000"/></p:presentation>"#,
            REL_NS, id_list
        );
        put(&mut zip, "ppt/presentation.xml", presentation.as_bytes());

        for (i, slide) in self.slides.iter().enumerate() {
            put(
                &mut zip,
                &format!("ppt/slides/slide{}.xml", i + 1),
                slide_xml(&slide.shapes).as_bytes(),
            );

            let mut rels = format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{}/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>"#,
                REL_NS
            );
            for (id, file) in &slide.images {
                rels.push_str(&format!(
                    r#"<Relationship Id="{}" Type="{}/image" Target="../media/{}"/>"#,
                    id, REL_NS, file
                ));
            }
            rels.push_str("</Relationships>");
            put(
                &mut zip,
                &format!("ppt/slides/_rels/slide{}.xml.rels", i + 1),
                rels.as_bytes(),
            );
        }

        for (file, bytes) in &self.media {
            put(&mut zip, &format!("ppt/media/{}", file), bytes);
        }

        zip.finish().unwrap().into_inner()
    }

    pub fn write_to(&self, path: &Path) {
        std::fs::write(path, self.build()).unwrap();
    }
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Default Extension="jpeg" ContentType="image/jpeg"/></Types>"#;

/// Wrap shape snippets in a slide document.
pub fn slide_xml(shapes: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="{}" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        REL_NS,
        shapes.concat()
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn paragraphs(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            format!(
                r#"<a:p><a:r><a:rPr lang="da-DK" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#,
                escape(line)
            )
        })
        .collect()
}

fn sp(id: u32, name: &str, nv_pr: &str, text: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{}"/><p:cNvSpPr/><p:nvPr>{}</p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{}</p:txBody></p:sp>"#,
        id,
        name,
        nv_pr,
        paragraphs(text)
    )
}

pub fn text_shape(id: u32, text: &str) -> String {
    sp(id, &format!("TextBox {}", id), "", text)
}

pub fn title_shape(id: u32, text: &str) -> String {
    sp(id, "Title 1", r#"<p:ph type="title"/>"#, text)
}

pub fn placeholder_shape(id: u32, idx: u32, text: &str) -> String {
    sp(
        id,
        &format!("Content Placeholder {}", id),
        &format!(r#"<p:ph idx="{}"/>"#, idx),
        text,
    )
}

/// An autoshape without a text body.
pub fn empty_shape(id: u32) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="Rectangle {}"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/></p:sp>"#,
        id, id
    )
}

pub fn picture_shape(id: u32, r_id: &str) -> String {
    format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="{}" name="Picture {}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr/></p:pic>"#,
        id, id, r_id
    )
}

pub fn group_shape(id: u32, inner: &str) -> String {
    format!(
        r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="{}" name="Group {}"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:grpSp>"#,
        id, id, inner
    )
}

/// Info slide followed by three outcome slides, one picture each.
pub fn respondent_slides(builder: DeckBuilder, info: &str, media: [&str; 3]) -> DeckBuilder {
    let mut builder = builder.slide(&[
        title_shape(2, "Deltager"),
        placeholder_shape(3, 1, info),
    ]);
    for (i, file) in media.iter().enumerate() {
        builder = builder.slide_with_images(
            &[
                title_shape(2, "Ting"),
                text_shape(3, &format!("Historie {}", i + 1)),
                picture_shape(4, "rId2"),
            ],
            &[("rId2", file)],
        );
    }
    builder
}

pub fn png_bytes() -> Vec<u8> {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(b"\x00\x00\x00\x0dIHDRfixture");
    bytes
}

pub fn jpeg_bytes() -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([200, 40, 40])));
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .unwrap();
    buf
}

/// A JPEG with an APP2 `MPF` segment right after SOI, like camera MPO files.
pub fn mpo_bytes() -> Vec<u8> {
    let jpeg = jpeg_bytes();
    let payload: &[u8] = b"MPF\0MM\0\x2a\0\0\0\x08";
    let len = (payload.len() + 2) as u16;

    let mut bytes = jpeg[..2].to_vec();
    bytes.extend_from_slice(&[0xFF, 0xE2]);
    bytes.extend_from_slice(&len.to_be_bytes());
    bytes.extend_from_slice(payload);
    bytes.extend_from_slice(&jpeg[2..]);
    bytes
}

/// MPF-tagged bytes that no decoder accepts.
pub fn broken_mpo_bytes() -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE2, 0x00, 0x0E];
    bytes.extend_from_slice(b"MPF\0MM\0\x2a\0\0\0\x08");
    bytes.extend_from_slice(b"truncated");
    bytes
}
