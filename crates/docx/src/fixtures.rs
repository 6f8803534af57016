//! In-memory word-processing documents for tests.

use rebrand_core::ImageData;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const WP_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const STYLES: &str = r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style><w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style>"#;

pub fn png() -> ImageData {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(b"new logo");
    ImageData::new(bytes).unwrap()
}

/// A one-run paragraph, optionally with a paragraph style id.
pub fn paragraph(style: Option<&str>, text: &str) -> String {
    let ppr = style
        .map(|id| format!(r#"<w:pPr><w:pStyle w:val="{id}"/></w:pPr>"#))
        .unwrap_or_default();
    format!(r#"<w:p>{ppr}<w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#)
}

fn drawing_run(doc_pr_id: u32) -> String {
    format!(
        r#"<w:r><w:drawing><wp:inline><wp:extent cx="720000" cy="720000"/><wp:docPr id="{doc_pr_id}" name="Old logo"/></wp:inline></w:drawing></w:r>"#
    )
}

/// A paragraph holding only an inline picture.
pub fn drawing_paragraph(doc_pr_id: u32) -> String {
    format!("<w:p>{}</w:p>", drawing_run(doc_pr_id))
}

fn sect_pr(header: Option<u32>) -> String {
    let reference = header
        .map(|n| format!(r#"<w:headerReference w:type="default" r:id="rIdHeader{n}"/>"#))
        .unwrap_or_default();
    format!(r#"<w:sectPr>{reference}<w:pgSz w:w="11906" w:h="16838"/></w:sectPr>"#)
}

/// Builds a document with styles, optional headers and explicit sections.
pub struct DocxBuilder {
    body: Vec<String>,
    headers: Vec<(u32, bool)>,
    raw_document: Option<String>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self {
            body: Vec::new(),
            headers: Vec::new(),
            raw_document: None,
        }
    }

    pub fn paragraph(mut self, xml: String) -> Self {
        self.body.push(xml);
        self
    }

    /// End the current section with an empty paragraph carrying its properties.
    pub fn section_break(mut self, header: Option<u32>) -> Self {
        self.body
            .push(format!("<w:p><w:pPr>{}</w:pPr></w:p>", sect_pr(header)));
        self
    }

    /// The body's closing section properties.
    pub fn final_section(mut self, header: Option<u32>) -> Self {
        self.body.push(sect_pr(header));
        self
    }

    /// Header part `word/header<n>.xml`, with or without a picture.
    pub fn header(mut self, n: u32, with_picture: bool) -> Self {
        self.headers.push((n, with_picture));
        self
    }

    pub fn raw_document(mut self, xml: &str) -> Self {
        self.raw_document = Some(xml.to_string());
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut files: Vec<(String, Vec<u8>)> = Vec::new();
        let mut text = |name: &str, body: String| files.push((name.to_string(), body.into_bytes()));

        text(
            "[Content_Types].xml",
            format!(
                r#"{DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#
            ),
        );
        text(
            "_rels/.rels",
            format!(
                r#"{DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{R_NS}/officeDocument" Target="word/document.xml"/></Relationships>"#
            ),
        );

        let document = self.raw_document.clone().unwrap_or_else(|| {
            format!(
                r#"{DECL}<w:document xmlns:w="{W_NS}" xmlns:r="{R_NS}" xmlns:wp="{WP_NS}"><w:body>{}</w:body></w:document>"#,
                self.body.concat()
            )
        });
        text("word/document.xml", document);

        let mut document_rels = format!(
            r#"<Relationship Id="rId1" Type="{R_NS}/styles" Target="styles.xml"/>"#
        );
        for (n, _) in &self.headers {
            document_rels.push_str(&format!(
                r#"<Relationship Id="rIdHeader{n}" Type="{R_NS}/header" Target="header{n}.xml"/>"#
            ));
        }
        text(
            "word/_rels/document.xml.rels",
            format!(
                r#"{DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{document_rels}</Relationships>"#
            ),
        );
        text(
            "word/styles.xml",
            format!(r#"{DECL}<w:styles xmlns:w="{W_NS}">{STYLES}</w:styles>"#),
        );

        for (n, with_picture) in &self.headers {
            let content = if *with_picture {
                format!(r#"<w:p><w:r><w:t>Company</w:t></w:r>{}</w:p>"#, drawing_run(41))
            } else {
                r#"<w:p><w:r><w:t>Company</w:t></w:r></w:p>"#.to_string()
            };
            text(
                &format!("word/header{n}.xml"),
                format!(
                    r#"{DECL}<w:hdr xmlns:w="{W_NS}" xmlns:r="{R_NS}" xmlns:wp="{WP_NS}">{content}</w:hdr>"#
                ),
            );
        }
        drop(text);

        if self.headers.iter().any(|(_, with_picture)| *with_picture) {
            let mut old_logo = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
            old_logo.extend_from_slice(b"old logo");
            files.push(("word/media/image1.png".to_string(), old_logo));
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in files {
            zip.start_file(name, FileOptions::default()).unwrap();
            zip.write_all(&body).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }
}
