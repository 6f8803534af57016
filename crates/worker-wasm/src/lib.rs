//! WASM-compatible wrapper for document rebranding.
//!
//! This crate exposes the PowerPoint and Word rebranding pipelines to
//! JavaScript for use in Cloudflare Workers.

use rebrand_core::{
    output_filename, DocumentFormat, ImageData, RebrandConfig, RebrandReport, ReplacementImages,
};
use rebrand_docx::DocxRebrander;
use rebrand_pptx::PptxRebrander;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// A rebranded document.
#[wasm_bindgen]
pub struct RebrandResult {
    data: Vec<u8>,
    filename: String,
    report: RebrandReport,
}

#[wasm_bindgen]
impl RebrandResult {
    /// Bytes of the rebranded document.
    #[wasm_bindgen(getter)]
    pub fn data(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// Suggested file name for the download.
    #[wasm_bindgen(getter)]
    pub fn filename(&self) -> String {
        self.filename.clone()
    }

    /// Counters and ordered status messages, as a plain object.
    pub fn report(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.report)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}

/// Rebrand a PowerPoint or Word document with the built-in brand settings.
///
/// # Arguments
/// * `data` - The raw bytes of the .pptx or .docx file
/// * `filename` - The original filename (used for format detection and the output name)
/// * `logo` - The replacement logo image
/// * `favicon` - Optional replacement favicon (PowerPoint only)
#[wasm_bindgen]
pub fn rebrand_document(
    data: &[u8],
    filename: &str,
    logo: &[u8],
    favicon: Option<Vec<u8>>,
) -> Result<RebrandResult, JsValue> {
    rebrand_document_impl(data, filename, logo, favicon.as_deref(), RebrandConfig::default())
        .map_err(|e| JsValue::from_str(&e))
}

/// Same as [`rebrand_document`], with a (partial) configuration object.
#[wasm_bindgen]
pub fn rebrand_document_with_config(
    data: &[u8],
    filename: &str,
    logo: &[u8],
    favicon: Option<Vec<u8>>,
    config: JsValue,
) -> Result<RebrandResult, JsValue> {
    let config: RebrandConfig = if config.is_undefined() || config.is_null() {
        RebrandConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?
    };
    rebrand_document_impl(data, filename, logo, favicon.as_deref(), config)
        .map_err(|e| JsValue::from_str(&e))
}

fn rebrand_document_impl(
    data: &[u8],
    filename: &str,
    logo: &[u8],
    favicon: Option<&[u8]>,
    config: RebrandConfig,
) -> Result<RebrandResult, String> {
    let format = DocumentFormat::sniff(data)
        .or_else(|| {
            filename
                .rsplit('.')
                .next()
                .and_then(DocumentFormat::from_extension)
        })
        .ok_or_else(|| "Could not detect file format (expected .pptx or .docx)".to_string())?;

    let logo = ImageData::new(logo.to_vec()).map_err(|e| format!("Logo: {}", e))?;
    let mut images = ReplacementImages::new(logo);
    if let Some(favicon) = favicon {
        let favicon = ImageData::new(favicon.to_vec()).map_err(|e| format!("Favicon: {}", e))?;
        images = images.with_favicon(favicon);
    }

    let filename = output_filename(&config.output_prefix, filename);
    let output = match format {
        DocumentFormat::Pptx => PptxRebrander::new(config)
            .rebrand(data, &images)
            .map_err(|e| format!("PPTX processing error: {}", e))?,
        DocumentFormat::Docx => DocxRebrander::new(config)
            .rebrand(data, &images)
            .map_err(|e| format!("DOCX processing error: {}", e))?,
    };

    Ok(RebrandResult {
        data: output.bytes,
        filename,
        report: output.report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3];

    fn minimal_docx() -> Vec<u8> {
        let files = [
            (
                "[Content_Types].xml",
                r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#,
            ),
            (
                "_rels/.rels",
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#,
            ),
            (
                "word/document.xml",
                r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>Hello there</w:t></w:r></w:p><w:sectPr/></w:body></w:document>"#,
            ),
        ];
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in files {
            zip.start_file(name, FileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_rebrand_docx() {
        let result =
            rebrand_document_impl(&minimal_docx(), "memo.docx", PNG, None, RebrandConfig::default())
                .unwrap();

        assert_eq!(result.filename, "ISPA_memo.docx");
        assert_eq!(result.report.format, DocumentFormat::Docx);
        assert_eq!(result.report.paragraphs_styled, 1);
        assert_eq!(DocumentFormat::sniff(&result.data), Some(DocumentFormat::Docx));
    }

    #[test]
    fn test_custom_prefix() {
        let config = RebrandConfig::default().with_output_prefix("NEW_");
        let result = rebrand_document_impl(&minimal_docx(), "memo.docx", PNG, None, config).unwrap();
        assert_eq!(result.filename, "NEW_memo.docx");
    }

    #[test]
    fn test_rejects_unknown_format() {
        let err = rebrand_document_impl(b"hello", "notes.txt", PNG, None, RebrandConfig::default())
            .err()
            .unwrap();
        assert!(err.contains("Could not detect file format"));
    }

    #[test]
    fn test_rejects_bad_logo() {
        let err = rebrand_document_impl(&minimal_docx(), "memo.docx", b"text", None, RebrandConfig::default())
            .err()
            .unwrap();
        assert!(err.starts_with("Logo:"));
    }
}
