//! Domain types shared by the presentation and word-processing pipelines.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Cursor, Read, Seek};

/// EMU per centimetre (OOXML absolute length unit).
pub const EMU_PER_CM: i64 = 360_000;

/// The format of the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// PowerPoint presentation (PresentationML).
    Pptx,
    /// Word document (WordprocessingML).
    Docx,
}

impl DocumentFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pptx" => Some(Self::Pptx),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    /// Detect format from the content: a ZIP container holding the main part
    /// of one of the two families.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        // Both families are ZIP files (PK\x03\x04)
        if !bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return None;
        }
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).ok()?;
        Self::from_archive(&archive)
    }

    fn from_archive<R: Read + Seek>(archive: &zip::ZipArchive<R>) -> Option<Self> {
        let mut names = archive.file_names();
        if names.any(|n| n == "ppt/presentation.xml") {
            return Some(Self::Pptx);
        }
        if archive.file_names().any(|n| n == "word/document.xml") {
            return Some(Self::Docx);
        }
        None
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pptx => "PowerPoint",
            Self::Docx => "Word",
        })
    }
}

/// A length in English Metric Units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Emu(pub i64);

impl Emu {
    /// Length from hundredths of a centimetre, exact in EMU.
    pub const fn from_cm_hundredths(value: i64) -> Self {
        Emu(value * EMU_PER_CM / 100)
    }

    pub fn from_cm(cm: f64) -> Self {
        Emu((cm * EMU_PER_CM as f64).round() as i64)
    }

    pub fn as_cm(self) -> f64 {
        self.0 as f64 / EMU_PER_CM as f64
    }

    /// Double the length (the detection tolerance for legacy images).
    pub const fn doubled(self) -> Self {
        Emu(self.0 * 2)
    }

    /// Parse an OOXML coordinate attribute value.
    pub fn parse(attribute: &str, value: &str) -> Result<Self> {
        value
            .trim()
            .parse::<i64>()
            .map(Emu)
            .map_err(|_| Error::invalid_attribute(attribute, value))
    }
}

impl fmt::Display for Emu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}cm", self.as_cm())
    }
}

/// Position and size of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: Emu,
    pub top: Emu,
    pub width: Emu,
    pub height: Emu,
}

impl Rect {
    pub const fn new(left: Emu, top: Emu, width: Emu, height: Emu) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Rectangle from centimetre values.
    pub fn from_cm(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self::new(
            Emu::from_cm(left),
            Emu::from_cm(top),
            Emu::from_cm(width),
            Emu::from_cm(height),
        )
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) {} x {}",
            self.left, self.top, self.width, self.height
        )
    }
}

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RgbColor(pub u8, pub u8, pub u8);

impl RgbColor {
    pub const BLACK: RgbColor = RgbColor(0, 0, 0);

    /// Upper-case hex as OOXML writes it (`6F9CEB`).
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }

    /// Parse `RRGGBB`, with or without a leading `#`.
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(RgbColor(r, g, b))
    }
}

impl TryFrom<String> for RgbColor {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        RgbColor::from_hex(&value).ok_or_else(|| format!("invalid color '{}'", value))
    }
}

impl From<RgbColor> for String {
    fn from(color: RgbColor) -> Self {
        format!("#{}", color.to_hex())
    }
}

/// Raster formats accepted as replacement images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
}

impl ImageFormat {
    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if bytes.starts_with(b"BM") {
            Some(Self::Bmp)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
        }
    }
}

/// A replacement image held in memory.
#[derive(Debug, Clone)]
pub struct ImageData {
    bytes: Vec<u8>,
    format: ImageFormat,
}

impl ImageData {
    /// Wrap image bytes, rejecting anything that is not a recognized raster format.
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        let format = ImageFormat::from_magic(&bytes).ok_or_else(|| {
            Error::UnsupportedImage("expected PNG, JPEG, GIF or BMP data".to_string())
        })?;
        Ok(Self { bytes, format })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }
}

/// The replacement images supplied with one request.
#[derive(Debug, Clone)]
pub struct ReplacementImages {
    pub logo: ImageData,
    pub favicon: Option<ImageData>,
}

impl ReplacementImages {
    pub fn new(logo: ImageData) -> Self {
        Self {
            logo,
            favicon: None,
        }
    }

    pub fn with_favicon(mut self, favicon: ImageData) -> Self {
        self.favicon = Some(favicon);
        self
    }
}

/// Name of the output file: `prefix` followed by the original file name.
pub fn output_filename(prefix: &str, original: &str) -> String {
    let name = original
        .rsplit(['/', '\\'])
        .next()
        .filter(|n| !n.is_empty())
        .unwrap_or("document");
    format!("{}{}", prefix, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn zip_with(names: &[&str]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for name in names {
            zip.start_file(*name, zip::write::FileOptions::default())
                .unwrap();
            zip.write_all(b"<x/>").unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_extension("PPTX"), Some(DocumentFormat::Pptx));
        assert_eq!(DocumentFormat::from_extension("docx"), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::from_extension("ppt"), None);
    }

    #[test]
    fn test_format_sniff() {
        let pptx = zip_with(&["[Content_Types].xml", "ppt/presentation.xml"]);
        let docx = zip_with(&["[Content_Types].xml", "word/document.xml"]);
        let other = zip_with(&["mimetype"]);

        assert_eq!(DocumentFormat::sniff(&pptx), Some(DocumentFormat::Pptx));
        assert_eq!(DocumentFormat::sniff(&docx), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::sniff(&other), None);
        assert_eq!(DocumentFormat::sniff(b"not a zip"), None);
    }

    #[test]
    fn test_emu_conversions() {
        assert_eq!(Emu::from_cm_hundredths(85), Emu(306_000));
        assert_eq!(Emu::from_cm_hundredths(273), Emu(982_800));
        assert_eq!(Emu::from_cm(2.73), Emu(982_800));
        assert_eq!(Emu::from_cm_hundredths(200).doubled(), Emu(1_440_000));
        assert!(Emu::parse("x", "12a").is_err());
        assert_eq!(Emu::parse("x", " 42 ").unwrap(), Emu(42));
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(RgbColor(111, 156, 235).to_hex(), "6F9CEB");
        assert_eq!(RgbColor::from_hex("#6f9ceb"), Some(RgbColor(111, 156, 235)));
        assert_eq!(RgbColor::from_hex("zzzzzz"), None);
        assert_eq!(RgbColor::from_hex("12345"), None);
    }

    #[test]
    fn test_image_format_detection() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        assert_eq!(ImageFormat::from_magic(&png), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_magic(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_magic(b"GIF89a.."), Some(ImageFormat::Gif));
        assert!(ImageData::new(b"plain text".to_vec()).is_err());
    }

    #[test]
    fn test_output_filename() {
        assert_eq!(output_filename("ISPA_", "deck.pptx"), "ISPA_deck.pptx");
        assert_eq!(output_filename("ISPA_", "/tmp/in/report.docx"), "ISPA_report.docx");
        assert_eq!(output_filename("X-", ""), "X-document");
    }
}
