//! OPC package: the ZIP container shared by PPTX and DOCX.
//!
//! Parts are kept in archive order. XML parts are parsed on demand into
//! [`XmlDocument`] trees; everything else stays as raw bytes. Writing the
//! package re-encodes every parsed part.

use crate::types::ImageData;
use crate::xml::{Element, XmlDocument};
use crate::{Error, Result};
use regex::Regex;
use std::io::{Cursor, Read, Seek, Write};
use std::sync::LazyLock;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Relationship type of an embedded image.
pub const REL_TYPE_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// Trailing number of a part name (`image12.png` -> 12).
static PART_NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)(?:\.[A-Za-z0-9]+)*$").unwrap());

/// Extract the trailing number from a part name or relationship id.
pub fn part_number(name: &str) -> Option<u32> {
    PART_NUMBER_REGEX
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[derive(Debug, Clone)]
enum PartData {
    Raw(Vec<u8>),
    Xml(XmlDocument),
}

#[derive(Debug, Clone)]
struct Part {
    name: String,
    data: PartData,
}

/// An opened OPC package.
#[derive(Debug, Clone)]
pub struct Package {
    parts: Vec<Part>,
}

impl Package {
    /// Open a package from in-memory bytes.
    pub fn open(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Open a package from a reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut data = Vec::new();
            entry
                .read_to_end(&mut data)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))?;
            parts.push(Part {
                name,
                data: PartData::Raw(data),
            });
        }

        if !parts.iter().any(|p| p.name == CONTENT_TYPES_PART) {
            return Err(Error::MissingPart(CONTENT_TYPES_PART.to_string()));
        }

        Ok(Self { parts })
    }

    /// Part names in archive order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.iter().any(|p| p.name == name)
    }

    /// Bytes of a part that has not been parsed as XML.
    pub fn raw(&self, name: &str) -> Option<&[u8]> {
        self.parts.iter().find(|p| p.name == name).and_then(|p| match &p.data {
            PartData::Raw(bytes) => Some(bytes.as_slice()),
            PartData::Xml(_) => None,
        })
    }

    /// Parse (if needed) and borrow an XML part.
    pub fn xml_mut(&mut self, name: &str) -> Result<&mut XmlDocument> {
        let part = self
            .parts
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::MissingPart(name.to_string()))?;

        if let PartData::Raw(bytes) = &part.data {
            let doc = XmlDocument::parse(name, bytes)?;
            part.data = PartData::Xml(doc);
        }
        match &mut part.data {
            PartData::Xml(doc) => Ok(doc),
            PartData::Raw(_) => unreachable!("part was just parsed"),
        }
    }

    /// Move an XML part out so it can be edited alongside the package.
    /// Put it back with [`Package::put_xml`].
    pub fn take_xml(&mut self, name: &str) -> Result<XmlDocument> {
        let doc = self.xml_mut(name)?;
        Ok(std::mem::replace(doc, XmlDocument::new(Element::new("placeholder"))))
    }

    /// Store an XML part, replacing an existing part of that name or appending a new one.
    pub fn put_xml(&mut self, name: &str, doc: XmlDocument) {
        self.put(name, PartData::Xml(doc));
    }

    /// Store a binary part.
    pub fn put_raw(&mut self, name: &str, bytes: Vec<u8>) {
        self.put(name, PartData::Raw(bytes));
    }

    fn put(&mut self, name: &str, data: PartData) {
        match self.parts.iter_mut().find(|p| p.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(Part {
                name: name.to_string(),
                data,
            }),
        }
    }

    /// Name of the main document part, from the package relationships.
    pub fn main_part(&mut self) -> Result<String> {
        let rels = self.relationships("")?;
        rels.find_by_type("/officeDocument")
            .map(|rel| resolve_target("", &rel.target))
            .ok_or_else(|| Error::MissingPart("officeDocument relationship".to_string()))
    }

    /// Relationships of a part (`""` for the package itself). Empty when the part has none.
    pub fn relationships(&mut self, part: &str) -> Result<Relationships> {
        let rels_name = rels_part_name(part);
        if !self.contains(&rels_name) {
            return Ok(Relationships::default());
        }
        let doc = self.xml_mut(&rels_name)?;
        Ok(Relationships::from_xml(&doc.root))
    }

    pub fn set_relationships(&mut self, part: &str, rels: &Relationships) {
        self.put_xml(&rels_part_name(part), rels.to_xml());
    }

    /// Register a default content type for an extension if none exists.
    pub fn ensure_default_content_type(&mut self, extension: &str, content_type: &str) -> Result<()> {
        let doc = self.xml_mut(CONTENT_TYPES_PART)?;
        let present = doc.root.children_named("Default").any(|d| {
            d.attr("Extension")
                .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        });
        if !present {
            let default = Element::new("Default")
                .with_attr("Extension", extension)
                .with_attr("ContentType", content_type);
            doc.root.insert_ordered(default, &["Default"]);
        }
        Ok(())
    }

    /// Store an image under `dir`, reusing an identical existing media part.
    /// Returns the part name.
    pub fn add_media(&mut self, dir: &str, image: &ImageData) -> Result<String> {
        let ext = image.format().extension();
        let prefix = format!("{}/", dir.trim_end_matches('/'));

        let existing = self
            .parts
            .iter()
            .filter(|p| p.name.starts_with(&prefix))
            .find(|p| matches!(&p.data, PartData::Raw(bytes) if bytes == image.bytes()))
            .map(|p| p.name.clone());
        if let Some(name) = existing {
            self.ensure_default_content_type(ext, image.format().content_type())?;
            return Ok(name);
        }

        let next = self
            .parts
            .iter()
            .filter(|p| p.name.starts_with(&prefix))
            .filter_map(|p| part_number(&p.name))
            .max()
            .unwrap_or(0)
            + 1;
        let name = format!("{}image{}.{}", prefix, next, ext);

        self.put_raw(&name, image.bytes().to_vec());
        self.ensure_default_content_type(ext, image.format().content_type())?;
        log::debug!("Added media part {}", name);
        Ok(name)
    }

    /// Serialize the package to ZIP bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let deflated = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let stored = FileOptions::default().compression_method(CompressionMethod::Stored);

        for part in &self.parts {
            let bytes = match &part.data {
                PartData::Raw(bytes) => std::borrow::Cow::Borrowed(bytes.as_slice()),
                PartData::Xml(doc) => std::borrow::Cow::Owned(doc.to_bytes(&part.name)?),
            };
            let options = if part.name.contains("/media/") {
                stored
            } else {
                deflated
            };
            zip.start_file(part.name.as_str(), options)?;
            zip.write_all(&bytes)?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

/// One package relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

/// The relationships of one part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    items: Vec<Relationship>,
}

impl Relationships {
    fn from_xml(root: &Element) -> Self {
        let items = root
            .children_named("Relationship")
            .map(|e| Relationship {
                id: e.attr("Id").unwrap_or_default().to_string(),
                rel_type: e.attr("Type").unwrap_or_default().to_string(),
                target: e.attr("Target").unwrap_or_default().to_string(),
                external: e.attr("TargetMode") == Some("External"),
            })
            .collect();
        Self { items }
    }

    fn to_xml(&self) -> XmlDocument {
        let mut root = Element::new("Relationships").with_attr("xmlns", RELATIONSHIPS_NS);
        for rel in &self.items {
            let mut el = Element::new("Relationship")
                .with_attr("Id", rel.id.as_str())
                .with_attr("Type", rel.rel_type.as_str())
                .with_attr("Target", rel.target.as_str());
            if rel.external {
                el.set_attr("TargetMode", "External");
            }
            root.push(el);
        }
        XmlDocument::new(root)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.items.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.id == id)
    }

    /// First relationship whose type ends with `suffix` (`"/slideLayout"`).
    pub fn find_by_type(&self, suffix: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.rel_type.ends_with(suffix))
    }

    /// Existing internal relationship of the given type and target.
    pub fn find(&self, rel_type: &str, target: &str) -> Option<&Relationship> {
        self.items
            .iter()
            .find(|r| !r.external && r.rel_type == rel_type && r.target == target)
    }

    /// Add an internal relationship (or reuse an identical one); returns its id.
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        if let Some(existing) = self.find(rel_type, target) {
            return existing.id.clone();
        }
        let next = self
            .items
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let id = format!("rId{}", next);
        self.items.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            external: false,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// `ppt/slides/slide1.xml` -> `ppt/slides/_rels/slide1.xml.rels`; `""` -> `_rels/.rels`.
pub fn rels_part_name(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the part that owns the relationship.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = source_part.split('/').collect();
    segments.pop();
    for seg in target.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.retain(|s| !s.is_empty());
    segments.join("/")
}

/// Relative target from one part to another (`../media/image1.png`).
pub fn relative_target(source_part: &str, target_part: &str) -> String {
    let from: Vec<&str> = source_part.split('/').collect();
    let from_dir = &from[..from.len().saturating_sub(1)];
    let to: Vec<&str> = target_part.split('/').collect();

    let common = from_dir
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<&str> = vec![".."; from_dir.len() - common];
    segments.extend_from_slice(&to[common..]);
    segments.join("/")
}
