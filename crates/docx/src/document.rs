//! Loading a word-processing package: main part, paragraph styles, sections and headers.

use rebrand_core::package::resolve_target;
use rebrand_core::{Element, Error, Package, Result};
use std::collections::HashMap;

/// Main part when the package relationships do not name one.
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Paragraph style id -> display name, from `word/styles.xml`.
#[derive(Debug, Clone, Default)]
pub struct StyleNames {
    names: HashMap<String, String>,
    default_paragraph: Option<String>,
}

impl StyleNames {
    /// Read the paragraph styles of a styles part.
    pub fn from_styles(root: &Element) -> Self {
        let mut styles = Self::default();
        for style in root
            .children_named("style")
            .filter(|s| s.attr_local("type") == Some("paragraph"))
        {
            let Some(id) = style.attr_local("styleId") else {
                continue;
            };
            let name = style
                .child("name")
                .and_then(|n| n.attr_local("val"))
                .unwrap_or(id)
                .to_string();
            if matches!(style.attr_local("default"), Some("1" | "true" | "on")) {
                styles.default_paragraph = Some(name.clone());
            }
            styles.names.insert(id.to_string(), name);
        }
        styles
    }

    pub fn name(&self, style_id: &str) -> Option<&str> {
        self.names.get(style_id).map(String::as_str)
    }

    /// Name of the style paragraphs without `w:pStyle` use.
    pub fn default_paragraph(&self) -> Option<&str> {
        self.default_paragraph.as_deref()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// An opened word-processing document.
pub struct DocxDocument {
    package: Package,
    main_part: String,
    style_names: StyleNames,
}

impl DocxDocument {
    /// Open a document from in-memory bytes.
    pub fn open(bytes: &[u8]) -> Result<Self> {
        let mut package = Package::open(bytes)?;
        let main_part = package.main_part().unwrap_or_else(|_| DOCUMENT_PART.to_string());
        if !package.contains(&main_part) {
            return Err(Error::MissingPart(main_part));
        }
        body(&package.xml_mut(&main_part)?.root)?;

        let styles_part = related_part(&mut package, &main_part, "/styles")?;
        let style_names = match styles_part {
            Some(part) => StyleNames::from_styles(&package.xml_mut(&part)?.root),
            None => StyleNames::default(),
        };
        log::debug!("{} paragraph style(s) in {}", style_names.len(), main_part);

        Ok(Self {
            package,
            main_part,
            style_names,
        })
    }

    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    pub fn style_names(&self) -> &StyleNames {
        &self.style_names
    }

    pub fn package_mut(&mut self) -> &mut Package {
        &mut self.package
    }

    /// Number of sections (`w:sectPr` elements) in the body.
    pub fn section_count(&mut self) -> Result<usize> {
        let root = &self.package.xml_mut(&self.main_part)?.root;
        Ok(section_properties(body(root)?).len())
    }

    /// Default header part of every section, in section order.
    ///
    /// A section without its own default header reference continues the
    /// previous section's header.
    pub fn section_headers(&mut self) -> Result<Vec<Option<String>>> {
        let rels = self.package.relationships(&self.main_part)?;
        let root = &self.package.xml_mut(&self.main_part)?.root;

        let mut previous: Option<String> = None;
        let mut headers = Vec::new();
        for sect_pr in section_properties(body(root)?) {
            let own = sect_pr
                .children_named("headerReference")
                .find(|r| r.attr_local("type").unwrap_or("default") == "default")
                .and_then(|r| r.prefixed_attr("id"))
                .and_then(|id| rels.get(id))
                .map(|rel| resolve_target(&self.main_part, &rel.target));
            if own.is_some() {
                previous = own;
            }
            headers.push(previous.clone());
        }

        let package = &self.package;
        Ok(headers
            .into_iter()
            .map(|h| h.filter(|part| package.contains(part)))
            .collect())
    }

    /// Distinct default header parts, in first-use order.
    pub fn header_parts(&mut self) -> Result<Vec<String>> {
        let mut parts: Vec<String> = Vec::new();
        for part in self.section_headers()?.into_iter().flatten() {
            if !parts.contains(&part) {
                parts.push(part);
            }
        }
        Ok(parts)
    }

    /// Next free `wp:docPr@id` across the body and every header.
    pub fn next_drawing_id(&mut self) -> Result<u32> {
        let mut parts = vec![self.main_part.clone()];
        parts.extend(self.header_parts()?);
        let mut max = 0;
        for part in parts {
            let root = &self.package.xml_mut(&part)?.root;
            max = max.max(root.max_numeric_attr("docPr", "id"));
        }
        Ok(max + 1)
    }

    /// Top-level body paragraphs.
    pub fn paragraph_count(&mut self) -> Result<usize> {
        let root = &self.package.xml_mut(&self.main_part)?.root;
        Ok(body(root)?.children_named("p").count())
    }

    /// All `w:r` runs in the body.
    pub fn run_count(&mut self) -> Result<usize> {
        let root = &self.package.xml_mut(&self.main_part)?.root;
        Ok(body(root)?.descendants().filter(|e| e.is("r")).count())
    }

    /// Serialize the document back to a ZIP.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.package.to_bytes()
    }
}

/// The `w:body` of a document root.
pub fn body(root: &Element) -> Result<&Element> {
    root.child("body")
        .ok_or_else(|| Error::CorruptedFile("document has no body".to_string()))
}

pub fn body_mut(root: &mut Element) -> Result<&mut Element> {
    root.child_mut("body")
        .ok_or_else(|| Error::CorruptedFile("document has no body".to_string()))
}

/// Section properties in document order: those ending a paragraph, then the body's own.
fn section_properties(body: &Element) -> Vec<&Element> {
    body.elements()
        .filter_map(|child| match child.local_name() {
            "p" => child.path(&["pPr", "sectPr"]),
            "sectPr" => Some(child),
            _ => None,
        })
        .collect()
}

fn related_part(package: &mut Package, part: &str, rel_type: &str) -> Result<Option<String>> {
    let rels = package.relationships(part)?;
    Ok(rels
        .find_by_type(rel_type)
        .map(|rel| resolve_target(part, &rel.target))
        .filter(|target| package.contains(target)))
}
