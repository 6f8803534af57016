//! Owned, mutable XML tree for OOXML parts.
//!
//! Parts are read with the quick-xml event reader into an [`Element`] tree,
//! mutated in place, and written back with the quick-xml writer. Qualified
//! names are kept verbatim (`p:sp`, `w:r`) so the output keeps the prefixes
//! of the source part; lookups go through the local name.

use crate::{Error, Result};
use quick_xml::escape::escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use std::borrow::Cow;

/// UTF-8 byte order mark some producers emit before the declaration.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// A node inside an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
}

/// An XML element with its attributes and children in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Qualified name as written in the source (`a:rPr`).
    pub name: String,
    /// Attributes in source order, values unescaped.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// The `<?xml ...?>` declaration of a part.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

impl Default for Declaration {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            encoding: Some("UTF-8".to_string()),
            standalone: Some("yes".to_string()),
        }
    }
}

/// A parsed XML part.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub declaration: Option<Declaration>,
    pub root: Element,
}

/// Extract the local name from a potentially namespaced XML name.
pub fn local_name(name: &str) -> &str {
    match name.find(':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

impl Element {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: add an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder: append a child element.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Builder: append a text node.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Namespace prefix of the element name (`a` for `a:p`).
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Name in the same namespace as this element (`a:p` + `pPr` -> `a:pPr`).
    pub fn sibling_name(&self, local: &str) -> String {
        match self.prefix() {
            Some(prefix) => format!("{}:{}", prefix, local),
            None => local.to_string(),
        }
    }

    /// Whether this element has the given local name.
    pub fn is(&self, local: &str) -> bool {
        self.local_name() == local
    }

    /// Attribute by exact qualified name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute by local name, ignoring the prefix.
    pub fn attr_local(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| !k.starts_with("xmlns") && local_name(k) == local)
            .map(|(_, v)| v.as_str())
    }

    /// Namespace-qualified attribute by local name (`r:id`, skipping a bare `id`).
    pub fn prefixed_attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| {
                k.split_once(':')
                    .is_some_and(|(prefix, name)| prefix != "xmlns" && name == local)
            })
            .map(|(_, v)| v.as_str())
    }

    /// Set (or replace) an attribute by exact qualified name.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(k, _)| k == name)?;
        Some(self.attributes.remove(pos).1)
    }

    /// Child elements in order.
    pub fn elements(&self) -> impl DoubleEndedIterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element with the given local name.
    pub fn child(&self, local: &str) -> Option<&Element> {
        self.elements().find(|e| e.is(local))
    }

    pub fn child_mut(&mut self, local: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.is(local))
    }

    /// All child elements with the given local name.
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |e| e.is(local))
    }

    /// Follow a chain of child local names.
    pub fn path(&self, locals: &[&str]) -> Option<&Element> {
        locals.iter().try_fold(self, |el, local| el.child(local))
    }

    pub fn path_mut(&mut self, locals: &[&str]) -> Option<&mut Element> {
        let mut current = self;
        for local in locals {
            current = current.child_mut(local)?;
        }
        Some(current)
    }

    /// Pre-order traversal of all descendant elements (self excluded).
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.elements().rev().collect(),
        }
    }

    pub fn find_descendant(&self, local: &str) -> Option<&Element> {
        self.descendants().find(|e| e.is(local))
    }

    pub fn has_descendant(&self, local: &str) -> bool {
        self.find_descendant(local).is_some()
    }

    /// Visit every descendant element mutably, pre-order.
    pub fn for_each_descendant_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        for child in self.elements_mut() {
            f(child);
            child.for_each_descendant_mut(f);
        }
    }

    /// Concatenated text of every descendant text node.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) | Node::CData(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
                _ => {}
            }
        }
    }

    /// Append a child element and return a handle to it.
    pub fn push(&mut self, child: Element) -> &mut Element {
        self.children.push(Node::Element(child));
        let idx = self.children.len() - 1;
        self.element_at(idx)
    }

    /// Drop all attributes and children, leaving an empty element.
    pub fn clear(&mut self) {
        self.attributes.clear();
        self.children.clear();
    }

    /// Remove child elements matching the predicate; returns how many were removed.
    pub fn remove_children(&mut self, mut pred: impl FnMut(&Element) -> bool) -> usize {
        let before = self.children.len();
        self.children.retain(|n| match n {
            Node::Element(e) => !pred(e),
            _ => true,
        });
        before - self.children.len()
    }

    /// Insert `child` respecting a schema sequence given as local names.
    ///
    /// The child goes before the first existing element that ranks later in
    /// `order` or is not listed at all. Children absent from `order` are appended.
    pub fn insert_ordered(&mut self, child: Element, order: &[&str]) -> &mut Element {
        let rank = |name: &str| order.iter().position(|o| *o == name);
        let idx = match rank(child.local_name()) {
            Some(new_rank) => self
                .children
                .iter()
                .position(|n| match n {
                    Node::Element(e) => rank(e.local_name()).map_or(true, |r| r > new_rank),
                    _ => false,
                })
                .unwrap_or(self.children.len()),
            None => self.children.len(),
        };
        self.children.insert(idx, Node::Element(child));
        self.element_at(idx)
    }

    /// Return the child with the local name of `name`, creating it in schema order if absent.
    pub fn upsert_child_ordered(&mut self, name: &str, order: &[&str]) -> &mut Element {
        let local = local_name(name);
        let existing = self
            .children
            .iter()
            .position(|n| matches!(n, Node::Element(e) if e.is(local)));
        match existing {
            Some(idx) => self.element_at(idx),
            None => self.insert_ordered(Element::new(name), order),
        }
    }

    fn element_at(&mut self, idx: usize) -> &mut Element {
        match &mut self.children[idx] {
            Node::Element(e) => e,
            _ => unreachable!("index {} does not hold an element", idx),
        }
    }

    /// Prefix bound to a namespace URI on this element, if any.
    pub fn namespace_prefix(&self, uri: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, v)| k.starts_with("xmlns:") && v == uri)
            .map(|(k, _)| &k["xmlns:".len()..])
    }

    /// Return the prefix bound to `uri`, declaring `preferred` (or a free variant) if needed.
    pub fn ensure_namespace(&mut self, preferred: &str, uri: &str) -> String {
        if let Some(prefix) = self.namespace_prefix(uri) {
            return prefix.to_string();
        }
        let mut prefix = preferred.to_string();
        let mut n = 1;
        while self.attr(&format!("xmlns:{}", prefix)).is_some() {
            prefix = format!("{}{}", preferred, n);
            n += 1;
        }
        self.set_attr(format!("xmlns:{}", prefix), uri);
        prefix
    }

    /// Largest numeric value of `attr` on descendants named `element`, or 0.
    pub fn max_numeric_attr(&self, element: &str, attr: &str) -> u32 {
        std::iter::once(self)
            .chain(self.descendants())
            .filter(|e| e.is(element))
            .filter_map(|e| e.attr_local(attr))
            .filter_map(|v| v.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
    }
}

/// Iterator returned by [`Element::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<&'a Element> {
        let el = self.stack.pop()?;
        self.stack.extend(el.elements().rev());
        Some(el)
    }
}

impl XmlDocument {
    /// Wrap a root element with the standard OOXML declaration.
    pub fn new(root: Element) -> Self {
        Self {
            declaration: Some(Declaration::default()),
            root,
        }
    }

    /// Parse a part. `part` names the source in error messages.
    pub fn parse(part: &str, bytes: &[u8]) -> Result<Self> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut reader = Reader::from_reader(bytes);

        let mut declaration = None;
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Decl(ref d)) => {
                    let version = d
                        .version()
                        .map(|v| String::from_utf8_lossy(&v).into_owned())
                        .unwrap_or_else(|_| "1.0".to_string());
                    let encoding = d
                        .encoding()
                        .and_then(|r| r.ok())
                        .map(|v| String::from_utf8_lossy(&v).into_owned());
                    let standalone = d
                        .standalone()
                        .and_then(|r| r.ok())
                        .map(|v| String::from_utf8_lossy(&v).into_owned());
                    declaration = Some(Declaration {
                        version,
                        encoding,
                        standalone,
                    });
                }
                Ok(Event::Start(ref e)) => {
                    stack.push(element_from_start(part, e)?);
                }
                Ok(Event::Empty(ref e)) => {
                    let el = element_from_start(part, e)?;
                    attach(&mut stack, &mut root, el);
                }
                Ok(Event::End(_)) => {
                    let el = stack
                        .pop()
                        .ok_or_else(|| Error::xml(part, "unbalanced end tag"))?;
                    attach(&mut stack, &mut root, el);
                }
                Ok(Event::Text(ref e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = e.unescape().map_err(|err| Error::xml(part, err))?;
                        parent.children.push(Node::Text(text.into_owned()));
                    }
                }
                Ok(Event::CData(ref e)) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .children
                            .push(Node::CData(String::from_utf8_lossy(e).into_owned()));
                    }
                }
                Ok(Event::Comment(ref e)) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .children
                            .push(Node::Comment(String::from_utf8_lossy(e).into_owned()));
                    }
                }
                Ok(Event::PI(ref e)) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::ProcessingInstruction(
                            String::from_utf8_lossy(e).into_owned(),
                        ));
                    }
                }
                Ok(Event::DocType(_)) => {}
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::xml(
                        part,
                        format!("at byte {}: {}", reader.buffer_position(), e),
                    ));
                }
            }
        }

        if !stack.is_empty() {
            return Err(Error::xml(part, "unexpected end of document"));
        }
        let root = root.ok_or_else(|| Error::xml(part, "document has no root element"))?;

        Ok(Self { declaration, root })
    }

    /// Serialize back to bytes.
    pub fn to_bytes(&self, part: &str) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());

        if let Some(decl) = &self.declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new(
                    &decl.version,
                    decl.encoding.as_deref(),
                    decl.standalone.as_deref(),
                )))
                .map_err(|e| Error::xml(part, e))?;
            writer.get_mut().extend_from_slice(b"\r\n");
        }

        write_element(&mut writer, &self.root).map_err(|e| Error::xml(part, e))?;
        Ok(writer.into_inner())
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, el: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(el)),
        None => {
            if root.is_none() {
                *root = Some(el);
            }
        }
    }
}

fn element_from_start(part: &str, e: &BytesStart) -> Result<Element> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|err| Error::xml(part, err))?
        .to_string();

    let mut element = Element::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::xml(part, err))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|err| Error::xml(part, err))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|err| Error::xml(part, err))?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

/// Escape an attribute value. Whitespace other than spaces becomes a character
/// reference, since readers normalize raw tabs and line breaks in attributes.
fn escape_attribute(value: &str) -> String {
    let escaped = escape(value);
    if !escaped.contains(['\n', '\r', '\t']) {
        return escaped.into_owned();
    }
    escaped
        .replace('\n', "&#xA;")
        .replace('\r', "&#xD;")
        .replace('\t', "&#x9;")
}

/// Escape character data. A raw carriage return would be folded into the
/// following line feed on the next read.
fn escape_text(value: &str) -> Cow<'_, str> {
    let escaped = escape(value);
    if escaped.contains('\r') {
        Cow::Owned(escaped.replace('\r', "&#xD;"))
    } else {
        escaped
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, el: &Element) -> quick_xml::Result<()> {
    let mut start = BytesStart::new(el.name.as_str());
    for (k, v) in &el.attributes {
        start.push_attribute(Attribute {
            key: QName(k.as_bytes()),
            value: Cow::Owned(escape_attribute(v).into_bytes()),
        });
    }

    if el.children.is_empty() {
        return writer.write_event(Event::Empty(start));
    }

    writer.write_event(Event::Start(start))?;
    for child in &el.children {
        match child {
            Node::Element(e) => write_element(writer, e)?,
            Node::Text(t) => writer.write_event(Event::Text(BytesText::from_escaped(escape_text(t))))?,
            Node::CData(t) => writer.write_event(Event::CData(BytesCData::new(t.as_str())))?,
            Node::Comment(t) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(t.as_str())))?
            }
            Node::ProcessingInstruction(t) => {
                writer.write_event(Event::PI(BytesText::from_escaped(t.as_str())))?
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new(el.name.as_str())))
}
