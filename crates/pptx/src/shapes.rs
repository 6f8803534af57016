//! Reading shapes out of a slide or master shape tree.

use rebrand_core::{Element, Emu, Error, Rect, Result, ShapeKind};

/// Kind of a top-level shape-tree child.
pub fn shape_kind(shape: &Element) -> ShapeKind {
    match shape.local_name() {
        "pic" if placeholder(shape).is_none() => ShapeKind::Picture,
        "sp" if shape.child("txBody").is_some() => ShapeKind::TextContainer,
        "graphicFrame" if shape.has_descendant("tbl") => ShapeKind::Table,
        _ => ShapeKind::Other,
    }
}

/// The non-visual properties holder (`p:nvSpPr`, `p:nvPicPr`, ...).
fn non_visual(shape: &Element) -> Option<&Element> {
    shape.elements().find(|e| e.local_name().starts_with("nv"))
}

/// Shape name from `p:cNvPr@name`, for diagnostics.
pub fn shape_name(shape: &Element) -> &str {
    non_visual(shape)
        .and_then(|nv| nv.child("cNvPr"))
        .and_then(|c| c.attr("name"))
        .unwrap_or("unnamed")
}

/// Identity of a placeholder, used to find inherited geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderKey {
    /// `p:ph@type`, defaulting to `obj`.
    pub ph_type: String,
    pub idx: Option<u32>,
}

impl PlaceholderKey {
    /// Type a master uses for the same role.
    fn master_type(&self) -> &str {
        match self.ph_type.as_str() {
            "ctrTitle" => "title",
            "subTitle" | "obj" | "chart" | "tbl" | "pic" | "media" | "clipArt" | "dgm" => "body",
            other => other,
        }
    }
}

/// Placeholder key of a shape, if it is one.
pub fn placeholder(shape: &Element) -> Option<PlaceholderKey> {
    let ph = non_visual(shape)?.child("nvPr")?.child("ph")?;
    Some(PlaceholderKey {
        ph_type: ph.attr("type").unwrap_or("obj").to_string(),
        idx: ph.attr("idx").and_then(|v| v.parse().ok()),
    })
}

/// Geometry from the shape's own transform, if it has one.
pub fn own_bounds(shape: &Element) -> Result<Option<Rect>> {
    let xfrm = match shape.local_name() {
        "graphicFrame" => shape.child("xfrm"),
        _ => shape.child("spPr").and_then(|sp| sp.child("xfrm")),
    };
    let Some(xfrm) = xfrm else {
        return Ok(None);
    };
    let (Some(off), Some(ext)) = (xfrm.child("off"), xfrm.child("ext")) else {
        return Ok(None);
    };
    Ok(Some(Rect::new(
        coordinate(off, "x")?,
        coordinate(off, "y")?,
        coordinate(ext, "cx")?,
        coordinate(ext, "cy")?,
    )))
}

fn coordinate(el: &Element, attr: &str) -> Result<Emu> {
    let value = el
        .attr(attr)
        .ok_or_else(|| Error::invalid_attribute(attr, "<missing>"))?;
    Emu::parse(attr, value)
}

/// Placeholder geometry a slide inherits from its layout and master.
#[derive(Debug, Clone, Default)]
pub struct InheritedGeometry {
    layout: Vec<(PlaceholderKey, Rect)>,
    master: Vec<(PlaceholderKey, Rect)>,
}

impl InheritedGeometry {
    /// Placeholder rectangles of a master tree.
    pub fn from_master(master: &Element) -> Self {
        Self {
            layout: Vec::new(),
            master: collect_placeholders(master),
        }
    }

    /// Add the placeholders of a layout tree. Layout placeholders without a
    /// transform take the rectangle of the matching master placeholder.
    pub fn add_layout(&mut self, layout: &Element) {
        for (key, rect) in collect_placeholder_keys(layout) {
            if let Some(rect) = rect.or_else(|| self.master_rect(&key)) {
                self.layout.push((key, rect));
            }
        }
    }

    /// Rectangle for a slide placeholder: layout by idx, then by type, then the master.
    pub fn resolve(&self, key: &PlaceholderKey) -> Option<Rect> {
        let by_idx = key.idx.and_then(|idx| {
            self.layout
                .iter()
                .find(|(k, _)| k.idx == Some(idx))
                .map(|(_, r)| *r)
        });
        by_idx
            .or_else(|| {
                self.layout
                    .iter()
                    .find(|(k, _)| k.ph_type == key.ph_type)
                    .map(|(_, r)| *r)
            })
            .or_else(|| self.master_rect(key))
    }

    fn master_rect(&self, key: &PlaceholderKey) -> Option<Rect> {
        self.master
            .iter()
            .find(|(k, _)| k.master_type() == key.master_type())
            .map(|(_, r)| *r)
    }
}

fn collect_placeholder_keys(root: &Element) -> Vec<(PlaceholderKey, Option<Rect>)> {
    let Some(tree) = root.path(&["cSld", "spTree"]) else {
        return Vec::new();
    };
    tree.elements()
        .filter_map(|shape| {
            let key = placeholder(shape)?;
            let rect = match own_bounds(shape) {
                Ok(rect) => rect,
                Err(e) => {
                    log::debug!("Ignoring placeholder geometry of '{}': {}", shape_name(shape), e);
                    None
                }
            };
            Some((key, rect))
        })
        .collect()
}

fn collect_placeholders(root: &Element) -> Vec<(PlaceholderKey, Rect)> {
    collect_placeholder_keys(root)
        .into_iter()
        .filter_map(|(key, rect)| rect.map(|r| (key, r)))
        .collect()
}

/// Geometry of a shape: its own transform, or the inherited placeholder rectangle.
pub fn shape_bounds(shape: &Element, inherited: &InheritedGeometry) -> Result<Option<Rect>> {
    if let Some(rect) = own_bounds(shape)? {
        return Ok(Some(rect));
    }
    Ok(placeholder(shape).and_then(|key| inherited.resolve(&key)))
}

/// Text of one DrawingML paragraph; line breaks become vertical tabs.
pub fn paragraph_text(paragraph: &Element) -> String {
    let mut text = String::new();
    for child in paragraph.elements() {
        match child.local_name() {
            "r" | "fld" => {
                if let Some(t) = child.child("t") {
                    text.push_str(&t.text());
                }
            }
            "br" => text.push('\u{b}'),
            _ => {}
        }
    }
    text
}

/// Text of a shape's text body, paragraphs joined by newlines.
pub fn text_body_text(shape: &Element) -> String {
    shape
        .child("txBody")
        .map(|body| {
            body.children_named("p")
                .map(paragraph_text)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

/// Outline depth of a paragraph (`a:pPr@lvl`, default 0).
pub fn paragraph_depth(paragraph: &Element) -> Result<u32> {
    match paragraph.child("pPr").and_then(|ppr| ppr.attr("lvl")) {
        Some(lvl) => lvl
            .trim()
            .parse()
            .map_err(|_| Error::invalid_attribute("lvl", lvl)),
        None => Ok(0),
    }
}
