//! Legacy picture removal and replacement picture insertion.

use crate::shapes::{self, InheritedGeometry};
use rebrand_core::package::{relative_target, REL_TYPE_IMAGE};
use rebrand_core::{
    classify_picture, Diagnostics, Element, ImageData, Node, Package, PictureClass, RebrandConfig,
    Rect, Result, ShapeKind,
};

pub const P_NS: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
pub const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Media folder for presentation images.
const MEDIA_DIR: &str = "ppt/media";

/// What was removed from one unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovalFlags {
    pub logos: usize,
    pub favicons: usize,
}

impl RemovalFlags {
    pub fn needs_logo(&self) -> bool {
        self.logos > 0
    }

    pub fn needs_favicon(&self) -> bool {
        self.favicons > 0
    }

    pub fn merge(&mut self, other: RemovalFlags) {
        self.logos += other.logos;
        self.favicons += other.favicons;
    }
}

/// Classify one shape-tree child. Inspection failures count as `Neither`.
fn classify_shape(
    shape: &Element,
    inherited: &InheritedGeometry,
    config: &RebrandConfig,
    diagnostics: &mut Diagnostics,
) -> PictureClass {
    let kind = shapes::shape_kind(shape);
    if kind != ShapeKind::Picture {
        return PictureClass::Neither;
    }
    match shapes::shape_bounds(shape, inherited) {
        Ok(Some(bounds)) => {
            let class = classify_picture(kind, &bounds, &config.thresholds, &config.placements);
            log::debug!("  {} {:?} at {} -> {:?}", shapes::shape_name(shape), kind, bounds, class);
            class
        }
        Ok(None) => PictureClass::Neither,
        Err(e) => {
            diagnostics.warn(format!(
                "  Could not inspect shape '{}': {}",
                shapes::shape_name(shape),
                e
            ));
            PictureClass::Neither
        }
    }
}

/// Detach every legacy logo and favicon from the shape tree.
///
/// All shapes are classified before anything is removed, so the verdicts
/// never depend on removal order.
pub fn remove_legacy_pictures(
    tree: &mut Element,
    inherited: &InheritedGeometry,
    config: &RebrandConfig,
    diagnostics: &mut Diagnostics,
) -> RemovalFlags {
    let verdicts: Vec<PictureClass> = tree
        .elements()
        .map(|shape| classify_shape(shape, inherited, config, diagnostics))
        .collect();

    let mut flags = RemovalFlags::default();
    for verdict in &verdicts {
        match verdict {
            PictureClass::LegacyLogo => {
                flags.logos += 1;
                diagnostics.info("  → Old logo removed");
            }
            PictureClass::LegacyFavicon => {
                flags.favicons += 1;
                diagnostics.info("  → Old favicon removed");
            }
            PictureClass::Neither => {}
        }
    }

    let mut verdicts = verdicts.into_iter();
    tree.remove_children(|_| {
        matches!(
            verdicts.next(),
            Some(PictureClass::LegacyLogo | PictureClass::LegacyFavicon)
        )
    });
    flags
}

/// Largest shape id (`p:cNvPr@id`) in a shape tree.
fn max_shape_id(tree: &Element) -> u32 {
    tree.max_numeric_attr("cNvPr", "id")
}

/// Add `image` to the slide at `rect`: media part, relationship, and a `p:pic`
/// appended to the shape tree.
pub fn insert_picture(
    package: &mut Package,
    slide_part: &str,
    slide_root: &mut Element,
    image: &ImageData,
    rect: &Rect,
    label: &str,
) -> Result<()> {
    let media = package.add_media(MEDIA_DIR, image)?;
    let mut rels = package.relationships(slide_part)?;
    let rel_id = rels.add(REL_TYPE_IMAGE, &relative_target(slide_part, &media));
    package.set_relationships(slide_part, &rels);

    let p = slide_root.ensure_namespace("p", P_NS);
    let a = slide_root.ensure_namespace("a", A_NS);
    let r = slide_root.ensure_namespace("r", R_NS);

    let tree = crate::text::shape_tree_mut(slide_root)?;
    let id = max_shape_id(tree) + 1;
    let pic = picture_element(&p, &a, &r, id, &format!("{} {}", label, id), &rel_id, rect);

    // p:extLst must stay last in the shape tree
    let at = tree
        .children
        .iter()
        .position(|n| matches!(n, Node::Element(e) if e.is("extLst")))
        .unwrap_or(tree.children.len());
    tree.children.insert(at, Node::Element(pic));
    Ok(())
}

fn picture_element(p: &str, a: &str, r: &str, id: u32, name: &str, rel_id: &str, rect: &Rect) -> Element {
    let n = |prefix: &str, local: &str| format!("{}:{}", prefix, local);

    let non_visual = Element::new(n(p, "nvPicPr"))
        .with_child(
            Element::new(n(p, "cNvPr"))
                .with_attr("id", id.to_string())
                .with_attr("name", name),
        )
        .with_child(
            Element::new(n(p, "cNvPicPr"))
                .with_child(Element::new(n(a, "picLocks")).with_attr("noChangeAspect", "1")),
        )
        .with_child(Element::new(n(p, "nvPr")));

    let blip_fill = Element::new(n(p, "blipFill"))
        .with_child(Element::new(n(a, "blip")).with_attr(n(r, "embed"), rel_id))
        .with_child(Element::new(n(a, "stretch")).with_child(Element::new(n(a, "fillRect"))));

    let shape_props = Element::new(n(p, "spPr"))
        .with_child(
            Element::new(n(a, "xfrm"))
                .with_child(
                    Element::new(n(a, "off"))
                        .with_attr("x", rect.left.0.to_string())
                        .with_attr("y", rect.top.0.to_string()),
                )
                .with_child(
                    Element::new(n(a, "ext"))
                        .with_attr("cx", rect.width.0.to_string())
                        .with_attr("cy", rect.height.0.to_string()),
                ),
        )
        .with_child(
            Element::new(n(a, "prstGeom"))
                .with_attr("prst", "rect")
                .with_child(Element::new(n(a, "avLst"))),
        );

    Element::new(n(p, "pic"))
        .with_child(non_visual)
        .with_child(blip_fill)
        .with_child(shape_props)
}
