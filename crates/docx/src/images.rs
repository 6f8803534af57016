//! Drawing runs: finding and clearing old pictures, building inline logo runs.

use rebrand_core::package::{relative_target, REL_TYPE_IMAGE};
use rebrand_core::{Element, ImageData, Package, Rect, Result};

pub const WP_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
pub const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
pub const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const MEDIA_DIR: &str = "word/media";

pub fn has_drawing(run: &Element) -> bool {
    run.has_descendant("drawing")
}

/// Empty every direct run of the paragraph that holds a drawing; returns how many.
pub fn clear_drawing_runs(paragraph: &mut Element) -> usize {
    let mut cleared = 0;
    for run in paragraph.elements_mut().filter(|e| e.is("r")) {
        if has_drawing(run) {
            run.clear();
            cleared += 1;
        }
    }
    cleared
}

/// Empty the first direct drawing run of the paragraph, if there is one.
pub fn clear_first_drawing_run(paragraph: &mut Element) -> bool {
    match paragraph
        .elements_mut()
        .find(|e| e.is("r") && has_drawing(e))
    {
        Some(run) => {
            run.clear();
            true
        }
        None => false,
    }
}

/// Prefixes a part root binds for the drawing namespaces.
#[derive(Debug, Clone)]
pub struct DrawingPrefixes {
    w: String,
    wp: String,
    r: String,
}

impl DrawingPrefixes {
    /// Declare (or reuse) the `wp` and `r` namespaces on a part root.
    pub fn declare(root: &mut Element) -> Self {
        let w = root.prefix().unwrap_or("w").to_string();
        let wp = root.ensure_namespace("wp", WP_NS);
        let r = root.ensure_namespace("r", R_NS);
        Self { w, wp, r }
    }
}

/// Store the image and relate it from `part`; returns the relationship id.
pub fn add_image_relationship(package: &mut Package, part: &str, image: &ImageData) -> Result<String> {
    let media = package.add_media(MEDIA_DIR, image)?;
    let mut rels = package.relationships(part)?;
    let rel_id = rels.add(REL_TYPE_IMAGE, &relative_target(part, &media));
    package.set_relationships(part, &rels);
    Ok(rel_id)
}

/// A run holding an inline picture of the size of `rect`.
pub fn inline_picture_run(prefixes: &DrawingPrefixes, rel_id: &str, drawing_id: u32, rect: &Rect) -> Element {
    let w = |local: &str| format!("{}:{}", prefixes.w, local);
    let wp = |local: &str| format!("{}:{}", prefixes.wp, local);
    let a = |local: &str| format!("a:{}", local);
    let pic = |local: &str| format!("pic:{}", local);
    let cx = rect.width.0.to_string();
    let cy = rect.height.0.to_string();
    let name = format!("Picture {}", drawing_id);

    let picture = Element::new(pic("pic"))
        .with_attr("xmlns:pic", PIC_NS)
        .with_child(
            Element::new(pic("nvPicPr"))
                .with_child(
                    Element::new(pic("cNvPr"))
                        .with_attr("id", "0")
                        .with_attr("name", name.as_str()),
                )
                .with_child(Element::new(pic("cNvPicPr"))),
        )
        .with_child(
            Element::new(pic("blipFill"))
                .with_child(Element::new(a("blip")).with_attr(format!("{}:embed", prefixes.r), rel_id))
                .with_child(Element::new(a("stretch")).with_child(Element::new(a("fillRect")))),
        )
        .with_child(
            Element::new(pic("spPr"))
                .with_child(
                    Element::new(a("xfrm"))
                        .with_child(Element::new(a("off")).with_attr("x", "0").with_attr("y", "0"))
                        .with_child(
                            Element::new(a("ext"))
                                .with_attr("cx", cx.as_str())
                                .with_attr("cy", cy.as_str()),
                        ),
                )
                .with_child(
                    Element::new(a("prstGeom"))
                        .with_attr("prst", "rect")
                        .with_child(Element::new(a("avLst"))),
                ),
        );

    let inline = Element::new(wp("inline"))
        .with_attr("distT", "0")
        .with_attr("distB", "0")
        .with_attr("distL", "0")
        .with_attr("distR", "0")
        .with_child(
            Element::new(wp("extent"))
                .with_attr("cx", cx.as_str())
                .with_attr("cy", cy.as_str()),
        )
        .with_child(
            Element::new(wp("docPr"))
                .with_attr("id", drawing_id.to_string())
                .with_attr("name", name.as_str()),
        )
        .with_child(
            Element::new(wp("cNvGraphicFramePr")).with_child(
                Element::new(a("graphicFrameLocks"))
                    .with_attr("xmlns:a", A_NS)
                    .with_attr("noChangeAspect", "1"),
            ),
        )
        .with_child(
            Element::new(a("graphic")).with_attr("xmlns:a", A_NS).with_child(
                Element::new(a("graphicData"))
                    .with_attr("uri", PIC_NS)
                    .with_child(picture),
            ),
        );

    Element::new(w("r")).with_child(Element::new(w("drawing")).with_child(inline))
}
