//! Title detection and text restyling for one slide or master.

use crate::shapes::{self, InheritedGeometry};
use rebrand_core::{
    presentation_role, select_title, Diagnostics, Element, Emu, PresentationStyles, Result,
    ShapeKind, StyleRule, TextRole,
};

/// `a:p` children in schema order.
const PARAGRAPH_ORDER: &[&str] = &["pPr", "r", "br", "fld", "endParaRPr"];

/// `a:pPr` children in schema order.
const PARAGRAPH_PROPS_ORDER: &[&str] = &[
    "lnSpc", "spcBef", "spcAft", "buClrTx", "buClr", "buSzTx", "buSzPct", "buSzPts", "buFontTx",
    "buFont", "buNone", "buAutoNum", "buChar", "buBlip", "tabLst", "defRPr", "extLst",
];

/// `a:rPr` / `a:defRPr` children in schema order.
const RUN_PROPS_ORDER: &[&str] = &[
    "ln", "noFill", "solidFill", "gradFill", "blipFill", "pattFill", "grpFill", "effectLst",
    "effectDag", "highlight", "uLnTx", "uLn", "uFillTx", "uFill", "latin", "ea", "cs", "sym",
    "hlinkClick", "hlinkMouseOver", "rtl", "extLst",
];

/// `a:bodyPr` children in schema order.
const BODY_PROPS_ORDER: &[&str] = &[
    "prstTxWarp", "noAutofit", "normAutofit", "spAutoFit", "scene3d", "sp3d", "flatTx", "extLst",
];

const FILLS: &[&str] = &["noFill", "solidFill", "gradFill", "blipFill", "pattFill", "grpFill"];
const AUTOFITS: &[&str] = &["noAutofit", "normAutofit", "spAutoFit"];

/// A text container measured for title detection.
#[derive(Debug, Clone)]
struct Measured {
    /// Position among the shape tree's child elements.
    index: usize,
    top: Option<Emu>,
    chars: usize,
}

/// Counters for one unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StyledText {
    pub paragraphs: usize,
    pub title_found: bool,
}

/// Pick the title container and restyle every text container in the shape tree.
pub fn style_text_containers(
    tree: &mut Element,
    inherited: &InheritedGeometry,
    styles: &PresentationStyles,
    diagnostics: &mut Diagnostics,
) -> StyledText {
    let mut measured: Vec<Measured> = tree
        .elements()
        .enumerate()
        .filter(|(_, shape)| shapes::shape_kind(shape) == ShapeKind::TextContainer)
        .map(|(index, shape)| {
            let top = match shapes::shape_bounds(shape, inherited) {
                Ok(bounds) => bounds.map(|b| b.top),
                Err(e) => {
                    diagnostics.warn(format!(
                        "  Could not read position of '{}': {}",
                        shapes::shape_name(shape),
                        e
                    ));
                    None
                }
            };
            Measured {
                index,
                top,
                chars: shapes::text_body_text(shape).trim().chars().count(),
            }
        })
        .collect();

    // Top to bottom; shapes without a known position go last.
    measured.sort_by_key(|m| (m.top.is_none(), m.top));

    let lengths: Vec<usize> = measured.iter().map(|m| m.chars).collect();
    let title_index = select_title(&lengths).map(|pos| measured[pos].index);

    let mut styled = StyledText {
        title_found: title_index.is_some(),
        ..StyledText::default()
    };
    for m in &measured {
        let Some(shape) = tree.elements_mut().nth(m.index) else {
            continue;
        };
        styled.paragraphs += style_shape(shape, title_index == Some(m.index), styles, diagnostics);
    }
    styled
}

fn style_shape(
    shape: &mut Element,
    is_title: bool,
    styles: &PresentationStyles,
    diagnostics: &mut Diagnostics,
) -> usize {
    let name = shapes::shape_name(shape).to_string();
    let Some(body) = shape.child_mut("txBody") else {
        return 0;
    };
    disable_autofit(body);

    let mut count = 0;
    for paragraph in body.elements_mut().filter(|e| e.is("p")) {
        let result = shapes::paragraph_depth(paragraph).map(|depth| {
            let role = presentation_role(depth, is_title);
            let rule = match role {
                TextRole::Title => &styles.title,
                TextRole::Body => &styles.body,
                TextRole::Bullet => &styles.bullet,
            };
            apply_rule(paragraph, rule);
            role
        });
        match result {
            Ok(role) => {
                log::debug!(
                    "    → [{:?}] {}",
                    role,
                    preview(&shapes::paragraph_text(paragraph))
                );
                count += 1;
            }
            Err(e) => diagnostics.warn(format!("  Paragraph left unstyled in '{}': {}", name, e)),
        }
    }
    count
}

/// Style every cell paragraph of every table in the shape tree with the body rule.
pub fn style_tables(tree: &mut Element, styles: &PresentationStyles) -> usize {
    let mut count = 0;
    for frame in tree
        .elements_mut()
        .filter(|shape| shapes::shape_kind(shape) == ShapeKind::Table)
    {
        frame.for_each_descendant_mut(&mut |el: &mut Element| {
            if !el.is("tc") {
                return;
            }
            if let Some(body) = el.child_mut("txBody") {
                for paragraph in body.elements_mut().filter(|e| e.is("p")) {
                    apply_rule(paragraph, &styles.body);
                    count += 1;
                }
            }
        });
    }
    count
}

/// Turn off shrink-on-overflow and resize-to-fit so explicit sizes stick.
fn disable_autofit(body: &mut Element) {
    let body_pr_name = body.sibling_name("bodyPr");
    let body_pr = body.upsert_child_ordered(&body_pr_name, &["bodyPr", "lstStyle", "p"]);
    body_pr.remove_children(|e| AUTOFITS.contains(&e.local_name()));
    let no_autofit = Element::new(body_pr.sibling_name("noAutofit"));
    body_pr.insert_ordered(no_autofit, BODY_PROPS_ORDER);
}

/// Apply a rule to the paragraph defaults and to every run.
pub fn apply_rule(paragraph: &mut Element, rule: &StyleRule) {
    let ppr_name = paragraph.sibling_name("pPr");
    let ppr = paragraph.upsert_child_ordered(&ppr_name, PARAGRAPH_ORDER);
    let def_name = ppr.sibling_name("defRPr");
    set_run_properties(ppr.upsert_child_ordered(&def_name, PARAGRAPH_PROPS_ORDER), rule);

    for run in paragraph.elements_mut().filter(|e| e.is("r")) {
        let rpr_name = run.sibling_name("rPr");
        set_run_properties(run.upsert_child_ordered(&rpr_name, &["rPr", "t"]), rule);
    }
}

fn set_run_properties(rpr: &mut Element, rule: &StyleRule) {
    rpr.set_attr("sz", rule.size_hundredths().to_string());

    rpr.remove_children(|e| FILLS.contains(&e.local_name()));
    let color = Element::new(rpr.sibling_name("srgbClr")).with_attr("val", rule.effective_color().to_hex());
    let fill = Element::new(rpr.sibling_name("solidFill")).with_child(color);
    rpr.insert_ordered(fill, RUN_PROPS_ORDER);

    let latin_name = rpr.sibling_name("latin");
    rpr.upsert_child_ordered(&latin_name, RUN_PROPS_ORDER)
        .set_attr("typeface", rule.font.as_str());
}

/// First 40 characters, for log lines.
fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(40).collect();
    if text.chars().count() > 40 {
        out.push_str("...");
    }
    out
}

/// Count of `a:r` runs in a subtree.
pub fn run_count(root: &Element) -> usize {
    root.descendants().filter(|e| e.is("r")).count()
}

/// Shape tree of a slide or master (`p:cSld/p:spTree`).
pub fn shape_tree_mut(root: &mut Element) -> Result<&mut Element> {
    root.path_mut(&["cSld", "spTree"])
        .ok_or_else(|| rebrand_core::Error::CorruptedFile("slide has no shape tree".to_string()))
}
