//! Paragraph classification and run styling for the document body.

use crate::document::StyleNames;
use rebrand_core::{
    classify_word_paragraph, Diagnostics, Element, FallbackTitle, ParagraphFacts, StyleRule,
    WordRole, WordStyles,
};

/// `w:rPr` children in schema order.
const RUN_PROPS_ORDER: &[&str] = &[
    "rStyle", "rFonts", "b", "bCs", "i", "iCs", "caps", "smallCaps", "strike", "dstrike",
    "outline", "shadow", "emboss", "imprint", "noProof", "snapToGrid", "vanish", "webHidden",
    "color", "spacing", "w", "kern", "position", "sz", "szCs", "highlight", "u", "effect", "bdr",
    "shd", "fitText", "vertAlign", "rtl", "cs", "em", "lang", "eastAsianLayout", "specVanish",
    "oMath",
];

/// Counts for one styling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StyledParagraphs {
    pub paragraphs: usize,
    pub titles: usize,
    pub bullets: usize,
}

/// Visible text of a paragraph: runs and hyperlinked runs, tabs and breaks included.
pub fn paragraph_text(paragraph: &Element) -> String {
    let mut text = String::new();
    for run in paragraph_runs(paragraph) {
        for child in run.elements() {
            match child.local_name() {
                "t" => text.push_str(&child.text()),
                "tab" => text.push('\t'),
                "br" | "cr" => text.push('\n'),
                _ => {}
            }
        }
    }
    text
}

fn paragraph_runs(paragraph: &Element) -> impl Iterator<Item = &Element> {
    paragraph.elements().flat_map(|child| {
        let runs: Vec<&Element> = match child.local_name() {
            "r" => vec![child],
            "hyperlink" => child.children_named("r").collect(),
            _ => Vec::new(),
        };
        runs
    })
}

/// Runs that receive formatting: direct `w:r` children and runs inside hyperlinks.
pub fn paragraph_runs_mut(paragraph: &mut Element) -> Vec<&mut Element> {
    let mut runs = Vec::new();
    for child in paragraph.elements_mut() {
        if child.is("r") {
            runs.push(child);
        } else if child.is("hyperlink") {
            runs.extend(child.elements_mut().filter(|e| e.is("r")));
        }
    }
    runs
}

/// Paragraph style id from `w:pPr/w:pStyle@w:val`.
fn style_id(paragraph: &Element) -> Option<&str> {
    paragraph
        .path(&["pPr", "pStyle"])
        .and_then(|s| s.attr_local("val"))
}

/// Classify and restyle every non-empty top-level paragraph of the body.
pub fn style_body(
    body: &mut Element,
    names: &StyleNames,
    styles: &WordStyles,
    diagnostics: &mut Diagnostics,
) -> StyledParagraphs {
    let mut fallback = FallbackTitle::default();
    let mut styled = StyledParagraphs::default();

    for paragraph in body.elements_mut().filter(|e| e.is("p")) {
        let text = paragraph_text(paragraph);
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let style_name = match style_id(paragraph) {
            Some(id) => match names.name(id) {
                Some(name) => Some(name),
                None => {
                    diagnostics.warn(format!(
                        "  Unknown paragraph style '{}', using the default style",
                        id
                    ));
                    names.default_paragraph()
                }
            },
            None => names.default_paragraph(),
        };

        let facts = ParagraphFacts { style_name, text };
        let role = classify_word_paragraph(&facts, styles, &mut fallback);
        log::debug!("    → [{:?}] {}", role, preview(text));

        let rule = match role {
            WordRole::Title | WordRole::FallbackTitle => {
                styled.titles += 1;
                &styles.title
            }
            WordRole::Subtitle => &styles.subtitle,
            WordRole::Bullet => {
                styled.bullets += 1;
                &styles.bullet
            }
            WordRole::Body => &styles.body,
        };
        for run in paragraph_runs_mut(paragraph) {
            apply_rule(run, rule);
        }
        styled.paragraphs += 1;
    }
    styled
}

/// Set font, size and color on one run.
pub fn apply_rule(run: &mut Element, rule: &StyleRule) {
    let rpr_name = run.sibling_name("rPr");
    let rpr = run.upsert_child_ordered(&rpr_name, &["rPr"]);

    let fonts_name = rpr.sibling_name("rFonts");
    let fonts = rpr.upsert_child_ordered(&fonts_name, RUN_PROPS_ORDER);
    let ascii = fonts.sibling_name("ascii");
    let h_ansi = fonts.sibling_name("hAnsi");
    fonts.set_attr(ascii, rule.font.as_str());
    fonts.set_attr(h_ansi, rule.font.as_str());
    // theme fonts override explicit ones
    for theme in ["asciiTheme", "hAnsiTheme"] {
        let name = fonts.sibling_name(theme);
        fonts.remove_attr(&name);
    }

    let color_name = rpr.sibling_name("color");
    let color = rpr.upsert_child_ordered(&color_name, RUN_PROPS_ORDER);
    let val = color.sibling_name("val");
    color.clear();
    color.set_attr(val, rule.effective_color().to_hex());

    let sz_name = rpr.sibling_name("sz");
    let sz = rpr.upsert_child_ordered(&sz_name, RUN_PROPS_ORDER);
    let val = sz.sibling_name("val");
    sz.set_attr(val, rule.size_half_points().to_string());
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(40).collect();
    if text.chars().count() > 40 {
        out.push_str("...");
    }
    out
}
