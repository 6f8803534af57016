//! Style catalog: the font family, size and color applied to each text role.

use crate::types::RgbColor;
use serde::{Deserialize, Serialize};

/// Brand accent color (#6F9CEB).
pub const BRAND_BLUE: RgbColor = RgbColor(111, 156, 235);

/// One role's text formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRule {
    /// Font family name.
    pub font: String,
    /// Size in points.
    pub size_pt: f32,
    /// Explicit color; `None` means "write black".
    #[serde(default)]
    pub color: Option<RgbColor>,
}

impl StyleRule {
    pub fn new(font: impl Into<String>, size_pt: f32, color: Option<RgbColor>) -> Self {
        Self {
            font: font.into(),
            size_pt,
            color,
        }
    }

    /// Color to write: the rule's own, or black so no inherited color survives.
    pub fn effective_color(&self) -> RgbColor {
        self.color.unwrap_or(RgbColor::BLACK)
    }

    /// Size in hundredths of a point (DrawingML `sz`).
    pub fn size_hundredths(&self) -> u32 {
        (self.size_pt * 100.0).round() as u32
    }

    /// Size in half-points (WordprocessingML `w:sz`).
    pub fn size_half_points(&self) -> u32 {
        (self.size_pt * 2.0).round() as u32
    }
}

/// Rules for presentations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationStyles {
    pub title: StyleRule,
    pub body: StyleRule,
    /// Second outline level and deeper.
    pub bullet: StyleRule,
}

impl Default for PresentationStyles {
    fn default() -> Self {
        Self {
            title: StyleRule::new("Lexend Bold", 40.0, Some(BRAND_BLUE)),
            body: StyleRule::new("Lexend Regular", 22.0, Some(RgbColor::BLACK)),
            bullet: StyleRule::new("Lexend Light", 18.0, Some(RgbColor::BLACK)),
        }
    }
}

/// Rules for word-processing documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordStyles {
    pub title: StyleRule,
    pub subtitle: StyleRule,
    pub body: StyleRule,
    /// Paragraphs written as "- item" / "* item".
    pub bullet: StyleRule,
    /// Paragraph style names that mark a title (compared case-insensitively).
    pub title_style_names: Vec<String>,
    pub subtitle_style_names: Vec<String>,
}

impl Default for WordStyles {
    fn default() -> Self {
        let subtitle = StyleRule::new("Lexend Light", 14.0, None);
        Self {
            title: StyleRule::new("Lexend Bold", 28.0, Some(BRAND_BLUE)),
            bullet: subtitle.clone(),
            subtitle,
            body: StyleRule::new("Lexend Regular", 11.0, None),
            title_style_names: vec!["Title".into(), "Titre 1".into(), "Heading 1".into()],
            subtitle_style_names: vec!["Subtitle".into(), "Titre 2".into(), "Heading 2".into()],
        }
    }
}

impl WordStyles {
    pub fn is_title_style(&self, name: &str) -> bool {
        matches_any(&self.title_style_names, name)
    }

    pub fn is_subtitle_style(&self, name: &str) -> bool {
        matches_any(&self.subtitle_style_names, name)
    }
}

fn matches_any(names: &[String], name: &str) -> bool {
    let name = name.trim();
    names.iter().any(|n| n.eq_ignore_ascii_case(name))
}
