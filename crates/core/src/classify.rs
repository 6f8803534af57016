//! Heuristic classification of pictures and text containers.
//!
//! Everything here is pure: callers measure shapes and paragraphs, these
//! functions decide what they are. Nothing is written back into the document.

use crate::styles::WordStyles;
use crate::types::{Emu, Rect};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Minimum trimmed text length (exclusive) for a container to be the title.
pub const MIN_TITLE_CHARS: usize = 3;

/// Word paragraphs written as a dash or star list item.
static BULLET_PREFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*] ").unwrap());

/// Where replacement images go, identical on every slide or header.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placements {
    pub logo: Rect,
    pub favicon: Rect,
}

impl Default for Placements {
    fn default() -> Self {
        Self {
            logo: Rect::new(
                Emu::from_cm_hundredths(85),
                Emu::from_cm_hundredths(98),
                Emu::from_cm_hundredths(273),
                Emu::from_cm_hundredths(274),
            ),
            favicon: Rect::new(
                Emu::from_cm_hundredths(429),
                Emu::from_cm_hundredths(414),
                Emu::from_cm_hundredths(862),
                Emu::from_cm_hundredths(448),
            ),
        }
    }
}

/// Position and size limits identifying legacy brand pictures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionThresholds {
    /// Logo: left edge strictly below this.
    pub max_left_logo: Emu,
    /// Logo: top edge strictly below this.
    pub max_top_logo: Emu,
    pub max_logo_width: Emu,
    pub max_logo_height: Emu,
    /// Favicon: left edge strictly between these.
    pub min_left_favicon: Emu,
    pub max_left_favicon: Emu,
    /// Favicon: top edge strictly between these.
    pub min_top_favicon: Emu,
    pub max_top_favicon: Emu,
    pub max_favicon_width: Emu,
    pub max_favicon_height: Emu,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        let placements = Placements::default();
        Self {
            max_left_logo: Emu::from_cm_hundredths(200),
            max_top_logo: Emu::from_cm_hundredths(200),
            max_logo_width: placements.logo.width.doubled(),
            max_logo_height: placements.logo.height.doubled(),
            min_left_favicon: Emu::from_cm_hundredths(4300),
            max_left_favicon: Emu::from_cm_hundredths(4600),
            min_top_favicon: Emu::from_cm_hundredths(300),
            max_top_favicon: Emu::from_cm_hundredths(500),
            max_favicon_width: placements.favicon.width.doubled(),
            max_favicon_height: placements.favicon.height.doubled(),
        }
    }
}

impl DetectionThresholds {
    fn is_logo(&self, r: &Rect) -> bool {
        r.left < self.max_left_logo
            && r.top < self.max_top_logo
            && r.width <= self.max_logo_width
            && r.height <= self.max_logo_height
    }

    fn is_favicon(&self, r: &Rect) -> bool {
        self.min_left_favicon < r.left
            && r.left < self.max_left_favicon
            && self.min_top_favicon < r.top
            && r.top < self.max_top_favicon
            && r.width <= self.max_favicon_width
            && r.height <= self.max_favicon_height
    }
}

/// What a shape is, as far as picture handling is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Picture,
    TextContainer,
    Table,
    Other,
}

/// Verdict for one picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureClass {
    LegacyLogo,
    LegacyFavicon,
    Neither,
}

/// Decide whether a shape is the old logo, the old favicon, or neither.
///
/// The logo test runs first, so a shape inside both rectangles is a logo.
/// Pictures sitting exactly on a placement are the current brand and are
/// left alone.
pub fn classify_picture(
    kind: ShapeKind,
    bounds: &Rect,
    thresholds: &DetectionThresholds,
    placements: &Placements,
) -> PictureClass {
    if kind != ShapeKind::Picture {
        return PictureClass::Neither;
    }
    if *bounds == placements.logo || *bounds == placements.favicon {
        return PictureClass::Neither;
    }
    if thresholds.is_logo(bounds) {
        PictureClass::LegacyLogo
    } else if thresholds.is_favicon(bounds) {
        PictureClass::LegacyFavicon
    } else {
        PictureClass::Neither
    }
}

/// Index of the title among containers already sorted top to bottom.
///
/// `lengths` holds the trimmed text length of each container, in characters.
pub fn select_title(lengths: &[usize]) -> Option<usize> {
    lengths.iter().position(|&len| len > MIN_TITLE_CHARS)
}

/// Role of a presentation paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Title,
    Body,
    Bullet,
}

/// Role of a paragraph given its outline depth and whether its container is the title.
pub fn presentation_role(depth: u32, container_is_title: bool) -> TextRole {
    match (depth, container_is_title) {
        (1.., _) => TextRole::Bullet,
        (0, true) => TextRole::Title,
        (0, false) => TextRole::Body,
    }
}

/// Role of a word-processing paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordRole {
    /// Paragraph style is a title style.
    Title,
    Subtitle,
    Bullet,
    /// First plain paragraph promoted to title.
    FallbackTitle,
    Body,
}

/// Whether the one-time fallback title has been handed out in this document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FallbackTitle {
    consumed: bool,
}

impl FallbackTitle {
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    fn consume(&mut self) {
        self.consumed = true;
    }
}

/// What the word classifier looks at for one paragraph.
#[derive(Debug, Clone, Copy)]
pub struct ParagraphFacts<'a> {
    /// Resolved paragraph style name, if any.
    pub style_name: Option<&'a str>,
    /// Paragraph text, already trimmed.
    pub text: &'a str,
}

/// The word-processing rules, evaluated in order; the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WordRule {
    TitleStyle,
    SubtitleStyle,
    BulletPrefix,
    FallbackTitle,
    Body,
}

const WORD_RULES: [WordRule; 5] = [
    WordRule::TitleStyle,
    WordRule::SubtitleStyle,
    WordRule::BulletPrefix,
    WordRule::FallbackTitle,
    WordRule::Body,
];

impl WordRule {
    fn apply(
        self,
        facts: &ParagraphFacts<'_>,
        styles: &WordStyles,
        fallback: &FallbackTitle,
    ) -> Option<WordRole> {
        match self {
            WordRule::TitleStyle => facts
                .style_name
                .filter(|name| styles.is_title_style(name))
                .map(|_| WordRole::Title),
            WordRule::SubtitleStyle => facts
                .style_name
                .filter(|name| styles.is_subtitle_style(name))
                .map(|_| WordRole::Subtitle),
            WordRule::BulletPrefix => {
                is_bullet_text(facts.text).then_some(WordRole::Bullet)
            }
            WordRule::FallbackTitle => (!fallback.is_consumed()).then_some(WordRole::FallbackTitle),
            WordRule::Body => Some(WordRole::Body),
        }
    }
}

/// Whether trimmed paragraph text reads as a hand-written list item.
pub fn is_bullet_text(text: &str) -> bool {
    BULLET_PREFIX_REGEX.is_match(text)
}

/// Classify one non-empty word paragraph.
///
/// Any paragraph that is not title-styled uses up the fallback title, whether
/// it receives it or not.
pub fn classify_word_paragraph(
    facts: &ParagraphFacts<'_>,
    styles: &WordStyles,
    fallback: &mut FallbackTitle,
) -> WordRole {
    let role = WORD_RULES
        .iter()
        .find_map(|rule| rule.apply(facts, styles, fallback))
        .unwrap_or(WordRole::Body);
    if role != WordRole::Title {
        fallback.consume();
    }
    role
}
