//! Core document graph, style catalog and heuristics for rebranding
//! PowerPoint and Word documents.

pub mod classify;
pub mod config;
pub mod error;
pub mod package;
pub mod report;
pub mod styles;
pub mod types;
pub mod xml;

pub use classify::{
    classify_picture, classify_word_paragraph, presentation_role, select_title,
    DetectionThresholds, FallbackTitle, ParagraphFacts, PictureClass, Placements, ShapeKind,
    TextRole, WordRole,
};
pub use config::RebrandConfig;
pub use error::{Error, Result};
pub use package::{Package, Relationships};
pub use report::{Diagnostic, Diagnostics, Level, RebrandOutput, RebrandReport};
pub use styles::{PresentationStyles, StyleRule, WordStyles};
pub use types::{
    output_filename, DocumentFormat, Emu, ImageData, ImageFormat, Rect, ReplacementImages,
    RgbColor,
};
pub use xml::{Element, Node, XmlDocument};
