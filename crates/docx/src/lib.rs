//! DOCX (Office Open XML) rebranding pipeline.
//!
//! Replaces the pictures of every default header and the first picture of the
//! body with the new logo, then restyles body paragraphs by role.

pub mod document;
pub mod images;
pub mod rebrander;
pub mod text;

#[cfg(test)]
mod fixtures;

pub use document::{DocxDocument, StyleNames};
pub use rebrander::DocxRebrander;
