//! PPTX (Office Open XML) rebranding pipeline.
//!
//! Removes legacy logos and favicons from slide masters and slides, inserts
//! the replacement images at their fixed placements, and restyles every text
//! container by role (title, body, bullet).

pub mod document;
pub mod pictures;
pub mod rebrander;
pub mod shapes;
pub mod text;

#[cfg(test)]
mod fixtures;

pub use document::PptxDocument;
pub use rebrander::PptxRebrander;
