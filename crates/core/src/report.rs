//! Progress and diagnostic reporting for one rebranding request.
//!
//! Every line is forwarded to the `log` facade as it is recorded, and kept in
//! order so frontends can show it after the fact.

use crate::types::DocumentFormat;
use serde::{Deserialize, Serialize};

/// Severity of a diagnostic line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warning,
}

/// One human-readable progress or diagnostic line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

/// Ordered log of what happened during a request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a progress line.
    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{}", message);
        self.entries.push(Diagnostic {
            level: Level::Info,
            message,
        });
    }

    /// Record a recoverable failure.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.entries.push(Diagnostic {
            level: Level::Warning,
            message,
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.level == Level::Warning)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Counters and log for one processed document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebrandReport {
    pub format: DocumentFormat,
    /// Masters + slides, or sections.
    pub units: usize,
    pub logos_removed: usize,
    pub favicons_removed: usize,
    pub logos_inserted: usize,
    pub favicons_inserted: usize,
    pub paragraphs_styled: usize,
    pub diagnostics: Diagnostics,
}

impl RebrandReport {
    pub fn new(format: DocumentFormat) -> Self {
        Self {
            format,
            units: 0,
            logos_removed: 0,
            favicons_removed: 0,
            logos_inserted: 0,
            favicons_inserted: 0,
            paragraphs_styled: 0,
            diagnostics: Diagnostics::new(),
        }
    }
}

/// The result of a successful request: the new document and what was done to it.
#[derive(Debug, Clone)]
pub struct RebrandOutput {
    pub bytes: Vec<u8>,
    pub report: RebrandReport,
}
