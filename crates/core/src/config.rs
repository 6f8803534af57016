//! Configuration for a rebranding run.

use crate::classify::{DetectionThresholds, Placements};
use crate::styles::{PresentationStyles, WordStyles};
use serde::{Deserialize, Serialize};

/// Prefix prepended to the original file name of every output document.
pub const DEFAULT_OUTPUT_PREFIX: &str = "ISPA_";

/// Everything the pipelines need to know besides the document and images.
///
/// `Default` is the built-in brand; every field may be overridden from a
/// partial JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebrandConfig {
    pub thresholds: DetectionThresholds,
    pub placements: Placements,
    pub presentation: PresentationStyles,
    pub word: WordStyles,
    pub output_prefix: String,
}

impl Default for RebrandConfig {
    fn default() -> Self {
        Self {
            thresholds: DetectionThresholds::default(),
            placements: Placements::default(),
            presentation: PresentationStyles::default(),
            word: WordStyles::default(),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
        }
    }
}

impl RebrandConfig {
    /// Set the output file prefix.
    pub fn with_output_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.output_prefix = prefix.into();
        self
    }
}
