use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Knobs for converting one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeSettings {
    /// Overrides the chunk's own `convertedFromAlphaFormat` flag
    #[serde(default)]
    pub alpha_format: Option<bool>,
    /// Log duplicate block entities through `log::warn!`. They are recorded
    /// on the chunk either way.
    #[serde(default = "default_true")]
    pub warn_on_duplicate_block_entities: bool,
}

fn default_true() -> bool {
    true
}

impl Default for UpgradeSettings {
    fn default() -> Self {
        UpgradeSettings {
            alpha_format: None,
            warn_on_duplicate_block_entities: true,
        }
    }
}

impl UpgradeSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Alpha flag to use for a chunk that declares `chunk_flag`.
    pub fn alpha_format(&self, chunk_flag: bool) -> bool {
        self.alpha_format.unwrap_or(chunk_flag)
    }
}
