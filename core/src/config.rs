use crate::codec::Compression;
use crate::scoring::Scoring;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MEMORY_BUDGET: usize = 64 * 1024 * 1024;
pub const DEFAULT_SKIP_THRESHOLD: usize = 1024;

/// Build-time settings. Persisted in `meta.json` so the query side tokenizes,
/// decodes and bounds scores exactly as the index was built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub compression: Compression,
    /// Stopword removal and stemming; must match between indexing and querying.
    #[serde(default)]
    pub stem_and_stop: bool,
    /// Approximate bytes the in-memory partial index may hold before a flush.
    #[serde(default = "default_memory_budget")]
    pub memory_budget: usize,
    /// Posting lists longer than this get a skip block.
    #[serde(default = "default_skip_threshold")]
    pub skip_threshold: usize,
    /// Scoring function the stored term upper bounds are computed for.
    #[serde(default)]
    pub scoring: Scoring,
}

fn default_memory_budget() -> usize { DEFAULT_MEMORY_BUDGET }
fn default_skip_threshold() -> usize { DEFAULT_SKIP_THRESHOLD }

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            compression: Compression::VByte,
            stem_and_stop: true,
            memory_budget: DEFAULT_MEMORY_BUDGET,
            skip_threshold: DEFAULT_SKIP_THRESHOLD,
            scoring: Scoring::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: IndexConfig = serde_json::from_str(r#"{"compression":"VByte"}"#).unwrap();
        assert_eq!(cfg.memory_budget, DEFAULT_MEMORY_BUDGET);
        assert_eq!(cfg.skip_threshold, DEFAULT_SKIP_THRESHOLD);
        assert_eq!(cfg.scoring, Scoring::default());
    }
}
