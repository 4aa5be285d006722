//! Exploration configuration and config-directory layout

use crate::graph::ScrollDedup;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Tunables for one exploration run, distinct from the budget: these shape
/// how the traversal behaves, not how much it may do.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExplorationConfig {
    /// Settling wait between a synthesized event and the next capture
    pub settle_ms: u64,
    /// Re-verify structural equivalence at every hop of a path replay.
    /// Off by default: the replay trusts that the same tap yields the same
    /// screen.
    pub replay_verify: bool,
    /// Dedup strategy for scrolled-in elements
    pub scroll_dedup: ScrollDedup,
    /// Minimum trimmed text length before an element counts as a label
    pub min_text_len: usize,
    /// Explicit strategy name; unknown names fall back to detection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    /// Line-appended debug log file, set once at startup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_log: Option<PathBuf>,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            settle_ms: 800,
            replay_verify: false,
            scroll_dedup: ScrollDedup::Exact,
            min_text_len: 2,
            strategy: None,
            debug_log: None,
        }
    }
}

impl ExplorationConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Root of the persistent configuration: `<config-dir>/periscope/`.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("periscope"))
}

/// Preloaded ML model cache: `<config-dir>/periscope/models/`.
pub fn models_dir() -> Option<PathBuf> {
    config_dir().map(|d| d.join("models"))
}

/// Component definition catalogs: `<config-dir>/periscope/components/`.
pub fn components_dir() -> Option<PathBuf> {
    config_dir().map(|d| d.join("components"))
}
