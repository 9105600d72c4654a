/// Configuration for the history engine.
use serde::{Deserialize, Serialize};

/// Maximum number of records kept on the undo stack.
/// The oldest record is evicted when a push would exceed it.
const DEFAULT_MAX_UNDO_DEPTH: usize = 64;

/// Environment variable that overrides the configured undo depth.
pub const MAX_UNDO_DEPTH_ENV: &str = "TUNE_ART_MAX_UNDO_DEPTH";

/// Configuration for the history engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Max records on the undo stack. Always at least 1.
    pub max_undo_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_undo_depth: DEFAULT_MAX_UNDO_DEPTH,
        }
    }
}

impl HistoryConfig {
    pub fn with_max_undo_depth(max_undo_depth: usize) -> Self {
        let mut config = Self { max_undo_depth };
        config.sanitize();
        config
    }

    /// Clamps values to valid ranges.
    pub fn sanitize(&mut self) {
        self.max_undo_depth = self.max_undo_depth.max(1);
    }
}

/// Resolves the undo depth.
///
/// Resolution order:
/// 1. `TUNE_ART_MAX_UNDO_DEPTH` environment variable, if it parses
/// 2. `fallback`
pub fn resolve_max_undo_depth(fallback: usize) -> usize {
    match std::env::var(MAX_UNDO_DEPTH_ENV) {
        Ok(raw) => match raw.trim().parse::<usize>() {
            Ok(depth) => depth,
            Err(e) => {
                tracing::warn!("Ignoring {MAX_UNDO_DEPTH_ENV}={raw:?}: {e}");
                fallback
            }
        },
        Err(_) => fallback,
    }
}
