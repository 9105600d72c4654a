/// Application configuration: load, save, and sanitize.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tune_art_mod_history::{resolve_max_undo_depth, HistoryConfig};

use crate::color::HexColor;

const CONFIG_FILE_NAME: &str = "tune-art.json";
const MAX_STAGE_SIDE: usize = 256;
const MAX_UNDO_DEPTH_LIMIT: usize = 1024;

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Stage grid width in cells (1..=256).
    pub stage_width: usize,
    /// Stage grid height in cells (1..=256).
    pub stage_height: usize,
    /// Records kept on the undo stack (1..=1024).
    pub max_undo_depth: usize,
    pub stage_primary_color: HexColor,
    pub canvas_primary_color: HexColor,
    /// `tracing` filter directive used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            stage_width: 32,
            stage_height: 32,
            max_undo_depth: HistoryConfig::default().max_undo_depth,
            stage_primary_color: HexColor::rgb(0xaf, 0x3e, 0xee),
            canvas_primary_color: HexColor::rgb(0xfb, 0xe6, 0x4d),
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Returns the config file path: exe directory + `tune-art.json`.
    pub fn config_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|d| d.join(CONFIG_FILE_NAME)))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
    }

    /// Loads config from `path`, creating a default file if it doesn't exist.
    /// Returns defaults on any error (missing file, parse error, etc.).
    pub fn load_or_create(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
                    Ok(mut config) => {
                        config.sanitize();
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {}: {e}", path.display());
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {}: {e}", path.display());
                }
            }
            // Return defaults on error (don't overwrite broken file)
            Self::default()
        } else {
            let config = Self::default();
            if let Err(e) = config.save(path) {
                tracing::warn!("Failed to create default config: {e:#}");
            }
            config
        }
    }

    /// Saves config to `path` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be encoded or the file cannot
    /// be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to encode config")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Clamps values to valid ranges and resets invalid fields.
    pub fn sanitize(&mut self) {
        self.stage_width = self.stage_width.clamp(1, MAX_STAGE_SIDE);
        self.stage_height = self.stage_height.clamp(1, MAX_STAGE_SIDE);
        self.max_undo_depth = self.max_undo_depth.clamp(1, MAX_UNDO_DEPTH_LIMIT);
        if self.log_filter.trim().is_empty() {
            self.log_filter = "info".to_string();
        }
    }

    /// History settings, honoring the `TUNE_ART_MAX_UNDO_DEPTH` override.
    pub fn history_config(&self) -> HistoryConfig {
        let depth = resolve_max_undo_depth(self.max_undo_depth).clamp(1, MAX_UNDO_DEPTH_LIMIT);
        HistoryConfig::with_max_undo_depth(depth)
    }
}
