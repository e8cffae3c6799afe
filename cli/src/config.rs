use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "questmd.toml";

/// Settings for `questmd build`, read from `questmd.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Directory searched recursively for quest `.md` files.
    pub input_dir: PathBuf,

    /// Directory the JSON files are written to. Created if missing.
    pub output_dir: PathBuf,

    /// Name of the aggregate index file inside `output_dir`.
    pub index_file: String,

    /// Prefix of each per-quest file; the quest id follows it.
    pub file_prefix: String,

    /// URL prefix for rewritten `![[image]]` embeds.
    pub asset_base: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            input_dir: PathBuf::from("quests"),
            output_dir: PathBuf::from("data"),
            index_file: "quests.json".to_string(),
            file_prefix: "quest-".to_string(),
            asset_base: questmd::links::DEFAULT_ASSET_BASE.to_string(),
        }
    }
}

impl BuildConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid build config")
    }

    /// Load `path`. A missing file is only an error when `required` is set.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        if !required && !path.exists() {
            log::debug!("no build config at {}, using defaults", path.display());
            return Ok(BuildConfig::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read '{}'", path.display()))?;
        BuildConfig::from_toml(&text).with_context(|| format!("in '{}'", path.display()))
    }

    /// Per-quest output file name for `quest_id`.
    pub fn quest_file_name(&self, quest_id: &str) -> String {
        format!("{}{}.json", self.file_prefix, quest_id)
    }
}
