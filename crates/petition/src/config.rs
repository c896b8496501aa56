use std::path::Path;

use petition_core::report::GridLayout;
use petition_core::{CoverPatterns, Extractor, PatternConfig, TablePatterns};
use petition_pdf::LayoutOptions;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Contents of the optional TOML configuration file.
///
/// Every section and every key is optional; anything left out keeps the
/// built-in default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub table: TablePatterns,
    pub cover: CoverPatterns,
    pub layout: LayoutOptions,
    pub report: GridLayout,
}

impl Config {
    /// Load the file at `path`, or the defaults when no path was given.
    pub fn load(path: Option<&Path>) -> std::result::Result<Self, Error> {
        let Some(path) = path else {
            return Ok(Config::default());
        };

        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn patterns(&self) -> PatternConfig {
        PatternConfig {
            table: self.table.clone(),
            cover: self.cover.clone(),
        }
    }

    /// Compile the configured patterns.
    pub fn extractor(&self) -> Result<Extractor> {
        Extractor::new(&self.patterns()).map_err(|e| eyre!(e))
    }
}
