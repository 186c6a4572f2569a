//! Store layout configuration (`atomgraph.toml`)
//!
//! Every key is optional. A store without a config file uses the defaults.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file name, looked up at the store root.
pub const CONFIG_FILE: &str = "atomgraph.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid file pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// Layout of an atom store and CLI display defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Atom directory, relative to the store root. Walked recursively.
    pub atoms_dir: PathBuf,
    /// Module directory, relative to the store root. Not recursive.
    pub modules_dir: PathBuf,
    /// File name patterns for record files.
    pub patterns: Vec<String>,
    /// Warnings printed before the rest are summarised as a count.
    pub max_displayed_warnings: usize,
    /// Merge strategy used when none is given on the command line.
    pub default_strategy: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            atoms_dir: PathBuf::from("atoms"),
            modules_dir: PathBuf::from("modules"),
            patterns: vec!["*.yaml".to_string(), "*.yml".to_string()],
            max_displayed_warnings: 10,
            default_strategy: "three_way".to_string(),
        }
    }
}

impl StoreConfig {
    /// Load `atomgraph.toml` from the store root, falling back to defaults
    /// when the file does not exist.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            tracing::debug!("No {} in {}, using defaults", CONFIG_FILE, root.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;

        tracing::debug!("Loaded store config from {}", path.display());
        Ok(config)
    }

    pub fn atoms_path(&self, root: &Path) -> PathBuf {
        root.join(&self.atoms_dir)
    }

    pub fn modules_path(&self, root: &Path) -> PathBuf {
        root.join(&self.modules_dir)
    }

    /// Compile `patterns` into a matcher for record file names.
    pub fn matcher(&self) -> Result<GlobSet, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.patterns {
            let glob = Glob::new(pattern).map_err(|source| ConfigError::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|source| ConfigError::Pattern {
            pattern: self.patterns.join(","),
            source,
        })
    }
}
