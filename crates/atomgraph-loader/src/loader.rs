//! Reads atom and module records from a store directory

use crate::config::{ConfigError, StoreConfig};
use atomgraph_core::{Atom, AtomGraph, AtomId, Module, ModuleId};
use globset::GlobSet;
use ignore::WalkBuilder;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The atoms root is required; everything below it is best-effort.
    #[error("atoms directory not found: {}", .0.display())]
    AtomsDirNotFound(PathBuf),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A record file that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Everything read from one store.
#[derive(Debug, Default)]
pub struct LoadedStore {
    pub atoms: BTreeMap<AtomId, Atom>,
    pub modules: BTreeMap<ModuleId, Module>,
    pub warnings: Vec<LoadWarning>,
}

impl LoadedStore {
    /// Build the graph, handing back the load warnings.
    pub fn into_graph(self) -> (AtomGraph, Vec<LoadWarning>) {
        (AtomGraph::from_parts(self.atoms, self.modules), self.warnings)
    }
}

/// Loads records according to a [`StoreConfig`].
pub struct StoreLoader {
    config: StoreConfig,
    matcher: GlobSet,
}

impl StoreLoader {
    pub fn new(config: StoreConfig) -> Result<Self, ConfigError> {
        let matcher = config.matcher()?;
        Ok(StoreLoader { config, matcher })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Load every atom (recursively) and module (top level only) under `root`.
    ///
    /// Unparseable files are skipped and reported as warnings. Fails only
    /// when the atoms directory is absent.
    pub fn load(&self, root: &Path) -> Result<LoadedStore, LoadError> {
        let atoms_dir = self.config.atoms_path(root);
        if !atoms_dir.is_dir() {
            return Err(LoadError::AtomsDirNotFound(atoms_dir));
        }

        let mut store = LoadedStore::default();

        for path in self.record_files(&atoms_dir, None, &mut store.warnings) {
            let atom: Atom = match parse_record(&path) {
                Ok(atom) => atom,
                Err(message) => {
                    warn_skipped(&mut store.warnings, path, message);
                    continue;
                }
            };
            if atom.id.trim().is_empty() {
                warn_skipped(&mut store.warnings, path, "missing or empty id".to_string());
                continue;
            }
            match store.atoms.entry(atom.id.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(atom);
                }
                Entry::Occupied(_) => {
                    let message = format!("duplicate atom id '{}'", atom.id);
                    warn_skipped(&mut store.warnings, path, message);
                }
            }
        }

        let modules_dir = self.config.modules_path(root);
        if modules_dir.is_dir() {
            for path in self.record_files(&modules_dir, Some(1), &mut store.warnings) {
                let module: Module = match parse_record(&path) {
                    Ok(module) => module,
                    Err(message) => {
                        warn_skipped(&mut store.warnings, path, message);
                        continue;
                    }
                };
                if module.module_id.trim().is_empty() {
                    warn_skipped(
                        &mut store.warnings,
                        path,
                        "missing or empty module_id".to_string(),
                    );
                    continue;
                }
                match store.modules.entry(module.module_id.clone()) {
                    Entry::Vacant(slot) => {
                        slot.insert(module);
                    }
                    Entry::Occupied(_) => {
                        let message = format!("duplicate module id '{}'", module.module_id);
                        warn_skipped(&mut store.warnings, path, message);
                    }
                }
            }
        } else {
            tracing::debug!("No modules directory at {}", modules_dir.display());
        }

        tracing::info!(
            "Loaded {} atoms and {} modules from {} ({} files skipped)",
            store.atoms.len(),
            store.modules.len(),
            root.display(),
            store.warnings.len()
        );
        Ok(store)
    }

    /// Record files under `dir`, sorted by path. Hidden entries are skipped.
    fn record_files(
        &self,
        dir: &Path,
        max_depth: Option<usize>,
        warnings: &mut Vec<LoadWarning>,
    ) -> Vec<PathBuf> {
        let walker = WalkBuilder::new(dir)
            .standard_filters(false)
            .hidden(true)
            .max_depth(max_depth)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn_skipped(warnings, dir.to_path_buf(), format!("cannot read entry: {e}"));
                    continue;
                }
            };
            let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
            if is_file && self.matcher.is_match(entry.file_name()) {
                files.push(entry.into_path());
            }
        }
        files
    }
}

/// Load a store using the `atomgraph.toml` found at its root, if any.
pub fn load_store(root: &Path) -> Result<LoadedStore, LoadError> {
    let config = StoreConfig::load(root)?;
    StoreLoader::new(config)?.load(root)
}

fn parse_record<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("cannot read file: {e}"))?;
    serde_yaml::from_str(&text).map_err(|e| format!("invalid record: {e}"))
}

fn warn_skipped(warnings: &mut Vec<LoadWarning>, path: PathBuf, message: String) {
    tracing::warn!("Skipping {}: {}", path.display(), message);
    warnings.push(LoadWarning { path, message });
}
