//! Atom store loading: directory walk, record parsing and store config

pub mod config;
pub mod loader;


#[cfg(test)]
pub mod test_utils;

pub use config::{CONFIG_FILE, ConfigError, StoreConfig};
pub use loader::{LoadError, LoadWarning, LoadedStore, StoreLoader, load_store};
