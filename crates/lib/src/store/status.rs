//! Catalog status storage.
//!
//! # Storage Layout
//!
//! ```text
//! {data_dir}/catalogs/
//! └── <name>.json         # Catalog: spec + status
//! ```

use std::fs;
use std::io;
use std::path::PathBuf;

use super::{StatusStore, StoreError, read_json, write_json_atomic};
use crate::catalog::Catalog;
use crate::platform::paths::catalogs_dir;

/// Persists catalogs (definition and status) as one JSON file each.
///
/// Writes go through a temp file and a rename so a crash never leaves a
/// half-written status behind.
#[derive(Debug, Clone)]
pub struct FsStatusStore {
  base_path: PathBuf,
}

impl FsStatusStore {
  pub fn new(base_path: impl Into<PathBuf>) -> Self {
    Self {
      base_path: base_path.into(),
    }
  }

  /// Store at the default location under the data directory.
  pub fn default_store() -> Self {
    Self::new(catalogs_dir())
  }

  pub fn base_path(&self) -> &PathBuf {
    &self.base_path
  }

  fn catalog_path(&self, name: &str) -> PathBuf {
    self.base_path.join(format!("{}.json", name))
  }

  /// Load a catalog by name.
  ///
  /// Returns `Ok(None)` if it has never been saved.
  pub fn load_catalog(&self, name: &str) -> Result<Option<Catalog>, StoreError> {
    read_json(&self.catalog_path(name))
  }

  /// Names of all saved catalogs, sorted.
  pub fn list_catalogs(&self) -> Result<Vec<String>, StoreError> {
    let entries = match fs::read_dir(&self.base_path) {
      Ok(entries) => entries,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(source) => {
        return Err(StoreError::Read {
          path: self.base_path.clone(),
          source,
        });
      }
    };

    let mut names: Vec<String> = entries
      .filter_map(|e| e.ok())
      .filter_map(|e| {
        let path = e.path();
        if path.extension().is_some_and(|ext| ext == "json") {
          path.file_stem().map(|s| s.to_string_lossy().into_owned())
        } else {
          None
        }
      })
      .collect();
    names.sort();
    Ok(names)
  }
}

impl StatusStore for FsStatusStore {
  fn save_catalog_status(&mut self, catalog: &Catalog) -> Result<(), StoreError> {
    write_json_atomic(&self.catalog_path(catalog.name()), catalog)
  }
}
