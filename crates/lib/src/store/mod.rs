//! Template and status persistence.
//!
//! The sync engine only talks to the [`TemplateStore`] and [`StatusStore`]
//! traits. File-backed and in-memory implementations live here.

mod fs;
mod memory;
mod status;

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::template::TemplateResource;

pub use fs::{FsTemplateStore, TemplateVersionResource};
pub use memory::{MemoryStatusStore, MemoryTemplateStore, StoreCall};
pub use status::FsStatusStore;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("template {namespace}/{name} not found")]
  NotFound { namespace: String, name: String },

  #[error("template {namespace}/{name} already exists")]
  AlreadyExists { namespace: String, name: String },

  #[error("{namespace:?}/{name:?} is not a valid resource name")]
  InvalidName { namespace: String, name: String },

  #[error("failed to create directory {path}: {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to serialize: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("{0}")]
  Other(String),
}

impl StoreError {
  pub fn not_found(namespace: &str, name: &str) -> Self {
    StoreError::NotFound {
      namespace: namespace.to_string(),
      name: name.to_string(),
    }
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, StoreError::NotFound { .. })
  }
}

/// Downstream store of template resources.
pub trait TemplateStore {
  /// Look up a template. Must return [`StoreError::NotFound`] when absent.
  fn get_template(&self, namespace: &str, name: &str) -> Result<TemplateResource, StoreError>;

  fn create_template(&mut self, template: &TemplateResource) -> Result<(), StoreError>;

  /// Replace `existing` with `template`, including its set of versions.
  fn update_template(&mut self, existing: &TemplateResource, template: &TemplateResource) -> Result<(), StoreError>;

  /// Delete a template and every version resource belonging to it.
  fn delete_template(&mut self, name: &str, namespace: &str) -> Result<(), StoreError>;
}

/// Persistence of a catalog's status.
pub trait StatusStore {
  fn save_catalog_status(&mut self, catalog: &Catalog) -> Result<(), StoreError>;
}

/// Serialize `value` to `path` via a temp file in the same directory and a rename.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
  let dir = path.parent().unwrap_or_else(|| Path::new("."));
  std::fs::create_dir_all(dir).map_err(|source| StoreError::CreateDir {
    path: dir.to_path_buf(),
    source,
  })?;

  let content = serde_json::to_string_pretty(value).map_err(StoreError::Serialize)?;

  let write_err = |source: io::Error| StoreError::Write {
    path: path.to_path_buf(),
    source,
  };
  let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
  io::Write::write_all(&mut temp, content.as_bytes()).map_err(write_err)?;
  temp.persist(path).map_err(|e| write_err(e.error))?;

  Ok(())
}

/// Read and parse a JSON file. Returns `Ok(None)` when the file does not exist.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
  let content = match std::fs::read_to_string(path) {
    Ok(content) => content,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
    Err(source) => {
      return Err(StoreError::Read {
        path: path.to_path_buf(),
        source,
      });
    }
  };

  serde_json::from_str(&content)
    .map(Some)
    .map_err(|source| StoreError::Parse {
      path: path.to_path_buf(),
      source,
    })
}
