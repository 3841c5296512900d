use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::types::{ChartFile, ChartRelease, IndexSnapshot};

/// Errors raised by a [`ChartSource`].
///
/// All of them abort a sync: they indicate the repository itself is
/// unreadable rather than one package being malformed.
#[derive(Debug, Error)]
pub enum SourceError {
  #[error("index not found: {0}")]
  IndexNotFound(PathBuf),

  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse index: {0}")]
  Parse(#[from] serde_yaml::Error),

  #[error("files for {package} {version} not found")]
  FilesNotFound { package: String, version: String },

  #[error("icon {icon} for {package} not found")]
  IconNotFound { package: String, icon: String },

  #[error("{0}")]
  Other(String),
}

/// Icon resolved for a package: local file name and reference URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IconRef {
  pub filename: String,
  pub url: String,
}

/// Read-only access to a package repository.
pub trait ChartSource {
  /// Load the full index of the repository.
  fn load_index(&self) -> Result<IndexSnapshot, SourceError>;

  /// Fetch the files of one release, named relative to the package folder's parent.
  fn fetch_local_files(&self, release: &ChartRelease) -> Result<Vec<ChartFile>, SourceError>;

  /// Resolve the icon for a package from its releases (newest first in the index).
  fn icon(&self, releases: &[ChartRelease]) -> Result<IconRef, SourceError>;
}

/// Last path segment of an icon reference, ignoring query and fragment.
pub fn icon_filename(icon: &str) -> String {
  let trimmed = icon.split(['?', '#']).next().unwrap_or_default();
  trimmed.rsplit('/').next().unwrap_or_default().to_string()
}
