//! Chart repository on the local filesystem.
//!
//! # Layout
//!
//! ```text
//! {root}/
//! ├── index.yaml              # Helm-style index: entries -> releases
//! └── <package>/<version>/    # Unpacked files of one release
//!     ├── catalog.yml
//!     └── ...
//! ```
//!
//! The index commit is the SHA-256 of `index.yaml`, so any edit to the
//! index is a new revision.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;
use walkdir::WalkDir;

use super::source::{ChartSource, IconRef, SourceError, icon_filename};
use super::types::{ChartFile, ChartRelease, IndexSnapshot};
use crate::util::hash::hash_bytes;

/// Index file name at the repository root.
pub const INDEX_FILENAME: &str = "index.yaml";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexFile {
  #[serde(default)]
  entries: BTreeMap<String, Vec<ChartRelease>>,
}

#[derive(Debug, Clone)]
pub struct FsChartSource {
  root: PathBuf,
}

impl FsChartSource {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn release_dir(&self, release: &ChartRelease) -> PathBuf {
    if release.dir.is_empty() {
      self.root.join(&release.name).join(&release.version)
    } else {
      self.root.join(&release.dir)
    }
  }
}

impl ChartSource for FsChartSource {
  fn load_index(&self) -> Result<IndexSnapshot, SourceError> {
    let path = self.root.join(INDEX_FILENAME);

    let content = match fs::read(&path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(SourceError::IndexNotFound(path)),
      Err(source) => return Err(SourceError::Read { path, source }),
    };

    let file: IndexFile = serde_yaml::from_slice(&content)?;

    let mut entries = file.entries;
    for (package, releases) in entries.iter_mut() {
      for release in releases.iter_mut() {
        if release.name.is_empty() {
          release.name = package.clone();
        }
        if release.dir.is_empty() {
          release.dir = format!("{}/{}", package, release.version);
        }
      }
    }

    let commit = hash_bytes(&content).0;
    debug!(root = %self.root.display(), commit = %commit, packages = entries.len(), "loaded index");

    Ok(IndexSnapshot { commit, entries })
  }

  fn fetch_local_files(&self, release: &ChartRelease) -> Result<Vec<ChartFile>, SourceError> {
    let dir = self.release_dir(release);
    if !dir.is_dir() {
      return Err(SourceError::FilesNotFound {
        package: release.name.clone(),
        version: release.version.clone(),
      });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&dir).sort_by_file_name() {
      let entry = entry.map_err(|e| SourceError::Read {
        path: dir.clone(),
        source: e.into(),
      })?;
      if !entry.file_type().is_file() {
        continue;
      }

      let rel = entry
        .path()
        .strip_prefix(&dir)
        .unwrap_or(entry.path())
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");

      let bytes = fs::read(entry.path()).map_err(|source| SourceError::Read {
        path: entry.path().to_path_buf(),
        source,
      })?;

      files.push(ChartFile::new(
        format!("{}/{}", release.name, rel),
        String::from_utf8_lossy(&bytes).into_owned(),
      ));
    }

    Ok(files)
  }

  fn icon(&self, releases: &[ChartRelease]) -> Result<IconRef, SourceError> {
    let Some(release) = releases.iter().find(|r| !r.icon.is_empty()) else {
      return Ok(IconRef::default());
    };

    if !release.icon.contains("://") && !self.root.join(&release.icon).is_file() {
      return Err(SourceError::IconNotFound {
        package: release.name.clone(),
        icon: release.icon.clone(),
      });
    }

    Ok(IconRef {
      filename: icon_filename(&release.icon),
      url: release.icon.clone(),
    })
  }
}
