//! In-memory chart source.

use std::collections::{HashMap, HashSet};

use super::source::{ChartSource, IconRef, SourceError, icon_filename};
use super::types::{ChartFile, ChartRelease, IndexSnapshot};

/// A [`ChartSource`] backed by values held in memory.
///
/// Files are keyed by `(package, version)`. Releases listed in
/// `failing_files` make `fetch_local_files` fail.
#[derive(Debug, Clone, Default)]
pub struct MemoryChartSource {
  pub index: IndexSnapshot,
  pub files: HashMap<(String, String), Vec<ChartFile>>,
  pub failing_files: HashSet<(String, String)>,
  pub fail_index: bool,
}

impl MemoryChartSource {
  pub fn new(index: IndexSnapshot) -> Self {
    Self {
      index,
      ..Default::default()
    }
  }

  /// Attach a descriptor file to a release. `name` is relative to the package folder.
  pub fn with_file(mut self, package: &str, version: &str, name: &str, contents: &str) -> Self {
    self
      .files
      .entry((package.to_string(), version.to_string()))
      .or_default()
      .push(ChartFile::new(format!("{}/{}", package, name), contents));
    self
  }

  pub fn with_failing_files(mut self, package: &str, version: &str) -> Self {
    self.failing_files.insert((package.to_string(), version.to_string()));
    self
  }
}

impl ChartSource for MemoryChartSource {
  fn load_index(&self) -> Result<IndexSnapshot, SourceError> {
    if self.fail_index {
      return Err(SourceError::Other("index unavailable".to_string()));
    }
    Ok(self.index.clone())
  }

  fn fetch_local_files(&self, release: &ChartRelease) -> Result<Vec<ChartFile>, SourceError> {
    let key = (release.name.clone(), release.version.clone());
    if self.failing_files.contains(&key) {
      return Err(SourceError::FilesNotFound {
        package: key.0,
        version: key.1,
      });
    }
    Ok(self.files.get(&key).cloned().unwrap_or_default())
  }

  fn icon(&self, releases: &[ChartRelease]) -> Result<IconRef, SourceError> {
    let icon = releases.iter().map(|r| r.icon.as_str()).find(|i| !i.is_empty());
    Ok(match icon {
      Some(url) => IconRef {
        filename: icon_filename(url),
        url: url.to_string(),
      },
      None => IconRef::default(),
    })
  }
}
