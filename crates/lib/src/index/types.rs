use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One published version of a package, as listed in the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRelease {
  pub name: String,
  pub version: String,
  #[serde(default)]
  pub digest: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub sources: Vec<String>,
  #[serde(default)]
  pub urls: Vec<String>,
  #[serde(default)]
  pub icon: String,
  #[serde(default)]
  pub kube_version: String,
  /// Directory holding the release's files, relative to the repository root.
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub dir: String,
}

/// Immutable view of a remote package index.
///
/// Release lists keep the order in which the index declares them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSnapshot {
  /// Identifier of the index revision (a VCS commit or a content hash).
  pub commit: String,
  pub entries: BTreeMap<String, Vec<ChartRelease>>,
}

impl IndexSnapshot {
  pub fn new(commit: impl Into<String>) -> Self {
    Self {
      commit: commit.into(),
      entries: BTreeMap::new(),
    }
  }

  /// Builder-style helper used heavily by tests and embedders.
  pub fn with_release(mut self, package: &str, version: &str, digest: &str) -> Self {
    self.entries.entry(package.to_string()).or_default().push(ChartRelease {
      name: package.to_string(),
      version: version.to_string(),
      digest: digest.to_string(),
      ..Default::default()
    });
    self
  }

  pub fn contains(&self, package: &str) -> bool {
    self.entries.contains_key(package)
  }

  pub fn package_count(&self) -> usize {
    self.entries.len()
  }

  pub fn version_count(&self) -> usize {
    self.entries.values().map(|v| v.len()).sum()
  }
}

/// A file belonging to a single release.
///
/// `name` is rooted at the package folder, e.g. `nginx/catalog.yml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartFile {
  pub name: String,
  pub contents: String,
}

impl ChartFile {
  pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      contents: contents.into(),
    }
  }
}
