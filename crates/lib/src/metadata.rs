//! Metadata extraction from per-release descriptor files.
//!
//! Each release may ship a descriptor (`catalog.yml`, `questions.yml`, ...)
//! declaring its platform compatibility window, required namespace,
//! categories and labels. The first descriptor that parses wins; broken
//! descriptors are recorded and skipped so the release is still published
//! with whatever could be read.

use std::collections::{BTreeMap, BTreeSet};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::consts::SUPPORTED_DESCRIPTOR_FILES;
use crate::index::{ChartFile, ChartRelease, ChartSource, SourceError};

#[derive(Debug, Default, Deserialize)]
struct Descriptor {
  #[serde(default, deserialize_with = "scalar_string")]
  rancher_min_version: Option<String>,
  #[serde(default, deserialize_with = "scalar_string")]
  rancher_max_version: Option<String>,
  categories: Option<Vec<String>>,
  #[serde(default, deserialize_with = "scalar_string")]
  namespace: Option<String>,
  labels: Option<BTreeMap<String, String>>,
}

/// Accept any YAML scalar as a string; `2.5` is as valid a version bound as `"2.5"`.
fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
  match Option::<serde_yaml::Value>::deserialize(deserializer)? {
    None | Some(serde_yaml::Value::Null) => Ok(None),
    Some(serde_yaml::Value::String(s)) => Ok(Some(s)),
    Some(serde_yaml::Value::Number(n)) => Ok(Some(n.to_string())),
    Some(serde_yaml::Value::Bool(b)) => Ok(Some(b.to_string())),
    Some(other) => Err(D::Error::custom(format!("expected a scalar, found {:?}", other))),
  }
}

/// A descriptor file that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorError {
  pub package: String,
  pub version: String,
  pub file: String,
  pub message: String,
}

impl std::fmt::Display for DescriptorError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "invalid descriptor {} for {} {}: {}",
      self.file, self.package, self.version, self.message
    )
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseMetadata {
  pub version: String,
  pub digest: String,
  pub description: String,
  pub sources: Vec<String>,
  pub compat_min: String,
  pub compat_max: String,
  pub required_namespace: String,
  pub categories: BTreeSet<String>,
  pub labels: BTreeMap<String, String>,
  pub kube_version: String,
  pub storage_dir: String,
  pub storage_name: String,
  pub storage_urls: Vec<String>,
}

impl ReleaseMetadata {
  fn from_release(release: &ChartRelease) -> Self {
    Self {
      version: release.version.clone(),
      digest: release.digest.clone(),
      description: release.description.clone(),
      sources: release.sources.clone(),
      kube_version: release.kube_version.clone(),
      storage_dir: release.dir.clone(),
      storage_name: release.name.clone(),
      storage_urls: release.urls.clone(),
      ..Default::default()
    }
  }

  fn apply(&mut self, descriptor: Descriptor) {
    self.compat_min = descriptor.rancher_min_version.unwrap_or_default();
    self.compat_max = descriptor.rancher_max_version.unwrap_or_default();
    self.required_namespace = descriptor.namespace.unwrap_or_default();
    self.categories = descriptor.categories.unwrap_or_default().into_iter().collect();
    self.labels = descriptor.labels.unwrap_or_default();
  }
}

/// Metadata of every release of one package, plus the package-wide merges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
  pub name: String,
  pub releases: Vec<ReleaseMetadata>,
  /// Union of all release categories. Case-sensitive.
  pub categories: BTreeSet<String>,
  /// All release labels, later releases overriding earlier ones.
  pub labels: BTreeMap<String, String>,
  pub errors: Vec<DescriptorError>,
}

/// Read descriptors for every release of `package`.
///
/// Fetch failures are returned as errors. Parse failures are collected in
/// [`PackageMetadata::errors`].
pub fn extract_package<S: ChartSource + ?Sized>(
  source: &S,
  package: &str,
  releases: &[ChartRelease],
) -> Result<PackageMetadata, SourceError> {
  let mut metadata = PackageMetadata {
    name: package.to_string(),
    ..Default::default()
  };

  for release in releases {
    let files = source.fetch_local_files(release)?;
    let mut release_meta = ReleaseMetadata::from_release(release);

    if let Some(descriptor) = read_descriptor(package, &release.version, &files, &mut metadata.errors) {
      release_meta.apply(descriptor);
    }

    metadata.categories.extend(release_meta.categories.iter().cloned());
    metadata
      .labels
      .extend(release_meta.labels.iter().map(|(k, v)| (k.clone(), v.clone())));
    metadata.releases.push(release_meta);
  }

  Ok(metadata)
}

/// Whether `file_name` is one of the supported descriptors of `package`.
pub fn is_descriptor(package: &str, file_name: &str) -> bool {
  SUPPORTED_DESCRIPTOR_FILES
    .iter()
    .any(|f| format!("{}/{}", package, f).eq_ignore_ascii_case(file_name))
}

fn read_descriptor(
  package: &str,
  version: &str,
  files: &[ChartFile],
  errors: &mut Vec<DescriptorError>,
) -> Option<Descriptor> {
  for file in files.iter().filter(|f| is_descriptor(package, &f.name)) {
    if file.contents.trim().is_empty() {
      debug!(package, version, file = %file.name, "empty descriptor");
      return Some(Descriptor::default());
    }

    match serde_yaml::from_str::<Descriptor>(&file.contents) {
      Ok(descriptor) => return Some(descriptor),
      Err(e) => {
        warn!(package, version, file = %file.name, error = %e, "failed to parse descriptor");
        errors.push(DescriptorError {
          package: package.to_string(),
          version: version.to_string(),
          file: file.name.clone(),
          message: e.to_string(),
        });
      }
    }
  }

  None
}
