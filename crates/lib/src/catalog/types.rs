use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::consts::GLOBAL_NAMESPACE;

/// Last-seen digest per version per package.
///
/// A sync never edits this in place: it builds a full replacement and the
/// status tracker swaps it in at the end of the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionCommitSnapshot(pub BTreeMap<String, BTreeMap<String, String>>);

impl VersionCommitSnapshot {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, package: &str) -> Option<&BTreeMap<String, String>> {
    self.0.get(package)
  }

  pub fn insert(&mut self, package: impl Into<String>, versions: BTreeMap<String, String>) {
    self.0.insert(package.into(), versions);
  }

  pub fn remove(&mut self, package: &str) -> Option<BTreeMap<String, String>> {
    self.0.remove(package)
  }

  pub fn contains(&self, package: &str) -> bool {
    self.0.contains_key(package)
  }

  pub fn packages(&self) -> impl Iterator<Item = &String> {
    self.0.keys()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn version_count(&self) -> usize {
    self.0.values().map(|v| v.len()).sum()
  }
}

/// Which part of the platform owns a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CatalogScope {
  #[default]
  Global,
  #[serde(rename_all = "camelCase")]
  Cluster { namespace: String, cluster_id: String },
  /// `project_id` has the form `<cluster>:<project>`.
  #[serde(rename_all = "camelCase")]
  Project { namespace: String, project_id: String },
}

impl CatalogScope {
  /// Catalog type name as it appears in external IDs.
  pub fn type_name(&self) -> &'static str {
    match self {
      CatalogScope::Global => "catalog",
      CatalogScope::Cluster { .. } => "clusterCatalog",
      CatalogScope::Project { .. } => "projectCatalog",
    }
  }

  /// Namespace the catalog's templates are written to.
  pub fn namespace(&self) -> &str {
    match self {
      CatalogScope::Global => GLOBAL_NAMESPACE,
      CatalogScope::Cluster { namespace, .. } | CatalogScope::Project { namespace, .. } => namespace,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSpec {
  pub name: String,
  #[serde(default)]
  pub url: String,
  #[serde(default)]
  pub branch: String,
  #[serde(default)]
  pub helm_version: String,
  #[serde(default)]
  pub scope: CatalogScope,
}

/// The parts of a catalog definition that shape every written template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedSpec {
  #[serde(default)]
  pub scope: CatalogScope,
  #[serde(default)]
  pub helm_version: String,
}

impl AppliedSpec {
  pub fn of(spec: &CatalogSpec) -> Self {
    Self {
      scope: spec.scope.clone(),
      helm_version: spec.helm_version.clone(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionState {
  Unknown,
  True,
  False,
}

impl std::fmt::Display for ConditionState {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ConditionState::Unknown => write!(f, "Unknown"),
      ConditionState::True => write!(f, "True"),
      ConditionState::False => write!(f, "False"),
    }
  }
}

/// Why the refreshed condition is not `True`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionReason {
  /// Create or update of one or more templates failed.
  Error,
  /// Some packages carried invalid data; everything else was applied.
  InvalidCharts,
}

/// The catalog's "refreshed" condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
  pub state: ConditionState,
  #[serde(default)]
  pub message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub reason: Option<ConditionReason>,
  pub last_update_time: u64,
}

impl Condition {
  pub fn new(state: ConditionState, message: impl Into<String>, reason: Option<ConditionReason>) -> Self {
    Self {
      state,
      message: message.into(),
      reason,
      last_update_time: now_unix(),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStatus {
  /// `None` until the first sync touches the catalog.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub refreshed: Option<Condition>,
  /// Index revision last applied in full. Empty forces a full re-evaluation.
  #[serde(default)]
  pub commit: String,
  #[serde(default)]
  pub version_commits: VersionCommitSnapshot,
  /// Set once a sync has traversed the whole index. Until then unchanged
  /// packages are regenerated too.
  #[serde(default)]
  pub all_updates_applied: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_refresh_timestamp: Option<u64>,
  /// Scope and Helm version the stored templates were written with.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub applied: Option<AppliedSpec>,
}

/// A catalog definition and its persisted sync status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
  pub spec: CatalogSpec,
  #[serde(default)]
  pub status: CatalogStatus,
}

impl Catalog {
  pub fn new(spec: CatalogSpec) -> Self {
    Self {
      spec,
      status: CatalogStatus::default(),
    }
  }

  pub fn name(&self) -> &str {
    &self.spec.name
  }

  pub fn condition_state(&self) -> Option<ConditionState> {
    self.status.refreshed.as_ref().map(|c| c.state)
  }

  pub fn is_refreshed(&self) -> bool {
    self.condition_state() == Some(ConditionState::True)
  }
}

pub(crate) fn now_unix() -> u64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or_default()
    .as_secs()
}
