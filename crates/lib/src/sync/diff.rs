//! Change detection and sync planning.
//!
//! Everything here is pure: given the persisted catalog status and a fresh
//! index it decides which packages must be rebuilt, which may be skipped,
//! which templates must be pruned and which index entries are unusable.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::catalog::{AppliedSpec, Catalog, VersionCommitSnapshot};
use crate::index::{ChartRelease, IndexSnapshot};
use crate::util::path::is_path_component;

/// Result of comparing one package's releases with its last-seen digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeDetection {
  pub changed: bool,
  /// Releases whose version was present in the previous map.
  pub matched: usize,
  /// Size of the previous map.
  pub previous: usize,
}

/// Compare `releases` against the previous version -> digest map.
///
/// A release that is new or whose digest moved marks the package changed.
/// So does a mismatch between the number of known releases and the size of
/// the previous map, which is how removed versions are noticed.
pub fn detect(releases: &[ChartRelease], old: Option<&BTreeMap<String, String>>) -> ChangeDetection {
  let previous = old.map_or(0, |m| m.len());
  let mut changed = false;
  let mut matched = 0;

  for release in releases {
    match old.and_then(|m| m.get(&release.version)) {
      Some(digest) => {
        matched += 1;
        if *digest != release.digest {
          changed = true;
        }
      }
      None => changed = true,
    }
  }

  if matched != previous {
    changed = true;
  }

  ChangeDetection {
    changed,
    matched,
    previous,
  }
}

/// Version -> digest map of a package's releases.
pub fn release_digests(releases: &[ChartRelease]) -> BTreeMap<String, String> {
  releases
    .iter()
    .map(|r| (r.version.clone(), r.digest.clone()))
    .collect()
}

/// An index entry that cannot be turned into a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidEntry {
  pub package: String,
  pub message: String,
}

impl std::fmt::Display for InvalidEntry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.message)
  }
}

fn validate_entry(package: &str, releases: &[ChartRelease]) -> Result<(), String> {
  if !is_path_component(package) || package.chars().any(char::is_whitespace) {
    return Err(format!("invalid chart name {:?}", package));
  }
  if releases.is_empty() {
    return Err(format!("chart {} has no versions", package));
  }

  let mut seen = HashSet::new();
  for release in releases {
    if release.version.is_empty() {
      return Err(format!("chart {} has a release without a version", package));
    }
    if !is_path_component(&release.version) {
      return Err(format!("chart {} has an invalid version {:?}", package, release.version));
    }
    if release.digest.is_empty() {
      return Err(format!("chart {} version {} has no digest", package, release.version));
    }
    if !seen.insert(release.version.as_str()) {
      return Err(format!("chart {} lists version {} more than once", package, release.version));
    }
  }

  Ok(())
}

/// Split the index into usable entries and invalid ones, keeping index order.
pub fn preprocess(index: &IndexSnapshot) -> (Vec<(&str, &[ChartRelease])>, Vec<InvalidEntry>) {
  let mut valid = Vec::new();
  let mut invalid = Vec::new();

  for (package, releases) in &index.entries {
    match validate_entry(package, releases) {
      Ok(()) => valid.push((package.as_str(), releases.as_slice())),
      Err(message) => invalid.push(InvalidEntry {
        package: package.clone(),
        message,
      }),
    }
  }

  (valid, invalid)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PackageChange {
  /// Not present in the previous snapshot.
  New,
  /// A digest moved or a version was added or removed.
  Changed,
  /// Unchanged, but the previous run did not traverse the whole index.
  Unapplied,
  /// Unchanged, but the catalog's scope or Helm version moved since the
  /// template was written.
  Reconfigured,
  Unchanged,
}

impl PackageChange {
  pub fn needs_apply(self) -> bool {
    self != PackageChange::Unchanged
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackagePlan {
  pub package: String,
  pub change: PackageChange,
}

/// Templates left behind in another namespace by a scope change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relocation {
  pub namespace: String,
  /// Packages of the previous snapshot, whose templates are removed from
  /// `namespace` before anything is written to the new one.
  pub packages: Vec<String>,
}

/// What a sync of a catalog against an index would do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPlan {
  pub catalog: String,
  pub commit: String,
  /// The index commit is already applied in full.
  pub up_to_date: bool,
  /// Valid packages, in index order.
  pub packages: Vec<PackagePlan>,
  /// Packages of the previous snapshot that left the index.
  pub deletes: Vec<String>,
  pub invalid: Vec<InvalidEntry>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub relocation: Option<Relocation>,
}

impl SyncPlan {
  pub fn to_apply(&self) -> impl Iterator<Item = &PackagePlan> {
    self.packages.iter().filter(|p| p.change.needs_apply())
  }

  pub fn unchanged(&self) -> usize {
    self.packages.iter().filter(|p| !p.change.needs_apply()).count()
  }

  pub fn has_changes(&self) -> bool {
    self.to_apply().next().is_some() || !self.deletes.is_empty() || self.relocation.is_some()
  }
}

/// Compute the plan for syncing `catalog` against `index`. Performs no I/O.
///
/// When the scope or Helm version differs from the one the stored templates
/// were written with, every package is rebuilt. A scope that moves to
/// another namespace also retires the templates left in the old one, and
/// the previous snapshot no longer describes the new namespace.
pub fn plan_sync(catalog: &Catalog, index: &IndexSnapshot) -> SyncPlan {
  let status = &catalog.status;
  let current = AppliedSpec::of(&catalog.spec);
  let reconfigured = status.applied.as_ref().is_some_and(|applied| *applied != current);

  let relocation = status
    .applied
    .as_ref()
    .filter(|applied| applied.scope.namespace() != current.scope.namespace())
    .map(|applied| Relocation {
      namespace: applied.scope.namespace().to_string(),
      packages: status.version_commits.packages().cloned().collect(),
    });

  let relocating = relocation.is_some();

  let up_to_date = !reconfigured
    && !index.commit.is_empty()
    && index.commit == status.commit
    && catalog.is_refreshed()
    && status.all_updates_applied;

  let (valid, invalid) = preprocess(index);

  let packages = valid
    .into_iter()
    .map(|(package, releases)| {
      let old = if relocating {
        None
      } else {
        status.version_commits.get(package)
      };
      let detection = detect(releases, old);
      let change = match (old, detection.changed) {
        (None, _) => PackageChange::New,
        (Some(_), true) => PackageChange::Changed,
        (Some(_), false) if reconfigured => PackageChange::Reconfigured,
        (Some(_), false) if !status.all_updates_applied => PackageChange::Unapplied,
        (Some(_), false) => PackageChange::Unchanged,
      };
      PackagePlan {
        package: package.to_string(),
        change,
      }
    })
    .collect();

  let deletes = if relocating {
    Vec::new()
  } else {
    status
      .version_commits
      .packages()
      .filter(|p| !index.contains(p))
      .cloned()
      .collect()
  };

  SyncPlan {
    catalog: catalog.name().to_string(),
    commit: index.commit.clone(),
    up_to_date,
    packages,
    deletes,
    invalid,
    relocation,
  }
}

/// Snapshot of every valid package in `index` except `failed`.
pub fn next_snapshot(index: &IndexSnapshot, plan: &SyncPlan, failed: &HashSet<String>) -> VersionCommitSnapshot {
  let mut snapshot = VersionCommitSnapshot::new();
  for entry in plan.packages.iter().filter(|p| !failed.contains(&p.package)) {
    if let Some(releases) = index.entries.get(&entry.package) {
      snapshot.insert(entry.package.clone(), release_digests(releases));
    }
  }
  snapshot
}
