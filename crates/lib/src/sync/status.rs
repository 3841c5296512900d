//! Catalog condition bookkeeping at the start and end of a run.

use tracing::{debug, error, warn};

use super::types::{HardSyncError, SoftSyncError, SyncError, SyncReport};
use crate::catalog::{
  AppliedSpec, Catalog, CatalogStatus, Condition, ConditionReason, ConditionState, VersionCommitSnapshot, now_unix,
};
use crate::consts::SYNCING_MESSAGE;
use crate::store::StatusStore;

/// Everything a traversal produced that the status needs.
#[derive(Debug)]
pub struct RunSummary {
  pub commit: String,
  /// Replacement snapshot, already without failed and invalid packages.
  pub snapshot: VersionCommitSnapshot,
  pub create_errors: Vec<String>,
  pub update_errors: Vec<String>,
  /// Invalid index entries and descriptor parse failures.
  pub invalid: Vec<String>,
  pub report: SyncReport,
}

/// Whether a run must announce itself before touching templates.
///
/// A catalog already marked as syncing, or left in an error state, keeps
/// its condition until the run finishes.
pub fn needs_syncing_marker(status: &CatalogStatus) -> bool {
  match &status.refreshed {
    None => true,
    Some(c) if c.state == ConditionState::True => true,
    Some(c) if c.state == ConditionState::Unknown => !c.message.contains(SYNCING_MESSAGE),
    Some(_) => false,
  }
}

pub struct StatusTracker<'a, P: StatusStore + ?Sized> {
  store: &'a mut P,
}

impl<'a, P: StatusStore + ?Sized> StatusTracker<'a, P> {
  pub fn new(store: &'a mut P) -> Self {
    Self { store }
  }

  /// Mark the catalog as syncing and persist it, when needed.
  pub fn begin(&mut self, catalog: &mut Catalog) -> Result<bool, SyncError> {
    if !needs_syncing_marker(&catalog.status) {
      return Ok(false);
    }
    catalog.status.refreshed = Some(Condition::new(ConditionState::Unknown, SYNCING_MESSAGE, None));
    self.save(catalog)?;
    debug!(catalog = %catalog.name(), "marked catalog as syncing");
    Ok(true)
  }

  /// Settle the final condition, commit and snapshot, and persist them.
  ///
  /// Create or update failures win over invalid entries: the commit is
  /// reset and a [`HardSyncError`] is returned. Invalid entries alone adopt
  /// the commit and return a [`SoftSyncError`].
  pub fn finish(&mut self, catalog: &mut Catalog, summary: RunSummary) -> Result<SyncReport, SyncError> {
    let RunSummary {
      commit,
      snapshot,
      create_errors,
      update_errors,
      invalid,
      report,
    } = summary;

    let invalid_message: String = invalid.iter().map(|e| format!("{};", e)).collect();

    let applied = AppliedSpec::of(&catalog.spec);
    let status = &mut catalog.status;
    status.version_commits = snapshot;
    status.applied = Some(applied);
    status.all_updates_applied = true;
    status.last_refresh_timestamp = Some(now_unix());

    let mut hard = Vec::new();
    if !create_errors.is_empty() {
      hard.push(format!(
        "failed to create templates. Multiple error(s) occurred: [{}]",
        create_errors.join(", ")
      ));
    }
    if !update_errors.is_empty() {
      hard.push(format!(
        "failed to update templates. Multiple error(s) occurred: [{}]",
        update_errors.join(", ")
      ));
    }

    if !hard.is_empty() {
      if !invalid_message.is_empty() {
        hard.push(invalid_message);
      }
      let message = hard.join(";");
      status.commit = String::new();
      status.refreshed = Some(Condition::new(
        ConditionState::False,
        message.clone(),
        Some(ConditionReason::Error),
      ));
      self.save(catalog)?;
      error!(catalog = %catalog.name(), failed = report.failed.len(), "catalog sync failed, commit reset");
      return Err(HardSyncError { message, report }.into());
    }

    status.commit = commit;

    if !invalid_message.is_empty() {
      let message = format!("Error in chart(s): {}", invalid_message);
      status.refreshed = Some(Condition::new(
        ConditionState::False,
        message.clone(),
        Some(ConditionReason::InvalidCharts),
      ));
      self.save(catalog)?;
      warn!(catalog = %catalog.name(), invalid = invalid.len(), "catalog synced with invalid charts");
      return Err(SoftSyncError { message, report }.into());
    }

    status.refreshed = Some(Condition::new(ConditionState::True, "", None));
    self.save(catalog)?;
    Ok(report)
  }

  fn save(&mut self, catalog: &Catalog) -> Result<(), SyncError> {
    self
      .store
      .save_catalog_status(catalog)
      .map_err(|source| SyncError::SaveStatus {
        catalog: catalog.name().to_string(),
        source,
      })
  }
}
