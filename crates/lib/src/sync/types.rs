//! Error, report and cancellation types of a sync run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use thiserror::Error;

use crate::catalog::ScopeError;
use crate::index::SourceError;
use crate::store::StoreError;

/// How a run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncOutcome {
  /// The index was traversed and the results applied.
  Synced,
  /// The index commit was already applied in full. Nothing was written.
  UpToDate,
}

/// Counts and names of what a run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
  pub catalog: String,
  pub commit: String,
  pub outcome: SyncOutcome,
  /// Template names created, in index order.
  pub created: Vec<String>,
  pub updated: Vec<String>,
  pub deleted: Vec<String>,
  /// Packages whose create or update failed, plus invalid entries.
  pub failed: Vec<String>,
  /// Unchanged packages left untouched.
  pub skipped: usize,
}

impl SyncReport {
  pub fn new(catalog: impl Into<String>, commit: impl Into<String>, outcome: SyncOutcome) -> Self {
    Self {
      catalog: catalog.into(),
      commit: commit.into(),
      outcome,
      created: Vec::new(),
      updated: Vec::new(),
      deleted: Vec::new(),
      failed: Vec::new(),
      skipped: 0,
    }
  }

  pub fn is_up_to_date(&self) -> bool {
    self.outcome == SyncOutcome::UpToDate
  }
}

/// One or more templates could not be created or updated.
///
/// The catalog commit was reset so the next run re-evaluates everything.
#[derive(Debug, Error)]
#[error("failed to sync catalog {}: {message}", .report.catalog)]
pub struct HardSyncError {
  pub message: String,
  pub report: SyncReport,
}

/// Some packages carried invalid data. Everything else was applied and
/// retrying without a new index will not help.
#[derive(Debug, Error)]
#[error("failed to sync catalog {}: {message}", .report.catalog)]
pub struct SoftSyncError {
  pub message: String,
  pub report: SyncReport,
}

#[derive(Debug, Error)]
pub enum SyncError {
  #[error("invalid catalog scope: {0}")]
  Scope(#[from] ScopeError),

  #[error("failed to load index: {0}")]
  Index(#[source] SourceError),

  #[error("failed to read files of package {package}: {source}")]
  Fetch {
    package: String,
    #[source]
    source: SourceError,
  },

  #[error("failed to resolve icon of package {package}: {source}")]
  Icon {
    package: String,
    #[source]
    source: SourceError,
  },

  #[error("failed to look up template {namespace}/{name}: {source}")]
  Lookup {
    namespace: String,
    name: String,
    #[source]
    source: StoreError,
  },

  #[error("failed to delete template {namespace}/{name}: {source}")]
  Delete {
    namespace: String,
    name: String,
    #[source]
    source: StoreError,
  },

  #[error("failed to save status of catalog {catalog}: {source}")]
  SaveStatus {
    catalog: String,
    #[source]
    source: StoreError,
  },

  #[error("sync of catalog {0} was cancelled")]
  Cancelled(String),

  #[error(transparent)]
  Hard(#[from] HardSyncError),

  #[error(transparent)]
  Soft(#[from] SoftSyncError),
}

impl SyncError {
  /// Whether running the same sync again may succeed.
  ///
  /// Soft errors come from the index content and scope errors from the
  /// catalog definition; neither changes by retrying.
  pub fn is_retryable(&self) -> bool {
    !matches!(self, SyncError::Soft(_) | SyncError::Scope(_))
  }

  pub fn is_soft(&self) -> bool {
    matches!(self, SyncError::Soft(_))
  }

  /// The partial report, for errors raised after the index was traversed.
  pub fn report(&self) -> Option<&SyncReport> {
    match self {
      SyncError::Hard(e) => Some(&e.report),
      SyncError::Soft(e) => Some(&e.report),
      _ => None,
    }
  }
}

/// Cooperative cancellation flag shared between a run and its caller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.0.store(true, Ordering::SeqCst);
  }

  pub fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::SeqCst)
  }
}
