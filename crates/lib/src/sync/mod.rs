//! Catalog synchronization.
//!
//! A run loads the index, plans which packages changed since the last
//! snapshot, rebuilds and writes the templates of changed packages, prunes
//! templates of packages that left the index and finally records the new
//! snapshot and condition on the catalog.

mod diff;
mod engine;
mod status;
mod types;

pub use diff::{
  ChangeDetection, InvalidEntry, PackageChange, PackagePlan, Relocation, SyncPlan, detect, next_snapshot, plan_sync,
  preprocess, release_digests,
};
pub use engine::{SyncEngine, sync_catalog};
pub use status::{RunSummary, StatusTracker, needs_syncing_marker};
pub use types::{CancelToken, HardSyncError, SoftSyncError, SyncError, SyncOutcome, SyncReport};
