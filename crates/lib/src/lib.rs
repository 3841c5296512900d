//! catsync-lib: catalog synchronization engine
//!
//! This crate keeps a store of template resources in line with a package
//! index:
//! - `index`: the package index and the sources it is read from
//! - `metadata`: per-release descriptor extraction
//! - `template`: template resources and how they are built and named
//! - `store`: template and catalog status persistence
//! - `sync`: change detection, reconciliation and status tracking

pub mod catalog;
pub mod catalog_lock;
pub mod consts;
pub mod index;
pub mod metadata;
pub mod platform;
pub mod store;
pub mod sync;
pub mod template;
pub mod util;

pub use catalog::{Catalog, CatalogScope, CatalogSpec};
pub use sync::{CancelToken, SyncEngine, SyncError, SyncReport, sync_catalog};
