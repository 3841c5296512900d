//! Catalog definitions and persisted sync status.

mod scope;
mod types;

pub use scope::{ScopeContext, ScopeError};
pub use types::{
  AppliedSpec, Catalog, CatalogScope, CatalogSpec, CatalogStatus, Condition, ConditionReason, ConditionState,
  VersionCommitSnapshot,
};
pub(crate) use types::now_unix;
