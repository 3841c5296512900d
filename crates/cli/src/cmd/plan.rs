//! Implementation of the `catsync plan` command.
//!
//! Shows what a sync would do without writing anything.

use std::path::Path;

use anyhow::{Context, Result};

use catsync_lib::index::{ChartSource, FsChartSource};
use catsync_lib::store::FsStatusStore;
use catsync_lib::sync::plan_sync;

use super::{CatalogArgs, resolve_catalog};
use crate::output::{OutputFormat, print_json, print_plan};

pub fn cmd_plan(name: &str, repo: &Path, args: &CatalogArgs, format: OutputFormat, verbose: bool) -> Result<()> {
  let store = FsStatusStore::default_store();
  let catalog = resolve_catalog(&store, name, Some(repo), args)?;

  let index = FsChartSource::new(repo)
    .load_index()
    .with_context(|| format!("Failed to load index from {}", repo.display()))?;
  let plan = plan_sync(&catalog, &index);

  if format.is_json() {
    return print_json(&plan);
  }

  print_plan(&plan, verbose);
  Ok(())
}
