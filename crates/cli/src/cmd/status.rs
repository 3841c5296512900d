//! Status command implementation.
//!
//! Displays the persisted sync status of a catalog.

use anyhow::{Context, Result};

use catsync_lib::store::FsStatusStore;

use super::load_catalog;
use crate::output::{OutputFormat, print_catalog_list, print_catalog_status, print_info, print_json};

pub fn cmd_status(name: Option<&str>, format: OutputFormat) -> Result<()> {
  let store = FsStatusStore::default_store();

  let Some(name) = name else {
    return list_catalogs(&store, format);
  };

  let Some(catalog) = load_catalog(&store, name)? else {
    print_info(&format!("No status for catalog {}. Run 'catsync sync' first.", name));
    return Ok(());
  };

  if format.is_json() {
    return print_json(&catalog);
  }

  print_catalog_status(&catalog);
  Ok(())
}

fn list_catalogs(store: &FsStatusStore, format: OutputFormat) -> Result<()> {
  let mut catalogs = Vec::new();
  for name in store.list_catalogs().context("Failed to list catalogs")? {
    if let Some(catalog) = load_catalog(store, &name)? {
      catalogs.push(catalog);
    }
  }

  if format.is_json() {
    return print_json(&catalogs);
  }

  if catalogs.is_empty() {
    print_info("No catalogs synced yet");
    return Ok(());
  }

  print_catalog_list(&catalogs);
  Ok(())
}
