//! Implementation of the `catsync templates` command.

use anyhow::{Context, Result};
use serde::Serialize;

use catsync_lib::catalog::ScopeContext;
use catsync_lib::platform::paths::templates_dir;
use catsync_lib::store::{FsStatusStore, FsTemplateStore};

use super::load_catalog;
use crate::output::{OutputFormat, print_info, print_json, symbols};

#[derive(Serialize)]
struct TemplateSummary {
  name: String,
  folder: String,
  default_version: String,
  versions: Vec<String>,
}

/// List stored templates owned by a catalog.
pub fn cmd_templates(name: &str, format: OutputFormat) -> Result<()> {
  let Some(catalog) = load_catalog(&FsStatusStore::default_store(), name)? else {
    print_info(&format!("No status for catalog {}. Run 'catsync sync' first.", name));
    return Ok(());
  };

  let ctx = ScopeContext::resolve(&catalog.spec).context("Invalid catalog scope")?;
  let store = FsTemplateStore::new(templates_dir());
  let summaries: Vec<TemplateSummary> = store
    .list_templates(&ctx.namespace)
    .context("Failed to list templates")?
    .into_iter()
    .filter(|t| t.spec.owner == ctx.owner)
    .map(|t| TemplateSummary {
      name: t.name,
      folder: t.spec.folder_name,
      default_version: t.spec.default_version,
      versions: t.spec.versions.into_iter().map(|v| v.version).collect(),
    })
    .collect();

  if format.is_json() {
    return print_json(&summaries);
  }

  if summaries.is_empty() {
    print_info(&format!("Catalog {} has no templates", name));
    return Ok(());
  }

  for summary in &summaries {
    println!(
      "  {} {} ({}) {}",
      symbols::INFO,
      summary.name,
      summary.default_version,
      summary.versions.join(", ")
    );
  }
  println!();
  println!("{} template(s) in namespace {}", summaries.len(), ctx.namespace);

  Ok(())
}
