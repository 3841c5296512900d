mod plan;
mod status;
mod sync;
mod templates;

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};

use catsync_lib::catalog::{Catalog, CatalogScope, CatalogSpec};
use catsync_lib::store::FsStatusStore;

pub use plan::cmd_plan;
pub use status::cmd_status;
pub use sync::cmd_sync;
pub use templates::cmd_templates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScopeKind {
  Global,
  Cluster,
  Project,
}

/// Catalog definition flags. Only used when the catalog is not yet known,
/// or to override what was stored.
#[derive(Debug, Clone, Args)]
pub struct CatalogArgs {
  /// Scope that owns the catalog
  #[arg(long, value_enum)]
  pub scope: Option<ScopeKind>,

  /// Namespace of a cluster or project catalog
  #[arg(long)]
  pub namespace: Option<String>,

  /// Cluster ID of a cluster catalog
  #[arg(long)]
  pub cluster_id: Option<String>,

  /// Project ID (<cluster>:<project>) of a project catalog
  #[arg(long)]
  pub project_id: Option<String>,

  /// Helm version recorded on every template
  #[arg(long)]
  pub helm_version: Option<String>,
}

impl CatalogArgs {
  fn scope(&self) -> Result<Option<CatalogScope>> {
    let Some(kind) = self.scope else {
      return Ok(None);
    };

    let scope = match kind {
      ScopeKind::Global => CatalogScope::Global,
      ScopeKind::Cluster => {
        let cluster_id = self.cluster_id.clone().context("--cluster-id is required for a cluster catalog")?;
        CatalogScope::Cluster {
          namespace: self.namespace.clone().unwrap_or_else(|| cluster_id.clone()),
          cluster_id,
        }
      }
      ScopeKind::Project => {
        let project_id = self.project_id.clone().context("--project-id is required for a project catalog")?;
        let namespace = match &self.namespace {
          Some(ns) => ns.clone(),
          None => match project_id.split_once(':') {
            Some((_, project)) => project.to_string(),
            None => bail!("invalid project ID {:?}, expected <cluster>:<project>", project_id),
          },
        };
        CatalogScope::Project { namespace, project_id }
      }
    };

    Ok(Some(scope))
  }
}

/// Load a persisted catalog, or define a new one from the flags.
pub fn resolve_catalog(store: &FsStatusStore, name: &str, repo: Option<&Path>, args: &CatalogArgs) -> Result<Catalog> {
  let mut catalog = store
    .load_catalog(name)
    .with_context(|| format!("Failed to load catalog {}", name))?
    .unwrap_or_else(|| {
      Catalog::new(CatalogSpec {
        name: name.to_string(),
        ..Default::default()
      })
    });

  if let Some(repo) = repo {
    catalog.spec.url = repo.display().to_string();
  }
  if let Some(scope) = args.scope()? {
    catalog.spec.scope = scope;
  }
  if let Some(helm_version) = &args.helm_version {
    catalog.spec.helm_version = helm_version.clone();
  }

  Ok(catalog)
}

/// Load a catalog that must already have been synced once.
pub fn load_catalog(store: &FsStatusStore, name: &str) -> Result<Option<Catalog>> {
  store
    .load_catalog(name)
    .with_context(|| format!("Failed to load catalog {}", name))
}
