//! Per-run resolution of a catalog's scope.
//!
//! The scope decides the template namespace, the external-ID format, the
//! owner fields and the extra labels of every template. It is resolved once
//! at the start of a run so nothing downstream branches on it again.

use std::collections::BTreeMap;

use thiserror::Error;

use super::types::{CatalogScope, CatalogSpec};
use crate::consts::GLOBAL_NAMESPACE;
use crate::template::TemplateOwner;
use crate::util::path::is_path_component;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScopeError {
  #[error("catalog is no longer available")]
  MissingCatalog,

  #[error("cluster catalog {0} is missing its cluster or namespace")]
  InvalidCluster(String),

  #[error("project ID {0:?} is invalid, expected <cluster>:<project>")]
  InvalidProjectId(String),

  #[error("namespace {0:?} is not a valid name")]
  InvalidNamespace(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeContext {
  pub catalog_name: String,
  pub scope: CatalogScope,
  /// Namespace every template of the catalog is written to.
  pub namespace: String,
  pub owner: TemplateOwner,
  /// Labels added to every template, after descriptor labels.
  pub labels: BTreeMap<String, String>,
}

impl ScopeContext {
  pub fn resolve(spec: &CatalogSpec) -> Result<Self, ScopeError> {
    let name = spec.name.clone();
    if name.is_empty() {
      return Err(ScopeError::MissingCatalog);
    }

    let mut labels = BTreeMap::new();
    let (namespace, owner) = match &spec.scope {
      CatalogScope::Global => (
        GLOBAL_NAMESPACE.to_string(),
        TemplateOwner {
          catalog_id: Some(name.clone()),
          ..Default::default()
        },
      ),
      CatalogScope::Cluster { namespace, cluster_id } => {
        if namespace.is_empty() || cluster_id.is_empty() {
          return Err(ScopeError::InvalidCluster(name));
        }
        labels.insert(format!("{}-{}", cluster_id, name), name.clone());
        (
          namespace.clone(),
          TemplateOwner {
            cluster_catalog_id: Some(format!("{}:{}", namespace, name)),
            cluster_id: Some(cluster_id.clone()),
            ..Default::default()
          },
        )
      }
      CatalogScope::Project { namespace, project_id } => {
        let cluster = match project_id.split_once(':') {
          Some((cluster, project)) if !cluster.is_empty() && !project.is_empty() => cluster,
          _ => return Err(ScopeError::InvalidProjectId(project_id.clone())),
        };
        labels.insert(format!("{}-{}-{}", cluster, namespace, name), name.clone());
        (
          namespace.clone(),
          TemplateOwner {
            project_catalog_id: Some(format!("{}:{}", namespace, name)),
            project_id: Some(project_id.clone()),
            ..Default::default()
          },
        )
      }
    };

    if !is_path_component(&namespace) {
      return Err(ScopeError::InvalidNamespace(namespace));
    }

    Ok(Self {
      catalog_name: name,
      scope: spec.scope.clone(),
      namespace,
      owner,
      labels,
    })
  }

  /// Reference string downstream consumers use to locate one template version.
  pub fn external_id(&self, folder: &str, version: &str) -> String {
    match self.scope {
      CatalogScope::Global => format!(
        "catalog://?catalog={}&template={}&version={}",
        self.catalog_name, folder, version
      ),
      _ => format!(
        "catalog://?catalog={}/{}&type={}&template={}&version={}",
        self.namespace,
        self.catalog_name,
        self.scope.type_name(),
        folder,
        version
      ),
    }
  }
}
