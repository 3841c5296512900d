use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Owning catalog of a template. Exactly the fields of the catalog's scope are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateOwner {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub catalog_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cluster_catalog_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cluster_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub project_catalog_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub project_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateVersionSpec {
  pub version: String,
  #[serde(default)]
  pub compat_min: String,
  #[serde(default)]
  pub compat_max: String,
  #[serde(default)]
  pub required_namespace: String,
  #[serde(default)]
  pub kube_version: String,
  pub digest: String,
  pub external_id: String,
  /// Older version -> name of this version's template-version resource.
  #[serde(default)]
  pub upgrade_version_links: BTreeMap<String, String>,
  #[serde(default)]
  pub version_dir: String,
  #[serde(default)]
  pub version_name: String,
  #[serde(default)]
  pub version_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSpec {
  #[serde(default)]
  pub display_name: String,
  #[serde(default)]
  pub folder_name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub default_version: String,
  #[serde(default)]
  pub icon: String,
  #[serde(default)]
  pub icon_filename: String,
  #[serde(default)]
  pub project_url: String,
  #[serde(default)]
  pub categories: Vec<String>,
  #[serde(default)]
  pub versions: Vec<TemplateVersionSpec>,
  #[serde(flatten)]
  pub owner: TemplateOwner,
  #[serde(default)]
  pub helm_version: String,
}

/// Downstream representation of one package of a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateResource {
  pub namespace: String,
  pub name: String,
  #[serde(default)]
  pub labels: BTreeMap<String, String>,
  pub spec: TemplateSpec,
}

impl TemplateResource {
  /// Name of the template-version resource for `version`.
  pub fn version_resource_name(&self, version: &str) -> String {
    super::naming::template_version_name(&self.name, version)
  }

  pub fn version(&self, version: &str) -> Option<&TemplateVersionSpec> {
    self.spec.versions.iter().find(|v| v.version == version)
  }
}
