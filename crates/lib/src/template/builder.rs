//! Template assembly for a single package.

use tracing::debug;

use super::naming::{is_upgradeable, template_name, template_version_name};
use super::types::{TemplateResource, TemplateSpec, TemplateVersionSpec};
use crate::catalog::ScopeContext;
use crate::index::IconRef;
use crate::metadata::PackageMetadata;

/// Build the template resource of one package.
///
/// Versions keep the release order of the index. Each version records
/// upgrade links from every earlier-placed version that orders strictly
/// below it. Scope owner fields and labels are applied last.
pub fn build_template(
  ctx: &ScopeContext,
  helm_version: &str,
  metadata: &PackageMetadata,
  icon: &IconRef,
) -> TemplateResource {
  let folder = metadata.name.clone();
  let name = template_name(&ctx.catalog_name, &folder);

  let mut spec = TemplateSpec {
    display_name: folder.clone(),
    folder_name: folder.clone(),
    icon: icon.url.clone(),
    icon_filename: icon.filename.clone(),
    helm_version: helm_version.to_string(),
    ..Default::default()
  };

  if let Some(first) = metadata.releases.first() {
    spec.description = first.description.clone();
    spec.default_version = first.version.clone();
    spec.project_url = first.sources.first().cloned().unwrap_or_default();
  }

  let mut versions: Vec<TemplateVersionSpec> = Vec::with_capacity(metadata.releases.len());
  for release in &metadata.releases {
    let version = release.version.to_lowercase();

    let upgrade_version_links = versions
      .iter()
      .filter(|earlier| is_upgradeable(&earlier.version, &version))
      .map(|earlier| (earlier.version.clone(), template_version_name(&name, &version)))
      .collect();

    versions.push(TemplateVersionSpec {
      external_id: ctx.external_id(&folder, &version),
      version,
      compat_min: release.compat_min.clone(),
      compat_max: release.compat_max.clone(),
      required_namespace: release.required_namespace.clone(),
      kube_version: release.kube_version.clone(),
      digest: release.digest.clone(),
      upgrade_version_links,
      version_dir: release.storage_dir.clone(),
      version_name: release.storage_name.clone(),
      version_urls: release.storage_urls.clone(),
    });
  }

  spec.versions = versions;
  spec.categories = metadata.categories.iter().cloned().collect();
  spec.owner = ctx.owner.clone();

  let mut labels = metadata.labels.clone();
  labels.extend(ctx.labels.iter().map(|(k, v)| (k.clone(), v.clone())));

  debug!(template = %name, versions = spec.versions.len(), "built template");

  TemplateResource {
    namespace: ctx.namespace.clone(),
    name,
    labels,
    spec,
  }
}
