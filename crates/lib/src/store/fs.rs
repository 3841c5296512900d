//! File-backed template store.
//!
//! # Storage Layout
//!
//! ```text
//! {root}/
//! ├── templates/<namespace>/<name>.json
//! └── template-versions/<namespace>/<name>/<name>-<version>.json
//! ```
//!
//! Every version of a template is also written as its own resource, named
//! the way upgrade links refer to it.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{StoreError, TemplateStore, read_json, write_json_atomic};
use crate::template::{TemplateResource, TemplateVersionSpec};
use crate::util::path::is_path_component;

const TEMPLATES_DIR: &str = "templates";
const VERSIONS_DIR: &str = "template-versions";

/// One version of a template, stored as a standalone resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateVersionResource {
  pub namespace: String,
  pub name: String,
  pub template_name: String,
  pub spec: TemplateVersionSpec,
}

#[derive(Debug, Clone)]
pub struct FsTemplateStore {
  root: PathBuf,
}

impl FsTemplateStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  fn template_path(&self, namespace: &str, name: &str) -> Result<PathBuf, StoreError> {
    check_name(namespace, name)?;
    Ok(self.root.join(TEMPLATES_DIR).join(namespace).join(format!("{}.json", name)))
  }

  fn versions_dir(&self, namespace: &str, name: &str) -> Result<PathBuf, StoreError> {
    check_name(namespace, name)?;
    Ok(self.root.join(VERSIONS_DIR).join(namespace).join(name))
  }

  /// List all templates of a namespace, sorted by name.
  pub fn list_templates(&self, namespace: &str) -> Result<Vec<TemplateResource>, StoreError> {
    if !is_path_component(namespace) {
      return Err(StoreError::InvalidName {
        namespace: namespace.to_string(),
        name: String::new(),
      });
    }
    let dir = self.root.join(TEMPLATES_DIR).join(namespace);
    let mut paths = match fs::read_dir(&dir) {
      Ok(entries) => entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect::<Vec<_>>(),
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(source) => return Err(StoreError::Read { path: dir, source }),
    };
    paths.sort();

    let mut templates = Vec::with_capacity(paths.len());
    for path in paths {
      if let Some(template) = read_json(&path)? {
        templates.push(template);
      }
    }
    Ok(templates)
  }

  /// List the version resources of a template, sorted by resource name.
  pub fn list_versions(&self, namespace: &str, name: &str) -> Result<Vec<TemplateVersionResource>, StoreError> {
    let dir = self.versions_dir(namespace, name)?;
    let mut paths = match fs::read_dir(&dir) {
      Ok(entries) => entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect::<Vec<_>>(),
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(source) => return Err(StoreError::Read { path: dir, source }),
    };
    paths.sort();

    let mut versions = Vec::with_capacity(paths.len());
    for path in paths {
      if let Some(version) = read_json(&path)? {
        versions.push(version);
      }
    }
    Ok(versions)
  }

  fn write_versions(&self, template: &TemplateResource) -> Result<BTreeSet<String>, StoreError> {
    let dir = self.versions_dir(&template.namespace, &template.name)?;

    let resources = template
      .spec
      .versions
      .iter()
      .map(|spec| {
        let resource = TemplateVersionResource {
          namespace: template.namespace.clone(),
          name: template.version_resource_name(&spec.version),
          template_name: template.name.clone(),
          spec: spec.clone(),
        };
        check_name(&resource.namespace, &resource.name).map(|()| resource)
      })
      .collect::<Result<Vec<_>, _>>()?;

    let mut written = BTreeSet::new();
    for resource in &resources {
      let file = format!("{}.json", resource.name);
      write_json_atomic(&dir.join(&file), resource)?;
      written.insert(file);
    }

    Ok(written)
  }
}

/// Names become path components, so anything that could leave the store
/// root is refused.
fn check_name(namespace: &str, name: &str) -> Result<(), StoreError> {
  if is_path_component(namespace) && is_path_component(name) {
    return Ok(());
  }
  Err(StoreError::InvalidName {
    namespace: namespace.to_string(),
    name: name.to_string(),
  })
}

impl TemplateStore for FsTemplateStore {
  fn get_template(&self, namespace: &str, name: &str) -> Result<TemplateResource, StoreError> {
    read_json(&self.template_path(namespace, name)?)?.ok_or_else(|| StoreError::not_found(namespace, name))
  }

  fn create_template(&mut self, template: &TemplateResource) -> Result<(), StoreError> {
    let path = self.template_path(&template.namespace, &template.name)?;
    if path.exists() {
      return Err(StoreError::AlreadyExists {
        namespace: template.namespace.clone(),
        name: template.name.clone(),
      });
    }

    self.write_versions(template)?;
    write_json_atomic(&path, template)?;
    debug!(path = %path.display(), "created template");
    Ok(())
  }

  fn update_template(&mut self, existing: &TemplateResource, template: &TemplateResource) -> Result<(), StoreError> {
    let path = self.template_path(&existing.namespace, &existing.name)?;
    if !path.exists() {
      return Err(StoreError::not_found(&existing.namespace, &existing.name));
    }

    let written = self.write_versions(template)?;

    let dir = self.versions_dir(&template.namespace, &template.name)?;
    for stale in self.list_versions(&template.namespace, &template.name)? {
      let file = format!("{}.json", stale.name);
      if !written.contains(&file) {
        let stale_path = dir.join(&file);
        fs::remove_file(&stale_path).map_err(|source| StoreError::Write {
          path: stale_path.clone(),
          source,
        })?;
        debug!(version = %stale.name, "removed stale template version");
      }
    }

    write_json_atomic(&path, template)?;
    debug!(path = %path.display(), "updated template");
    Ok(())
  }

  fn delete_template(&mut self, name: &str, namespace: &str) -> Result<(), StoreError> {
    let path = self.template_path(namespace, name)?;
    match fs::remove_file(&path) {
      Ok(()) => {}
      Err(e) if e.kind() == io::ErrorKind::NotFound => {}
      Err(source) => return Err(StoreError::Write { path, source }),
    }

    let dir = self.versions_dir(namespace, name)?;
    match fs::remove_dir_all(&dir) {
      Ok(()) => {}
      Err(e) if e.kind() == io::ErrorKind::NotFound => {}
      Err(source) => return Err(StoreError::Write { path: dir, source }),
    }

    debug!(namespace, name, "deleted template");
    Ok(())
  }
}
