//! In-memory stores that record every call.
//!
//! Used by tests and by embedders that want to observe what a sync would
//! write. Failures can be injected per template name.

use std::collections::{BTreeMap, HashSet};

use super::{StatusStore, StoreError, TemplateStore};
use crate::catalog::Catalog;
use crate::template::TemplateResource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
  Get { namespace: String, name: String },
  Create { namespace: String, name: String },
  Update { namespace: String, name: String },
  Delete { namespace: String, name: String },
}

impl StoreCall {
  /// True for calls that change the store.
  pub fn is_write(&self) -> bool {
    !matches!(self, StoreCall::Get { .. })
  }

  pub fn name(&self) -> &str {
    match self {
      StoreCall::Get { name, .. }
      | StoreCall::Create { name, .. }
      | StoreCall::Update { name, .. }
      | StoreCall::Delete { name, .. } => name,
    }
  }
}

#[derive(Debug, Default)]
pub struct MemoryTemplateStore {
  templates: BTreeMap<(String, String), TemplateResource>,
  calls: std::cell::RefCell<Vec<StoreCall>>,
  failing_writes: HashSet<String>,
  failing_deletes: HashSet<String>,
  unreachable: bool,
}

impl MemoryTemplateStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Seed a template without recording a call.
  pub fn insert(&mut self, template: TemplateResource) {
    self
      .templates
      .insert((template.namespace.clone(), template.name.clone()), template);
  }

  pub fn template(&self, namespace: &str, name: &str) -> Option<&TemplateResource> {
    self.templates.get(&(namespace.to_string(), name.to_string()))
  }

  pub fn templates(&self) -> impl Iterator<Item = &TemplateResource> {
    self.templates.values()
  }

  pub fn len(&self) -> usize {
    self.templates.len()
  }

  pub fn is_empty(&self) -> bool {
    self.templates.is_empty()
  }

  pub fn calls(&self) -> Vec<StoreCall> {
    self.calls.borrow().clone()
  }

  /// Recorded create, update and delete calls.
  pub fn writes(&self) -> Vec<StoreCall> {
    self.calls.borrow().iter().filter(|c| c.is_write()).cloned().collect()
  }

  pub fn clear_calls(&mut self) {
    self.calls.borrow_mut().clear();
  }

  /// Make create and update of the named template fail.
  pub fn fail_writes_for(&mut self, name: &str) {
    self.failing_writes.insert(name.to_string());
  }

  pub fn fail_deletes_for(&mut self, name: &str) {
    self.failing_deletes.insert(name.to_string());
  }

  pub fn clear_failures(&mut self) {
    self.failing_writes.clear();
    self.failing_deletes.clear();
    self.unreachable = false;
  }

  /// Make every lookup fail with a non-NotFound error.
  pub fn set_unreachable(&mut self, unreachable: bool) {
    self.unreachable = unreachable;
  }

  fn record(&self, call: StoreCall) {
    self.calls.borrow_mut().push(call);
  }

  fn check_write(&self, template: &TemplateResource) -> Result<(), StoreError> {
    if self.failing_writes.contains(&template.name) {
      return Err(StoreError::Other(format!(
        "write of {}/{} rejected",
        template.namespace, template.name
      )));
    }
    Ok(())
  }
}

impl TemplateStore for MemoryTemplateStore {
  fn get_template(&self, namespace: &str, name: &str) -> Result<TemplateResource, StoreError> {
    self.record(StoreCall::Get {
      namespace: namespace.to_string(),
      name: name.to_string(),
    });
    if self.unreachable {
      return Err(StoreError::Other("store unreachable".to_string()));
    }
    self
      .template(namespace, name)
      .cloned()
      .ok_or_else(|| StoreError::not_found(namespace, name))
  }

  fn create_template(&mut self, template: &TemplateResource) -> Result<(), StoreError> {
    self.record(StoreCall::Create {
      namespace: template.namespace.clone(),
      name: template.name.clone(),
    });
    self.check_write(template)?;
    if self.template(&template.namespace, &template.name).is_some() {
      return Err(StoreError::AlreadyExists {
        namespace: template.namespace.clone(),
        name: template.name.clone(),
      });
    }
    self.insert(template.clone());
    Ok(())
  }

  fn update_template(&mut self, existing: &TemplateResource, template: &TemplateResource) -> Result<(), StoreError> {
    self.record(StoreCall::Update {
      namespace: existing.namespace.clone(),
      name: existing.name.clone(),
    });
    self.check_write(template)?;
    if self.template(&existing.namespace, &existing.name).is_none() {
      return Err(StoreError::not_found(&existing.namespace, &existing.name));
    }
    self.insert(template.clone());
    Ok(())
  }

  fn delete_template(&mut self, name: &str, namespace: &str) -> Result<(), StoreError> {
    self.record(StoreCall::Delete {
      namespace: namespace.to_string(),
      name: name.to_string(),
    });
    if self.failing_deletes.contains(name) {
      return Err(StoreError::Other(format!("delete of {}/{} rejected", namespace, name)));
    }
    self.templates.remove(&(namespace.to_string(), name.to_string()));
    Ok(())
  }
}

/// Records every saved catalog.
#[derive(Debug, Default)]
pub struct MemoryStatusStore {
  saved: Vec<Catalog>,
  fail: bool,
}

impl MemoryStatusStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn saves(&self) -> &[Catalog] {
    &self.saved
  }

  pub fn last(&self) -> Option<&Catalog> {
    self.saved.last()
  }

  pub fn set_failing(&mut self, fail: bool) {
    self.fail = fail;
  }
}

impl StatusStore for MemoryStatusStore {
  fn save_catalog_status(&mut self, catalog: &Catalog) -> Result<(), StoreError> {
    if self.fail {
      return Err(StoreError::Other("status store unavailable".to_string()));
    }
    self.saved.push(catalog.clone());
    Ok(())
  }
}
