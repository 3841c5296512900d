//! The sync run itself.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use super::diff::{next_snapshot, plan_sync};
use super::status::{RunSummary, StatusTracker};
use super::types::{CancelToken, SyncError, SyncOutcome, SyncReport};
use crate::catalog::{Catalog, ScopeContext};
use crate::index::ChartSource;
use crate::metadata::extract_package;
use crate::store::{StatusStore, TemplateStore};
use crate::template::{build_template, template_name};

/// Drives one sync of a catalog against its collaborators.
///
/// The engine borrows everything it talks to and keeps only per-run state,
/// so the same stores can serve many catalogs one after another.
pub struct SyncEngine<'a, S: ?Sized, T: ?Sized, P: ?Sized> {
  source: &'a S,
  templates: &'a mut T,
  status: &'a mut P,
  cancel: CancelToken,
}

impl<'a, S, T, P> SyncEngine<'a, S, T, P>
where
  S: ChartSource + ?Sized,
  T: TemplateStore + ?Sized,
  P: StatusStore + ?Sized,
{
  pub fn new(source: &'a S, templates: &'a mut T, status: &'a mut P) -> Self {
    Self {
      source,
      templates,
      status,
      cancel: CancelToken::new(),
    }
  }

  pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
    self.cancel = cancel;
    self
  }

  fn check_cancelled(&self, catalog: &Catalog) -> Result<(), SyncError> {
    if self.cancel.is_cancelled() {
      warn!(catalog = %catalog.name(), "sync cancelled");
      return Err(SyncError::Cancelled(catalog.name().to_string()));
    }
    Ok(())
  }

  fn delete(&mut self, namespace: &str, name: &str) -> Result<(), SyncError> {
    debug!(template = %name, namespace = %namespace, "deleting template");
    self
      .templates
      .delete_template(name, namespace)
      .map_err(|source| SyncError::Delete {
        namespace: namespace.to_string(),
        name: name.to_string(),
        source,
      })
  }

  /// Sync `catalog` and update its status in place.
  ///
  /// On success the status store holds a `True` condition with the index
  /// commit. Create and update failures are collected and reported as
  /// [`SyncError::Hard`]; invalid index data as [`SyncError::Soft`]. Any
  /// other error aborts the run with the status left as it was after the
  /// syncing marker.
  pub fn run(&mut self, catalog: &mut Catalog) -> Result<SyncReport, SyncError> {
    let ctx = ScopeContext::resolve(&catalog.spec)?;
    let index = self.source.load_index().map_err(SyncError::Index)?;

    info!(
      catalog = %catalog.name(),
      commit = %index.commit,
      packages = index.package_count(),
      "starting catalog sync"
    );

    let plan = plan_sync(catalog, &index);
    if plan.up_to_date {
      info!(catalog = %catalog.name(), commit = %index.commit, "catalog already up to date");
      return Ok(SyncReport::new(catalog.name(), index.commit, SyncOutcome::UpToDate));
    }

    StatusTracker::new(&mut *self.status).begin(catalog)?;

    let mut report = SyncReport::new(catalog.name(), index.commit.clone(), SyncOutcome::Synced);
    let mut failed = HashSet::new();
    let mut create_errors = Vec::new();
    let mut update_errors = Vec::new();
    let mut invalid: Vec<String> = plan.invalid.iter().map(|e| e.to_string()).collect();

    if let Some(relocation) = &plan.relocation {
      self.check_cancelled(catalog)?;
      info!(
        catalog = %catalog.name(),
        from = %relocation.namespace,
        to = %ctx.namespace,
        "catalog scope changed, removing templates from previous namespace"
      );
      for package in &relocation.packages {
        let name = template_name(catalog.name(), package);
        self.delete(&relocation.namespace, &name)?;
        report.deleted.push(name);
      }
    }

    for entry in &plan.packages {
      self.check_cancelled(catalog)?;

      if !entry.change.needs_apply() {
        debug!(package = %entry.package, "package unchanged, skipping");
        report.skipped += 1;
        continue;
      }

      let Some(releases) = index.entries.get(&entry.package) else {
        continue;
      };

      let metadata = extract_package(self.source, &entry.package, releases).map_err(|source| SyncError::Fetch {
        package: entry.package.clone(),
        source,
      })?;
      invalid.extend(metadata.errors.iter().map(|e| e.to_string()));

      let icon = self.source.icon(releases).map_err(|source| SyncError::Icon {
        package: entry.package.clone(),
        source,
      })?;

      let template = build_template(&ctx, &catalog.spec.helm_version, &metadata, &icon);

      match self.templates.get_template(&template.namespace, &template.name) {
        Ok(existing) => match self.templates.update_template(&existing, &template) {
          Ok(()) => {
            debug!(template = %template.name, change = ?entry.change, "updated template");
            report.updated.push(template.name);
          }
          Err(e) => {
            warn!(template = %template.name, error = %e, "failed to update template");
            update_errors.push(format!("{}: {}", template.name, e));
            failed.insert(entry.package.clone());
          }
        },
        Err(e) if e.is_not_found() => match self.templates.create_template(&template) {
          Ok(()) => {
            debug!(template = %template.name, "created template");
            report.created.push(template.name);
          }
          Err(e) => {
            warn!(template = %template.name, error = %e, "failed to create template");
            create_errors.push(format!("{}: {}", template.name, e));
            failed.insert(entry.package.clone());
          }
        },
        Err(source) => {
          return Err(SyncError::Lookup {
            namespace: template.namespace,
            name: template.name,
            source,
          });
        }
      }
    }

    self.check_cancelled(catalog)?;

    for package in &plan.deletes {
      let name = template_name(catalog.name(), package);
      self.delete(&ctx.namespace, &name)?;
      report.deleted.push(name);
    }

    report.failed = plan
      .packages
      .iter()
      .filter(|p| failed.contains(&p.package))
      .map(|p| p.package.clone())
      .chain(plan.invalid.iter().map(|e| e.package.clone()))
      .collect();

    info!(
      catalog = %catalog.name(),
      created = report.created.len(),
      updated = report.updated.len(),
      deleted = report.deleted.len(),
      failed = report.failed.len(),
      skipped = report.skipped,
      "catalog sync done"
    );

    let summary = RunSummary {
      commit: index.commit.clone(),
      snapshot: next_snapshot(&index, &plan, &failed),
      create_errors,
      update_errors,
      invalid,
      report,
    };

    StatusTracker::new(&mut *self.status).finish(catalog, summary)
  }
}

/// Sync `catalog` once with no cancellation.
pub fn sync_catalog<S, T, P>(
  catalog: &mut Catalog,
  source: &S,
  templates: &mut T,
  status: &mut P,
) -> Result<SyncReport, SyncError>
where
  S: ChartSource + ?Sized,
  T: TemplateStore + ?Sized,
  P: StatusStore + ?Sized,
{
  SyncEngine::new(source, templates, status).run(catalog)
}
