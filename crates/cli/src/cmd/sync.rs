//! Implementation of the `catsync sync` command.
//!
//! Syncs one catalog from a local chart repository into the file-backed
//! template store, holding the catalog's lock for the whole run.

use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::warn;

use catsync_lib::catalog_lock::CatalogLock;
use catsync_lib::index::FsChartSource;
use catsync_lib::platform::paths::templates_dir;
use catsync_lib::store::{FsStatusStore, FsTemplateStore};
use catsync_lib::sync::{CancelToken, SyncEngine, SyncError, SyncReport};

use super::{CatalogArgs, resolve_catalog};
use crate::output::{OutputFormat, print_json, print_sync_report, print_warning};

/// Exit code of a run that finished with invalid charts only.
const EXIT_SOFT_ERROR: u8 = 2;

pub fn cmd_sync(name: &str, repo: &Path, args: &CatalogArgs, format: OutputFormat) -> Result<ExitCode> {
  let _lock = CatalogLock::acquire(name, "sync").context("Failed to lock catalog")?;

  let mut status = FsStatusStore::default_store();
  let catalog = resolve_catalog(&status, name, Some(repo), args)?;
  let source = FsChartSource::new(repo);
  let mut templates = FsTemplateStore::new(templates_dir());

  let cancel = CancelToken::new();
  let worker_cancel = cancel.clone();
  let started = Instant::now();

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let mut handle = rt.spawn_blocking(move || {
    let mut catalog = catalog;
    SyncEngine::new(&source, &mut templates, &mut status)
      .with_cancel(worker_cancel)
      .run(&mut catalog)
  });

  let result = rt
    .block_on(async {
      tokio::select! {
        joined = &mut handle => joined,
        signal = tokio::signal::ctrl_c() => {
          if signal.is_ok() {
            warn!("interrupt received, cancelling sync");
            cancel.cancel();
          }
          handle.await
        }
      }
    })
    .context("Sync worker failed")?;

  let elapsed = started.elapsed();

  match result {
    Ok(report) => {
      print_report(&report, format, elapsed)?;
      Ok(ExitCode::SUCCESS)
    }
    Err(SyncError::Soft(soft)) => {
      print_report(&soft.report, format, elapsed)?;
      print_warning(&soft.message);
      Ok(ExitCode::from(EXIT_SOFT_ERROR))
    }
    Err(err) => {
      if let Some(report) = err.report() {
        print_report(report, format, elapsed)?;
      }
      Err(err).with_context(|| format!("Sync of catalog {} failed", name))
    }
  }
}

fn print_report(report: &SyncReport, format: OutputFormat, elapsed: std::time::Duration) -> Result<()> {
  if format.is_json() {
    return print_json(report);
  }
  print_sync_report(report, elapsed);
  Ok(())
}
