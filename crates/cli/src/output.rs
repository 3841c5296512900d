//! Terminal rendering of sync reports, plans and catalog status.
//!
//! Commands decide what to show; everything about how it looks lives here,
//! so text output stays uniform across commands.

use std::time::{Duration, UNIX_EPOCH};

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use catsync_lib::catalog::Catalog;
use catsync_lib::sync::{PackageChange, SyncPlan, SyncReport};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ADD: &str = "+";
  pub const MODIFY: &str = "~";
  pub const REMOVE: &str = "-";
}

pub fn truncate_hash(hash: &str) -> &str {
  let len = hash.len().min(12);
  &hash[..len]
}

/// Short form of an index commit, or a placeholder once it was reset.
pub fn display_commit(commit: &str) -> &str {
  if commit.is_empty() {
    "(none)"
  } else {
    truncate_hash(commit)
  }
}

pub fn format_timestamp(unix_secs: u64) -> String {
  humantime::format_rfc3339_seconds(UNIX_EPOCH + Duration::from_secs(unix_secs)).to_string()
}

/// Symbol and label of a planned package, `None` for packages hidden by default.
pub fn change_label(change: PackageChange, verbose: bool) -> Option<(&'static str, &'static str)> {
  match change {
    PackageChange::New => Some((symbols::ADD, "new")),
    PackageChange::Changed => Some((symbols::MODIFY, "changed")),
    PackageChange::Unapplied => Some((symbols::MODIFY, "not yet applied")),
    PackageChange::Reconfigured => Some((symbols::MODIFY, "scope or helm version changed")),
    PackageChange::Unchanged if verbose => Some((" ", "unchanged")),
    PackageChange::Unchanged => None,
  }
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  if secs >= 60 {
    let mins = secs / 60;
    let remaining_secs = secs % 60;
    format!("{}m {}s", mins, remaining_secs)
  } else if secs > 0 {
    format!("{}.{:02}s", secs, millis / 10)
  } else {
    format!("{}ms", millis)
  }
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

fn print_item(symbol: &str, name: &str, detail: &str) {
  println!(
    "  {} {} {}",
    symbol,
    name,
    format!("({})", detail).if_supports_color(Stream::Stdout, |s| s.dimmed())
  );
}

pub fn print_sync_report(report: &SyncReport, elapsed: Duration) {
  if report.is_up_to_date() {
    print_success(&format!(
      "Catalog {} is up to date (commit {})",
      report.catalog,
      display_commit(&report.commit)
    ));
    return;
  }

  let headline = format!("Synced catalog {} (commit {})", report.catalog, display_commit(&report.commit));
  if report.failed.is_empty() {
    print_success(&headline);
  } else {
    print_warning(&format!("{} with {} failed package(s)", headline, report.failed.len()));
  }
  print_stat("Created", &report.created.len().to_string());
  print_stat("Updated", &report.updated.len().to_string());
  print_stat("Deleted", &report.deleted.len().to_string());
  print_stat("Unchanged", &report.skipped.to_string());
  print_stat("Failed", &report.failed.len().to_string());
  print_stat("Duration", &format_duration(elapsed));
}

pub fn print_plan(plan: &SyncPlan, verbose: bool) {
  println!("Plan for catalog {} (commit {})", plan.catalog, display_commit(&plan.commit));

  if plan.up_to_date {
    print_info("Catalog is up to date, nothing to do");
    return;
  }

  if let Some(relocation) = &plan.relocation {
    print_warning(&format!(
      "Scope changed: {} template(s) will be removed from namespace {}",
      relocation.packages.len(),
      relocation.namespace
    ));
  }

  for entry in &plan.packages {
    if let Some((symbol, label)) = change_label(entry.change, verbose) {
      print_item(
        &symbol.if_supports_color(Stream::Stdout, |s| s.green()).to_string(),
        &entry.package,
        label,
      );
    }
  }
  for package in &plan.deletes {
    print_item(
      &symbols::REMOVE.if_supports_color(Stream::Stdout, |s| s.red()).to_string(),
      package,
      "delete",
    );
  }
  for invalid in &plan.invalid {
    print_item(
      &symbols::WARNING.if_supports_color(Stream::Stdout, |s| s.yellow()).to_string(),
      &invalid.package,
      &invalid.message,
    );
  }

  println!();
  print_stat("To apply", &plan.to_apply().count().to_string());
  print_stat("Unchanged", &plan.unchanged().to_string());
  print_stat("To delete", &plan.deletes.len().to_string());
  print_stat("Invalid", &plan.invalid.len().to_string());
}

/// One line per catalog with its refreshed state.
pub fn print_catalog_list(catalogs: &[Catalog]) {
  for catalog in catalogs {
    let state = catalog
      .condition_state()
      .map_or_else(|| "never synced".to_string(), |s| s.to_string());
    print_stat(catalog.name(), &state);
  }
}

pub fn print_catalog_status(catalog: &Catalog) {
  let status = &catalog.status;

  match &status.refreshed {
    Some(condition) if catalog.is_refreshed() => {
      print_success(&format!("Catalog {}: {}", catalog.name(), condition.state));
    }
    Some(condition) => {
      print_error(&format!("Catalog {}: {}", catalog.name(), condition.state));
      if !condition.message.is_empty() {
        print_stat("Message", &condition.message);
      }
      if let Some(reason) = condition.reason {
        print_stat("Reason", &format!("{:?}", reason));
      }
    }
    None => print_info(&format!("Catalog {}: never synced", catalog.name())),
  }

  print_stat("Scope", catalog.spec.scope.type_name());
  print_stat("Namespace", catalog.spec.scope.namespace());
  if !catalog.spec.url.is_empty() {
    print_stat("Repository", &catalog.spec.url);
  }
  print_stat("Commit", display_commit(&status.commit));
  print_stat("Packages", &status.version_commits.len().to_string());
  print_stat("Versions", &status.version_commits.version_count().to_string());
  print_stat("All updates applied", &status.all_updates_applied.to_string());
  if let Some(ts) = status.last_refresh_timestamp {
    print_stat("Last refresh", &format_timestamp(ts));
  }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
