//! End-to-end sync behavior against in-memory collaborators.

use catsync_lib::catalog::{ConditionReason, ConditionState};
use catsync_lib::consts::{GLOBAL_NAMESPACE, SYNCING_MESSAGE};
use catsync_lib::index::{ChartFile, ChartRelease, ChartSource, IconRef, IndexSnapshot, MemoryChartSource, SourceError};
use catsync_lib::store::StoreCall;
use catsync_lib::sync::{CancelToken, SyncError, SyncOutcome};

use super::common::{CATALOG, Harness};

fn three_packages(commit: &str) -> IndexSnapshot {
  IndexSnapshot::new(commit)
    .with_release("nginx", "1.1.0", "n2")
    .with_release("nginx", "1.0.0", "n1")
    .with_release("redis", "6.0.0", "r1")
    .with_release("mysql", "8.0.0", "m1")
}

#[test]
fn nginx_end_to_end() {
  let mut h = Harness::new();

  let report = h
    .sync_index(IndexSnapshot::new("c1").with_release("nginx", "1.0.0", "a"))
    .unwrap();

  assert_eq!(report.created, ["mycatalog-nginx"]);
  assert_eq!(
    h.templates.writes(),
    [StoreCall::Create {
      namespace: GLOBAL_NAMESPACE.to_string(),
      name: "mycatalog-nginx".to_string(),
    }]
  );

  let snapshot = &h.catalog.status.version_commits;
  assert_eq!(snapshot.len(), 1);
  assert_eq!(snapshot.get("nginx").unwrap()["1.0.0"], "a");
  assert!(h.catalog.is_refreshed());
  assert_eq!(h.catalog.status.commit, "c1");

  let template = h.templates.template(GLOBAL_NAMESPACE, "mycatalog-nginx").unwrap();
  assert_eq!(template.spec.owner.catalog_id.as_deref(), Some(CATALOG));
  assert_eq!(template.spec.helm_version, "v3");
  assert_eq!(
    template.spec.versions[0].external_id,
    "catalog://?catalog=mycatalog&template=nginx&version=1.0.0"
  );
}

#[test]
fn status_is_saved_at_start_and_end() {
  let mut h = Harness::new();
  h.sync_index(three_packages("c1")).unwrap();

  let saves = h.status.saves();
  assert_eq!(saves.len(), 2);
  let marker = saves[0].status.refreshed.as_ref().unwrap();
  assert_eq!(marker.state, ConditionState::Unknown);
  assert_eq!(marker.message, SYNCING_MESSAGE);
  assert_eq!(saves[1].condition_state(), Some(ConditionState::True));
}

#[test]
fn second_run_on_same_index_writes_nothing() {
  let mut h = Harness::new();
  h.sync_index(three_packages("c1")).unwrap();
  let status_before = h.catalog.status.clone();
  let saves_before = h.status.saves().len();
  h.templates.clear_calls();

  let report = h.sync_index(three_packages("c1")).unwrap();

  assert_eq!(report.outcome, SyncOutcome::UpToDate);
  assert!(h.templates.calls().is_empty());
  assert_eq!(h.status.saves().len(), saves_before);
  assert_eq!(h.catalog.status, status_before);
}

#[test]
fn new_commit_with_same_content_skips_every_package() {
  let mut h = Harness::new();
  h.sync_index(three_packages("c1")).unwrap();
  h.templates.clear_calls();

  let report = h.sync_index(three_packages("c2")).unwrap();

  assert_eq!(report.outcome, SyncOutcome::Synced);
  assert_eq!(report.skipped, 3);
  assert!(h.templates.writes().is_empty());
  assert_eq!(h.catalog.status.commit, "c2");
  assert_eq!(h.snapshot_packages(), ["mysql", "nginx", "redis"]);
}

#[test]
fn digest_change_updates_only_that_package() {
  let mut h = Harness::new();
  h.sync_index(three_packages("c1")).unwrap();
  h.templates.clear_calls();

  let index = IndexSnapshot::new("c2")
    .with_release("nginx", "1.1.0", "n2")
    .with_release("nginx", "1.0.0", "n1-rebuilt")
    .with_release("redis", "6.0.0", "r1")
    .with_release("mysql", "8.0.0", "m1");
  let report = h.sync_index(index).unwrap();

  assert_eq!(report.updated, ["mycatalog-nginx"]);
  assert!(report.created.is_empty());
  let writes = h.templates.writes();
  assert_eq!(writes.len(), 1);
  assert_eq!(writes[0].name(), "mycatalog-nginx");
  assert_eq!(
    h.catalog.status.version_commits.get("nginx").unwrap()["1.0.0"],
    "n1-rebuilt"
  );
}

#[test]
fn removed_version_updates_package() {
  let mut h = Harness::new();
  h.sync_index(three_packages("c1")).unwrap();

  let index = IndexSnapshot::new("c2")
    .with_release("nginx", "1.1.0", "n2")
    .with_release("redis", "6.0.0", "r1")
    .with_release("mysql", "8.0.0", "m1");
  let report = h.sync_index(index).unwrap();

  assert_eq!(report.updated, ["mycatalog-nginx"]);
  let template = h.templates.template(GLOBAL_NAMESPACE, "mycatalog-nginx").unwrap();
  assert_eq!(template.spec.versions.len(), 1);
}

#[test]
fn removed_package_is_deleted_once() {
  let mut h = Harness::new();
  h.sync_index(three_packages("c1")).unwrap();
  h.templates.clear_calls();

  let index = IndexSnapshot::new("c2")
    .with_release("nginx", "1.1.0", "n2")
    .with_release("nginx", "1.0.0", "n1")
    .with_release("mysql", "8.0.0", "m1");
  let report = h.sync_index(index).unwrap();

  assert_eq!(report.deleted, ["mycatalog-redis"]);
  assert_eq!(
    h.templates.writes(),
    [StoreCall::Delete {
      namespace: GLOBAL_NAMESPACE.to_string(),
      name: "mycatalog-redis".to_string(),
    }]
  );
  assert!(!h.catalog.status.version_commits.contains("redis"));
  assert!(h.templates.template(GLOBAL_NAMESPACE, "mycatalog-redis").is_none());
}

#[test]
fn update_failure_is_contained() {
  let mut h = Harness::new();
  h.sync_index(
    IndexSnapshot::new("c1")
      .with_release("alpha", "1.0.0", "a1")
      .with_release("beta", "1.0.0", "b1"),
  )
  .unwrap();

  h.templates.fail_writes_for("mycatalog-alpha");
  let err = h
    .sync_index(
      IndexSnapshot::new("c2")
        .with_release("alpha", "1.0.0", "a2")
        .with_release("beta", "1.0.0", "b2"),
    )
    .unwrap_err();

  let SyncError::Hard(hard) = err else {
    panic!("expected a hard error");
  };
  assert!(hard.message.contains("mycatalog-alpha"));
  assert!(!hard.message.contains("mycatalog-beta"));
  assert_eq!(hard.report.updated, ["mycatalog-beta"]);
  assert_eq!(hard.report.failed, ["alpha"]);

  let status = &h.catalog.status;
  assert_eq!(h.snapshot_packages(), ["beta"]);
  assert_eq!(status.version_commits.get("beta").unwrap()["1.0.0"], "b2");
  let condition = status.refreshed.as_ref().unwrap();
  assert_eq!(condition.state, ConditionState::False);
  assert_eq!(condition.reason, Some(ConditionReason::Error));
  assert!(condition.message.contains("mycatalog-alpha"));
  assert_eq!(h.status.last().unwrap().status.commit, "");
}

#[test]
fn create_failure_resets_commit_and_recovers() {
  let mut h = Harness::new();
  h.templates.fail_writes_for("mycatalog-redis");

  let err = h.sync_index(three_packages("c1")).unwrap_err();
  assert!(err.is_retryable());
  assert_eq!(h.catalog.status.commit, "");
  assert_eq!(h.snapshot_packages(), ["mysql", "nginx"]);

  // Same commit again: the reset commit forces a new traversal, and only the
  // failed package is written.
  h.templates.clear_failures();
  let report = h.sync_index(three_packages("c1")).unwrap();

  assert_eq!(report.created, ["mycatalog-redis"]);
  assert_eq!(report.skipped, 2);
  assert!(h.catalog.is_refreshed());
  assert_eq!(h.catalog.status.commit, "c1");
}

#[test]
fn invalid_entry_is_a_soft_error() {
  let mut h = Harness::new();
  let index = IndexSnapshot::new("c1")
    .with_release("nginx", "1.0.0", "a")
    .with_release("broken", "1.0.0", "");

  let err = h.sync_index(index).unwrap_err();

  assert!(err.is_soft());
  assert!(!err.is_retryable());
  assert_eq!(err.report().unwrap().created, ["mycatalog-nginx"]);

  let condition = h.catalog.status.refreshed.as_ref().unwrap();
  assert_eq!(condition.state, ConditionState::False);
  assert_eq!(condition.reason, Some(ConditionReason::InvalidCharts));
  assert!(condition.message.starts_with("Error in chart(s): "));
  assert!(condition.message.contains("broken"));
  assert_eq!(h.catalog.status.commit, "c1");
  assert_eq!(h.snapshot_packages(), ["nginx"]);
}

#[test]
fn fixed_upstream_data_clears_soft_error() {
  let mut h = Harness::new();
  let _ = h.sync_index(
    IndexSnapshot::new("c1")
      .with_release("nginx", "1.0.0", "a")
      .with_release("broken", "1.0.0", ""),
  );

  let report = h
    .sync_index(
      IndexSnapshot::new("c2")
        .with_release("nginx", "1.0.0", "a")
        .with_release("broken", "1.0.0", "fixed"),
    )
    .unwrap();

  assert_eq!(report.created, ["mycatalog-broken"]);
  assert_eq!(report.skipped, 1);
  assert!(h.catalog.is_refreshed());
}

#[test]
fn descriptor_parse_failure_is_soft_and_still_publishes() {
  let mut h = Harness::new();
  let source = MemoryChartSource::new(IndexSnapshot::new("c1").with_release("nginx", "1.0.0", "a"))
    .with_file("nginx", "1.0.0", "catalog.yml", "categories: [unterminated");

  let err = h.sync(&source).unwrap_err();

  assert!(err.is_soft());
  assert!(h.templates.template(GLOBAL_NAMESPACE, "mycatalog-nginx").is_some());
  assert!(h.catalog.status.version_commits.contains("nginx"));
}

#[test]
fn descriptor_fields_reach_the_template() {
  let mut h = Harness::new();
  let source = MemoryChartSource::new(IndexSnapshot::new("c1").with_release("nginx", "1.0.0", "a")).with_file(
    "nginx",
    "1.0.0",
    "questions.yml",
    "rancher_min_version: 2.5\nnamespace: ingress\ncategories: [web, proxy]\nlabels:\n  tier: edge\n",
  );

  h.sync(&source).unwrap();

  let template = h.templates.template(GLOBAL_NAMESPACE, "mycatalog-nginx").unwrap();
  assert_eq!(template.spec.categories, ["proxy", "web"]);
  assert_eq!(template.labels.get("tier").map(String::as_str), Some("edge"));
  let version = &template.spec.versions[0];
  assert_eq!(version.compat_min, "2.5");
  assert_eq!(version.required_namespace, "ingress");
}

#[test]
fn upgrade_links_follow_index_order() {
  let mut h = Harness::new();
  h.sync_index(
    IndexSnapshot::new("c1")
      .with_release("app", "1.0.0", "a")
      .with_release("app", "1.1.0", "b")
      .with_release("app", "2.0.0", "c"),
  )
  .unwrap();

  let template = h.templates.template(GLOBAL_NAMESPACE, "mycatalog-app").unwrap();
  let v110 = template.version("1.1.0").unwrap();
  assert_eq!(v110.upgrade_version_links.len(), 1);
  assert_eq!(v110.upgrade_version_links["1.0.0"], "mycatalog-app-1.1.0");

  let v200 = template.version("2.0.0").unwrap();
  let from: Vec<_> = v200.upgrade_version_links.keys().cloned().collect();
  assert_eq!(from, ["1.0.0", "1.1.0"]);
  assert!(template.version("1.0.0").unwrap().upgrade_version_links.is_empty());
}

/// Cancels its token once the first package's files are read.
struct CancellingSource {
  inner: MemoryChartSource,
  token: CancelToken,
}

impl ChartSource for CancellingSource {
  fn load_index(&self) -> Result<IndexSnapshot, SourceError> {
    self.inner.load_index()
  }

  fn fetch_local_files(&self, release: &ChartRelease) -> Result<Vec<ChartFile>, SourceError> {
    self.token.cancel();
    self.inner.fetch_local_files(release)
  }

  fn icon(&self, releases: &[ChartRelease]) -> Result<IconRef, SourceError> {
    self.inner.icon(releases)
  }
}

#[test]
fn cancellation_mid_run_never_persists_true() {
  let mut h = Harness::new();
  let token = CancelToken::new();
  let source = CancellingSource {
    inner: MemoryChartSource::new(three_packages("c1")),
    token: token.clone(),
  };

  let err = h.sync_cancelled(&source, token).unwrap_err();

  assert!(matches!(err, SyncError::Cancelled(_)));
  assert_eq!(h.templates.writes().len(), 1);
  assert!(h.status.saves().iter().all(|c| !c.is_refreshed()));
  assert!(h.catalog.status.version_commits.is_empty());

  // An uncancelled run afterwards converges.
  let report = h.sync_index(three_packages("c1")).unwrap();
  assert_eq!(report.updated.len() + report.created.len(), 3);
  assert!(h.catalog.is_refreshed());
}
