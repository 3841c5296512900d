//! Sync runs against the file-backed source and stores.

use std::fs;
use std::path::Path;

use catsync_lib::catalog::CatalogScope;
use catsync_lib::consts::GLOBAL_NAMESPACE;
use catsync_lib::index::{FsChartSource, INDEX_FILENAME, IndexSnapshot, MemoryChartSource};
use catsync_lib::store::{FsStatusStore, FsTemplateStore};
use catsync_lib::sync::{SyncError, SyncOutcome, sync_catalog};
use tempfile::TempDir;

use super::common::catalog;

const INDEX_V1: &str = r#"
apiVersion: v1
entries:
  nginx:
    - name: nginx
      version: 1.1.0
      digest: n2
      description: Web server
      icon: https://example.com/nginx.png
      sources: [https://github.com/nginx/nginx]
    - name: nginx
      version: 1.0.0
      digest: n1
  redis:
    - name: redis
      version: 6.0.0
      digest: r1
"#;

const INDEX_V2: &str = r#"
apiVersion: v1
entries:
  nginx:
    - name: nginx
      version: 1.1.0
      digest: n2
    - name: nginx
      version: 1.0.0
      digest: n1
"#;

fn write(root: &Path, rel: &str, contents: &str) {
  let path = root.join(rel);
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  fs::write(path, contents).unwrap();
}

fn repo(index: &str) -> TempDir {
  let temp = TempDir::new().unwrap();
  write(temp.path(), INDEX_FILENAME, index);
  write(temp.path(), "nginx/1.1.0/Chart.yaml", "name: nginx\n");
  write(
    temp.path(),
    "nginx/1.1.0/catalog.yml",
    "categories: [web]\nrancher_max_version: 2.9.99\n",
  );
  write(temp.path(), "nginx/1.0.0/Chart.yaml", "name: nginx\n");
  write(temp.path(), "redis/6.0.0/questions.yaml", "namespace: cache\n");
  temp
}

#[test]
fn fs_sync_persists_templates_versions_and_status() {
  let repo = repo(INDEX_V1);
  let data = TempDir::new().unwrap();
  let source = FsChartSource::new(repo.path());
  let mut templates = FsTemplateStore::new(data.path().join("store"));
  let mut status = FsStatusStore::new(data.path().join("catalogs"));
  let mut catalog = catalog(CatalogScope::Global);

  let report = sync_catalog(&mut catalog, &source, &mut templates, &mut status).unwrap();
  assert_eq!(report.created, ["mycatalog-nginx", "mycatalog-redis"]);

  let stored = templates.list_templates(GLOBAL_NAMESPACE).unwrap();
  assert_eq!(stored.len(), 2);
  let nginx = &stored[0];
  assert_eq!(nginx.spec.description, "Web server");
  assert_eq!(nginx.spec.default_version, "1.1.0");
  assert_eq!(nginx.spec.icon_filename, "nginx.png");
  assert_eq!(nginx.spec.project_url, "https://github.com/nginx/nginx");
  assert_eq!(nginx.spec.categories, ["web"]);
  assert_eq!(nginx.spec.versions[0].compat_max, "2.9.99");
  assert_eq!(nginx.spec.versions[0].version_dir, "nginx/1.1.0");

  let versions = templates.list_versions(GLOBAL_NAMESPACE, "mycatalog-nginx").unwrap();
  let names: Vec<_> = versions.iter().map(|v| v.name.as_str()).collect();
  assert_eq!(names, ["mycatalog-nginx-1.0.0", "mycatalog-nginx-1.1.0"]);

  let loaded = status.load_catalog("mycatalog").unwrap().unwrap();
  assert_eq!(loaded, catalog);
  assert!(loaded.is_refreshed());
  assert_eq!(loaded.status.version_commits.version_count(), 3);
}

#[test]
fn fs_sync_is_idempotent_and_prunes() {
  let repo = repo(INDEX_V1);
  let data = TempDir::new().unwrap();
  let mut templates = FsTemplateStore::new(data.path().join("store"));
  let mut status = FsStatusStore::new(data.path().join("catalogs"));
  let mut catalog = catalog(CatalogScope::Global);

  sync_catalog(&mut catalog, &FsChartSource::new(repo.path()), &mut templates, &mut status).unwrap();

  // Reload from disk the way a fresh process would.
  let mut catalog = status.load_catalog("mycatalog").unwrap().unwrap();
  let again = sync_catalog(&mut catalog, &FsChartSource::new(repo.path()), &mut templates, &mut status).unwrap();
  assert_eq!(again.outcome, SyncOutcome::UpToDate);

  write(repo.path(), INDEX_FILENAME, INDEX_V2);
  let pruned = sync_catalog(&mut catalog, &FsChartSource::new(repo.path()), &mut templates, &mut status).unwrap();

  assert_eq!(pruned.deleted, ["mycatalog-redis"]);
  assert_eq!(pruned.skipped, 1);
  let names: Vec<_> = templates
    .list_templates(GLOBAL_NAMESPACE)
    .unwrap()
    .into_iter()
    .map(|t| t.name)
    .collect();
  assert_eq!(names, ["mycatalog-nginx"]);
  assert!(
    templates
      .list_versions(GLOBAL_NAMESPACE, "mycatalog-redis")
      .unwrap()
      .is_empty()
  );
}

#[test]
fn missing_release_files_abort_the_run() {
  let repo = repo(INDEX_V1);
  fs::remove_dir_all(repo.path().join("redis")).unwrap();
  let data = TempDir::new().unwrap();
  let mut templates = FsTemplateStore::new(data.path().join("store"));
  let mut status = FsStatusStore::new(data.path().join("catalogs"));
  let mut catalog = catalog(CatalogScope::Global);

  let err = sync_catalog(&mut catalog, &FsChartSource::new(repo.path()), &mut templates, &mut status).unwrap_err();

  assert!(err.to_string().contains("redis"));
  let saved = status.load_catalog("mycatalog").unwrap().unwrap();
  assert!(!saved.is_refreshed());
}

#[test]
fn versions_with_path_segments_never_leave_the_store() {
  let data = TempDir::new().unwrap();
  let root = data.path().join("store");
  let mut templates = FsTemplateStore::new(&root);
  let mut status = FsStatusStore::new(data.path().join("catalogs"));
  let mut catalog = catalog(CatalogScope::Global);

  let source = MemoryChartSource::new(
    IndexSnapshot::new("c1")
      .with_release("nginx", "1.0.0/../../../../../escaped", "a")
      .with_release("redis", "6.0.0", "r1"),
  );
  let err = sync_catalog(&mut catalog, &source, &mut templates, &mut status).unwrap_err();

  let SyncError::Soft(soft) = err else {
    panic!("expected a soft error");
  };
  assert!(soft.message.contains("nginx"));
  assert_eq!(soft.report.created, ["mycatalog-redis"]);
  assert!(!data.path().join("escaped.json").exists());
  let names: Vec<_> = templates
    .list_templates(GLOBAL_NAMESPACE)
    .unwrap()
    .into_iter()
    .map(|t| t.name)
    .collect();
  assert_eq!(names, ["mycatalog-redis"]);
}
