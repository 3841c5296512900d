//! Sync command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

const GLOBAL_NAMESPACE: &str = "cattle-global-data";

#[test]
fn sync_creates_templates_and_status() {
  let env = TestEnv::new();

  env
    .sync_cmd("library")
    .assert()
    .success()
    .stdout(predicate::str::contains("Synced catalog library"))
    .stdout(predicate::str::contains("Created: 2"));

  let template = env.read_json(&env.template_path(GLOBAL_NAMESPACE, "library-nginx"));
  assert_eq!(template["spec"]["defaultVersion"], "1.1.0");
  assert_eq!(template["spec"]["catalogId"], "library");

  let catalog = env.read_json(&env.data_path().join("catalogs").join("library.json"));
  assert_eq!(catalog["status"]["refreshed"]["state"], "True");
  assert_eq!(catalog["status"]["versionCommits"]["redis"]["6.0.0"], "r1");
}

#[test]
fn sync_is_idempotent() {
  let env = TestEnv::new();

  env.sync_cmd("library").assert().success();
  env
    .sync_cmd("library")
    .assert()
    .success()
    .stdout(predicate::str::contains("is up to date"));
}

#[test]
fn sync_prunes_removed_packages() {
  let env = TestEnv::new();
  env.sync_cmd("library").assert().success();

  env.write_index(
    r#"
entries:
  nginx:
    - name: nginx
      version: 1.1.0
      digest: n2
    - name: nginx
      version: 1.0.0
      digest: n1
"#,
  );

  env
    .sync_cmd("library")
    .assert()
    .success()
    .stdout(predicate::str::contains("Deleted: 1"));
  assert!(!env.template_path(GLOBAL_NAMESPACE, "library-redis").exists());
}

#[test]
fn invalid_chart_exits_with_soft_error_code() {
  let env = TestEnv::new();
  env.write_index(
    r#"
entries:
  nginx:
    - name: nginx
      version: 1.0.0
      digest: n1
  broken:
    - name: broken
      version: 1.0.0
"#,
  );

  env
    .sync_cmd("library")
    .assert()
    .code(2)
    .stderr(predicate::str::contains("Error in chart(s)"));
  assert!(env.template_path(GLOBAL_NAMESPACE, "library-nginx").exists());

  env
    .cmd()
    .args(["status", "library"])
    .assert()
    .success()
    .stdout(predicate::str::contains("InvalidCharts"));
}

#[test]
fn sync_json_output() {
  let env = TestEnv::new();

  let output = env.sync_cmd("library").args(["--output", "json"]).output().unwrap();
  assert!(output.status.success());

  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["catalog"], "library");
  assert_eq!(report["outcome"], "synced");
  assert_eq!(report["created"].as_array().unwrap().len(), 2);
}

#[test]
fn project_scope_sync_and_templates() {
  let env = TestEnv::new();

  env
    .sync_cmd("team")
    .args(["--scope", "project", "--project-id", "c-1:p-2"])
    .assert()
    .success();

  assert!(env.template_path("p-2", "team-nginx").exists());

  env
    .cmd()
    .args(["templates", "team"])
    .assert()
    .success()
    .stdout(predicate::str::contains("team-nginx"))
    .stdout(predicate::str::contains("namespace p-2"));
}

#[test]
fn status_after_sync() {
  let env = TestEnv::new();
  env.sync_cmd("library").args(["--helm-version", "v3"]).assert().success();

  env
    .cmd()
    .args(["status", "library"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Catalog library: True"))
    .stdout(predicate::str::contains("Packages: 2"))
    .stdout(predicate::str::contains("Versions: 3"));

  let output = env.cmd().args(["status", "library", "-o", "json"]).output().unwrap();
  let catalog: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(catalog["spec"]["helmVersion"], "v3");
}

#[test]
fn status_without_catalog_lists_all() {
  let env = TestEnv::new();
  env.sync_cmd("alpha").assert().success();
  env.sync_cmd("beta").assert().success();

  env
    .cmd()
    .arg("status")
    .assert()
    .success()
    .stdout(predicate::str::contains("alpha: True"))
    .stdout(predicate::str::contains("beta: True"));
}

#[test]
fn scope_and_helm_version_overrides_apply_to_synced_catalog() {
  let env = TestEnv::new();
  env.sync_cmd("library").assert().success();

  env
    .sync_cmd("library")
    .args(["--scope", "cluster", "--cluster-id", "c-abc", "--helm-version", "v2"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Deleted: 2"))
    .stdout(predicate::str::contains("Created: 2"));

  assert!(!env.template_path(GLOBAL_NAMESPACE, "library-nginx").exists());
  let template = env.read_json(&env.template_path("c-abc", "library-nginx"));
  assert_eq!(template["spec"]["helmVersion"], "v2");
  assert_eq!(template["spec"]["clusterId"], "c-abc");

  env
    .sync_cmd("library")
    .assert()
    .success()
    .stdout(predicate::str::contains("is up to date"));
}
