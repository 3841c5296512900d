//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

pub const INDEX: &str = r#"
apiVersion: v1
entries:
  nginx:
    - name: nginx
      version: 1.1.0
      digest: n2
      description: Web server
    - name: nginx
      version: 1.0.0
      digest: n1
  redis:
    - name: redis
      version: 6.0.0
      digest: r1
"#;

/// Isolated test environment.
///
/// Each test gets its own data directory and chart repository.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// A repository with the default index and files for every release.
  pub fn new() -> Self {
    let env = Self::empty();
    env.write_index(INDEX);
    env.write_repo_file("nginx/1.1.0/catalog.yml", "categories: [web]\n");
    env.write_repo_file("nginx/1.0.0/Chart.yaml", "name: nginx\n");
    env.write_repo_file("redis/6.0.0/Chart.yaml", "name: redis\n");
    env
  }

  pub fn empty() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn write_repo_file(&self, relative_path: &str, content: &str) {
    let path = self.repo_path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn write_index(&self, content: &str) {
    self.write_repo_file("index.yaml", content);
  }

  /// Chart repository root.
  pub fn repo_path(&self) -> PathBuf {
    let p = self.temp.path().join("repo");
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  /// Data directory for catalogs, templates and locks.
  pub fn data_path(&self) -> PathBuf {
    let p = self.temp.path().join("data");
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  pub fn template_path(&self, namespace: &str, name: &str) -> PathBuf {
    self
      .data_path()
      .join("store")
      .join("templates")
      .join(namespace)
      .join(format!("{}.json", name))
  }

  /// Get a catsync command with isolated environment.
  pub fn cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("catsync");
    cmd.env("CATSYNC_DATA_DIR", self.data_path()).env_remove("RUST_LOG");
    cmd
  }

  /// `catsync sync <catalog> --repo <repo>` with extra args.
  pub fn sync_cmd(&self, catalog: &str) -> Command {
    let mut cmd = self.cmd();
    cmd.arg("sync").arg(catalog).arg("--repo").arg(self.repo_path());
    cmd
  }

  pub fn read_json(&self, path: &Path) -> serde_json::Value {
    let content = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&content).unwrap()
  }
}
