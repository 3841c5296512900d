use crate::consts::{APP_NAME, DATA_DIR_ENV};
use std::path::PathBuf;

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  let userprofile = std::env::var("USERPROFILE").expect("USERPROFILE not set");
  PathBuf::from(userprofile)
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  let home = std::env::var("HOME").expect("HOME not set");
  PathBuf::from(home)
}

/// Returns the directory for data files for the application.
///
/// `CATSYNC_DATA_DIR` takes precedence over the platform default.
#[cfg(windows)]
pub fn data_dir() -> PathBuf {
  if let Ok(path) = std::env::var(DATA_DIR_ENV) {
    return PathBuf::from(path);
  }
  let appdata = std::env::var("APPDATA").expect("APPDATA not set");
  PathBuf::from(appdata).join(APP_NAME)
}

/// Returns the directory for data files for the application.
///
/// `CATSYNC_DATA_DIR` takes precedence over `XDG_DATA_HOME`.
#[cfg(not(windows))]
pub fn data_dir() -> PathBuf {
  if let Ok(path) = std::env::var(DATA_DIR_ENV) {
    return PathBuf::from(path);
  }
  let data_home = std::env::var("XDG_DATA_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".local").join("share"));
  data_home.join(APP_NAME)
}

/// Persisted catalog definitions and status.
pub fn catalogs_dir() -> PathBuf {
  data_dir().join("catalogs")
}

/// Root of the file-backed template store.
pub fn templates_dir() -> PathBuf {
  data_dir().join("store")
}

/// Per-catalog lock files.
pub fn locks_dir() -> PathBuf {
  data_dir().join("locks")
}
