//! Per-catalog advisory lock.
//!
//! At most one sync may run against a catalog at a time. The lock is a file
//! under [`locks_dir`] named after the catalog, held with a non-blocking
//! exclusive `flock`/`LockFileEx` for the lifetime of [`CatalogLock`].

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::now_unix;
use crate::platform::paths::locks_dir;

#[derive(Debug, Serialize, Deserialize)]
pub struct LockMetadata {
  pub version: u32,
  pub pid: u32,
  pub started_at_unix: u64,
  pub command: String,
  pub catalog: String,
}

#[derive(Debug, Error)]
pub enum LockError {
  #[error(
    "catalog {catalog} is locked by another process: {command} (PID {pid}, started at unix time {started_at_unix})\n\
     If you're sure no catsync process is running, remove the lock file:\n  {lock_path}"
  )]
  Contention {
    catalog: String,
    command: String,
    pid: u32,
    started_at_unix: u64,
    lock_path: PathBuf,
  },

  #[error(
    "catalog {catalog} is locked (could not read lock metadata)\n\
     If you're sure no catsync process is running, remove the lock file:\n  {lock_path}"
  )]
  ContentionUnknown { catalog: String, lock_path: PathBuf },

  #[error("failed to create lock directory: {0}")]
  CreateDir(#[source] io::Error),

  #[error("failed to open lock file: {0}")]
  OpenFile(#[source] io::Error),

  #[error("failed to write lock metadata: {0}")]
  WriteMetadata(#[source] io::Error),

  #[error("failed to acquire lock: {0}")]
  LockFailed(#[source] io::Error),
}

pub struct CatalogLock {
  file: File,
  lock_path: PathBuf,
}

impl CatalogLock {
  /// Lock `catalog` in the default lock directory.
  pub fn acquire(catalog: &str, command: &str) -> Result<Self, LockError> {
    Self::acquire_in(&locks_dir(), catalog, command)
  }

  pub fn acquire_in(dir: &Path, catalog: &str, command: &str) -> Result<Self, LockError> {
    let lock_path = dir.join(format!("{}.lock", catalog));

    std::fs::create_dir_all(dir).map_err(LockError::CreateDir)?;

    let file = OpenOptions::new()
      .read(true)
      .write(true)
      .create(true)
      .truncate(false)
      .open(&lock_path)
      .map_err(LockError::OpenFile)?;

    if let Err(err) = try_lock(&file) {
      if err.kind() == io::ErrorKind::WouldBlock {
        return Err(read_contention_error(catalog, &lock_path));
      }
      return Err(LockError::LockFailed(err));
    }

    write_metadata(&file, catalog, command)?;

    Ok(CatalogLock { file, lock_path })
  }

  /// Read the metadata through the held handle. Opening a second handle
  /// fails on Windows while the lock is held.
  pub fn read_metadata(&self) -> io::Result<LockMetadata> {
    use std::io::{Seek, SeekFrom};

    let mut file = &self.file;
    file.seek(SeekFrom::Start(0))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    serde_json::from_str(&contents).map_err(io::Error::other)
  }

  pub fn lock_path(&self) -> &Path {
    &self.lock_path
  }
}

fn write_metadata(file: &File, catalog: &str, command: &str) -> Result<(), LockError> {
  let metadata = LockMetadata {
    version: 1,
    pid: std::process::id(),
    started_at_unix: now_unix(),
    command: command.to_string(),
    catalog: catalog.to_string(),
  };

  file.set_len(0).map_err(LockError::WriteMetadata)?;
  let mut writer = io::BufWriter::new(file);
  serde_json::to_writer_pretty(&mut writer, &metadata).map_err(|e| LockError::WriteMetadata(io::Error::other(e)))?;
  writer.flush().map_err(LockError::WriteMetadata)?;

  Ok(())
}

fn read_contention_error(catalog: &str, lock_path: &Path) -> LockError {
  if let Ok(mut file) = File::open(lock_path) {
    let mut contents = String::new();
    if file.read_to_string(&mut contents).is_ok()
      && let Ok(metadata) = serde_json::from_str::<LockMetadata>(&contents)
    {
      return LockError::Contention {
        catalog: catalog.to_string(),
        command: metadata.command,
        pid: metadata.pid,
        started_at_unix: metadata.started_at_unix,
        lock_path: lock_path.to_path_buf(),
      };
    }
  }

  LockError::ContentionUnknown {
    catalog: catalog.to_string(),
    lock_path: lock_path.to_path_buf(),
  }
}

#[cfg(unix)]
fn try_lock(file: &File) -> io::Result<()> {
  use rustix::fs::{FlockOperation, flock};
  use std::os::unix::io::AsFd;

  flock(file.as_fd(), FlockOperation::NonBlockingLockExclusive)
    .map_err(|e| io::Error::from_raw_os_error(e.raw_os_error()))
}

#[cfg(windows)]
fn try_lock(file: &File) -> io::Result<()> {
  use std::os::windows::io::AsRawHandle;
  use windows_sys::Win32::Foundation::HANDLE;
  use windows_sys::Win32::Storage::FileSystem::{LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY, LockFileEx};

  let handle = file.as_raw_handle() as HANDLE;

  // SAFETY: OVERLAPPED is valid zero-initialized and the handle is open.
  let result = unsafe {
    let mut overlapped = std::mem::zeroed();
    LockFileEx(
      handle,
      LOCKFILE_FAIL_IMMEDIATELY | LOCKFILE_EXCLUSIVE_LOCK,
      0,
      1,
      0,
      &mut overlapped,
    )
  };

  if result == 0 {
    Err(io::Error::last_os_error())
  } else {
    Ok(())
  }
}
