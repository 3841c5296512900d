//! Package index: the read-only input of a sync.
//!
//! An [`IndexSnapshot`] maps package names to their releases. It is produced
//! by a [`ChartSource`], which also serves the per-release descriptor files
//! and icons the template builder needs.

mod fs;
mod memory;
mod source;
mod types;

pub use fs::{FsChartSource, INDEX_FILENAME};
pub use memory::MemoryChartSource;
pub use source::{ChartSource, IconRef, SourceError, icon_filename};
pub use types::{ChartFile, ChartRelease, IndexSnapshot};
