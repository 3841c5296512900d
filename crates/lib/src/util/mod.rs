//! Shared utilities.

pub mod hash;
pub mod path;
