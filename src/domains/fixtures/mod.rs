//! Fixture domain module.
//!
//! The monitoring tools read canned datasets from YAML files under a data
//! directory. [`DataLoader`] parses them once and memoizes the result.

mod loader;

pub use loader::{CacheStats, DataLoader, datasets};
pub(crate) use loader::records;
