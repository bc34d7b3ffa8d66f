//! Cabinet Catalog
//!
//! This crate owns the flat JSON catalog of published builds. The catalog is
//! a single document (an array of entries) that is read in full, mutated in
//! memory, and rewritten in full on every create, update, or delete — there
//! is no incremental append format.
//!
//! All mutation goes through [`CatalogStore`], which serializes its
//! read-modify-write cycles behind one async mutex so that two concurrent
//! requests cannot interleave and silently drop each other's writes.

mod entry;
mod error;
mod store;

pub use entry::{BuildUrls, EntryPatch, GameEntry};
pub use error::CatalogError;
pub use store::CatalogStore;
