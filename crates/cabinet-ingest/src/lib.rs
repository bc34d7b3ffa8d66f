//! Cabinet Ingest
//!
//! This crate turns an arbitrary uploaded archive into a normalized,
//! servable build directory plus a catalog entry. The pipeline runs in
//! strict sequence:
//!
//! 1. resolve the overwrite conflict and reserve the build directory
//! 2. extract the archive
//! 3. locate the `Build` payload directory, wherever it is nested
//! 4. relocate it to the canonical path
//! 5. rename the artifact family to the project id
//! 6. decompress any precompressed artifacts in place
//! 7. publish the catalog entry
//!
//! Each step gates the next; a failure aborts the remaining steps and
//! surfaces as a distinct [`IngestError`] variant. Nothing is retried.

mod decompress;
mod error;
mod extract;
mod locate;
mod pipeline;
mod rename;

pub use decompress::decompress_dir;
pub use error::IngestError;
pub use extract::extract_zip;
pub use locate::find_payload_dir;
pub use pipeline::{IngestRequest, Ingestor, PAYLOAD_DIR_NAME};
pub use rename::canonicalize_artifacts;
