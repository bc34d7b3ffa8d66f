//! Cabinet Remote
//!
//! Resolves a GitHub repository + release tag (and optionally a named
//! asset) to a concrete downloadable archive, and streams it back through
//! the service so the browser never talks to GitHub directly.
//!
//! Two resolution paths:
//! - with an asset name, the release metadata is fetched from the GitHub
//!   API and searched for an exact name match;
//! - without one, a conventional `{repo}-{tag}.zip` download URL is
//!   constructed with no API call at all — the caller owns the burden of
//!   that naming convention being right.

mod client;
mod error;

pub use client::{ReleaseClient, ResolvedAsset};
pub use error::RemoteError;
