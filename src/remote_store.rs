//! Remote store subsystem
//!
//! A numbered, FIFO-bounded collection of captures kept in a remote content
//! store. Writes are create-only and deletes are compare-and-swap on the
//! entry's version token, so concurrent writers surface as errors instead of
//! silently overwriting each other.
//!
//! Components:
//! - `content_api`: the `ContentApi` port.
//! - `github`: GitHub contents API backend.
//! - `naming`: `{prefix}{seq}.{ext}` naming and parsing.
//! - `artifact_store`: sequencing, ingest and eviction.

pub mod artifact_store;
pub mod content_api;
pub mod github;
pub mod naming;

pub use artifact_store::{Eviction, RemoteArtifactStore, RemoteRef};
pub use content_api::{ContentApi, EntryContent, EntryKind, RemoteEntry};
pub use github::GitHubContentApi;
pub use naming::ArtifactNaming;

#[cfg(test)]
pub mod memory;
