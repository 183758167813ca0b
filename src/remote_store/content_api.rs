use crate::error_handling::types::RemoteStoreError;
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryKind {
    File,
    Dir,
    Other,
}

/// Listing metadata for one remote entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteEntry {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    /// Opaque token identifying this exact revision of the entry.
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryContent {
    pub path: String,
    pub content: Vec<u8>,
    pub version: String,
}

/// Minimal remote content store.
///
/// Implementations must reject `create_entry` on an existing path with
/// `AlreadyExists` and `delete_entry` with a stale version with `Conflict`.
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// Entries directly under `dir`. A directory that does not exist yet is empty.
    async fn list_dir(&self, dir: &str) -> Result<Vec<RemoteEntry>, RemoteStoreError>;

    async fn get_entry(&self, path: &str) -> Result<EntryContent, RemoteStoreError>;

    async fn create_entry(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
    ) -> Result<RemoteEntry, RemoteStoreError>;

    async fn delete_entry(
        &self,
        path: &str,
        version: &str,
        message: &str,
    ) -> Result<(), RemoteStoreError>;
}
