use super::content_api::{ContentApi, EntryKind};
use super::naming::ArtifactNaming;
use crate::configuration::types::RemoteConfig;
use crate::error_handling::types::RemoteStoreError;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;

/// One numbered artifact in the remote collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteRef {
    pub sequence: u64,
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eviction {
    WithinLimit,
    Evicted(RemoteRef),
}

/// Numbered, FIFO-bounded collection on top of a [`ContentApi`].
///
/// Sequence numbers only grow: a new artifact takes `max + 1` of what is
/// currently listed, and eviction always removes the lowest number. As long as
/// at least one artifact is retained, a number is never handed out twice.
pub struct RemoteArtifactStore {
    api: Arc<dyn ContentApi>,
    naming: ArtifactNaming,
    directory: String,
    message_prefix: String,
}

impl RemoteArtifactStore {
    pub fn new(api: Arc<dyn ContentApi>, naming: ArtifactNaming, directory: &str, message_prefix: &str) -> Self {
        Self {
            api,
            naming,
            directory: directory.trim_matches('/').to_string(),
            message_prefix: message_prefix.trim().to_string(),
        }
    }

    pub fn from_config(api: Arc<dyn ContentApi>, config: &RemoteConfig) -> Self {
        Self::new(
            api,
            ArtifactNaming::from_config(config),
            &config.directory,
            &config.commit_message_prefix,
        )
    }

    fn path_for(&self, name: &str) -> String {
        if self.directory.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.directory, name)
        }
    }

    fn message(&self, action: &str, name: &str) -> String {
        if self.message_prefix.is_empty() {
            format!("{} {}", action, name)
        } else {
            format!("{} {} {}", self.message_prefix, action, name)
        }
    }

    /// Current artifacts ordered by sequence number. Entries that do not
    /// follow the naming scheme are ignored.
    pub async fn list(&self) -> Result<Vec<RemoteRef>, RemoteStoreError> {
        let entries = self.api.list_dir(&self.directory).await?;
        let mut refs: Vec<RemoteRef> = entries
            .into_iter()
            .filter(|e| e.kind == EntryKind::File)
            .filter_map(|e| {
                let sequence = self.naming.parse(&e.name)?;
                Some(RemoteRef {
                    sequence,
                    name: e.name,
                    path: e.path,
                })
            })
            .collect();
        refs.sort_by_key(|r| r.sequence);
        Ok(refs)
    }

    pub async fn next_sequence(&self) -> Result<u64, RemoteStoreError> {
        match self.list().await?.last() {
            None => Ok(1),
            Some(r) => r
                .sequence
                .checked_add(1)
                .ok_or(RemoteStoreError::SequenceExhausted(r.sequence)),
        }
    }

    /// Creates artifact `sequence`. Fails with `AlreadyExists` rather than
    /// overwriting.
    pub async fn put(&self, bytes: &[u8], sequence: u64) -> Result<RemoteRef, RemoteStoreError> {
        let name = self.naming.name_for(sequence);
        let path = self.path_for(&name);
        let entry = self
            .api
            .create_entry(&path, bytes, &self.message("add", &name))
            .await?;
        info!("Stored remote artifact {}", entry.path);
        Ok(RemoteRef {
            sequence,
            name,
            path: entry.path,
        })
    }

    /// Stores `bytes` under the next sequence number.
    ///
    /// A concurrent writer taking the same number surfaces as `AlreadyExists`;
    /// there is no retry here.
    pub async fn ingest(&self, bytes: &[u8]) -> Result<RemoteRef, RemoteStoreError> {
        let sequence = self.next_sequence().await?;
        debug!("Ingesting {} byte(s) as remote sequence {}", bytes.len(), sequence);
        self.put(bytes, sequence).await
    }

    /// Removes the lowest-numbered artifact when more than `max_retained` exist.
    ///
    /// At most one artifact is removed per call. The delete presents a version
    /// token fetched immediately beforehand; if the entry changed in between
    /// the call fails with `Conflict`.
    pub async fn delete_oldest_if_over_limit(
        &self,
        max_retained: usize,
    ) -> Result<Eviction, RemoteStoreError> {
        let refs = self.list().await?;
        if refs.len() <= max_retained {
            debug!("Remote collection holds {} of {}", refs.len(), max_retained);
            return Ok(Eviction::WithinLimit);
        }
        let oldest = match refs.into_iter().next() {
            Some(r) => r,
            None => return Ok(Eviction::WithinLimit),
        };

        let fresh = self.api.get_entry(&oldest.path).await?;
        match self
            .api
            .delete_entry(&oldest.path, &fresh.version, &self.message("remove", &oldest.name))
            .await
        {
            Ok(()) => {
                info!("Evicted remote artifact {}", oldest.path);
                Ok(Eviction::Evicted(oldest))
            }
            Err(e) => {
                warn!("Could not evict remote artifact {}: {}", oldest.path, e);
                Err(e)
            }
        }
    }
}
