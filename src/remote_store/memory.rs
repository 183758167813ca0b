use super::content_api::{ContentApi, EntryContent, EntryKind, RemoteEntry};
use crate::error_handling::types::RemoteStoreError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct MemoryState {
    entries: BTreeMap<String, (Vec<u8>, String)>,
    revision: u64,
    messages: Vec<String>,
}

impl MemoryState {
    fn next_version(&mut self) -> String {
        self.revision += 1;
        format!("v{}", self.revision)
    }
}

/// In-process `ContentApi` with the same create-only and version-checked
/// delete contract as the real backend.
#[derive(Debug, Default)]
pub struct InMemoryContentApi {
    state: Mutex<MemoryState>,
    fail_creates: bool,
    fail_lists: bool,
    race_after_get: bool,
}

impl InMemoryContentApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every create fails with a network error.
    pub fn with_failing_creates(mut self) -> Self {
        self.fail_creates = true;
        self
    }

    /// Every listing fails with a network error.
    pub fn with_failing_lists(mut self) -> Self {
        self.fail_lists = true;
        self
    }

    /// Each `get_entry` is followed by a concurrent rewrite of the entry.
    pub fn with_race_after_get(mut self) -> Self {
        self.race_after_get = true;
        self
    }

    /// Stores an entry directly, bypassing create semantics.
    pub fn seed(&self, path: &str, content: &[u8]) {
        let mut state = self.state.lock().unwrap();
        let version = state.next_version();
        state
            .entries
            .insert(path.to_string(), (content.to_vec(), version));
    }

    pub fn paths(&self) -> Vec<String> {
        self.state.lock().unwrap().entries.keys().cloned().collect()
    }

    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .entries
            .get(path)
            .map(|(content, _)| content.clone())
    }

    pub fn messages(&self) -> Vec<String> {
        self.state.lock().unwrap().messages.clone()
    }
}

fn name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[async_trait]
impl ContentApi for InMemoryContentApi {
    async fn list_dir(&self, dir: &str) -> Result<Vec<RemoteEntry>, RemoteStoreError> {
        if self.fail_lists {
            return Err(RemoteStoreError::Network(String::from("listing unavailable")));
        }
        let prefix = format!("{}/", dir.trim_matches('/'));
        let state = self.state.lock().unwrap();
        Ok(state
            .entries
            .iter()
            .filter_map(|(path, (_, version))| {
                let rest = path.strip_prefix(prefix.as_str())?;
                (!rest.contains('/')).then(|| RemoteEntry {
                    name: rest.to_string(),
                    path: path.clone(),
                    kind: EntryKind::File,
                    version: version.clone(),
                })
            })
            .collect())
    }

    async fn get_entry(&self, path: &str) -> Result<EntryContent, RemoteStoreError> {
        let mut state = self.state.lock().unwrap();
        let (content, version) = state
            .entries
            .get(path)
            .cloned()
            .ok_or_else(|| RemoteStoreError::NotFound(path.to_string()))?;
        if self.race_after_get {
            let newer = state.next_version();
            state
                .entries
                .insert(path.to_string(), (content.clone(), newer));
        }
        Ok(EntryContent {
            path: path.to_string(),
            content,
            version,
        })
    }

    async fn create_entry(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
    ) -> Result<RemoteEntry, RemoteStoreError> {
        if self.fail_creates {
            return Err(RemoteStoreError::Network(String::from("create unavailable")));
        }
        let mut state = self.state.lock().unwrap();
        if state.entries.contains_key(path) {
            return Err(RemoteStoreError::AlreadyExists(path.to_string()));
        }
        let version = state.next_version();
        state
            .entries
            .insert(path.to_string(), (content.to_vec(), version.clone()));
        state.messages.push(message.to_string());
        Ok(RemoteEntry {
            name: name_of(path).to_string(),
            path: path.to_string(),
            kind: EntryKind::File,
            version,
        })
    }

    async fn delete_entry(
        &self,
        path: &str,
        version: &str,
        message: &str,
    ) -> Result<(), RemoteStoreError> {
        let mut state = self.state.lock().unwrap();
        let current = match state.entries.get(path) {
            Some((_, current)) => current.clone(),
            None => return Err(RemoteStoreError::NotFound(path.to_string())),
        };
        if current != version {
            return Err(RemoteStoreError::Conflict(format!(
                "{} is at {}, not {}",
                path, current, version
            )));
        }
        state.entries.remove(path);
        state.messages.push(message.to_string());
        Ok(())
    }
}
