use crate::capture::types::LocalArtifact;
use crate::error_handling::types::StorageError;
use log::{debug, error, info, warn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of one prune pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub kept: usize,
    pub removed: usize,
    pub failed: usize,
}

/// Keeps the local capture directory bounded to the most recent artifacts.
///
/// Only files named like a `LocalArtifact` are considered; anything else in the
/// directory is left alone.
pub struct LocalRetentionManager {
    dir: PathBuf,
}

impl LocalRetentionManager {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Local artifacts, oldest first.
    pub fn list(&self) -> Result<Vec<LocalArtifact>, StorageError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            error!("Failed to read capture dir {}: {}", self.dir.display(), e);
            StorageError::IoError(e)
        })?;

        let mut artifacts = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                error!("Dir entry error in {}: {}", self.dir.display(), e);
                StorageError::IoError(e)
            })?;
            if let Some(artifact) = LocalArtifact::from_path(&entry.path()) {
                artifacts.push(artifact);
            }
        }
        artifacts.sort_by(|a, b| a.creation_key().cmp(&b.creation_key()));
        debug!("Found {} local artifact(s) in {}", artifacts.len(), self.dir.display());
        Ok(artifacts)
    }

    /// Looks up one artifact by file name; names that are not artifact names
    /// return `None`.
    pub fn find(&self, file_name: &str) -> Option<LocalArtifact> {
        if file_name.contains('/') || file_name.contains('\\') {
            return None;
        }
        let artifact = LocalArtifact::from_path(&self.dir.join(file_name))?;
        artifact.path.is_file().then_some(artifact)
    }

    /// Deletes all but the newest `max_kept` artifacts.
    ///
    /// A failed delete is logged and counted; the rest of the batch still runs.
    pub fn prune(&self, max_kept: usize) -> Result<PruneReport, StorageError> {
        let artifacts = self.list()?;
        let excess = artifacts.len().saturating_sub(max_kept);
        let mut report = PruneReport {
            kept: artifacts.len() - excess,
            ..Default::default()
        };

        for artifact in artifacts.iter().take(excess) {
            match fs::remove_file(&artifact.path) {
                Ok(()) => {
                    debug!("Removed old capture {}", artifact.path.display());
                    report.removed += 1;
                }
                Err(e) => {
                    warn!("Failed to remove old capture {}: {}", artifact.path.display(), e);
                    report.failed += 1;
                }
            }
        }

        if excess > 0 {
            info!(
                "Local prune: kept {}, removed {}, failed {}",
                report.kept, report.removed, report.failed
            );
        }
        Ok(report)
    }
}
