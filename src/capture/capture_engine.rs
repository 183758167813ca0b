use super::consent::{ConsentDismisser, DismissOutcome};
use super::types::LocalArtifact;
use crate::configuration::types::{CaptureConfig, ViewportProfile};
use crate::error_handling::types::{CaptureError, CaptureStage, StorageError};
use crate::rendering::{Readiness, RenderCapability, RenderSession};
use chrono::{NaiveDateTime, SubsecRound, Utc};
use log::{debug, error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Timing and identity applied to every capture.
pub struct CaptureSettings {
    pub profile: ViewportProfile,
    pub navigation_timeout: Duration,
    pub settle_delay: Duration,
    pub consent: ConsentDismisser,
}

impl CaptureSettings {
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self {
            profile: config.viewport.clone(),
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            consent: ConsentDismisser::with_defaults(
                &config.extra_consent_selectors,
                Duration::from_millis(config.consent_timeout_ms),
                Duration::from_millis(config.click_timeout_ms),
            ),
        }
    }
}

/// Drives one render session per capture and writes the result to disk.
///
/// Every step may fail; any failure ends the capture with a `CaptureError` and
/// the session is closed on every path.
pub struct CaptureEngine {
    renderer: Arc<dyn RenderCapability>,
    output_dir: PathBuf,
    settings: CaptureSettings,
    last_stamp: Mutex<Option<NaiveDateTime>>,
}

/// Never earlier than the previous stamp, so a clock stepping backwards
/// cannot make a newer capture sort as older.
fn monotonic_stamp(now: NaiveDateTime, last: Option<NaiveDateTime>) -> NaiveDateTime {
    match last {
        Some(last) if now < last => last,
        _ => now,
    }
}

impl CaptureEngine {
    pub fn new<P: AsRef<Path>>(
        renderer: Arc<dyn RenderCapability>,
        output_dir: P,
        settings: CaptureSettings,
    ) -> Result<Self, StorageError> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir).map_err(|e| {
            error!("Failed to create capture dir {}: {}", output_dir.display(), e);
            StorageError::IoError(e)
        })?;
        info!("CaptureEngine writing to {}", output_dir.display());
        Ok(Self {
            renderer,
            output_dir,
            settings,
            last_stamp: Mutex::new(None),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn next_stamp(&self) -> NaiveDateTime {
        // millisecond precision, UTC
        let now = Utc::now().naive_utc().trunc_subsecs(3);
        let mut last = match self.last_stamp.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let stamp = monotonic_stamp(now, *last);
        if stamp != now {
            warn!("Clock moved back by {}ms; reusing last capture time", (stamp - now).num_milliseconds());
        }
        *last = Some(stamp);
        stamp
    }

    pub async fn capture(&self, url: &str, rotation_index: usize) -> Result<LocalArtifact, CaptureError> {
        info!("Starting capture of {} (index {})", url, rotation_index);
        let mut session = self
            .renderer
            .open(&self.settings.profile)
            .await
            .map_err(|e| CaptureError::RenderError(CaptureStage::OpenSession, e))?;

        let result = self.drive(session.as_mut(), url, rotation_index).await;

        if let Err(e) = session.close().await {
            warn!("Failed to close render session for {}: {}", url, e);
        }

        match &result {
            Ok(artifact) => info!("Captured {} to {}", url, artifact.path.display()),
            Err(e) => warn!("Capture of {} failed: {}", url, e),
        }
        result
    }

    async fn drive(
        &self,
        session: &mut dyn RenderSession,
        url: &str,
        rotation_index: usize,
    ) -> Result<LocalArtifact, CaptureError> {
        session
            .goto(url, Readiness::NetworkSettled, self.settings.navigation_timeout)
            .await
            .map_err(|e| CaptureError::RenderError(CaptureStage::Navigate, e))?;
        debug!("Page settled for {}", url);

        if let DismissOutcome::Dismissed { rule, .. } = self.settings.consent.dismiss(session).await {
            debug!("Consent banner on {} dismissed by '{}'", url, rule);
        }

        session.wait(self.settings.settle_delay).await;

        let png = session
            .screenshot()
            .await
            .map_err(|e| CaptureError::RenderError(CaptureStage::Screenshot, e))?;

        self.write_artifact(rotation_index, &png).await
    }

    async fn write_artifact(
        &self,
        rotation_index: usize,
        bytes: &[u8],
    ) -> Result<LocalArtifact, CaptureError> {
        let captured_at = self.next_stamp();
        let mut duplicate = 0u32;
        loop {
            let file_name = LocalArtifact::file_name_for(rotation_index, captured_at, duplicate);
            let path = self.output_dir.join(&file_name);
            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(f) => f,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    duplicate += 1;
                    continue;
                }
                Err(e) => return Err(CaptureError::IoError(e)),
            };
            write_or_discard(file, &path, bytes).await?;
            debug!("Wrote {} byte(s) to {}", bytes.len(), path.display());

            return Ok(LocalArtifact {
                path,
                file_name,
                rotation_index,
                captured_at,
                duplicate,
            });
        }
    }
}

/// Writes `bytes` through `file`. On failure the partial file at `path` is
/// removed so it never shows up as a capture.
async fn write_or_discard<W: AsyncWrite + Unpin>(
    mut file: W,
    path: &Path,
    bytes: &[u8],
) -> Result<(), CaptureError> {
    let written = match file.write_all(bytes).await {
        Ok(()) => file.flush().await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        drop(file);
        if let Err(cleanup) = tokio::fs::remove_file(path).await {
            warn!("Failed to remove partial capture {}: {}", path.display(), cleanup);
        }
        return Err(CaptureError::IoError(e));
    }
    Ok(())
}
