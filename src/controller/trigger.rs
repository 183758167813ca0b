use super::status::StatusBoard;
use super::types::{TriggerOutcome, TriggerSource};
use crate::capture::CaptureEngine;
use crate::remote_store::{Eviction, RemoteArtifactStore, RemoteRef};
use crate::rotation::{RotationState, SiteList};
use crate::storage::LocalRetentionManager;
use chrono::Utc;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Runs the capture-and-rotate sequence, one trigger at a time.
///
/// The rotation cursor lives inside the trigger guard, so holding the guard is
/// the only way to read-then-advance it. Every trigger advances the cursor
/// exactly once, whether or not the capture worked.
pub struct TriggerController {
    guard: Mutex<RotationState>,
    sites: SiteList,
    capture: CaptureEngine,
    retention: LocalRetentionManager,
    remote: Option<RemoteArtifactStore>,
    max_retained: usize,
    status: Arc<StatusBoard>,
}

impl TriggerController {
    pub fn new(
        rotation: RotationState,
        sites: SiteList,
        capture: CaptureEngine,
        remote: Option<RemoteArtifactStore>,
        max_retained: usize,
    ) -> Self {
        let status = Arc::new(StatusBoard::new(
            sites.iter().map(String::from).collect(),
            rotation.current(),
        ));
        let retention = LocalRetentionManager::new(capture.output_dir());
        Self {
            guard: Mutex::new(rotation),
            sites,
            capture,
            retention,
            remote,
            max_retained,
            status,
        }
    }

    pub fn status(&self) -> Arc<StatusBoard> {
        self.status.clone()
    }

    pub fn captures(&self) -> &LocalRetentionManager {
        &self.retention
    }

    /// Runs a trigger, waiting behind any trigger already in flight.
    pub async fn run(&self, source: TriggerSource) -> TriggerOutcome {
        let rotation = self.guard.lock().await;
        self.execute(&rotation, source).await
    }

    /// Runs a trigger on its own task. Dropping the handle does not cancel
    /// the trigger, so the cursor still advances and the session is closed.
    pub fn spawn_run(self: &Arc<Self>, source: TriggerSource) -> JoinHandle<TriggerOutcome> {
        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.run(source).await })
    }

    /// Resolves once no trigger holds the guard.
    pub async fn wait_idle(&self) {
        let _rotation = self.guard.lock().await;
    }

    /// Runs a trigger only if none is in flight.
    pub async fn try_run(&self, source: TriggerSource) -> Option<TriggerOutcome> {
        let rotation = self.guard.try_lock().ok()?;
        Some(self.execute(&rotation, source).await)
    }

    async fn execute(&self, rotation: &RotationState, source: TriggerSource) -> TriggerOutcome {
        let started_at = Utc::now();
        let id = Uuid::new_v4();
        self.status.mark_started(source).await;

        let index = rotation.current();
        let url = self.sites.get(index).to_string();
        info!(
            "Trigger {} ({}) capturing site {} of {}: {}",
            id,
            source,
            index,
            self.sites.len(),
            url
        );

        let mut warnings = Vec::new();
        let mut local_path = None;
        let mut remote_ref = None;
        let mut failure = None;

        match self.capture.capture(&url, index).await {
            Ok(artifact) => {
                let bytes = match tokio::fs::read(&artifact.path).await {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        warn!("Could not read back {}: {}", artifact.path.display(), e);
                        warnings.push(format!("read back failed: {}", e));
                        None
                    }
                };
                local_path = Some(artifact.path);

                match self.retention.prune(self.max_retained) {
                    Ok(report) if report.failed > 0 => {
                        warnings.push(format!("{} local capture(s) could not be removed", report.failed))
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Local prune failed: {}", e);
                        warnings.push(format!("local prune failed: {}", e));
                    }
                }

                if let (Some(remote), Some(bytes)) = (&self.remote, bytes) {
                    remote_ref = self.push_remote(remote, &bytes, &mut warnings).await;
                }
            }
            Err(e) => {
                warn!("Trigger {} capture of {} failed: {}", id, url, e);
                failure = Some(e.to_string());
            }
        }

        let next_index = match rotation.advance() {
            Ok(next) => next,
            Err(e) => {
                error!("Failed to persist rotation cursor: {}", e);
                warnings.push(format!("cursor not persisted: {}", e));
                rotation.current()
            }
        };

        let outcome = TriggerOutcome {
            id,
            source,
            index,
            url,
            success: failure.is_none(),
            local_path,
            remote_ref,
            error: failure,
            warnings,
            next_index,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            "Trigger {} finished: success={}, next index {}",
            outcome.id, outcome.success, outcome.next_index
        );
        self.status.record(&outcome).await;
        outcome
    }

    async fn push_remote(
        &self,
        remote: &RemoteArtifactStore,
        bytes: &[u8],
        warnings: &mut Vec<String>,
    ) -> Option<RemoteRef> {
        let stored = match remote.ingest(bytes).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Remote ingest failed: {}", e);
                warnings.push(format!("remote ingest failed: {}", e));
                return None;
            }
        };

        match remote.delete_oldest_if_over_limit(self.max_retained).await {
            Ok(Eviction::Evicted(old)) => info!("Remote collection trimmed: removed {}", old.name),
            Ok(Eviction::WithinLimit) => {}
            Err(e) if e.is_conflict() => {
                warn!("Remote eviction lost a race, leaving it for the next trigger: {}", e);
                warnings.push(format!("remote eviction conflict: {}", e));
            }
            Err(e) => {
                warn!("Remote eviction failed: {}", e);
                warnings.push(format!("remote eviction failed: {}", e));
            }
        }
        Some(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureSettings, ConsentDismisser};
    use crate::configuration::types::ViewportProfile;
    use crate::remote_store::memory::InMemoryContentApi;
    use crate::remote_store::ArtifactNaming;
    use crate::rendering::scripted::{NavigationGate, PageScript, ScriptedRenderer};
    use crate::rotation::{CursorStore, MemoryCursorStore};
    use std::time::Duration;
    use tempfile::TempDir;

    const A: &str = "https://a.example";
    const B: &str = "https://b.example";
    const C: &str = "https://c.example";

    struct Harness {
        controller: Arc<TriggerController>,
        cursor: Arc<MemoryCursorStore>,
        remote: Arc<InMemoryContentApi>,
        _dir: TempDir,
    }

    fn settings() -> CaptureSettings {
        CaptureSettings {
            profile: ViewportProfile::default(),
            navigation_timeout: Duration::from_secs(1),
            settle_delay: Duration::from_millis(0),
            consent: ConsentDismisser::new(Vec::new(), Duration::ZERO, Duration::ZERO),
        }
    }

    fn harness(renderer: ScriptedRenderer, remote: InMemoryContentApi, max_retained: usize) -> Harness {
        let dir = TempDir::new().unwrap();
        let sites = SiteList::new(vec![A.to_string(), B.to_string(), C.to_string()]).unwrap();
        let cursor = Arc::new(MemoryCursorStore::new());
        let rotation = RotationState::new(cursor.clone(), sites.len());
        let capture = CaptureEngine::new(Arc::new(renderer), dir.path().join("shots"), settings()).unwrap();
        let remote = Arc::new(remote);
        let store = RemoteArtifactStore::new(
            remote.clone(),
            ArtifactNaming::new("screenshot_", 3, "png"),
            "screenshots",
            "test:",
        );
        Harness {
            controller: Arc::new(TriggerController::new(
                rotation,
                sites,
                capture,
                Some(store),
                max_retained,
            )),
            cursor,
            remote,
            _dir: dir,
        }
    }

    fn failing_b() -> ScriptedRenderer {
        ScriptedRenderer::new().with_page(
            B,
            PageScript {
                fail_navigation: true,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_rotation_with_failing_site() {
        let h = harness(failing_b(), InMemoryContentApi::new(), 10);

        let first = h.controller.run(TriggerSource::Timer).await;
        assert!(first.success);
        assert_eq!((first.index, first.url.as_str(), first.next_index), (0, A, 1));
        assert_eq!(h.cursor.load().unwrap(), Some(1));

        let second = h.controller.run(TriggerSource::Timer).await;
        assert!(!second.success);
        assert!(second.error.is_some());
        assert!(second.local_path.is_none());
        assert_eq!((second.index, second.next_index), (1, 2));
        assert_eq!(h.cursor.load().unwrap(), Some(2));

        let third = h.controller.run(TriggerSource::OnDemand).await;
        assert!(third.success);
        assert_eq!((third.index, third.url.as_str(), third.next_index), (2, C, 0));
        assert_eq!(h.cursor.load().unwrap(), Some(0));

        assert_eq!(
            h.remote.paths(),
            vec!["screenshots/screenshot_001.png", "screenshots/screenshot_002.png"]
        );
        assert_eq!(
            h.remote.content("screenshots/screenshot_002.png"),
            Some(format!("png:{}", C).into_bytes())
        );
        assert_eq!(h.controller.captures().list().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_retention_bounds_both_stores() {
        let h = harness(ScriptedRenderer::new(), InMemoryContentApi::new(), 2);
        for _ in 0..3 {
            let outcome = h.controller.run(TriggerSource::Timer).await;
            tokio_test::assert_ok!(outcome.error.map_or(Ok(()), Err));
        }
        assert_eq!(
            h.remote.paths(),
            vec!["screenshots/screenshot_002.png", "screenshots/screenshot_003.png"]
        );
        let local = h.controller.captures().list().unwrap();
        assert_eq!(
            local.iter().map(|a| a.rotation_index).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[tokio::test]
    async fn test_failed_capture_leaves_stores_untouched() {
        let h = harness(
            ScriptedRenderer {
                fail_open: true,
                ..Default::default()
            },
            InMemoryContentApi::new(),
            2,
        );
        let outcome = h.controller.run(TriggerSource::Timer).await;
        assert!(!outcome.success);
        assert!(outcome.remote_ref.is_none());
        assert!(h.remote.paths().is_empty());
        assert!(h.controller.captures().list().unwrap().is_empty());
        assert_eq!(h.cursor.load().unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_remote_failure_does_not_fail_trigger() {
        let h = harness(
            ScriptedRenderer::new(),
            InMemoryContentApi::new().with_failing_creates(),
            2,
        );
        let outcome = h.controller.run(TriggerSource::Timer).await;
        assert!(outcome.success);
        assert!(outcome.remote_ref.is_none());
        assert!(outcome.local_path.is_some());
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.next_index, 1);
    }

    #[tokio::test]
    async fn test_timer_skips_while_trigger_in_flight() {
        let gate = Arc::new(NavigationGate::default());
        let renderer = ScriptedRenderer {
            gate: Some(gate.clone()),
            ..Default::default()
        };
        let h = harness(renderer, InMemoryContentApi::new(), 10);

        let controller = h.controller.clone();
        let in_flight = tokio::spawn(async move { controller.run(TriggerSource::OnDemand).await });
        gate.entered.notified().await;

        assert!(h.controller.try_run(TriggerSource::Timer).await.is_none());
        let status = h.controller.status().snapshot().await;
        assert_eq!(status.in_flight, Some(TriggerSource::OnDemand));
        assert_eq!(status.next_index, 0);

        gate.release.notify_one();
        let outcome = in_flight.await.unwrap();
        assert_eq!(outcome.index, 0);
        assert_eq!(h.cursor.load().unwrap(), Some(1));
        assert_eq!(h.controller.status().snapshot().await.triggers_run, 1);
    }

    #[tokio::test]
    async fn test_on_demand_requests_queue_and_advance_once_each() {
        let gate = Arc::new(NavigationGate::default());
        let renderer = ScriptedRenderer {
            gate: Some(gate.clone()),
            ..Default::default()
        };
        let h = harness(renderer, InMemoryContentApi::new(), 10);

        let first = {
            let controller = h.controller.clone();
            tokio::spawn(async move { controller.run(TriggerSource::OnDemand).await })
        };
        gate.entered.notified().await;
        let second = {
            let controller = h.controller.clone();
            tokio::spawn(async move { controller.run(TriggerSource::OnDemand).await })
        };

        gate.release.notify_one();
        let first = first.await.unwrap();
        gate.entered.notified().await;
        gate.release.notify_one();
        let second = second.await.unwrap();

        assert_eq!((first.index, second.index), (0, 1));
        assert_eq!(h.cursor.load().unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_abandoned_on_demand_trigger_still_completes() {
        let gate = Arc::new(NavigationGate::default());
        let renderer = ScriptedRenderer {
            gate: Some(gate.clone()),
            ..Default::default()
        };
        let log = renderer.log.clone();
        let h = harness(renderer, InMemoryContentApi::new(), 10);

        let waiting = tokio::time::timeout(
            Duration::from_millis(50),
            h.controller.spawn_run(TriggerSource::OnDemand),
        )
        .await;
        assert!(waiting.is_err());
        gate.entered.notified().await;

        gate.release.notify_one();
        h.controller.wait_idle().await;

        assert_eq!(h.cursor.load().unwrap(), Some(1));
        let status = h.controller.status().snapshot().await;
        assert_eq!(status.in_flight, None);
        assert_eq!(status.triggers_run, 1);
        let log = log.lock().unwrap();
        assert_eq!((log.opened, log.closed), (1, 1));
    }
}
