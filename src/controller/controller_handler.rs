use super::scheduler::Scheduler;
use super::trigger::TriggerController;
use super::types::{TriggerOutcome, TriggerSource};
use crate::capture::{CaptureEngine, CaptureSettings};
use crate::configuration::config::Config;
use crate::error_handling::types::*;
use crate::remote_store::{ContentApi, GitHubContentApi, RemoteArtifactStore};
use crate::rendering::{DriverProcess, RenderCapability, WebDriverRenderer};
use crate::rotation::{FileCursorStore, RotationState, SiteList};
use crate::web_interface::WebServer;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Owns every long-lived component and their lifetimes.
pub struct Controller {
    config: Config,
    trigger: Arc<TriggerController>,
    driver: Option<DriverProcess>,
}

impl Controller {
    /// Loads the site list, starts the WebDriver process if configured and
    /// wires the capture pipeline.
    pub async fn new(config: Config) -> Result<Self, ControllerError> {
        info!("Creating controller");
        let sites = SiteList::from_file(&config.sites_file)?;

        let driver = match &config.renderer.driver_command {
            Some(command) => Some(
                DriverProcess::spawn(
                    command,
                    &config.renderer.driver_args,
                    &config.renderer.webdriver_url,
                    Duration::from_secs(config.renderer.startup_timeout_secs),
                )
                .await?,
            ),
            None => None,
        };

        let renderer = Arc::new(WebDriverRenderer::new(
            &config.renderer.webdriver_url,
            config.renderer.headless,
            Duration::from_millis(config.capture.network_idle_ms),
        )?
        .with_command_timeout(Duration::from_secs(config.renderer.command_timeout_secs)));

        let remote_api: Option<Arc<dyn ContentApi>> = match &config.remote {
            Some(remote) => {
                let token = remote.resolved_token();
                if token.is_none() {
                    warn!("No GitHub token configured; remote uploads will fail");
                }
                Some(Arc::new(GitHubContentApi::new(remote, token)?))
            }
            None => {
                info!("No [remote] section; remote history disabled");
                None
            }
        };

        let trigger = Self::assemble(&config, sites, renderer, remote_api)?;
        Ok(Self {
            config,
            trigger,
            driver,
        })
    }

    /// Builds the trigger path from already-constructed backends.
    pub fn assemble(
        config: &Config,
        sites: SiteList,
        renderer: Arc<dyn RenderCapability>,
        remote_api: Option<Arc<dyn ContentApi>>,
    ) -> Result<Arc<TriggerController>, ControllerError> {
        let cursor = Arc::new(FileCursorStore::new(&config.state_file));
        let rotation = RotationState::new(cursor, sites.len());
        let capture = CaptureEngine::new(
            renderer,
            &config.screenshots_dir,
            CaptureSettings::from_config(&config.capture),
        )?;
        let remote = match (remote_api, &config.remote) {
            (Some(api), Some(remote)) => Some(RemoteArtifactStore::from_config(api, remote)),
            _ => None,
        };
        info!(
            "Rotation resumes at index {} of {}",
            rotation.current(),
            sites.len()
        );
        Ok(Arc::new(TriggerController::new(
            rotation,
            sites,
            capture,
            remote,
            config.max_retained,
        )))
    }

    pub fn trigger(&self) -> Arc<TriggerController> {
        self.trigger.clone()
    }

    /// Runs the scheduler and web interface until Ctrl-C.
    pub async fn run(&mut self) -> Result<(), ControllerError> {
        info!("Controller running");
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let scheduler = Scheduler::new(
            self.trigger.clone(),
            Duration::from_secs(self.config.scheduler.interval_secs),
            self.config.scheduler.run_on_start,
        );
        let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx));

        let web_handle = if self.config.web.enabled {
            let server = WebServer::new(self.trigger.clone());
            let bind = self.config.web.bind_address.clone();
            let port = self.config.web.port;
            Some(tokio::spawn(async move { server.start(&bind, port).await }))
        } else {
            info!("Web interface disabled");
            None
        };

        let result = match web_handle {
            Some(mut web) => tokio::select! {
                signal = tokio::signal::ctrl_c() => signal.map_err(|e| {
                    ControllerError::InitializationFailed(format!("signal handler: {}", e))
                }),
                served = &mut web => match served {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(ControllerError::WebError(e)),
                    Err(e) => Err(ControllerError::WebError(WebError::BindFailed(e.to_string()))),
                },
            },
            None => tokio::signal::ctrl_c().await.map_err(|e| {
                ControllerError::InitializationFailed(format!("signal handler: {}", e))
            }),
        };

        info!("Shutting down; waiting for any trigger in flight");
        let _ = shutdown_tx.send(true);
        if let Err(e) = scheduler_handle.await {
            error!("Scheduler task ended abnormally: {}", e);
        }
        self.trigger.wait_idle().await;
        self.shutdown().await;
        result
    }

    /// Runs exactly one on-demand trigger, then shuts down.
    pub async fn run_once(&mut self) -> TriggerOutcome {
        let outcome = self.trigger.run(TriggerSource::OnDemand).await;
        self.shutdown().await;
        outcome
    }

    pub async fn shutdown(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            driver.shutdown().await;
        }
        info!("Controller stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::types::RemoteConfig;
    use crate::remote_store::memory::InMemoryContentApi;
    use crate::rendering::scripted::ScriptedRenderer;
    use std::fs;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> Config {
        Config {
            sites_file: dir.path().join("sites.txt"),
            state_file: dir.path().join("state.json"),
            screenshots_dir: dir.path().join("shots"),
            max_retained: 2,
            remote: Some(RemoteConfig {
                owner: String::from("octo"),
                repo: String::from("shots"),
                branch: String::from("main"),
                directory: String::from("screenshots"),
                token: None,
                api_base: String::from("http://unused.invalid"),
                name_prefix: String::from("screenshot_"),
                sequence_digits: 3,
                extension: String::from("png"),
                commit_message_prefix: String::from("sitecycle:"),
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_assembled_pipeline_persists_cursor_across_restart() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("sites.txt"),
            "https://a.example\n# comment\nhttps://b.example\n",
        )
        .unwrap();
        let config = config(&dir);
        let api = Arc::new(InMemoryContentApi::new());

        let sites = SiteList::from_file(&config.sites_file).unwrap();
        let trigger = Controller::assemble(
            &config,
            sites,
            Arc::new(ScriptedRenderer::new()),
            Some(api.clone()),
        )
        .unwrap();
        let outcome = trigger.run(TriggerSource::OnDemand).await;
        assert!(outcome.success);
        assert_eq!(outcome.remote_ref.map(|r| r.sequence), Some(1));
        drop(trigger);

        // a fresh pipeline over the same state file continues the rotation
        let sites = SiteList::from_file(&config.sites_file).unwrap();
        let trigger = Controller::assemble(
            &config,
            sites,
            Arc::new(ScriptedRenderer::new()),
            Some(api.clone()),
        )
        .unwrap();
        let outcome = trigger.run(TriggerSource::Timer).await;
        assert_eq!(outcome.index, 1);
        assert_eq!(outcome.url, "https://b.example");
        assert_eq!(outcome.remote_ref.map(|r| r.sequence), Some(2));
        assert_eq!(outcome.next_index, 0);
    }

    #[tokio::test]
    async fn test_missing_site_list_fails_startup() {
        let dir = TempDir::new().unwrap();
        let err = match Controller::new(config(&dir)).await {
            Err(e) => e,
            Ok(_) => panic!("expected startup failure"),
        };
        assert!(matches!(
            err,
            ControllerError::ConfigurationError(ConfigError::SitesMissing(_))
        ));
    }
}
