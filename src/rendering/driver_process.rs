use crate::error_handling::types::RenderError;
use log::{debug, info, warn};
use reqwest::Client;
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::Instant;

/// WebDriver binary spawned and owned by this process.
///
/// The child is killed on `shutdown`, and also when the handle is dropped.
pub struct DriverProcess {
    command: String,
    child: Child,
}

impl DriverProcess {
    /// Spawns `command args...` and waits until the driver at `webdriver_url`
    /// reports ready.
    pub async fn spawn(
        command: &str,
        args: &[String],
        webdriver_url: &str,
        startup_timeout: Duration,
    ) -> Result<Self, RenderError> {
        info!("Starting WebDriver process: {} {}", command, args.join(" "));
        let child = Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RenderError::ProcessError(format!("failed to spawn {}: {}", command, e)))?;

        let mut process = Self {
            command: command.to_string(),
            child,
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;
        let deadline = Instant::now() + startup_timeout;
        loop {
            if let Some(status) = process
                .child
                .try_wait()
                .map_err(|e| RenderError::ProcessError(e.to_string()))?
            {
                return Err(RenderError::ProcessError(format!(
                    "{} exited during startup with {}",
                    command, status
                )));
            }
            if is_ready(&client, webdriver_url).await {
                info!("WebDriver ready at {}", webdriver_url);
                return Ok(process);
            }
            if Instant::now() >= deadline {
                process.shutdown().await;
                return Err(RenderError::ProcessError(format!(
                    "{} not ready after {:?}",
                    command, startup_timeout
                )));
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }

    /// Best-effort: failure to kill is logged.
    pub async fn shutdown(&mut self) {
        debug!("Terminating WebDriver process {}", self.command);
        if let Err(e) = self.child.kill().await {
            warn!("Failed to kill WebDriver process {}: {}", self.command, e);
        }
    }
}

/// Checks the W3C `/status` endpoint for `value.ready == true`.
pub async fn is_ready(client: &Client, webdriver_url: &str) -> bool {
    let url = format!("{}/status", webdriver_url.trim_end_matches('/'));
    let response = match client.get(&url).send().await {
        Ok(r) if r.status().is_success() => r,
        _ => return false,
    };
    match response.json::<Value>().await {
        Ok(body) => body
            .get("value")
            .and_then(|v| v.get("ready"))
            .and_then(Value::as_bool)
            .unwrap_or(false),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_is_ready() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": { "ready": true, "message": "ChromeDriver ready for new sessions." }
            })))
            .mount(&server)
            .await;
        assert!(is_ready(&Client::new(), &server.uri()).await);
    }

    #[tokio::test]
    async fn test_not_ready() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": { "ready": false }
            })))
            .mount(&server)
            .await;
        assert!(!is_ready(&Client::new(), &server.uri()).await);
    }

    #[tokio::test]
    async fn test_missing_binary_fails_to_spawn() {
        let result = DriverProcess::spawn(
            "/nonexistent/sitecycle-chromedriver",
            &[],
            "http://127.0.0.1:1",
            Duration::from_millis(100),
        )
        .await;
        assert!(matches!(result, Err(RenderError::ProcessError(_))));
    }
}
