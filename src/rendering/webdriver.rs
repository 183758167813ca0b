//! W3C WebDriver backend for [`RenderCapability`].
//!
//! Talks to a Chrome WebDriver endpoint (chromedriver or a Selenium hub) over
//! plain HTTP. Each `open` creates a new browser session, which gives every
//! capture its own cookie jar and storage.

use super::render_trait::{RenderCapability, RenderSession};
use super::types::{ElementHandle, Readiness, Selector};
use crate::configuration::types::ViewportProfile;
use crate::error_handling::types::RenderError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, info, warn};
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::Instant;

/// Key under which W3C WebDriver returns element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a07a-4ad56e2a5f1c";

const POLL_INTERVAL: Duration = Duration::from_millis(100);

const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Extra time granted to the HTTP call on top of the browser's own page-load timeout.
const NAVIGATION_GRACE: Duration = Duration::from_secs(5);

const NETWORK_PROBE_SCRIPT: &str = "return [document.readyState, \
     (window.performance && performance.getEntriesByType) \
     ? performance.getEntriesByType('resource').length : 0];";

pub struct WebDriverRenderer {
    client: Client,
    base_url: String,
    headless: bool,
    network_idle: Duration,
    command_timeout: Duration,
}

impl WebDriverRenderer {
    pub fn new(base_url: &str, headless: bool, network_idle: Duration) -> Result<Self, RenderError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        info!("WebDriver renderer configured: endpoint={}", base_url);
        Ok(Self {
            client,
            base_url,
            headless,
            network_idle,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        })
    }

    /// Bounds every command except navigation, which uses its own timeout.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    fn capabilities(&self, profile: &ViewportProfile) -> Value {
        let mut args = vec![
            String::from("--no-sandbox"),
            String::from("--disable-setuid-sandbox"),
            String::from("--disable-dev-shm-usage"),
            String::from("--disable-gpu"),
            String::from("--disable-extensions"),
            String::from("--ignore-certificate-errors"),
            format!("--window-size={},{}", profile.width, profile.height),
        ];
        if self.headless {
            args.insert(0, String::from("--headless=new"));
        }

        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "acceptInsecureCerts": true,
                    "pageLoadStrategy": "normal",
                    "goog:chromeOptions": {
                        "args": args,
                        "mobileEmulation": {
                            "deviceMetrics": {
                                "width": profile.width,
                                "height": profile.height,
                                "pixelRatio": profile.device_scale_factor,
                                "mobile": profile.mobile,
                                "touch": profile.mobile,
                            },
                            "userAgent": profile.user_agent,
                        }
                    }
                }
            }
        })
    }
}

#[async_trait]
impl RenderCapability for WebDriverRenderer {
    async fn open(&self, profile: &ViewportProfile) -> Result<Box<dyn RenderSession>, RenderError> {
        let url = format!("{}/session", self.base_url);
        let value = send_command(
            &self.client,
            Method::POST,
            &url,
            Some(self.capabilities(profile)),
            self.command_timeout,
        )
        .await
            .map_err(|e| RenderError::SessionFailed(e.to_string()))?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| RenderError::InvalidResponse(String::from("missing sessionId")))?
            .to_string();
        debug!("Opened WebDriver session {}", session_id);

        let session = WebDriverSession {
            client: self.client.clone(),
            session_url: format!("{}/session/{}", self.base_url, session_id),
            session_id,
            network_idle: self.network_idle,
            command_timeout: self.command_timeout,
            closed: false,
        };

        // Chrome-only; other drivers simply keep enforcing CSP.
        if let Err(e) = session
            .command(
                Method::POST,
                "/goog/cdp/execute",
                Some(json!({ "cmd": "Page.setBypassCSP", "params": { "enabled": true } })),
            )
            .await
        {
            debug!("CSP bypass unavailable for session {}: {}", session.session_id, e);
        }

        Ok(Box::new(session))
    }
}

struct WebDriverSession {
    client: Client,
    session_id: String,
    session_url: String,
    network_idle: Duration,
    command_timeout: Duration,
    closed: bool,
}

impl WebDriverSession {
    async fn command(
        &self,
        method: Method,
        suffix: &str,
        body: Option<Value>,
    ) -> Result<Value, RenderError> {
        self.command_within(method, suffix, body, self.command_timeout)
            .await
    }

    async fn command_within(
        &self,
        method: Method,
        suffix: &str,
        body: Option<Value>,
        timeout: Duration,
    ) -> Result<Value, RenderError> {
        let url = format!("{}{}", self.session_url, suffix);
        send_command(&self.client, method, &url, body, timeout).await
    }

    async fn wait_for_network_idle(&self, deadline: Instant) -> Result<(), RenderError> {
        let mut last_count: Option<u64> = None;
        let mut quiet_since = Instant::now();

        loop {
            let probe = self
                .command(
                    Method::POST,
                    "/execute/sync",
                    Some(json!({ "script": NETWORK_PROBE_SCRIPT, "args": [] })),
                )
                .await?;
            let ready_state = probe.get(0).and_then(Value::as_str).unwrap_or("");
            let count = probe.get(1).and_then(Value::as_u64).unwrap_or(0);

            let now = Instant::now();
            if ready_state != "complete" || last_count != Some(count) {
                last_count = Some(count);
                quiet_since = now;
            } else if now.duration_since(quiet_since) >= self.network_idle {
                debug!("Network settled with {} resource(s)", count);
                return Ok(());
            }

            if now >= deadline {
                return Err(RenderError::NavigationTimeout(String::from(
                    "network did not settle before the navigation timeout",
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn find_visible(&self, selector: &Selector) -> Result<Option<ElementHandle>, RenderError> {
        let found = match self
            .command(
                Method::POST,
                "/elements",
                Some(json!({ "using": selector.strategy(), "value": selector.value() })),
            )
            .await
        {
            Ok(v) => v,
            // invalid selectors or a page mid-navigation are a miss, not a failure
            Err(RenderError::Driver { error, message }) => {
                debug!("Lookup of {} failed ({}): {}", selector, error, message);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let ids: Vec<String> = found
            .as_array()
            .map(|elements| {
                elements
                    .iter()
                    .filter_map(|el| el.get(ELEMENT_KEY).and_then(Value::as_str))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        for id in ids {
            let displayed = self
                .command(Method::GET, &format!("/element/{}/displayed", id), None)
                .await
                .ok()
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            if displayed {
                return Ok(Some(ElementHandle {
                    id,
                    selector: selector.clone(),
                }));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl RenderSession for WebDriverSession {
    async fn goto(
        &mut self,
        url: &str,
        readiness: Readiness,
        timeout: Duration,
    ) -> Result<(), RenderError> {
        let deadline = Instant::now() + timeout;
        self.command(
            Method::POST,
            "/timeouts",
            Some(json!({ "pageLoad": timeout.as_millis() as u64 })),
        )
        .await?;

        let navigate = self
            .command_within(
                Method::POST,
                "/url",
                Some(json!({ "url": url })),
                timeout + NAVIGATION_GRACE,
            )
            .await;
        match navigate {
            Err(RenderError::Timeout(_)) => return Err(RenderError::NavigationTimeout(url.to_string())),
            Err(RenderError::Driver { error, message }) if error == "timeout" => {
                return Err(RenderError::NavigationTimeout(format!("{}: {}", url, message)))
            }
            Err(RenderError::Driver { error, message }) => {
                return Err(RenderError::NavigationFailed(format!(
                    "{}: {} ({})",
                    url, message, error
                )))
            }
            Err(e) => return Err(e),
            Ok(_) => {}
        }

        match readiness {
            Readiness::Load => Ok(()),
            Readiness::NetworkSettled => self.wait_for_network_idle(deadline).await,
        }
    }

    async fn find_first_visible(
        &mut self,
        candidates: &[Selector],
        timeout: Duration,
    ) -> Result<Option<ElementHandle>, RenderError> {
        let deadline = Instant::now() + timeout;
        loop {
            for selector in candidates {
                if let Some(element) = self.find_visible(selector).await? {
                    return Ok(Some(element));
                }
            }
            if Instant::now() + POLL_INTERVAL > deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn click(&mut self, element: &ElementHandle, timeout: Duration) -> Result<(), RenderError> {
        let suffix = format!("/element/{}/click", element.id);
        match self
            .command_within(Method::POST, &suffix, Some(json!({})), timeout)
            .await
        {
            Err(RenderError::Timeout(_)) => {
                Err(RenderError::Timeout(format!("click on {}", element.selector)))
            }
            Err(e) => Err(e),
            Ok(_) => Ok(()),
        }
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, RenderError> {
        let value = self.command(Method::GET, "/screenshot", None).await?;
        let encoded = value
            .as_str()
            .ok_or_else(|| RenderError::InvalidResponse(String::from("screenshot is not a string")))?;
        STANDARD
            .decode(encoded)
            .map_err(|e| RenderError::InvalidResponse(format!("screenshot is not base64: {}", e)))
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.command(Method::DELETE, "", None).await?;
        debug!("Closed WebDriver session {}", self.session_id);
        Ok(())
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        if !self.closed {
            warn!(
                "WebDriver session {} dropped without close, the browser may linger",
                self.session_id
            );
        }
    }
}

/// Sends one WebDriver command and unwraps the `value` member of the reply.
async fn send_command(
    client: &Client,
    method: Method,
    url: &str,
    body: Option<Value>,
    timeout: Duration,
) -> Result<Value, RenderError> {
    let mut request = client.request(method, url).timeout(timeout);
    if let Some(body) = body {
        request = request.json(&body);
    }
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;

    let parsed: Value = serde_json::from_str(&text).map_err(|e| {
        RenderError::InvalidResponse(format!("{} from {}: {}", status, url, e))
    })?;
    let value = parsed.get("value").cloned().unwrap_or(Value::Null);

    if !status.is_success() {
        let error = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(RenderError::Driver { error, message });
    }
    Ok(value)
}
