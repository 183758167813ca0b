//! Scripted [`RenderCapability`] used by tests.
//!
//! Behaviour is keyed by URL; every call is recorded in a shared `RenderLog`.

use super::render_trait::{RenderCapability, RenderSession};
use super::types::{ElementHandle, Readiness, Selector};
use crate::configuration::types::ViewportProfile;
use crate::error_handling::types::RenderError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Clone, Default)]
pub struct PageScript {
    pub fail_navigation: bool,
    pub fail_screenshot: bool,
    /// Selectors that resolve to a visible element on this page.
    pub visible: Vec<Selector>,
}

#[derive(Debug, Default)]
pub struct RenderLog {
    pub opened: usize,
    pub closed: usize,
    pub visited: Vec<String>,
    pub lookups: Vec<Vec<Selector>>,
    pub clicks: Vec<Selector>,
    pub waits: Vec<Duration>,
}

/// Parks navigation until released; lets tests hold a trigger in flight.
#[derive(Default)]
pub struct NavigationGate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
pub struct ScriptedRenderer {
    pub pages: HashMap<String, PageScript>,
    pub fail_open: bool,
    pub log: Arc<Mutex<RenderLog>>,
    pub gate: Option<Arc<NavigationGate>>,
}

impl ScriptedRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, script: PageScript) -> Self {
        self.pages.insert(url.to_string(), script);
        self
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, RenderLog> {
        self.log.lock().unwrap()
    }
}

#[async_trait]
impl RenderCapability for ScriptedRenderer {
    async fn open(&self, _profile: &ViewportProfile) -> Result<Box<dyn RenderSession>, RenderError> {
        if self.fail_open {
            return Err(RenderError::SessionFailed(String::from("browser unavailable")));
        }
        self.log.lock().unwrap().opened += 1;
        Ok(Box::new(ScriptedSession {
            pages: self.pages.clone(),
            page: PageScript::default(),
            url: String::new(),
            log: self.log.clone(),
            gate: self.gate.clone(),
        }))
    }
}

struct ScriptedSession {
    pages: HashMap<String, PageScript>,
    page: PageScript,
    url: String,
    log: Arc<Mutex<RenderLog>>,
    gate: Option<Arc<NavigationGate>>,
}

#[async_trait]
impl RenderSession for ScriptedSession {
    async fn goto(
        &mut self,
        url: &str,
        _readiness: Readiness,
        _timeout: Duration,
    ) -> Result<(), RenderError> {
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.log.lock().unwrap().visited.push(url.to_string());
        self.url = url.to_string();
        self.page = self.pages.get(url).cloned().unwrap_or_default();
        if self.page.fail_navigation {
            return Err(RenderError::NavigationTimeout(url.to_string()));
        }
        Ok(())
    }

    async fn find_first_visible(
        &mut self,
        candidates: &[Selector],
        _timeout: Duration,
    ) -> Result<Option<ElementHandle>, RenderError> {
        self.log.lock().unwrap().lookups.push(candidates.to_vec());
        Ok(candidates
            .iter()
            .find(|c| self.page.visible.contains(c))
            .map(|c| ElementHandle {
                id: format!("el-{}", c.value()),
                selector: c.clone(),
            }))
    }

    async fn click(&mut self, element: &ElementHandle, _timeout: Duration) -> Result<(), RenderError> {
        self.log.lock().unwrap().clicks.push(element.selector.clone());
        Ok(())
    }

    async fn wait(&mut self, duration: Duration) {
        self.log.lock().unwrap().waits.push(duration);
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, RenderError> {
        if self.page.fail_screenshot {
            return Err(RenderError::Driver {
                error: String::from("unknown error"),
                message: String::from("tab crashed"),
            });
        }
        Ok(format!("png:{}", self.url).into_bytes())
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        self.log.lock().unwrap().closed += 1;
        Ok(())
    }
}
