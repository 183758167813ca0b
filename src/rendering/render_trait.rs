//! Render Trait
//!
//! The capability to render a URL into pixels. The capture engine depends only on
//! these traits; `WebDriverRenderer` is the production implementation.

use super::types::{ElementHandle, Readiness, Selector};
use crate::configuration::types::ViewportProfile;
use crate::error_handling::types::RenderError;
use async_trait::async_trait;
use std::time::Duration;

/// Opens isolated rendering sessions.
#[async_trait]
pub trait RenderCapability: Send + Sync {
    /// Opens a fresh session with the given viewport and identity. Sessions
    /// never share cookies or storage.
    async fn open(&self, profile: &ViewportProfile) -> Result<Box<dyn RenderSession>, RenderError>;
}

/// One isolated browsing context. `close` must be called on every exit path.
#[async_trait]
pub trait RenderSession: Send {
    async fn goto(
        &mut self,
        url: &str,
        readiness: Readiness,
        timeout: Duration,
    ) -> Result<(), RenderError>;

    /// First element matching any candidate, in candidate order, that becomes
    /// visible before `timeout`. `Ok(None)` when nothing shows up.
    async fn find_first_visible(
        &mut self,
        candidates: &[Selector],
        timeout: Duration,
    ) -> Result<Option<ElementHandle>, RenderError>;

    async fn click(&mut self, element: &ElementHandle, timeout: Duration)
        -> Result<(), RenderError>;

    async fn wait(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// PNG of the visible viewport only.
    async fn screenshot(&mut self) -> Result<Vec<u8>, RenderError>;

    async fn close(&mut self) -> Result<(), RenderError>;
}
