//! Rendering subsystem
//!
//! The external "render a URL to pixels" capability.
//!
//! Components:
//! - `render_trait`: the `RenderCapability` / `RenderSession` port.
//! - `types`: selectors, readiness signals and element handles.
//! - `webdriver`: W3C WebDriver implementation over HTTP.
//! - `driver_process`: optional child process running the WebDriver binary.

pub mod driver_process;
pub mod render_trait;
pub mod types;
pub mod webdriver;

pub use driver_process::DriverProcess;
pub use render_trait::{RenderCapability, RenderSession};
pub use types::{ElementHandle, Readiness, Selector};
pub use webdriver::WebDriverRenderer;

#[cfg(test)]
pub mod scripted;
