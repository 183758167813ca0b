//! Capture subsystem
//!
//! Turns a URL into a local screenshot file.
//!
//! Components:
//! - `capture_engine`: session lifecycle, settle delay and file output.
//! - `consent`: rule-based cookie banner dismissal.
//! - `types`: `LocalArtifact` and its file naming.

pub mod capture_engine;
pub mod consent;
pub mod types;

pub use capture_engine::{CaptureEngine, CaptureSettings};
pub use consent::{ConsentDismisser, DismissOutcome, DismissRule};
pub use types::LocalArtifact;
