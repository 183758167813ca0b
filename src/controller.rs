//! Controller subsystem
//!
//! Orchestration of the trigger path and process lifetime.
//!
//! Components:
//! - `trigger`: the guarded capture/prune/upload/advance sequence.
//! - `scheduler`: periodic timer triggers.
//! - `status`: read-only status board for the web layer.
//! - `controller_handler`: wiring from `Config` and top-level run loop.

pub mod controller_handler;
pub mod scheduler;
pub mod status;
pub mod trigger;
pub mod types;

pub use controller_handler::Controller;
pub use scheduler::Scheduler;
pub use status::StatusBoard;
pub use trigger::TriggerController;
pub use types::{StatusSnapshot, TriggerOutcome, TriggerSource};
