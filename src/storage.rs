//! Storage subsystem
//!
//! Local persistence of capture artifacts.
//!
//! Components:
//! - `local_retention`: bounded, oldest-first pruning of the capture directory.

pub mod local_retention;

pub use local_retention::{LocalRetentionManager, PruneReport};
