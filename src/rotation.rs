//! Rotation subsystem
//!
//! Which site is captured next. The cursor survives restarts through the
//! `CursorStore` port and is only ever advanced by the trigger path.
//!
//! Components:
//! - `site_list`: the fixed, validated list of sites.
//! - `cursor_store`: the persistence port and its file/memory backends.
//! - `rotation_state`: modulo-normalised reads and durable advance.

pub mod cursor_store;
pub mod rotation_state;
pub mod site_list;

pub use cursor_store::{CursorStore, FileCursorStore, MemoryCursorStore};
pub use rotation_state::RotationState;
pub use site_list::SiteList;
