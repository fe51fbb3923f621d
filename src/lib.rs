// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. edit::EditKind)
    clippy::module_name_repetitions
)]

//! # collabsync
//!
//! Real-time collaborative edits for an editor whose core is single-threaded.
//!
//! Edits from collaborators arrive on other threads. They are decoded,
//! queued, and applied on the editor thread only, at points where touching
//! buffers is safe:
//! - Producers decode wire messages and enqueue them
//! - The editor wakes on a signal, drains the queue, and applies each edit
//! - Local cursor moves are published back out
//!
//! ## Modules
//!
//! - [`edit`]: Edit model and the JSON wire codec
//! - [`queue`]: Thread-safe hand-off from producers to the editor thread
//! - [`editor`]: In-memory buffers and workspace the edits are applied to
//! - [`session`]: Applying edits, document registry, presence, publishing
//! - [`transport`]: Reading and writing message streams
//! - [`config`]: Saved command-line defaults

pub mod config;
pub mod edit;
pub mod editor;
pub mod queue;
pub mod session;
pub mod transport;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::edit::{BufferId, Edit, EditKind, UserId};
    pub use crate::editor::{Buffer, Workspace};
    pub use crate::session::{Producer, Session};
}
