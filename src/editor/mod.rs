//! In-memory document engine driven by the sync session.
//!
//! Provides rope-backed line buffers carrying the local cursor, and the
//! workspace that owns them along with the active-buffer pointer and
//! highlight markers. Nothing here is thread-safe; it lives on the
//! consumer thread.

mod buffer;
mod workspace;

pub use buffer::{Buffer, BufferError, Cursor};
pub use workspace::{
    ActiveBufferGuard, BufferHandle, Color, Highlight, HighlightStyle, MarkerId, Workspace,
};
