//! The editor side of a collaborative session.
//!
//! A [`Session`] owns the workspace and everything that must only be touched
//! on the editor thread. Other threads get a cloneable [`Producer`] and hand
//! edits over through the shared [`EditQueue`]; the editor thread applies them
//! at safe points via [`Session::process_pending`] or [`Session::wait`].

mod apply;
mod outbound;
mod presence;
mod registry;

pub use apply::{Applier, ApplyError, ApplyStats};
pub use outbound::{CursorTracker, Publisher};
pub use presence::{PALETTE, Presence, PresenceTracker};
pub use registry::{DocumentRegistry, RegistryError};

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::edit::{BufferId, CodecError, Edit, EditKind, codec};
use crate::editor::{Buffer, BufferHandle, Workspace};
use crate::queue::{EditQueue, WakeSignal};

/// Enqueues edits from any thread.
#[derive(Debug, Clone)]
pub struct Producer {
    queue: Arc<EditQueue>,
}

impl Producer {
    pub fn push(&self, edit: Edit) {
        self.queue.enqueue(edit);
    }

    /// Decode a wire message and enqueue it. Messages that do not decode are
    /// logged and dropped.
    ///
    /// # Errors
    ///
    /// Returns the decode error so callers can count rejects.
    pub fn push_message(&self, message: &Value) -> Result<(), CodecError> {
        match codec::decode(message) {
            Ok(edit) => {
                self.push(edit);
                Ok(())
            }
            Err(err) => {
                tracing::warn!("dropping inbound message: {err}");
                Err(err)
            }
        }
    }

    /// Like [`push_message`](Self::push_message), for one raw JSON document.
    ///
    /// # Errors
    ///
    /// Returns the decode error if the bytes are not a valid message.
    pub fn push_bytes(&self, bytes: &[u8]) -> Result<(), CodecError> {
        match codec::decode_slice(bytes) {
            Ok(edit) => {
                self.push(edit);
                Ok(())
            }
            Err(err) => {
                tracing::warn!("dropping inbound message: {err}");
                Err(err)
            }
        }
    }
}

/// Where the local user's cursor is, in wire coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocalCursor {
    pub buffer: BufferId,
    /// 1-based.
    pub line: usize,
    pub column: usize,
}

/// Serializable view of one shared document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferSnapshot {
    pub id: BufferId,
    pub filename: String,
    pub lines: Vec<String>,
    pub cursor: (usize, usize),
    pub active: bool,
}

/// Editor-thread state of a collaborative session.
pub struct Session {
    queue: Arc<EditQueue>,
    wake: WakeSignal,
    workspace: Workspace,
    registry: DocumentRegistry,
    presence: PresenceTracker,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_workspace(Workspace::new())
    }

    /// Start a session around buffers that are already open.
    pub fn with_workspace(workspace: Workspace) -> Self {
        let (queue, wake) = EditQueue::new();
        Self {
            queue: Arc::new(queue),
            wake,
            workspace,
            registry: DocumentRegistry::new(),
            presence: PresenceTracker::new(),
        }
    }

    /// A handle other threads can enqueue through.
    pub fn producer(&self) -> Producer {
        Producer {
            queue: Arc::clone(&self.queue),
        }
    }

    pub fn has_pending(&self) -> bool {
        self.queue.has_pending()
    }

    /// Number of edits waiting to be applied.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Apply everything queued so far, in arrival order.
    pub fn process_pending(&mut self) -> ApplyStats {
        let edits = self.queue.drain_all();
        if edits.is_empty() {
            return ApplyStats::default();
        }
        tracing::debug!("applying {} queued edits", edits.len());
        self.applier().apply_all(edits)
    }

    /// Block until an edit arrives or `timeout` elapses, then apply whatever
    /// is queued.
    pub fn wait(&mut self, timeout: Duration) -> ApplyStats {
        if self.queue.has_pending() {
            self.wake.try_consume();
        } else {
            self.wake.wait(timeout);
        }
        self.process_pending()
    }

    /// Apply one edit immediately, bypassing the queue.
    ///
    /// # Errors
    ///
    /// See [`Applier::apply`].
    pub fn apply(&mut self, edit: Edit) -> Result<(), ApplyError> {
        self.applier().apply(edit)
    }

    pub fn applier(&mut self) -> Applier<'_> {
        Applier::new(&mut self.workspace, &mut self.registry, &mut self.presence)
    }

    pub const fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn workspace_mut(&mut self) -> &mut Workspace {
        &mut self.workspace
    }

    pub const fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    pub const fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    /// Open a local document in a new buffer and make it active.
    pub fn open_local(&mut self, name: &str, text: &str) -> BufferHandle {
        let mut buffer = Buffer::from_text(text);
        buffer.set_name(name);
        let handle = self.workspace.insert_buffer(buffer);
        self.workspace.set_active(handle);
        handle
    }

    /// Share an open buffer under `id`.
    ///
    /// Returns the sync that seeds collaborators with the buffer's content,
    /// or `None` if `handle` is not open. Publishing it is up to the caller.
    pub fn share(&mut self, id: BufferId, handle: BufferHandle) -> Option<Edit> {
        let buffer = self.workspace.buffer(handle)?;
        let lines = if buffer.is_empty() {
            Vec::new()
        } else {
            buffer.lines()
        };
        let edit = Edit::new(
            id,
            EditKind::BufferSync {
                filename: buffer.name().to_string(),
                lines,
            },
        );
        self.registry.bind(id, handle);
        tracing::debug!("sharing {} as {id}", buffer.name());
        Some(edit)
    }

    /// The buffer shared under `id`.
    pub fn document(&self, id: BufferId) -> Option<&Buffer> {
        let handle = self.registry.resolve(id).ok()?;
        self.workspace.buffer(handle)
    }

    /// The local cursor, if the active buffer is shared.
    pub fn local_cursor(&self) -> Option<LocalCursor> {
        let buffer = self.registry.active_id(&self.workspace)?;
        let cursor = self.workspace.active_buffer()?.cursor();
        Some(LocalCursor {
            buffer,
            line: cursor.line + 1,
            column: cursor.col,
        })
    }

    /// Every shared document, in id order.
    pub fn snapshot(&self) -> Vec<BufferSnapshot> {
        let active = self.workspace.active();
        self.registry
            .iter()
            .filter_map(|(id, handle)| {
                let buffer = self.workspace.buffer(handle)?;
                let cursor = buffer.cursor();
                Some(BufferSnapshot {
                    id,
                    filename: buffer.name().to_string(),
                    lines: buffer.lines(),
                    cursor: (cursor.line + 1, cursor.col),
                    active: active == Some(handle),
                })
            })
            .collect()
    }
}
