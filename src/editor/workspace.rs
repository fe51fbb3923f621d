use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use super::Buffer;

/// Opaque reference to a buffer owned by a [`Workspace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(usize);

/// Opaque reference to a highlight marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Blue,
    Magenta,
    Cyan,
    Yellow,
}

/// How a highlight marker is drawn: a named highlight group and its color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightStyle {
    pub group: String,
    pub color: Color,
}

/// A single-character highlight at a position in a buffer.
///
/// `line` is 1-based and `col` 0-based, matching wire coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub buffer: BufferHandle,
    pub line: usize,
    pub col: usize,
    pub style: HighlightStyle,
}

/// The host editor state the sync engine drives: every open buffer, which
/// one is active, and the highlight markers drawn over them.
#[derive(Debug, Default)]
pub struct Workspace {
    buffers: Vec<Buffer>,
    active: Option<BufferHandle>,
    highlights: BTreeMap<MarkerId, Highlight>,
    next_marker: u64,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new empty buffer. It does not become active.
    pub fn create_buffer(&mut self, name: impl Into<String>) -> BufferHandle {
        self.buffers.push(Buffer::new(name));
        BufferHandle(self.buffers.len() - 1)
    }

    /// Open a buffer that already holds content.
    pub fn insert_buffer(&mut self, buffer: Buffer) -> BufferHandle {
        self.buffers.push(buffer);
        BufferHandle(self.buffers.len() - 1)
    }

    pub fn buffer(&self, handle: BufferHandle) -> Option<&Buffer> {
        self.buffers.get(handle.0)
    }

    pub fn buffer_mut(&mut self, handle: BufferHandle) -> Option<&mut Buffer> {
        self.buffers.get_mut(handle.0)
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// The buffer the local user is looking at, if any.
    pub const fn active(&self) -> Option<BufferHandle> {
        self.active
    }

    pub fn set_active(&mut self, handle: BufferHandle) {
        self.active = Some(handle);
    }

    pub fn active_buffer(&self) -> Option<&Buffer> {
        self.active.and_then(|handle| self.buffer(handle))
    }

    pub fn active_buffer_mut(&mut self) -> Option<&mut Buffer> {
        self.active.and_then(|handle| self.buffers.get_mut(handle.0))
    }

    /// Make `handle` active until the returned guard drops.
    ///
    /// The previously active buffer is restored on drop, including during
    /// unwinding. When nothing was active, `handle` stays active.
    pub fn switch_to(&mut self, handle: BufferHandle) -> ActiveBufferGuard<'_> {
        let previous = self.active.replace(handle);
        ActiveBufferGuard {
            workspace: self,
            previous,
        }
    }

    pub fn add_highlight(
        &mut self,
        buffer: BufferHandle,
        line: usize,
        col: usize,
        style: HighlightStyle,
    ) -> MarkerId {
        let id = MarkerId(self.next_marker);
        self.next_marker += 1;
        self.highlights.insert(
            id,
            Highlight {
                buffer,
                line,
                col,
                style,
            },
        );
        id
    }

    /// Remove a highlight. Returns `false` if the marker was already gone.
    pub fn remove_highlight(&mut self, id: MarkerId) -> bool {
        self.highlights.remove(&id).is_some()
    }

    pub fn highlight(&self, id: MarkerId) -> Option<&Highlight> {
        self.highlights.get(&id)
    }

    pub fn highlights(&self) -> impl Iterator<Item = (MarkerId, &Highlight)> {
        self.highlights.iter().map(|(id, hl)| (*id, hl))
    }
}

/// Scoped switch of the active buffer; see [`Workspace::switch_to`].
pub struct ActiveBufferGuard<'a> {
    workspace: &'a mut Workspace,
    previous: Option<BufferHandle>,
}

impl Deref for ActiveBufferGuard<'_> {
    type Target = Workspace;

    fn deref(&self) -> &Workspace {
        self.workspace
    }
}

impl DerefMut for ActiveBufferGuard<'_> {
    fn deref_mut(&mut self) -> &mut Workspace {
        self.workspace
    }
}

impl Drop for ActiveBufferGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous {
            self.workspace.active = Some(previous);
        }
    }
}
