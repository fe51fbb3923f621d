//! Realizing inbound edits against workspace buffers.
//!
//! Edits carry 1-based line numbers; buffers use 0-based indices. The
//! translation, and the adjustment of the local cursor so it keeps pointing
//! at the same text, happens here.

use thiserror::Error;

use super::{DocumentRegistry, PresenceTracker, RegistryError};
use crate::edit::{BufferId, Edit, EditKind};
use crate::editor::{Buffer, BufferError, Workspace};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("no document is registered for {0}")]
    TargetNotFound(BufferId),
    #[error("`{0}` edits are outbound-only")]
    UnexpectedKind(&'static str),
    #[error("line {line} does not exist in a {count}-line document")]
    LineOutOfRange { line: usize, count: usize },
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

impl From<RegistryError> for ApplyError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(id) => Self::TargetNotFound(id),
        }
    }
}

/// Outcome of applying a batch of edits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyStats {
    pub applied: usize,
    pub skipped: usize,
}

/// Applies edits to the workspace on the editor thread.
pub struct Applier<'a> {
    workspace: &'a mut Workspace,
    registry: &'a mut DocumentRegistry,
    presence: &'a mut PresenceTracker,
}

impl<'a> Applier<'a> {
    pub const fn new(
        workspace: &'a mut Workspace,
        registry: &'a mut DocumentRegistry,
        presence: &'a mut PresenceTracker,
    ) -> Self {
        Self {
            workspace,
            registry,
            presence,
        }
    }

    /// Apply edits in order. A failing edit is logged and skipped; the rest
    /// of the batch still applies.
    pub fn apply_all(&mut self, edits: impl IntoIterator<Item = Edit>) -> ApplyStats {
        let mut stats = ApplyStats::default();
        for edit in edits {
            let target = edit.target;
            let tag = edit.kind.tag();
            match self.apply(edit) {
                Ok(()) => {
                    stats.applied += 1;
                    tracing::debug!("applied {tag} to {target}");
                }
                Err(ApplyError::UnexpectedKind(kind)) => {
                    stats.skipped += 1;
                    tracing::warn!("discarding inbound {kind} edit for {target}: outbound-only kind");
                }
                Err(err) => {
                    stats.skipped += 1;
                    tracing::warn!("skipping {tag} edit for {target}: {err}");
                }
            }
        }
        stats
    }

    /// Apply one edit. The target buffer is made active for the duration and
    /// the previously active buffer is restored afterwards, on success or
    /// failure.
    ///
    /// # Errors
    ///
    /// Fails without touching the document if the target is unknown (for
    /// anything but a sync), the kind is outbound-only, or a position is
    /// out of range.
    pub fn apply(&mut self, edit: Edit) -> Result<(), ApplyError> {
        let Edit { target, kind } = edit;
        match kind {
            EditKind::ReplaceLine { .. } => Err(ApplyError::UnexpectedKind(kind.tag())),
            EditKind::BufferSync { filename, lines } => {
                let handle = self.registry.get_or_create(self.workspace, target, &filename);
                let mut ws = self.workspace.switch_to(handle);
                let buffer = ws
                    .active_buffer_mut()
                    .ok_or(ApplyError::TargetNotFound(target))?;
                sync_buffer(buffer, &lines)
            }
            EditKind::CursorMove { user, line, column } => {
                let handle = self.registry.resolve(target)?;
                let mut ws = self.workspace.switch_to(handle);
                self.presence.update(&mut ws, handle, user, line, column);
                Ok(())
            }
            kind => {
                let handle = self.registry.resolve(target)?;
                let mut ws = self.workspace.switch_to(handle);
                let buffer = ws
                    .active_buffer_mut()
                    .ok_or(ApplyError::TargetNotFound(target))?;
                apply_to_buffer(buffer, kind)
            }
        }
    }
}

fn apply_to_buffer(buffer: &mut Buffer, kind: EditKind) -> Result<(), ApplyError> {
    match kind {
        EditKind::AppendLine { after, text } => append_line(buffer, after, &text),
        EditKind::InsertText { line, index, text } => insert_text(buffer, line, index, &text),
        EditKind::RemoveLine { line } => remove_line(buffer, line),
        EditKind::DeleteText {
            line,
            index,
            length,
        } => delete_text(buffer, line, index, length),
        EditKind::CursorMove { .. } | EditKind::ReplaceLine { .. } | EditKind::BufferSync { .. } => {
            Err(ApplyError::UnexpectedKind(kind.tag()))
        }
    }
}

/// Convert a 1-based line number to an index into `buffer`.
fn line_index(buffer: &Buffer, line: usize) -> Result<usize, ApplyError> {
    let count = buffer.line_count();
    if line == 0 || line > count {
        return Err(ApplyError::LineOutOfRange { line, count });
    }
    Ok(line - 1)
}

fn append_line(buffer: &mut Buffer, after: usize, text: &str) -> Result<(), ApplyError> {
    let count = buffer.line_count();
    if after > count {
        return Err(ApplyError::LineOutOfRange { line: after, count });
    }
    let was_empty = buffer.is_empty();
    // Line number `after` is also the 0-based index of the new line.
    buffer.insert_line(after, text)?;
    let inserted = if was_empty { 0 } else { after };

    let mut cursor = buffer.cursor();
    if !was_empty && cursor.line >= inserted {
        cursor.line += 1;
    }
    buffer.set_cursor(cursor.line, cursor.col);
    buffer.mark_changed(inserted..inserted + 1);
    Ok(())
}

fn insert_text(buffer: &mut Buffer, line: usize, index: usize, text: &str) -> Result<(), ApplyError> {
    let idx = line_index(buffer, line)?;
    buffer.insert_text(idx, index, text)?;

    let mut cursor = buffer.cursor();
    if cursor.line == idx && cursor.col >= index {
        cursor.col += text.chars().count();
    }
    buffer.set_cursor(cursor.line, cursor.col);
    buffer.mark_changed(idx..idx + 1);
    Ok(())
}

fn remove_line(buffer: &mut Buffer, line: usize) -> Result<(), ApplyError> {
    let idx = line_index(buffer, line)?;
    let was_last = idx + 1 == buffer.line_count();
    buffer.delete_line(idx)?;

    let mut cursor = buffer.cursor();
    if cursor.line > idx {
        cursor.line -= 1;
    } else if cursor.line == idx {
        if was_last {
            cursor.line = buffer.line_count() - 1;
            cursor.col = buffer.line_len(cursor.line).saturating_sub(1);
        } else {
            cursor.col = 0;
        }
    }
    buffer.set_cursor(cursor.line, cursor.col);
    buffer.mark_changed(idx..idx + 1);
    Ok(())
}

fn delete_text(buffer: &mut Buffer, line: usize, index: usize, length: usize) -> Result<(), ApplyError> {
    let idx = line_index(buffer, line)?;
    buffer.delete_text(idx, index, length)?;

    let mut cursor = buffer.cursor();
    if cursor.line == idx && cursor.col >= index {
        if cursor.col < index + length {
            cursor.col = index;
        } else {
            cursor.col -= length;
        }
    }
    buffer.set_cursor(cursor.line, cursor.col);
    buffer.mark_changed(idx..idx + 1);
    Ok(())
}

/// Make `buffer` hold exactly `lines`, rewriting overlapping lines in place.
fn sync_buffer(buffer: &mut Buffer, lines: &[String]) -> Result<(), ApplyError> {
    // Validate up front so a bad line cannot leave a half-synced document.
    if lines.iter().any(|line| line.contains('\n')) {
        return Err(BufferError::EmbeddedNewline.into());
    }
    let old = if buffer.is_empty() {
        0
    } else {
        buffer.line_count()
    };
    let new = lines.len();

    for (idx, line) in lines.iter().enumerate().take(old.min(new)) {
        buffer.replace_line(idx, line)?;
    }
    for (idx, line) in lines.iter().enumerate().skip(old) {
        buffer.insert_line(idx, line)?;
    }
    for idx in (new..old).rev() {
        buffer.delete_line(idx)?;
    }

    buffer.clamp_cursor();
    buffer.mark_changed(0..old.max(new).max(1));
    Ok(())
}
