use super::LocalCursor;
use crate::edit::{Edit, EditKind, UserId, codec};
use crate::transport::Transport;

/// Sends local edits to collaborators as they happen. No queueing, no retry.
pub struct Publisher<T> {
    transport: T,
}

impl<T: Transport> Publisher<T> {
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Encode and send one edit. Returns `false` (after logging) if the
    /// transport refused it.
    pub fn publish(&mut self, edit: &Edit) -> bool {
        match self.transport.send(&codec::encode(edit)) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("failed to publish {} for {}: {err}", edit.kind.tag(), edit.target);
                false
            }
        }
    }

    pub fn into_inner(self) -> T {
        self.transport
    }
}

/// Publishes the local cursor, but only when it actually moved.
#[derive(Debug)]
pub struct CursorTracker {
    user: UserId,
    last: Option<LocalCursor>,
}

impl CursorTracker {
    pub const fn new(user: UserId) -> Self {
        Self { user, last: None }
    }

    /// Compare `current` to the last published position and publish a
    /// cursor move if it changed. Returns whether a message was sent.
    pub fn poll<T: Transport>(
        &mut self,
        current: Option<LocalCursor>,
        publisher: &mut Publisher<T>,
    ) -> bool {
        let Some(cursor) = current else {
            return false;
        };
        if self.last == Some(cursor) {
            return false;
        }
        self.last = Some(cursor);
        let edit = Edit::new(
            cursor.buffer,
            EditKind::CursorMove {
                user: self.user.clone(),
                line: cursor.line,
                column: cursor.column,
            },
        );
        publisher.publish(&edit)
    }
}
