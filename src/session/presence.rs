use std::collections::HashMap;

use crate::edit::UserId;
use crate::editor::{BufferHandle, Color, HighlightStyle, MarkerId, Workspace};

/// Colors handed out to collaborators in the order they are first seen.
pub const PALETTE: [Color; 6] = [
    Color::Red,
    Color::Green,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
    Color::Yellow,
];

/// Last known cursor of one remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    pub buffer: BufferHandle,
    pub line: usize,
    pub column: usize,
    pub marker: MarkerId,
    pub style: HighlightStyle,
}

/// Tracks where each remote collaborator's cursor is highlighted.
///
/// Entries never expire: there is no departure event on the wire.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    entries: HashMap<UserId, Presence>,
    seen: usize,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `user`'s highlight to `(line, column)` in `buffer`, replacing the
    /// previous marker.
    pub fn update(
        &mut self,
        workspace: &mut Workspace,
        buffer: BufferHandle,
        user: UserId,
        line: usize,
        column: usize,
    ) -> MarkerId {
        let style = match self.entries.get(&user) {
            Some(previous) => {
                workspace.remove_highlight(previous.marker);
                previous.style.clone()
            }
            None => {
                let color = PALETTE[self.seen % PALETTE.len()];
                self.seen += 1;
                HighlightStyle {
                    group: format!("CollabCursor_{user}"),
                    color,
                }
            }
        };
        let marker = workspace.add_highlight(buffer, line, column, style.clone());
        self.entries.insert(
            user,
            Presence {
                buffer,
                line,
                column,
                marker,
                style,
            },
        );
        marker
    }

    pub fn get(&self, user: &UserId) -> Option<&Presence> {
        self.entries.get(user)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UserId, &Presence)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::parse(id).unwrap()
    }

    #[test]
    fn test_first_move_creates_marker() {
        let mut ws = Workspace::new();
        let buf = ws.create_buffer("doc");
        let mut presence = PresenceTracker::new();
        let marker = presence.update(&mut ws, buf, user("alice"), 2, 5);
        let hl = ws.highlight(marker).unwrap();
        assert_eq!((hl.line, hl.col), (2, 5));
        assert_eq!(hl.style.group, "CollabCursor_alice");
        assert_eq!(hl.style.color, PALETTE[0]);
    }

    #[test]
    fn test_second_move_replaces_marker() {
        let mut ws = Workspace::new();
        let buf = ws.create_buffer("doc");
        let mut presence = PresenceTracker::new();
        let first = presence.update(&mut ws, buf, user("alice"), 1, 0);
        let second = presence.update(&mut ws, buf, user("alice"), 3, 1);
        assert!(ws.highlight(first).is_none());
        assert_eq!(ws.highlights().count(), 1);
        let entry = presence.get(&user("alice")).unwrap();
        assert_eq!((entry.line, entry.column, entry.marker), (3, 1, second));
    }

    #[test]
    fn test_colors_follow_first_seen_order() {
        let mut ws = Workspace::new();
        let buf = ws.create_buffer("doc");
        let mut presence = PresenceTracker::new();
        presence.update(&mut ws, buf, user("b"), 1, 0);
        presence.update(&mut ws, buf, user("a"), 1, 0);
        presence.update(&mut ws, buf, user("b"), 2, 0);
        assert_eq!(presence.get(&user("b")).unwrap().style.color, PALETTE[0]);
        assert_eq!(presence.get(&user("a")).unwrap().style.color, PALETTE[1]);
    }

    #[test]
    fn test_palette_wraps_around() {
        let mut ws = Workspace::new();
        let buf = ws.create_buffer("doc");
        let mut presence = PresenceTracker::new();
        for n in 0..=PALETTE.len() {
            presence.update(&mut ws, buf, user(&format!("u{n}")), 1, 0);
        }
        let last = presence.get(&user(&format!("u{}", PALETTE.len()))).unwrap();
        assert_eq!(last.style.color, PALETTE[0]);
        assert_eq!(presence.len(), PALETTE.len() + 1);
    }
}
