//! Edit model types.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static USER_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_]*$").expect("user id pattern is valid")
});

/// Identifies which document an edit applies to. Ids are never recycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BufferId(pub u64);

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A remote collaborator's identifier.
///
/// Restricted to `[A-Za-z0-9_]*` because it is embedded in highlight group
/// names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    /// Validate and wrap a user id. Returns `None` for disallowed characters.
    pub fn parse(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        USER_ID_PATTERN.is_match(&id).then_some(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One mutation, or cursor notification, exchanged with a collaborator.
///
/// Line numbers are 1-based; for [`EditKind::AppendLine`] line 0 means
/// "before the first line". Columns are 0-based character offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub target: BufferId,
    pub kind: EditKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditKind {
    /// A collaborator's cursor moved.
    CursorMove {
        user: UserId,
        line: usize,
        column: usize,
    },
    /// A new line was added after `after`.
    AppendLine { after: usize, text: String },
    /// Text was inserted into an existing line before character `index`.
    InsertText {
        line: usize,
        index: usize,
        text: String,
    },
    /// A line was removed.
    RemoveLine { line: usize },
    /// `length` characters were removed from a line starting at `index`.
    DeleteText {
        line: usize,
        index: usize,
        length: usize,
    },
    /// A line's content was replaced. Only ever sent outbound.
    ReplaceLine { line: usize, text: String },
    /// Full snapshot of a document, opening it if needed.
    BufferSync {
        filename: String,
        lines: Vec<String>,
    },
}

impl Edit {
    pub const fn new(target: BufferId, kind: EditKind) -> Self {
        Self { target, kind }
    }
}

impl EditKind {
    /// The wire tag naming this kind.
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::CursorMove { .. } => super::codec::TYPE_CURSOR_MOVE,
            Self::AppendLine { .. } => super::codec::TYPE_APPEND_LINE,
            Self::InsertText { .. } => super::codec::TYPE_INSERT_TEXT,
            Self::RemoveLine { .. } => super::codec::TYPE_REMOVE_LINE,
            Self::DeleteText { .. } => super::codec::TYPE_DELETE_TEXT,
            Self::ReplaceLine { .. } => super::codec::TYPE_REPLACE_LINE,
            Self::BufferSync { .. } => super::codec::TYPE_BUFFER_SYNC,
        }
    }
}
