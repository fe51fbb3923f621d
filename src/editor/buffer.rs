use std::ops::Range;

use ropey::Rope;
use thiserror::Error;

/// Local cursor position in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Zero-based line index.
    pub line: usize,
    /// Zero-based column, counted in characters.
    pub col: usize,
}

impl Cursor {
    /// Create a cursor at line 0, column 0.
    pub const fn new() -> Self {
        Self { line: 0, col: 0 }
    }

    /// Create a cursor at a specific position.
    pub const fn at(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// Failure of a single buffer operation. The buffer is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("line index {line} is out of range (buffer has {count} lines)")]
    LineOutOfRange { line: usize, count: usize },
    #[error("columns {start}..{end} are out of range for line {line} of length {len}")]
    ColumnOutOfRange {
        line: usize,
        start: usize,
        end: usize,
        len: usize,
    },
    #[error("text contains an embedded newline")]
    EmbeddedNewline,
}

/// A line-oriented text buffer backed by a rope.
///
/// Lines are stored without their trailing newline, so a buffer always has
/// at least one line. A fresh buffer is *empty*: its single line is a
/// placeholder that the first inserted line replaces.
///
/// All line arguments are zero-based indices and all columns count
/// characters, not bytes.
pub struct Buffer {
    name: String,
    rope: Rope,
    empty: bool,
    cursor: Cursor,
    changed: Vec<Range<usize>>,
}

impl Buffer {
    /// Create an empty buffer with the given display name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rope: Rope::new(),
            empty: true,
            cursor: Cursor::new(),
            changed: Vec::new(),
        }
    }

    /// Create an unnamed buffer from newline-separated text.
    pub fn from_text(text: &str) -> Self {
        let mut buf = Self::new("");
        if !text.is_empty() {
            buf.rope = Rope::from_str(text);
            buf.empty = false;
        }
        buf
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Whether the buffer still only holds its placeholder line.
    pub const fn is_empty(&self) -> bool {
        self.empty
    }

    /// Total number of lines in the buffer.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Get the content of a line (without trailing newline).
    pub fn line_at(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let mut line = self.rope.line(line_idx).to_string();
        if line.ends_with('\n') {
            line.pop();
        }
        Some(line)
    }

    /// Length of a line in characters (without trailing newline).
    pub fn line_len(&self, line_idx: usize) -> usize {
        if line_idx >= self.rope.len_lines() {
            return 0;
        }
        let line = self.rope.line(line_idx);
        let len = line.len_chars();
        if len > 0 && line.char(len - 1) == '\n' {
            len - 1
        } else {
            len
        }
    }

    /// All lines, in order.
    pub fn lines(&self) -> Vec<String> {
        (0..self.line_count())
            .filter_map(|idx| self.line_at(idx))
            .collect()
    }

    /// The full text content of the buffer.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Insert a new line so that it ends up at `line_idx`.
    ///
    /// `line_idx == line_count()` appends after the last line. On an empty
    /// buffer the placeholder line is replaced instead.
    pub fn insert_line(&mut self, line_idx: usize, text: &str) -> Result<(), BufferError> {
        check_text(text)?;
        let count = self.line_count();
        if line_idx > count {
            return Err(BufferError::LineOutOfRange {
                line: line_idx,
                count,
            });
        }
        if self.empty {
            self.rope = Rope::from_str(text);
            self.empty = false;
            return Ok(());
        }
        if line_idx == count {
            let end = self.rope.len_chars();
            self.rope.insert(end, &format!("\n{text}"));
        } else {
            let start = self.rope.line_to_char(line_idx);
            self.rope.insert(start, &format!("{text}\n"));
        }
        Ok(())
    }

    /// Delete the line at `line_idx`. Deleting the only line leaves an empty buffer.
    pub fn delete_line(&mut self, line_idx: usize) -> Result<(), BufferError> {
        let count = self.check_line(line_idx)?;
        if count == 1 {
            self.rope = Rope::new();
            self.empty = true;
            return Ok(());
        }
        let range = if line_idx + 1 == count {
            // Last line: take the newline that precedes it.
            self.rope.line_to_char(line_idx) - 1..self.rope.len_chars()
        } else {
            self.rope.line_to_char(line_idx)..self.rope.line_to_char(line_idx + 1)
        };
        self.rope.remove(range);
        Ok(())
    }

    /// Insert `text` into a line before character `col`.
    pub fn insert_text(&mut self, line_idx: usize, col: usize, text: &str) -> Result<(), BufferError> {
        check_text(text)?;
        self.check_line(line_idx)?;
        let len = self.line_len(line_idx);
        if col > len {
            return Err(BufferError::ColumnOutOfRange {
                line: line_idx,
                start: col,
                end: col,
                len,
            });
        }
        if text.is_empty() {
            return Ok(());
        }
        let start = self.rope.line_to_char(line_idx) + col;
        self.rope.insert(start, text);
        self.empty = false;
        Ok(())
    }

    /// Remove `count` characters from a line starting at character `col`.
    pub fn delete_text(&mut self, line_idx: usize, col: usize, count: usize) -> Result<(), BufferError> {
        self.check_line(line_idx)?;
        let len = self.line_len(line_idx);
        let end = col.saturating_add(count);
        if end > len {
            return Err(BufferError::ColumnOutOfRange {
                line: line_idx,
                start: col,
                end,
                len,
            });
        }
        let start = self.rope.line_to_char(line_idx) + col;
        self.rope.remove(start..start + count);
        Ok(())
    }

    /// Replace the whole content of a line.
    pub fn replace_line(&mut self, line_idx: usize, text: &str) -> Result<(), BufferError> {
        check_text(text)?;
        self.check_line(line_idx)?;
        let start = self.rope.line_to_char(line_idx);
        let end = start + self.line_len(line_idx);
        self.rope.remove(start..end);
        self.rope.insert(start, text);
        self.empty = false;
        Ok(())
    }

    /// Record a range of line indices that needs redrawing.
    pub fn mark_changed(&mut self, lines: Range<usize>) {
        self.changed.push(lines);
    }

    /// Take the line ranges marked for redraw since the last call.
    pub fn take_changed(&mut self) -> Vec<Range<usize>> {
        std::mem::take(&mut self.changed)
    }

    /// The local cursor position.
    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Move the local cursor, clamping it into the buffer.
    pub fn set_cursor(&mut self, line: usize, col: usize) {
        let max_line = self.line_count().saturating_sub(1);
        self.cursor.line = line.min(max_line);
        self.cursor.col = col.min(self.line_len(self.cursor.line));
    }

    /// Pull the cursor back inside the buffer after lines or text went away.
    pub fn clamp_cursor(&mut self) {
        self.set_cursor(self.cursor.line, self.cursor.col);
    }

    fn check_line(&self, line_idx: usize) -> Result<usize, BufferError> {
        let count = self.line_count();
        if line_idx >= count {
            return Err(BufferError::LineOutOfRange {
                line: line_idx,
                count,
            });
        }
        Ok(count)
    }
}

fn check_text(text: &str) -> Result<(), BufferError> {
    if text.contains('\n') {
        return Err(BufferError::EmbeddedNewline);
    }
    Ok(())
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("name", &self.name)
            .field(
                "rope",
                &format_args!("Rope({} lines)", self.rope.len_lines()),
            )
            .field("empty", &self.empty)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}
