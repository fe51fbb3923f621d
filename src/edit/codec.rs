//! Translation between [`Edit`] and the dictionary messages that cross the
//! process boundary.
//!
//! A message is a JSON object with a `collabedit_type` tag, a `buf_id` and
//! the fields of that kind. Decoding either produces a complete [`Edit`] or
//! an error; nothing partially built escapes.

use serde_json::{Map, Value};
use thiserror::Error;

use super::{BufferId, Edit, EditKind, UserId};

pub const TYPE_KEY: &str = "collabedit_type";
pub const BUF_ID_KEY: &str = "buf_id";
pub const LINE_KEY: &str = "line";
pub const COLUMN_KEY: &str = "column";
pub const TEXT_KEY: &str = "text";
pub const INDEX_KEY: &str = "index";
pub const LENGTH_KEY: &str = "length";
pub const FILENAME_KEY: &str = "filename";
pub const LINES_KEY: &str = "lines";
pub const USER_ID_KEY: &str = "user_id";

pub const TYPE_CURSOR_MOVE: &str = "cursor_move";
pub const TYPE_APPEND_LINE: &str = "append_line";
pub const TYPE_INSERT_TEXT: &str = "insert_text";
pub const TYPE_REMOVE_LINE: &str = "remove_line";
pub const TYPE_DELETE_TEXT: &str = "delete_text";
pub const TYPE_REPLACE_LINE: &str = "replace_line";
pub const TYPE_BUFFER_SYNC: &str = "buffer_sync";

/// Why an inbound message could not become an [`Edit`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("malformed message: {0}")]
    MalformedMessage(String),
    #[error("unknown edit kind `{0}`")]
    UnknownEditKind(String),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` should be {expected}")]
    WrongFieldType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("field `{field}` is invalid: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
}

/// Encode an edit as a message dictionary.
pub fn encode(edit: &Edit) -> Value {
    let mut map = Map::new();
    map.insert(TYPE_KEY.into(), Value::from(edit.kind.tag()));
    map.insert(BUF_ID_KEY.into(), Value::from(edit.target.0));
    match &edit.kind {
        EditKind::CursorMove { user, line, column } => {
            map.insert(USER_ID_KEY.into(), Value::from(user.as_str()));
            map.insert(LINE_KEY.into(), Value::from(*line));
            map.insert(COLUMN_KEY.into(), Value::from(*column));
        }
        EditKind::AppendLine { after, text } => {
            map.insert(LINE_KEY.into(), Value::from(*after));
            map.insert(TEXT_KEY.into(), Value::from(text.as_str()));
        }
        EditKind::InsertText { line, index, text } => {
            map.insert(LINE_KEY.into(), Value::from(*line));
            map.insert(INDEX_KEY.into(), Value::from(*index));
            map.insert(TEXT_KEY.into(), Value::from(text.as_str()));
        }
        EditKind::RemoveLine { line } => {
            map.insert(LINE_KEY.into(), Value::from(*line));
        }
        EditKind::DeleteText {
            line,
            index,
            length,
        } => {
            map.insert(LINE_KEY.into(), Value::from(*line));
            map.insert(INDEX_KEY.into(), Value::from(*index));
            map.insert(LENGTH_KEY.into(), Value::from(*length));
        }
        EditKind::ReplaceLine { line, text } => {
            map.insert(LINE_KEY.into(), Value::from(*line));
            map.insert(TEXT_KEY.into(), Value::from(text.as_str()));
        }
        EditKind::BufferSync { filename, lines } => {
            map.insert(FILENAME_KEY.into(), Value::from(filename.as_str()));
            map.insert(
                LINES_KEY.into(),
                Value::Array(lines.iter().map(|l| Value::from(l.as_str())).collect()),
            );
        }
    }
    Value::Object(map)
}

/// Encode an edit as the bytes of one JSON message.
pub fn encode_vec(edit: &Edit) -> Vec<u8> {
    encode(edit).to_string().into_bytes()
}

/// Decode a message dictionary into an edit.
///
/// # Errors
///
/// Returns [`CodecError::MalformedMessage`] if `value` is not a dictionary or
/// has no string type tag, [`CodecError::UnknownEditKind`] for an unknown
/// tag, and a field-level error when a required field is absent, has the
/// wrong type or an invalid value.
pub fn decode(value: &Value) -> Result<Edit, CodecError> {
    let Value::Object(map) = value else {
        return Err(CodecError::MalformedMessage(
            "message is not a dictionary".to_string(),
        ));
    };
    let tag = match map.get(TYPE_KEY) {
        Some(Value::String(tag)) => tag.as_str(),
        Some(_) => {
            return Err(CodecError::MalformedMessage(format!(
                "`{TYPE_KEY}` is not a string"
            )));
        }
        None => {
            return Err(CodecError::MalformedMessage(format!(
                "missing `{TYPE_KEY}`"
            )));
        }
    };

    let fields = Fields(map);
    let kind = match tag {
        TYPE_CURSOR_MOVE => EditKind::CursorMove {
            user: fields.user_id(USER_ID_KEY)?,
            line: fields.number(LINE_KEY)?,
            column: fields.number(COLUMN_KEY)?,
        },
        TYPE_APPEND_LINE => EditKind::AppendLine {
            after: fields.number(LINE_KEY)?,
            text: fields.line_text(TEXT_KEY)?,
        },
        TYPE_INSERT_TEXT => EditKind::InsertText {
            line: fields.number(LINE_KEY)?,
            index: fields.number(INDEX_KEY)?,
            text: fields.line_text(TEXT_KEY)?,
        },
        TYPE_REMOVE_LINE => EditKind::RemoveLine {
            line: fields.number(LINE_KEY)?,
        },
        TYPE_DELETE_TEXT => EditKind::DeleteText {
            line: fields.number(LINE_KEY)?,
            index: fields.number(INDEX_KEY)?,
            length: fields.number(LENGTH_KEY)?,
        },
        TYPE_REPLACE_LINE => EditKind::ReplaceLine {
            line: fields.number(LINE_KEY)?,
            text: fields.line_text(TEXT_KEY)?,
        },
        TYPE_BUFFER_SYNC => EditKind::BufferSync {
            filename: fields.string(FILENAME_KEY)?,
            lines: fields.lines(LINES_KEY)?,
        },
        other => return Err(CodecError::UnknownEditKind(other.to_string())),
    };
    let target = BufferId(fields.unsigned(BUF_ID_KEY)?);
    Ok(Edit::new(target, kind))
}

/// Decode the bytes of one JSON message.
///
/// # Errors
///
/// Bytes that are not valid JSON are a [`CodecError::MalformedMessage`];
/// otherwise see [`decode`].
pub fn decode_slice(bytes: &[u8]) -> Result<Edit, CodecError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|err| CodecError::MalformedMessage(err.to_string()))?;
    decode(&value)
}

struct Fields<'a>(&'a Map<String, Value>);

impl Fields<'_> {
    fn get(&self, field: &'static str) -> Result<&Value, CodecError> {
        self.0.get(field).ok_or(CodecError::MissingField(field))
    }

    fn unsigned(&self, field: &'static str) -> Result<u64, CodecError> {
        let value = self.get(field)?;
        if let Some(n) = value.as_u64() {
            return Ok(n);
        }
        if value.as_i64().is_some() {
            return Err(CodecError::InvalidValue {
                field,
                reason: "negative",
            });
        }
        Err(CodecError::WrongFieldType {
            field,
            expected: "an integer",
        })
    }

    fn number(&self, field: &'static str) -> Result<usize, CodecError> {
        usize::try_from(self.unsigned(field)?).map_err(|_| CodecError::InvalidValue {
            field,
            reason: "too large",
        })
    }

    fn string(&self, field: &'static str) -> Result<String, CodecError> {
        self.get(field)?
            .as_str()
            .map(str::to_string)
            .ok_or(CodecError::WrongFieldType {
                field,
                expected: "a string",
            })
    }

    fn line_text(&self, field: &'static str) -> Result<String, CodecError> {
        let text = self.string(field)?;
        if text.contains('\n') {
            return Err(CodecError::InvalidValue {
                field,
                reason: "embedded newline",
            });
        }
        Ok(text)
    }

    fn lines(&self, field: &'static str) -> Result<Vec<String>, CodecError> {
        let wrong_type = CodecError::WrongFieldType {
            field,
            expected: "a list of strings",
        };
        let items = self.get(field)?.as_array().ok_or_else(|| wrong_type.clone())?;
        items
            .iter()
            .map(|item| match item.as_str() {
                Some(line) if line.contains('\n') => Err(CodecError::InvalidValue {
                    field,
                    reason: "embedded newline",
                }),
                Some(line) => Ok(line.to_string()),
                None => Err(wrong_type.clone()),
            })
            .collect()
    }

    fn user_id(&self, field: &'static str) -> Result<UserId, CodecError> {
        UserId::parse(self.string(field)?).ok_or(CodecError::InvalidValue {
            field,
            reason: "user ids may only contain letters, digits and underscores",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_edits() -> Vec<Edit> {
        let target = BufferId(7);
        vec![
            Edit::new(
                target,
                EditKind::CursorMove {
                    user: UserId::parse("alice").unwrap(),
                    line: 3,
                    column: 4,
                },
            ),
            Edit::new(
                target,
                EditKind::AppendLine {
                    after: 0,
                    text: "Hello".to_string(),
                },
            ),
            Edit::new(
                target,
                EditKind::InsertText {
                    line: 1,
                    index: 5,
                    text: " wörld!".to_string(),
                },
            ),
            Edit::new(target, EditKind::RemoveLine { line: 2 }),
            Edit::new(
                target,
                EditKind::DeleteText {
                    line: 1,
                    index: 6,
                    length: 7,
                },
            ),
            Edit::new(
                target,
                EditKind::ReplaceLine {
                    line: 9,
                    text: String::new(),
                },
            ),
            Edit::new(
                target,
                EditKind::BufferSync {
                    filename: "notes.txt".to_string(),
                    lines: vec!["one".to_string(), String::new(), "three".to_string()],
                },
            ),
        ]
    }

    #[test]
    fn test_every_kind_survives_round_trip() {
        for edit in sample_edits() {
            let decoded = decode(&encode(&edit));
            assert_eq!(decoded.as_ref(), Ok(&edit), "round trip of {}", edit.kind.tag());
        }
    }

    #[test]
    fn test_byte_round_trip() {
        for edit in sample_edits() {
            assert_eq!(decode_slice(&encode_vec(&edit)), Ok(edit));
        }
    }

    #[test]
    fn test_encode_uses_wire_keys() {
        let edit = Edit::new(
            BufferId(0),
            EditKind::DeleteText {
                line: 2,
                index: 3,
                length: 4,
            },
        );
        assert_eq!(
            encode(&edit),
            json!({
                "collabedit_type": "delete_text",
                "buf_id": 0,
                "line": 2,
                "index": 3,
                "length": 4,
            })
        );
    }

    #[test]
    fn test_decode_browser_sync_message() {
        let msg = json!({
            "collabedit_type": "buffer_sync",
            "buf_id": 0,
            "filename": "Collaborative File",
            "lines": ["Hello Realtime World!", "Welcome to Vim!"],
        });
        let edit = decode(&msg).unwrap();
        assert_eq!(edit.target, BufferId(0));
        assert_eq!(
            edit.kind,
            EditKind::BufferSync {
                filename: "Collaborative File".to_string(),
                lines: vec![
                    "Hello Realtime World!".to_string(),
                    "Welcome to Vim!".to_string()
                ],
            }
        );
    }

    #[test]
    fn test_decode_ignores_extra_keys() {
        let msg = json!({
            "collabedit_type": "remove_line",
            "buf_id": 1,
            "line": 4,
            "origin": "browser",
        });
        assert_eq!(
            decode(&msg),
            Ok(Edit::new(BufferId(1), EditKind::RemoveLine { line: 4 }))
        );
    }

    #[test]
    fn test_missing_type_tag_is_malformed() {
        let msg = json!({ "buf_id": 0, "line": 1 });
        assert!(matches!(decode(&msg), Err(CodecError::MalformedMessage(_))));
    }

    #[test]
    fn test_non_dictionary_is_malformed() {
        assert!(matches!(
            decode(&json!(["append_line", 0])),
            Err(CodecError::MalformedMessage(_))
        ));
        assert!(matches!(
            decode(&json!("hello")),
            Err(CodecError::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_non_string_tag_is_malformed() {
        let msg = json!({ "collabedit_type": 3, "buf_id": 0 });
        assert!(matches!(decode(&msg), Err(CodecError::MalformedMessage(_))));
    }

    #[test]
    fn test_invalid_json_bytes_are_malformed() {
        assert!(matches!(
            decode_slice(b"{\"collabedit_type\": "),
            Err(CodecError::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_unknown_tag() {
        let msg = json!({ "collabedit_type": "split_line", "buf_id": 0 });
        assert_eq!(
            decode(&msg),
            Err(CodecError::UnknownEditKind("split_line".to_string()))
        );
    }

    #[test]
    fn test_missing_field() {
        let msg = json!({ "collabedit_type": "insert_text", "buf_id": 0, "line": 1, "text": "x" });
        assert_eq!(decode(&msg), Err(CodecError::MissingField(INDEX_KEY)));
    }

    #[test]
    fn test_missing_buffer_id() {
        let msg = json!({ "collabedit_type": "remove_line", "line": 1 });
        assert_eq!(decode(&msg), Err(CodecError::MissingField(BUF_ID_KEY)));
    }

    #[test]
    fn test_wrong_field_type() {
        let msg = json!({ "collabedit_type": "remove_line", "buf_id": 0, "line": "1" });
        assert_eq!(
            decode(&msg),
            Err(CodecError::WrongFieldType {
                field: LINE_KEY,
                expected: "an integer",
            })
        );
    }

    #[test]
    fn test_fractional_number_is_wrong_type() {
        let msg = json!({ "collabedit_type": "remove_line", "buf_id": 0, "line": 1.5 });
        assert!(matches!(
            decode(&msg),
            Err(CodecError::WrongFieldType { field: LINE_KEY, .. })
        ));
    }

    #[test]
    fn test_negative_length_is_invalid() {
        let msg = json!({
            "collabedit_type": "delete_text",
            "buf_id": 0,
            "line": 1,
            "index": 0,
            "length": -2,
        });
        assert!(matches!(
            decode(&msg),
            Err(CodecError::InvalidValue { field: LENGTH_KEY, .. })
        ));
    }

    #[test]
    fn test_embedded_newline_is_invalid() {
        let msg = json!({ "collabedit_type": "append_line", "buf_id": 0, "line": 0, "text": "a\nb" });
        assert!(matches!(
            decode(&msg),
            Err(CodecError::InvalidValue { field: TEXT_KEY, .. })
        ));
    }

    #[test]
    fn test_sync_lines_must_be_strings() {
        let msg = json!({
            "collabedit_type": "buffer_sync",
            "buf_id": 0,
            "filename": "f",
            "lines": ["ok", 2],
        });
        assert!(matches!(
            decode(&msg),
            Err(CodecError::WrongFieldType { field: LINES_KEY, .. })
        ));
    }

    #[test]
    fn test_invalid_user_id() {
        let msg = json!({
            "collabedit_type": "cursor_move",
            "buf_id": 0,
            "user_id": "bob smith",
            "line": 1,
            "column": 0,
        });
        assert!(matches!(
            decode(&msg),
            Err(CodecError::InvalidValue { field: USER_ID_KEY, .. })
        ));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn insert_text_round_trips(
                target in 0..1000u64,
                line in 0..10_000usize,
                index in 0..500usize,
                text in "[^\n]{0,40}",
            ) {
                let edit = Edit::new(BufferId(target), EditKind::InsertText { line, index, text });
                prop_assert_eq!(decode_slice(&encode_vec(&edit)), Ok(edit));
            }

            #[test]
            fn sync_lines_round_trip(
                lines in proptest::collection::vec("[^\n]{0,20}", 0..20),
            ) {
                let edit = Edit::new(
                    BufferId(0),
                    EditKind::BufferSync { filename: "f.txt".to_string(), lines },
                );
                prop_assert_eq!(decode(&encode(&edit)), Ok(edit));
            }
        }
    }
}
