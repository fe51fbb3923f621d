//! Collaborative edit model and its wire codec.
//!
//! This module handles:
//! - The closed set of edit kinds exchanged with collaborators
//! - Validated identifiers (buffer ids, user ids)
//! - Encoding to and decoding from dictionary messages

pub mod codec;
mod types;

pub use codec::{CodecError, decode, decode_slice, encode, encode_vec};
pub use types::{BufferId, Edit, EditKind, UserId};
