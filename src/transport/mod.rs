//! Message transports on both sides of the editor.
//!
//! Inbound messages arrive as JSON lines, either from a reader thread or
//! by following a message log on disk. Outbound messages go through a
//! [`Transport`].

mod follow;
mod reader;

pub use follow::LogFollower;
pub use reader::{spawn_follower, spawn_reader};

use std::io::{self, Write};
use std::sync::mpsc::{self, Receiver, Sender};

use serde_json::Value;

/// Outbound half of the boundary: delivers one message per call.
pub trait Transport {
    /// Send one message.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the message could not be delivered.
    fn send(&mut self, message: &Value) -> io::Result<()>;
}

/// Writes each message as one line of JSON.
#[derive(Debug)]
pub struct WriterTransport<W: Write> {
    writer: W,
}

impl<W: Write> WriterTransport<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Transport for WriterTransport<W> {
    fn send(&mut self, message: &Value) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, message)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

/// Hands messages to another thread over a channel.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: Sender<Value>,
}

impl ChannelTransport {
    pub fn new() -> (Self, Receiver<Value>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, message: &Value) -> io::Result<()> {
        self.tx
            .send(message.clone())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "message receiver dropped"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_writer_transport_writes_json_lines() {
        let mut transport = WriterTransport::new(Vec::new());
        transport.send(&json!({ "a": 1 })).unwrap();
        transport.send(&json!({ "b": "two" })).unwrap();
        let out = String::from_utf8(transport.into_inner()).unwrap();
        assert_eq!(out, "{\"a\":1}\n{\"b\":\"two\"}\n");
    }

    #[test]
    fn test_channel_transport_delivers() {
        let (mut transport, rx) = ChannelTransport::new();
        transport.send(&json!([1, 2])).unwrap();
        assert_eq!(rx.try_recv().unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_channel_transport_fails_without_receiver() {
        let (mut transport, rx) = ChannelTransport::new();
        drop(rx);
        let err = transport.send(&json!(null)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
