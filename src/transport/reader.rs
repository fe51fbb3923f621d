use std::io::{self, BufRead};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::LogFollower;
use crate::session::Producer;

/// Read JSON-lines messages from `reader` on a new thread and enqueue each
/// one that decodes. The thread ends at end of input and returns how many
/// edits it enqueued.
///
/// # Errors
/// Returns an error if the thread cannot be spawned.
pub fn spawn_reader<R>(reader: R, producer: Producer) -> io::Result<JoinHandle<usize>>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("collab-reader".to_string())
        .spawn(move || read_messages(reader, &producer))
}

/// Follow a message log on a new thread until `stop` is set, enqueueing
/// existing lines first and then each line as it is appended.
///
/// # Errors
/// Returns an error if the thread cannot be spawned.
pub fn spawn_follower(
    mut follower: LogFollower,
    producer: Producer,
    poll_interval: Duration,
    stop: Arc<AtomicBool>,
) -> io::Result<JoinHandle<usize>> {
    thread::Builder::new()
        .name("collab-follower".to_string())
        .spawn(move || {
            let mut queued = match follower.read_available() {
                Ok(lines) => push_lines(&producer, &lines),
                Err(err) => {
                    tracing::warn!("failed to read {}: {err}", follower.target_path().display());
                    0
                }
            };
            while !stop.load(Ordering::Relaxed) {
                queued += push_lines(&producer, &follower.poll_lines());
                thread::sleep(poll_interval);
            }
            queued
        })
}

fn read_messages(reader: impl BufRead, producer: &Producer) -> usize {
    let mut queued = 0;
    for line in reader.split(b'\n') {
        match line {
            Ok(line) => {
                let line = line.trim_ascii();
                if !line.is_empty() && producer.push_bytes(line).is_ok() {
                    queued += 1;
                }
            }
            Err(err) => {
                tracing::warn!("inbound stream failed: {err}");
                break;
            }
        }
    }
    tracing::debug!("inbound stream ended after {queued} edits");
    queued
}

fn push_lines(producer: &Producer, lines: &[Vec<u8>]) -> usize {
    lines
        .iter()
        .filter(|line| producer.push_bytes(line).is_ok())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use std::io::Cursor;

    #[test]
    fn test_reader_skips_bad_lines() {
        let session = Session::new();
        let input = concat!(
            "{\"collabedit_type\":\"remove_line\",\"buf_id\":0,\"line\":1}\n",
            "\n",
            "not json\n",
            "{\"buf_id\":0}\n",
            "{\"collabedit_type\":\"remove_line\",\"buf_id\":0,\"line\":2}",
        );
        let handle = spawn_reader(Cursor::new(input), session.producer()).unwrap();
        assert_eq!(handle.join().unwrap(), 2);
        assert_eq!(session.pending(), 2);
    }
}
