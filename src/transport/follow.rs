//! Following a message log on disk.
//!
//! Uses notify crate for cross-platform file system events; each debounced
//! change yields the complete lines appended since the last read.
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

/// Tails a single file of JSON-lines messages.
pub struct LogFollower {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    watch_root: PathBuf,
    target_path: PathBuf,
    target_name: Option<OsString>,
    debounce: Duration,
    pending_since: Option<Instant>,
    file: File,
    offset: u64,
    partial: Vec<u8>,
}

impl LogFollower {
    /// Follow `path` from its beginning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or watched.
    pub fn new(path: impl AsRef<Path>, debounce: Duration) -> notify::Result<Self> {
        // Canonicalize so event paths from the OS (which are always absolute
        // and canonical) match our stored paths.
        let target_path = path
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| path.as_ref().to_path_buf());
        let target_name = target_path.file_name().map(std::ffi::OsStr::to_os_string);
        let watch_root = watch_root_for(&target_path);
        let file = File::open(&target_path).map_err(notify::Error::io)?;

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&watch_root, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            rx,
            watch_root,
            target_path,
            target_name,
            debounce,
            pending_since: None,
            file,
            offset: 0,
            partial: Vec::new(),
        })
    }

    /// The canonical path of the file being followed.
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Lines appended since the last call, once a debounced change is ready.
    pub fn poll_lines(&mut self) -> Vec<Vec<u8>> {
        if !self.take_change_ready() {
            return Vec::new();
        }
        self.read_available().unwrap_or_else(|err| {
            tracing::warn!("failed to read {}: {err}", self.target_path.display());
            Vec::new()
        })
    }

    /// Read everything appended so far and return the complete lines.
    ///
    /// A trailing line without its newline is held back until it is
    /// finished. If the file shrank, reading restarts from the beginning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    pub fn read_available(&mut self) -> io::Result<Vec<Vec<u8>>> {
        let len = self.file.metadata()?.len();
        if len < self.offset {
            tracing::debug!("{} was truncated, rereading", self.target_path.display());
            self.offset = 0;
            self.partial.clear();
        }
        self.file.seek(SeekFrom::Start(self.offset))?;
        let mut appended = Vec::new();
        self.file.read_to_end(&mut appended)?;
        self.offset += appended.len() as u64;
        self.partial.extend_from_slice(&appended);

        let Some(last_newline) = self.partial.iter().rposition(|&b| b == b'\n') else {
            return Ok(Vec::new());
        };
        let rest = self.partial.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.partial, rest);
        Ok(complete
            .split(|&b| b == b'\n')
            .map(<[u8]>::trim_ascii)
            .filter(|line| !line.is_empty())
            .map(<[u8]>::to_vec)
            .collect())
    }

    /// Returns true once a debounced file change is ready.
    pub fn take_change_ready(&mut self) -> bool {
        let mut saw_relevant_event = false;
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Ok(ev) if self.is_relevant(&ev) => {
                    saw_relevant_event = true;
                }
                Ok(ev) => {
                    tracing::trace!("ignoring {:?} on {:?}", ev.kind, ev.paths);
                }
                Err(err) => {
                    tracing::warn!("watch error on {}: {err}", self.watch_root.display());
                }
            }
        }

        if saw_relevant_event {
            self.pending_since = Some(Instant::now());
        }

        let Some(pending_since) = self.pending_since else {
            return false;
        };
        if pending_since.elapsed() >= self.debounce {
            self.pending_since = None;
            return true;
        }
        false
    }

    fn is_relevant(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            path == &self.watch_root
                || path == &self.target_path
                || self
                    .target_name
                    .as_ref()
                    .is_some_and(|name| path.file_name().is_some_and(|f| f == name))
        })
    }
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
