//! collabsync - apply a collaborator's edit stream to local documents.
//!
//! # Usage
//!
//! ```bash
//! collabsync inbound.jsonl --dump
//! remote-feed | collabsync --publish-cursor --user-id alice
//! collabsync --follow shared.log
//! collabsync --share notes.txt --publish-cursor inbound.jsonl
//! ```

use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use collabsync::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use collabsync::edit::{BufferId, UserId};
use collabsync::session::{CursorTracker, Publisher, Session};
use collabsync::transport::{LogFollower, WriterTransport, spawn_follower, spawn_reader};

const DEFAULT_POLL_MS: u64 = 50;
const DEFAULT_USER: &str = "local";
const SHARED_ID: BufferId = BufferId(0);

/// Apply a collaborator's edit stream to local documents
#[derive(Parser, Debug)]
#[command(name = "collabsync", version, about, long_about = None)]
struct Cli {
    /// JSON-lines message file to read (stdin if omitted)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Keep following FILE as messages are appended
    #[arg(short, long)]
    follow: bool,

    /// Print a JSON snapshot of every shared document at exit
    #[arg(long)]
    dump: bool,

    /// Publish local cursor moves as JSON lines on stdout
    #[arg(long)]
    publish_cursor: bool,

    /// Open a local file and publish it to collaborators as document 0
    /// (implies --publish-cursor)
    #[arg(long, value_name = "PATH")]
    share: Option<PathBuf>,

    /// Id to publish cursor moves under
    #[arg(long, value_name = "NAME")]
    user_id: Option<String>,

    /// How long the editor waits for input between checks, in milliseconds
    #[arg(long, value_name = "N")]
    poll_ms: Option<u64>,

    /// Write log output to a file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

fn effective_flags(cli: &Cli, raw_args: &[String]) -> Result<ConfigFlags> {
    let global_path = global_config_path();
    let cli_flags = parse_flag_tokens(raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_override_path())?;
        global_flags.union(&local_flags)
    };
    Ok(file_flags.union(&cli_flags))
}

fn spawn_producer(
    session: &Session,
    file: Option<&Path>,
    follow: bool,
    poll: Duration,
    stop: &Arc<AtomicBool>,
) -> Result<JoinHandle<usize>> {
    let producer = session.producer();
    let handle = match (file, follow) {
        (Some(path), true) => {
            let follower = LogFollower::new(path, poll)
                .with_context(|| format!("Failed to follow {}", path.display()))?;
            spawn_follower(follower, producer, poll, Arc::clone(stop))?
        }
        (Some(path), false) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
            spawn_reader(BufReader::new(file), producer)?
        }
        (None, true) => anyhow::bail!("--follow needs a FILE"),
        (None, false) => spawn_reader(BufReader::new(io::stdin()), producer)?,
    };
    Ok(handle)
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let effective = effective_flags(&cli, &raw_args)?;
    init_logging(effective.log_file.as_deref())?;

    let user_name = effective.user_id.as_deref().unwrap_or(DEFAULT_USER);
    let user = UserId::parse(user_name)
        .with_context(|| format!("Invalid user id {user_name:?}: use letters, digits and _"))?;
    let poll = Duration::from_millis(effective.poll_ms.unwrap_or(DEFAULT_POLL_MS));

    let mut session = Session::new();
    let mut publisher = (effective.publish_cursor || cli.share.is_some())
        .then(|| Publisher::new(WriterTransport::new(io::stdout())));
    if let Some(path) = cli.share.as_deref() {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let local = session.open_local(&path.display().to_string(), &text);
        let sync = session
            .share(SHARED_ID, local)
            .context("Shared buffer is not open")?;
        if let Some(publisher) = publisher.as_mut() {
            publisher.publish(&sync);
        }
    }

    let stop = Arc::new(AtomicBool::new(false));
    let handle = spawn_producer(&session, cli.file.as_deref(), effective.follow, poll, &stop)?;
    let mut tracker = CursorTracker::new(user);
    let mut applied = 0;
    let mut skipped = 0;

    loop {
        // Checked before draining so nothing enqueued before the producer
        // finished is left behind.
        let finished = handle.is_finished();
        let stats = session.wait(poll);
        applied += stats.applied;
        skipped += stats.skipped;
        if let Some(publisher) = publisher.as_mut() {
            tracker.poll(session.local_cursor(), publisher);
        }
        if finished && !session.has_pending() {
            break;
        }
    }

    stop.store(true, Ordering::Relaxed);
    let queued = handle
        .join()
        .map_err(|_| anyhow::anyhow!("inbound reader thread panicked"))?;
    tracing::debug!("queued {queued} edits, applied {applied}, skipped {skipped}");

    if effective.dump {
        let mut stdout = io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, &session.snapshot())
            .context("Failed to write snapshot")?;
        writeln!(stdout).context("Failed to write snapshot")?;
    }
    Ok(())
}
