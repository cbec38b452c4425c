//! Chat logging persistence layer
//!
//! Appends channel messages to daily files without blocking the front end.
//! Logs are stored under the platform data directory:
//! jargonaut/logs/server/channel/YYYY-MM-DD.log

use chrono::Local;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;
use tracing::warn;

/// A log entry to be written to disk
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub server: String,
    pub channel: String,
    pub timestamp: String,
    pub nick: String,
    pub message: String,
}

/// Logger queues entries for a background writer thread
pub struct Logger {
    tx: Sender<LogEntry>,
}

impl Logger {
    /// Create a logger writing below `log_dir` and spawn its thread.
    pub fn new(log_dir: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(&log_dir)?;

        let (tx, rx) = unbounded::<LogEntry>();
        thread::Builder::new()
            .name("chat-log".into())
            .spawn(move || run_logger_thread(rx, log_dir))?;

        Ok(Self { tx })
    }

    /// Logger at the platform default location.
    pub fn open_default() -> io::Result<Self> {
        let dir = default_log_directory()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no data directory"))?;
        Self::new(dir)
    }

    /// Queue an entry. Never blocks.
    pub fn log(&self, entry: LogEntry) {
        // The writer thread only stops when every sender is gone
        let _ = self.tx.send(entry);
    }
}

fn run_logger_thread(rx: Receiver<LogEntry>, log_dir: PathBuf) {
    // Open files keyed by relative path
    let mut file_cache: HashMap<PathBuf, BufWriter<File>> = HashMap::new();

    while let Ok(entry) = rx.recv() {
        let date = Local::now().format("%Y-%m-%d").to_string();
        if let Err(e) = write_log_entry(&mut file_cache, &log_dir, &date, &entry) {
            warn!(error = %e, "Failed to write chat log");
        }
    }

    for (_, mut writer) in file_cache.drain() {
        let _ = writer.flush();
    }
}

/// Relative path of the log file for an entry on `date`.
fn log_file_path(entry: &LogEntry, date: &str) -> PathBuf {
    PathBuf::from(sanitize_filename(&entry.server))
        .join(sanitize_filename(&entry.channel))
        .join(format!("{}.log", date))
}

/// Write a single entry as `[HH:MM:SS] <nick> text`.
fn write_log_entry(
    file_cache: &mut HashMap<PathBuf, BufWriter<File>>,
    log_dir: &Path,
    date: &str,
    entry: &LogEntry,
) -> io::Result<()> {
    let relative = log_file_path(entry, date);

    if !file_cache.contains_key(&relative) {
        close_stale_files(file_cache, date);
        let path = log_dir.join(&relative);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        file_cache.insert(relative.clone(), BufWriter::new(file));
    }

    if let Some(writer) = file_cache.get_mut(&relative) {
        writeln!(writer, "[{}] <{}> {}", entry.timestamp, entry.nick, entry.message)?;
        writer.flush()?;
    }
    Ok(())
}

/// Drop the writers of files for any day other than `date`.
fn close_stale_files(file_cache: &mut HashMap<PathBuf, BufWriter<File>>, date: &str) {
    file_cache.retain(|path, _| path.file_stem().is_some_and(|stem| stem == date));
}

/// `<data dir>/jargonaut/logs`
pub fn default_log_directory() -> Option<PathBuf> {
    let base = directories::BaseDirs::new()?;
    Some(base.data_dir().join("jargonaut").join("logs"))
}

/// Make a server or channel name safe as a path component
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '#' => '_',
            _ => c,
        })
        .collect()
}
