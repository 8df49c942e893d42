//! Rolling Logger
//!
//! File logger that cycles through a fixed ring of log files and keeps the
//! most recent lines in memory, so an app can show diagnostics without
//! reading files back.
//!
//! `log` records are bridged into `tracing` by `init_logger`, so libraries
//! that only depend on the `log` facade end up in the same files.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use tracing_subscriber::fmt::MakeWriter;

/// Rotate when the active file grows past this many bytes
pub const DEFAULT_MAX_FILE_BYTES: u64 = 1024 * 1024;
/// Number of file slots in the ring
pub const DEFAULT_MAX_FILES: usize = 5;
/// Number of lines kept in memory
pub const DEFAULT_BUFFER_LINES: usize = 500;

static HANDLE: OnceLock<LoggerHandle> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("log file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("logger already initialized")]
    AlreadyInitialized,
    #[error("logger not initialized")]
    NotInitialized,
}

/// Tuning knobs for the ring of files and the memory buffer
#[derive(Debug, Clone)]
pub struct LoggerOptions {
    pub max_file_bytes: u64,
    pub max_files: usize,
    pub buffer_lines: usize,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_files: DEFAULT_MAX_FILES,
            buffer_lines: DEFAULT_BUFFER_LINES,
        }
    }
}

/// One slot of the ring is open for writing at a time.
struct RollingFile {
    dir: PathBuf,
    app_name: String,
    max_file_bytes: u64,
    max_files: usize,
    slot: usize,
    file: File,
    written: u64,
}

impl RollingFile {
    fn open(dir: &Path, app_name: &str, options: &LoggerOptions) -> Result<Self, LoggerError> {
        fs::create_dir_all(dir).map_err(|source| LoggerError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = slot_path(dir, app_name, 0);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| LoggerError::Io { path: path.clone(), source })?;
        let written = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(Self {
            dir: dir.to_path_buf(),
            app_name: app_name.to_string(),
            max_file_bytes: options.max_file_bytes.max(1),
            max_files: options.max_files.max(1),
            slot: 0,
            file,
            written,
        })
    }

    /// Move to the next slot, truncating whatever an earlier lap left there
    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.slot = (self.slot + 1) % self.max_files;
        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(slot_path(&self.dir, &self.app_name, self.slot))?;
        self.written = 0;
        Ok(())
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        if self.written > 0 && self.written + chunk.len() as u64 > self.max_file_bytes {
            self.rotate()?;
        }
        self.file.write_all(chunk)?;
        self.written += chunk.len() as u64;
        Ok(())
    }
}

fn slot_path(dir: &Path, app_name: &str, slot: usize) -> PathBuf {
    if slot == 0 {
        dir.join(format!("{}.log", app_name))
    } else {
        dir.join(format!("{}.{}.log", app_name, slot))
    }
}

struct Shared {
    file: Mutex<RollingFile>,
    recent: Mutex<VecDeque<String>>,
    capacity: usize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// `io::Write` sink handed to the tracing formatter
#[derive(Clone)]
pub struct RollingWriter {
    shared: Arc<Shared>,
}

impl RollingWriter {
    pub fn new(dir: impl AsRef<Path>, app_name: &str, options: LoggerOptions) -> Result<Self, LoggerError> {
        let file = RollingFile::open(dir.as_ref(), app_name, &options)?;
        Ok(Self {
            shared: Arc::new(Shared {
                file: Mutex::new(file),
                recent: Mutex::new(VecDeque::with_capacity(options.buffer_lines)),
                capacity: options.buffer_lines,
            }),
        })
    }

    pub fn handle(&self) -> LoggerHandle {
        LoggerHandle {
            shared: self.shared.clone(),
        }
    }
}

impl Write for RollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.shared.file).write_chunk(buf)?;

        if self.shared.capacity > 0 {
            let text = String::from_utf8_lossy(buf);
            let mut recent = lock(&self.shared.recent);
            for line in text.lines().filter(|l| !l.trim().is_empty()) {
                if recent.len() == self.shared.capacity {
                    recent.pop_front();
                }
                recent.push_back(line.to_string());
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        lock(&self.shared.file).file.flush()
    }
}

impl<'a> MakeWriter<'a> for RollingWriter {
    type Writer = RollingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Read access to a running logger
#[derive(Clone)]
pub struct LoggerHandle {
    shared: Arc<Shared>,
}

impl LoggerHandle {
    /// Oldest first
    pub fn recent_lines(&self) -> Vec<String> {
        lock(&self.shared.recent).iter().cloned().collect()
    }

    pub fn active_file(&self) -> PathBuf {
        let file = lock(&self.shared.file);
        slot_path(&file.dir, &file.app_name, file.slot)
    }
}

/// Install the global subscriber writing to `dir`
pub fn init_logger(dir: impl AsRef<Path>, app_name: &str) -> Result<LoggerHandle, LoggerError> {
    init_logger_with(dir, app_name, LoggerOptions::default())
}

pub fn init_logger_with(
    dir: impl AsRef<Path>,
    app_name: &str,
    options: LoggerOptions,
) -> Result<LoggerHandle, LoggerError> {
    if HANDLE.get().is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }

    let writer = RollingWriter::new(dir, app_name, options)?;
    let handle = writer.handle();

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    let _ = HANDLE.set(handle.clone());
    tracing::info!(target: "rolling_logger", "logger started at {}", chrono::Local::now().to_rfc3339());
    Ok(handle)
}

/// Handle of the global logger, if one was installed
pub fn handle() -> Option<LoggerHandle> {
    HANDLE.get().cloned()
}

pub fn info(message: &str) -> Result<(), LoggerError> {
    HANDLE.get().ok_or(LoggerError::NotInitialized)?;
    tracing::info!(target: "rolling_logger", "{}", message);
    Ok(())
}

pub fn error(message: &str) -> Result<(), LoggerError> {
    HANDLE.get().ok_or(LoggerError::NotInitialized)?;
    tracing::error!(target: "rolling_logger", "{}", message);
    Ok(())
}
