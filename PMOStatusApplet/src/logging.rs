use std::env;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pmoconfig::Config;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

const DEFAULT_LOG_FILE: &str = "pmostatus-applet.log";

/// Installs the global subscriber.
///
/// The terminal belongs to the LCD emulator, so records go to a file and
/// only fall back to stderr when the file cannot be opened.
pub fn init_tracing(config: &Config) {
    let _ = tracing_log::LogTracer::init();
    let (writer, to_file) = log_writer(config);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.get_log_min_level().to_lowercase()))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(!to_file)
        .try_init();
}

/// Records where the configuration came from.
///
/// Config loading runs before the subscriber exists, so its own records
/// are lost; this repeats the useful part once logging is up.
pub fn log_startup(config: &Config) {
    info!(
        config_dir = %config.config_dir(),
        config_file = %config.config_file(),
        log_file = %log_path(config).display(),
        "Starting pmostatus-applet"
    );
}

/// Sends a panic report to the log sink.
pub fn log_panic(report: &dyn fmt::Display) {
    error!(panic = %report, "pmostatus-applet panicked");
}

fn log_path(config: &Config) -> PathBuf {
    config
        .get_log_file()
        .map(PathBuf::from)
        .unwrap_or_else(|| env::temp_dir().join(DEFAULT_LOG_FILE))
}

fn log_writer(config: &Config) -> (BoxMakeWriter, bool) {
    let path = log_path(config);
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => {
            let shared = SharedLogWriter::new(file);
            (BoxMakeWriter::new(move || shared.clone()), true)
        }
        Err(err) => {
            eprintln!(
                "Cannot open {} for logging: {err}. Falling back to stderr",
                path.display()
            );
            (BoxMakeWriter::new(io::stderr), false)
        }
    }
}

/// Log sink shared by every thread of the applet.
///
/// A panic while a record is being written poisons the lock; the sink keeps
/// going so the panic report itself still reaches the file.
struct SharedLogWriter<W> {
    inner: Arc<Mutex<W>>,
}

impl<W> Clone for SharedLogWriter<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W: Write> SharedLogWriter<W> {
    fn new(sink: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sink)),
        }
    }

    fn sink(&self) -> MutexGuard<'_, W> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write> Write for SharedLogWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sink().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink().flush()
    }
}
