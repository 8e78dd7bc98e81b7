//! Logging for BotForge
//!
//! Process-wide output goes through `tracing`; [`init_logging`] installs the
//! subscriber. On top of that, a [`LogRegistry`] hands out one
//! [`ModuleLoggers`] bundle per router name. A bundle emits tracing events
//! tagged with its router name and, when the registry has a log directory,
//! mirrors each line into `<log_dir>/<name>/{info,warning,error}.log`.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `config.level`. Calling this twice is harmless; the
/// second call leaves the first subscriber in place.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let result = match config.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Info,
    Warning,
    Error,
}

impl Level {
    fn label(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        }
    }

    fn file_name(self) -> &'static str {
        match self {
            Level::Info => "info.log",
            Level::Warning => "warning.log",
            Level::Error => "error.log",
        }
    }
}

#[derive(Debug)]
struct LogFiles {
    info: File,
    warning: File,
    error: File,
}

impl LogFiles {
    fn open(dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let open = |level: Level| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(level.file_name()))
        };
        Ok(Self {
            info: open(Level::Info)?,
            warning: open(Level::Warning)?,
            error: open(Level::Error)?,
        })
    }

    fn file(&mut self, level: Level) -> &mut File {
        match level {
            Level::Info => &mut self.info,
            Level::Warning => &mut self.warning,
            Level::Error => &mut self.error,
        }
    }

    fn flush(&mut self) {
        for file in [&mut self.info, &mut self.warning, &mut self.error] {
            let _ = file.flush();
        }
    }
}

/// Logger bundle for one router.
#[derive(Debug)]
pub struct ModuleLoggers {
    router_name: String,
    files: Mutex<Option<LogFiles>>,
}

impl ModuleLoggers {
    fn new(router_name: &str, files: Option<LogFiles>) -> Self {
        Self {
            router_name: router_name.to_string(),
            files: Mutex::new(files),
        }
    }

    /// A bundle that only emits tracing events.
    pub fn console(router_name: &str) -> Self {
        Self::new(router_name, None)
    }

    pub fn router_name(&self) -> &str {
        &self.router_name
    }

    pub fn info(&self, message: &str) {
        info!(router = %self.router_name, "{}", message);
        self.mirror(Level::Info, message);
    }

    pub fn warning(&self, message: &str) {
        warn!(router = %self.router_name, "{}", message);
        self.mirror(Level::Warning, message);
    }

    pub fn error(&self, message: &str) {
        error!(router = %self.router_name, "{}", message);
        self.mirror(Level::Error, message);
    }

    /// Whether the bundle still holds open log files.
    pub fn is_file_backed(&self) -> bool {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn mirror(&self, level: Level, message: &str) {
        let mut guard = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(files) = guard.as_mut() else {
            return;
        };
        let line = format!(
            "[{}] - {} - [{}] - {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            self.router_name,
            level.label(),
            message
        );
        // A failed mirror write must not take the bot down
        let _ = files.file(level).write_all(line.as_bytes());
    }

    /// Flush and drop the file handles; later messages only go to tracing.
    fn close(&self) -> bool {
        let mut guard = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.take() {
            Some(mut files) => {
                files.flush();
                true
            }
            None => false,
        }
    }
}

/// Name -> logger bundle lookup shared by startup, registration and removal.
#[derive(Debug, Default)]
pub struct LogRegistry {
    log_dir: Option<PathBuf>,
    bundles: Mutex<HashMap<String, Arc<ModuleLoggers>>>,
}

impl LogRegistry {
    /// Registry mirroring every bundle into files under `log_dir`.
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: Some(log_dir.into()),
            bundles: Mutex::new(HashMap::new()),
        }
    }

    /// Registry whose bundles only emit tracing events.
    pub fn console_only() -> Self {
        Self::default()
    }

    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }

    /// Bundle for `name`, created on first use.
    ///
    /// If the log files cannot be opened the bundle falls back to tracing
    /// only, with a warning.
    pub fn get_loggers(&self, name: &str) -> Arc<ModuleLoggers> {
        let mut bundles = self.bundles.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = bundles.get(name) {
            return Arc::clone(existing);
        }

        let files = self.log_dir.as_ref().and_then(|dir| {
            let dir = dir.join(name);
            LogFiles::open(&dir)
                .map_err(|e| {
                    warn!(
                        logger = %name,
                        path = %dir.display(),
                        error = %e,
                        "Failed to open log files, logging to console only"
                    );
                    e
                })
                .ok()
        });

        let bundle = Arc::new(ModuleLoggers::new(name, files));
        bundles.insert(name.to_string(), Arc::clone(&bundle));
        bundle
    }

    /// Names of every bundle handed out so far, sorted.
    pub fn names(&self) -> Vec<String> {
        let bundles = self.bundles.lock().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = bundles.keys().cloned().collect();
        names.sort();
        names
    }

    /// Flush and close every open log file; returns how many bundles were
    /// closed. Bundles stay usable and keep logging through tracing.
    pub fn shutdown(&self) -> usize {
        let bundles = self.bundles.lock().unwrap_or_else(PoisonError::into_inner);
        let closed = bundles.values().filter(|b| b.close()).count();
        tracing::debug!(closed, "Log files closed");
        closed
    }
}
