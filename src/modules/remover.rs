//! Module remover.
//!
//! Deletes a module directory tree together with its temp and log
//! directories. Removing `a.b` maps to `<modules_root>/a/<sep>/b`, to
//! `<temp_dir>/a/<sep>/b` and to `<log_dir>/a/<sep>/b`; the root's own temp
//! and log folders are left alone.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::Result;
use crate::logging::LogRegistry;
use crate::utils::fs::{remove_path, DELETE_ATTEMPTS};

use super::creator::parse_module_name;
use super::layout::ModuleLayout;

/// Asks the user to confirm a destructive step.
pub trait Confirm {
    /// Returns `true` to proceed.
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Prompts on stdout and reads one line from stdin. An empty line confirms;
/// any other input, end of input or a read error cancels.
#[derive(Debug, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        print!("{} ", prompt);
        let _ = io::stdout().flush();

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line);
        is_confirmed(read, &line)
    }
}

/// Whether a line read for a confirmation prompt confirms.
///
/// Only a bare line ending counts; whitespace is an answer, and EOF is not.
fn is_confirmed(read: io::Result<usize>, line: &str) -> bool {
    match read {
        Ok(0) | Err(_) => false,
        Ok(_) => {
            let answer = line.strip_suffix('\n').unwrap_or(line);
            let answer = answer.strip_suffix('\r').unwrap_or(answer);
            answer.is_empty()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveOptions {
    /// Dotted module name, e.g. `video.create`.
    pub module_name: String,
    pub log_dir: PathBuf,
    pub temp_dir: PathBuf,
    /// Close every open log file before deleting anything.
    pub close_loggers_first: bool,
    pub skip_confirmation: bool,
}

impl RemoveOptions {
    pub fn new(
        module_name: impl Into<String>,
        log_dir: impl Into<PathBuf>,
        temp_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            module_name: module_name.into(),
            log_dir: log_dir.into(),
            temp_dir: temp_dir.into(),
            close_loggers_first: true,
            skip_confirmation: false,
        }
    }

    pub fn skip_confirmation(mut self, skip: bool) -> Self {
        self.skip_confirmation = skip;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// Nothing exists at the module path; nothing was deleted.
    NotFound { path: PathBuf },
    /// The user declined; nothing was deleted.
    Cancelled,
    Removed {
        module_dir: PathBuf,
        /// Set when the temp directory existed and was deleted.
        temp_dir: Option<PathBuf>,
        /// Set when the log directory existed and was deleted.
        log_dir: Option<PathBuf>,
    },
}

/// Remove the module `opts.module_name`.
///
/// # Errors
/// - `Invalid module` for a malformed name
/// - `IO ERROR` if a directory exists but cannot be deleted
pub fn remove_module(
    layout: &ModuleLayout,
    opts: &RemoveOptions,
    logs: &LogRegistry,
    confirm: &mut dyn Confirm,
) -> Result<RemovalOutcome> {
    let segments = parse_module_name(&opts.module_name, layout.separator())?;
    let name = segments.join(".");

    if opts.close_loggers_first {
        logs.shutdown();
    }

    let relative = layout.relative_dir(&name);
    let module_dir = layout.modules_root().join(&relative);
    if !module_dir.exists() {
        info!(module = %name, path = %module_dir.display(), "Module not found");
        return Ok(RemovalOutcome::NotFound { path: module_dir });
    }

    if !opts.skip_confirmation {
        let prompt = format!(
            "Remove module '{}' at {}? Press Enter to confirm, type anything to cancel:",
            name,
            module_dir.display()
        );
        if !confirm.confirm(&prompt) {
            info!(module = %name, "Module removal cancelled");
            return Ok(RemovalOutcome::Cancelled);
        }
    }

    remove_path(&module_dir, DELETE_ATTEMPTS)?;
    let temp_dir = remove_if_present(&opts.temp_dir.join(&relative))?;
    let log_dir = remove_if_present(&opts.log_dir.join(&relative))?;

    info!(
        module = %name,
        path = %module_dir.display(),
        temp_removed = temp_dir.is_some(),
        logs_removed = log_dir.is_some(),
        "Module removed"
    );

    Ok(RemovalOutcome::Removed {
        module_dir,
        temp_dir,
        log_dir,
    })
}

fn remove_if_present(path: &Path) -> Result<Option<PathBuf>> {
    match remove_path(path, DELETE_ATTEMPTS) {
        Ok(true) => Ok(Some(path.to_path_buf())),
        Ok(false) => Ok(None),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to delete directory");
            Err(e.into())
        }
    }
}
