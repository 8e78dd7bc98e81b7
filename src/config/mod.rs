//! Configuration for BotForge
//!
//! The config file is JSON. Lookup order: `$BOTFORGE_CONFIG`, then
//! `./botforge.json`, then `~/.botforge/config.json`. A missing file yields
//! the defaults; `BOTFORGE_*` environment variables override file values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ForgeError, Result};
use crate::modules::layout::{
    ModuleLayout, DEFAULT_CHILD_SEPARATOR, DEFAULT_ROOT_PACKAGE, DEFAULT_ROUTER_UNIT,
    DEFAULT_SETTINGS_UNIT,
};

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "botforge.json";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub modules: ModulesConfig,
    pub paths: PathsConfig,
    pub bot: BotConfig,
    pub logging: LoggingConfig,
}

/// Where modules live and how their hierarchy is encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulesConfig {
    /// Dotted package that holds every root module.
    pub root_package: String,
    /// Path component marking "this segment is a nested child".
    pub child_separator: String,
    /// Unit name of a module's settings file (without extension).
    pub settings_unit: String,
    /// Unit name of a module's router file (without extension).
    pub router_unit: String,
    /// Optional directory whose files override the built-in scaffold templates.
    pub template_dir: Option<PathBuf>,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            root_package: DEFAULT_ROOT_PACKAGE.to_string(),
            child_separator: DEFAULT_CHILD_SEPARATOR.to_string(),
            settings_unit: DEFAULT_SETTINGS_UNIT.to_string(),
            router_unit: DEFAULT_ROUTER_UNIT.to_string(),
            template_dir: None,
        }
    }
}

/// Filesystem roots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Source root; `root_package` is resolved relative to it.
    pub root_dir: PathBuf,
    /// Per-module temp storage (`<temp_dir>/<NAME_FOR_TEMP_FOLDER>`).
    pub temp_dir: PathBuf,
    /// Per-module log folders (`<log_dir>/<NAME_FOR_LOG_FOLDER>`).
    pub log_dir: PathBuf,
    /// Static assets served by modules.
    pub static_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            temp_dir: PathBuf::from("app/bot/temp"),
            log_dir: PathBuf::from("logs/bot"),
            static_dir: PathBuf::from("app/bot/static"),
        }
    }
}

/// Telegram bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Bot API token. Only required by `botforge run`.
    pub token: Option<String>,
    /// Service name of the bot itself; a module with this name is kept out
    /// of the main menu.
    pub service_name: String,
    /// Log folder name for the bot's own logger bundle.
    pub log_name: String,
    /// Buttons per row in the main menu keyboard.
    pub menu_columns: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: None,
            service_name: "main".to_string(),
            log_name: "bot".to_string(),
            menu_columns: 2,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging settings. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Global config directory (`~/.botforge`).
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".botforge")
    }

    /// Resolve the config file path.
    pub fn path() -> PathBuf {
        if let Ok(explicit) = std::env::var("BOTFORGE_CONFIG") {
            return PathBuf::from(explicit);
        }
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return local;
        }
        Self::dir().join("config.json")
    }

    /// Load from the resolved path and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::path())?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a specific file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            ForgeError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ForgeError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Apply `BOTFORGE_*` overrides using the given variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("BOTFORGE_ROOT_DIR") {
            self.paths.root_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("BOTFORGE_ROOT_PACKAGE") {
            self.modules.root_package = v;
        }
        if let Some(v) = lookup("BOTFORGE_CHILD_SEPARATOR") {
            self.modules.child_separator = v;
        }
        if let Some(v) = lookup("BOTFORGE_TEMP_DIR") {
            self.paths.temp_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("BOTFORGE_LOG_DIR") {
            self.paths.log_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("BOTFORGE_BOT_TOKEN") {
            if !v.trim().is_empty() {
                self.bot.token = Some(v);
            }
        }
        if let Some(v) = lookup("BOTFORGE_LOG_LEVEL") {
            self.logging.level = v;
        }
    }

    /// Module layout derived from this config.
    pub fn layout(&self) -> ModuleLayout {
        ModuleLayout::new(self.paths.root_dir.clone(), &self.modules.root_package)
            .with_separator(&self.modules.child_separator)
            .with_unit_names(&self.modules.settings_unit, &self.modules.router_unit)
    }
}
