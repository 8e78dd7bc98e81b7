//! On-disk layout conventions shared by discovery, the scaffolder and the
//! remover.
//!
//! A root module `a` lives at `<root_dir>/<root_package as path>/a/`; a child
//! `b` of `a` lives at `.../a/<separator>/b/`, recursively. The matching
//! dotted package of `a.b` is `<root_package>.a.<separator>.b`.

use std::path::{Path, PathBuf};

pub const DEFAULT_ROOT_PACKAGE: &str = "app.bot.modules";
pub const DEFAULT_CHILD_SEPARATOR: &str = "childes";
pub const DEFAULT_SETTINGS_UNIT: &str = "settings";
pub const DEFAULT_ROUTER_UNIT: &str = "router";

/// File extension of every unit on disk.
pub const UNIT_EXTENSION: &str = "json";

/// Initializer file written into every template directory.
pub const INIT_FILE: &str = ".keep";

/// Directories every module must contain.
pub const REQUIRED_MODULE_DIRS: [&str; 7] = [
    "api",
    "fsm",
    "services",
    "utils",
    "handlers",
    "keyboards",
    "childes",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLayout {
    root_dir: PathBuf,
    root_package: String,
    separator: String,
    settings_unit: String,
    router_unit: String,
    required_dirs: Vec<String>,
}

impl ModuleLayout {
    pub fn new(root_dir: impl Into<PathBuf>, root_package: &str) -> Self {
        Self {
            root_dir: root_dir.into(),
            root_package: root_package.to_string(),
            separator: DEFAULT_CHILD_SEPARATOR.to_string(),
            settings_unit: DEFAULT_SETTINGS_UNIT.to_string(),
            router_unit: DEFAULT_ROUTER_UNIT.to_string(),
            required_dirs: default_required_dirs(DEFAULT_CHILD_SEPARATOR),
        }
    }

    /// Use a different child separator. The separator directory replaces
    /// `childes` in the required directory set.
    pub fn with_separator(mut self, separator: &str) -> Self {
        self.separator = separator.to_string();
        self.required_dirs = default_required_dirs(separator);
        self
    }

    pub fn with_unit_names(mut self, settings_unit: &str, router_unit: &str) -> Self {
        self.settings_unit = settings_unit.to_string();
        self.router_unit = router_unit.to_string();
        self
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn root_package(&self) -> &str {
        &self.root_package
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn settings_unit(&self) -> &str {
        &self.settings_unit
    }

    pub fn router_unit(&self) -> &str {
        &self.router_unit
    }

    pub fn required_dirs(&self) -> &[String] {
        &self.required_dirs
    }

    /// `settings.json`
    pub fn settings_file(&self) -> String {
        format!("{}.{}", self.settings_unit, UNIT_EXTENSION)
    }

    /// `router.json`
    pub fn router_file(&self) -> String {
        format!("{}.{}", self.router_unit, UNIT_EXTENSION)
    }

    pub fn required_files(&self) -> Vec<String> {
        vec![self.settings_file(), self.router_file()]
    }

    /// Suffix identifying settings units in a walk (`.settings`).
    pub fn settings_suffix(&self) -> String {
        format!(".{}", self.settings_unit)
    }

    /// Suffix identifying router units in a walk (`.router`).
    pub fn router_suffix(&self) -> String {
        format!(".{}", self.router_unit)
    }

    /// Directory of a dotted package, e.g. `app.bot.modules` ->
    /// `<root_dir>/app/bot/modules`.
    pub fn package_path(&self, package: &str) -> PathBuf {
        package
            .split('.')
            .filter(|s| !s.is_empty())
            .fold(self.root_dir.clone(), |path, segment| path.join(segment))
    }

    /// Directory holding every root module.
    pub fn modules_root(&self) -> PathBuf {
        self.package_path(&self.root_package)
    }

    /// Full name of a chain: `["a", "b"]` -> `a.childes.b`.
    pub fn chain_name(&self, segments: &[&str]) -> String {
        segments.join(&format!(".{}.", self.separator))
    }

    /// Dotted package of a chain: `["a", "b"]` -> `<root_package>.a.childes.b`.
    pub fn chain_package(&self, segments: &[&str]) -> String {
        format!("{}.{}", self.root_package, self.chain_name(segments))
    }

    /// Path of a dotted module name relative to the modules root:
    /// `a.b` -> `a/childes/b`.
    pub fn relative_dir(&self, module_name: &str) -> PathBuf {
        let mut path = PathBuf::new();
        for (index, segment) in module_name.split('.').enumerate() {
            if index > 0 {
                path.push(&self.separator);
            }
            path.push(segment);
        }
        path
    }

    /// Absolute module directory of a dotted module name.
    pub fn module_dir(&self, module_name: &str) -> PathBuf {
        self.modules_root().join(self.relative_dir(module_name))
    }
}

fn default_required_dirs(separator: &str) -> Vec<String> {
    REQUIRED_MODULE_DIRS
        .iter()
        .map(|d| {
            if *d == DEFAULT_CHILD_SEPARATOR {
                separator.to_string()
            } else {
                d.to_string()
            }
        })
        .collect()
}
