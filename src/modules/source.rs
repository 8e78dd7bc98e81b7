//! Unit sources: where discovery finds settings and router units.
//!
//! A unit is addressed by a dotted path, `<package>.<unit name>`. Two sources
//! are provided:
//!
//! - [`FsUnitSource`] reads JSON units from a source tree, mapping
//!   `app.bot.modules.video.settings` to `<root>/app/bot/modules/video/settings.json`.
//! - [`ModuleManifest`] holds units registered in code, for modules that ship
//!   inside the binary.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{ForgeError, Result};
use crate::routing::RouterDef;

use super::layout::{DEFAULT_ROUTER_UNIT, DEFAULT_SETTINGS_UNIT, UNIT_EXTENSION};
use super::types::{RouterUnit, SettingsUnit};

/// Enumerates and loads units.
#[cfg_attr(test, mockall::automock)]
pub trait UnitSource {
    /// Every unit path reachable under `root_package`, in a stable order.
    fn walk(&self, root_package: &str) -> Result<Vec<String>>;

    /// Load a settings unit. Any failure is an `IMPORT ERROR`.
    fn import_settings(&self, unit_path: &str) -> Result<SettingsUnit>;

    /// Load a router unit and build its routing handle.
    fn import_router(&self, unit_path: &str) -> Result<RouterUnit>;
}

// ---------------------------------------------------------------------------
// Filesystem source
// ---------------------------------------------------------------------------

/// Units stored as `<name>.json` files under a source root.
#[derive(Debug, Clone)]
pub struct FsUnitSource {
    root_dir: PathBuf,
}

impl FsUnitSource {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// File backing a unit path.
    pub fn unit_file(&self, unit_path: &str) -> PathBuf {
        let mut path = unit_path
            .split('.')
            .fold(self.root_dir.clone(), |p, segment| p.join(segment));
        path.set_extension(UNIT_EXTENSION);
        path
    }

    fn read_unit(&self, unit_path: &str) -> Result<Value> {
        let file = self.unit_file(unit_path);
        let content = fs::read_to_string(&file).map_err(|e| {
            ForgeError::import(unit_path, format!("cannot read {}: {}", file.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| ForgeError::import(unit_path, e))
    }

    fn walk_dir(&self, dir: &Path, package: &str, out: &mut Vec<String>) -> Result<()> {
        let mut entries = fs::read_dir(dir)
            .map_err(|e| ForgeError::import(package, e))?
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|e| ForgeError::import(package, e))?;
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }

            let file_type = entry.file_type().map_err(|e| ForgeError::import(package, e))?;
            if file_type.is_symlink() {
                debug!(path = %path.display(), "Skipping symlink");
                continue;
            }

            if file_type.is_dir() {
                if name.contains('.') {
                    debug!(path = %path.display(), "Skipping directory with a dotted name");
                    continue;
                }
                self.walk_dir(&path, &format!("{}.{}", package, name), out)?;
            } else if path.extension().and_then(|e| e.to_str()) == Some(UNIT_EXTENSION) {
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                if stem.contains('.') {
                    continue;
                }
                out.push(format!("{}.{}", package, stem));
            }
        }
        Ok(())
    }
}

impl UnitSource for FsUnitSource {
    fn walk(&self, root_package: &str) -> Result<Vec<String>> {
        let dir = root_package
            .split('.')
            .fold(self.root_dir.clone(), |p, segment| p.join(segment));
        if !dir.is_dir() {
            return Err(ForgeError::import(
                root_package,
                format!("package directory {} not found", dir.display()),
            ));
        }

        let mut units = Vec::new();
        self.walk_dir(&dir, root_package, &mut units)?;
        Ok(units)
    }

    fn import_settings(&self, unit_path: &str) -> Result<SettingsUnit> {
        SettingsUnit::from_value(unit_path, self.read_unit(unit_path)?)
    }

    fn import_router(&self, unit_path: &str) -> Result<RouterUnit> {
        RouterUnit::from_value(unit_path, self.read_unit(unit_path)?)
    }
}

// ---------------------------------------------------------------------------
// In-code manifest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct ManifestEntry {
    settings: Option<Value>,
    router: Option<RouterDef>,
}

/// Modules registered in code rather than found on disk.
///
/// # Example
///
/// ```rust
/// use botforge::modules::{discover, ModuleLayout, ModuleManifest};
/// use botforge::routing::RouterDef;
/// use serde_json::json;
///
/// let mut manifest = ModuleManifest::new();
/// manifest.register(
///     "app.bot.modules.video",
///     json!({
///         "SERVICE_NAME": "video",
///         "ROOT_PACKAGE": "app.bot.modules.video",
///         "NAME_FOR_TEMP_FOLDER": "video",
///         "NAME_FOR_LOG_FOLDER": "video",
///         "SHOW_IN_MAIN_MENU": true
///     }),
///     RouterDef { name: "video".to_string(), handlers: vec![] },
/// );
///
/// let layout = ModuleLayout::new(".", "app.bot.modules");
/// let modules = discover(&manifest, &layout).unwrap();
/// assert_eq!(modules.len(), 1);
/// assert!(modules[0].is_root());
/// ```
#[derive(Debug, Clone)]
pub struct ModuleManifest {
    settings_unit: String,
    router_unit: String,
    entries: BTreeMap<String, ManifestEntry>,
}

impl ModuleManifest {
    pub fn new() -> Self {
        Self {
            settings_unit: DEFAULT_SETTINGS_UNIT.to_string(),
            router_unit: DEFAULT_ROUTER_UNIT.to_string(),
            entries: BTreeMap::new(),
        }
    }

    pub fn with_unit_names(mut self, settings_unit: &str, router_unit: &str) -> Self {
        self.settings_unit = settings_unit.to_string();
        self.router_unit = router_unit.to_string();
        self
    }

    /// Register both units of a module.
    pub fn register(&mut self, package: &str, settings: Value, router: RouterDef) -> &mut Self {
        self.register_settings(package, settings);
        self.register_router(package, router)
    }

    pub fn register_settings(&mut self, package: &str, settings: Value) -> &mut Self {
        self.entries.entry(package.to_string()).or_default().settings = Some(settings);
        self
    }

    pub fn register_router(&mut self, package: &str, router: RouterDef) -> &mut Self {
        self.entries.entry(package.to_string()).or_default().router = Some(router);
        self
    }

    /// Number of registered packages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_for(&self, unit_path: &str, unit_name: &str) -> Result<&ManifestEntry> {
        unit_path
            .strip_suffix(unit_name)
            .and_then(|p| p.strip_suffix('.'))
            .and_then(|package| self.entries.get(package))
            .ok_or_else(|| ForgeError::import(unit_path, "unit is not registered"))
    }
}

impl Default for ModuleManifest {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitSource for ModuleManifest {
    fn walk(&self, root_package: &str) -> Result<Vec<String>> {
        let prefix = format!("{}.", root_package);
        let mut units = Vec::new();
        for (package, entry) in &self.entries {
            if !package.starts_with(&prefix) {
                continue;
            }
            if entry.settings.is_some() {
                units.push(format!("{}.{}", package, self.settings_unit));
            }
            if entry.router.is_some() {
                units.push(format!("{}.{}", package, self.router_unit));
            }
        }
        Ok(units)
    }

    fn import_settings(&self, unit_path: &str) -> Result<SettingsUnit> {
        let entry = self.entry_for(unit_path, &self.settings_unit)?;
        let value = entry
            .settings
            .clone()
            .ok_or_else(|| ForgeError::import(unit_path, "unit is not registered"))?;
        SettingsUnit::from_value(unit_path, value)
    }

    fn import_router(&self, unit_path: &str) -> Result<RouterUnit> {
        let entry = self.entry_for(unit_path, &self.router_unit)?;
        let def = entry
            .router
            .clone()
            .ok_or_else(|| ForgeError::import(unit_path, "unit is not registered"))?;
        Ok(RouterUnit::new(unit_path, def))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_fs_unit_file() {
        let source = FsUnitSource::new("/src");
        assert_eq!(
            source.unit_file("app.bot.modules.video.settings"),
            PathBuf::from("/src/app/bot/modules/video/settings.json")
        );
    }

    #[test]
    fn test_fs_walk_lists_json_units_sorted() {
        let tmp = TempDir::new().unwrap();
        let modules = tmp.path().join("pkg");
        write(&modules.join("video/settings.json"), "{}");
        write(&modules.join("video/router.json"), "{}");
        write(&modules.join("video/childes/create/router.json"), "{}");
        write(&modules.join("video/childes/.keep"), "# init\n");
        write(&modules.join("video/README.md"), "# video");
        write(&modules.join("audio/settings.json"), "{}");

        let source = FsUnitSource::new(tmp.path());
        let units = source.walk("pkg").unwrap();
        assert_eq!(
            units,
            vec![
                "pkg.audio.settings",
                "pkg.video.childes.create.router",
                "pkg.video.router",
                "pkg.video.settings",
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_fs_walk_skips_symlinks() {
        let tmp = TempDir::new().unwrap();
        let modules = tmp.path().join("pkg");
        write(&modules.join("video/settings.json"), "{}");
        write(&tmp.path().join("outside/settings.json"), "{}");
        // A cycle back to the package root, plus a link leaving the tree
        std::os::unix::fs::symlink(&modules, modules.join("video/loop")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("outside"), modules.join("linked")).unwrap();
        std::os::unix::fs::symlink(
            modules.join("video/settings.json"),
            modules.join("video/router.json"),
        )
        .unwrap();

        let source = FsUnitSource::new(tmp.path());
        let units = source.walk("pkg").unwrap();
        assert_eq!(units, vec!["pkg.video.settings"]);
    }

    #[test]
    fn test_fs_walk_missing_package() {
        let tmp = TempDir::new().unwrap();
        let source = FsUnitSource::new(tmp.path());
        let err = source.walk("no.such.pkg").unwrap_err();
        assert_eq!(err.code(), "IMPORT ERROR");
    }

    #[test]
    fn test_fs_import_settings_and_router() {
        let tmp = TempDir::new().unwrap();
        write(
            &tmp.path().join("pkg/video/settings.json"),
            r#"{"SERVICE_NAME": "video"}"#,
        );
        write(
            &tmp.path().join("pkg/video/router.json"),
            r#"{"name": "video", "handlers": []}"#,
        );

        let source = FsUnitSource::new(tmp.path());
        let settings = source.import_settings("pkg.video.settings").unwrap();
        assert_eq!(settings.get("SERVICE_NAME"), Some(&json!("video")));

        let router = source.import_router("pkg.video.router").unwrap();
        assert_eq!(router.router().name(), "video");
    }

    #[test]
    fn test_fs_import_errors() {
        let tmp = TempDir::new().unwrap();
        write(&tmp.path().join("pkg/video/settings.json"), "{ broken");

        let source = FsUnitSource::new(tmp.path());
        let err = source.import_settings("pkg.video.settings").unwrap_err();
        assert_eq!(err.code(), "IMPORT ERROR");

        let err = source.import_router("pkg.video.router").unwrap_err();
        assert_eq!(err.code(), "IMPORT ERROR");
        assert!(err.to_string().contains("cannot read"));
    }

    #[test]
    fn test_manifest_walk_filters_by_root_package() {
        let mut manifest = ModuleManifest::new();
        manifest
            .register_settings("pkg.video", json!({}))
            .register_router(
                "pkg.video",
                RouterDef {
                    name: "video".into(),
                    handlers: vec![],
                },
            )
            .register_settings("other.audio", json!({}));

        assert_eq!(manifest.len(), 2);
        assert_eq!(
            manifest.walk("pkg").unwrap(),
            vec!["pkg.video.settings", "pkg.video.router"]
        );
    }

    #[test]
    fn test_manifest_import() {
        let mut manifest = ModuleManifest::new();
        manifest.register_settings("pkg.video", json!({"SERVICE_NAME": "video"}));

        assert!(manifest.import_settings("pkg.video.settings").is_ok());
        let err = manifest.import_router("pkg.video.router").unwrap_err();
        assert_eq!(err.code(), "IMPORT ERROR");
        assert!(manifest.import_settings("pkg.audio.settings").is_err());
    }

    #[test]
    fn test_manifest_non_object_settings_fail_on_import() {
        let mut manifest = ModuleManifest::new();
        manifest.register_settings("pkg.video", json!("not an object"));
        let err = manifest.import_settings("pkg.video.settings").unwrap_err();
        assert_eq!(err.code(), "IMPORT ERROR");
    }
}
