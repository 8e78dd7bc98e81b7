//! Structure and settings-contract checks.
//!
//! Both checks are read-only and safe to call speculatively. Violations are
//! reported as `Invalid module` errors naming what is missing.

use std::path::Path;

use crate::error::{ForgeError, Result};

use super::layout::ModuleLayout;
use super::source::UnitSource;
use super::types::REQUIRED_SETTINGS_FIELDS;

/// Check that every required file and directory exists in `path`.
///
/// Files are checked before directories; the first missing entry is named
/// in the error.
pub fn validate_structure(
    path: &Path,
    required_files: &[String],
    required_dirs: &[String],
) -> Result<()> {
    for file in required_files {
        if !path.join(file).is_file() {
            return Err(ForgeError::InvalidModule(format!(
                "structure of {}: file {} missing",
                path.display(),
                file
            )));
        }
    }
    for dir in required_dirs {
        if !path.join(dir).is_dir() {
            return Err(ForgeError::InvalidModule(format!(
                "structure of {}: directory {} missing",
                path.display(),
                dir
            )));
        }
    }
    Ok(())
}

/// Import `<package>.<settings_unit>` and check that it declares every
/// required field. Import failures are returned unchanged.
pub fn validate_settings(
    source: &dyn UnitSource,
    package: &str,
    required_fields: &[&str],
    settings_unit: &str,
) -> Result<()> {
    let unit = source.import_settings(&format!("{}.{}", package, settings_unit))?;
    let missing = unit.missing_fields(required_fields);
    if !missing.is_empty() {
        return Err(ForgeError::InvalidModule(format!(
            "settings of {}: fields {} missing",
            package,
            missing.join(", ")
        )));
    }
    Ok(())
}

/// Run both checks for the module at `path` with dotted `package`.
pub fn validate_module(
    layout: &ModuleLayout,
    source: &dyn UnitSource,
    path: &Path,
    package: &str,
) -> Result<()> {
    validate_structure(path, &layout.required_files(), layout.required_dirs())?;
    validate_settings(
        source,
        package,
        &REQUIRED_SETTINGS_FIELDS,
        layout.settings_unit(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::layout::REQUIRED_MODULE_DIRS;
    use crate::modules::source::{FsUnitSource, ModuleManifest};
    use serde_json::{json, Value};
    use std::fs;
    use tempfile::TempDir;

    fn required_files() -> Vec<String> {
        vec!["settings.json".to_string(), "router.json".to_string()]
    }

    fn required_dirs() -> Vec<String> {
        REQUIRED_MODULE_DIRS.iter().map(|d| d.to_string()).collect()
    }

    fn make_module(path: &Path) {
        fs::create_dir_all(path).unwrap();
        for file in required_files() {
            fs::write(path.join(file), "{}").unwrap();
        }
        for dir in required_dirs() {
            fs::create_dir_all(path.join(dir)).unwrap();
        }
    }

    fn complete_settings() -> Value {
        json!({
            "SERVICE_NAME": "video",
            "ROOT_PACKAGE": "pkg.video",
            "NAME_FOR_TEMP_FOLDER": "video",
            "NAME_FOR_LOG_FOLDER": "video",
            "SHOW_IN_MAIN_MENU": false,
            "MENU_REPLY_TEXT": "Video",
            "SOMETHING_ELSE": 42
        })
    }

    #[test]
    fn test_validate_structure_ok() {
        let tmp = TempDir::new().unwrap();
        make_module(tmp.path());
        assert!(validate_structure(tmp.path(), &required_files(), &required_dirs()).is_ok());
    }

    #[test]
    fn test_validate_structure_missing_file() {
        let tmp = TempDir::new().unwrap();
        make_module(tmp.path());
        fs::remove_file(tmp.path().join("router.json")).unwrap();

        let err = validate_structure(tmp.path(), &required_files(), &required_dirs()).unwrap_err();
        assert_eq!(err.code(), "Invalid module");
        assert!(err.to_string().contains("router.json missing"));
    }

    #[test]
    fn test_validate_structure_missing_dir() {
        let tmp = TempDir::new().unwrap();
        make_module(tmp.path());
        fs::remove_dir(tmp.path().join("keyboards")).unwrap();

        let err = validate_structure(tmp.path(), &required_files(), &required_dirs()).unwrap_err();
        assert!(err.to_string().contains("directory keyboards missing"));
    }

    #[test]
    fn test_validate_structure_file_in_place_of_dir() {
        let tmp = TempDir::new().unwrap();
        make_module(tmp.path());
        fs::remove_dir(tmp.path().join("api")).unwrap();
        fs::write(tmp.path().join("api"), "").unwrap();

        assert!(validate_structure(tmp.path(), &required_files(), &required_dirs()).is_err());
    }

    #[test]
    fn test_validate_settings_accepts_extra_fields() {
        let mut manifest = ModuleManifest::new();
        manifest.register_settings("pkg.video", complete_settings());

        assert!(validate_settings(
            &manifest,
            "pkg.video",
            &REQUIRED_SETTINGS_FIELDS,
            "settings"
        )
        .is_ok());
    }

    #[test]
    fn test_validate_settings_each_required_field() {
        for field in REQUIRED_SETTINGS_FIELDS {
            let mut settings = complete_settings();
            settings.as_object_mut().unwrap().remove(field);

            let mut manifest = ModuleManifest::new();
            manifest.register_settings("pkg.video", settings);

            let err = validate_settings(&manifest, "pkg.video", &REQUIRED_SETTINGS_FIELDS, "settings")
                .unwrap_err();
            assert_eq!(err.code(), "Invalid module", "field {}", field);
            assert!(err.to_string().contains(field));
        }
    }

    #[test]
    fn test_validate_settings_propagates_import_error() {
        let tmp = TempDir::new().unwrap();
        let source = FsUnitSource::new(tmp.path());
        let err = validate_settings(&source, "pkg.video", &REQUIRED_SETTINGS_FIELDS, "settings")
            .unwrap_err();
        assert_eq!(err.code(), "IMPORT ERROR");
    }

    #[test]
    fn test_validate_module_on_disk() {
        let tmp = TempDir::new().unwrap();
        let layout = ModuleLayout::new(tmp.path(), "pkg");
        let path = layout.module_dir("video");
        make_module(&path);
        fs::write(
            path.join("settings.json"),
            serde_json::to_string(&complete_settings()).unwrap(),
        )
        .unwrap();

        let source = FsUnitSource::new(tmp.path());
        assert!(validate_module(&layout, &source, &path, "pkg.video").is_ok());
    }
}
