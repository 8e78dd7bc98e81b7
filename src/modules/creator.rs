//! Module scaffolder.
//!
//! `create_module(layout, "a.b.c", templates)` creates root `a`, its child `b`
//! and grandchild `c`, one level per segment. Existing ancestors are
//! re-validated and left untouched; the deepest segment must not exist yet.
//!
//! Creation is all-or-nothing per call: on any failure after the first
//! directory is made, every path this call created is deleted again.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::{ForgeError, Result};
use crate::utils::fs::{safe_delete, DELETE_ATTEMPTS};

use super::layout::{ModuleLayout, INIT_FILE};
use super::source::FsUnitSource;
use super::templates::{render, TemplateContext, TemplateSet};
use super::validate::{validate_module, validate_structure};

const INIT_FILE_CONTENT: &str = "";

/// What a successful [`create_module`] call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateReport {
    /// Module directories created by this call, shallowest first.
    pub created: Vec<PathBuf>,
    /// Pre-existing ancestor directories that were re-validated.
    pub existing: Vec<PathBuf>,
}

fn segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
}

/// Split a dotted module name into validated segments.
///
/// Each segment must be an identifier and must not be the child separator.
pub fn parse_module_name<'a>(module_name: &'a str, separator: &str) -> Result<Vec<&'a str>> {
    let module_name = module_name.trim();
    if module_name.is_empty() {
        return Err(ForgeError::InvalidModule("module name is empty".to_string()));
    }

    let segments: Vec<&str> = module_name.split('.').collect();
    for segment in &segments {
        if !segment_re().is_match(segment) {
            return Err(ForgeError::InvalidModule(format!(
                "'{}' is not a valid module name segment in '{}'",
                segment, module_name
            )));
        }
        if *segment == separator {
            return Err(ForgeError::InvalidModule(format!(
                "'{}' is reserved as the child separator",
                segment
            )));
        }
    }
    Ok(segments)
}

/// Paths to delete if the call fails.
#[derive(Default)]
struct Rollback {
    paths: Vec<PathBuf>,
}

impl Rollback {
    fn track(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    fn run(self) {
        if self.paths.is_empty() {
            return;
        }
        // Deepest first, so a failed outer delete still leaves inner ones done
        let mut paths = self.paths;
        paths.reverse();
        warn!(paths = paths.len(), "Rolling back module creation");
        let failed = safe_delete(&paths, DELETE_ATTEMPTS);
        for path in failed {
            warn!(path = %path.display(), "Path left behind after rollback");
        }
    }
}

/// Scaffold every missing level of `module_name`.
///
/// # Errors
/// - `Invalid module` for a malformed name or an invalid existing ancestor,
///   or when a freshly written level fails validation
/// - `Module is exists` if the deepest level is already on disk
/// - `Template Error` if a template uses an unknown placeholder
/// - `DIRECTORY CREATE ERROR` if a directory cannot be made
pub fn create_module(
    layout: &ModuleLayout,
    module_name: &str,
    templates: &TemplateSet,
) -> Result<CreateReport> {
    let segments = parse_module_name(module_name, layout.separator())?;

    let mut rollback = Rollback::default();
    let mut report = CreateReport::default();

    match create_chain(layout, &segments, templates, &mut rollback, &mut report) {
        Ok(()) => {
            info!(
                module = %module_name,
                created = report.created.len(),
                existing = report.existing.len(),
                "Module created"
            );
            Ok(report)
        }
        Err(e) => {
            warn!(module = %module_name, error = %e, "Module creation failed");
            rollback.run();
            Err(e)
        }
    }
}

fn create_chain(
    layout: &ModuleLayout,
    segments: &[&str],
    templates: &TemplateSet,
    rollback: &mut Rollback,
    report: &mut CreateReport,
) -> Result<()> {
    let source = FsUnitSource::new(layout.root_dir());

    for depth in 1..=segments.len() {
        let chain = &segments[..depth];
        let module_path = layout.module_dir(&chain.join("."));
        let package = layout.chain_package(chain);

        if module_path.exists() {
            if depth == segments.len() {
                return Err(ForgeError::ModuleExists(layout.chain_name(chain)));
            }
            validate_structure(&module_path, &layout.required_files(), layout.required_dirs())?;
            debug!(path = %module_path.display(), "Existing module level is valid");
            report.existing.push(module_path);
            continue;
        }

        // Tracked first: a partial create_dir_all leaves directories behind
        rollback.track(highest_missing_ancestor(&module_path));
        std::fs::create_dir_all(&module_path).map_err(|source| ForgeError::DirectoryCreate {
            path: module_path.clone(),
            source,
        })?;

        let ctx = TemplateContext::for_level(layout, chain);
        write_level(&module_path, &ctx, templates)?;
        validate_module(layout, &source, &module_path, &package)?;

        info!(
            module = %layout.chain_name(chain),
            path = %module_path.display(),
            "Module level created"
        );
        report.created.push(module_path);
    }

    Ok(())
}

fn write_level(module_path: &Path, ctx: &TemplateContext, templates: &TemplateSet) -> Result<()> {
    for file in templates.files() {
        let content = render(&file.content, ctx)
            .map_err(|e| ForgeError::Template(format!("{}: {}", file.name, template_reason(e))))?;
        std::fs::write(module_path.join(&file.name), content)?;
    }

    for dir in templates.dirs() {
        let dir_path = module_path.join(dir);
        std::fs::create_dir_all(&dir_path).map_err(|source| ForgeError::DirectoryCreate {
            path: dir_path.clone(),
            source,
        })?;
        let init = dir_path.join(INIT_FILE);
        if !init.exists() {
            std::fs::write(init, INIT_FILE_CONTENT)?;
        }
    }

    Ok(())
}

fn template_reason(err: ForgeError) -> String {
    match err {
        ForgeError::Template(reason) => reason,
        other => other.to_string(),
    }
}

/// Topmost directory on the way to `path` that does not exist yet.
fn highest_missing_ancestor(path: &Path) -> PathBuf {
    let mut top = path.to_path_buf();
    while let Some(parent) = top.parent() {
        if parent.as_os_str().is_empty() || parent.exists() {
            break;
        }
        top = parent.to_path_buf();
    }
    top
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::templates::TemplateFile;
    use crate::routing::RouterDef;
    use std::fs;
    use tempfile::TempDir;

    fn layout(tmp: &TempDir) -> ModuleLayout {
        ModuleLayout::new(tmp.path(), "app.bot.modules")
    }

    fn read_router(path: &Path) -> RouterDef {
        let text = fs::read_to_string(path.join("router.json")).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    // ---- name parsing tests ----

    #[test]
    fn test_parse_module_name() {
        assert_eq!(parse_module_name("a.b_2", "childes").unwrap(), vec!["a", "b_2"]);
        assert!(parse_module_name("", "childes").is_err());
        assert!(parse_module_name("a..b", "childes").is_err());
        assert!(parse_module_name("a/b", "childes").is_err());
        assert!(parse_module_name("../etc", "childes").is_err());
        assert!(parse_module_name("1abc", "childes").is_err());
        assert_eq!(
            parse_module_name("a.childes", "childes").unwrap_err().code(),
            "Invalid module"
        );
    }

    // ---- create tests ----

    #[test]
    fn test_create_root_module() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(&tmp);

        let report = create_module(&layout, "video", &TemplateSet::builtin(&layout)).unwrap();
        let path = layout.module_dir("video");
        assert_eq!(report.created, vec![path.clone()]);
        assert!(report.existing.is_empty());

        for file in ["settings.json", "router.json", "response.json", "README.md"] {
            assert!(path.join(file).is_file(), "{} missing", file);
        }
        for dir in layout.required_dirs() {
            assert!(path.join(dir).join(INIT_FILE).is_file(), "{} missing", dir);
        }
        assert_eq!(read_router(&path).name, "video");
    }

    #[test]
    fn test_create_chain_makes_one_dir_per_segment() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(&tmp);

        let report = create_module(&layout, "a.b.c", &TemplateSet::builtin(&layout)).unwrap();
        assert_eq!(report.created.len(), 3);

        assert_eq!(read_router(&layout.module_dir("a")).name, "a");
        assert_eq!(read_router(&layout.module_dir("a.b")).name, "a.childes.b");
        assert_eq!(
            read_router(&layout.module_dir("a.b.c")).name,
            "a.childes.b.childes.c"
        );

        let settings: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(layout.module_dir("a.b").join("settings.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(settings["ROOT_PACKAGE"], "app.bot.modules.a.childes.b");
        assert_eq!(settings["NAME_FOR_TEMP_FOLDER"], "a/childes/b");
        assert_eq!(settings["NAME_FOR_LOG_FOLDER"], "a");
    }

    #[test]
    fn test_create_twice_fails_without_side_effects() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(&tmp);
        let templates = TemplateSet::builtin(&layout);

        create_module(&layout, "a.b", &templates).unwrap();
        let settings_path = layout.module_dir("a.b").join("settings.json");
        fs::write(&settings_path, fs::read_to_string(&settings_path).unwrap() + "\n").unwrap();
        let before = fs::read(&settings_path).unwrap();

        let err = create_module(&layout, "a.b", &templates).unwrap_err();
        assert_eq!(err.code(), "Module is exists");
        assert!(layout.module_dir("a.b").is_dir());
        assert_eq!(fs::read(&settings_path).unwrap(), before);
    }

    #[test]
    fn test_create_child_keeps_existing_ancestor() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(&tmp);
        let templates = TemplateSet::builtin(&layout);

        create_module(&layout, "a", &templates).unwrap();
        let root = layout.module_dir("a");
        let settings_before = fs::read(root.join("settings.json")).unwrap();
        let router_before = fs::read(root.join("router.json")).unwrap();

        let report = create_module(&layout, "a.b", &templates).unwrap();
        assert_eq!(report.existing, vec![root.clone()]);
        assert_eq!(report.created, vec![layout.module_dir("a.b")]);
        assert_eq!(fs::read(root.join("settings.json")).unwrap(), settings_before);
        assert_eq!(fs::read(root.join("router.json")).unwrap(), router_before);
    }

    #[test]
    fn test_create_under_invalid_ancestor_fails() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(&tmp);
        fs::create_dir_all(layout.module_dir("a")).unwrap();

        let err = create_module(&layout, "a.b", &TemplateSet::builtin(&layout)).unwrap_err();
        assert_eq!(err.code(), "Invalid module");
        assert!(!layout.module_dir("a.b").exists());
    }

    #[test]
    fn test_template_error_rolls_back_whole_chain() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(&tmp);
        let mut templates = TemplateSet::builtin(&layout);
        templates.set_file(TemplateFile::new("README.md", "# {{name}} by {{author}}\n"));

        let err = create_module(&layout, "a.b.c", &templates).unwrap_err();
        assert_eq!(err.code(), "Template Error");
        assert!(err.to_string().contains("README.md"));

        // The root package dirs were created by this call too
        assert!(!tmp.path().join("app").exists());
    }

    #[test]
    fn test_rollback_spares_existing_ancestor() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(&tmp);
        create_module(&layout, "a", &TemplateSet::builtin(&layout)).unwrap();

        let mut templates = TemplateSet::builtin(&layout);
        templates.set_file(TemplateFile::new("README.md", "{{unknown}}"));
        create_module(&layout, "a.b.c", &templates).unwrap_err();

        assert!(layout.module_dir("a").join("settings.json").is_file());
        assert!(!layout.module_dir("a.b").exists());
    }

    #[test]
    fn test_validation_failure_rolls_back() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(&tmp);
        // No "keyboards" dir in the template set
        let builtin = TemplateSet::builtin(&layout);
        let dirs = builtin
            .dirs()
            .iter()
            .filter(|d| *d != "keyboards")
            .cloned()
            .collect();
        let templates = TemplateSet::new(builtin.files().to_vec(), dirs);

        let err = create_module(&layout, "a", &templates).unwrap_err();
        assert_eq!(err.code(), "Invalid module");
        assert!(!layout.module_dir("a").exists());
    }

    #[test]
    fn test_settings_missing_field_rolls_back() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(&tmp);
        let mut templates = TemplateSet::builtin(&layout);
        templates.set_file(TemplateFile::new(
            "settings.json",
            r#"{"SERVICE_NAME": "{{name}}"}"#,
        ));

        let err = create_module(&layout, "a", &templates).unwrap_err();
        assert_eq!(err.code(), "Invalid module");
        assert!(err.to_string().contains("ROOT_PACKAGE"));
        assert!(!layout.module_dir("a").exists());
    }

    #[test]
    fn test_failed_dir_create_is_already_tracked() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(&tmp);
        // A file where the modules root should be makes create_dir_all fail
        fs::create_dir_all(tmp.path().join("app/bot")).unwrap();
        fs::write(layout.modules_root(), "").unwrap();

        let templates = TemplateSet::builtin(&layout);
        let mut rollback = Rollback::default();
        let mut report = CreateReport::default();
        let err = create_chain(&layout, &["a"], &templates, &mut rollback, &mut report)
            .unwrap_err();

        assert_eq!(err.code(), "DIRECTORY CREATE ERROR");
        assert_eq!(rollback.paths, vec![layout.module_dir("a")]);
        assert!(report.created.is_empty());

        rollback.run();
        assert!(layout.modules_root().is_file());
    }

    #[test]
    fn test_highest_missing_ancestor() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("x/y/z");
        assert_eq!(highest_missing_ancestor(&target), tmp.path().join("x"));

        fs::create_dir_all(tmp.path().join("x")).unwrap();
        assert_eq!(highest_missing_ancestor(&target), tmp.path().join("x/y"));
    }
}
