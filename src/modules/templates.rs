//! Scaffold templates for new modules
//!
//! A [`TemplateSet`] is the list of files and directories stamped into every
//! new module level. File contents use `{{token}}` placeholders that are
//! filled from a [`TemplateContext`]; a token the context does not know is a
//! `Template Error`, never silently left in the output.
//!
//! Projects can override built-in files by dropping same-named files into a
//! template directory (see [`TemplateSet::merge_from_dir`]).

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::error::{ForgeError, Result};

use super::layout::ModuleLayout;

// ============================================================================
// Built-in templates
// ============================================================================

const SETTINGS_TEMPLATE: &str = r#"{
  "SERVICE_NAME": "{{name}}",
  "MENU_REPLY_TEXT": "{{name}}",
  "MENU_CALLBACK_TEXT": "{{name}}",
  "MENU_CALLBACK_DATA": "{{name}}",
  "SHOW_IN_MAIN_MENU": true,
  "NAME_FOR_LOG_FOLDER": "{{log_name}}",
  "NAME_FOR_TEMP_FOLDER": "{{temp_path}}",
  "ROOT_PACKAGE": "{{root_package}}"
}
"#;

const ROUTER_TEMPLATE: &str = r#"{
  "name": "{{name}}",
  "handlers": [
    {
      "text": "{{name}}",
      "reply": "Module {{name}} (root router: {{root_router_name}})"
    }
  ]
}
"#;

const RESPONSE_TEMPLATE: &str = r#"{
  "children_path": "{{path_to_module}}",
  "children_package": "{{root_childes}}"
}
"#;

const README_TEMPLATE: &str = "# {{name}}

Package: `{{root_package}}`
Temp folder: `{{temp_path}}`
Log folder: `{{log_name}}`

Child modules live under `{{path_to_module}}` and are imported from
`{{root_childes}}`.
";

/// Directories stamped into every module (the separator directory is taken
/// from the layout).
const TEMPLATE_DIRS: [&str; 6] = ["api", "fsm", "services", "utils", "handlers", "keyboards"];

/// Placeholder tokens a template may use.
pub const PLACEHOLDERS: [&str; 7] = [
    "name",
    "log_name",
    "temp_path",
    "root_package",
    "path_to_module",
    "root_childes",
    "root_router_name",
];

// ============================================================================
// Rendering
// ============================================================================

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap())
}

/// Values substituted into templates for one module level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateContext {
    values: BTreeMap<&'static str, String>,
}

impl TemplateContext {
    /// Context for the level named by `chain` (`["video", "create"]` is the
    /// `create` child of `video`).
    pub fn for_level(layout: &ModuleLayout, chain: &[&str]) -> Self {
        let separator = layout.separator();
        let root = chain.first().copied().unwrap_or_default().to_string();
        let name = layout.chain_name(chain);
        let temp_path = name.replace('.', "/");
        let package = layout.chain_package(chain);

        let mut values = BTreeMap::new();
        values.insert("path_to_module", format!("{}/{}", temp_path, separator));
        values.insert("root_childes", format!("{}.{}", package, separator));
        values.insert("log_name", root.clone());
        values.insert("root_router_name", root);
        values.insert("name", name);
        values.insert("temp_path", temp_path);
        values.insert("root_package", package);
        Self { values }
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.values.get(token).map(|v| v.as_str())
    }
}

/// Fill every `{{token}}` in `template`.
///
/// # Errors
/// `Template Error` naming the first unknown token.
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let re = placeholder_re();

    if let Some(unknown) = re
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .find(|token| ctx.get(token).is_none())
    {
        return Err(ForgeError::Template(format!(
            "unknown placeholder '{{{{{}}}}}'",
            unknown
        )));
    }

    Ok(re
        .replace_all(template, |caps: &Captures| {
            caps.get(1)
                .and_then(|m| ctx.get(m.as_str()))
                .unwrap_or_default()
                .to_string()
        })
        .into_owned())
}

// ============================================================================
// TemplateSet
// ============================================================================

/// One file stamped into a new module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    pub name: String,
    pub content: String,
}

impl TemplateFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Files and directories making up a new module level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSet {
    files: Vec<TemplateFile>,
    dirs: Vec<String>,
}

impl TemplateSet {
    pub fn new(files: Vec<TemplateFile>, dirs: Vec<String>) -> Self {
        Self { files, dirs }
    }

    /// The built-in set, named after the layout's unit files and separator.
    pub fn builtin(layout: &ModuleLayout) -> Self {
        let files = vec![
            TemplateFile::new(layout.settings_file(), SETTINGS_TEMPLATE),
            TemplateFile::new(layout.router_file(), ROUTER_TEMPLATE),
            TemplateFile::new("response.json", RESPONSE_TEMPLATE),
            TemplateFile::new("README.md", README_TEMPLATE),
        ];
        let mut dirs: Vec<String> = TEMPLATE_DIRS.iter().map(|d| d.to_string()).collect();
        dirs.push(layout.separator().to_string());
        Self { files, dirs }
    }

    pub fn files(&self) -> &[TemplateFile] {
        &self.files
    }

    pub fn dirs(&self) -> &[String] {
        &self.dirs
    }

    /// Add a file, replacing any file with the same name.
    pub fn set_file(&mut self, file: TemplateFile) {
        match self.files.iter_mut().find(|f| f.name == file.name) {
            Some(existing) => *existing = file,
            None => self.files.push(file),
        }
    }

    /// Read every regular file in `dir` as a template file.
    ///
    /// A nonexistent directory yields an empty list. Unreadable files are
    /// skipped with a warning.
    pub fn load_from_dir(dir: &Path) -> Result<Vec<TemplateFile>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }

        if !dir.is_dir() {
            return Err(ForgeError::Config(format!(
                "Template path is not a directory: {}",
                dir.display()
            )));
        }

        let mut entries = std::fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
        entries.sort_by_key(|e| e.file_name());

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match std::fs::read_to_string(&path) {
                Ok(content) => files.push(TemplateFile::new(name, content)),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read template file"
                    );
                }
            }
        }

        Ok(files)
    }

    /// Override files from `dir`; returns how many files were merged.
    pub fn merge_from_dir(&mut self, dir: &Path) -> Result<usize> {
        let files = Self::load_from_dir(dir)?;
        let count = files.len();
        for file in files {
            self.set_file(file);
        }
        Ok(count)
    }
}
