//! Module types for BotForge
//!
//! This module defines the units a module is made of (its settings object and
//! its router), the typed view of the settings contract, and the descriptor
//! that discovery emits for each complete module.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ForgeError, Result};
use crate::routing::{Router, RouterDef, RouterHandle};

/// Field names every settings object must declare.
pub const REQUIRED_SETTINGS_FIELDS: [&str; 5] = [
    "SERVICE_NAME",
    "ROOT_PACKAGE",
    "NAME_FOR_TEMP_FOLDER",
    "NAME_FOR_LOG_FOLDER",
    "SHOW_IN_MAIN_MENU",
];

/// Typed view of a module's settings contract.
///
/// # Example
///
/// ```json
/// {
///   "SERVICE_NAME": "video.childes.create",
///   "ROOT_PACKAGE": "app.bot.modules.video.childes.create",
///   "NAME_FOR_TEMP_FOLDER": "video/childes/create",
///   "NAME_FOR_LOG_FOLDER": "video",
///   "SHOW_IN_MAIN_MENU": true,
///   "MENU_REPLY_TEXT": "Create video"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSettings {
    /// Globally unique module identifier.
    #[serde(rename = "SERVICE_NAME")]
    pub service_name: String,

    /// Dotted package of the module.
    #[serde(rename = "ROOT_PACKAGE")]
    pub root_package: String,

    /// Temp folder, relative to the configured temp dir.
    #[serde(rename = "NAME_FOR_TEMP_FOLDER")]
    pub temp_folder: String,

    /// Log folder, relative to the configured log dir.
    #[serde(rename = "NAME_FOR_LOG_FOLDER")]
    pub log_folder: String,

    #[serde(rename = "SHOW_IN_MAIN_MENU")]
    pub show_in_main_menu: bool,

    #[serde(rename = "MENU_REPLY_TEXT", default, skip_serializing_if = "Option::is_none")]
    pub menu_reply_text: Option<String>,

    #[serde(rename = "MENU_CALLBACK_TEXT", default, skip_serializing_if = "Option::is_none")]
    pub menu_callback_text: Option<String>,

    #[serde(rename = "MENU_CALLBACK_DATA", default, skip_serializing_if = "Option::is_none")]
    pub menu_callback_data: Option<String>,
}

impl ModuleSettings {
    /// Label shown on the main-menu keyboard.
    pub fn reply_text(&self) -> &str {
        self.menu_reply_text.as_deref().unwrap_or(self.service_name.as_str())
    }

    /// Label and callback payload of the inline menu button.
    pub fn callback(&self) -> (&str, &str) {
        (
            self.menu_callback_text
                .as_deref()
                .unwrap_or(self.service_name.as_str()),
            self.menu_callback_data
                .as_deref()
                .unwrap_or(self.service_name.as_str()),
        )
    }
}

/// A loaded settings unit: the raw JSON object as declared on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsUnit {
    unit_path: String,
    fields: Map<String, Value>,
}

impl SettingsUnit {
    pub fn new(unit_path: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            unit_path: unit_path.into(),
            fields,
        }
    }

    /// Parse a JSON document; anything other than an object is rejected.
    pub fn from_value(unit_path: impl Into<String>, value: Value) -> Result<Self> {
        let unit_path = unit_path.into();
        match value {
            Value::Object(fields) => Ok(Self::new(unit_path, fields)),
            other => Err(ForgeError::import(
                unit_path,
                format!("expected a JSON object, found {}", json_kind(&other)),
            )),
        }
    }

    pub fn unit_path(&self) -> &str {
        &self.unit_path
    }

    /// Names of the fields this settings object declares.
    pub fn declared_fields(&self) -> BTreeSet<&str> {
        self.fields.keys().map(|k| k.as_str()).collect()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Required fields that are not declared.
    pub fn missing_fields<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|f| !self.fields.contains_key(*f))
            .collect()
    }

    /// Typed view of the contract fields.
    pub fn settings(&self) -> Result<ModuleSettings> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|e| {
            ForgeError::InvalidModule(format!("settings unit '{}': {}", self.unit_path, e))
        })
    }
}

/// A loaded router unit with its routing handle.
#[derive(Debug, Clone)]
pub struct RouterUnit {
    unit_path: String,
    def: RouterDef,
    router: RouterHandle,
}

impl RouterUnit {
    pub fn new(unit_path: impl Into<String>, def: RouterDef) -> Self {
        let router = Arc::new(Router::from_def(&def));
        Self {
            unit_path: unit_path.into(),
            def,
            router,
        }
    }

    pub fn from_value(unit_path: impl Into<String>, value: Value) -> Result<Self> {
        let unit_path = unit_path.into();
        let def: RouterDef =
            serde_json::from_value(value).map_err(|e| ForgeError::import(unit_path.clone(), e))?;
        Ok(Self::new(unit_path, def))
    }

    pub fn unit_path(&self) -> &str {
        &self.unit_path
    }

    pub fn def(&self) -> &RouterDef {
        &self.def
    }

    /// The routing handle attached during registration.
    pub fn router(&self) -> &RouterHandle {
        &self.router
    }
}

/// One discovered module: both of its units plus its place in the hierarchy.
#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    /// Fully-qualified dotted package, unique per discovery run.
    pub package: String,

    /// Identifier of the top-level ancestor.
    pub root: String,

    /// Flattened parent identifier; `None` for root modules.
    pub parent: Option<String>,

    /// Separator hops below the root package (root modules are 0).
    pub depth: usize,

    pub settings: SettingsUnit,

    pub router: RouterUnit,
}

impl ModuleDescriptor {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn module_depth(&self) -> usize {
        self.depth
    }

    /// Routing handle of the module's router unit.
    pub fn router_handle(&self) -> &RouterHandle {
        self.router.router()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
