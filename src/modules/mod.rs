//! Feature modules for BotForge
//!
//! A module is a directory holding a settings unit, a router unit and a fixed
//! set of subdirectories. Modules nest: a child of `video` lives under
//! `video/<separator>/`. This module covers the whole lifecycle:
//!
//! - [`naming`] derives root and parent identifiers from a dotted unit path
//! - [`discover`] finds every complete module in a [`UnitSource`]
//! - [`validate`] checks structure and the settings contract
//! - [`create_module`] scaffolds a module chain from a [`TemplateSet`]
//! - [`remove_module`] deletes a module with its temp and log folders
//! - [`register`] attaches discovered routers below a dispatcher
//!
//! # Module Layout
//!
//! ```text
//! app/bot/modules/
//! └── video/
//!     ├── settings.json
//!     ├── router.json
//!     ├── api/  fsm/  services/  utils/  handlers/  keyboards/
//!     └── childes/
//!         └── create/
//!             ├── settings.json
//!             └── router.json
//! ```

pub mod creator;
pub mod layout;
mod loader;
pub mod naming;
pub mod register;
pub mod remover;
pub mod source;
pub mod templates;
pub mod types;
pub mod validate;

pub use creator::{create_module, CreateReport};
pub use layout::ModuleLayout;
pub use loader::discover;
pub use register::{register, RegistrationReport};
pub use remover::{remove_module, Confirm, RemovalOutcome, RemoveOptions, StdinConfirm};
pub use source::{FsUnitSource, ModuleManifest, UnitSource};
pub use templates::{TemplateFile, TemplateSet};
pub use types::{ModuleDescriptor, ModuleSettings, RouterUnit, SettingsUnit};
pub use validate::{validate_module, validate_settings, validate_structure};
