//! BotForge - module discovery, scaffolding and router registration for chat bots

pub mod bot;
pub mod config;
pub mod error;
pub mod logging;
pub mod menu;
pub mod modules;
pub mod routing;
pub mod startup;
pub mod utils;

pub use config::Config;
pub use error::{ForgeError, Result};
