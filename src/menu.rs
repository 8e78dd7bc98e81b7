//! Menu data derived from module settings.
//!
//! The main menu is a reply keyboard listing root modules; each module can
//! also offer an inline menu of its direct children.

use tracing::warn;

use crate::modules::ModuleDescriptor;

/// Reply-keyboard rows for the bot's main menu.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MainMenu {
    rows: Vec<Vec<String>>,
}

impl MainMenu {
    /// Build the menu from root modules that opt in via `SHOW_IN_MAIN_MENU`,
    /// leaving out the bot's own service.
    ///
    /// Modules whose settings do not parse are skipped with a warning.
    pub fn from_modules(modules: &[ModuleDescriptor], own_service: &str, columns: usize) -> Self {
        let mut roots: Vec<&ModuleDescriptor> = modules.iter().filter(|m| m.is_root()).collect();
        roots.sort_by(|a, b| a.root.cmp(&b.root));

        let mut labels = Vec::new();
        for module in roots {
            let settings = match module.settings.settings() {
                Ok(s) => s,
                Err(e) => {
                    warn!(package = %module.package, error = %e, "Skipping module in main menu");
                    continue;
                }
            };
            if settings.show_in_main_menu && settings.service_name != own_service {
                labels.push(settings.reply_text().to_string());
            }
        }

        let rows = labels
            .chunks(columns.max(1))
            .map(|chunk| chunk.to_vec())
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One inline button of a child menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuButton {
    pub text: String,
    pub callback_data: String,
}

/// Inline buttons for the direct children of `parent_package`, sorted by
/// package.
pub fn child_menu(
    modules: &[ModuleDescriptor],
    parent_package: &str,
    separator: &str,
) -> Vec<MenuButton> {
    let prefix = format!("{}.{}.", parent_package, separator);
    let nested = format!(".{}.", separator);

    let mut children: Vec<&ModuleDescriptor> = modules
        .iter()
        .filter(|m| {
            m.package
                .strip_prefix(&prefix)
                .is_some_and(|rest| !rest.is_empty() && !rest.contains(&nested))
        })
        .collect();
    children.sort_by(|a, b| a.package.cmp(&b.package));

    children
        .into_iter()
        .filter_map(|m| match m.settings.settings() {
            Ok(settings) => {
                let (text, data) = settings.callback();
                Some(MenuButton {
                    text: text.to_string(),
                    callback_data: data.to_string(),
                })
            }
            Err(e) => {
                warn!(package = %m.package, error = %e, "Skipping module in child menu");
                None
            }
        })
        .collect()
}
