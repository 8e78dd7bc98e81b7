//! Module discovery for BotForge
//!
//! Walks a unit source under the root package, imports every settings and
//! router unit, and groups them by owning package. A package becomes a
//! [`ModuleDescriptor`] only if both of its units were found.
//!
//! Discovery is fail-fast: the first unit that fails to import aborts the
//! whole run with that error.

use std::collections::BTreeMap;

use tracing::{debug, error, info};

use crate::error::Result;

use super::layout::ModuleLayout;
use super::naming::{module_depth, resolve, Lineage};
use super::source::UnitSource;
use super::types::{ModuleDescriptor, RouterUnit, SettingsUnit};

#[derive(Default)]
struct Bucket {
    lineage: Option<Lineage>,
    settings: Option<SettingsUnit>,
    router: Option<RouterUnit>,
}

enum UnitKind {
    Settings,
    Router,
}

/// Discover every complete module under `layout.root_package()`.
///
/// # Errors
/// - `IMPORT ERROR` if the root package cannot be walked or any unit fails
///   to import.
pub fn discover(source: &dyn UnitSource, layout: &ModuleLayout) -> Result<Vec<ModuleDescriptor>> {
    let root_package = layout.root_package();
    let separator = layout.separator();
    let settings_suffix = layout.settings_suffix();
    let router_suffix = layout.router_suffix();
    let prefix = format!("{}.", root_package);

    let mut buckets: BTreeMap<String, Bucket> = BTreeMap::new();

    for unit_path in source.walk(root_package)? {
        let (package, kind) = if let Some(p) = unit_path.strip_suffix(&settings_suffix) {
            (p, UnitKind::Settings)
        } else if let Some(p) = unit_path.strip_suffix(&router_suffix) {
            (p, UnitKind::Router)
        } else {
            continue;
        };

        if !package.starts_with(&prefix) {
            debug!(unit = %unit_path, "Unit is not inside a module package, skipping");
            continue;
        }

        let bucket = buckets.entry(package.to_string()).or_default();
        match kind {
            UnitKind::Settings => {
                let unit = source.import_settings(&unit_path).map_err(|e| {
                    error!(unit = %unit_path, error = %e, "Failed to import settings unit");
                    e
                })?;
                bucket.settings = Some(unit);
            }
            UnitKind::Router => {
                let unit = source.import_router(&unit_path).map_err(|e| {
                    error!(unit = %unit_path, error = %e, "Failed to import router unit");
                    e
                })?;
                bucket.router = Some(unit);
            }
        }
        bucket.lineage = Some(resolve(&unit_path, root_package, separator));
    }

    let mut modules = Vec::new();
    for (package, bucket) in buckets {
        let (Some(lineage), Some(settings), Some(router)) =
            (bucket.lineage, bucket.settings, bucket.router)
        else {
            debug!(package = %package, "Package lacks a settings or router unit, dropping");
            continue;
        };

        let depth = module_depth(&package, root_package, separator);
        modules.push(ModuleDescriptor {
            package,
            root: lineage.root,
            parent: lineage.parent,
            depth,
            settings,
            router,
        });
    }

    info!(
        root_package = %root_package,
        modules = modules.len(),
        "Module discovery finished"
    );

    Ok(modules)
}
