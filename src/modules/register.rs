//! Router registration.
//!
//! Roots are attached to the dispatcher in lexicographic order of their
//! identifiers. Children are attached to their parent's router, which is
//! looked up among the roots only: a grandchild's parent resolves to its
//! root, so the tree built here is two levels deep.

use std::collections::{HashMap, HashSet};

use crate::logging::ModuleLoggers;
use crate::routing::{IncludeRouter, RouterHandle};

use super::types::ModuleDescriptor;

/// What [`register`] attached and what it left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    /// Root identifiers attached to the dispatcher, in attachment order.
    pub roots: Vec<String>,
    /// `(package, parent)` of every attached child, in attachment order.
    pub children: Vec<(String, String)>,
    /// Packages of children whose parent is not a registered root.
    pub skipped: Vec<String>,
    /// Packages seen more than once in the input.
    pub duplicates: Vec<String>,
    /// Packages whose router refused attachment (already attached elsewhere).
    pub rejected: Vec<String>,
}

impl RegistrationReport {
    pub fn attached_count(&self) -> usize {
        self.roots.len() + self.children.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Attach every module's router below `dispatcher`.
///
/// Never fails: unresolvable children, duplicates and refused attachments
/// are logged as warnings and listed in the report.
pub fn register(
    dispatcher: &dyn IncludeRouter,
    modules: &[ModuleDescriptor],
    logs: &ModuleLoggers,
) -> RegistrationReport {
    let mut report = RegistrationReport::default();
    let mut attached: HashSet<&str> = HashSet::new();
    let mut root_routers: HashMap<&str, &RouterHandle> = HashMap::new();

    let (mut roots, mut children): (Vec<&ModuleDescriptor>, Vec<&ModuleDescriptor>) =
        modules.iter().partition(|m| m.is_root());

    roots.sort_by(|a, b| a.root.cmp(&b.root));
    for module in roots {
        if attached.contains(module.package.as_str()) {
            logs.warning(&format!("Module {} listed twice, skipping", module.package));
            report.duplicates.push(module.package.clone());
            continue;
        }

        match dispatcher.include_router(module.router_handle().clone()) {
            Ok(()) => {
                attached.insert(&module.package);
                root_routers.insert(&module.root, module.router_handle());
                logs.info(&format!("Root router {} registered", module.root));
                report.roots.push(module.root.clone());
            }
            Err(e) => {
                logs.warning(&format!("Root router {} rejected: {}", module.root, e));
                report.rejected.push(module.package.clone());
            }
        }
    }

    children.sort_by_key(|m| m.depth);
    children.sort_by(|a, b| a.parent.cmp(&b.parent));
    for module in children {
        if attached.contains(module.package.as_str()) {
            logs.warning(&format!("Module {} listed twice, skipping", module.package));
            report.duplicates.push(module.package.clone());
            continue;
        }

        let parent = module.parent.as_deref().unwrap_or_default();
        let Some(parent_router) = root_routers.get(parent) else {
            logs.warning(&format!(
                "Parent router {} of {} is not registered, skipping",
                parent, module.package
            ));
            report.skipped.push(module.package.clone());
            continue;
        };

        match parent_router.include_router(module.router_handle().clone()) {
            Ok(()) => {
                attached.insert(&module.package);
                logs.info(&format!(
                    "Child router {} registered under {}",
                    module.router_handle().name(),
                    parent
                ));
                report
                    .children
                    .push((module.package.clone(), parent.to_string()));
            }
            Err(e) => {
                logs.warning(&format!(
                    "Child router {} rejected: {}",
                    module.router_handle().name(),
                    e
                ));
                report.rejected.push(module.package.clone());
            }
        }
    }

    if !report.skipped.is_empty() {
        logs.warning(&format!(
            "{} child module(s) skipped during registration",
            report.skipped_count()
        ));
    }

    report
}
