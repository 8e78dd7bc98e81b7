//! Routing objects.
//!
//! A [`Router`] owns a list of handlers and an ordered list of child
//! routers. The [`Dispatcher`] is the top of the tree. Both implement
//! [`IncludeRouter`], so nesting a router under the dispatcher and nesting it
//! under another router look the same to the registration code.
//!
//! A router can be attached exactly once. Attachment is recorded on the child
//! (its parent name), and a second attempt is rejected.

use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::{ForgeError, Result};

/// Shared handle to a router.
pub type RouterHandle = Arc<Router>;

/// Anything that accepts child routers.
pub trait IncludeRouter {
    /// Attach `child` below `self`.
    fn include_router(&self, child: RouterHandle) -> Result<()>;
}

/// A message handler declared in a module's router unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerDef {
    /// Bot command without the leading slash (`start` matches `/start` and
    /// `/start payload`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Exact message text, e.g. a main-menu button label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Text sent back when the handler matches.
    pub reply: String,
}

impl HandlerDef {
    pub fn matches(&self, message: &str) -> bool {
        let message = message.trim();
        if let Some(text) = &self.text {
            if message == text {
                return true;
            }
        }
        if let Some(command) = &self.command {
            if let Some(rest) = message.strip_prefix('/') {
                let invoked = rest.split_whitespace().next().unwrap_or_default();
                // `/start@my_bot` addresses a specific bot in group chats
                let invoked = invoked.split('@').next().unwrap_or_default();
                return invoked == command;
            }
        }
        false
    }
}

/// Declarative content of a router unit (`router.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterDef {
    /// Router identifier, e.g. `video.childes.create`.
    pub name: String,

    #[serde(default)]
    pub handlers: Vec<HandlerDef>,
}

/// A node in the routing tree.
#[derive(Debug)]
pub struct Router {
    name: String,
    handlers: Vec<HandlerDef>,
    children: RwLock<Vec<RouterHandle>>,
    parent: OnceLock<String>,
}

impl Router {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_handlers(name, Vec::new())
    }

    pub fn with_handlers(name: impl Into<String>, handlers: Vec<HandlerDef>) -> Self {
        Self {
            name: name.into(),
            handlers,
            children: RwLock::new(Vec::new()),
            parent: OnceLock::new(),
        }
    }

    pub fn from_def(def: &RouterDef) -> Self {
        Self::with_handlers(def.name.clone(), def.handlers.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handlers(&self) -> &[HandlerDef] {
        &self.handlers
    }

    /// Name of the router or dispatcher this router was attached to.
    pub fn parent(&self) -> Option<&str> {
        self.parent.get().map(|s| s.as_str())
    }

    pub fn is_attached(&self) -> bool {
        self.parent.get().is_some()
    }

    /// Snapshot of the attached children, in attachment order.
    pub fn children(&self) -> Vec<RouterHandle> {
        self.children
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reply of the first matching handler: own handlers first, then the
    /// children depth-first in attachment order.
    pub fn route(&self, message: &str) -> Option<String> {
        if let Some(handler) = self.handlers.iter().find(|h| h.matches(message)) {
            return Some(handler.reply.clone());
        }
        self.children()
            .iter()
            .find_map(|child| child.route(message))
    }

    /// Whether `target` is this router or one of its descendants.
    fn contains(&self, target: &Router) -> bool {
        std::ptr::eq(self, target) || self.children().iter().any(|c| c.contains(target))
    }

    fn collect_tree(&self, depth: usize, out: &mut Vec<String>) {
        out.push(format!("{}{}", "  ".repeat(depth), self.name));
        for child in self.children() {
            child.collect_tree(depth + 1, out);
        }
    }

    fn count(&self) -> usize {
        1 + self.children().iter().map(|c| c.count()).sum::<usize>()
    }
}

impl IncludeRouter for Router {
    fn include_router(&self, child: RouterHandle) -> Result<()> {
        if child.contains(self) {
            return Err(ForgeError::Routing(format!(
                "Router '{}' cannot be attached below itself",
                child.name
            )));
        }
        claim_parent(&child, &self.name)?;
        self.children
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(child);
        Ok(())
    }
}

/// Top of the routing tree.
#[derive(Debug)]
pub struct Dispatcher {
    name: String,
    routers: RwLock<Vec<RouterHandle>>,
}

impl Dispatcher {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routers: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Routers attached directly to the dispatcher, in attachment order.
    pub fn routers(&self) -> Vec<RouterHandle> {
        self.routers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Route a message through the root routers in attachment order.
    pub fn dispatch(&self, message: &str) -> Option<String> {
        self.routers().iter().find_map(|r| r.route(message))
    }

    /// Total number of routers in the tree.
    pub fn router_count(&self) -> usize {
        self.routers().iter().map(|r| r.count()).sum()
    }

    /// One line per router, indented two spaces per level.
    pub fn tree(&self) -> Vec<String> {
        let mut out = Vec::new();
        for router in self.routers() {
            router.collect_tree(0, &mut out);
        }
        out
    }
}

impl IncludeRouter for Dispatcher {
    fn include_router(&self, child: RouterHandle) -> Result<()> {
        claim_parent(&child, &self.name)?;
        self.routers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(child);
        Ok(())
    }
}

fn claim_parent(child: &Router, parent: &str) -> Result<()> {
    child.parent.set(parent.to_string()).map_err(|_| {
        ForgeError::Routing(format!(
            "Router '{}' is already attached to '{}'",
            child.name,
            child.parent().unwrap_or_default()
        ))
    })
}
