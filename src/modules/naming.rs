//! Root/parent resolution from dotted unit paths.
//!
//! Hierarchy is flattened to two levels: every descendant resolves its
//! parent to the top-level root, so a grandchild attaches directly under the
//! root router, not under its immediate parent.

/// Root identifier and (flattened) parent identifier of a unit path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lineage {
    pub root: String,
    pub parent: Option<String>,
}

impl Lineage {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Resolve a unit path such as `pkg.video.childes.main.router` into its
/// root (`video`) and parent (`Some("video")` for any child, `None` for the
/// root itself).
pub fn resolve(module_path: &str, root_package: &str, separator: &str) -> Lineage {
    let prefix = format!("{}.", root_package);
    let relative = module_path.strip_prefix(&prefix).unwrap_or(module_path);

    let marker = format!(".{}.", separator);
    let mut parts = relative.split(marker.as_str());
    let head = parts.next().unwrap_or_default();
    let is_child = parts.next().is_some();

    // A root-level unit path still carries its file-type suffix
    // (`video.router`); only the first segment names the root.
    let root = head.split('.').next().unwrap_or_default().to_string();
    let parent = is_child.then(|| root.clone());

    Lineage { root, parent }
}

/// Number of separator hops in `package` below `root_package`; a root
/// module has depth 0.
pub fn module_depth(package: &str, root_package: &str, separator: &str) -> usize {
    let prefix = format!("{}.", root_package);
    let relative = package.strip_prefix(&prefix).unwrap_or(package);
    relative.split('.').filter(|s| *s == separator).count()
}
