//! The service routing tree.

use crate::{DirectoryError, DirectoryResult};
use cohort_store::GroupStore;
use cohort_types::ServiceName;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// One node of the federation's routing tree.
///
/// A *component* groups sub-services under path segments and holds no groups
/// of its own. A *leaf service* binds the path that reaches it to the store
/// that owns those groups.
pub enum ServiceNode {
    Component {
        children: BTreeMap<String, ServiceNode>,
    },
    Leaf(Arc<dyn GroupStore>),
}

impl ServiceNode {
    /// An empty component node.
    #[must_use]
    pub fn component() -> Self {
        Self::Component {
            children: BTreeMap::new(),
        }
    }

    /// A leaf node bound to `store`.
    #[must_use]
    pub fn leaf(store: Arc<dyn GroupStore>) -> Self {
        Self::Leaf(store)
    }

    /// Returns true when this node operates directly on groups.
    #[must_use]
    pub fn is_leaf_service(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    /// Mounts `store` at `path`, creating intermediate components as needed.
    ///
    /// Fails when `path` crosses an existing leaf, when something is already
    /// mounted at `path`, or when `path` is empty but this node already has
    /// children.
    pub fn mount(&mut self, path: &ServiceName, store: Arc<dyn GroupStore>) -> DirectoryResult<()> {
        let mut node = self;
        for (depth, segment) in path.segments().iter().enumerate() {
            let children = match node {
                Self::Component { children } => children,
                Self::Leaf(_) => {
                    return Err(DirectoryError::MountConflict(
                        path.to_string(),
                        format!("'{}' is a leaf service", prefix_of(path, depth)),
                    ));
                }
            };
            let last = depth + 1 == path.len();
            if last {
                if children.contains_key(segment) {
                    return Err(DirectoryError::MountConflict(
                        path.to_string(),
                        "a service is already mounted there".into(),
                    ));
                }
                children.insert(segment.clone(), Self::Leaf(store));
                debug!(service = %path, "leaf service mounted");
                return Ok(());
            }
            node = children
                .entry(segment.clone())
                .or_insert_with(Self::component);
        }
        // Empty path: this node itself becomes the leaf.
        match node {
            Self::Component { children } if children.is_empty() => {
                *node = Self::Leaf(store);
                debug!("leaf service mounted at federation root");
                Ok(())
            }
            _ => Err(DirectoryError::MountConflict(
                path.to_string(),
                "the root already has services".into(),
            )),
        }
    }

    /// Returns the node reached by walking `path`, or `None` when the path
    /// leaves the tree.
    #[must_use]
    pub fn resolve(&self, path: &ServiceName) -> Option<&ServiceNode> {
        let mut node = self;
        for segment in path.segments() {
            match node {
                Self::Component { children } => node = children.get(segment)?,
                Self::Leaf(_) => return None,
            }
        }
        Some(node)
    }

    /// Returns the store of the leaf service at `path`.
    #[must_use]
    pub fn store_for(&self, path: &ServiceName) -> Option<&Arc<dyn GroupStore>> {
        match self.resolve(path)? {
            Self::Leaf(store) => Some(store),
            Self::Component { .. } => None,
        }
    }

    /// Collects every leaf service with its fully-qualified name, in
    /// name order.
    #[must_use]
    pub fn leaf_services(&self) -> Vec<(ServiceName, Arc<dyn GroupStore>)> {
        let mut leaves = Vec::new();
        collect_leaves(self, &ServiceName::root(), &mut leaves);
        leaves
    }
}

impl fmt::Debug for ServiceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Component { children } => f
                .debug_map()
                .entries(children.iter().map(|(k, v)| (k, v)))
                .finish(),
            Self::Leaf(_) => f.write_str("Leaf"),
        }
    }
}

fn collect_leaves(
    node: &ServiceNode,
    prefix: &ServiceName,
    out: &mut Vec<(ServiceName, Arc<dyn GroupStore>)>,
) {
    match node {
        ServiceNode::Leaf(store) => out.push((prefix.clone(), Arc::clone(store))),
        ServiceNode::Component { children } => {
            for (segment, child) in children {
                // Segments are non-empty by ServiceName's own invariant.
                if let Ok(path) = prefix.child(segment) {
                    collect_leaves(child, &path, out);
                }
            }
        }
    }
}

fn prefix_of(path: &ServiceName, depth: usize) -> String {
    path.segments()[..depth].join(".")
}
