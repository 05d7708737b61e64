#![forbid(unsafe_code)]

//! Hierarchical severity aggregation over tensor identifiers.
//!
//! Every identifier prefix becomes a node (`dt0`, `dt0.rec1`,
//! `dt0.rec1.convA`, ...). Nodes live in an arena addressed by [`NodeId`];
//! a path → id map shares structure between identifiers with a common
//! prefix.
//!
//! Severities come from [`DiffResult`]s. A node's aggregate severity is the
//! max of its own severity and those of its children, computed by an
//! explicit post-order traversal. Nodes without any severity-bearing
//! descendant have no severity and therefore no color.
//!
//! ```
//! use tscope_core::identifier::Identifier;
//! use tscope_diff::batch::DiffResult;
//! use tscope_diff::namespace::NamespaceTree;
//!
//! let ids: Vec<Identifier> = ["a.rec1.x", "a.rec2.x", "a.rec1.y"]
//!     .iter()
//!     .map(|s| s.parse().unwrap())
//!     .collect();
//! let mut tree = NamespaceTree::build(&ids);
//! tree.apply_diff_results(&[DiffResult {
//!     left: ids[0].clone(),
//!     right: ids[1].clone(),
//!     error_magnitude: 0.5,
//! }]);
//! assert_eq!(tree.global_max(), Some(0.5));
//! let a = tree.find("a").unwrap();
//! assert_eq!(tree.severity(a), Some(0.5));
//! assert_eq!(tree.severity(tree.find("a.rec1.y").unwrap()), None);
//! ```

use std::collections::BTreeMap;

use ahash::AHashMap;
use tscope_core::identifier::Identifier;
use tscope_style::{Rgb, SeverityScale};

use crate::batch::DiffResult;

/// Index of a node in a [`NamespaceTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The synthetic root above all top-level segments.
    pub const ROOT: Self = Self(0);

    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Node {
    label: String,
    path: String,
    parent: Option<NodeId>,
    children: BTreeMap<String, NodeId>,
    own: Option<f64>,
    severity: Option<f64>,
}

impl Node {
    fn new(label: &str, path: &str, parent: Option<NodeId>) -> Self {
        Self {
            label: label.to_string(),
            path: path.to_string(),
            parent,
            children: BTreeMap::new(),
            own: None,
            severity: None,
        }
    }
}

fn max_severity(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

/// Arena-backed prefix tree of identifiers with severities.
#[derive(Debug, Clone)]
pub struct NamespaceTree {
    nodes: Vec<Node>,
    by_path: AHashMap<String, NodeId>,
}

impl Default for NamespaceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceTree {
    /// Tree with only the root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new("", "", None)],
            by_path: AHashMap::new(),
        }
    }

    /// Tree containing every identifier and all of their prefixes.
    #[must_use]
    pub fn build<'a, I>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = &'a Identifier>,
    {
        let mut tree = Self::new();
        for id in identifiers {
            tree.insert(id);
        }
        tree
    }

    /// Add `id` (and its prefixes), returning the leaf node.
    pub fn insert(&mut self, id: &Identifier) -> NodeId {
        let mut parent = NodeId::ROOT;
        for (label, path) in id.segments().zip(id.prefixes()) {
            parent = match self.by_path.get(path) {
                Some(&existing) => existing,
                None => {
                    let node = NodeId(self.nodes.len());
                    self.nodes.push(Node::new(label, path, Some(parent)));
                    self.nodes[parent.0].children.insert(label.to_string(), node);
                    self.by_path.insert(path.to_string(), node);
                    node
                }
            };
        }
        parent
    }

    /// Node for a full path such as `"dt0.rec1"`.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    /// Number of nodes, excluding the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn label(&self, node: NodeId) -> &str {
        &self.nodes[node.0].label
    }

    #[must_use]
    pub fn path(&self, node: NodeId) -> &str {
        &self.nodes[node.0].path
    }

    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    /// Children in label order.
    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[node.0].children.values().copied()
    }

    #[must_use]
    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.nodes[node.0].children.is_empty()
    }

    /// Aggregate severity (own or any descendant's max).
    #[must_use]
    pub fn severity(&self, node: NodeId) -> Option<f64> {
        self.nodes[node.0].severity
    }

    /// Severity assigned directly from diff results.
    #[must_use]
    pub fn own_severity(&self, node: NodeId) -> Option<f64> {
        self.nodes[node.0].own
    }

    /// Root aggregate: the worst severity in the tree.
    #[must_use]
    pub fn global_max(&self) -> Option<f64> {
        self.severity(NodeId::ROOT)
    }

    /// Replace all severities with those implied by `results`.
    ///
    /// Both sides of each result receive its magnitude; an identifier that
    /// appears several times keeps the largest. Identifiers not yet in the
    /// tree are inserted.
    pub fn apply_diff_results(&mut self, results: &[DiffResult]) {
        for node in &mut self.nodes {
            node.own = None;
            node.severity = None;
        }
        for result in results {
            for id in [&result.left, &result.right] {
                let node = self.insert(id);
                let own = &mut self.nodes[node.0].own;
                *own = max_severity(*own, Some(result.error_magnitude));
            }
        }
        self.propagate();
    }

    /// Drop every severity.
    pub fn clear_severities(&mut self) {
        self.apply_diff_results(&[]);
    }

    /// Recompute aggregates bottom-up. Idempotent.
    pub fn propagate(&mut self) {
        for node in self.post_order() {
            let children = self.nodes[node.0]
                .children
                .values()
                .fold(None, |acc, &child| max_severity(acc, self.nodes[child.0].severity));
            let n = &mut self.nodes[node.0];
            n.severity = max_severity(n.own, children);
        }
    }

    /// Every node, children before parents, root last.
    #[must_use]
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(NodeId::ROOT, false)];
        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                order.push(node);
                continue;
            }
            stack.push((node, true));
            for child in self.nodes[node.0].children.values().rev() {
                stack.push((*child, false));
            }
        }
        order
    }

    /// Color of `node` normalized against [`global_max`](Self::global_max).
    #[must_use]
    pub fn color_for(&self, node: NodeId, scale: &SeverityScale) -> Option<Rgb> {
        scale.color_for(self.severity(node), self.global_max().unwrap_or(0.0))
    }

    /// [`color_for`](Self::color_for) by identifier.
    #[must_use]
    pub fn color_for_identifier(&self, id: &Identifier, scale: &SeverityScale) -> Option<Rgb> {
        self.find(id.as_str()).and_then(|node| self.color_for(node, scale))
    }
}
