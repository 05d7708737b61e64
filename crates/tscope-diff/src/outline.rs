#![forbid(unsafe_code)]

//! Plain-text outline of a [`NamespaceTree`].
//!
//! ```
//! use tscope_core::identifier::Identifier;
//! use tscope_diff::namespace::NamespaceTree;
//! use tscope_diff::outline::{Outline, OutlineGuides};
//!
//! let ids: Vec<Identifier> = ["a.x", "a.y"].iter().map(|s| s.parse().unwrap()).collect();
//! let tree = NamespaceTree::build(&ids);
//! let lines = Outline::new(&tree).guides(OutlineGuides::Ascii).lines();
//! assert_eq!(lines, ["a", "+-- x", "`-- y"]);
//! ```

use crate::namespace::{NamespaceTree, NodeId};

/// Guide characters for outline rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutlineGuides {
    /// `|`, `+--`, `` `-- ``.
    Ascii,
    /// Box-drawing characters.
    #[default]
    Unicode,
}

impl OutlineGuides {
    /// Vertical continuation (ancestor has siblings below).
    #[must_use]
    pub const fn vertical(&self) -> &str {
        match self {
            Self::Ascii => "|   ",
            Self::Unicode => "\u{2502}   ",
        }
    }

    /// Branch guide (item has siblings below).
    #[must_use]
    pub const fn branch(&self) -> &str {
        match self {
            Self::Ascii => "+-- ",
            Self::Unicode => "\u{251C}\u{2500}\u{2500} ",
        }
    }

    /// Last-item guide.
    #[must_use]
    pub const fn last(&self) -> &str {
        match self {
            Self::Ascii => "`-- ",
            Self::Unicode => "\u{2514}\u{2500}\u{2500} ",
        }
    }

    #[must_use]
    pub const fn space(&self) -> &str {
        "    "
    }
}

/// Builder for outline lines.
#[derive(Debug, Clone, Copy)]
pub struct Outline<'a> {
    tree: &'a NamespaceTree,
    guides: OutlineGuides,
    annotate: bool,
    only_flagged: bool,
}

impl<'a> Outline<'a> {
    #[must_use]
    pub fn new(tree: &'a NamespaceTree) -> Self {
        Self {
            tree,
            guides: OutlineGuides::default(),
            annotate: false,
            only_flagged: false,
        }
    }

    #[must_use]
    pub fn guides(mut self, guides: OutlineGuides) -> Self {
        self.guides = guides;
        self
    }

    /// Append `[mse=…]` to nodes that carry a severity.
    #[must_use]
    pub fn annotate(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }

    /// Hide subtrees without any severity.
    #[must_use]
    pub fn only_flagged(mut self, only_flagged: bool) -> Self {
        self.only_flagged = only_flagged;
        self
    }

    fn visible(&self, node: NodeId) -> bool {
        !self.only_flagged || self.tree.severity(node).is_some()
    }

    fn line(&self, prefix: &str, node: NodeId) -> String {
        let mut line = format!("{prefix}{}", self.tree.label(node));
        if self.annotate
            && let Some(severity) = self.tree.severity(node)
        {
            line.push_str(&format!("  [mse={severity:.3e}]"));
        }
        line
    }

    /// One line per visible node in depth-first order.
    ///
    /// Top-level segments start at column zero; deeper nodes get guides.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        for top in self.visible_children(NodeId::ROOT) {
            out.push(self.line("", top));
            self.walk(top, "", &mut out);
        }
        out
    }

    fn visible_children(&self, node: NodeId) -> Vec<NodeId> {
        self.tree
            .children(node)
            .filter(|&n| self.visible(n))
            .collect()
    }

    fn walk(&self, node: NodeId, indent: &str, out: &mut Vec<String>) {
        let children = self.visible_children(node);
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            let is_last = i + 1 == count;
            let (guide, cont) = if is_last {
                (self.guides.last(), self.guides.space())
            } else {
                (self.guides.branch(), self.guides.vertical())
            };
            out.push(self.line(&format!("{indent}{guide}"), child));
            self.walk(child, &format!("{indent}{cont}"), out);
        }
    }
}
