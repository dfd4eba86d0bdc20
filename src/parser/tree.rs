//! Parse tree stored as an arena of index-addressed nodes.
//!
//! Both tree walks mutate the tree through `&mut ParseTree` and address nodes by
//! [`NodeId`], so reference nodes recorded by the scope resolver stay valid while
//! the renamer rewrites leaves in place.

use std::fmt;

use super::labels::{TABLE_NAMES, TABLE_REFERENCE};

/// Stable index of a node inside a [`ParseTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A tree node: either a labelled branch or a leaf token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Branch { label: String, children: Vec<NodeId> },
    Leaf(String),
}

/// Parse tree produced by the chart parser.
#[derive(Debug, Clone, Default)]
pub struct ParseTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl ParseTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a leaf holding `value` and return its id.
    pub fn add_leaf(&mut self, value: impl Into<String>) -> NodeId {
        self.push(Node::Leaf(value.into()))
    }

    /// Add a branch labelled `label` over `children` and return its id.
    pub fn add_branch(&mut self, label: impl Into<String>, children: Vec<NodeId>) -> NodeId {
        self.push(Node::Branch {
            label: label.into(),
            children,
        })
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    /// Root node, `None` until [`ParseTree::set_root`] is called.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Label of a branch, `None` for leaves.
    pub fn label(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0] {
            Node::Branch { label, .. } => Some(label),
            Node::Leaf(_) => None,
        }
    }

    /// True if `id` is a branch labelled `label`.
    #[inline]
    pub fn is(&self, id: NodeId, label: &str) -> bool {
        self.label(id) == Some(label)
    }

    /// Children of a branch (empty for leaves).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id.0] {
            Node::Branch { children, .. } => children,
            Node::Leaf(_) => &[],
        }
    }

    /// Children that are branches, skipping leaf tokens.
    pub fn subtrees(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.label(*child).is_some())
            .collect()
    }

    /// Value of a leaf, `None` for branches.
    pub fn leaf(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0] {
            Node::Leaf(value) => Some(value),
            Node::Branch { .. } => None,
        }
    }

    /// All leaf values below `id`, left to right.
    pub fn leaves(&self, id: NodeId) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_leaves(id, &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, id: NodeId, out: &mut Vec<&'a str>) {
        match &self.nodes[id.0] {
            Node::Leaf(value) => out.push(value),
            Node::Branch { children, .. } => {
                for child in children {
                    self.collect_leaves(*child, out);
                }
            }
        }
    }

    /// Leaves below `id` concatenated without separators (`T1 . A` becomes `T1.A`).
    pub fn text(&self, id: NodeId) -> String {
        self.leaves(id).concat()
    }

    /// First leaf below `id`.
    pub fn first_leaf(&self, id: NodeId) -> Option<NodeId> {
        match &self.nodes[id.0] {
            Node::Leaf(_) => Some(id),
            Node::Branch { children, .. } => children.iter().find_map(|c| self.first_leaf(*c)),
        }
    }

    /// Value of the first leaf below `id`.
    pub fn first_leaf_value(&self, id: NodeId) -> Option<&str> {
        self.first_leaf(id).and_then(|leaf| self.leaf(leaf))
    }

    /// Replace the value of the first leaf below `id`.
    pub fn set_first_leaf(&mut self, id: NodeId, value: impl Into<String>) {
        if let Some(leaf) = self.first_leaf(id) {
            self.nodes[leaf.0] = Node::Leaf(value.into());
        }
    }

    /// Depth-first search below `id` (excluding `id`) for the first branch labelled `label`.
    pub fn find_descendant(&self, id: NodeId, label: &str) -> Option<NodeId> {
        self.children(id).iter().find_map(|child| {
            if self.is(*child, label) {
                Some(*child)
            } else {
                self.find_descendant(*child, label)
            }
        })
    }

    /// Collapse a `TABLE_REFERENCE` of shape `TABLE_NAMES . TABLE_NAMES` into a
    /// single `TABLE_NAMES` whose leaf holds the dotted name.
    ///
    /// The grammar accepts any identifier on both sides of the dot, so schema
    /// qualification is only recognised here, after parsing. Returns whether the
    /// node was merged.
    pub fn merge_schema(&mut self, id: NodeId) -> bool {
        if !self.is(id, TABLE_REFERENCE) {
            return false;
        }

        let children = self.children(id).to_vec();
        if children.len() < 3 {
            return false;
        }
        if !self.is(children[0], TABLE_NAMES) || !self.is(children[2], TABLE_NAMES) {
            return false;
        }

        let merged = format!("{}.{}", self.text(children[0]), self.text(children[2]));
        self.set_first_leaf(children[0], merged);
        if let Node::Branch { children, .. } = &mut self.nodes[id.0] {
            children.drain(1..3);
        }
        true
    }

    /// Render the subtree below `id` in bracketed form: `(LABEL child ...)`.
    pub fn render(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.render_into(id, &mut out);
        out
    }

    fn render_into(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0] {
            Node::Leaf(value) => out.push_str(value),
            Node::Branch { label, children } => {
                out.push('(');
                out.push_str(label);
                for child in children {
                    out.push(' ');
                    self.render_into(*child, out);
                }
                out.push(')');
            }
        }
    }
}

impl fmt::Display for ParseTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root {
            Some(root) => f.write_str(&self.render(root)),
            None => f.write_str("()"),
        }
    }
}
