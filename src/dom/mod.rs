//! Document tree model - the mutable editable surface.
//!
//! Nodes live in an arena (`Vec<Node>`) and are addressed by [`NodeId`]
//! indices. The tree structure is encoded via a parent link plus an ordered
//! `children` vector on each node, so selection paths (child-index walks)
//! and sibling splicing are cheap.
//!
//! Detached nodes keep their arena slot but are unreachable from the root;
//! slots are never reused, so a stale `NodeId` can be detected by walking
//! its parent chain ([`DomTree::is_attached`]).

mod parser;
mod serializer;

pub use parser::parse;
pub use serializer::{escape_attr, escape_text};

/// A handle into the arena that uniquely identifies a node.
pub type NodeId = usize;

/// Tags that render without a closing tag and may legitimately be empty.
pub const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Block-level tags the engine treats as top-level containers.
pub const BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "blockquote", "pre", "div", "hr",
];

/// The payload that distinguishes different kinds of nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// The synthetic tree root. Serializes as its children only.
    Document,
    Element {
        /// Lowercase tag name.
        tag: String,
        /// Attributes in source order.
        attrs: Vec<(String, String)>,
    },
    Text {
        text: String,
    },
}

/// A single node in the document tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Arena-backed document tree.
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create an empty tree containing only the document root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
            root: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text {
            text: text.to_string(),
        })
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Deep-copy a subtree from another tree into this arena.
    ///
    /// Returns the id of the copied root. The copy is detached; attach it
    /// with [`DomTree::append_child`] or [`DomTree::insert_child`].
    pub fn import_subtree(&mut self, other: &DomTree, other_id: NodeId) -> Option<NodeId> {
        let node = other.get(other_id)?;
        let copy = self.alloc(node.data.clone());
        for &child in &other.get(other_id)?.children.clone() {
            if let Some(child_copy) = self.import_subtree(other, child) {
                self.append_child(copy, child_copy);
            }
        }
        Some(copy)
    }

    // ------------------------------------------------------------------
    // Structure mutation
    // ------------------------------------------------------------------

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let len = match self.get(parent) {
            Some(node) => node.children.len(),
            None => return,
        };
        self.insert_child(parent, len, child);
    }

    /// Insert `child` at `index` within `parent`'s children (clamped).
    /// Refused when it would create a cycle, i.e. when `parent` is `child`
    /// itself or lives inside `child`'s subtree.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if parent == child || self.get(parent).is_none() || self.get(child).is_none() {
            return;
        }
        let mut ancestor = self.get(parent).and_then(|n| n.parent);
        while let Some(node) = ancestor {
            if node == child {
                return;
            }
            ancestor = self.get(node).and_then(|n| n.parent);
        }
        self.detach(child);
        let index = index.min(self.nodes[parent].children.len());
        self.nodes[parent].children.insert(index, child);
        self.nodes[child].parent = Some(parent);
    }

    /// Remove `id` from its parent's child list. The node keeps its own
    /// children and can be re-attached elsewhere.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.get(id).and_then(|n| n.parent) else {
            return;
        };
        self.nodes[parent].children.retain(|&c| c != id);
        self.nodes[id].parent = None;
    }

    /// Replace `id` with its own children, spliced in at its position.
    /// The emptied node is detached. Returns false if `id` has no parent.
    pub fn unwrap_node(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.get(id).and_then(|n| n.parent) else {
            return false;
        };
        let Some(index) = self.index_in_parent(id) else {
            return false;
        };
        let children = std::mem::take(&mut self.nodes[id].children);
        self.nodes[parent].children.remove(index);
        self.nodes[id].parent = None;
        for (i, &child) in children.iter().enumerate() {
            self.nodes[parent].children.insert(index + i, child);
            self.nodes[child].parent = Some(parent);
        }
        true
    }

    /// Replace an element with a fresh node carrying `new_tag`, moving the
    /// old node's attributes and children over. The old node is discarded
    /// from the tree. Returns the replacement id.
    pub fn replace_tag(&mut self, id: NodeId, new_tag: &str) -> Option<NodeId> {
        let NodeData::Element { attrs, .. } = &self.get(id)?.data else {
            return None;
        };
        let attrs = attrs.clone();
        let replacement = self.alloc(NodeData::Element {
            tag: new_tag.to_ascii_lowercase(),
            attrs,
        });

        let children = std::mem::take(&mut self.nodes[id].children);
        for &child in &children {
            self.nodes[child].parent = Some(replacement);
        }
        self.nodes[replacement].children = children;

        if let Some(parent) = self.nodes[id].parent {
            if let Some(index) = self.index_in_parent(id) {
                self.nodes[parent].children[index] = replacement;
                self.nodes[replacement].parent = Some(parent);
            }
            self.nodes[id].parent = None;
        }
        Some(replacement)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Position of `id` within its parent's child list.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.get(id)?.parent?;
        self.nodes[parent].children.iter().position(|&c| c == id)
    }

    /// Lowercase tag name, or `None` for text/root nodes.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.get(id)?.data {
            NodeData::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.get(id).map(|n| &n.data), Some(NodeData::Element { .. }))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.get(id).map(|n| &n.data), Some(NodeData::Text { .. }))
    }

    /// Text of a text node, or `None` for elements/root.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.get(id)?.data {
            NodeData::Text { text } => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, new_text: &str) {
        if let Some(NodeData::Text { text }) = self.get_mut(id).map(|n| &mut n.data) {
            *text = new_text.to_string();
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.get(id)?.data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        if let Some(NodeData::Element { attrs, .. }) = self.get_mut(id).map(|n| &mut n.data) {
            if let Some(entry) = attrs.iter_mut().find(|(n, _)| *n == name) {
                entry.1 = value.to_string();
            } else {
                attrs.push((name, value.to_string()));
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(NodeData::Element { attrs, .. }) = self.get_mut(id).map(|n| &mut n.data) {
            attrs.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        }
    }

    pub fn attrs(&self, id: NodeId) -> &[(String, String)] {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Element { attrs, .. }) => attrs.as_slice(),
            _ => &[],
        }
    }

    /// Whether `id` is reachable from the root via parent links.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.get(current).and_then(|n| n.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// Pre-order (depth-first, document order) traversal of the subtree
    /// rooted at `id`, including `id` itself.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: if self.get(id).is_some() { vec![id] } else { vec![] },
        }
    }

    /// All text nodes under `id` in document order.
    pub fn text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id).filter(|&n| self.is_text(n)).collect()
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(text) = self.text(node) {
                out.push_str(text);
            }
        }
        out
    }

    /// Total character count of all text under the root.
    pub fn total_text_len(&self) -> usize {
        self.text_content(self.root).chars().count()
    }

    /// Character length of a text node, or child count of an element.
    /// Used to clamp restored selection offsets.
    pub fn node_len(&self, id: NodeId) -> usize {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Text { text }) => text.chars().count(),
            Some(_) => self.children(id).len(),
            None => 0,
        }
    }

    /// Serialize the subtree at `id` to HTML. The document root renders as
    /// its children only.
    pub fn to_html(&self, id: NodeId) -> String {
        serializer::serialize(self, id)
    }

    /// Serialize the whole document.
    pub fn html(&self) -> String {
        self.to_html(self.root)
    }

    /// Structural equality from the roots down, ignoring arena layout and
    /// detached garbage.
    pub fn structural_eq(&self, other: &DomTree) -> bool {
        self.subtree_eq(self.root, other, other.root)
    }

    fn subtree_eq(&self, a: NodeId, other: &DomTree, b: NodeId) -> bool {
        let (Some(na), Some(nb)) = (self.get(a), other.get(b)) else {
            return false;
        };
        if na.data != nb.data || na.children.len() != nb.children.len() {
            return false;
        }
        na.children
            .iter()
            .zip(nb.children.iter())
            .all(|(&ca, &cb)| self.subtree_eq(ca, other, cb))
    }
}

/// Pre-order traversal iterator. See [`DomTree::descendants`].
pub struct Descendants<'a> {
    tree: &'a DomTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        if let Some(node) = self.tree.get(id) {
            for &child in node.children.iter().rev() {
                self.stack.push(child);
            }
        }
        Some(id)
    }
}
