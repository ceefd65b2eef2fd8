//! Selection model and persistence codec.
//!
//! A live selection is a pair of [`Caret`]s pointing into the tree arena.
//! Arena ids do not survive re-parsing, so selections cross the history
//! boundary as a [`SelectionPath`]: a serializable record carrying two
//! independent coordinate systems (child-index paths and absolute character
//! offsets). Restoration tries the precise path first and falls back to the
//! absolute offsets when the tree shape has drifted.

use serde::{Deserialize, Serialize};

use crate::dom::{DomTree, NodeId};

/// One endpoint of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caret {
    pub node: NodeId,
    /// Character offset in a text node, child index in an element.
    pub offset: usize,
}

/// A live selection: anchor is where it started, focus is where it ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomSelection {
    pub anchor: Caret,
    pub focus: Caret,
}

impl DomSelection {
    pub fn new(anchor: Caret, focus: Caret) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(caret: Caret) -> Self {
        Self {
            anchor: caret,
            focus: caret,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// Tree-independent snapshot of a selection.
///
/// `*_container_path` is the child-index walk from the root to the caret
/// node; `absolute_*` is the caret's offset into the document's
/// concatenated text. Start is always at or before end in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPath {
    pub start_container_path: Vec<usize>,
    pub start_offset: usize,
    pub end_container_path: Vec<usize>,
    pub end_offset: usize,
    pub absolute_start: usize,
    pub absolute_end: usize,
}

/// Encode a live selection. Returns `None` when either endpoint is
/// detached from the tree.
pub fn save(tree: &DomTree, selection: &DomSelection) -> Option<SelectionPath> {
    if !tree.is_attached(selection.anchor.node) || !tree.is_attached(selection.focus.node) {
        return None;
    }
    let anchor_abs = absolute_of(tree, &selection.anchor)?;
    let focus_abs = absolute_of(tree, &selection.focus)?;

    let (start, start_abs, end, end_abs) = if anchor_abs <= focus_abs {
        (&selection.anchor, anchor_abs, &selection.focus, focus_abs)
    } else {
        (&selection.focus, focus_abs, &selection.anchor, anchor_abs)
    };

    Some(SelectionPath {
        start_container_path: path_to(tree, start.node)?,
        start_offset: start.offset,
        end_container_path: path_to(tree, end.node)?,
        end_offset: end.offset,
        absolute_start: start_abs,
        absolute_end: end_abs,
    })
}

/// Tier-1 restore: walk the saved child-index paths. Returns `None` when a
/// path step no longer exists; offsets are clamped to the landed node.
pub fn restore_by_path(tree: &DomTree, path: &SelectionPath) -> Option<DomSelection> {
    let start_node = resolve_path(tree, &path.start_container_path)?;
    let end_node = resolve_path(tree, &path.end_container_path)?;
    let start = Caret {
        node: start_node,
        offset: path.start_offset.min(tree.node_len(start_node)),
    };
    let end = Caret {
        node: end_node,
        offset: path.end_offset.min(tree.node_len(end_node)),
    };
    Some(DomSelection::new(start, end))
}

/// Tier-2 restore: land on absolute character offsets. An offset past the
/// end of the document clamps to the last text node's end. Returns `None`
/// for a tree with no text at all.
pub fn restore_by_absolute_offset(tree: &DomTree, path: &SelectionPath) -> Option<DomSelection> {
    let start = locate_absolute(tree, path.absolute_start)?;
    let end = locate_absolute(tree, path.absolute_end)?;
    Some(DomSelection::new(start, end))
}

/// Tier-3 restore: collapsed caret after the last text in the document.
/// With no text, the caret lands inside the deepest trailing container,
/// before a trailing placeholder `<br>` when one is present.
pub fn cursor_to_end(tree: &DomTree) -> DomSelection {
    let texts = tree.text_nodes(tree.root());
    if let Some(&last) = texts.last() {
        return DomSelection::collapsed(Caret {
            node: last,
            offset: tree.node_len(last),
        });
    }
    let node = descend(tree, false);
    let mut offset = tree.children(node).len();
    if offset > 0 && tree.tag(tree.children(node)[offset - 1]) == Some("br") {
        offset -= 1;
    }
    DomSelection::collapsed(Caret { node, offset })
}

/// Collapsed caret before the first text in the document, or inside the
/// deepest leading container when the document has no text.
pub fn cursor_to_start(tree: &DomTree) -> DomSelection {
    let texts = tree.text_nodes(tree.root());
    if let Some(&first) = texts.first() {
        return DomSelection::collapsed(Caret {
            node: first,
            offset: 0,
        });
    }
    DomSelection::collapsed(Caret {
        node: descend(tree, true),
        offset: 0,
    })
}

/// Deepest first/last element child that can host content.
fn descend(tree: &DomTree, first: bool) -> NodeId {
    let mut node = tree.root();
    loop {
        let children = tree.children(node);
        let next = if first { children.first() } else { children.last() };
        match next {
            Some(&child)
                if tree.is_element(child)
                    && !crate::dom::VOID_TAGS
                        .contains(&tree.tag(child).unwrap_or("")) =>
            {
                node = child;
            }
            _ => return node,
        }
    }
}

/// Child-index walk from the root down to `id`.
fn path_to(tree: &DomTree, id: NodeId) -> Option<Vec<usize>> {
    let mut path = Vec::new();
    let mut current = id;
    while current != tree.root() {
        path.push(tree.index_in_parent(current)?);
        current = tree.parent(current)?;
    }
    path.reverse();
    Some(path)
}

fn resolve_path(tree: &DomTree, path: &[usize]) -> Option<NodeId> {
    let mut current = tree.root();
    for &index in path {
        current = tree.children(current).get(index).copied()?;
    }
    Some(current)
}

/// Absolute character offset of a caret: all document text strictly before
/// the caret position. For an element caret, that is every text node before
/// the element plus the text inside its first `offset` children.
fn absolute_of(tree: &DomTree, caret: &Caret) -> Option<usize> {
    if tree.is_text(caret.node) {
        let mut total = 0usize;
        for id in tree.text_nodes(tree.root()) {
            if id == caret.node {
                return Some(total + caret.offset.min(tree.node_len(id)));
            }
            total += tree.node_len(id);
        }
        return None;
    }

    let mut total = 0usize;
    let mut found = false;
    count_before(tree, tree.root(), caret, &mut total, &mut found);
    found.then_some(total)
}

fn count_before(tree: &DomTree, id: NodeId, caret: &Caret, total: &mut usize, found: &mut bool) {
    if *found {
        return;
    }
    if id == caret.node {
        for &child in tree
            .children(id)
            .iter()
            .take(caret.offset.min(tree.children(id).len()))
        {
            *total += tree.text_content(child).chars().count();
        }
        *found = true;
        return;
    }
    if let Some(text) = tree.text(id) {
        *total += text.chars().count();
        return;
    }
    for &child in tree.children(id) {
        count_before(tree, child, caret, total, found);
        if *found {
            return;
        }
    }
}

/// Find the text-node caret at absolute character offset `abs`.
fn locate_absolute(tree: &DomTree, abs: usize) -> Option<Caret> {
    let texts = tree.text_nodes(tree.root());
    let mut remaining = abs;
    for &id in &texts {
        let len = tree.node_len(id);
        if remaining <= len {
            return Some(Caret {
                node: id,
                offset: remaining,
            });
        }
        remaining -= len;
    }
    // Past the end of the document: clamp to the last text node.
    texts.last().map(|&id| Caret {
        node: id,
        offset: tree.node_len(id),
    })
}
