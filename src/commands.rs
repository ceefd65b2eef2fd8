//! Editing command table and executor.
//!
//! Commands are addressed by the classic `execCommand` names ("bold",
//! "formatBlock", "insertHTML", ...) and operate on the tree plus the
//! current selection. Inline formatting wraps each selected text segment
//! independently; the normalizer's sibling-merge pass coalesces the
//! resulting fragments, so the executor never has to reason about
//! cross-element ranges.

use anyhow::{bail, Result};

use crate::dom::{self, DomTree, NodeId, BLOCK_TAGS};
use crate::selection::{self, Caret, DomSelection};

/// Built-in commands, resolved from their `execCommand`-style names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeCommand {
    Bold,
    Italic,
    Underline,
    StrikeThrough,
    FormatBlock,
    InsertHtml,
    InsertText,
    CreateLink,
    InsertImage,
    InsertHorizontalRule,
    InsertUnorderedList,
    InsertOrderedList,
    RemoveFormat,
}

/// Tags `formatBlock` accepts as a payload.
pub const FORMAT_BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre", "div",
];

/// Inline formatting tags `removeFormat` strips.
const FORMAT_TAGS: &[&str] = &["strong", "em", "u", "del", "code"];

impl NativeCommand {
    /// Look up a command by name. Case-sensitive on the canonical camelCase
    /// names, with the common all-lowercase aliases accepted too.
    pub fn resolve(name: &str) -> Option<NativeCommand> {
        Some(match name {
            "bold" => Self::Bold,
            "italic" => Self::Italic,
            "underline" => Self::Underline,
            "strikeThrough" | "strikethrough" => Self::StrikeThrough,
            "formatBlock" | "formatblock" => Self::FormatBlock,
            "insertHTML" | "insertHtml" | "inserthtml" => Self::InsertHtml,
            "insertText" | "inserttext" => Self::InsertText,
            "createLink" | "createlink" => Self::CreateLink,
            "insertImage" | "insertimage" => Self::InsertImage,
            "insertHorizontalRule" | "inserthorizontalrule" => Self::InsertHorizontalRule,
            "insertUnorderedList" | "insertunorderedlist" => Self::InsertUnorderedList,
            "insertOrderedList" | "insertorderedlist" => Self::InsertOrderedList,
            "removeFormat" | "removeformat" => Self::RemoveFormat,
            _ => return None,
        })
    }
}

/// Execute a command against the tree. `selection` may be stale or absent;
/// commands that need a caret fall back to the end of the document.
///
/// Insertion commands return the caret position after the inserted
/// content so the caller can advance the selection; formatting commands
/// return `None` and keep the selection where it was.
pub fn apply(
    tree: &mut DomTree,
    selection: Option<&DomSelection>,
    command: NativeCommand,
    payload: Option<&str>,
) -> Result<Option<Caret>> {
    match command {
        NativeCommand::Bold => wrap_inline(tree, selection, "strong"),
        NativeCommand::Italic => wrap_inline(tree, selection, "em"),
        NativeCommand::Underline => wrap_inline(tree, selection, "u"),
        NativeCommand::StrikeThrough => wrap_inline(tree, selection, "del"),
        NativeCommand::FormatBlock => {
            let Some(tag) = payload else {
                bail!("formatBlock requires a block tag payload");
            };
            format_block(tree, selection, &tag.trim().to_ascii_lowercase())?;
            Ok(None)
        }
        NativeCommand::InsertHtml => {
            let Some(html) = payload else {
                bail!("insertHTML requires an HTML payload");
            };
            insert_html(tree, selection, html)
        }
        NativeCommand::InsertText => {
            let Some(text) = payload else {
                bail!("insertText requires a text payload");
            };
            Ok(Some(insert_text(tree, selection, text)))
        }
        NativeCommand::CreateLink => {
            let Some(url) = payload else {
                bail!("createLink requires a URL payload");
            };
            create_link(tree, selection, url.trim())
        }
        NativeCommand::InsertImage => {
            let Some(src) = payload else {
                bail!("insertImage requires an image URL payload");
            };
            Ok(Some(insert_element(tree, selection, "img", &[("src", src.trim())])))
        }
        NativeCommand::InsertHorizontalRule => {
            Ok(Some(insert_element(tree, selection, "hr", &[])))
        }
        NativeCommand::InsertUnorderedList => {
            make_list(tree, selection, "ul")?;
            Ok(None)
        }
        NativeCommand::InsertOrderedList => {
            make_list(tree, selection, "ol")?;
            Ok(None)
        }
        NativeCommand::RemoveFormat => {
            remove_format(tree, selection);
            Ok(None)
        }
    }
}

// ----------------------------------------------------------------------
// Range resolution
// ----------------------------------------------------------------------

/// Absolute character range of the selection, ordered start <= end.
fn selection_range(tree: &DomTree, selection: Option<&DomSelection>) -> Option<(usize, usize)> {
    let sel = selection?;
    let path = selection::save(tree, sel)?;
    Some((path.absolute_start, path.absolute_end))
}

/// Text nodes with their absolute character spans, in document order.
fn element_text_spans(tree: &DomTree, id: NodeId) -> Vec<(NodeId, usize, usize)> {
    let mut spans = Vec::new();
    let mut cum = 0usize;
    collect_spans(tree, id, &mut cum, &mut spans);
    spans
}

fn collect_spans(
    tree: &DomTree,
    id: NodeId,
    cum: &mut usize,
    spans: &mut Vec<(NodeId, usize, usize)>,
) {
    if let Some(text) = tree.text(id) {
        let len = text.chars().count();
        spans.push((id, *cum, *cum + len));
        *cum += len;
        return;
    }
    for &child in tree.children(id) {
        collect_spans(tree, child, cum, spans);
    }
}

/// Per-text-node local character segments overlapped by an absolute range.
fn text_segments(tree: &DomTree, start: usize, end: usize) -> Vec<(NodeId, usize, usize)> {
    element_text_spans(tree, tree.root())
        .into_iter()
        .filter_map(|(id, node_start, node_end)| {
            let seg_start = start.max(node_start);
            let seg_end = end.min(node_end);
            (seg_start < seg_end).then_some((id, seg_start - node_start, seg_end - node_start))
        })
        .collect()
}

fn has_ancestor_tag(tree: &DomTree, id: NodeId, tag: &str) -> bool {
    let mut current = tree.parent(id);
    while let Some(node) = current {
        if tree.tag(node) == Some(tag) {
            return true;
        }
        current = tree.parent(node);
    }
    false
}

/// A usable caret for insertion: the selection focus when it is attached,
/// otherwise the end of the document.
fn effective_caret(tree: &DomTree, selection: Option<&DomSelection>) -> Caret {
    if let Some(sel) = selection {
        if tree.is_attached(sel.focus.node) {
            return sel.focus;
        }
    }
    selection::cursor_to_end(tree).focus
}

/// Byte offset of the `char_offset`-th character.
fn byte_offset(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Split a text node at a character offset. Afterwards the node holds the
/// left half and a fresh sibling holds the right half. No-op splits (at
/// either end) leave the node alone.
fn split_text(tree: &mut DomTree, id: NodeId, char_offset: usize) {
    let Some(text) = tree.text(id) else {
        return;
    };
    if char_offset == 0 || char_offset >= text.chars().count() {
        return;
    }
    let split = byte_offset(text, char_offset);
    let (left, right) = (text[..split].to_string(), text[split..].to_string());
    let Some(parent) = tree.parent(id) else {
        return;
    };
    let Some(index) = tree.index_in_parent(id) else {
        return;
    };
    tree.set_text(id, &left);
    let right_node = tree.create_text(&right);
    tree.insert_child(parent, index + 1, right_node);
}

/// Resolve a caret to a (parent, child-index) insertion slot, splitting a
/// text node when the caret falls inside one.
fn insertion_point(tree: &mut DomTree, caret: Caret) -> (NodeId, usize) {
    if tree.is_text(caret.node) {
        let parent = match tree.parent(caret.node) {
            Some(p) => p,
            None => return (tree.root(), tree.children(tree.root()).len()),
        };
        let index = tree.index_in_parent(caret.node).unwrap_or(0);
        let len = tree.node_len(caret.node);
        if caret.offset == 0 {
            return (parent, index);
        }
        if caret.offset >= len {
            return (parent, index + 1);
        }
        split_text(tree, caret.node, caret.offset);
        return (parent, index + 1);
    }
    let index = caret.offset.min(tree.children(caret.node).len());
    (caret.node, index)
}

// ----------------------------------------------------------------------
// Inline formatting
// ----------------------------------------------------------------------

/// Wrap every selected text segment in `tag`, skipping segments already
/// inside such an element. Apply-only: no toggle. A collapsed selection is
/// a no-op.
fn wrap_inline(
    tree: &mut DomTree,
    selection: Option<&DomSelection>,
    tag: &str,
) -> Result<Option<Caret>> {
    let Some((start, end)) = selection_range(tree, selection) else {
        return Ok(None);
    };
    if start == end {
        return Ok(None);
    }
    let segments: Vec<(NodeId, usize, usize)> = text_segments(tree, start, end)
        .into_iter()
        .filter(|&(id, _, _)| !has_ancestor_tag(tree, id, tag))
        .collect();
    for (id, seg_start, seg_end) in segments {
        wrap_text_range(tree, id, seg_start, seg_end, tag, &[]);
    }
    Ok(None)
}

/// Wrap the `[seg_start, seg_end)` character range of a text node in a new
/// element with the given attributes. Surrounding text stays in place as
/// sibling text nodes.
fn wrap_text_range(
    tree: &mut DomTree,
    id: NodeId,
    seg_start: usize,
    seg_end: usize,
    tag: &str,
    attrs: &[(&str, &str)],
) {
    let Some(text) = tree.text(id) else {
        return;
    };
    let Some(parent) = tree.parent(id) else {
        return;
    };
    let Some(index) = tree.index_in_parent(id) else {
        return;
    };
    let start_byte = byte_offset(text, seg_start);
    let end_byte = byte_offset(text, seg_end);
    let left = text[..start_byte].to_string();
    let middle = text[start_byte..end_byte].to_string();
    let right = text[end_byte..].to_string();
    if middle.is_empty() {
        return;
    }

    let wrapper = tree.create_element(tag);
    for (name, value) in attrs {
        tree.set_attr(wrapper, name, value);
    }
    let middle_node = tree.create_text(&middle);
    tree.append_child(wrapper, middle_node);

    let mut at = index;
    tree.detach(id);
    if !left.is_empty() {
        tree.set_text(id, &left);
        tree.insert_child(parent, at, id);
        at += 1;
    }
    tree.insert_child(parent, at, wrapper);
    at += 1;
    if !right.is_empty() {
        let right_node = tree.create_text(&right);
        tree.insert_child(parent, at, right_node);
    }
}

/// Unwrap every formatting element whose entire text lies inside the
/// selection. Runs to a fixed point to peel nested formatting.
fn remove_format(tree: &mut DomTree, selection: Option<&DomSelection>) {
    let Some((start, end)) = selection_range(tree, selection) else {
        return;
    };
    if start == end {
        return;
    }
    loop {
        let spans = element_text_spans(tree, tree.root());
        let target = tree.descendants(tree.root()).find(|&id| {
            let Some(tag) = tree.tag(id) else {
                return false;
            };
            if !FORMAT_TAGS.contains(&tag) {
                return false;
            }
            let inner: Vec<&(NodeId, usize, usize)> = spans
                .iter()
                .filter(|(text_id, _, _)| is_descendant_of(tree, *text_id, id))
                .collect();
            // Empty wrappers are the prune pass's business.
            !inner.is_empty() && inner.iter().all(|(_, s, e)| start <= *s && *e <= end)
        });
        match target {
            Some(id) => {
                tree.unwrap_node(id);
            }
            None => break,
        }
    }
}

fn is_descendant_of(tree: &DomTree, id: NodeId, ancestor: NodeId) -> bool {
    let mut current = tree.parent(id);
    while let Some(node) = current {
        if node == ancestor {
            return true;
        }
        current = tree.parent(node);
    }
    false
}

// ----------------------------------------------------------------------
// Block formatting
// ----------------------------------------------------------------------

/// The ancestor of `id` that is a direct child of the root.
fn top_level_ancestor(tree: &DomTree, id: NodeId) -> Option<NodeId> {
    let mut current = id;
    loop {
        let parent = tree.parent(current)?;
        if parent == tree.root() {
            return Some(current);
        }
        current = parent;
    }
}

/// Top-level blocks touched by the selection, in document order. Falls
/// back to the block under the effective caret.
fn selected_top_level_blocks(tree: &DomTree, selection: Option<&DomSelection>) -> Vec<NodeId> {
    let mut blocks = Vec::new();
    let mut push = |id: NodeId| {
        if !blocks.contains(&id) {
            blocks.push(id);
        }
    };
    match selection_range(tree, selection) {
        Some((start, end)) if start < end => {
            for (id, _, _) in text_segments(tree, start, end) {
                if let Some(block) = top_level_ancestor(tree, id) {
                    push(block);
                }
            }
        }
        _ => {
            let caret = effective_caret(tree, selection);
            if let Some(block) = top_level_ancestor(tree, caret.node) {
                push(block);
            } else if tree.children(tree.root()).len() == 1 {
                push(tree.children(tree.root())[0]);
            }
        }
    }
    blocks
}

/// Retag the selected top-level blocks. Loose top-level text is wrapped in
/// a fresh block instead.
fn format_block(tree: &mut DomTree, selection: Option<&DomSelection>, tag: &str) -> Result<()> {
    if !FORMAT_BLOCK_TAGS.contains(&tag) {
        bail!("formatBlock: unsupported block tag {tag:?}");
    }
    for block in selected_top_level_blocks(tree, selection) {
        if tree.is_text(block) {
            let index = tree.index_in_parent(block).unwrap_or(0);
            let wrapper = tree.create_element(tag);
            let root = tree.root();
            tree.insert_child(root, index, wrapper);
            tree.append_child(wrapper, block);
        } else {
            tree.replace_tag(block, tag);
        }
    }
    Ok(())
}

/// Convert the selected top-level blocks into a single list. Each block
/// becomes one `<li>`; the list takes the first block's position.
fn make_list(tree: &mut DomTree, selection: Option<&DomSelection>, list_tag: &str) -> Result<()> {
    let blocks = selected_top_level_blocks(tree, selection);
    if blocks.is_empty() {
        return Ok(());
    }
    let Some(first_index) = blocks
        .first()
        .and_then(|&b| tree.index_in_parent(b))
    else {
        return Ok(());
    };

    let list = tree.create_element(list_tag);
    for block in blocks {
        let item = tree.create_element("li");
        if tree.is_text(block) || tree.tag(block).map(|t| !BLOCK_TAGS.contains(&t)).unwrap_or(false)
        {
            tree.append_child(item, block);
        } else {
            let children: Vec<NodeId> = tree.children(block).to_vec();
            for child in children {
                tree.append_child(item, child);
            }
            tree.detach(block);
        }
        tree.append_child(list, item);
    }
    let root = tree.root();
    tree.insert_child(root, first_index, list);
    Ok(())
}

// ----------------------------------------------------------------------
// Insertion
// ----------------------------------------------------------------------

/// Parse and splice an HTML fragment at the caret. The fragment is inserted
/// as-is; the sanitize/normalize stages of the commit pipeline clean it.
/// Returns a caret after the last inserted node.
fn insert_html(
    tree: &mut DomTree,
    selection: Option<&DomSelection>,
    html: &str,
) -> Result<Option<Caret>> {
    let fragment = dom::parse(html)?;
    let caret = effective_caret(tree, selection);
    let (parent, mut index) = insertion_point(tree, caret);
    for &child in &fragment.children(fragment.root()).to_vec() {
        if let Some(copied) = tree.import_subtree(&fragment, child) {
            tree.insert_child(parent, index, copied);
            index += 1;
        }
    }
    Ok(Some(Caret {
        node: parent,
        offset: index,
    }))
}

/// Splice a literal text run at the caret. Inserting into the middle of a
/// text node extends that node directly. Returns a caret after the run.
fn insert_text(tree: &mut DomTree, selection: Option<&DomSelection>, text: &str) -> Caret {
    let caret = effective_caret(tree, selection);
    if let Some(existing) = tree.text(caret.node) {
        let at = byte_offset(existing, caret.offset);
        let mut combined = String::with_capacity(existing.len() + text.len());
        combined.push_str(&existing[..at]);
        combined.push_str(text);
        combined.push_str(&existing[at..]);
        tree.set_text(caret.node, &combined);
        return Caret {
            node: caret.node,
            offset: caret.offset + text.chars().count(),
        };
    }
    let (parent, index) = insertion_point(tree, caret);
    let node = tree.create_text(text);
    tree.insert_child(parent, index, node);
    Caret {
        node,
        offset: text.chars().count(),
    }
}

fn insert_element(
    tree: &mut DomTree,
    selection: Option<&DomSelection>,
    tag: &str,
    attrs: &[(&str, &str)],
) -> Caret {
    let caret = effective_caret(tree, selection);
    let (parent, index) = insertion_point(tree, caret);
    let node = tree.create_element(tag);
    for (name, value) in attrs {
        tree.set_attr(node, name, value);
    }
    tree.insert_child(parent, index, node);
    Caret {
        node: parent,
        offset: index + 1,
    }
}

/// Wrap the selection in a link, or insert a link whose text is the URL
/// when the selection is collapsed. Unsafe URL schemes are rejected.
fn create_link(
    tree: &mut DomTree,
    selection: Option<&DomSelection>,
    url: &str,
) -> Result<Option<Caret>> {
    if url.is_empty() {
        bail!("createLink: empty URL");
    }
    let lowered: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    if let Some(colon) = lowered.find(':') {
        let scheme = &lowered[..colon];
        if !scheme.contains('/')
            && !scheme.contains('#')
            && !matches!(scheme, "http" | "https" | "mailto")
        {
            bail!("createLink: unsupported URL scheme in {url:?}");
        }
    }

    match selection_range(tree, selection) {
        Some((start, end)) if start < end => {
            let segments = text_segments(tree, start, end);
            for (id, seg_start, seg_end) in segments {
                wrap_text_range(tree, id, seg_start, seg_end, "a", &[("href", url)]);
            }
            Ok(None)
        }
        _ => {
            let caret = effective_caret(tree, selection);
            let (parent, index) = insertion_point(tree, caret);
            let anchor = tree.create_element("a");
            tree.set_attr(anchor, "href", url);
            let label = tree.create_text(url);
            tree.append_child(anchor, label);
            tree.insert_child(parent, index, anchor);
            Ok(Some(Caret {
                node: parent,
                offset: index + 1,
            }))
        }
    }
}
