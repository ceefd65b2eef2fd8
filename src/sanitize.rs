//! Two-policy HTML sanitizer.
//!
//! [`Policy::Quick`] is the lightweight allow-list cleanup applied after
//! every edit; [`Policy::Full`] is the strict variant applied at content
//! import/export boundaries. Both fail closed: input that does not parse
//! as markup sanitizes to the empty string, so unsanitized content never
//! reaches the document tree.

use crate::dom::{self, DomTree, NodeId};

/// Sanitization strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Authoring allow-list; applied mid-editing after every command.
    Quick,
    /// Authoring allow-list plus trusted-host iframes, `rel` hardening on
    /// `target="_blank"` anchors, and inter-tag whitespace collapsing.
    Full,
}

/// Tags a user can author. Everything else is unwrapped (text preserved)
/// or, if dangerous, removed with its content.
const ALLOWED_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "strong", "em", "u", "del", "s", "strike", "b", "i",
    "a", "ul", "ol", "li", "blockquote", "code", "pre", "img", "br", "hr", "div", "span",
];

/// Tags whose content must not leak into user text; removed entirely under
/// both policies.
const DANGEROUS_TAGS: &[&str] = &[
    "script", "style", "object", "embed", "form", "input", "button",
];

const GLOBAL_ATTRS: &[&str] = &["class", "style", "title"];
const ANCHOR_ATTRS: &[&str] = &["href", "target", "rel"];
const IMG_ATTRS: &[&str] = &["src", "alt", "width", "height"];
const IFRAME_ATTRS: &[&str] = &[
    "src",
    "width",
    "height",
    "frameborder",
    "allow",
    "allowfullscreen",
];

/// The single embed host the Full policy tolerates for iframes.
pub const TRUSTED_EMBED_PREFIX: &str = "https://www.youtube.com/embed/";

/// Sanitize an HTML string under the given policy. Never panics; returns
/// `""` when the input is not parseable as markup.
pub fn sanitize(html: &str, policy: Policy) -> String {
    sanitize_opts(html, policy, true)
}

/// Sanitize with embeds optionally disabled even under [`Policy::Full`]
/// (backs the engine's `allow_embeds` config toggle).
pub(crate) fn sanitize_opts(html: &str, policy: Policy, allow_embeds: bool) -> String {
    let mut tree = match dom::parse(html) {
        Ok(tree) => tree,
        Err(e) => {
            tracing::warn!("sanitize: dropping unparseable input: {e}");
            return String::new();
        }
    };
    let root = tree.root();
    clean_children(&mut tree, root, policy, allow_embeds);
    if policy == Policy::Full {
        augment_rel(&mut tree);
        collapse_inter_tag_whitespace(&mut tree);
    }
    tree.html()
}

fn clean_children(tree: &mut DomTree, id: NodeId, policy: Policy, allow_embeds: bool) {
    let mut i = 0;
    while i < tree.children(id).len() {
        let child = tree.children(id)[i];
        if tree.is_text(child) {
            i += 1;
            continue;
        }
        let tag = tree.tag(child).unwrap_or("").to_string();

        if DANGEROUS_TAGS.contains(&tag.as_str()) {
            tree.detach(child);
            continue;
        }

        if tag == "iframe" {
            let trusted = policy == Policy::Full
                && allow_embeds
                && tree
                    .attr(child, "src")
                    .map(|src| src.starts_with(TRUSTED_EMBED_PREFIX))
                    .unwrap_or(false);
            if trusted {
                filter_attrs(tree, child, &tag);
                i += 1;
            } else {
                tree.detach(child);
            }
            continue;
        }

        if !ALLOWED_TAGS.contains(&tag.as_str()) {
            // Unwrap semantics: the tag goes, its content stays. The
            // spliced children are re-examined at the same index.
            tree.unwrap_node(child);
            continue;
        }

        filter_attrs(tree, child, &tag);
        clean_children(tree, child, policy, allow_embeds);
        i += 1;
    }
}

fn filter_attrs(tree: &mut DomTree, id: NodeId, tag: &str) {
    let attrs: Vec<(String, String)> = tree.attrs(id).to_vec();
    for (name, value) in attrs {
        if !attr_allowed(tag, &name) || !attr_value_safe(tag, &name, &value) {
            tree.remove_attr(id, &name);
        }
    }
}

fn attr_allowed(tag: &str, name: &str) -> bool {
    if name.starts_with("on") {
        return false;
    }
    if GLOBAL_ATTRS.contains(&name) {
        return true;
    }
    let extra: &[&str] = match tag {
        "a" => ANCHOR_ATTRS,
        "img" => IMG_ATTRS,
        "iframe" => IFRAME_ATTRS,
        _ => &[],
    };
    extra.contains(&name)
}

/// URL attributes must carry an innocuous scheme. Whitespace and control
/// characters are stripped before the check so `java\nscript:` does not
/// slip through.
fn attr_value_safe(tag: &str, name: &str, value: &str) -> bool {
    if name != "href" && name != "src" {
        return true;
    }
    let cleaned: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    let scheme_end = match cleaned.find(':') {
        None => return true, // relative URL or fragment
        Some(pos) => pos,
    };
    if cleaned[..scheme_end].contains('/') || cleaned[..scheme_end].contains('#') {
        return true; // ':' belongs to the path, not a scheme
    }
    cleaned.starts_with("http:")
        || cleaned.starts_with("https:")
        || cleaned.starts_with("mailto:")
        || (tag == "img" && name == "src" && cleaned.starts_with("data:image/"))
}

/// Every anchor opening a new tab gets `rel="noopener noreferrer"`.
/// Idempotent: existing tokens are kept, missing ones appended once.
fn augment_rel(tree: &mut DomTree) {
    let anchors: Vec<NodeId> = tree
        .descendants(tree.root())
        .filter(|&id| {
            tree.tag(id) == Some("a")
                && tree
                    .attr(id, "target")
                    .map(|t| t.eq_ignore_ascii_case("_blank"))
                    .unwrap_or(false)
        })
        .collect();
    for anchor in anchors {
        let existing = tree.attr(anchor, "rel").unwrap_or("").to_string();
        let mut tokens: Vec<&str> = existing.split_whitespace().collect();
        for required in ["noopener", "noreferrer"] {
            if !tokens.contains(&required) {
                tokens.push(required);
            }
        }
        tree.set_attr(anchor, "rel", &tokens.join(" "));
    }
}

/// Whitespace-only text nodes between tags collapse to a single space,
/// except inside `pre`/`code` where whitespace is content.
fn collapse_inter_tag_whitespace(tree: &mut DomTree) {
    let targets: Vec<NodeId> = tree
        .text_nodes(tree.root())
        .into_iter()
        .filter(|&id| {
            let all_ws = tree
                .text(id)
                .map(|t| !t.is_empty() && t.chars().all(char::is_whitespace))
                .unwrap_or(false);
            all_ws && !in_preformatted(tree, id)
        })
        .collect();
    for id in targets {
        tree.set_text(id, " ");
    }
}

fn in_preformatted(tree: &DomTree, id: NodeId) -> bool {
    let mut current = tree.parent(id);
    while let Some(node) = current {
        if matches!(tree.tag(node), Some("pre") | Some("code")) {
            return true;
        }
        current = tree.parent(node);
    }
    false
}
