//! Tree normalization passes.
//!
//! [`normalize`] drives a fixed sequence of passes, each run to a fixed
//! point, that canonicalize an already-sanitized tree: legacy tags are
//! aliased to semantic ones, redundant nesting is flattened, adjacent
//! identical inline elements are merged, empty elements are pruned, break
//! runs are capped, and the root is guaranteed at least one block child.
//! The whole sequence is idempotent: normalizing a normalized tree is a
//! no-op.

use anyhow::Result;

use crate::dom::{DomTree, NodeId, BLOCK_TAGS};

/// Inline tags that carry formatting semantics; candidates for nested
/// collapse and sibling merge.
const INLINE_SEMANTIC_TAGS: &[&str] = &["strong", "em", "u", "del", "code"];

/// Elements that are meaningful while childless and must survive the
/// empty-prune pass.
const KEEP_EMPTY_TAGS: &[&str] = &["br", "img", "hr", "input", "iframe"];

/// Legacy presentational tags and their semantic replacements.
const TAG_ALIASES: &[(&str, &str)] = &[("b", "strong"), ("i", "em"), ("s", "del"), ("strike", "del")];

type Pass = fn(&mut DomTree) -> Result<bool>;

/// Pass order matters: aliasing feeds the merge pass, style lifting feeds
/// the collapse pass, and pruning runs before the root-block guarantee.
const PASSES: &[(&str, Pass)] = &[
    ("alias_tags", alias_tags),
    ("lift_styles", lift_styles),
    ("collapse_nested", collapse_nested),
    ("merge_siblings", merge_siblings),
    ("prune_empty", prune_empty),
    ("collapse_breaks", collapse_breaks),
    ("ensure_root_block", ensure_root_block),
];

/// Run every normalization pass to a fixed point. A failing pass is logged
/// and skipped; the remaining passes still run, so one malformed subtree
/// cannot block canonicalization of the rest.
pub fn normalize(tree: &mut DomTree) {
    for (name, pass) in PASSES {
        loop {
            match pass(tree) {
                Ok(true) => continue,
                Ok(false) => break,
                Err(e) => {
                    tracing::warn!("normalize: pass {name} failed: {e}");
                    break;
                }
            }
        }
    }
}

fn alias_tags(tree: &mut DomTree) -> Result<bool> {
    let mut changed = false;
    let targets: Vec<(NodeId, &str)> = tree
        .descendants(tree.root())
        .filter_map(|id| {
            let tag = tree.tag(id)?;
            let (_, replacement) = TAG_ALIASES.iter().find(|(from, _)| *from == tag)?;
            Some((id, *replacement))
        })
        .collect();
    for (id, replacement) in targets {
        tree.replace_tag(id, replacement);
        changed = true;
    }
    Ok(changed)
}

/// Map an inline style declaration to the semantic tag it imitates.
/// First match wins when a declaration carries several.
fn semantic_for_style(style: &str) -> Option<&'static str> {
    for decl in style.split(';') {
        let mut parts = decl.splitn(2, ':');
        let prop = parts.next().unwrap_or("").trim().to_ascii_lowercase();
        let value = parts.next().unwrap_or("").trim().to_ascii_lowercase();
        match prop.as_str() {
            "font-weight" => {
                let heavy = value == "bold"
                    || value == "bolder"
                    || value.parse::<u32>().map(|w| w >= 600).unwrap_or(false);
                if heavy {
                    return Some("strong");
                }
            }
            "font-style" => {
                if value == "italic" {
                    return Some("em");
                }
            }
            "text-decoration" | "text-decoration-line" => {
                if value.split_whitespace().any(|t| t == "underline") {
                    return Some("u");
                }
                if value.split_whitespace().any(|t| t == "line-through") {
                    return Some("del");
                }
            }
            _ => {}
        }
    }
    None
}

/// `span`/`font` elements whose style imitates a semantic tag become that
/// tag. Without a recognized style, `font` and attribute-less spans are
/// unwrapped; a span carrying other attributes (`class` survives
/// sanitization) is kept and only loses its style declaration.
fn lift_styles(tree: &mut DomTree) -> Result<bool> {
    let mut changed = false;
    let targets: Vec<NodeId> = tree
        .descendants(tree.root())
        .filter(|&id| matches!(tree.tag(id), Some("span") | Some("font")))
        .collect();
    for id in targets {
        if let Some(tag) = tree.attr(id, "style").and_then(semantic_for_style) {
            // replace_tag allocates a fresh node; the style must come off
            // the replacement, not the detached original.
            if let Some(lifted) = tree.replace_tag(id, tag) {
                tree.remove_attr(lifted, "style");
            }
            changed = true;
            continue;
        }
        let keep = tree.tag(id) == Some("span")
            && tree.attrs(id).iter().any(|(name, _)| name != "style");
        if keep {
            if tree.attr(id, "style").is_some() {
                tree.remove_attr(id, "style");
                changed = true;
            }
        } else {
            tree.unwrap_node(id);
            changed = true;
        }
    }
    Ok(changed)
}

/// `<strong><strong>x</strong></strong>` flattens to one level.
fn collapse_nested(tree: &mut DomTree) -> Result<bool> {
    let mut changed = false;
    let targets: Vec<NodeId> = tree
        .descendants(tree.root())
        .filter(|&id| {
            let Some(tag) = tree.tag(id) else {
                return false;
            };
            if !INLINE_SEMANTIC_TAGS.contains(&tag) {
                return false;
            }
            has_ancestor_with_tag(tree, id, tag)
        })
        .collect();
    for id in targets {
        if tree.is_attached(id) {
            tree.unwrap_node(id);
            changed = true;
        }
    }
    Ok(changed)
}

fn has_ancestor_with_tag(tree: &DomTree, id: NodeId, tag: &str) -> bool {
    let mut current = tree.parent(id);
    while let Some(node) = current {
        if tree.tag(node) == Some(tag) {
            return true;
        }
        current = tree.parent(node);
    }
    false
}

/// Whether two adjacent siblings can merge into one element.
fn mergeable(tree: &DomTree, left: NodeId, right: NodeId) -> bool {
    let (Some(lt), Some(rt)) = (tree.tag(left), tree.tag(right)) else {
        return false;
    };
    if lt != rt {
        return false;
    }
    if INLINE_SEMANTIC_TAGS.contains(&lt) {
        return true;
    }
    // Adjacent links merge only when they point at the same place.
    lt == "a" && tree.attr(left, "href") == tree.attr(right, "href")
}

/// Merge adjacent identical inline siblings, and fuse adjacent text nodes.
fn merge_siblings(tree: &mut DomTree) -> Result<bool> {
    let mut changed = false;
    loop {
        let mut merged_this_round = false;
        let parents: Vec<NodeId> = tree
            .descendants(tree.root())
            .filter(|&id| !tree.is_text(id))
            .collect();
        for parent in parents {
            let mut i = 0;
            while i + 1 < tree.children(parent).len() {
                let left = tree.children(parent)[i];
                let right = tree.children(parent)[i + 1];
                if tree.is_text(left) && tree.is_text(right) {
                    let fused = format!(
                        "{}{}",
                        tree.text(left).unwrap_or(""),
                        tree.text(right).unwrap_or("")
                    );
                    tree.set_text(left, &fused);
                    tree.detach(right);
                    merged_this_round = true;
                    continue;
                }
                if mergeable(tree, left, right) {
                    let moved: Vec<NodeId> = tree.children(right).to_vec();
                    for child in moved {
                        tree.append_child(left, child);
                    }
                    tree.detach(right);
                    merged_this_round = true;
                    continue;
                }
                i += 1;
            }
        }
        if merged_this_round {
            changed = true;
        } else {
            break;
        }
    }
    Ok(changed)
}

/// Remove elements with no element children and no non-whitespace text.
/// Void-like elements stay even when childless.
fn prune_empty(tree: &mut DomTree) -> Result<bool> {
    let mut changed = false;
    let targets: Vec<NodeId> = tree
        .descendants(tree.root())
        .filter(|&id| {
            let Some(tag) = tree.tag(id) else {
                return false;
            };
            if KEEP_EMPTY_TAGS.contains(&tag) {
                return false;
            }
            let has_element_child = tree.children(id).iter().any(|&c| tree.is_element(c));
            if has_element_child {
                return false;
            }
            tree.text_content(id).trim().is_empty()
        })
        .collect();
    for id in targets {
        if tree.is_attached(id) {
            tree.detach(id);
            changed = true;
        }
    }
    Ok(changed)
}

/// Runs of three or more consecutive `<br>` siblings cap at two.
fn collapse_breaks(tree: &mut DomTree) -> Result<bool> {
    let mut changed = false;
    let parents: Vec<NodeId> = tree
        .descendants(tree.root())
        .filter(|&id| !tree.is_text(id))
        .collect();
    for parent in parents {
        let mut excess: Vec<NodeId> = Vec::new();
        let mut run = 0usize;
        for &child in tree.children(parent) {
            if tree.tag(child) == Some("br") {
                run += 1;
                if run > 2 {
                    excess.push(child);
                }
            } else {
                run = 0;
            }
        }
        for id in excess {
            tree.detach(id);
            changed = true;
        }
    }
    Ok(changed)
}

/// Every root child ends up a block element. Runs of loose inline content
/// are wrapped in paragraphs (whitespace-only runs are dropped, since the
/// prune pass would delete their wrapper next round), and an otherwise
/// empty document becomes `<p><br></p>` so a caret has somewhere to live.
fn ensure_root_block(tree: &mut DomTree) -> Result<bool> {
    let root = tree.root();
    let mut changed = false;

    loop {
        let children = tree.children(root).to_vec();
        let Some(run_start) = children.iter().position(|&c| !is_root_block(tree, c)) else {
            break;
        };
        let run: Vec<NodeId> = children[run_start..]
            .iter()
            .copied()
            .take_while(|&c| !is_root_block(tree, c))
            .collect();
        let all_blank = run.iter().all(|&c| {
            tree.text(c).map(|t| t.trim().is_empty()).unwrap_or(false)
        });
        if all_blank {
            for node in run {
                tree.detach(node);
            }
        } else {
            let paragraph = tree.create_element("p");
            tree.insert_child(root, run_start, paragraph);
            for node in run {
                tree.append_child(paragraph, node);
            }
        }
        changed = true;
    }

    if tree.children(root).is_empty() {
        let paragraph = tree.create_element("p");
        let br = tree.create_element("br");
        tree.append_child(paragraph, br);
        tree.append_child(root, paragraph);
        changed = true;
    }
    Ok(changed)
}

fn is_root_block(tree: &DomTree, id: NodeId) -> bool {
    tree.tag(id)
        .map(|t| BLOCK_TAGS.contains(&t))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse;

    fn run(html: &str) -> String {
        let mut tree = parse(html).unwrap();
        normalize(&mut tree);
        tree.html()
    }

    #[test]
    fn test_alias_bold_italic() {
        assert_eq!(run("<p><b>x</b> <i>y</i></p>"), "<p><strong>x</strong> <em>y</em></p>");
    }

    #[test]
    fn test_alias_strike_variants_merge() {
        // Both alias to del, then the sibling-merge pass fuses them.
        assert_eq!(run("<p><strike>z</strike><s>w</s></p>"), "<p><del>zw</del></p>");
    }

    #[test]
    fn test_style_lift_bold_weight() {
        assert_eq!(
            run("<p><span style=\"font-weight: 700\">x</span></p>"),
            "<p><strong>x</strong></p>"
        );
        assert_eq!(
            run("<p><span style=\"font-weight: bold\">x</span></p>"),
            "<p><strong>x</strong></p>"
        );
    }

    #[test]
    fn test_style_lift_italic_underline_strike() {
        assert_eq!(
            run("<p><span style=\"font-style: italic\">x</span></p>"),
            "<p><em>x</em></p>"
        );
        assert_eq!(
            run("<p><span style=\"text-decoration: underline\">x</span></p>"),
            "<p><u>x</u></p>"
        );
        assert_eq!(
            run("<p><span style=\"text-decoration-line: line-through\">x</span></p>"),
            "<p><del>x</del></p>"
        );
    }

    #[test]
    fn test_style_lift_sheds_style_attr() {
        // The lifted element must not inherit the style declaration.
        assert_eq!(
            run("<p><span style=\"font-weight: bold\" class=\"x\">x</span></p>"),
            "<p><strong class=\"x\">x</strong></p>"
        );
    }

    #[test]
    fn test_plain_span_unwrapped() {
        assert_eq!(run("<p><span>x</span></p>"), "<p>x</p>");
        assert_eq!(run("<p><span style=\"color: red\">x</span></p>"), "<p>x</p>");
    }

    #[test]
    fn test_span_with_class_kept() {
        assert_eq!(
            run("<p><span class=\"note\">x</span></p>"),
            "<p><span class=\"note\">x</span></p>"
        );
        // An unrecognized style comes off, the span itself stays.
        assert_eq!(
            run("<p><span class=\"note\" style=\"color: red\">x</span></p>"),
            "<p><span class=\"note\">x</span></p>"
        );
    }

    #[test]
    fn test_nested_collapse() {
        assert_eq!(run("<p><strong><strong>x</strong></strong></p>"), "<p><strong>x</strong></p>");
        assert_eq!(
            run("<p><em><strong><em>x</em></strong></em></p>"),
            "<p><em><strong>x</strong></em></p>"
        );
    }

    #[test]
    fn test_sibling_merge() {
        assert_eq!(run("<p><strong>a</strong><strong>b</strong></p>"), "<p><strong>ab</strong></p>");
    }

    #[test]
    fn test_link_merge_requires_same_href() {
        assert_eq!(
            run("<p><a href=\"/x\">a</a><a href=\"/x\">b</a></p>"),
            "<p><a href=\"/x\">ab</a></p>"
        );
        assert_eq!(
            run("<p><a href=\"/x\">a</a><a href=\"/y\">b</a></p>"),
            "<p><a href=\"/x\">a</a><a href=\"/y\">b</a></p>"
        );
    }

    #[test]
    fn test_prune_empty() {
        assert_eq!(run("<p>x</p><p></p><p>   </p>"), "<p>x</p>");
        assert_eq!(run("<p><strong></strong>x</p>"), "<p>x</p>");
    }

    #[test]
    fn test_prune_keeps_void_like() {
        assert_eq!(run("<p>a<br>b</p><p><img src=\"/i.png\"></p>"), "<p>a<br>b</p><p><img src=\"/i.png\"></p>");
    }

    #[test]
    fn test_break_runs_capped() {
        assert_eq!(run("<p>a<br><br><br><br>b</p>"), "<p>a<br><br>b</p>");
        assert_eq!(run("<p>a<br><br>b</p>"), "<p>a<br><br>b</p>");
    }

    #[test]
    fn test_root_block_guarantee() {
        assert_eq!(run(""), "<p><br></p>");
        assert_eq!(run("   "), "<p><br></p>");
        assert_eq!(run("loose text"), "<p>loose text</p>");
        assert_eq!(run("<strong>x</strong>"), "<p><strong>x</strong></p>");
    }

    #[test]
    fn test_empty_paragraph_and_break_run_together() {
        assert_eq!(
            run("<p></p><p>text</p><br><br><br>"),
            "<p>text</p><p><br><br></p>"
        );
    }

    #[test]
    fn test_loose_runs_beside_blocks_wrapped() {
        assert_eq!(run("<p>a</p>loose"), "<p>a</p><p>loose</p>");
        assert_eq!(
            run("before<p>a</p><strong>x</strong> <em>y</em>"),
            "<p>before</p><p>a</p><p><strong>x</strong> <em>y</em></p>"
        );
        // Whitespace between blocks is dropped, not wrapped.
        assert_eq!(run("<p>a</p>\n<p>b</p>"), "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "<p><b>x</b><i>y</i></p>",
            "<p><strong>a</strong><strong>b</strong></p>",
            "<p><span style=\"font-weight:bold\">x</span></p>",
            "loose",
            "",
            "<p>a<br><br><br>b</p>",
            "<p><strike>z</strike><s>w</s></p>",
            "<ul><li>one</li><li></li></ul>",
            "<p><span class=\"n\" style=\"color: red\">x</span></p>",
        ];
        for input in inputs {
            let mut tree = parse(input).unwrap();
            normalize(&mut tree);
            let once = tree.clone();
            normalize(&mut tree);
            assert!(
                tree.structural_eq(&once),
                "normalize not idempotent for {input:?}: {} vs {}",
                once.html(),
                tree.html()
            );
        }
    }
}
