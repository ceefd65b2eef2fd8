//! HTML serialization with escaping.

use super::{DomTree, NodeData, NodeId, VOID_TAGS};

/// Escape text-node content.
pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a double-quoted attribute value.
pub fn escape_attr(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

pub(super) fn serialize(tree: &DomTree, id: NodeId) -> String {
    let mut out = String::new();
    write_node(tree, id, &mut out);
    out
}

fn write_node(tree: &DomTree, id: NodeId, out: &mut String) {
    let Some(node) = tree.get(id) else {
        return;
    };
    match &node.data {
        NodeData::Document => {
            for &child in &node.children {
                write_node(tree, child, out);
            }
        }
        NodeData::Text { text } => out.push_str(&escape_text(text)),
        NodeData::Element { tag, attrs } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attrs {
                out.push(' ');
                out.push_str(name);
                if !value.is_empty() {
                    out.push_str("=\"");
                    out.push_str(&escape_attr(value));
                    out.push('"');
                }
            }
            out.push('>');
            if VOID_TAGS.contains(&tag.as_str()) {
                return;
            }
            for &child in &node.children {
                write_node(tree, child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse;

    #[test]
    fn test_escapes_text_and_attrs() {
        let mut tree = DomTree::new();
        let a = tree.create_element("a");
        tree.set_attr(a, "title", "\"quoted\" & more");
        let text = tree.create_text("1 < 2 & 3 > 2");
        tree.append_child(a, text);
        tree.append_child(tree.root(), a);

        assert_eq!(
            tree.html(),
            "<a title=\"&quot;quoted&quot; &amp; more\">1 &lt; 2 &amp; 3 &gt; 2</a>"
        );
    }

    #[test]
    fn test_valueless_attr() {
        let tree = parse("<img src=\"x\" hidden>").unwrap();
        assert_eq!(tree.html(), "<img src=\"x\" hidden>");
    }

    #[test]
    fn test_round_trip_stability() {
        let html = "<p>a<br>b</p><blockquote><em>q</em></blockquote>";
        let once = parse(html).unwrap().html();
        let twice = parse(&once).unwrap().html();
        assert_eq!(once, twice);
        assert_eq!(once, html);
    }
}
