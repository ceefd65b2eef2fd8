//! Lenient HTML parsing into a [`DomTree`].
//!
//! The parser tolerates the kind of damage browser editing produces
//! (unmatched close tags, missing close tags, stray `<`), but reports an
//! error for structurally unrecoverable input: an unterminated tag at end
//! of input, an unterminated comment, or an unterminated quoted attribute
//! value. Callers that must never fail (the sanitizer) map the error to an
//! empty document.

use anyhow::{bail, Result};

use super::{DomTree, NodeId, VOID_TAGS};

/// Parse an HTML fragment into a document tree.
pub fn parse(input: &str) -> Result<DomTree> {
    let mut tree = DomTree::new();
    // Open-element stack; the document root is always at the bottom.
    let mut stack: Vec<(NodeId, String)> = Vec::new();
    let bytes = input.as_bytes();
    let mut idx = 0_usize;

    while idx < bytes.len() {
        if bytes[idx] != b'<' {
            let next = find_byte(bytes, idx, b'<').unwrap_or(bytes.len());
            append_text(&mut tree, &stack, &input[idx..next]);
            idx = next;
            continue;
        }

        if input[idx..].starts_with("<!--") {
            match input[idx + 4..].find("-->") {
                Some(end) => idx = idx + 4 + end + 3,
                None => bail!("unterminated comment at byte {idx}"),
            }
            continue;
        }

        if input[idx..].starts_with("<!") || input[idx..].starts_with("<?") {
            match find_byte(bytes, idx, b'>') {
                Some(end) => idx = end + 1,
                None => bail!("unterminated markup declaration at byte {idx}"),
            }
            continue;
        }

        let after_lt = idx + 1;
        let is_close = bytes.get(after_lt) == Some(&b'/');
        let name_start = if is_close { after_lt + 1 } else { after_lt };
        if !bytes
            .get(name_start)
            .map(|b| b.is_ascii_alphabetic())
            .unwrap_or(false)
        {
            // A lone '<' that does not begin a tag is literal text.
            append_text(&mut tree, &stack, "<");
            idx = after_lt;
            continue;
        }

        let tag = parse_tag(input, idx)?;
        idx = tag.end;

        if tag.is_close {
            close_tag(&mut stack, &tag.name);
            continue;
        }

        if tag.name == "script" || tag.name == "style" {
            // Raw-text elements: capture verbatim up to the matching close
            // tag (or end of input), without entity decoding.
            let (raw, after) = read_raw_text(input, idx, &tag.name);
            let element = tree.create_element(&tag.name);
            for (name, value) in &tag.attrs {
                tree.set_attr(element, name, value);
            }
            if !raw.is_empty() {
                let text = tree.create_text(raw);
                tree.append_child(element, text);
            }
            let parent = current_parent(&tree, &stack);
            tree.append_child(parent, element);
            idx = after;
            continue;
        }

        auto_close(&mut stack, &tag.name);

        let element = tree.create_element(&tag.name);
        for (name, value) in &tag.attrs {
            tree.set_attr(element, name, value);
        }
        let parent = current_parent(&tree, &stack);
        tree.append_child(parent, element);

        if !tag.self_closing && !VOID_TAGS.contains(&tag.name.as_str()) {
            stack.push((element, tag.name));
        }
    }

    Ok(tree)
}

struct ParsedTag {
    name: String,
    attrs: Vec<(String, String)>,
    is_close: bool,
    self_closing: bool,
    /// Byte offset just past the closing `>`.
    end: usize,
}

fn parse_tag(input: &str, start: usize) -> Result<ParsedTag> {
    let bytes = input.as_bytes();
    let mut idx = start + 1;
    let is_close = bytes.get(idx) == Some(&b'/');
    if is_close {
        idx += 1;
    }

    let name_start = idx;
    while idx < bytes.len() && (bytes[idx].is_ascii_alphanumeric() || bytes[idx] == b'-') {
        idx += 1;
    }
    let name = input[name_start..idx].to_ascii_lowercase();

    let mut attrs = Vec::new();
    let mut self_closing = false;
    loop {
        while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
            idx += 1;
        }
        match bytes.get(idx) {
            None => bail!("unterminated tag <{name} at byte {start}"),
            Some(b'>') => {
                idx += 1;
                break;
            }
            Some(b'/') => {
                self_closing = true;
                idx += 1;
            }
            Some(_) => {
                let (attr, next) = parse_attr(input, idx)?;
                if let Some(attr) = attr {
                    attrs.push(attr);
                }
                idx = next;
            }
        }
    }

    Ok(ParsedTag {
        name,
        attrs,
        is_close,
        self_closing,
        end: idx,
    })
}

type MaybeAttr = Option<(String, String)>;

fn parse_attr(input: &str, start: usize) -> Result<(MaybeAttr, usize)> {
    let bytes = input.as_bytes();
    let mut idx = start;

    let name_start = idx;
    while idx < bytes.len() && !b" \t\r\n=/>".contains(&bytes[idx]) {
        idx += 1;
    }
    let name = input[name_start..idx].to_ascii_lowercase();
    if name.is_empty() {
        // Stray '=' or similar; skip one byte so the tag loop progresses.
        return Ok((None, idx + 1));
    }

    while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
        idx += 1;
    }
    if bytes.get(idx) != Some(&b'=') {
        return Ok((Some((name, String::new())), idx));
    }
    idx += 1;
    while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
        idx += 1;
    }

    match bytes.get(idx) {
        Some(&quote @ (b'"' | b'\'')) => {
            let value_start = idx + 1;
            match find_byte(bytes, value_start, quote) {
                Some(end) => Ok((
                    Some((name, decode_entities(&input[value_start..end]))),
                    end + 1,
                )),
                None => bail!("unterminated quoted attribute value at byte {idx}"),
            }
        }
        _ => {
            let value_start = idx;
            while idx < bytes.len() && !b" \t\r\n>".contains(&bytes[idx]) {
                idx += 1;
            }
            Ok((
                Some((name, decode_entities(&input[value_start..idx]))),
                idx,
            ))
        }
    }
}

fn append_text(tree: &mut DomTree, stack: &[(NodeId, String)], raw: &str) {
    if raw.is_empty() {
        return;
    }
    let parent = current_parent(tree, stack);
    let text = decode_entities(raw);
    let node = tree.create_text(&text);
    tree.append_child(parent, node);
}

fn current_parent(tree: &DomTree, stack: &[(NodeId, String)]) -> NodeId {
    stack.last().map(|(id, _)| *id).unwrap_or_else(|| tree.root())
}

/// Close the innermost open element named `name`; unmatched close tags are
/// ignored.
fn close_tag(stack: &mut Vec<(NodeId, String)>, name: &str) {
    if let Some(pos) = stack.iter().rposition(|(_, n)| n == name) {
        stack.truncate(pos);
    }
}

/// Implied end tags: a new `p` or block element closes an open `p`, and a
/// new `li` closes an open `li`.
fn auto_close(stack: &mut Vec<(NodeId, String)>, incoming: &str) {
    let closes_p = incoming == "p" || super::BLOCK_TAGS.contains(&incoming);
    if closes_p {
        if let Some((_, top)) = stack.last() {
            if top == "p" {
                stack.pop();
            }
        }
    }
    if incoming == "li" {
        if let Some((_, top)) = stack.last() {
            if top == "li" {
                stack.pop();
            }
        }
    }
}

/// Scan to `</name`, returning the raw content and the offset just past the
/// close tag. Runs to end of input when the close tag is missing.
fn read_raw_text<'a>(input: &'a str, start: usize, name: &str) -> (&'a str, usize) {
    let lower = input.to_ascii_lowercase();
    let needle = format!("</{name}");
    match lower[start..].find(&needle) {
        Some(rel) => {
            let content_end = start + rel;
            let after = match input[content_end..].find('>') {
                Some(gt) => content_end + gt + 1,
                None => input.len(),
            };
            (&input[start..content_end], after)
        }
        None => (&input[start..], input.len()),
    }
}

fn find_byte(bytes: &[u8], start: usize, needle: u8) -> Option<usize> {
    bytes[start..].iter().position(|&b| b == needle).map(|p| start + p)
}

/// Decode the named entities browsers emit while editing, plus numeric
/// references. Unknown entities pass through literally.
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let window = &rest.as_bytes()[..rest.len().min(12)];
        let Some(semi) = window.iter().position(|&b| b == b';') else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };
        let entity = &rest[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            _ => decode_numeric(entity),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_numeric(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let code = if let Some(hex) = digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<u32>().ok()?
    };
    char::from_u32(code)
}
