//! The recursive-descent XML document parser.
//!
//! Scans a complete document string and builds the element tree in one pass.
//! The XML declaration, a DOCTYPE (including a bracketed internal subset) and
//! prolog comments are skipped; comments and CDATA inside element content are
//! preserved via the mixed-content walk.

use crate::arena::{Arena, ElementData, FlowItem, NodeId, split_name};
use crate::element::{Document, ElementRef, auto_boolean, auto_numeric};
use crate::entity;
use crate::error::{Error, Result};
use std::cell::RefCell;
use std::rc::Rc;

/// Parser configuration, applied uniformly to the whole document.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Trim leading/trailing whitespace from element text.
    pub trim_values: bool,
    /// Auto-parse `numeric_value` from text.
    pub parse_numbers: bool,
    /// Auto-parse `boolean_value` from text.
    pub parse_booleans: bool,
    /// Retain the undecoded, untrimmed character data as `raw_text`.
    pub preserve_raw_text: bool,
    /// Stop recursing into children whose depth would exceed this value.
    pub max_depth: Option<usize>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            trim_values: true,
            parse_numbers: true,
            parse_booleans: true,
            preserve_raw_text: false,
            max_depth: None,
        }
    }
}

/// Parses a complete XML document into a tree.
pub fn parse_document(xml: &str, options: &ParseOptions) -> Result<Document> {
    log::debug!(
        "parsing XML document: {} bytes, trim={}, numbers={}, booleans={}",
        xml.len(),
        options.trim_values,
        options.parse_numbers,
        options.parse_booleans
    );
    let body = strip_prolog(xml)?;
    if body.is_empty() {
        return Err(Error::parse("empty input"));
    }
    if !body.starts_with('<') {
        return Err(Error::parse("document must start with '<'"));
    }

    let arena = Rc::new(RefCell::new(Arena::default()));
    let root = {
        let mut guard = arena.borrow_mut();
        let mut parser = Parser {
            arena: &mut *guard,
            options,
        };
        let (id, _) = parser.parse_element(body, None, 0, "")?;
        id
    };
    Ok(Document::from_root(ElementRef::new(arena, root)))
}

/// Strips at most one XML declaration, at most one DOCTYPE and any prolog
/// comments, returning the element body.
fn strip_prolog(xml: &str) -> Result<&str> {
    let mut rest = xml.trim();
    let mut seen_declaration = false;
    let mut seen_doctype = false;
    loop {
        if !seen_declaration && rest.starts_with("<?xml") {
            let end = rest
                .find("?>")
                .ok_or_else(|| Error::parse("unterminated XML declaration"))?;
            rest = rest[end + 2..].trim_start();
            seen_declaration = true;
            continue;
        }
        if rest.starts_with("<!--") {
            let end = rest
                .find("-->")
                .ok_or_else(|| Error::parse("unterminated comment in prolog"))?;
            rest = rest[end + 3..].trim_start();
            continue;
        }
        if !seen_doctype && rest.starts_with("<!DOCTYPE") {
            let end = doctype_end(rest)
                .ok_or_else(|| Error::parse("unterminated DOCTYPE declaration"))?;
            rest = rest[end..].trim_start();
            seen_doctype = true;
            continue;
        }
        break;
    }
    Ok(rest.trim_end())
}

/// Byte offset just past a DOCTYPE's closing `>`, honoring a bracketed
/// internal subset.
fn doctype_end(s: &str) -> Option<usize> {
    let mut bracket_depth = 0usize;
    for (i, b) in s.bytes().enumerate() {
        match b {
            b'[' => bracket_depth += 1,
            b']' => bracket_depth = bracket_depth.saturating_sub(1),
            b'>' if bracket_depth == 0 => return Some(i + 1),
            _ => {}
        }
    }
    None
}

struct Parser<'a, 'o> {
    arena: &'a mut Arena,
    options: &'o ParseOptions,
}

impl Parser<'_, '_> {
    /// Parses one element starting at `input[0] == '<'`. Returns the new
    /// node and the number of bytes consumed, including the closing tag.
    fn parse_element(
        &mut self,
        input: &str,
        parent: Option<NodeId>,
        depth: usize,
        parent_path: &str,
    ) -> Result<(NodeId, usize)> {
        let bytes = input.as_bytes();
        let mut i = 1;
        let name_start = i;
        while i < bytes.len() && !is_tag_name_end(bytes[i]) {
            i += 1;
        }
        if i == name_start {
            return Err(Error::parse("malformed tag: missing tag name"));
        }
        let name = &input[name_start..i];

        let (attributes, xmlns_declarations, self_closing, after_tag) =
            self.parse_attributes(input, i, name)?;
        i = after_tag;

        let path = if parent_path.is_empty() {
            name.to_string()
        } else {
            format!("{parent_path}/{name}")
        };
        let (prefix, local_name) = split_name(name);
        let id = self.arena.alloc(ElementData {
            name: name.to_string(),
            prefix,
            local_name,
            xmlns_declarations,
            attributes,
            parent,
            depth,
            path: path.clone(),
            ..Default::default()
        });

        // Namespace URIs are resolved immediately, walking self then ancestors.
        let lookup_key = self.arena.get(id).prefix.clone().unwrap_or_default();
        let namespace_uri = resolve_namespace(self.arena, id, &lookup_key);
        self.arena.get_mut(id).namespace_uri = namespace_uri;

        log::trace!("parsed <{name}> at depth {depth}");
        if self_closing {
            return Ok((id, i));
        }

        let rest = &input[i..];
        let close = find_closing_tag(rest, name)
            .ok_or_else(|| Error::parse(format!("missing closing tag for <{name}>")))?;
        let content = &rest[..close];
        let after_name = close + 2 + name.len();
        let close_gt = rest[after_name..]
            .find('>')
            .ok_or_else(|| Error::parse(format!("unterminated closing tag for <{name}>")))?;
        let consumed = i + after_name + close_gt + 1;

        let at_depth_boundary = self.options.max_depth.is_some_and(|m| depth >= m);
        if content_has_markup(content) {
            if at_depth_boundary {
                log::warn!("max_depth reached at <{name}> (depth {depth}); children skipped");
            } else {
                self.parse_mixed_content(id, content, depth, &path)?;
            }
        } else {
            self.apply_pure_text(id, content);
        }
        self.arena.reindex_children(id);
        Ok((id, consumed))
    }

    /// Scans `name="value"` pairs up to the tag end. Returns attributes,
    /// xmlns declarations, the self-closing flag and the offset after `>`.
    #[allow(clippy::type_complexity)]
    fn parse_attributes(
        &self,
        input: &str,
        mut i: usize,
        tag_name: &str,
    ) -> Result<(Vec<(String, String)>, Vec<(String, String)>, bool, usize)> {
        let bytes = input.as_bytes();
        let mut attributes = Vec::new();
        let mut xmlns_declarations = Vec::new();
        loop {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() {
                return Err(Error::parse(format!("unterminated opening tag <{tag_name}>")));
            }
            match bytes[i] {
                b'>' => return Ok((attributes, xmlns_declarations, false, i + 1)),
                b'/' => {
                    if bytes.get(i + 1) != Some(&b'>') {
                        return Err(Error::parse(format!(
                            "unterminated opening tag <{tag_name}>: expected '/>'"
                        )));
                    }
                    return Ok((attributes, xmlns_declarations, true, i + 2));
                }
                _ => {}
            }

            let name_start = i;
            while i < bytes.len()
                && !bytes[i].is_ascii_whitespace()
                && !matches!(bytes[i], b'=' | b'>' | b'/')
            {
                i += 1;
            }
            let attr_name = &input[name_start..i];
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if attr_name.is_empty() || i >= bytes.len() || bytes[i] != b'=' {
                return Err(Error::parse(format!(
                    "malformed attribute '{attr_name}' in <{tag_name}>: expected '='"
                )));
            }
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() || !matches!(bytes[i], b'"' | b'\'') {
                return Err(Error::parse(format!(
                    "malformed attribute '{attr_name}' in <{tag_name}>: missing opening quote"
                )));
            }
            let quote = bytes[i];
            i += 1;
            let value_start = i;
            while i < bytes.len() && bytes[i] != quote {
                i += 1;
            }
            if i >= bytes.len() {
                return Err(Error::parse(format!(
                    "malformed attribute '{attr_name}' in <{tag_name}>: missing closing quote"
                )));
            }
            let value = entity::decode(&input[value_start..i]);
            i += 1;

            if attr_name == "xmlns" {
                xmlns_declarations.push((String::new(), value.clone()));
            } else if let Some(declared_prefix) = attr_name.strip_prefix("xmlns:") {
                xmlns_declarations.push((declared_prefix.to_string(), value.clone()));
            }
            attributes.push((attr_name.to_string(), value));
        }
    }

    fn apply_pure_text(&mut self, id: NodeId, content: &str) {
        let decoded = entity::decode(content);
        let stored = if self.options.trim_values {
            decoded.trim().to_string()
        } else {
            decoded
        };
        let preserve_raw = self.options.preserve_raw_text && !content.is_empty();
        let data = self.arena.get_mut(id);
        if preserve_raw {
            data.raw_text = Some(content.to_string());
        }
        if stored.is_empty() {
            return;
        }
        if self.options.parse_numbers {
            data.numeric_value = auto_numeric(&stored);
        }
        if self.options.parse_booleans {
            data.boolean_value = auto_boolean(&stored);
        }
        data.text = Some(stored);
    }

    /// Walks content that contains markup: text runs, comments, CDATA and
    /// child elements, in document order.
    fn parse_mixed_content(
        &mut self,
        id: NodeId,
        content: &str,
        depth: usize,
        path: &str,
    ) -> Result<()> {
        let mut buffer = String::new();
        let mut text_nodes: Vec<String> = Vec::new();
        let mut comments: Vec<String> = Vec::new();
        let mut children: Vec<NodeId> = Vec::new();
        let mut flow: Vec<FlowItem> = Vec::new();
        let mut cdata_text: Option<String> = None;

        // Whitespace-only runs between markup carry no content; real text
        // fragments keep their surrounding whitespace.
        fn flush(buffer: &mut String, text_nodes: &mut Vec<String>, flow: &mut Vec<FlowItem>) {
            if buffer.is_empty() {
                return;
            }
            let decoded = entity::decode(buffer);
            buffer.clear();
            if !decoded.trim().is_empty() {
                flow.push(FlowItem::Text(text_nodes.len()));
                text_nodes.push(decoded);
            }
        }

        let mut cursor = 0;
        while cursor < content.len() {
            let rest = &content[cursor..];
            if rest.starts_with("<!--") {
                flush(&mut buffer, &mut text_nodes, &mut flow);
                let end = rest
                    .find("-->")
                    .ok_or_else(|| Error::parse("unterminated comment"))?;
                flow.push(FlowItem::Comment(comments.len()));
                comments.push(rest[4..end].to_string());
                cursor += end + 3;
            } else if rest.starts_with("<![CDATA[") {
                flush(&mut buffer, &mut text_nodes, &mut flow);
                let end = rest
                    .find("]]>")
                    .ok_or_else(|| Error::parse("unterminated CDATA section"))?;
                let body = &rest[9..end];
                flow.push(FlowItem::Text(text_nodes.len()));
                text_nodes.push(body.to_string());
                if cdata_text.is_none() {
                    cdata_text = Some(body.to_string());
                }
                cursor += end + 3;
            } else if starts_child_element(rest) {
                flush(&mut buffer, &mut text_nodes, &mut flow);
                let (child, consumed) = self.parse_element(rest, Some(id), depth + 1, path)?;
                flow.push(FlowItem::Child(children.len()));
                children.push(child);
                cursor += consumed;
            } else {
                let Some(c) = rest.chars().next() else {
                    break;
                };
                buffer.push(c);
                cursor += c.len_utf8();
            }
        }
        flush(&mut buffer, &mut text_nodes, &mut flow);

        let mixed = !children.is_empty() || !comments.is_empty() || text_nodes.len() > 1;
        let preserve_raw = self.options.preserve_raw_text;
        let data = self.arena.get_mut(id);
        data.children = children;
        if let Some(body) = cdata_text {
            if data.text.is_none() {
                if preserve_raw {
                    data.raw_text = Some(body.clone());
                }
                data.text = Some(body);
            }
        }
        if mixed {
            // Children-only content needs no interleaving record; the child
            // list already is the document order.
            if !text_nodes.is_empty() || !comments.is_empty() {
                data.flow = flow;
            }
            data.text_nodes = text_nodes;
            data.comments = comments;
        }
        Ok(())
    }
}

fn is_tag_name_end(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'/' || b == b'>'
}

/// True when `rest` (starting at `<`) opens a child element rather than a
/// comment, CDATA section, closing tag or processing instruction.
fn starts_child_element(rest: &str) -> bool {
    if !rest.starts_with('<') {
        return false;
    }
    match rest[1..].chars().next() {
        Some(c) => c.is_alphabetic() || c == '_' || c == ':',
        None => false,
    }
}

fn content_has_markup(content: &str) -> bool {
    let mut idx = 0;
    while let Some(pos) = content[idx..].find('<') {
        let at = idx + pos;
        let rest = &content[at..];
        if rest.starts_with("<!--") || rest.starts_with("<![CDATA[") || starts_child_element(rest) {
            return true;
        }
        idx = at + 1;
    }
    false
}

/// Finds the byte offset of the matching `</name` for an already-consumed
/// opening tag, counting nested same-name opens and skipping comments and
/// CDATA sections transparently.
fn find_closing_tag(content: &str, name: &str) -> Option<usize> {
    let mut i = 0;
    let mut nesting = 0usize;
    while i < content.len() {
        if content.as_bytes()[i] != b'<' {
            i += 1;
            continue;
        }
        let rest = &content[i..];
        if rest.starts_with("<!--") {
            i += rest.find("-->")? + 3;
            continue;
        }
        if rest.starts_with("<![CDATA[") {
            i += rest.find("]]>")? + 3;
            continue;
        }
        if let Some(after) = rest.strip_prefix("</") {
            let name_matches = after.starts_with(name)
                && matches!(
                    after.as_bytes().get(name.len()),
                    Some(&b'>') | Some(&b' ') | Some(&b'\t') | Some(&b'\n') | Some(&b'\r')
                );
            if name_matches {
                if nesting == 0 {
                    return Some(i);
                }
                nesting -= 1;
            }
            i += rest.find('>')? + 1;
            continue;
        }
        if starts_child_element(rest) {
            let (tag_len, self_closing, matches_name) = scan_open_tag(rest, name)?;
            if matches_name && !self_closing {
                nesting += 1;
            }
            i += tag_len;
            continue;
        }
        i += 1;
    }
    None
}

/// Scans one opening tag (starting at `<`), tracking quoted attribute values
/// so `>` inside them does not end the tag. Returns the tag's byte length,
/// whether it self-closes, and whether its name equals `name`.
fn scan_open_tag(rest: &str, name: &str) -> Option<(usize, bool, bool)> {
    let bytes = rest.as_bytes();
    let mut i = 1;
    while i < bytes.len() && !is_tag_name_end(bytes[i]) {
        i += 1;
    }
    let matches_name = &rest[1..i] == name;

    let mut quote: Option<u8> = None;
    let mut previous = 0u8;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => return Some((i + 1, previous == b'/', matches_name)),
                _ => {}
            },
        }
        previous = b;
        i += 1;
    }
    None
}

fn resolve_namespace(arena: &Arena, start: NodeId, key: &str) -> Option<String> {
    let mut current = Some(start);
    while let Some(id) = current {
        let data = arena.get(id);
        if let Some((_, uri)) = data.xmlns_declarations.iter().find(|(p, _)| p == key) {
            if uri.is_empty() {
                return None;
            }
            return Some(uri.clone());
        }
        current = data.parent;
    }
    None
}
