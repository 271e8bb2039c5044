//! Opaque element handles and the mutation/serialization API.
//!
//! An [`ElementRef`] is a cheap handle (shared arena + node index). All reads
//! and writes go through the arena, so handles stay valid across mutations
//! elsewhere in the tree. Equality and hashing are identity-based.

use crate::arena::{Arena, DEFAULT_NS_KEY, ElementData, FlowItem, NodeId, SharedArena, split_name};
use crate::entity;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::OnceLock;

/// A parsed XML document. Thin wrapper that pins the arena and remembers the
/// root element.
#[derive(Clone)]
pub struct Document {
    root: ElementRef,
}

impl Document {
    pub(crate) fn from_root(root: ElementRef) -> Self {
        Document { root }
    }

    pub fn root(&self) -> ElementRef {
        self.root.clone()
    }

    pub fn to_xml(&self, options: &XmlWriteOptions) -> String {
        self.root.to_xml(options)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document").field("root", &self.root).finish()
    }
}

/// Construction data for [`ElementRef::create_child`].
#[derive(Debug, Clone, Default)]
pub struct ElementInit {
    pub name: String,
    pub prefix: Option<String>,
    pub namespace_uri: Option<String>,
    pub text: Option<String>,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<ElementInit>,
}

impl ElementInit {
    pub fn new(name: impl Into<String>) -> Self {
        ElementInit {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn namespace_uri(mut self, uri: impl Into<String>) -> Self {
        self.namespace_uri = Some(uri.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn child(mut self, child: ElementInit) -> Self {
        self.children.push(child);
        self
    }
}

/// A partial update for [`ElementRef::update`]. Absent fields are untouched;
/// `attributes` replaces the whole attribute map.
#[derive(Debug, Clone, Default)]
pub struct ElementPatch {
    pub name: Option<String>,
    pub namespace_uri: Option<String>,
    pub text: Option<String>,
    pub attributes: Option<Vec<(String, String)>>,
}

impl ElementPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn namespace_uri(mut self, uri: impl Into<String>) -> Self {
        self.namespace_uri = Some(uri.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn attributes(mut self, attributes: Vec<(String, String)>) -> Self {
        self.attributes = Some(attributes);
        self
    }
}

/// Serialization options for [`ElementRef::to_xml`].
#[derive(Debug, Clone)]
pub struct XmlWriteOptions {
    /// Prepend `<?xml version="1.0" encoding="UTF-8"?>` (only when
    /// `indent_level` is 0).
    pub include_declaration: bool,
    /// Per-level indentation unit; empty string means compact output.
    pub indent: String,
    /// Starting nesting level. Recursion-internal, normally 0.
    pub indent_level: usize,
    /// Emit fully empty elements as `<name/>` instead of `<name></name>`.
    pub self_closing: bool,
}

impl Default for XmlWriteOptions {
    fn default() -> Self {
        XmlWriteOptions {
            include_declaration: false,
            indent: String::new(),
            indent_level: 0,
            self_closing: true,
        }
    }
}

impl XmlWriteOptions {
    pub fn pretty() -> Self {
        XmlWriteOptions {
            indent: "  ".to_string(),
            ..Default::default()
        }
    }

    pub fn declaration(mut self, include: bool) -> Self {
        self.include_declaration = include;
        self
    }

    pub fn indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    pub fn self_closing(mut self, self_closing: bool) -> Self {
        self.self_closing = self_closing;
        self
    }
}

fn numeric_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| regex::Regex::new(r"^-?\d+(\.\d+)?$").unwrap())
}

/// Auto-typing rule shared by the parser and the mutation API.
pub(crate) fn auto_numeric(text: &str) -> Option<f64> {
    if numeric_pattern().is_match(text) {
        text.parse().ok()
    } else {
        None
    }
}

pub(crate) fn auto_boolean(text: &str) -> Option<bool> {
    match text.to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Handle to a single element node.
#[derive(Clone)]
pub struct ElementRef {
    arena: SharedArena,
    id: NodeId,
}

impl PartialEq for ElementRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.arena, &other.arena) && self.id == other.id
    }
}

impl Eq for ElementRef {}

impl Hash for ElementRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.arena) as usize).hash(state);
        self.id.hash(state);
    }
}

impl fmt::Debug for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arena = self.arena.borrow();
        let data = arena.get(self.id);
        f.debug_struct("ElementRef")
            .field("name", &data.name)
            .field("path", &data.path)
            .finish()
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml(&XmlWriteOptions::default()))
    }
}

impl ElementRef {
    pub(crate) fn new(arena: SharedArena, id: NodeId) -> Self {
        ElementRef { arena, id }
    }

    /// Creates a fresh single-element tree, the root of its own arena.
    pub fn new_root(name: impl Into<String>) -> Self {
        let name = name.into();
        let (prefix, local_name) = split_name(&name);
        let data = ElementData {
            path: name.clone(),
            name,
            prefix,
            local_name,
            ..Default::default()
        };
        let mut arena = Arena::default();
        let id = arena.alloc(data);
        ElementRef::new(Rc::new(RefCell::new(arena)), id)
    }

    fn with<R>(&self, f: impl FnOnce(&ElementData) -> R) -> R {
        let arena = self.arena.borrow();
        f(arena.get(self.id))
    }

    fn handle(&self, id: NodeId) -> ElementRef {
        ElementRef::new(self.arena.clone(), id)
    }

    // --- Read accessors ---

    pub fn name(&self) -> String {
        self.with(|d| d.name.clone())
    }

    pub fn prefix(&self) -> Option<String> {
        self.with(|d| d.prefix.clone())
    }

    pub fn local_name(&self) -> String {
        self.with(|d| d.local_name.clone())
    }

    pub fn namespace_uri(&self) -> Option<String> {
        self.with(|d| d.namespace_uri.clone())
    }

    /// Declarations syntactically on this element, in source order. The
    /// default namespace is keyed by the empty string.
    pub fn xmlns_declarations(&self) -> Vec<(String, String)> {
        self.with(|d| d.xmlns_declarations.clone())
    }

    pub fn attributes(&self) -> Vec<(String, String)> {
        self.with(|d| d.attributes.clone())
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.with(|d| {
            d.attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
        })
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.with(|d| d.attributes.iter().any(|(n, _)| n == name))
    }

    pub fn text(&self) -> Option<String> {
        self.with(|d| d.text.clone())
    }

    pub fn raw_text(&self) -> Option<String> {
        self.with(|d| d.raw_text.clone())
    }

    pub fn numeric_value(&self) -> Option<f64> {
        self.with(|d| d.numeric_value)
    }

    pub fn boolean_value(&self) -> Option<bool> {
        self.with(|d| d.boolean_value)
    }

    pub fn text_nodes(&self) -> Vec<String> {
        self.with(|d| d.text_nodes.clone())
    }

    pub fn comments(&self) -> Vec<String> {
        self.with(|d| d.comments.clone())
    }

    pub fn has_mixed_content(&self) -> bool {
        self.with(|d| !d.text_nodes.is_empty())
    }

    pub fn has_comments(&self) -> bool {
        self.with(|d| !d.comments.is_empty())
    }

    pub fn children(&self) -> Vec<ElementRef> {
        self.with(|d| d.children.clone())
            .into_iter()
            .map(|id| self.handle(id))
            .collect()
    }

    pub fn child_count(&self) -> usize {
        self.with(|d| d.children.len())
    }

    pub fn parent(&self) -> Option<ElementRef> {
        self.with(|d| d.parent).map(|id| self.handle(id))
    }

    pub fn depth(&self) -> usize {
        self.with(|d| d.depth)
    }

    pub fn path(&self) -> String {
        self.with(|d| d.path.clone())
    }

    /// 0-based position among siblings of the same name.
    pub fn index_in_parent(&self) -> usize {
        self.with(|d| d.index_in_parent)
    }

    /// 0-based position in the parent's child list.
    pub fn index_among_all_siblings(&self) -> usize {
        self.with(|d| d.index_among_all_siblings)
    }

    pub fn has_children(&self) -> bool {
        self.with(|d| !d.children.is_empty())
    }

    pub fn is_leaf(&self) -> bool {
        !self.has_children()
    }

    /// All other children of this element's parent.
    pub fn siblings(&self) -> Vec<ElementRef> {
        match self.parent() {
            Some(parent) => parent
                .children()
                .into_iter()
                .filter(|c| c != self)
                .collect(),
            None => Vec::new(),
        }
    }

    /// The root of the tree this element belongs to.
    pub fn root(&self) -> ElementRef {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    pub fn is_ancestor_of(&self, other: &ElementRef) -> bool {
        if !Rc::ptr_eq(&self.arena, &other.arena) {
            return false;
        }
        let mut current = other.parent();
        while let Some(node) = current {
            if node == *self {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// True when both handles point into the same arena.
    pub fn same_tree(&self, other: &ElementRef) -> bool {
        Rc::ptr_eq(&self.arena, &other.arena)
    }

    /// Stable token identifying this element's arena; combined with
    /// [`document_order_key`](Self::document_order_key) it yields a total
    /// order across trees.
    pub fn arena_token(&self) -> usize {
        Rc::as_ptr(&self.arena) as usize
    }

    /// Root-relative sibling-index path: the document-order sort key.
    pub fn document_order_key(&self) -> Vec<usize> {
        self.arena.borrow().order_key(self.id)
    }

    /// The XPath string value: every text fragment of the subtree,
    /// concatenated in document order.
    pub fn string_value(&self) -> String {
        let arena = self.arena.borrow();
        let mut out = String::new();
        collect_string_value(&arena, self.id, &mut out);
        out
    }

    // --- Namespace resolution (ancestor walk) ---

    /// Resolves a prefix (or the default namespace for `""`) by walking from
    /// this element up to the root. An explicit empty URI (`xmlns=""`)
    /// un-declares and resolves to `None`.
    pub fn resolve_namespace_prefix(&self, prefix: &str) -> Option<String> {
        let arena = self.arena.borrow();
        let mut current = Some(self.id);
        while let Some(id) = current {
            let data = arena.get(id);
            if let Some((_, uri)) = data.xmlns_declarations.iter().find(|(p, _)| p == prefix) {
                if uri.is_empty() {
                    return None;
                }
                return Some(uri.clone());
            }
            current = data.parent;
        }
        None
    }

    pub fn default_namespace(&self) -> Option<String> {
        self.resolve_namespace_prefix(DEFAULT_NS_KEY)
    }

    /// All prefix→URI mappings in scope, nearest declaration first; child
    /// declarations shadow ancestors.
    pub fn namespace_mappings_in_scope(&self) -> Vec<(String, String)> {
        let arena = self.arena.borrow();
        let mut mappings: Vec<(String, String)> = Vec::new();
        let mut current = Some(self.id);
        while let Some(id) = current {
            let data = arena.get(id);
            for (prefix, uri) in &data.xmlns_declarations {
                if !mappings.iter().any(|(p, _)| p == prefix) {
                    mappings.push((prefix.clone(), uri.clone()));
                }
            }
            current = data.parent;
        }
        mappings
    }

    /// Prefixes (not the default namespace) visible from this element.
    pub fn namespace_prefixes_in_scope(&self) -> Vec<String> {
        self.namespace_mappings_in_scope()
            .into_iter()
            .filter(|(p, _)| !p.is_empty())
            .map(|(p, _)| p)
            .collect()
    }

    pub fn prefix_for_namespace(&self, uri: &str) -> Option<String> {
        self.namespace_mappings_in_scope()
            .into_iter()
            .find(|(_, u)| u == uri)
            .map(|(p, _)| p)
    }

    // --- Mutation ---

    /// Appends `child` to this element. A child from another tree is
    /// deep-copied in; a child already attached elsewhere in this tree is
    /// moved. Returns the handle of the attached element.
    pub fn add_child(&self, child: &ElementRef) -> ElementRef {
        if Rc::ptr_eq(&self.arena, &child.arena) {
            // Attaching self or an ancestor would create a cycle.
            if child == self || child.is_ancestor_of(self) {
                return child.clone();
            }
            let mut arena = self.arena.borrow_mut();
            detach(&mut arena, child.id);
            attach_at_end(&mut arena, self.id, child.id);
            self.handle(child.id)
        } else {
            let copied = {
                let source = child.arena.borrow();
                self.arena.borrow_mut().copy_subtree_from(&source, child.id)
            };
            let mut arena = self.arena.borrow_mut();
            attach_at_end(&mut arena, self.id, copied);
            self.handle(copied)
        }
    }

    /// Constructs a new element from `init` and appends it.
    pub fn create_child(&self, init: ElementInit) -> ElementRef {
        let id = {
            let mut arena = self.arena.borrow_mut();
            build_from_init(&mut arena, &init)
        };
        let child = self.handle(id);
        self.add_child(&child)
    }

    /// Removes `target` from this element's children. Returns `false` when
    /// `target` is not a direct child.
    pub fn remove_child(&self, target: &ElementRef) -> bool {
        if !Rc::ptr_eq(&self.arena, &target.arena) || target.parent().as_ref() != Some(self) {
            return false;
        }
        let mut arena = self.arena.borrow_mut();
        detach(&mut arena, target.id);
        true
    }

    /// Removes the child at `index`. Returns `false` when out of bounds.
    pub fn remove_child_at(&self, index: usize) -> bool {
        let child = self.with(|d| d.children.get(index).copied());
        match child {
            Some(id) => {
                let mut arena = self.arena.borrow_mut();
                detach(&mut arena, id);
                true
            }
            None => false,
        }
    }

    /// Removes this element from its parent. Returns `false` when detached.
    pub fn remove(&self) -> bool {
        match self.parent() {
            Some(parent) => parent.remove_child(self),
            None => false,
        }
    }

    /// Applies a partial update. A name change rewrites `path` on self and
    /// every descendant; a text change re-runs auto-typing; an attributes
    /// patch replaces the whole map.
    pub fn update(&self, patch: &ElementPatch) {
        let mut arena = self.arena.borrow_mut();
        if let Some(name) = &patch.name {
            let (prefix, local_name) = split_name(name);
            let data = arena.get_mut(self.id);
            data.name = name.clone();
            data.prefix = prefix;
            data.local_name = local_name;
            if let Some(parent) = arena.get(self.id).parent {
                arena.reindex_children(parent);
            }
            arena.rewrite_depth_and_path(self.id);
        }
        if let Some(uri) = &patch.namespace_uri {
            arena.get_mut(self.id).namespace_uri = Some(uri.clone());
        }
        if let Some(text) = &patch.text {
            let data = arena.get_mut(self.id);
            data.text = Some(text.clone());
            data.numeric_value = auto_numeric(text);
            data.boolean_value = auto_boolean(text);
        }
        if let Some(attributes) = &patch.attributes {
            arena.get_mut(self.id).attributes = attributes.clone();
        }
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.update(&ElementPatch::new().text(text.into()));
    }

    /// Writes an attribute, replacing any existing value in place.
    /// `xmlns`-style names go only into the attribute map, never into
    /// `xmlns_declarations`; use [`set_namespace_declaration`](Self::set_namespace_declaration)
    /// for declarations.
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let mut arena = self.arena.borrow_mut();
        let data = arena.get_mut(self.id);
        match data.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => data.attributes.push((name, value)),
        }
    }

    /// Removes an attribute. Returns `false` when not present.
    pub fn remove_attribute(&self, name: &str) -> bool {
        let mut arena = self.arena.borrow_mut();
        let data = arena.get_mut(self.id);
        let before = data.attributes.len();
        data.attributes.retain(|(n, _)| n != name);
        data.attributes.len() != before
    }

    /// Declares a namespace on this element. Pass `""` as the prefix for the
    /// default namespace.
    pub fn set_namespace_declaration(&self, prefix: impl Into<String>, uri: impl Into<String>) {
        let prefix = prefix.into();
        let uri = uri.into();
        let mut arena = self.arena.borrow_mut();
        let data = arena.get_mut(self.id);
        match data.xmlns_declarations.iter_mut().find(|(p, _)| *p == prefix) {
            Some((_, existing)) => *existing = uri,
            None => data.xmlns_declarations.push((prefix, uri)),
        }
    }

    /// Detaches every child.
    pub fn clear_children(&self) {
        let children = self.with(|d| d.children.clone());
        let mut arena = self.arena.borrow_mut();
        for child in children {
            detach(&mut arena, child);
        }
    }

    /// Replaces `old` with `new` at the same position. Returns `false` when
    /// `old` is not a direct child.
    pub fn replace_child(&self, old: &ElementRef, new: &ElementRef) -> bool {
        if !Rc::ptr_eq(&self.arena, &old.arena) || old.parent().as_ref() != Some(self) {
            return false;
        }
        let new_id = if Rc::ptr_eq(&self.arena, &new.arena) {
            if new == self || new.is_ancestor_of(self) {
                return false;
            }
            let mut arena = self.arena.borrow_mut();
            detach(&mut arena, new.id);
            new.id
        } else {
            let source = new.arena.borrow();
            self.arena.borrow_mut().copy_subtree_from(&source, new.id)
        };

        let mut arena = self.arena.borrow_mut();
        let index = arena.get(old.id).index_among_all_siblings;
        arena.get_mut(old.id).parent = None;
        arena.rewrite_depth_and_path(old.id);
        arena.get_mut(self.id).children[index] = new_id;
        arena.get_mut(new_id).parent = Some(self.id);
        arena.reindex_children(self.id);
        arena.rewrite_depth_and_path(new_id);
        true
    }

    /// Deep copy of this subtree. The clone is detached: no parent, no
    /// siblings; all internal back-pointers refer to the cloned nodes.
    pub fn deep_clone(&self) -> ElementRef {
        let id = {
            let mut arena = self.arena.borrow_mut();
            arena.copy_subtree(self.id)
        };
        let clone = self.handle(id);
        self.arena.borrow_mut().rewrite_depth_and_path(id);
        clone
    }

    // --- Serialization ---

    /// Serializes this subtree to XML text. Never fails.
    pub fn to_xml(&self, options: &XmlWriteOptions) -> String {
        let arena = self.arena.borrow();
        let mut out = String::new();
        if options.include_declaration && options.indent_level == 0 {
            out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
            out.push('\n');
        }
        write_node(&arena, self.id, options, options.indent_level, &mut out);
        out
    }
}

fn collect_string_value(arena: &Arena, id: NodeId, out: &mut String) {
    let data = arena.get(id);
    if !data.flow.is_empty() {
        for item in &data.flow {
            match item {
                FlowItem::Text(i) => out.push_str(&data.text_nodes[*i]),
                FlowItem::Child(i) => collect_string_value(arena, data.children[*i], out),
                FlowItem::Comment(_) => {}
            }
        }
    } else {
        if let Some(text) = &data.text {
            out.push_str(text);
        }
        for child in &data.children {
            collect_string_value(arena, *child, out);
        }
    }
}

/// Removes `child` from its parent (if any), fixing the parent's child list,
/// mixed-content flow and sibling indices, and re-rooting the detached
/// subtree's depth/path.
fn detach(arena: &mut Arena, child: NodeId) {
    let Some(parent) = arena.get(child).parent else {
        arena.get_mut(child).parent = None;
        return;
    };
    let index = arena.get(child).index_among_all_siblings;
    arena.get_mut(parent).children.remove(index);

    let flow = &mut arena.get_mut(parent).flow;
    if !flow.is_empty() {
        flow.retain(|item| !matches!(item, FlowItem::Child(i) if *i == index));
        for item in flow.iter_mut() {
            if let FlowItem::Child(i) = item {
                if *i > index {
                    *i -= 1;
                }
            }
        }
    }

    arena.get_mut(child).parent = None;
    arena.reindex_children(parent);
    arena.rewrite_depth_and_path(child);
}

/// Appends a detached node to `parent`'s child list and restores every
/// derived field (indices, depth, path, mixed-content flow).
fn attach_at_end(arena: &mut Arena, parent: NodeId, child: NodeId) {
    arena.get_mut(parent).children.push(child);
    arena.get_mut(child).parent = Some(parent);
    let new_index = arena.get(parent).children.len() - 1;
    if !arena.get(parent).flow.is_empty() {
        arena.get_mut(parent).flow.push(FlowItem::Child(new_index));
    }
    arena.reindex_children(parent);
    arena.rewrite_depth_and_path(child);
}

/// Builds a detached subtree from an [`ElementInit`], applying the same
/// auto-typing rule as the parser.
fn build_from_init(arena: &mut Arena, init: &ElementInit) -> NodeId {
    let name = match (&init.prefix, init.name.contains(':')) {
        (Some(prefix), false) => format!("{prefix}:{}", init.name),
        _ => init.name.clone(),
    };
    let (prefix, local_name) = split_name(&name);
    let (numeric_value, boolean_value) = match &init.text {
        Some(text) => (auto_numeric(text), auto_boolean(text)),
        None => (None, None),
    };
    let data = ElementData {
        path: name.clone(),
        name,
        prefix,
        local_name,
        namespace_uri: init.namespace_uri.clone(),
        text: init.text.clone(),
        numeric_value,
        boolean_value,
        attributes: init.attributes.clone(),
        ..Default::default()
    };
    let id = arena.alloc(data);

    let mut children = Vec::with_capacity(init.children.len());
    for child_init in &init.children {
        let child = build_from_init(arena, child_init);
        arena.get_mut(child).parent = Some(id);
        children.push(child);
    }
    arena.get_mut(id).children = children;
    arena.reindex_children(id);
    arena.rewrite_depth_and_path(id);
    id
}

fn write_node(arena: &Arena, id: NodeId, options: &XmlWriteOptions, level: usize, out: &mut String) {
    let data = arena.get(id);
    out.push('<');
    out.push_str(&data.name);

    for (prefix, uri) in &data.xmlns_declarations {
        if prefix.is_empty() {
            out.push_str(" xmlns=\"");
        } else {
            out.push_str(" xmlns:");
            out.push_str(prefix);
            out.push_str("=\"");
        }
        out.push_str(&entity::encode(uri));
        out.push('"');
    }
    for (name, value) in &data.attributes {
        // Declarations were already written from xmlns_declarations.
        if name == "xmlns" || name.starts_with("xmlns:") {
            continue;
        }
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&entity::encode(value));
        out.push('"');
    }

    let empty = data.text.is_none() && data.flow.is_empty() && data.children.is_empty();
    if empty {
        if options.self_closing {
            out.push_str("/>");
        } else {
            out.push_str("></");
            out.push_str(&data.name);
            out.push('>');
        }
        return;
    }
    out.push('>');

    if !data.flow.is_empty() {
        // Mixed content is emitted inline; indenting it would change the
        // significance of the text fragments.
        for item in &data.flow {
            match item {
                FlowItem::Text(i) => out.push_str(&entity::encode(&data.text_nodes[*i])),
                FlowItem::Comment(i) => {
                    out.push_str("<!--");
                    out.push_str(&data.comments[*i]);
                    out.push_str("-->");
                }
                FlowItem::Child(i) => write_node(arena, data.children[*i], options, level + 1, out),
            }
        }
    } else {
        if let Some(text) = &data.text {
            out.push_str(&entity::encode(text));
        }
        if !data.children.is_empty() {
            for child in &data.children {
                if !options.indent.is_empty() {
                    out.push('\n');
                    for _ in 0..=level {
                        out.push_str(&options.indent);
                    }
                }
                write_node(arena, *child, options, level + 1, out);
            }
            if !options.indent.is_empty() {
                out.push('\n');
                for _ in 0..level {
                    out.push_str(&options.indent);
                }
            }
        }
    }

    out.push_str("</");
    out.push_str(&data.name);
    out.push('>');
}
