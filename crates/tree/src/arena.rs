//! The node arena backing a document.
//!
//! All element data for one document lives in a single `Vec`; children are
//! index lists and the parent link is an optional index, so the tree holds no
//! ownership cycles. Detached subtrees stay allocated in the arena until the
//! whole document is dropped.

use std::cell::RefCell;
use std::rc::Rc;

/// Opaque index of a node within its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// One entry of an element's mixed-content sequence, in document order.
/// Indices point into `text_nodes`, `children`, and `comments` respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlowItem {
    Text(usize),
    Child(usize),
    Comment(usize),
}

/// The reserved declaration key for the default namespace (`xmlns="…"`).
pub const DEFAULT_NS_KEY: &str = "";

#[derive(Debug, Clone, Default)]
pub(crate) struct ElementData {
    pub name: String,
    pub prefix: Option<String>,
    pub local_name: String,
    pub namespace_uri: Option<String>,
    /// Declarations syntactically on this element, in source order. The
    /// default namespace is stored under [`DEFAULT_NS_KEY`].
    pub xmlns_declarations: Vec<(String, String)>,
    /// Attribute name/value pairs in source order, xmlns declarations
    /// included for round-tripping.
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub raw_text: Option<String>,
    pub numeric_value: Option<f64>,
    pub boolean_value: Option<bool>,
    pub text_nodes: Vec<String>,
    pub comments: Vec<String>,
    /// Document-order interleaving of text fragments, children and comments.
    /// Empty unless the element has true mixed content.
    pub flow: Vec<FlowItem>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    pub depth: usize,
    pub path: String,
    /// 0-based position among siblings of the same name.
    pub index_in_parent: usize,
    /// 0-based position in the parent's `children` list.
    pub index_among_all_siblings: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Arena {
    pub nodes: Vec<ElementData>,
}

pub(crate) type SharedArena = Rc<RefCell<Arena>>;

impl Arena {
    pub fn alloc(&mut self, data: ElementData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(data);
        id
    }

    pub fn get(&self, id: NodeId) -> &ElementData {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut ElementData {
        &mut self.nodes[id.0]
    }

    /// Recomputes both sibling indices for every child of `parent`.
    /// Called after any structural change to the child list.
    pub fn reindex_children(&mut self, parent: NodeId) {
        let children = self.get(parent).children.clone();
        let mut name_counts: Vec<(String, usize)> = Vec::new();
        for (position, child) in children.iter().enumerate() {
            let name = self.get(*child).name.clone();
            let same_name_index = match name_counts.iter_mut().find(|(n, _)| *n == name) {
                Some((_, count)) => {
                    let index = *count;
                    *count += 1;
                    index
                }
                None => {
                    name_counts.push((name, 1));
                    0
                }
            };
            let data = self.get_mut(*child);
            data.index_in_parent = same_name_index;
            data.index_among_all_siblings = position;
        }
    }

    /// Rewrites `depth` and `path` for `id` and its whole subtree based on
    /// the node's current parent (or detached-root state).
    pub fn rewrite_depth_and_path(&mut self, id: NodeId) {
        let (depth, path) = match self.get(id).parent {
            Some(parent) => {
                let parent_data = self.get(parent);
                (
                    parent_data.depth + 1,
                    format!("{}/{}", parent_data.path, self.get(id).name),
                )
            }
            None => (0, self.get(id).name.clone()),
        };

        let mut stack = vec![(id, depth, path)];
        while let Some((node, depth, path)) = stack.pop() {
            let data = self.get_mut(node);
            data.depth = depth;
            data.path = path.clone();
            let children = data.children.clone();
            for child in children {
                let child_name = self.get(child).name.clone();
                stack.push((child, depth + 1, format!("{path}/{child_name}")));
            }
        }
    }

    /// Deep-copies the subtree rooted at `src` (read from `source`) into
    /// `self`, returning the new detached root. Used both for `deep_clone`
    /// and for attaching a node from a foreign arena.
    pub fn copy_subtree_from(&mut self, source: &Arena, src: NodeId) -> NodeId {
        let mut data = source.get(src).clone();
        let src_children = std::mem::take(&mut data.children);
        data.parent = None;
        data.index_in_parent = 0;
        data.index_among_all_siblings = 0;
        let new_id = self.alloc(data);

        let mut new_children = Vec::with_capacity(src_children.len());
        for child in src_children {
            let new_child = self.copy_subtree_from(source, child);
            self.get_mut(new_child).parent = Some(new_id);
            new_children.push(new_child);
        }
        self.get_mut(new_id).children = new_children;
        self.reindex_children(new_id);
        new_id
    }

    /// As `copy_subtree_from`, but within a single arena.
    pub fn copy_subtree(&mut self, src: NodeId) -> NodeId {
        let mut data = self.get(src).clone();
        let src_children = std::mem::take(&mut data.children);
        data.parent = None;
        data.index_in_parent = 0;
        data.index_among_all_siblings = 0;
        let new_id = self.alloc(data);

        let mut new_children = Vec::with_capacity(src_children.len());
        for child in src_children {
            let new_child = self.copy_subtree(child);
            self.get_mut(new_child).parent = Some(new_id);
            new_children.push(new_child);
        }
        self.get_mut(new_id).children = new_children;
        self.reindex_children(new_id);
        new_id
    }

    /// Root-relative sibling-index path, the document-order sort key.
    pub fn order_key(&self, id: NodeId) -> Vec<usize> {
        let mut key = Vec::new();
        let mut current = id;
        loop {
            let data = self.get(current);
            match data.parent {
                Some(parent) => {
                    key.push(data.index_among_all_siblings);
                    current = parent;
                }
                None => break,
            }
        }
        key.reverse();
        key
    }
}

/// Splits a tag name into its optional prefix and local part.
pub(crate) fn split_name(name: &str) -> (Option<String>, String) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix.to_string()), local.to_string()),
        None => (None, name.to_string()),
    }
}
