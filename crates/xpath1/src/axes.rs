//! Node collection along each XPath axis, in document order, deduplicated.

use std::collections::HashSet;
use xmlq_tree::ElementRef;

fn add_node(node: ElementRef, seen: &mut HashSet<ElementRef>, results: &mut Vec<ElementRef>) {
    if seen.insert(node.clone()) {
        results.push(node);
    }
}

pub fn collect_self_nodes(
    node: &ElementRef,
    seen: &mut HashSet<ElementRef>,
    results: &mut Vec<ElementRef>,
) {
    add_node(node.clone(), seen, results);
}

pub fn collect_child_nodes(
    node: &ElementRef,
    seen: &mut HashSet<ElementRef>,
    results: &mut Vec<ElementRef>,
) {
    for child in node.children() {
        add_node(child, seen, results);
    }
}

pub fn collect_descendant_nodes(
    node: &ElementRef,
    seen: &mut HashSet<ElementRef>,
    results: &mut Vec<ElementRef>,
) {
    for child in node.children() {
        add_node(child.clone(), seen, results);
        collect_descendant_nodes(&child, seen, results);
    }
}

pub fn collect_descendant_or_self_nodes(
    node: &ElementRef,
    seen: &mut HashSet<ElementRef>,
    results: &mut Vec<ElementRef>,
) {
    add_node(node.clone(), seen, results);
    collect_descendant_nodes(node, seen, results);
}

pub fn collect_parent_nodes(
    node: &ElementRef,
    seen: &mut HashSet<ElementRef>,
    results: &mut Vec<ElementRef>,
) {
    if let Some(parent) = node.parent() {
        add_node(parent, seen, results);
    }
}

pub fn collect_ancestor_nodes(
    node: &ElementRef,
    seen: &mut HashSet<ElementRef>,
    results: &mut Vec<ElementRef>,
) {
    let mut current = node.parent();
    while let Some(parent) = current {
        current = parent.parent();
        add_node(parent, seen, results);
    }
}

pub fn collect_ancestor_or_self_nodes(
    node: &ElementRef,
    seen: &mut HashSet<ElementRef>,
    results: &mut Vec<ElementRef>,
) {
    add_node(node.clone(), seen, results);
    collect_ancestor_nodes(node, seen, results);
}

pub fn collect_following_sibling_nodes(
    node: &ElementRef,
    seen: &mut HashSet<ElementRef>,
    results: &mut Vec<ElementRef>,
) {
    if let Some(parent) = node.parent() {
        let mut found_self = false;
        for sibling in parent.children() {
            if found_self {
                add_node(sibling.clone(), seen, results);
            }
            if sibling == *node {
                found_self = true;
            }
        }
    }
}

pub fn collect_preceding_sibling_nodes(
    node: &ElementRef,
    seen: &mut HashSet<ElementRef>,
    results: &mut Vec<ElementRef>,
) {
    if let Some(parent) = node.parent() {
        for sibling in parent.children() {
            if sibling == *node {
                break;
            }
            add_node(sibling, seen, results);
        }
    }
}

/// Everything after the node in document order, excluding its descendants:
/// for each ancestor-or-self, the later siblings and their subtrees.
pub fn collect_following_nodes(
    node: &ElementRef,
    seen: &mut HashSet<ElementRef>,
    results: &mut Vec<ElementRef>,
) {
    let mut current = Some(node.clone());
    while let Some(c) = &current {
        let parent = c.parent();
        if let Some(p) = &parent {
            let mut found = false;
            for sibling in p.children() {
                if found {
                    collect_descendant_or_self_nodes(&sibling, seen, results);
                }
                if sibling == *c {
                    found = true;
                }
            }
        }
        current = parent;
    }
}

/// Everything before the node in document order, excluding its ancestors.
pub fn collect_preceding_nodes(
    node: &ElementRef,
    seen: &mut HashSet<ElementRef>,
    results: &mut Vec<ElementRef>,
) {
    let mut current = Some(node.clone());
    while let Some(c) = &current {
        let parent = c.parent();
        if let Some(p) = &parent {
            for sibling in p.children() {
                if sibling == *c {
                    break;
                }
                collect_descendant_or_self_nodes(&sibling, seen, results);
            }
        }
        current = parent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmlq_tree::{ParseOptions, parse_document};

    fn tree() -> ElementRef {
        // root -> (a -> (x, y), b, a2 -> z)
        parse_document(
            "<root><a><x/><y/></a><b/><a><z/></a></root>",
            &ParseOptions::default(),
        )
        .unwrap()
        .root()
    }

    fn names(nodes: &[ElementRef]) -> Vec<String> {
        nodes.iter().map(|n| n.name()).collect()
    }

    #[test]
    fn test_collect_children_in_order() {
        let root = tree();
        let mut seen = HashSet::new();
        let mut results = Vec::new();
        collect_child_nodes(&root, &mut seen, &mut results);
        assert_eq!(names(&results), vec!["a", "b", "a"]);
    }

    #[test]
    fn test_collect_descendants_document_order() {
        let root = tree();
        let mut seen = HashSet::new();
        let mut results = Vec::new();
        collect_descendant_nodes(&root, &mut seen, &mut results);
        assert_eq!(names(&results), vec!["a", "x", "y", "b", "a", "z"]);
    }

    #[test]
    fn test_collect_descendant_or_self_includes_start() {
        let root = tree();
        let mut seen = HashSet::new();
        let mut results = Vec::new();
        collect_descendant_or_self_nodes(&root, &mut seen, &mut results);
        assert_eq!(results.len(), 7);
        assert_eq!(results[0], root);
    }

    #[test]
    fn test_collect_ancestors_nearest_first() {
        let root = tree();
        let x = root.children()[0].children()[0].clone();
        let mut seen = HashSet::new();
        let mut results = Vec::new();
        collect_ancestor_nodes(&x, &mut seen, &mut results);
        assert_eq!(names(&results), vec!["a", "root"]);
    }

    #[test]
    fn test_collect_siblings() {
        let root = tree();
        let b = root.children()[1].clone();
        let mut seen = HashSet::new();
        let mut following = Vec::new();
        collect_following_sibling_nodes(&b, &mut seen, &mut following);
        assert_eq!(names(&following), vec!["a"]);

        seen.clear();
        let mut preceding = Vec::new();
        collect_preceding_sibling_nodes(&b, &mut seen, &mut preceding);
        assert_eq!(names(&preceding), vec!["a"]);
    }

    #[test]
    fn test_collect_following_excludes_descendants() {
        let root = tree();
        let first_a = root.children()[0].clone();
        let mut seen = HashSet::new();
        let mut results = Vec::new();
        collect_following_nodes(&first_a, &mut seen, &mut results);
        assert_eq!(names(&results), vec!["b", "a", "z"]);
    }

    #[test]
    fn test_collect_preceding_excludes_ancestors() {
        let root = tree();
        let z = root.children()[2].children()[0].clone();
        let mut seen = HashSet::new();
        let mut results = Vec::new();
        collect_preceding_nodes(&z, &mut seen, &mut results);
        assert_eq!(names(&results), vec!["a", "x", "y", "b"]);
    }
}
