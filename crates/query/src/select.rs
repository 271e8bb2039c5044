//! Selection: name-based searches, namespace filters, and hierarchy
//! navigation. Recursive selectors accumulate matches in document order and
//! deduplicate across overlapping subtrees.

use crate::set::{QuerySet, dedup_in_order};
use std::collections::HashSet;
use xmlq_tree::{ElementRef, NamePattern};

fn walk_subtree(
    element: &ElementRef,
    seen: &mut HashSet<ElementRef>,
    out: &mut Vec<ElementRef>,
    matcher: &dyn Fn(&ElementRef) -> bool,
) {
    if matcher(element) && seen.insert(element.clone()) {
        out.push(element.clone());
    }
    for child in element.children() {
        walk_subtree(&child, seen, out, matcher);
    }
}

/// Qualified-or-local name match used by `find` and `children_named`.
fn name_or_local_matches(element: &ElementRef, name: &str) -> bool {
    element.name() == name || element.local_name() == name
}

impl QuerySet {
    fn select_subtrees(&self, matcher: impl Fn(&ElementRef) -> bool) -> QuerySet {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for element in self.elements() {
            walk_subtree(element, &mut seen, &mut out, &matcher);
        }
        self.with_elements(out)
    }

    // --- Name searches (descendant-inclusive) ---

    /// Descendants (including the starting elements) whose qualified or
    /// local name equals `name`.
    pub fn find(&self, name: &str) -> QuerySet {
        self.select_subtrees(|el| name_or_local_matches(el, name))
    }

    /// Match on the qualified name only.
    pub fn find_qualified(&self, qualified: &str) -> QuerySet {
        self.select_subtrees(|el| el.name() == qualified)
    }

    /// Match on the local name only.
    pub fn find_local(&self, local: &str) -> QuerySet {
        self.select_subtrees(|el| el.local_name() == local)
    }

    /// Match the qualified name against a regex or wildcard pattern.
    pub fn find_pattern(&self, pattern: impl Into<NamePattern>) -> QuerySet {
        match pattern.into().compile() {
            Ok(re) => self.select_subtrees(|el| re.is_match(&el.name())),
            // Unreachable: wildcard translation escapes every metacharacter.
            Err(_) => self.with_elements(Vec::new()),
        }
    }

    /// The first match in document order, as a set holding at most one.
    pub fn find_first(&self, name: &str) -> QuerySet {
        fn first_in(element: &ElementRef, name: &str) -> Option<ElementRef> {
            if name_or_local_matches(element, name) {
                return Some(element.clone());
            }
            element.children().iter().find_map(|c| first_in(c, name))
        }
        let found = self.elements().iter().find_map(|el| first_in(el, name));
        self.with_elements(found.into_iter().collect())
    }

    // --- Namespace selectors (subtree-inclusive, like the find family) ---

    /// Elements carrying this prefix.
    pub fn namespace(&self, prefix: &str) -> QuerySet {
        self.select_subtrees(|el| el.prefix().as_deref() == Some(prefix))
    }

    /// Elements whose resolved namespace URI equals `uri`.
    pub fn namespace_uri(&self, uri: &str) -> QuerySet {
        self.select_subtrees(|el| el.namespace_uri().as_deref() == Some(uri))
    }

    /// Elements with this local name.
    pub fn local_name(&self, local: &str) -> QuerySet {
        self.select_subtrees(|el| el.local_name() == local)
    }

    /// Elements in namespace `uri` with local name `local`.
    pub fn in_namespace(&self, uri: &str, local: &str) -> QuerySet {
        self.select_subtrees(|el| {
            el.local_name() == local && el.namespace_uri().as_deref() == Some(uri)
        })
    }

    pub fn has_namespace(&self) -> QuerySet {
        self.select_subtrees(|el| el.namespace_uri().is_some())
    }

    pub fn no_namespace(&self) -> QuerySet {
        self.select_subtrees(|el| el.namespace_uri().is_none())
    }

    /// Elements whose namespace comes from a default declaration (no prefix).
    pub fn default_namespace(&self) -> QuerySet {
        self.select_subtrees(|el| el.prefix().is_none() && el.namespace_uri().is_some())
    }

    /// Elements with xmlns declarations syntactically on them.
    pub fn has_xmlns_declarations(&self) -> QuerySet {
        self.select_subtrees(|el| !el.xmlns_declarations().is_empty())
    }

    // --- Hierarchy ---

    pub fn children(&self) -> QuerySet {
        let mut out = Vec::new();
        for element in self.elements() {
            out.extend(element.children());
        }
        self.with_elements(dedup_in_order(out))
    }

    /// Children whose qualified or local name equals `name`.
    pub fn children_named(&self, name: &str) -> QuerySet {
        let mut out = Vec::new();
        for element in self.elements() {
            out.extend(
                element
                    .children()
                    .into_iter()
                    .filter(|c| name_or_local_matches(c, name)),
            );
        }
        self.with_elements(dedup_in_order(out))
    }

    /// Each element's first child.
    pub fn first_child(&self) -> QuerySet {
        let out: Vec<ElementRef> = self
            .elements()
            .iter()
            .filter_map(|el| el.children().into_iter().next())
            .collect();
        self.with_elements(dedup_in_order(out))
    }

    /// Each element's last child.
    pub fn last_child(&self) -> QuerySet {
        let out: Vec<ElementRef> = self
            .elements()
            .iter()
            .filter_map(|el| el.children().into_iter().next_back())
            .collect();
        self.with_elements(dedup_in_order(out))
    }

    /// Each element's child at `index`.
    pub fn child_at(&self, index: usize) -> QuerySet {
        let out: Vec<ElementRef> = self
            .elements()
            .iter()
            .filter_map(|el| el.children().get(index).cloned())
            .collect();
        self.with_elements(dedup_in_order(out))
    }

    pub fn parent(&self) -> QuerySet {
        let out: Vec<ElementRef> = self.elements().iter().filter_map(|el| el.parent()).collect();
        self.with_elements(dedup_in_order(out))
    }

    /// All ancestors, nearest first per element, deduplicated.
    pub fn ancestors(&self) -> QuerySet {
        let mut out = Vec::new();
        for element in self.elements() {
            let mut current = element.parent();
            while let Some(ancestor) = current {
                current = ancestor.parent();
                out.push(ancestor);
            }
        }
        self.with_elements(dedup_in_order(out))
    }

    pub fn ancestors_named(&self, name: &str) -> QuerySet {
        let ancestors = self.ancestors();
        ancestors.filtered(|el| name_or_local_matches(el, name))
    }

    /// The nearest ancestor-or-self matching `name`, per element.
    pub fn closest(&self, name: &str) -> QuerySet {
        self.closest_where(|el| name_or_local_matches(el, name))
    }

    /// The nearest ancestor-or-self satisfying `predicate`, per element.
    pub fn closest_where(&self, predicate: impl Fn(&ElementRef) -> bool) -> QuerySet {
        let mut out = Vec::new();
        for element in self.elements() {
            let mut current = Some(element.clone());
            while let Some(candidate) = current {
                if predicate(&candidate) {
                    out.push(candidate);
                    break;
                }
                current = candidate.parent();
            }
        }
        self.with_elements(dedup_in_order(out))
    }

    /// Strict descendants in document order.
    pub fn descendants(&self) -> QuerySet {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for element in self.elements() {
            for child in element.children() {
                walk_subtree(&child, &mut seen, &mut out, &|_| true);
            }
        }
        self.with_elements(out)
    }

    /// All other children of each element's parent.
    pub fn siblings(&self) -> QuerySet {
        let mut out = Vec::new();
        for element in self.elements() {
            out.extend(element.siblings());
        }
        self.with_elements(dedup_in_order(out))
    }

    pub fn siblings_named(&self, name: &str) -> QuerySet {
        let siblings = self.siblings();
        siblings.filtered(|el| name_or_local_matches(el, name))
    }

    /// Each element's parent's full child list (self included).
    pub fn siblings_including_self(&self) -> QuerySet {
        let mut out = Vec::new();
        for element in self.elements() {
            match element.parent() {
                Some(parent) => out.extend(parent.children()),
                None => out.push(element.clone()),
            }
        }
        self.with_elements(dedup_in_order(out))
    }

    pub fn next_sibling(&self) -> QuerySet {
        let out: Vec<ElementRef> = self
            .elements()
            .iter()
            .filter_map(|el| {
                let parent = el.parent()?;
                parent
                    .children()
                    .get(el.index_among_all_siblings() + 1)
                    .cloned()
            })
            .collect();
        self.with_elements(dedup_in_order(out))
    }

    pub fn previous_sibling(&self) -> QuerySet {
        let out: Vec<ElementRef> = self
            .elements()
            .iter()
            .filter_map(|el| {
                let parent = el.parent()?;
                let index = el.index_among_all_siblings();
                if index == 0 {
                    return None;
                }
                parent.children().get(index - 1).cloned()
            })
            .collect();
        self.with_elements(dedup_in_order(out))
    }
}

#[cfg(test)]
mod tests {
    use crate::set::parse;

    #[test]
    fn test_find_matches_qualified_and_local() {
        let query = parse(r#"<r xmlns:n="u"><n:item/><item/><sub><item/></sub></r>"#).unwrap();
        assert_eq!(query.find("item").count(), 3);
        assert_eq!(query.find_qualified("n:item").count(), 1);
        assert_eq!(query.find_local("item").count(), 3);
        assert_eq!(query.find_qualified("item").count(), 2);
    }

    #[test]
    fn test_find_is_inclusive_of_start() {
        let query = parse("<item><item/></item>").unwrap();
        assert_eq!(query.find("item").count(), 2);
    }

    #[test]
    fn test_find_document_order_dedup() {
        let query = parse("<r><a><x/></a><b><x/></b></r>").unwrap();
        // Overlapping starting points: root plus its own children.
        let wide = query.with_elements({
            let mut v = query.elements().to_vec();
            v.extend(query.elements()[0].children());
            v
        });
        let found = wide.find("x");
        assert_eq!(found.count(), 2);
        let paths: Vec<String> = found.iter().map(|e| e.path()).collect();
        assert_eq!(paths, vec!["r/a/x", "r/b/x"]);
    }

    #[test]
    fn test_find_pattern_wildcard_and_regex() {
        let query = parse("<r><itemOne/><itemTwo/><other/></r>").unwrap();
        assert_eq!(query.find_pattern("item*").count(), 2);
        let re = regex::Regex::new("^item(One|Two)$").unwrap();
        assert_eq!(query.find_pattern(re).count(), 2);
    }

    #[test]
    fn test_find_first() {
        let query = parse("<r><a>1</a><a>2</a></r>").unwrap();
        let first = query.find_first("a");
        assert_eq!(first.count(), 1);
        assert_eq!(first.texts(), vec!["1"]);
        assert_eq!(query.find_first("zzz").count(), 0);
    }

    #[test]
    fn test_namespace_filters() {
        let query =
            parse(r#"<r xmlns="A" xmlns:p="B"><x/><p:y/><c xmlns=""><z/></c></r>"#).unwrap();
        let all = query.descendants();
        assert_eq!(all.namespace("p").count(), 1);
        assert_eq!(all.namespace_uri("A").count(), 1);
        assert_eq!(all.namespace_uri("B").count(), 1);
        assert_eq!(all.no_namespace().count(), 2);
        assert_eq!(all.has_namespace().count(), 2);
        assert_eq!(all.default_namespace().count(), 1);
        // Recursive from the root: r itself and c both declare namespaces.
        assert_eq!(query.has_xmlns_declarations().count(), 2);
        assert_eq!(query.in_namespace("A", "x").count(), 1);
        assert_eq!(query.find("x").in_namespace("A", "x").count(), 1);
    }

    #[test]
    fn test_hierarchy_navigation() {
        let query = parse("<r><a><x/><y/></a><b/></r>").unwrap();
        assert_eq!(query.children().count(), 2);
        assert_eq!(query.children_named("a").count(), 1);
        assert_eq!(query.descendants().count(), 4);

        let a = query.children_named("a");
        assert_eq!(a.first_child().texts().len(), 0);
        assert_eq!(a.first_child().count(), 1);
        assert_eq!(a.first_child().elements()[0].name(), "x");
        assert_eq!(a.last_child().elements()[0].name(), "y");
        assert_eq!(a.child_at(1).elements()[0].name(), "y");
        assert_eq!(a.child_at(9).count(), 0);

        let x = query.find("x");
        assert_eq!(x.parent().elements()[0].name(), "a");
        assert_eq!(x.ancestors().count(), 2);
        let names: Vec<String> = x.ancestors().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["a", "r"]);
        assert_eq!(x.ancestors_named("r").count(), 1);
    }

    #[test]
    fn test_closest() {
        let query = parse("<r><sec><sec><leaf/></sec></sec></r>").unwrap();
        let leaf = query.find("leaf");
        // closest finds the nearest ancestor-or-self
        let closest = leaf.closest("sec");
        assert_eq!(closest.count(), 1);
        assert_eq!(closest.elements()[0].path(), "r/sec/sec");
        assert_eq!(leaf.closest("leaf").elements()[0].path(), "r/sec/sec/leaf");
        assert_eq!(leaf.closest("zzz").count(), 0);
        assert_eq!(leaf.closest_where(|e| e.depth() == 0).count(), 1);
    }

    #[test]
    fn test_sibling_navigation() {
        let query = parse("<r><a/><b/><c/></r>").unwrap();
        let b = query.find("b");
        assert_eq!(b.siblings().count(), 2);
        assert_eq!(b.siblings_named("c").count(), 1);
        assert_eq!(b.siblings_including_self().count(), 3);
        assert_eq!(b.next_sibling().elements()[0].name(), "c");
        assert_eq!(b.previous_sibling().elements()[0].name(), "a");

        let a = query.find("a");
        assert_eq!(a.previous_sibling().count(), 0);
        let c = query.find("c");
        assert_eq!(c.next_sibling().count(), 0);
    }
}
