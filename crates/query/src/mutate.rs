//! Mutations applied to every element in the sequence. All write through to
//! the underlying tree and return a set over the same sequence so chains can
//! continue.

use crate::set::QuerySet;
use xmlq_tree::ElementRef;

impl QuerySet {
    pub fn set_attr(&self, name: &str, value: &str) -> QuerySet {
        for element in self.elements() {
            element.set_attribute(name, value);
        }
        self.clone()
    }

    pub fn remove_attr(&self, name: &str) -> QuerySet {
        for element in self.elements() {
            element.remove_attribute(name);
        }
        self.clone()
    }

    pub fn set_text(&self, text: &str) -> QuerySet {
        for element in self.elements() {
            element.set_text(text);
        }
        self.clone()
    }

    /// Runs an arbitrary updater against each element.
    pub fn update_elements(&self, updater: impl Fn(&ElementRef)) -> QuerySet {
        for element in self.elements() {
            updater(element);
        }
        self.clone()
    }

    /// Detaches every element from its parent. Returns how many were
    /// actually removed (detached elements count as nothing to do).
    pub fn remove_elements(&self) -> usize {
        self.elements().iter().filter(|el| el.remove()).count()
    }

    /// Appends `child` to every element. The first target receives the
    /// element itself; further targets receive deep clones, since one node
    /// cannot be attached to multiple parents.
    pub fn append_child(&self, child: &ElementRef) -> QuerySet {
        for (i, element) in self.elements().iter().enumerate() {
            if i == 0 {
                element.add_child(child);
            } else {
                element.add_child(&child.deep_clone());
            }
        }
        self.clone()
    }

    pub fn clear_children(&self) -> QuerySet {
        for element in self.elements() {
            element.clear_children();
        }
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use crate::set::parse;
    use xmlq_tree::{ElementPatch, ElementRef, XmlWriteOptions};

    #[test]
    fn test_set_attr_and_text_chain() {
        let query = parse(r#"<x><y a="1"/></x>"#).unwrap();
        query.find("y").set_attr("a", "2").set_text("hello");
        let xml = query.elements()[0].to_xml(&XmlWriteOptions::default());
        assert!(xml.contains(r#"a="2""#));
        assert!(xml.contains(">hello<"));
    }

    #[test]
    fn test_mutations_apply_to_all() {
        let query = parse("<r><i/><i/><i/></r>").unwrap();
        let items = query.find_qualified("i").set_attr("done", "yes");
        assert_eq!(items.attr_equals("done", "yes").count(), 3);
        items.remove_attr("done");
        assert_eq!(items.has_attr("done").count(), 0);
    }

    #[test]
    fn test_update_elements() {
        let query = parse("<r><v>1</v><v>2</v></r>").unwrap();
        query
            .find("v")
            .update_elements(|el| el.update(&ElementPatch::new().name("w")));
        assert_eq!(query.find("w").count(), 2);
        assert_eq!(query.find("v").count(), 0);
    }

    #[test]
    fn test_remove_elements_returns_count() {
        let query = parse("<r><a/><b/><a/></r>").unwrap();
        let root = query.elements()[0].clone();
        let removed = query.find("a").remove_elements();
        assert_eq!(removed, 2);
        assert_eq!(root.child_count(), 1);
        // Root has no parent; nothing to do.
        assert_eq!(query.remove_elements(), 0);
    }

    #[test]
    fn test_append_child_clones_for_extra_parents() {
        let query = parse("<r><a/><b/></r>").unwrap();
        let stamp = ElementRef::new_root("stamp");
        let targets = query.children();
        targets.append_child(&stamp);

        let a = query.children_named("a");
        let b = query.children_named("b");
        assert_eq!(a.children().count(), 1);
        assert_eq!(b.children().count(), 1);
        let attached_a = a.children().first().unwrap();
        let attached_b = b.children().first().unwrap();
        // Each parent holds its own node.
        assert_ne!(attached_a, attached_b);
        assert_eq!(attached_a.path(), "r/a/stamp");
        assert_eq!(attached_b.path(), "r/b/stamp");
    }

    #[test]
    fn test_clear_children() {
        let query = parse("<r><a><x/><y/></a></r>").unwrap();
        query.children_named("a").clear_children();
        assert_eq!(query.descendants().count(), 1);
        assert!(query.children_named("a").leaves().exists());
    }
}
