//! Mixed-content access: text fragments, comments, and combined text.

use crate::set::QuerySet;
use std::collections::HashSet;
use xmlq_tree::ElementRef;

fn collect_descendant_or_self(
    element: &ElementRef,
    seen: &mut HashSet<ElementRef>,
    out: &mut Vec<ElementRef>,
) {
    if seen.insert(element.clone()) {
        out.push(element.clone());
    }
    for child in element.children() {
        collect_descendant_or_self(&child, seen, out);
    }
}

impl QuerySet {
    fn subtree_elements(&self) -> Vec<ElementRef> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for element in self.elements() {
            collect_descendant_or_self(element, &mut seen, &mut out);
        }
        out
    }

    /// The elements' own mixed-content text fragments, in order.
    pub fn text_nodes(&self) -> Vec<String> {
        self.elements()
            .iter()
            .flat_map(|el| el.text_nodes())
            .collect()
    }

    /// Text fragments of the elements and all their descendants.
    pub fn all_text_nodes(&self) -> Vec<String> {
        self.subtree_elements()
            .iter()
            .flat_map(|el| el.text_nodes())
            .collect()
    }

    /// Per element: its own text plus all descendants' text, concatenated in
    /// document order. Empty results are skipped.
    pub fn all_text(&self) -> Vec<String> {
        self.elements()
            .iter()
            .map(|el| el.string_value())
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// The elements' own comments, in order.
    pub fn comments(&self) -> Vec<String> {
        self.elements()
            .iter()
            .flat_map(|el| el.comments())
            .collect()
    }

    /// Comments of the elements and all their descendants.
    pub fn all_comments(&self) -> Vec<String> {
        self.subtree_elements()
            .iter()
            .flat_map(|el| el.comments())
            .collect()
    }

    /// Elements (in the subtrees of the sequence) holding true mixed
    /// content.
    pub fn has_mixed_content(&self) -> QuerySet {
        let out: Vec<ElementRef> = self
            .subtree_elements()
            .into_iter()
            .filter(|el| el.has_mixed_content())
            .collect();
        self.with_elements(out)
    }

    /// Elements (in the subtrees of the sequence) carrying comments.
    pub fn has_comments(&self) -> QuerySet {
        let out: Vec<ElementRef> = self
            .subtree_elements()
            .into_iter()
            .filter(|el| el.has_comments())
            .collect();
        self.with_elements(out)
    }
}

#[cfg(test)]
mod tests {
    use crate::set::parse;

    #[test]
    fn test_mixed_content_scenario() {
        let query = parse("<p>Hi <b>there</b> friend</p>").unwrap();
        let fragments = query.text_nodes();
        assert!(fragments.contains(&"Hi ".to_string()));
        assert!(fragments.contains(&" friend".to_string()));
        assert_eq!(query.elements()[0].children().len(), 1);
        assert_eq!(query.all_text(), vec!["Hi there friend"]);
        assert_eq!(query.has_mixed_content().count(), 1);
    }

    #[test]
    fn test_all_text_nodes_descend() {
        let query = parse("<r><p>a <i>x</i> b</p><q>plain</q></r>").unwrap();
        assert_eq!(query.text_nodes().len(), 0);
        assert_eq!(query.all_text_nodes(), vec!["a ", " b"]);
        assert_eq!(query.all_text(), vec!["a x bplain"]);
    }

    #[test]
    fn test_comments() {
        let query = parse("<r><a><!-- one --></a><b><c><!-- two --></c></b></r>").unwrap();
        assert_eq!(query.comments().len(), 0);
        assert_eq!(
            query.all_comments(),
            vec![" one ".to_string(), " two ".to_string()]
        );
        assert_eq!(query.has_comments().count(), 2);
        let a = query.find_qualified("a");
        assert_eq!(a.comments(), vec![" one ".to_string()]);
    }

    #[test]
    fn test_no_mixed_content() {
        let query = parse("<r><a>plain</a></r>").unwrap();
        assert_eq!(query.has_mixed_content().count(), 0);
        assert!(query.text_nodes().is_empty());
    }
}
