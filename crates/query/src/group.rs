//! Grouping the sequence into keyed query sets.

use crate::set::QuerySet;
use std::collections::HashMap;
use xmlq_tree::ElementRef;

impl QuerySet {
    /// Groups by an arbitrary string key.
    pub fn group_by(&self, selector: impl Fn(&ElementRef) -> String) -> HashMap<String, QuerySet> {
        let mut buckets: HashMap<String, Vec<ElementRef>> = HashMap::new();
        for element in self.elements() {
            buckets
                .entry(selector(element))
                .or_default()
                .push(element.clone());
        }
        buckets
            .into_iter()
            .map(|(key, elements)| (key, self.with_elements(elements)))
            .collect()
    }

    pub fn group_by_name(&self) -> HashMap<String, QuerySet> {
        self.group_by(|el| el.name())
    }

    /// Groups by prefix; elements without one land in the `""` bucket.
    pub fn group_by_namespace(&self) -> HashMap<String, QuerySet> {
        self.group_by(|el| el.prefix().unwrap_or_default())
    }

    /// Groups by the value of `name`; elements without the attribute land in
    /// the `""` bucket.
    pub fn group_by_attribute(&self, name: &str) -> HashMap<String, QuerySet> {
        self.group_by(|el| el.attribute(name).unwrap_or_default())
    }

    pub fn group_by_depth(&self) -> HashMap<usize, QuerySet> {
        let mut buckets: HashMap<usize, Vec<ElementRef>> = HashMap::new();
        for element in self.elements() {
            buckets
                .entry(element.depth())
                .or_default()
                .push(element.clone());
        }
        buckets
            .into_iter()
            .map(|(key, elements)| (key, self.with_elements(elements)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::set::parse;

    #[test]
    fn test_group_by_name() {
        let query = parse("<r><a/><b/><a/></r>").unwrap();
        let groups = query.children().group_by_name();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["a"].count(), 2);
        assert_eq!(groups["b"].count(), 1);
    }

    #[test]
    fn test_group_by_namespace_reserved_bucket() {
        let query = parse(r#"<r xmlns:p="u" xmlns:q="v"><p:a/><q:b/><c/></r>"#).unwrap();
        let groups = query.children().group_by_namespace();
        assert_eq!(groups["p"].count(), 1);
        assert_eq!(groups["q"].count(), 1);
        assert_eq!(groups[""].count(), 1);
    }

    #[test]
    fn test_group_by_attribute() {
        let query = parse(r#"<r><i c="x"/><i c="y"/><i c="x"/><i/></r>"#).unwrap();
        let groups = query.children().group_by_attribute("c");
        assert_eq!(groups["x"].count(), 2);
        assert_eq!(groups["y"].count(), 1);
        assert_eq!(groups[""].count(), 1);
    }

    #[test]
    fn test_group_by_depth() {
        let query = parse("<r><a><x/></a><b/></r>").unwrap();
        let groups = query.depth_first().group_by_depth();
        assert_eq!(groups[&0].count(), 1);
        assert_eq!(groups[&1].count(), 2);
        assert_eq!(groups[&2].count(), 1);
    }

    #[test]
    fn test_group_by_custom() {
        let query = parse("<r><v>1</v><v>22</v><v>3</v></r>").unwrap();
        let groups = query
            .children()
            .group_by(|el| el.text().unwrap_or_default().len().to_string());
        assert_eq!(groups["1"].count(), 2);
        assert_eq!(groups["2"].count(), 1);
    }
}
