//! Output operations: functional folds, JSON conversion, tree printing,
//! statistics and serialization.

use crate::set::QuerySet;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::fmt;
use xmlq_tree::{ElementRef, XmlWriteOptions};

/// Options for [`QuerySet::to_json`].
#[derive(Debug, Clone)]
pub struct JsonOptions {
    /// Collapse childless elements to a scalar (number > boolean > text >
    /// null/attribute-object).
    pub simplify_leaves: bool,
    /// A single child becomes a nested value instead of a one-element array.
    pub flatten_single: bool,
    /// Emit `"@metadata"` (name, path, depth) on every object.
    pub include_metadata: bool,
}

impl Default for JsonOptions {
    fn default() -> Self {
        JsonOptions {
            simplify_leaves: true,
            flatten_single: true,
            include_metadata: false,
        }
    }
}

/// Shape summary returned by [`QuerySet::stats`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryStats {
    pub count: usize,
    pub name_counts: HashMap<String, usize>,
    pub min_depth: usize,
    pub max_depth: usize,
    pub leaf_count: usize,
    pub with_text: usize,
    pub with_attributes: usize,
}

impl fmt::Display for QueryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} element(s), {} name(s), depth {}..{}, {} leaf/leaves, {} with text, {} with attributes",
            self.count,
            self.name_counts.len(),
            self.min_depth,
            self.max_depth,
            self.leaf_count,
            self.with_text,
            self.with_attributes,
        )
    }
}

impl QuerySet {
    // --- Functional output ---

    pub fn map<T>(&self, f: impl Fn(&ElementRef) -> T) -> Vec<T> {
        self.elements().iter().map(|el| f(el)).collect()
    }

    /// Runs `f` for each element; returns the same sequence for chaining.
    pub fn each(&self, f: impl Fn(&ElementRef)) -> QuerySet {
        for element in self.elements() {
            f(element);
        }
        self.clone()
    }

    pub fn fold<T>(&self, init: T, f: impl Fn(T, &ElementRef) -> T) -> T {
        self.elements().iter().fold(init, |acc, el| f(acc, el))
    }

    /// Keyed map of the elements; later duplicates win.
    pub fn to_map(&self, key: impl Fn(&ElementRef) -> String) -> HashMap<String, ElementRef> {
        self.elements()
            .iter()
            .map(|el| (key(el), el.clone()))
            .collect()
    }

    /// Keyed map through a value projection; later duplicates win.
    pub fn to_map_with<V>(
        &self,
        key: impl Fn(&ElementRef) -> String,
        value: impl Fn(&ElementRef) -> V,
    ) -> HashMap<String, V> {
        self.elements()
            .iter()
            .map(|el| (key(el), value(el)))
            .collect()
    }

    // --- JSON ---

    /// Converts the sequence to JSON, one value per element.
    pub fn to_json(&self, options: &JsonOptions) -> Value {
        Value::Array(
            self.elements()
                .iter()
                .map(|el| element_to_json(el, options))
                .collect(),
        )
    }

    // --- Printing & stats ---

    /// Renders an indented tree of the sequence.
    pub fn print(&self, include_attrs: bool, include_values: bool) -> String {
        let mut out = String::new();
        for element in self.elements() {
            print_element(element, 0, include_attrs, include_values, &mut out);
        }
        out
    }

    pub fn stats(&self) -> QueryStats {
        let mut stats = QueryStats {
            count: self.elements().len(),
            ..Default::default()
        };
        for (i, element) in self.elements().iter().enumerate() {
            let depth = element.depth();
            if i == 0 {
                stats.min_depth = depth;
                stats.max_depth = depth;
            } else {
                stats.min_depth = stats.min_depth.min(depth);
                stats.max_depth = stats.max_depth.max(depth);
            }
            *stats.name_counts.entry(element.name()).or_default() += 1;
            if element.is_leaf() {
                stats.leaf_count += 1;
            }
            if element.text().is_some_and(|t| !t.is_empty()) {
                stats.with_text += 1;
            }
            if !element.attributes().is_empty() {
                stats.with_attributes += 1;
            }
        }
        stats
    }

    // --- Serialization ---

    /// Serializes the first element, if any.
    pub fn to_xml(&self, options: &XmlWriteOptions) -> Option<String> {
        self.elements().first().map(|el| el.to_xml(options))
    }

    /// Serializes every element.
    pub fn to_xml_strings(&self, options: &XmlWriteOptions) -> Vec<String> {
        self.elements().iter().map(|el| el.to_xml(options)).collect()
    }
}

fn attributes_object(element: &ElementRef) -> Value {
    let mut map = Map::new();
    for (name, value) in element.attributes() {
        map.insert(name, Value::String(value));
    }
    Value::Object(map)
}

/// The element's own character data: `text`, or its mixed-content fragments
/// joined.
fn own_text(element: &ElementRef) -> Option<String> {
    if let Some(text) = element.text() {
        return Some(text);
    }
    let fragments = element.text_nodes();
    if fragments.is_empty() {
        None
    } else {
        Some(fragments.join(""))
    }
}

fn scalar_value(element: &ElementRef) -> Value {
    if let Some(n) = element.numeric_value() {
        return json!(n);
    }
    if let Some(b) = element.boolean_value() {
        return Value::Bool(b);
    }
    if let Some(t) = own_text(element) {
        return Value::String(t);
    }
    if !element.attributes().is_empty() {
        return json!({ "@attributes": attributes_object(element) });
    }
    Value::Null
}

fn element_to_json(element: &ElementRef, options: &JsonOptions) -> Value {
    let children = element.children();

    if children.is_empty() && options.simplify_leaves && !options.include_metadata {
        return scalar_value(element);
    }

    let mut map = Map::new();
    if options.include_metadata {
        map.insert(
            "@metadata".to_string(),
            json!({
                "name": element.name(),
                "path": element.path(),
                "depth": element.depth(),
            }),
        );
    }
    if !element.attributes().is_empty() {
        map.insert("@attributes".to_string(), attributes_object(element));
    }

    if let Some(text) = own_text(element) {
        if children.is_empty() {
            if let Some(n) = element.numeric_value() {
                map.insert("#value".to_string(), json!(n));
            } else if let Some(b) = element.boolean_value() {
                map.insert("#boolean".to_string(), Value::Bool(b));
            }
        }
        map.insert("#text".to_string(), Value::String(text));
    }

    // Children grouped by name, in first-appearance order.
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<ElementRef>> = HashMap::new();
    for child in children {
        let name = child.name();
        if !groups.contains_key(&name) {
            order.push(name.clone());
        }
        groups.entry(name).or_default().push(child);
    }
    for name in order {
        let group = &groups[&name];
        let value = if group.len() == 1 && options.flatten_single {
            element_to_json(&group[0], options)
        } else {
            Value::Array(group.iter().map(|c| element_to_json(c, options)).collect())
        };
        map.insert(name, value);
    }

    Value::Object(map)
}

fn print_element(
    element: &ElementRef,
    indent: usize,
    include_attrs: bool,
    include_values: bool,
    out: &mut String,
) {
    out.push_str(&"  ".repeat(indent));
    out.push_str(&element.name());
    if include_attrs {
        let attributes = element.attributes();
        if !attributes.is_empty() {
            let rendered: Vec<String> = attributes
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            out.push_str(&format!(" [{}]", rendered.join(", ")));
        }
    }
    if include_values {
        if let Some(text) = element.text() {
            out.push_str(&format!(" = \"{text}\""));
        }
    }
    out.push('\n');
    for child in element.children() {
        print_element(&child, indent + 1, include_attrs, include_values, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::set::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_map_each_fold() {
        let query = parse("<r><v>1</v><v>2</v></r>").unwrap();
        let vs = query.find("v");
        assert_eq!(vs.map(|el| el.text().unwrap_or_default()), vec!["1", "2"]);
        let total = vs.fold(0.0, |acc, el| acc + el.numeric_value().unwrap_or(0.0));
        assert_eq!(total, 3.0);
        let chained = vs.each(|_| {}).count();
        assert_eq!(chained, 2);
    }

    #[test]
    fn test_to_map() {
        let query = parse(r#"<r><i k="a">1</i><i k="b">2</i></r>"#).unwrap();
        let map = query
            .children()
            .to_map(|el| el.attribute("k").unwrap_or_default());
        assert_eq!(map.len(), 2);
        assert_eq!(map["b"].text(), Some("2".to_string()));

        let values = query.children().to_map_with(
            |el| el.attribute("k").unwrap_or_default(),
            |el| el.numeric_value().unwrap_or(0.0),
        );
        assert_eq!(values["a"], 1.0);
    }

    #[test]
    fn test_to_json_simplified() {
        let query = parse(r#"<book id="1"><title>Dune</title><price>15</price><used>true</used></book>"#)
            .unwrap();
        let value = query.to_json(&JsonOptions::default());
        assert_eq!(
            value,
            json!([{
                "@attributes": { "id": "1" },
                "title": "Dune",
                "price": 15.0,
                "used": true,
            }])
        );
    }

    #[test]
    fn test_to_json_arrays_and_flatten() {
        let query = parse("<r><v>1</v><v>2</v><w>3</w></r>").unwrap();
        let value = query.to_json(&JsonOptions::default());
        assert_eq!(value, json!([{ "v": [1.0, 2.0], "w": 3.0 }]));

        let unflattened = query.to_json(&JsonOptions {
            flatten_single: false,
            ..Default::default()
        });
        assert_eq!(unflattened, json!([{ "v": [1.0, 2.0], "w": [3.0] }]));
    }

    #[test]
    fn test_to_json_unsimplified_reserved_keys() {
        let query = parse(r#"<v u="kg">42</v>"#).unwrap();
        let value = query.to_json(&JsonOptions {
            simplify_leaves: false,
            ..Default::default()
        });
        assert_eq!(
            value,
            json!([{
                "@attributes": { "u": "kg" },
                "#value": 42.0,
                "#text": "42",
            }])
        );
    }

    #[test]
    fn test_to_json_mixed_text_and_children() {
        let query = parse("<r>note<a>1</a></r>").unwrap();
        let value = query.to_json(&JsonOptions::default());
        assert_eq!(value, json!([{ "#text": "note", "a": 1.0 }]));
    }

    #[test]
    fn test_to_json_metadata() {
        let query = parse("<r><a/></r>").unwrap();
        let value = query.to_json(&JsonOptions {
            include_metadata: true,
            ..Default::default()
        });
        let meta = &value[0]["@metadata"];
        assert_eq!(meta["name"], "r");
        assert_eq!(meta["path"], "r");
        assert_eq!(meta["depth"], 0);
        assert_eq!(value[0]["a"]["@metadata"]["depth"], 1);
    }

    #[test]
    fn test_to_json_empty_leaf_is_null() {
        let query = parse("<r><a/></r>").unwrap();
        let value = query.to_json(&JsonOptions::default());
        assert_eq!(value, json!([{ "a": null }]));
    }

    #[test]
    fn test_print() {
        let query = parse(r#"<r a="1"><x>hi</x></r>"#).unwrap();
        let rendered = query.print(true, true);
        assert_eq!(rendered, "r [a=1]\n  x = \"hi\"\n");
        let bare = query.print(false, false);
        assert_eq!(bare, "r\n  x\n");
    }

    #[test]
    fn test_stats() {
        let query = parse(r#"<r><a k="1">x</a><b><c/></b></r>"#).unwrap();
        let stats = query.depth_first().stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.min_depth, 0);
        assert_eq!(stats.max_depth, 2);
        assert_eq!(stats.leaf_count, 2);
        assert_eq!(stats.with_text, 1);
        assert_eq!(stats.with_attributes, 1);
        assert_eq!(stats.name_counts["a"], 1);
        assert!(stats.to_string().contains("4 element(s)"));
    }

    #[test]
    fn test_to_xml_first_and_all() {
        let query = parse("<r><a>1</a><b/></r>").unwrap();
        let children = query.children();
        assert_eq!(
            children.to_xml(&XmlWriteOptions::default()),
            Some("<a>1</a>".to_string())
        );
        assert_eq!(
            children.to_xml_strings(&XmlWriteOptions::default()),
            vec!["<a>1</a>", "<b/>"]
        );
        let empty = query.find("zzz");
        assert_eq!(empty.to_xml(&XmlWriteOptions::default()), None);
    }
}
