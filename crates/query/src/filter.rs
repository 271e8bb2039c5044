//! Filters over the current sequence: attributes, text, auto-typed values,
//! structure, and template matching.

use crate::set::{QuerySet, element_value};
use regex::Regex;
use xmlq_tree::{ElementRef, NamePattern};

/// The value side of a [`MatchTemplate`] rule.
pub enum MatchValue {
    Literal(String),
    Pattern(Regex),
    Predicate(Box<dyn Fn(&str) -> bool>),
}

impl MatchValue {
    fn matches(&self, value: &str) -> bool {
        match self {
            MatchValue::Literal(expected) => value == expected,
            MatchValue::Pattern(re) => re.is_match(value),
            MatchValue::Predicate(pred) => pred(value),
        }
    }
}

impl From<&str> for MatchValue {
    fn from(v: &str) -> Self {
        MatchValue::Literal(v.to_string())
    }
}

impl From<String> for MatchValue {
    fn from(v: String) -> Self {
        MatchValue::Literal(v)
    }
}

impl From<Regex> for MatchValue {
    fn from(re: Regex) -> Self {
        MatchValue::Pattern(re)
    }
}

impl MatchValue {
    pub fn predicate(pred: impl Fn(&str) -> bool + 'static) -> Self {
        MatchValue::Predicate(Box::new(pred))
    }
}

/// A set of dotted-path rules for [`QuerySet::where_matches`]. Paths address
/// element fields (`name`, `prefix`, `local_name`, `namespace_uri`, `text`,
/// `path`, `depth`) or attributes (`attributes.<name>`); every rule must
/// match.
#[derive(Default)]
pub struct MatchTemplate {
    rules: Vec<(String, MatchValue)>,
}

impl MatchTemplate {
    pub fn new() -> Self {
        MatchTemplate::default()
    }

    pub fn with(mut self, path: impl Into<String>, value: impl Into<MatchValue>) -> Self {
        self.rules.push((path.into(), value.into()));
        self
    }
}

/// Resolves a dotted path against an element; `None` when the field is
/// absent, which fails the rule.
fn resolve_field(element: &ElementRef, path: &str) -> Option<String> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    match (head, rest) {
        ("name", None) => Some(element.name()),
        ("prefix", None) => element.prefix(),
        ("local_name", None) => Some(element.local_name()),
        ("namespace_uri", None) => element.namespace_uri(),
        ("text", None) => element.text(),
        ("path", None) => Some(element.path()),
        ("depth", None) => Some(element.depth().to_string()),
        ("attributes", Some(attr)) => element.attribute(attr),
        _ => None,
    }
}

impl QuerySet {
    pub(crate) fn filtered(&self, predicate: impl Fn(&ElementRef) -> bool) -> QuerySet {
        self.with_elements(
            self.elements()
                .iter()
                .filter(|el| predicate(el))
                .cloned()
                .collect(),
        )
    }

    fn pattern_filtered(
        &self,
        pattern: impl Into<NamePattern>,
        value_of: impl Fn(&ElementRef) -> Option<String>,
    ) -> QuerySet {
        match pattern.into().compile() {
            Ok(re) => self.filtered(|el| value_of(el).is_some_and(|v| re.is_match(&v))),
            // Unreachable: wildcard translation escapes every metacharacter.
            Err(_) => self.with_elements(Vec::new()),
        }
    }

    // --- Attribute filters ---

    pub fn has_attr(&self, name: &str) -> QuerySet {
        self.filtered(|el| el.has_attribute(name))
    }

    pub fn attr_equals(&self, name: &str, value: &str) -> QuerySet {
        self.filtered(|el| el.attribute(name).as_deref() == Some(value))
    }

    /// Attribute value matched against a regex or wildcard pattern.
    pub fn attr_matches(&self, name: &str, pattern: impl Into<NamePattern>) -> QuerySet {
        let name = name.to_string();
        self.pattern_filtered(pattern, move |el| el.attribute(&name))
    }

    pub fn attr_where(&self, name: &str, predicate: impl Fn(&str) -> bool) -> QuerySet {
        self.filtered(|el| el.attribute(name).is_some_and(|v| predicate(&v)))
    }

    // --- Text filters ---

    pub fn text_equals(&self, value: &str) -> QuerySet {
        self.filtered(|el| el.text().as_deref() == Some(value))
    }

    pub fn text_contains(&self, needle: &str) -> QuerySet {
        self.filtered(|el| el.text().is_some_and(|t| t.contains(needle)))
    }

    pub fn text_starts_with(&self, prefix: &str) -> QuerySet {
        self.filtered(|el| el.text().is_some_and(|t| t.starts_with(prefix)))
    }

    pub fn text_ends_with(&self, suffix: &str) -> QuerySet {
        self.filtered(|el| el.text().is_some_and(|t| t.ends_with(suffix)))
    }

    pub fn text_matches(&self, pattern: impl Into<NamePattern>) -> QuerySet {
        self.pattern_filtered(pattern, |el| el.text())
    }

    pub fn text_where(&self, predicate: impl Fn(&str) -> bool) -> QuerySet {
        self.filtered(|el| el.text().is_some_and(|t| predicate(&t)))
    }

    /// Elements with non-empty text.
    pub fn has_text(&self) -> QuerySet {
        self.filtered(|el| el.text().is_some_and(|t| !t.is_empty()))
    }

    // --- Numeric value filters ---

    pub fn value_equals(&self, value: f64) -> QuerySet {
        self.filtered(|el| element_value(el) == Some(value))
    }

    pub fn value_greater_than(&self, threshold: f64) -> QuerySet {
        self.filtered(|el| element_value(el).is_some_and(|v| v > threshold))
    }

    pub fn value_less_than(&self, threshold: f64) -> QuerySet {
        self.filtered(|el| element_value(el).is_some_and(|v| v < threshold))
    }

    /// Inclusive on both bounds.
    pub fn value_between(&self, low: f64, high: f64) -> QuerySet {
        self.filtered(|el| element_value(el).is_some_and(|v| v >= low && v <= high))
    }

    pub fn value_where(&self, predicate: impl Fn(f64) -> bool) -> QuerySet {
        self.filtered(|el| element_value(el).is_some_and(&predicate))
    }

    pub fn has_value(&self) -> QuerySet {
        self.filtered(|el| element_value(el).is_some())
    }

    // --- Boolean filters ---

    pub fn bool_equals(&self, value: bool) -> QuerySet {
        self.filtered(|el| el.boolean_value() == Some(value))
    }

    pub fn has_bool(&self) -> QuerySet {
        self.filtered(|el| el.boolean_value().is_some())
    }

    // --- Structural filters ---

    pub fn has_children(&self) -> QuerySet {
        self.filtered(|el| el.has_children())
    }

    pub fn leaves(&self) -> QuerySet {
        self.filtered(|el| el.is_leaf())
    }

    pub fn child_count_where(&self, predicate: impl Fn(usize) -> bool) -> QuerySet {
        self.filtered(|el| predicate(el.child_count()))
    }

    pub fn at_depth(&self, depth: usize) -> QuerySet {
        self.filtered(|el| el.depth() == depth)
    }

    /// Elements at `depth` or deeper.
    pub fn min_depth(&self, depth: usize) -> QuerySet {
        self.filtered(|el| el.depth() >= depth)
    }

    /// Elements at `depth` or shallower.
    pub fn max_depth(&self, depth: usize) -> QuerySet {
        self.filtered(|el| el.depth() <= depth)
    }

    pub fn path_equals(&self, path: &str) -> QuerySet {
        self.filtered(|el| el.path() == path)
    }

    pub fn path_matches(&self, pattern: impl Into<NamePattern>) -> QuerySet {
        self.pattern_filtered(pattern, |el| Some(el.path()))
    }

    // --- Advanced filters ---

    /// Keep elements satisfying `predicate(element, index)`. Named with a
    /// trailing underscore because `where` is a keyword.
    pub fn where_(&self, predicate: impl Fn(&ElementRef, usize) -> bool) -> QuerySet {
        self.with_elements(
            self.elements()
                .iter()
                .enumerate()
                .filter(|(i, el)| predicate(el, *i))
                .map(|(_, el)| el.clone())
                .collect(),
        )
    }

    /// Keep elements satisfying every predicate.
    pub fn where_all(&self, predicates: &[&dyn Fn(&ElementRef) -> bool]) -> QuerySet {
        self.filtered(|el| predicates.iter().all(|p| p(el)))
    }

    /// Keep elements satisfying at least one predicate.
    pub fn where_any(&self, predicates: &[&dyn Fn(&ElementRef) -> bool]) -> QuerySet {
        self.filtered(|el| predicates.iter().any(|p| p(el)))
    }

    /// The first element satisfying every predicate, as a set of at most one.
    pub fn select_first(&self, predicates: &[&dyn Fn(&ElementRef) -> bool]) -> QuerySet {
        let found = self
            .elements()
            .iter()
            .find(|el| predicates.iter().all(|p| p(el)))
            .cloned();
        self.with_elements(found.into_iter().collect())
    }

    /// Keep elements matching every dotted-path rule of the template.
    pub fn where_matches(&self, template: &MatchTemplate) -> QuerySet {
        self.filtered(|el| {
            template.rules.iter().all(|(path, value)| {
                resolve_field(el, path).is_some_and(|field| value.matches(&field))
            })
        })
    }
}
