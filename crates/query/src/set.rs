//! The query set core: backing sequence, factory, and parse entry points.

use std::collections::HashSet;
use std::fmt;
use xmlq_tree::{ElementRef, ParseOptions, Result, parse_document};

/// An immutable wrapper over an ordered sequence of element handles.
///
/// Operations never mutate the receiver's sequence; they build a new set via
/// the internal factory, so chains like `q.find("a").children().texts()`
/// read left to right. Mutating operations write through the handles into
/// the underlying tree but still return a fresh set for chaining.
#[derive(Clone, Default)]
pub struct QuerySet {
    elements: Vec<ElementRef>,
}

impl fmt::Debug for QuerySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySet")
            .field("count", &self.elements.len())
            .field(
                "names",
                &self
                    .elements
                    .iter()
                    .take(8)
                    .map(|e| e.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl QuerySet {
    /// An empty set.
    pub fn new() -> Self {
        QuerySet::default()
    }

    pub fn from_element(element: ElementRef) -> Self {
        QuerySet {
            elements: vec![element],
        }
    }

    pub fn from_elements(elements: Vec<ElementRef>) -> Self {
        QuerySet { elements }
    }

    /// The factory every operation uses to wrap its result sequence.
    pub(crate) fn with_elements(&self, elements: Vec<ElementRef>) -> QuerySet {
        QuerySet { elements }
    }

    pub fn elements(&self) -> &[ElementRef] {
        &self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ElementRef> {
        self.elements.iter()
    }
}

impl IntoIterator for QuerySet {
    type Item = ElementRef;
    type IntoIter = std::vec::IntoIter<ElementRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a> IntoIterator for &'a QuerySet {
    type Item = &'a ElementRef;
    type IntoIter = std::slice::Iter<'a, ElementRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

/// Keeps first occurrences, preserving order.
pub(crate) fn dedup_in_order(elements: Vec<ElementRef>) -> Vec<ElementRef> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(elements.len());
    for element in elements {
        if seen.insert(element.clone()) {
            out.push(element);
        }
    }
    out
}

/// Auto-typed numeric value: `numeric_value` when the parser set it, else a
/// parse of the text.
pub(crate) fn element_value(element: &ElementRef) -> Option<f64> {
    if let Some(n) = element.numeric_value() {
        return Some(n);
    }
    element
        .text()
        .and_then(|t| t.trim().parse::<f64>().ok())
        .filter(|n| !n.is_nan())
}

/// Parses an XML document with default options and wraps the root element.
pub fn parse(xml: &str) -> Result<QuerySet> {
    parse_with(xml, &ParseOptions::default())
}

/// Parses an XML document and wraps the root element.
pub fn parse_with(xml: &str, options: &ParseOptions) -> Result<QuerySet> {
    let document = parse_document(xml, options)?;
    Ok(QuerySet::from_element(document.root()))
}
