//! xmlq: a self-contained XML processing engine.
//!
//! Three tightly coupled layers, each its own crate:
//!
//! - [`xmlq_tree`]: a recursive-descent parser producing a mutable,
//!   arena-backed element tree with parent/child/sibling linkage, mixed
//!   content, CDATA, comments, entity decoding and hierarchical namespace
//!   resolution.
//! - [`xmlq_query`]: chainable query sets over that tree: selection,
//!   filtering, navigation, aggregation, grouping, mutation and output.
//! - [`xmlq_xpath1`]: an XPath 1.0 subset evaluator (absolute/relative
//!   paths, predicates, axes, functions, arithmetic, unions) whose node
//!   lists feed straight back into query sets.
//!
//! ```
//! let query = xmlq::parse("<root><a>1</a><a>2</a></root>")?;
//! assert_eq!(query.find("a").texts(), vec!["1", "2"]);
//! assert_eq!(query.find("a").sum(), 3.0);
//! assert_eq!(query.xpath("//a[text()='2']")?.count(), 1);
//! # Ok::<(), xmlq::Error>(())
//! ```

pub use xmlq_query::{
    JsonOptions, MatchTemplate, MatchValue, NamespaceContext, QuerySet, QueryStats, parse,
    parse_with,
};
pub use xmlq_tree::{
    Document, ElementInit, ElementPatch, ElementRef, Error, NamePattern, ParseOptions, Result,
    XmlWriteOptions, parse_document, wildcard_to_regex,
};
pub use xmlq_xpath1::{XPathValue, evaluate_first, evaluate_nodes, parse_expression, validate};

// The crates these types come from, for version-matched construction of
// `NamePattern::Regex` patterns and consumption of `to_json` values.
pub use regex;
pub use serde_json;
