//! Chainable query sets over the dynamic element tree.
//!
//! A [`QuerySet`] wraps an ordered sequence of element handles. Every
//! operation returns a fresh set, so selection, filtering, navigation,
//! aggregation, mutation and output calls chain freely. XPath expressions
//! are delegated to the evaluator crate and their node lists wrapped back
//! into query sets.

pub mod aggregate;
pub mod content;
pub mod filter;
pub mod group;
pub mod mutate;
pub mod nav;
pub mod ns;
pub mod output;
pub mod select;
pub mod set;
pub mod xpath;

pub use filter::{MatchTemplate, MatchValue};
pub use ns::NamespaceContext;
pub use output::{JsonOptions, QueryStats};
pub use set::{QuerySet, parse, parse_with};

pub use xmlq_tree::{
    Document, ElementInit, ElementPatch, ElementRef, Error, NamePattern, ParseOptions, Result,
    XmlWriteOptions,
};
