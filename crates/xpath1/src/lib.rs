//! XPath 1.0 subset evaluator for the dynamic element tree.
//!
//! Expressions are validated (with offset-carrying diagnostics), parsed into
//! an AST with `nom`, and evaluated against a context sequence of elements.
//! The result consumed by the query layer is a plain node list in document
//! order.

pub mod ast;
pub mod axes;
pub mod engine;
pub mod functions;
pub mod operators;
pub mod parser;
pub mod validate;

pub use ast::{Axis, BinaryOperator, Expression, LocationPath, NodeTest, Step, UnaryOperator};
pub use engine::{EvaluationContext, XPathValue, evaluate, evaluate_first, evaluate_nodes};
pub use parser::parse_expression;
pub use validate::validate;

pub use xmlq_tree::{Error, Result};
