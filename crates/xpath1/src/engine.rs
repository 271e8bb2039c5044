//! The evaluation engine for executing a parsed XPath AST against the tree.

use crate::ast::{Axis, BinaryOperator, Expression, LocationPath, NodeTest, Step, UnaryOperator};
use crate::{axes, functions, operators, parser};
use std::collections::HashSet;
use std::fmt;
use xmlq_tree::{ElementRef, Result};

/// The possible result types of an XPath expression evaluation.
///
/// `Strings` is the value form of a trailing attribute step (`@price`):
/// the tree has a single element node type, so attribute results surface as
/// their string values rather than as nodes.
#[derive(Debug, Clone)]
pub enum XPathValue {
    NodeSet(Vec<ElementRef>),
    Strings(Vec<String>),
    String(String),
    Number(f64),
    Boolean(bool),
}

impl XPathValue {
    /// Coerces to a boolean as per XPath 1.0 rules.
    pub fn to_bool(&self) -> bool {
        match self {
            XPathValue::NodeSet(nodes) => !nodes.is_empty(),
            XPathValue::Strings(values) => !values.is_empty(),
            XPathValue::String(s) => !s.is_empty(),
            XPathValue::Number(n) => *n != 0.0 && !n.is_nan(),
            XPathValue::Boolean(b) => *b,
        }
    }

    /// Coerces to a number as per XPath 1.0 rules.
    pub fn to_number(&self) -> f64 {
        match self {
            XPathValue::Number(n) => *n,
            XPathValue::String(s) => s.trim().parse().unwrap_or(f64::NAN),
            XPathValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            XPathValue::NodeSet(nodes) => {
                let s = nodes.first().map(|n| n.string_value()).unwrap_or_default();
                s.trim().parse().unwrap_or(f64::NAN)
            }
            XPathValue::Strings(values) => {
                let s = values.first().cloned().unwrap_or_default();
                s.trim().parse().unwrap_or(f64::NAN)
            }
        }
    }
}

impl fmt::Display for XPathValue {
    /// Coerces to a string as per XPath 1.0 rules (first node of a set).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XPathValue::NodeSet(nodes) => write!(
                f,
                "{}",
                nodes.first().map(|n| n.string_value()).unwrap_or_default()
            ),
            XPathValue::Strings(values) => {
                write!(f, "{}", values.first().cloned().unwrap_or_default())
            }
            XPathValue::String(s) => write!(f, "{s}"),
            XPathValue::Number(n) => write!(f, "{n}"),
            XPathValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// All state needed while evaluating one expression.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    pub context_node: ElementRef,
    pub root_node: ElementRef,
    /// 1-based position within the current candidate set.
    pub position: usize,
    pub size: usize,
}

impl EvaluationContext {
    pub fn new(context_node: ElementRef, position: usize, size: usize) -> Self {
        let root_node = context_node.root();
        EvaluationContext {
            context_node,
            root_node,
            position,
            size,
        }
    }
}

/// Sorts a node list into document order (arena, then root-relative path).
pub fn document_order_sort(nodes: &mut Vec<ElementRef>) {
    nodes.sort_by_cached_key(|n| (n.arena_token(), n.document_order_key()));
}

/// Compiles and evaluates `expr`, returning the matching elements in
/// document order. This is the entry point the query layer consumes.
pub fn evaluate_nodes(expr: &str, context: &[ElementRef]) -> Result<Vec<ElementRef>> {
    let parsed = parser::parse_expression(expr)?;
    log::debug!(
        "evaluating XPath '{expr}' over {} context element(s)",
        context.len()
    );

    let mut branches = Vec::new();
    collect_union_branches(&parsed, &mut branches);
    if branches.len() > 1 {
        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for branch in branches {
            for node in evaluate_branch(branch, context)? {
                if seen.insert(node.clone()) {
                    merged.push(node);
                }
            }
        }
        document_order_sort(&mut merged);
        Ok(merged)
    } else {
        evaluate_branch(&parsed, context)
    }
}

/// First match of `expr`, if any.
pub fn evaluate_first(expr: &str, context: &[ElementRef]) -> Result<Option<ElementRef>> {
    Ok(evaluate_nodes(expr, context)?.into_iter().next())
}

fn collect_union_branches<'e>(expr: &'e Expression, branches: &mut Vec<&'e Expression>) {
    match expr {
        Expression::BinaryOp {
            left,
            op: BinaryOperator::Union,
            right,
        } => {
            collect_union_branches(left, branches);
            collect_union_branches(right, branches);
        }
        other => branches.push(other),
    }
}

fn evaluate_branch(expr: &Expression, context: &[ElementRef]) -> Result<Vec<ElementRef>> {
    match expr {
        Expression::LocationPath(path) => evaluate_path(path, context),
        other => {
            // A non-path expression only yields nodes if it evaluates to a
            // node-set (e.g. a parenthesised path).
            let Some(first) = context.first() else {
                return Ok(Vec::new());
            };
            let e_ctx = EvaluationContext::new(first.clone(), 1, context.len());
            match evaluate(other, &e_ctx)? {
                XPathValue::NodeSet(nodes) => Ok(nodes),
                _ => Ok(Vec::new()),
            }
        }
    }
}

/// Evaluates a location path over a context sequence.
pub fn evaluate_path(path: &LocationPath, context: &[ElementRef]) -> Result<Vec<ElementRef>> {
    let mut current: Vec<ElementRef> = if path.is_absolute {
        let mut seen = HashSet::new();
        let mut roots = Vec::new();
        for element in context {
            let root = element.root();
            if seen.insert(root.clone()) {
                roots.push(root);
            }
        }
        roots
    } else {
        context.to_vec()
    };

    for step in &path.steps {
        if current.is_empty() {
            break;
        }
        current = evaluate_step(step, &current)?;
    }
    Ok(current)
}

/// Evaluates one step. A bare name step first retains context elements that
/// themselves match the name (so `/root/child` root-matches and `//name`
/// includes the context); only when none match does it descend to children.
/// Wildcard tests always mean "all children", and explicit axes are
/// evaluated directly.
fn evaluate_step(step: &Step, context: &[ElementRef]) -> Result<Vec<ElementRef>> {
    let candidates = if step.axis == Axis::Attribute {
        // The attribute axis yields no element nodes.
        Vec::new()
    } else if !step.explicit_axis && matches!(step.node_test, NodeTest::Name(_)) {
        let self_matches: Vec<ElementRef> = context
            .iter()
            .filter(|el| node_test_matches(el, &step.node_test))
            .cloned()
            .collect();
        if self_matches.is_empty() {
            collect_axis(Axis::Child, context, &step.node_test)
        } else {
            self_matches
        }
    } else {
        collect_axis(step.axis, context, &step.node_test)
    };
    apply_predicates(&candidates, &step.predicates)
}

/// Stage 1 + 2: collect along the axis, then filter by node test.
fn collect_axis(axis: Axis, context: &[ElementRef], test: &NodeTest) -> Vec<ElementRef> {
    let mut seen = HashSet::new();
    let mut results = Vec::new();
    for node in context {
        match axis {
            Axis::Child => axes::collect_child_nodes(node, &mut seen, &mut results),
            Axis::Descendant => axes::collect_descendant_nodes(node, &mut seen, &mut results),
            Axis::DescendantOrSelf => {
                axes::collect_descendant_or_self_nodes(node, &mut seen, &mut results)
            }
            Axis::Parent => axes::collect_parent_nodes(node, &mut seen, &mut results),
            Axis::Ancestor => axes::collect_ancestor_nodes(node, &mut seen, &mut results),
            Axis::AncestorOrSelf => {
                axes::collect_ancestor_or_self_nodes(node, &mut seen, &mut results)
            }
            Axis::SelfAxis => axes::collect_self_nodes(node, &mut seen, &mut results),
            Axis::FollowingSibling => {
                axes::collect_following_sibling_nodes(node, &mut seen, &mut results)
            }
            Axis::PrecedingSibling => {
                axes::collect_preceding_sibling_nodes(node, &mut seen, &mut results)
            }
            Axis::Following => axes::collect_following_nodes(node, &mut seen, &mut results),
            Axis::Preceding => axes::collect_preceding_nodes(node, &mut seen, &mut results),
            Axis::Attribute => {}
        }
    }
    results.retain(|n| node_test_matches(n, test));
    results
}

pub(crate) fn node_test_matches(element: &ElementRef, test: &NodeTest) -> bool {
    match test {
        NodeTest::Name(name) => {
            if name.contains(':') {
                element.name() == *name
            } else {
                element.name() == *name || element.local_name() == *name
            }
        }
        NodeTest::Wildcard | NodeTest::Node => true,
        NodeTest::PrefixWildcard(prefix) => element.prefix().as_deref() == Some(prefix),
    }
}

/// Stage 3: apply predicates in written order, 1-indexed; each operates on
/// the survivors of the previous one. A numeric result is positional.
fn apply_predicates(nodes: &[ElementRef], predicates: &[Expression]) -> Result<Vec<ElementRef>> {
    let mut final_nodes = nodes.to_vec();
    for predicate in predicates {
        let size = final_nodes.len();
        let mut kept = Vec::new();
        for (i, node) in final_nodes.iter().enumerate() {
            let e_ctx = EvaluationContext::new(node.clone(), i + 1, size);
            let result = evaluate(predicate, &e_ctx)?;
            let keep = match result {
                XPathValue::Number(n) => (n as usize) == (i + 1),
                other => other.to_bool(),
            };
            if keep {
                kept.push(node.clone());
            }
        }
        final_nodes = kept;
    }
    Ok(final_nodes)
}

/// Evaluates a compiled expression to a concrete value.
pub fn evaluate(expr: &Expression, e_ctx: &EvaluationContext) -> Result<XPathValue> {
    match expr {
        Expression::Literal(s) => Ok(XPathValue::String(s.clone())),
        Expression::Number(n) => Ok(XPathValue::Number(*n)),
        Expression::LocationPath(path) => evaluate_path_value(path, e_ctx),
        Expression::FunctionCall { name, args } => {
            let mut evaluated_args = Vec::with_capacity(args.len());
            for arg in args {
                evaluated_args.push(evaluate(arg, e_ctx)?);
            }
            functions::evaluate_function(name, evaluated_args, e_ctx)
        }
        Expression::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => {
            if !evaluate(left, e_ctx)?.to_bool() {
                return Ok(XPathValue::Boolean(false));
            }
            Ok(XPathValue::Boolean(evaluate(right, e_ctx)?.to_bool()))
        }
        Expression::BinaryOp {
            left,
            op: BinaryOperator::Or,
            right,
        } => {
            if evaluate(left, e_ctx)?.to_bool() {
                return Ok(XPathValue::Boolean(true));
            }
            Ok(XPathValue::Boolean(evaluate(right, e_ctx)?.to_bool()))
        }
        Expression::BinaryOp { left, op, right } => {
            let left_val = evaluate(left, e_ctx)?;
            let right_val = evaluate(right, e_ctx)?;
            operators::evaluate(*op, left_val, right_val)
        }
        Expression::UnaryOp { op, expr } => {
            let val = evaluate(expr, e_ctx)?;
            match op {
                UnaryOperator::Minus => Ok(XPathValue::Number(-val.to_number())),
            }
        }
    }
}

/// A path in value position. A trailing attribute step resolves to the
/// matched attributes' string values; everything else is a node-set.
fn evaluate_path_value(path: &LocationPath, e_ctx: &EvaluationContext) -> Result<XPathValue> {
    if let Some((last, prefix_steps)) = path.steps.split_last() {
        if last.axis == Axis::Attribute {
            let base = if prefix_steps.is_empty() {
                if path.is_absolute {
                    vec![e_ctx.root_node.clone()]
                } else {
                    vec![e_ctx.context_node.clone()]
                }
            } else {
                let prefix_path = LocationPath {
                    is_absolute: path.is_absolute,
                    steps: prefix_steps.to_vec(),
                };
                evaluate_path(&prefix_path, &[e_ctx.context_node.clone()])?
            };

            let mut values = Vec::new();
            for element in &base {
                match &last.node_test {
                    NodeTest::Name(name) => {
                        if let Some(value) = element.attribute(name) {
                            values.push(value);
                        }
                    }
                    NodeTest::Wildcard | NodeTest::Node => {
                        values.extend(element.attributes().into_iter().map(|(_, v)| v));
                    }
                    NodeTest::PrefixWildcard(prefix) => {
                        let marker = format!("{prefix}:");
                        values.extend(
                            element
                                .attributes()
                                .into_iter()
                                .filter(|(k, _)| k.starts_with(&marker))
                                .map(|(_, v)| v),
                        );
                    }
                }
            }
            return Ok(XPathValue::Strings(values));
        }
    }
    evaluate_path(path, std::slice::from_ref(&e_ctx.context_node)).map(XPathValue::NodeSet)
}
