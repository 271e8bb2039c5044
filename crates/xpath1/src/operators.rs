//! Evaluation of binary operators over XPath values.
//!
//! Comparisons are numeric when both operands parse as finite numbers and
//! lexicographic on the string forms otherwise. `and`/`or` are also handled
//! here for completeness, though the engine short-circuits them before
//! reaching this module.

use crate::ast::BinaryOperator;
use crate::engine::{XPathValue, document_order_sort};
use std::collections::HashSet;
use xmlq_tree::{Error, Result};

pub fn evaluate(op: BinaryOperator, left: XPathValue, right: XPathValue) -> Result<XPathValue> {
    match op {
        BinaryOperator::Or => Ok(XPathValue::Boolean(left.to_bool() || right.to_bool())),
        BinaryOperator::And => Ok(XPathValue::Boolean(left.to_bool() && right.to_bool())),

        BinaryOperator::Equals
        | BinaryOperator::NotEquals
        | BinaryOperator::LessThan
        | BinaryOperator::LessThanOrEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterThanOrEqual => Ok(XPathValue::Boolean(compare(op, &left, &right))),

        BinaryOperator::Plus => Ok(XPathValue::Number(left.to_number() + right.to_number())),
        BinaryOperator::Minus => Ok(XPathValue::Number(left.to_number() - right.to_number())),
        BinaryOperator::Multiply => Ok(XPathValue::Number(left.to_number() * right.to_number())),
        BinaryOperator::Divide => Ok(XPathValue::Number(left.to_number() / right.to_number())),
        BinaryOperator::Modulo => Ok(XPathValue::Number(left.to_number() % right.to_number())),

        BinaryOperator::Union => union(left, right),
    }
}

fn compare(op: BinaryOperator, left: &XPathValue, right: &XPathValue) -> bool {
    let left_str = left.to_string();
    let right_str = right.to_string();
    let numeric = (
        left_str.trim().parse::<f64>(),
        right_str.trim().parse::<f64>(),
    );
    if let (Ok(l), Ok(r)) = numeric {
        if l.is_finite() && r.is_finite() {
            return match op {
                BinaryOperator::Equals => l == r,
                BinaryOperator::NotEquals => l != r,
                BinaryOperator::LessThan => l < r,
                BinaryOperator::LessThanOrEqual => l <= r,
                BinaryOperator::GreaterThan => l > r,
                BinaryOperator::GreaterThanOrEqual => l >= r,
                _ => false,
            };
        }
    }
    match op {
        BinaryOperator::Equals => left_str == right_str,
        BinaryOperator::NotEquals => left_str != right_str,
        BinaryOperator::LessThan => left_str < right_str,
        BinaryOperator::LessThanOrEqual => left_str <= right_str,
        BinaryOperator::GreaterThan => left_str > right_str,
        BinaryOperator::GreaterThanOrEqual => left_str >= right_str,
        _ => false,
    }
}

fn union(left: XPathValue, right: XPathValue) -> Result<XPathValue> {
    match (left, right) {
        (XPathValue::NodeSet(mut l), XPathValue::NodeSet(r)) => {
            let mut seen: HashSet<_> = l.iter().cloned().collect();
            for node in r {
                if seen.insert(node.clone()) {
                    l.push(node);
                }
            }
            document_order_sort(&mut l);
            Ok(XPathValue::NodeSet(l))
        }
        _ => Err(Error::syntax("the union operator '|' requires node-sets on both sides")),
    }
}
