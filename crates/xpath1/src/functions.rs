//! Built-in XPath 1.0 function implementations and dispatch.
//!
//! Arity violations are syntax errors carrying a usage hint, as is a call to
//! a function outside the supported set.

use crate::engine::{EvaluationContext, XPathValue};
use xmlq_tree::{Error, Result};

/// Dispatches a function call to the matching implementation.
pub fn evaluate_function(
    name: &str,
    args: Vec<XPathValue>,
    e_ctx: &EvaluationContext,
) -> Result<XPathValue> {
    match name {
        // Node-set / context
        "count" => func_count(args),
        "sum" => func_sum(args),
        "position" => func_position(args, e_ctx),
        "last" => func_last(args, e_ctx),
        "text" => func_text(args, e_ctx),
        "name" => func_name(args, e_ctx),
        "local-name" => func_local_name(args, e_ctx),

        // String
        "concat" => func_concat(args),
        "starts-with" => func_starts_with(args),
        "ends-with" => func_ends_with(args),
        "contains" => func_contains(args),
        "substring-before" => func_substring_before(args),
        "substring-after" => func_substring_after(args),
        "substring" => func_substring(args),
        "string-length" => func_string_length(args, e_ctx),
        "normalize-space" => func_normalize_space(args, e_ctx),
        "translate" => func_translate(args),

        // Boolean
        "boolean" => func_boolean(args),
        "not" => func_not(args),
        "true" => func_true(args),
        "false" => func_false(args),
        "lang" => func_lang(args, e_ctx),

        // Number
        "number" => func_number(args, e_ctx),
        "floor" => func_floor(args),
        "ceiling" => func_ceiling(args),
        "round" => func_round(args),

        _ => Err(Error::syntax(format!("unknown XPath function '{name}()'"))),
    }
}

fn arity_error(usage: &str) -> Error {
    Error::syntax(format!("wrong number of arguments; usage: {usage}"))
}

// --- Node-set / context functions ---

fn func_count(args: Vec<XPathValue>) -> Result<XPathValue> {
    let [arg] = args.as_slice() else {
        return Err(arity_error("count(path)"));
    };
    let count = match arg {
        XPathValue::NodeSet(nodes) => nodes.len(),
        XPathValue::Strings(values) => values.len(),
        _ => return Err(Error::syntax("count() expects a node-set; usage: count(path)")),
    };
    Ok(XPathValue::Number(count as f64))
}

fn func_sum(args: Vec<XPathValue>) -> Result<XPathValue> {
    let [arg] = args.as_slice() else {
        return Err(arity_error("sum(path)"));
    };
    let values: Vec<String> = match arg {
        XPathValue::NodeSet(nodes) => nodes.iter().map(|n| n.string_value()).collect(),
        XPathValue::Strings(values) => values.clone(),
        _ => return Err(Error::syntax("sum() expects a node-set; usage: sum(path)")),
    };
    let total = values
        .iter()
        .map(|v| v.trim().parse::<f64>().unwrap_or(f64::NAN))
        .sum();
    Ok(XPathValue::Number(total))
}

fn func_position(args: Vec<XPathValue>, e_ctx: &EvaluationContext) -> Result<XPathValue> {
    if !args.is_empty() {
        return Err(arity_error("position()"));
    }
    Ok(XPathValue::Number(e_ctx.position as f64))
}

fn func_last(args: Vec<XPathValue>, e_ctx: &EvaluationContext) -> Result<XPathValue> {
    if !args.is_empty() {
        return Err(arity_error("last()"));
    }
    Ok(XPathValue::Number(e_ctx.size as f64))
}

/// The context element's own text: its `text` when set, otherwise its own
/// mixed-content fragments joined.
fn func_text(args: Vec<XPathValue>, e_ctx: &EvaluationContext) -> Result<XPathValue> {
    if !args.is_empty() {
        return Err(arity_error("text()"));
    }
    let element = &e_ctx.context_node;
    let text = element
        .text()
        .unwrap_or_else(|| element.text_nodes().join(""));
    Ok(XPathValue::String(text))
}

fn func_name(args: Vec<XPathValue>, e_ctx: &EvaluationContext) -> Result<XPathValue> {
    match args.as_slice() {
        [] => Ok(XPathValue::String(e_ctx.context_node.name())),
        [XPathValue::NodeSet(nodes)] => Ok(XPathValue::String(
            nodes.first().map(|n| n.name()).unwrap_or_default(),
        )),
        _ => Err(arity_error("name() or name(path)")),
    }
}

fn func_local_name(args: Vec<XPathValue>, e_ctx: &EvaluationContext) -> Result<XPathValue> {
    match args.as_slice() {
        [] => Ok(XPathValue::String(e_ctx.context_node.local_name())),
        [XPathValue::NodeSet(nodes)] => Ok(XPathValue::String(
            nodes.first().map(|n| n.local_name()).unwrap_or_default(),
        )),
        _ => Err(arity_error("local-name() or local-name(path)")),
    }
}

// --- String functions ---

fn func_concat(args: Vec<XPathValue>) -> Result<XPathValue> {
    if args.len() < 2 {
        return Err(arity_error("concat(a, b, ...)"));
    }
    Ok(XPathValue::String(
        args.iter().map(|v| v.to_string()).collect(),
    ))
}

fn two_strings(mut args: Vec<XPathValue>, usage: &str) -> Result<(String, String)> {
    if args.len() != 2 {
        return Err(arity_error(usage));
    }
    let second = args.remove(1).to_string();
    let first = args.remove(0).to_string();
    Ok((first, second))
}

fn func_starts_with(args: Vec<XPathValue>) -> Result<XPathValue> {
    let (s, prefix) = two_strings(args, "starts-with(string, prefix)")?;
    Ok(XPathValue::Boolean(s.starts_with(&prefix)))
}

fn func_ends_with(args: Vec<XPathValue>) -> Result<XPathValue> {
    let (s, suffix) = two_strings(args, "ends-with(string, suffix)")?;
    Ok(XPathValue::Boolean(s.ends_with(&suffix)))
}

fn func_contains(args: Vec<XPathValue>) -> Result<XPathValue> {
    let (s, needle) = two_strings(args, "contains(string, needle)")?;
    Ok(XPathValue::Boolean(s.contains(&needle)))
}

fn func_substring_before(args: Vec<XPathValue>) -> Result<XPathValue> {
    let (s, delimiter) = two_strings(args, "substring-before(string, delimiter)")?;
    let result = match s.find(&delimiter) {
        Some(index) => s[..index].to_string(),
        None => String::new(),
    };
    Ok(XPathValue::String(result))
}

fn func_substring_after(args: Vec<XPathValue>) -> Result<XPathValue> {
    let (s, delimiter) = two_strings(args, "substring-after(string, delimiter)")?;
    let result = match s.find(&delimiter) {
        Some(index) => s[index + delimiter.len()..].to_string(),
        None => String::new(),
    };
    Ok(XPathValue::String(result))
}

fn func_substring(mut args: Vec<XPathValue>) -> Result<XPathValue> {
    if !(2..=3).contains(&args.len()) {
        return Err(arity_error("substring(string, start[, length])"));
    }
    let length = if args.len() == 3 {
        Some(args.remove(2).to_number())
    } else {
        None
    };
    let start = args.remove(1).to_number();
    let s = args.remove(0).to_string();

    // XPath rounding rules: positions are 1-based, start/length round half-up.
    let first = (start + 0.5).floor();
    let last = match length.map(|l| (l + 0.5).floor()) {
        Some(l) => first + l,
        None => f64::INFINITY,
    };

    let result: String = s
        .chars()
        .enumerate()
        .filter_map(|(i, c)| {
            let pos = (i + 1) as f64;
            if pos >= first && pos < last { Some(c) } else { None }
        })
        .collect();
    Ok(XPathValue::String(result))
}

fn func_string_length(mut args: Vec<XPathValue>, e_ctx: &EvaluationContext) -> Result<XPathValue> {
    if args.len() > 1 {
        return Err(arity_error("string-length([string])"));
    }
    let s = if args.is_empty() {
        e_ctx.context_node.string_value()
    } else {
        args.remove(0).to_string()
    };
    Ok(XPathValue::Number(s.chars().count() as f64))
}

fn func_normalize_space(mut args: Vec<XPathValue>, e_ctx: &EvaluationContext) -> Result<XPathValue> {
    if args.len() > 1 {
        return Err(arity_error("normalize-space([string])"));
    }
    let s = if args.is_empty() {
        e_ctx.context_node.string_value()
    } else {
        args.remove(0).to_string()
    };
    let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
    Ok(XPathValue::String(normalized))
}

fn func_translate(mut args: Vec<XPathValue>) -> Result<XPathValue> {
    if args.len() != 3 {
        return Err(arity_error("translate(string, from, to)"));
    }
    let to: Vec<char> = args.remove(2).to_string().chars().collect();
    let from: Vec<char> = args.remove(1).to_string().chars().collect();
    let source = args.remove(0).to_string();
    let result: String = source
        .chars()
        .filter_map(|c| match from.iter().position(|&fc| fc == c) {
            // A 'from' char with no 'to' counterpart is deleted.
            Some(pos) => to.get(pos).copied(),
            None => Some(c),
        })
        .collect();
    Ok(XPathValue::String(result))
}

// --- Boolean functions ---

/// True iff the argument's string form is non-empty and not `"NaN"`.
fn func_boolean(args: Vec<XPathValue>) -> Result<XPathValue> {
    let [arg] = args.as_slice() else {
        return Err(arity_error("boolean(expr)"));
    };
    let s = arg.to_string();
    Ok(XPathValue::Boolean(!s.is_empty() && s != "NaN"))
}

fn func_not(mut args: Vec<XPathValue>) -> Result<XPathValue> {
    if args.len() != 1 {
        return Err(arity_error("not(expr)"));
    }
    Ok(XPathValue::Boolean(!args.remove(0).to_bool()))
}

fn func_true(args: Vec<XPathValue>) -> Result<XPathValue> {
    if !args.is_empty() {
        return Err(arity_error("true()"));
    }
    Ok(XPathValue::Boolean(true))
}

fn func_false(args: Vec<XPathValue>) -> Result<XPathValue> {
    if !args.is_empty() {
        return Err(arity_error("false()"));
    }
    Ok(XPathValue::Boolean(false))
}

/// Walks ancestor-or-self for an `xml:lang` attribute; matches the code
/// exactly or as a `code-` prefix, case-insensitively.
fn func_lang(mut args: Vec<XPathValue>, e_ctx: &EvaluationContext) -> Result<XPathValue> {
    if args.len() != 1 {
        return Err(arity_error("lang(code)"));
    }
    let code = args.remove(0).to_string().to_lowercase();
    let mut current = Some(e_ctx.context_node.clone());
    while let Some(element) = current {
        if let Some(value) = element.attribute("xml:lang") {
            let value = value.to_lowercase();
            let matches = value == code || value.starts_with(&format!("{code}-"));
            return Ok(XPathValue::Boolean(matches));
        }
        current = element.parent();
    }
    Ok(XPathValue::Boolean(false))
}

// --- Number functions ---

fn func_number(mut args: Vec<XPathValue>, e_ctx: &EvaluationContext) -> Result<XPathValue> {
    if args.len() > 1 {
        return Err(arity_error("number([value])"));
    }
    let n = if args.is_empty() {
        e_ctx
            .context_node
            .string_value()
            .trim()
            .parse()
            .unwrap_or(f64::NAN)
    } else {
        args.remove(0).to_number()
    };
    Ok(XPathValue::Number(n))
}

fn func_floor(mut args: Vec<XPathValue>) -> Result<XPathValue> {
    if args.len() != 1 {
        return Err(arity_error("floor(number)"));
    }
    Ok(XPathValue::Number(args.remove(0).to_number().floor()))
}

fn func_ceiling(mut args: Vec<XPathValue>) -> Result<XPathValue> {
    if args.len() != 1 {
        return Err(arity_error("ceiling(number)"));
    }
    Ok(XPathValue::Number(args.remove(0).to_number().ceil()))
}

fn func_round(mut args: Vec<XPathValue>) -> Result<XPathValue> {
    if args.len() != 1 {
        return Err(arity_error("round(number)"));
    }
    // XPath round: floor(x + 0.5), so -0.5 rounds to 0.
    Ok(XPathValue::Number((args.remove(0).to_number() + 0.5).floor()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmlq_tree::{ElementRef, ParseOptions, parse_document};

    fn context() -> EvaluationContext {
        let root = parse_document(
            r#"<doc xml:lang="en-US"><p>  spaced   text </p></doc>"#,
            &ParseOptions::default(),
        )
        .unwrap()
        .root();
        EvaluationContext::new(root, 1, 1)
    }

    fn child_context() -> EvaluationContext {
        let e_ctx = context();
        let p = e_ctx.context_node.children()[0].clone();
        EvaluationContext::new(p, 1, 1)
    }

    fn s(v: &str) -> XPathValue {
        XPathValue::String(v.to_string())
    }

    fn n(v: f64) -> XPathValue {
        XPathValue::Number(v)
    }

    fn call(name: &str, args: Vec<XPathValue>) -> XPathValue {
        evaluate_function(name, args, &context()).unwrap()
    }

    #[test]
    fn test_substring_one_indexed() {
        assert_eq!(call("substring", vec![s("12345"), n(2.0)]).to_string(), "2345");
        assert_eq!(
            call("substring", vec![s("12345"), n(2.0), n(3.0)]).to_string(),
            "234"
        );
        // XPath rounding: substring("12345", 1.5, 2.6) == "234"
        assert_eq!(
            call("substring", vec![s("12345"), n(1.5), n(2.6)]).to_string(),
            "234"
        );
    }

    #[test]
    fn test_substring_before_after() {
        assert_eq!(call("substring-before", vec![s("a=b"), s("=")]).to_string(), "a");
        assert_eq!(call("substring-after", vec![s("a=b"), s("=")]).to_string(), "b");
        assert_eq!(call("substring-before", vec![s("ab"), s("=")]).to_string(), "");
    }

    #[test]
    fn test_translate_deletes_unmapped() {
        assert_eq!(
            call("translate", vec![s("abcabc"), s("abc"), s("AB")]).to_string(),
            "ABAB"
        );
        assert_eq!(
            call("translate", vec![s("bare"), s("ab"), s("BA")]).to_string(),
            "BAre"
        );
    }

    #[test]
    fn test_normalize_space_collapses_runs() {
        assert_eq!(
            call("normalize-space", vec![s("  a \t b\n\nc ")]).to_string(),
            "a b c"
        );
        // 0-arg form uses the context node's string value.
        let result = evaluate_function("normalize-space", vec![], &child_context()).unwrap();
        assert_eq!(result.to_string(), "spaced text");
    }

    #[test]
    fn test_string_length_chars_not_bytes() {
        assert_eq!(call("string-length", vec![s("héllo")]).to_number(), 5.0);
    }

    #[test]
    fn test_rounding_family() {
        assert_eq!(call("floor", vec![n(2.7)]).to_number(), 2.0);
        assert_eq!(call("ceiling", vec![n(2.1)]).to_number(), 3.0);
        assert_eq!(call("round", vec![n(2.5)]).to_number(), 3.0);
        assert_eq!(call("round", vec![n(-0.5)]).to_number(), 0.0);
    }

    #[test]
    fn test_number_conversion() {
        assert_eq!(call("number", vec![s(" 42 ")]).to_number(), 42.0);
        assert!(call("number", vec![s("x")]).to_number().is_nan());
    }

    #[test]
    fn test_boolean_contract() {
        assert!(matches!(call("boolean", vec![s("x")]), XPathValue::Boolean(true)));
        assert!(matches!(call("boolean", vec![s("")]), XPathValue::Boolean(false)));
        assert!(matches!(
            call("boolean", vec![n(f64::NAN)]),
            XPathValue::Boolean(false)
        ));
        // Differs from XPath truthiness: boolean(0) is true ("0" is non-empty).
        assert!(matches!(call("boolean", vec![n(0.0)]), XPathValue::Boolean(true)));
    }

    #[test]
    fn test_lang_walks_ancestors() {
        let e_ctx = child_context();
        let result = evaluate_function("lang", vec![s("en")], &e_ctx).unwrap();
        assert!(matches!(result, XPathValue::Boolean(true)));
        let result = evaluate_function("lang", vec![s("EN-US")], &e_ctx).unwrap();
        assert!(matches!(result, XPathValue::Boolean(true)));
        let result = evaluate_function("lang", vec![s("de")], &e_ctx).unwrap();
        assert!(matches!(result, XPathValue::Boolean(false)));
    }

    #[test]
    fn test_name_functions() {
        let e_ctx = context();
        assert_eq!(evaluate_function("name", vec![], &e_ctx).unwrap().to_string(), "doc");
        assert_eq!(
            evaluate_function("local-name", vec![], &e_ctx).unwrap().to_string(),
            "doc"
        );
    }

    #[test]
    fn test_concat_requires_two() {
        let err = evaluate_function("concat", vec![s("a")], &context()).unwrap_err();
        assert!(err.to_string().contains("usage: concat"));
    }

    #[test]
    fn test_arity_errors_carry_usage() {
        let err = evaluate_function("contains", vec![s("a")], &context()).unwrap_err();
        assert!(err.to_string().contains("usage: contains(string, needle)"));
        let err = evaluate_function("substring", vec![s("a")], &context()).unwrap_err();
        assert!(err.to_string().contains("usage: substring(string, start[, length])"));
    }

    #[test]
    fn test_unknown_function() {
        let err = evaluate_function("bogus", vec![], &context()).unwrap_err();
        assert!(err.to_string().contains("unknown XPath function 'bogus()'"));
    }

    #[test]
    fn test_count_rejects_scalars() {
        let err = evaluate_function("count", vec![s("a")], &context()).unwrap_err();
        assert!(err.to_string().contains("node-set"));
        let nodes: Vec<ElementRef> = vec![context().context_node];
        let result = call("count", vec![XPathValue::NodeSet(nodes)]);
        assert_eq!(result.to_number(), 1.0);
    }
}
