//! Pre-evaluation validation of XPath expressions.
//!
//! The nom grammar reports failures, but without useful positions; this pass
//! runs first and produces offset-carrying diagnostics (±20-char snippet and
//! caret) for the malformations a caller is most likely to write.

use xmlq_tree::{Error, Result};

const VALID_AXES: [&str; 12] = [
    "child",
    "descendant",
    "descendant-or-self",
    "parent",
    "ancestor",
    "ancestor-or-self",
    "self",
    "following-sibling",
    "preceding-sibling",
    "following",
    "preceding",
    "attribute",
];

/// Checks delimiter balance, `&&`/`||`, empty predicates, variables and axis
/// names. Returns the first problem found, positioned.
pub fn validate(expr: &str) -> Result<()> {
    let chars: Vec<(usize, char)> = expr.char_indices().collect();
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut quote: Option<(char, usize)> = None;

    let mut i = 0;
    while i < chars.len() {
        let (offset, c) = chars[i];
        if let Some((open, _)) = quote {
            if c == open {
                quote = None;
            }
            i += 1;
            continue;
        }
        match c {
            '"' | '\'' => quote = Some((c, offset)),
            '(' | '[' => stack.push((c, offset)),
            ')' => {
                if !matches!(stack.pop(), Some(('(', _))) {
                    return Err(Error::syntax_at("unbalanced ')'", expr, offset));
                }
            }
            ']' => match stack.pop() {
                Some(('[', open_offset)) => {
                    let inner: String = chars
                        .iter()
                        .filter(|(o, _)| *o > open_offset && *o < offset)
                        .map(|(_, c)| *c)
                        .collect();
                    if inner.trim().is_empty() {
                        return Err(Error::syntax_at("Empty predicate", expr, open_offset));
                    }
                }
                _ => return Err(Error::syntax_at("unbalanced ']'", expr, offset)),
            },
            '&' if matches!(chars.get(i + 1), Some((_, '&'))) => {
                return Err(Error::syntax_at(
                    "'&&' is not valid XPath; use 'and'",
                    expr,
                    offset,
                ));
            }
            '|' if matches!(chars.get(i + 1), Some((_, '|'))) => {
                return Err(Error::syntax_at(
                    "'||' is not valid XPath; use 'or'",
                    expr,
                    offset,
                ));
            }
            '$' => {
                return Err(Error::syntax_at(
                    "variables ('$name') are not supported",
                    expr,
                    offset,
                ));
            }
            _ => {}
        }
        i += 1;
    }

    if let Some((q, offset)) = quote {
        return Err(Error::syntax_at(format!("unclosed {q} quote"), expr, offset));
    }
    if let Some((open, offset)) = stack.pop() {
        return Err(Error::syntax_at(format!("unclosed '{open}'"), expr, offset));
    }

    validate_axes(expr)
}

/// Every `name::` occurrence outside quotes must use a known axis.
fn validate_axes(expr: &str) -> Result<()> {
    let chars: Vec<(usize, char)> = expr.char_indices().collect();
    let mut quote: Option<char> = None;
    let mut i = 0;
    while i < chars.len() {
        let (_, c) = chars[i];
        if let Some(open) = quote {
            if c == open {
                quote = None;
            }
            i += 1;
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            ':' if matches!(chars.get(i + 1), Some((_, ':'))) => {
                let mut start = i;
                while start > 0 && is_axis_char(chars[start - 1].1) {
                    start -= 1;
                }
                let word: String = chars[start..i].iter().map(|(_, c)| *c).collect();
                let word_offset = chars[start].0;
                if word.is_empty() {
                    return Err(Error::syntax_at("missing axis name before '::'", expr, word_offset));
                }
                if !VALID_AXES.contains(&word.as_str()) {
                    return Err(Error::syntax_at(
                        format!(
                            "unknown axis '{word}::'; valid axes: {}",
                            VALID_AXES.join(", ")
                        ),
                        expr,
                        word_offset,
                    ));
                }
                i += 2;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    Ok(())
}

fn is_axis_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_well_formed() {
        assert!(validate("//book[price<30]/title").is_ok());
        assert!(validate("child::a[contains(text(), '[x]')]").is_ok());
        assert!(validate("a | b | c").is_ok());
    }

    #[test]
    fn test_empty_predicate() {
        let err = validate("//item[]").unwrap_err();
        assert!(err.to_string().contains("Empty predicate"));
        assert_eq!(err.offset(), Some(6));
        assert!(err.snippet().unwrap().contains("//item[]"));
    }

    #[test]
    fn test_whitespace_only_predicate() {
        let err = validate("//item[  ]").unwrap_err();
        assert!(err.to_string().contains("Empty predicate"));
    }

    #[test]
    fn test_unbalanced_delimiters() {
        assert!(validate("count(a").unwrap_err().to_string().contains("unclosed '('"));
        assert!(validate("a[1").unwrap_err().to_string().contains("unclosed '['"));
        assert!(validate("a)").unwrap_err().to_string().contains("unbalanced ')'"));
        assert!(validate("a]").unwrap_err().to_string().contains("unbalanced ']'"));
        assert!(validate("a[')'").unwrap_err().to_string().contains("unclosed '['"));
    }

    #[test]
    fn test_unclosed_quote() {
        let err = validate("a[@id='x]").unwrap_err();
        assert!(err.to_string().contains("unclosed"));
    }

    #[test]
    fn test_cpp_style_operators_rejected() {
        let err = validate("a && b").unwrap_err();
        assert!(err.to_string().contains("use 'and'"));
        let err = validate("a || b").unwrap_err();
        assert!(err.to_string().contains("use 'or'"));
    }

    #[test]
    fn test_quoted_content_ignored() {
        assert!(validate("a[@x='&& [ ] (']").is_ok());
    }

    #[test]
    fn test_variables_rejected() {
        let err = validate("$var/a").unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn test_unknown_axis() {
        let err = validate("descendent::a").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("unknown axis 'descendent::'"));
        assert!(message.contains("valid axes"));
        assert_eq!(err.offset(), Some(0));
    }

    #[test]
    fn test_known_axes_pass() {
        for axis in VALID_AXES {
            assert!(validate(&format!("{axis}::x")).is_ok(), "{axis}");
        }
    }
}
