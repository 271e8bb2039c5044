//! Shell-style wildcard patterns and the pattern argument type shared by the
//! query layer's name/text/attribute filters.

use crate::error::{Error, Result};
use regex::{Regex, RegexBuilder};

/// Translates a shell-style pattern into an anchored, case-insensitive regex.
/// `*` matches any run of characters; every other regex metacharacter is
/// escaped literally.
pub fn wildcard_to_regex(pattern: &str) -> Result<Regex> {
    let mut expr = String::with_capacity(pattern.len() + 4);
    expr.push('^');
    for c in pattern.chars() {
        if c == '*' {
            expr.push_str(".*");
        } else {
            expr.push_str(&regex::escape(&c.to_string()));
        }
    }
    expr.push('$');
    RegexBuilder::new(&expr)
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::Internal(format!("wildcard '{pattern}' produced an invalid regex: {e}")))
}

/// A pattern accepted by the query layer: either a prebuilt regex or a
/// wildcard string that is compiled on use.
#[derive(Debug, Clone)]
pub enum NamePattern {
    Regex(Regex),
    Wildcard(String),
}

impl NamePattern {
    pub fn compile(self) -> Result<Regex> {
        match self {
            NamePattern::Regex(r) => Ok(r),
            NamePattern::Wildcard(w) => wildcard_to_regex(&w),
        }
    }
}

impl From<Regex> for NamePattern {
    fn from(r: Regex) -> Self {
        NamePattern::Regex(r)
    }
}

impl From<&str> for NamePattern {
    fn from(w: &str) -> Self {
        NamePattern::Wildcard(w.to_string())
    }
}

impl From<String> for NamePattern {
    fn from(w: String) -> Self {
        NamePattern::Wildcard(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_matches_any_run() {
        let re = wildcard_to_regex("item*").unwrap();
        assert!(re.is_match("item"));
        assert!(re.is_match("itemList"));
        assert!(!re.is_match("myitem"));
    }

    #[test]
    fn test_anchored() {
        let re = wildcard_to_regex("a*b").unwrap();
        assert!(re.is_match("ab"));
        assert!(re.is_match("axxb"));
        assert!(!re.is_match("xab"));
        assert!(!re.is_match("abx"));
    }

    #[test]
    fn test_case_insensitive() {
        let re = wildcard_to_regex("Item*").unwrap();
        assert!(re.is_match("ITEMS"));
        assert!(re.is_match("items"));
    }

    #[test]
    fn test_metacharacters_escaped() {
        let re = wildcard_to_regex("a.b").unwrap();
        assert!(re.is_match("a.b"));
        assert!(!re.is_match("axb"));

        let re = wildcard_to_regex("q(1)[2]").unwrap();
        assert!(re.is_match("q(1)[2]"));
    }

    #[test]
    fn test_name_pattern_from_regex_kept_as_is() {
        let re = Regex::new("^ab?c$").unwrap();
        let compiled = NamePattern::from(re).compile().unwrap();
        assert!(compiled.is_match("ac"));
        // A prebuilt regex keeps its own case sensitivity.
        assert!(!compiled.is_match("AC"));
    }

    #[test]
    fn test_name_pattern_from_str_is_wildcard() {
        let compiled = NamePattern::from("sec*").compile().unwrap();
        assert!(compiled.is_match("SECTION"));
    }
}
