//! Namespace lookups from the sequence and the alias context for qualified
//! searches.

use crate::set::QuerySet;
use std::collections::HashMap;
use xmlq_tree::{Error, Result};

impl QuerySet {
    /// Resolves a prefix from the first element, walking to the root.
    pub fn resolve_namespace(&self, prefix: &str) -> Option<String> {
        self.elements()
            .first()
            .and_then(|el| el.resolve_namespace_prefix(prefix))
    }

    /// The default namespace in scope at the first element.
    pub fn get_default_namespace(&self) -> Option<String> {
        self.elements().first().and_then(|el| el.default_namespace())
    }

    /// Prefixes visible from the first element.
    pub fn get_namespace_prefixes(&self) -> Vec<String> {
        self.elements()
            .first()
            .map(|el| el.namespace_prefixes_in_scope())
            .unwrap_or_default()
    }

    /// All prefix→URI mappings in scope at the first element; declarations
    /// nearer the element shadow ancestors.
    pub fn get_namespace_mappings(&self) -> Vec<(String, String)> {
        self.elements()
            .first()
            .map(|el| el.namespace_mappings_in_scope())
            .unwrap_or_default()
    }

    /// The prefix bound to `uri` nearest the first element.
    pub fn get_prefix_for_namespace(&self, uri: &str) -> Option<String> {
        self.elements()
            .first()
            .and_then(|el| el.prefix_for_namespace(uri))
    }
}

/// An immutable alias→URI map for namespace-qualified searches that do not
/// depend on the document's own prefixes.
#[derive(Debug, Clone, Default)]
pub struct NamespaceContext {
    aliases: HashMap<String, String>,
}

impl NamespaceContext {
    pub fn new() -> Self {
        NamespaceContext::default()
    }

    pub fn with_alias(mut self, alias: impl Into<String>, uri: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), uri.into());
        self
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        NamespaceContext {
            aliases: pairs.into_iter().collect(),
        }
    }

    pub fn uri(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }

    /// Looks up `alias:local` through the alias map and delegates to
    /// [`QuerySet::in_namespace`]. Fails on a malformed qualified name or an
    /// unknown alias (listing the available ones).
    pub fn find(&self, query: &QuerySet, qualified: &str) -> Result<QuerySet> {
        let colons = qualified.matches(':').count();
        if colons != 1 {
            return Err(Error::syntax(format!(
                "expected a qualified name of the form 'alias:local', got '{qualified}'"
            )));
        }
        let (alias, local) = qualified
            .split_once(':')
            .unwrap_or((qualified, ""));
        match self.aliases.get(alias) {
            Some(uri) => Ok(query.find_local(local).in_namespace(uri, local)),
            None => {
                let mut known: Vec<&str> = self.aliases.keys().map(String::as_str).collect();
                known.sort_unstable();
                Err(Error::lookup(format!(
                    "unknown namespace alias '{alias}'; available aliases: {}",
                    if known.is_empty() {
                        "(none)".to_string()
                    } else {
                        known.join(", ")
                    }
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::set::parse;

    fn soap() -> QuerySet {
        parse(
            r#"<s:Envelope xmlns:s="urn:soap" xmlns="urn:default">
                <s:Body><payload xmlns:x="urn:x"><x:item/><item/></payload></s:Body>
            </s:Envelope>"#,
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_from_first_element() {
        let query = soap();
        assert_eq!(query.resolve_namespace("s"), Some("urn:soap".to_string()));
        assert_eq!(query.resolve_namespace("zzz"), None);
        assert_eq!(query.get_default_namespace(), Some("urn:default".to_string()));
    }

    #[test]
    fn test_mappings_merge_child_over_parent() {
        let query = soap();
        let payload = query.find("payload");
        let mappings = payload.get_namespace_mappings();
        assert!(mappings.contains(&("x".to_string(), "urn:x".to_string())));
        assert!(mappings.contains(&("s".to_string(), "urn:soap".to_string())));
        let mut prefixes = payload.get_namespace_prefixes();
        prefixes.sort();
        assert_eq!(prefixes, vec!["s", "x"]);
        assert_eq!(
            payload.get_prefix_for_namespace("urn:soap"),
            Some("s".to_string())
        );
    }

    #[test]
    fn test_override_shadows_ancestor() {
        let query = parse(r#"<r xmlns:p="old"><c xmlns:p="new"><leaf/></c></r>"#).unwrap();
        let leaf = query.find("leaf");
        assert_eq!(leaf.resolve_namespace("p"), Some("new".to_string()));
        let mappings = leaf.get_namespace_mappings();
        assert_eq!(
            mappings.iter().find(|(p, _)| p == "p").map(|(_, u)| u.as_str()),
            Some("new")
        );
    }

    #[test]
    fn test_context_find() {
        let query = soap();
        let ctx = NamespaceContext::new().with_alias("soap", "urn:soap");
        let body = ctx.find(&query, "soap:Body").unwrap();
        assert_eq!(body.count(), 1);
        assert_eq!(body.elements()[0].name(), "s:Body");
    }

    #[test]
    fn test_context_unknown_alias() {
        let ctx = NamespaceContext::new()
            .with_alias("a", "urn:a")
            .with_alias("b", "urn:b");
        let err = ctx.find(&soap(), "c:item").unwrap_err();
        assert!(matches!(err, Error::Lookup(_)));
        let message = err.to_string();
        assert!(message.contains("unknown namespace alias 'c'"));
        assert!(message.contains("a, b"));
    }

    #[test]
    fn test_context_malformed_qualified_name() {
        let ctx = NamespaceContext::new().with_alias("a", "urn:a");
        let err = ctx.find(&soap(), "a:b:c").unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }));
        let err = ctx.find(&soap(), "plain").unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }));
    }
}
