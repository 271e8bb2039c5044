//! XPath delegation: expressions are compiled and evaluated by the
//! evaluator crate against this set's sequence, and the resulting node list
//! is wrapped back into a query set.

use crate::set::QuerySet;
use xmlq_tree::{ElementRef, Result};

impl QuerySet {
    /// Evaluates an XPath expression with this sequence as the context.
    pub fn xpath(&self, expr: &str) -> Result<QuerySet> {
        let nodes = xmlq_xpath1::evaluate_nodes(expr, self.elements())?;
        Ok(self.with_elements(nodes))
    }

    /// The first match of `expr`, if any. Equals `xpath(expr)?.first()`.
    pub fn xpath_first(&self, expr: &str) -> Result<Option<ElementRef>> {
        Ok(self.xpath(expr)?.first())
    }
}

#[cfg(test)]
mod tests {
    use crate::set::parse;

    fn catalog() -> crate::QuerySet {
        parse(
            r#"<catalog>
                <book id="1"><price>15</price></book>
                <book id="2"><price>25</price></book>
                <book id="3"><price>35</price></book>
            </catalog>"#,
        )
        .unwrap()
    }

    #[test]
    fn test_xpath_returns_query_set() {
        let query = catalog();
        let cheap = query.xpath("//book[price<30]").unwrap();
        assert_eq!(cheap.count(), 2);
        // The result chains like any other set.
        assert_eq!(cheap.children_named("price").values(), vec![15.0, 25.0]);
    }

    #[test]
    fn test_xpath_first_matches_first() {
        let query = catalog();
        let via_first = query.xpath_first("//book").unwrap().unwrap();
        let via_set = query.xpath("//book").unwrap().first().unwrap();
        assert_eq!(via_first, via_set);
        assert!(query.xpath_first("//zzz").unwrap().is_none());
    }

    #[test]
    fn test_xpath_syntax_error_propagates() {
        let query = catalog();
        let err = query.xpath("//book[]").unwrap_err();
        assert!(err.to_string().contains("Empty predicate"));
        assert!(err.snippet().is_some());
    }

    #[test]
    fn test_xpath_scenario_checks() {
        let query = catalog();
        let second = query.xpath("//book[@id='2']").unwrap();
        let first_child = second.first().unwrap().children()[0].clone();
        assert_eq!(first_child.text(), Some("25".to_string()));

        let last_price = query.xpath("/catalog/book[last()]/price").unwrap();
        assert_eq!(last_price.first().unwrap().text(), Some("35".to_string()));
    }
}
