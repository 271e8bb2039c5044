//! End-to-end scenarios across parser, query set and XPath evaluator.

use pretty_assertions::assert_eq;
use xmlq::{Error, XmlWriteOptions, parse};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_basic_parse_and_navigate() {
    init_logging();
    let query = parse("<root><a>1</a><a>2</a></root>").unwrap();
    let a = query.find("a");
    assert_eq!(a.texts(), vec!["1", "2"]);
    assert_eq!(a.values(), vec![1.0, 2.0]);
    assert_eq!(a.sum(), 3.0);
}

#[test]
fn test_mixed_content() {
    init_logging();
    let query = parse("<p>Hi <b>there</b> friend</p>").unwrap();
    let p = query.elements()[0].clone();

    let fragments = p.text_nodes();
    assert!(fragments.contains(&"Hi ".to_string()));
    assert!(fragments.contains(&" friend".to_string()));
    assert_eq!(p.children().len(), 1);
    assert_eq!(query.all_text()[0], "Hi there friend");
    assert_eq!(query.has_mixed_content().count(), 1);
}

#[test]
fn test_namespaces_inherited_and_overridden() {
    init_logging();
    let query = parse(r#"<r xmlns="A"><x/><c xmlns="B"><x/></c></r>"#).unwrap();
    let root = query.elements()[0].clone();

    let outer_x = root.children()[0].clone();
    let inner_x = root.children()[1].children()[0].clone();
    assert_eq!(outer_x.namespace_uri(), Some("A".to_string()));
    assert_eq!(inner_x.namespace_uri(), Some("B".to_string()));

    assert_eq!(query.in_namespace("A", "x").count(), 1);
    assert_eq!(query.in_namespace("B", "x").count(), 1);
}

#[test]
fn test_xpath_predicates_over_catalog() {
    init_logging();
    let query = parse(
        r#"<catalog>
            <book id="1"><price>15</price></book>
            <book id="2"><price>25</price></book>
            <book id="3"><price>35</price></book>
        </catalog>"#,
    )
    .unwrap();

    assert_eq!(query.xpath("//book[price<30]").unwrap().count(), 2);

    let second = query.xpath("//book[@id='2']").unwrap().first().unwrap();
    assert_eq!(second.children()[0].text(), Some("25".to_string()));

    let last_price = query
        .xpath("/catalog/book[last()]/price")
        .unwrap()
        .first()
        .unwrap();
    assert_eq!(last_price.text(), Some("35".to_string()));
}

#[test]
fn test_mutation_round_trip() {
    init_logging();
    let query = parse(r#"<x><y a="1"/></x>"#).unwrap();
    let root = query.elements()[0].clone();

    query.find("y").set_attr("a", "2").set_text("hello");

    let xml = root.to_xml(&XmlWriteOptions::default());
    assert!(xml.contains(r#"a="2""#), "{xml}");
    assert!(xml.contains(">hello<"), "{xml}");
}

#[test]
fn test_xpath_syntax_error_diagnostics() {
    init_logging();
    let query = parse("<root><item/></root>").unwrap();
    let err = query.xpath("//item[]").unwrap_err();

    assert!(matches!(err, Error::Syntax { .. }));
    let message = err.to_string();
    assert!(message.contains("Empty predicate"), "{message}");

    // The snippet points a caret at the offending brackets.
    let snippet = err.snippet().unwrap();
    let mut lines = snippet.lines();
    let window = lines.next().unwrap();
    let caret = lines.next().unwrap();
    assert!(window.contains("//item[]"));
    let caret_pos = caret.find('^').unwrap();
    assert_eq!(&window[caret_pos..caret_pos + 1], "[");
}

#[test]
fn test_chained_query_pipeline() {
    init_logging();
    let query = parse(
        r#"<orders>
            <order status="open"><total>120</total></order>
            <order status="closed"><total>80</total></order>
            <order status="open"><total>45</total></order>
        </orders>"#,
    )
    .unwrap();

    let open_totals = query
        .find("order")
        .attr_equals("status", "open")
        .children_named("total");
    assert_eq!(open_totals.sum(), 165.0);
    assert_eq!(open_totals.average(), 82.5);
    assert_eq!(open_totals.max_value(), Some(120.0));

    let by_status = query.find("order").group_by_attribute("status");
    assert_eq!(by_status["open"].count(), 2);
    assert_eq!(by_status["closed"].count(), 1);
}

#[test]
fn test_namespace_context_end_to_end() {
    init_logging();
    let query = parse(
        r#"<s:Envelope xmlns:s="urn:soap"><s:Body><data>7</data></s:Body></s:Envelope>"#,
    )
    .unwrap();
    let ctx = xmlq::NamespaceContext::new().with_alias("soap", "urn:soap");

    let body = ctx.find(&query, "soap:Body").unwrap();
    assert_eq!(body.count(), 1);
    assert_eq!(body.children().values(), vec![7.0]);

    let err = ctx.find(&query, "wrong:Body").unwrap_err();
    assert!(matches!(err, Error::Lookup(_)));
}

#[test]
fn test_parse_options_round_trip_through_query() {
    init_logging();
    let options = xmlq::ParseOptions {
        parse_numbers: false,
        parse_booleans: false,
        ..Default::default()
    };
    let query = xmlq::parse_with("<r><v>5</v><b>true</b></r>", &options).unwrap();
    assert_eq!(query.find("v").first().unwrap().numeric_value(), None);
    assert_eq!(query.find("b").first().unwrap().boolean_value(), None);
    // values() still falls back to parsing the text on demand.
    assert_eq!(query.find("v").values(), vec![5.0]);
}

#[test]
fn test_xpath_union_feeds_query_chain() {
    init_logging();
    let query = parse("<r><a>1</a><b>2</b><c>3</c></r>").unwrap();
    let union = query.xpath("//a | //c").unwrap();
    assert_eq!(union.texts(), vec!["1", "3"]);
    assert_eq!(union.sum(), 4.0);
}
