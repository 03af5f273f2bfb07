use quire_dom::{parse_document, parse_fragment, to_html, DomNode, Element, SerializeOptions};

#[test]
fn test_head_document_round_trips() {
    let source = r#"<meta charset="utf-8"><meta name="generator" content="quire@0.1.0"><style data-ww-theme="base" blocking="render">body > p { color: red }</style><noscript><link rel="stylesheet" href="a.css"></noscript>"#;
    let nodes = parse_fragment(source).unwrap();

    assert_eq!(nodes.len(), 4);
    assert_eq!(to_html(&nodes, &SerializeOptions::default()), source);
}

#[test]
fn test_document_round_trips_through_parsed_parts() {
    let source = r#"<!DOCTYPE html><html lang="en"><head><title>T</title></head><body><p>Hi</p></body></html>"#;
    let doc = parse_document(source).unwrap();

    assert_eq!(doc.to_html(&SerializeOptions::default()), source);
}

#[test]
fn test_built_tree_reparses_identically() {
    let tree = Element::new("article")
        .with_attr("data-title", "Q & A")
        .with_child(Element::new("h1").with_text("Fish <&> chips"))
        .with_child(DomNode::comment("id☛c-1♦name☛Ann♦Looks good"))
        .with_child(Element::new("img").with_attr("src", "a.png"));

    let html = to_html(&[tree.clone().into()], &SerializeOptions::default());
    let reparsed = parse_fragment(&html).unwrap();

    assert_eq!(reparsed, vec![DomNode::Element(tree)]);
}
