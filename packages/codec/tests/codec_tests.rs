use quire_codec::{
    attrs, fold_comment_threads, get_attrs, parse_comment, serialize_comment, to_attributes,
    unfold_comment_threads, AttrValue, AttributeSpec, AttributeSpecs, CommentEntry,
    CommentPosition, COMMENT_ATTR,
};
use quire_dom::{parse_fragment, to_html, DomNode, Element, SerializeOptions};

fn entries() -> Vec<CommentEntry> {
    vec![
        CommentEntry::new("plain"),
        CommentEntry::new("with ♦ and ☛ inside"),
        CommentEntry {
            content: Some("full".to_string()),
            position: Some(CommentPosition::BeforeEnd),
            id: Some("c-9".to_string()),
            changed: Some(42),
            name: Some("N☛ame".to_string()),
            email: Some("e@x.org".to_string()),
            extra: [("author".to_string(), "A".to_string())].into_iter().collect(),
        },
    ]
}

#[test]
fn test_comment_round_trip() {
    for entry in entries() {
        assert_eq!(parse_comment(&serialize_comment(&entry, false)), entry);

        let mut without_id = entry.clone();
        without_id.id = None;
        assert_eq!(parse_comment(&serialize_comment(&entry, true)), without_id);
    }
}

#[test]
fn test_node_comment_thread_survives_markup() {
    let specs = AttributeSpecs::new()
        .with("src", AttributeSpec::optional())
        .with(COMMENT_ATTR, AttributeSpec::optional());
    let thread = entries();
    let node_attrs = attrs([
        ("src", AttrValue::from("a.png")),
        (COMMENT_ATTR, AttrValue::Comments(thread.clone())),
    ]);

    let img = Element::new("img").with_attrs(to_attributes(&node_attrs, Some(&specs), None));
    let html = to_html(&unfold_comment_threads(vec![img.into()]), &SerializeOptions::default());
    let folded = fold_comment_threads(parse_fragment(&html).unwrap());

    let el = folded.iter().find_map(DomNode::as_element).unwrap();
    let parsed = get_attrs(el, false).unwrap();
    let parsed_thread = parsed.get(COMMENT_ATTR).and_then(AttrValue::as_comments).unwrap();

    let expected: Vec<CommentEntry> = thread
        .into_iter()
        .map(|mut e| {
            e.id = None;
            e
        })
        .collect();
    assert_eq!(parsed_thread, expected.as_slice());
}
