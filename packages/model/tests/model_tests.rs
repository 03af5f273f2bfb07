use quire_codec::{attrs, AttrValue, AttributeSpec, Attrs};
use quire_model::{
    EditorState, MarkSpec, Node, NodeSpec, ParseRule, Schema, SchemaSpec, Selection, StepError,
};
use std::sync::Arc;

fn schema() -> Arc<Schema> {
    Arc::new(
        Schema::new(SchemaSpec {
            nodes: vec![
                ("doc".to_string(), NodeSpec::new().content("block+")),
                (
                    "p".to_string(),
                    NodeSpec::new()
                        .content("inline*")
                        .group("block")
                        .parse_rule(ParseRule::tag("p")),
                ),
                (
                    "section".to_string(),
                    NodeSpec::new()
                        .content("block+")
                        .group("block")
                        .attr("id", AttributeSpec::optional()),
                ),
                ("br".to_string(), NodeSpec::new().inline().group("inline")),
                ("text".to_string(), NodeSpec::new().group("inline")),
            ],
            marks: vec![(
                "note".to_string(),
                MarkSpec::new().excludes("").attr("id", AttributeSpec::optional()),
            )],
            top_node: None,
        })
        .unwrap(),
    )
}

fn text(schema: &Schema, value: &str) -> Node {
    schema.text(value, vec![]).unwrap()
}

fn p(schema: &Schema, value: &str) -> Node {
    let content = if value.is_empty() { vec![] } else { vec![text(schema, value)] };
    schema.node("p", Attrs::new(), content, vec![]).unwrap()
}

fn sample(schema: &Schema) -> Node {
    let section = schema
        .node("section", attrs([("id", "s1")]), vec![p(schema, "inner")], vec![])
        .unwrap();
    schema
        .node("doc", Attrs::new(), vec![p(schema, "hello"), section], vec![])
        .unwrap()
}

#[test]
fn test_positions_and_sizes() {
    let schema = schema();
    let doc = sample(&schema);
    // p("hello") = 7, section(p("inner")) = 9
    assert_eq!(doc.content_size(), 16);
    assert_eq!(doc.node_at(0).unwrap().type_name(), "p");
    assert_eq!(doc.node_at(7).unwrap().type_name(), "section");
    assert_eq!(doc.node_at(8).unwrap().type_name(), "p");
    assert_eq!(doc.node_at(3).unwrap().text(), "hello");
}

#[test]
fn test_resolve() {
    let schema = schema();
    let doc = sample(&schema);
    let rp = doc.resolve(11).unwrap();
    assert_eq!(rp.depth(), 2);
    assert_eq!(rp.parent().type_name(), "p");
    assert_eq!(rp.node(1).type_name(), "section");
    assert_eq!(rp.start(2), 9);
    assert_eq!(rp.end(2), 14);
    assert_eq!(rp.before(1), 7);
    assert_eq!(rp.after(1), 16);
    assert_eq!(rp.text_offset(), 2);
    assert_eq!(rp.node_before().unwrap().text(), "in");
    assert_eq!(rp.node_after().unwrap().text(), "ner");
    assert!(doc.resolve(17).is_err());
}

#[test]
fn test_descendants_reports_parent_and_index() {
    let schema = schema();
    let doc = sample(&schema);
    let mut seen = Vec::new();
    doc.descendants(&mut |node, pos, parent, index| {
        seen.push((
            node.type_name().to_string(),
            pos,
            parent.map(|p| p.type_name().to_string()),
            index,
        ));
        true
    });
    assert_eq!(
        seen,
        vec![
            ("p".to_string(), 0, Some("doc".to_string()), 0),
            ("text".to_string(), 1, Some("p".to_string()), 0),
            ("section".to_string(), 7, Some("doc".to_string()), 1),
            ("p".to_string(), 8, Some("section".to_string()), 0),
            ("text".to_string(), 9, Some("p".to_string()), 0),
        ]
    );
}

#[test]
fn test_text_between() {
    let schema = schema();
    let doc = sample(&schema);
    assert_eq!(doc.text_between(0, doc.content_size(), "\n"), "hello\ninner");
    assert_eq!(doc.text_content(), "helloinner");
}

#[test]
fn test_state_undo_redo() {
    let schema = schema();
    let state = EditorState::create(schema.clone(), Some(sample(&schema))).unwrap();
    assert_eq!(state.selection(), &Selection::cursor(1));

    let mut tr = state.tr();
    tr.insert_text(6, "!").unwrap();
    tr.set_node_attribute(8, "id", AttrValue::from("s2")).unwrap();
    let changed = state.apply(&tr);
    assert_eq!(changed.doc().text_content(), "hello!inner");
    assert_eq!(changed.doc().child(1).unwrap().attr_str("id"), Some("s2"));
    assert!(changed.can_undo());

    let undone = changed.undo().unwrap();
    assert_eq!(undone.doc(), state.doc());
    assert!(!undone.can_undo());
    assert!(undone.can_redo());

    let redone = undone.redo().unwrap();
    assert_eq!(redone.doc(), changed.doc());
    assert!(redone.undo().is_some());
}

#[test]
fn test_failed_step_leaves_state_untouched() {
    let schema = schema();
    let state = EditorState::create(schema.clone(), Some(sample(&schema))).unwrap();
    let mut tr = state.tr();
    let section = schema.node("section", Attrs::new(), vec![p(&schema, "x")], vec![]).unwrap();
    let err = tr.insert(2, vec![section]).unwrap_err();
    assert!(matches!(err, StepError::InvalidContent { .. }));
    assert!(!tr.doc_changed());
    assert_eq!(state.apply(&tr).doc(), state.doc());
}

#[test]
fn test_overlapping_non_exclusive_marks() {
    let schema = schema();
    let state = EditorState::create(schema.clone(), Some(sample(&schema))).unwrap();
    let a = schema.mark("note", attrs([("id", "a")])).unwrap();
    let b = schema.mark("note", attrs([("id", "b")])).unwrap();
    let mut tr = state.tr();
    tr.add_mark(1, 4, a).unwrap();
    tr.add_mark(3, 6, b).unwrap();
    let text_nodes: Vec<usize> = tr
        .doc()
        .child(0)
        .unwrap()
        .children()
        .map(|n| n.marks().len())
        .collect();
    assert_eq!(text_nodes, vec![1, 2, 1]);
}

#[test]
fn test_empty_state_is_filled() {
    let schema = schema();
    let state = EditorState::create(schema, None).unwrap();
    assert_eq!(state.doc().to_string(), "doc(p)");
    assert_eq!(state.selection(), &Selection::cursor(1));
}
