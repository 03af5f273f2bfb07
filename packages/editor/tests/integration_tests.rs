//! Integration tests for the editor crate

use quire_codec::{attrs, Attrs};
use quire_dom::{Element, SerializeOptions};
use quire_editor::{
    by_type, meta_named, owned_nodes, CommentAnchor, CommentAuthor, CommentTarget, Direction, EditorOptions,
    EditorSession, HeadPatch, HeadSyncView,
};
use quire_model::Selection;

const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Field notes</title>
  <noscript><link rel="stylesheet" href="noscript.css"></noscript>
</head>
<body>
  <h1>Notes</h1>
  <p>First entry</p>
  <x-map zoom="3"></x-map>
</body>
</html>"#;

fn options() -> EditorOptions {
    EditorOptions {
        author: CommentAuthor {
            name: Some("Ada".to_string()),
            email: Some("ada@example.org".to_string()),
        },
        ..EditorOptions::default()
    }
}

fn export(session: &EditorSession) -> String {
    session.export_html(&SerializeOptions::default())
}

#[test]
fn test_document_round_trip() -> anyhow::Result<()> {
    let session = EditorSession::open(PAGE, options())?;
    let head: Vec<&str> = session.head().doc().children().map(|n| n.type_name()).collect();
    assert_eq!(head, vec!["meta", "title", "noscript"]);

    let html = export(&session);
    assert!(html.contains(r#"<html lang="en">"#));
    assert!(html.contains("<title>Field notes</title>"));
    assert!(html.contains("<noscript><link "));
    assert!(html.contains(r#"href="noscript.css""#));
    assert!(html.contains(r#"<x-map zoom="3""#));

    let again = EditorSession::open(&html, options())?;
    assert_eq!(again.body().doc(), session.body().doc());
    assert_eq!(again.head().doc(), session.head().doc());
    Ok(())
}

#[test]
fn test_head_editing_workflow() -> anyhow::Result<()> {
    let mut session = EditorSession::open(PAGE, options())?;

    let description = meta_named("description");
    assert!(session.upsert_head_element(
        "meta",
        attrs([("name", "description"), ("content", "Notes from the field")]),
        vec![],
        &description,
    ));
    // same upsert again changes nothing
    assert!(!session.upsert_head_element(
        "meta",
        attrs([("name", "description"), ("content", "Notes from the field")]),
        vec![],
        &description,
    ));

    let found = session.get_head_element(&description).expect("description meta");
    assert!(session.move_head_element(found.pos, Direction::Up));
    let head: Vec<&str> = session.head().doc().children().map(|n| n.type_name()).collect();
    assert_eq!(head, vec!["meta", "title", "noscript"]);
    let noscript = session.head().doc().child(2).expect("noscript");
    assert_eq!(noscript.child_count(), 2);
    assert_eq!(noscript.child(1).and_then(|n| n.attr_str("name")), Some("description"));

    assert!(!session.delete_head_element(&meta_named("keywords")));
    assert!(session.delete_head_element(&by_type("title")));
    assert!(!export(&session).contains("<title>"));
    Ok(())
}

#[test]
fn test_comment_threads_survive_export() -> anyhow::Result<()> {
    let mut session = EditorSession::open(PAGE, options())?;
    // "First" inside the paragraph after the heading
    let heading_size = session.body().doc().child(0).expect("heading").node_size();
    let start = heading_size + 1;
    session.set_selection(Selection::text(start, start + 5));
    session.add_comment("Which field?")?;
    session.reply_comment(&CommentTarget::Thread("c-0".to_string()), "The north one")?;

    let html = export(&session);
    assert!(!html.contains("<comment-"));
    let reopened = EditorSession::open(&html, options())?;
    let threads = reopened.comment_threads();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].id.as_deref(), Some("c-0"));
    assert_eq!(
        threads[0].anchor,
        CommentAnchor::Range {
            from: start,
            to: start + 5
        }
    );
    let contents: Vec<_> = threads[0].entries.iter().filter_map(|e| e.content.as_deref()).collect();
    assert_eq!(contents, vec!["Which field?", "The north one"]);
    assert_eq!(threads[0].entries[0].email.as_deref(), Some("ada@example.org"));
    Ok(())
}

#[test]
fn test_comment_end_marker_in_content_survives_export() -> anyhow::Result<()> {
    let mut session = EditorSession::open("<p>abc</p>", options())?;
    session.set_selection(Selection::text(1, 4));
    session.add_comment("see a-->b")?;

    let html = export(&session);
    let reopened = EditorSession::open(&html, options())?;
    assert_eq!(reopened.body().doc().text_content(), "abc");
    let threads = reopened.comment_threads();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].entries[0].content.as_deref(), Some("see a-->b"));
    Ok(())
}

#[test]
fn test_typing_with_history() -> anyhow::Result<()> {
    let mut session = EditorSession::open("<p>ab</p>", EditorOptions::default())?;
    session.set_selection(Selection::cursor(3));
    assert!(session.handle_text_input("c"));
    assert!(session.handle_key("Enter"));
    assert!(session.handle_text_input("d"));
    assert_eq!(session.body().doc().to_string(), r#"explorable(p("abc"), p("d"))"#);

    assert!(session.undo());
    assert!(session.undo());
    assert_eq!(session.body().doc().to_string(), r#"explorable(p("abc"))"#);
    assert!(session.redo());
    Ok(())
}

#[test]
fn test_sync_view_follows_session_head() -> anyhow::Result<()> {
    let mut session = EditorSession::open(PAGE, options())?;
    let owned = owned_nodes(&["[contenteditable] { outline: none }".to_string()], &[]);
    let mut view = HeadSyncView::mount(Element::new("head"), session.head(), owned);
    assert_eq!(view.head().children.len(), 4);

    session.set_head_attributes(attrs([("id", "top")]));
    let patches = view.update(session.head());
    assert!(matches!(
        patches.as_slice(),
        [HeadPatch::UpdateAttributes { path, .. }] if path.is_empty()
    ));
    assert_eq!(view.head().get_attribute("id"), Some("top"));

    session.upsert_head_element("title", Attrs::new(), vec![], &by_type("title"));
    let patches = view.update(session.head());
    assert_eq!(patches.len(), 1);
    // the editor stylesheet stays last
    assert_eq!(view.head().children.len(), 4);
    assert_eq!(
        view.head().children[3].as_element().map(|el| el.tag.as_str()),
        Some("style")
    );

    let head = view.destroy();
    assert_eq!(head.children.len(), 3);
    Ok(())
}
