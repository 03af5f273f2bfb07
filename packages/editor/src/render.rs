//! Comment rendering for one serialization pass.
//!
//! A thread split over several inline runs renders its entries on the first
//! run only. Later runs carry just the thread id and are joined back to the
//! first on import.

use crate::comments::COMMENT_MARK;
use quire_codec::{comment_element, AttrValue};
use quire_model::{DomSerializer, DomSpec, Fragment, Mark, MarkRenderer};
use quire_dom::DomNode;
use std::collections::HashSet;

#[derive(Debug, Hash, PartialEq, Eq)]
enum ThreadKey {
    Id(String),
    Identity(usize),
}

impl ThreadKey {
    fn of(mark: &Mark) -> Self {
        match mark.attr("id").and_then(AttrValue::as_str) {
            Some(id) => ThreadKey::Id(id.to_string()),
            None => ThreadKey::Identity(mark.identity()),
        }
    }
}

/// Memo of the comment threads already rendered in this pass
#[derive(Debug, Default)]
pub struct CommentRenderPass {
    seen: HashSet<ThreadKey>,
}

impl CommentRenderPass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every rendered thread
    pub fn reset(&mut self) {
        self.seen.clear();
    }

    /// Serialize `fragment` with a fresh memo
    pub fn serialize(&mut self, fragment: &Fragment) -> Vec<DomNode> {
        self.reset();
        DomSerializer::with_renderer(self).serialize_fragment(fragment)
    }
}

impl MarkRenderer for CommentRenderPass {
    fn render_mark(&mut self, mark: &Mark, _inline: bool) -> Option<DomSpec> {
        if mark.type_name() != COMMENT_MARK {
            return None;
        }
        let id = mark.attr("id").and_then(AttrValue::as_str);
        let first = self.seen.insert(ThreadKey::of(mark));
        let entries = if first {
            mark.attr("content").and_then(AttrValue::as_comments).unwrap_or_default()
        } else {
            &[]
        };
        let el = comment_element(id, entries);
        Some(DomSpec::wrap(el.tag, el.attributes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_codec::{attrs, Attrs, CommentEntry};
    use quire_dom::{to_html, SerializeOptions};
    use quire_schema::default_composer;

    #[test]
    fn test_thread_renders_entries_once() {
        let composed = default_composer().compose().unwrap();
        let schema = composed.schema.clone();
        let comment = schema
            .mark(
                COMMENT_MARK,
                attrs([
                    ("id", AttrValue::from("c-0")),
                    ("content", AttrValue::Comments(vec![CommentEntry::new("Hi")])),
                ]),
            )
            .unwrap();
        let em = schema.mark("em", Attrs::new()).unwrap();
        let p = schema
            .node(
                "p",
                Attrs::new(),
                vec![
                    schema.text("a", vec![comment.clone()]).unwrap(),
                    schema.text("b", vec![em]).unwrap(),
                    schema.text("c", vec![comment]).unwrap(),
                ],
                vec![],
            )
            .unwrap();

        let mut pass = CommentRenderPass::new();
        let first = to_html(&pass.serialize(p.content()), &SerializeOptions::default());
        assert_eq!(
            first,
            r#"<comment- data-id="c-0" data-content-0="Hi">a</comment-><em>b</em><comment- data-id="c-0">c</comment->"#
        );

        // a new pass renders the entries again
        let second = to_html(&pass.serialize(p.content()), &SerializeOptions::default());
        assert_eq!(first, second);
    }
}
