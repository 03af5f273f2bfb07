//! Input rules
//!
//! An input rule watches text as it is typed. When the text before the
//! cursor, including the newly typed characters, matches the rule's pattern
//! the rule's handler may replace the matched range.

use crate::error::{ComposeError, ComposeResult};
use quire_codec::attrs;
use quire_model::{EditorState, Selection, Transaction};
use regex::{Captures, Regex};
use std::fmt;
use std::sync::Arc;

/// How far back the text before the cursor is inspected
pub const MAX_MATCH: usize = 500;

const LEAF_CHAR: &str = "\u{fffc}";

pub type InputRuleHandler = dyn Fn(&EditorState, &Captures<'_>, usize, usize) -> Option<Transaction> + Send + Sync;

#[derive(Clone)]
pub struct InputRule {
    pub name: String,
    pub pattern: Regex,
    handler: Arc<InputRuleHandler>,
}

impl InputRule {
    /// Build a rule. Patterns should be anchored with `$` so they only fire
    /// on text that ends at the cursor.
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        handler: impl Fn(&EditorState, &Captures<'_>, usize, usize) -> Option<Transaction> + Send + Sync + 'static,
    ) -> ComposeResult<Self> {
        let name = name.into();
        let pattern = Regex::new(pattern).map_err(|e| ComposeError::InvalidInputRule {
            rule: name.clone(),
            message: e.to_string(),
        })?;
        Ok(Self {
            name,
            pattern,
            handler: Arc::new(handler),
        })
    }
}

impl fmt::Debug for InputRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputRule")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

/// Try the rules against `text` typed over `from..to`. The first rule whose
/// handler returns a transaction wins. Rules never fire inside code blocks.
pub fn run_input_rules(
    rules: &[InputRule],
    state: &EditorState,
    from: usize,
    to: usize,
    text: &str,
) -> Option<Transaction> {
    if rules.is_empty() {
        return None;
    }
    let rp = state.doc().resolve(from).ok()?;
    let parent = rp.parent();
    if parent.node_type().spec().code || !parent.inline_content() {
        return None;
    }

    let start_offset = rp.parent_offset.saturating_sub(MAX_MATCH);
    let before = parent.content().text_between(start_offset, rp.parent_offset, "", LEAF_CHAR);
    let text_before = format!("{}{}", before, text);
    let typed_chars = text.chars().count();

    for rule in rules {
        let Some(captures) = rule.pattern.captures(&text_before) else {
            continue;
        };
        let Some(whole) = captures.get(0) else {
            continue;
        };
        let matched_chars = whole.as_str().chars().count();
        let Some(start) = (from + typed_chars).checked_sub(matched_chars) else {
            continue;
        };
        if let Some(tr) = (rule.handler)(state, &captures, start, to) {
            tracing::debug!(rule = %rule.name, start, end = to, "input rule applied");
            return Some(tr);
        }
    }
    None
}

/// Turn a typed URL into a link. Fires on every character typed at the end of
/// a URL so the link target grows with the text.
pub fn url_autolink_rule() -> ComposeResult<InputRule> {
    InputRule::new(
        "url_autolink",
        r"https?://(www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_+.~#?&/=]*)$",
        |state, captures, start, end| {
            let href = captures.get(0)?.as_str();
            let schema = state.schema();
            let link = schema.mark("a", attrs([("href", href)])).ok()?;
            let marks = state.doc().resolve(start).ok()?.marks();
            let linked = schema.text(href, link.add_to_set(&marks)).ok()?;

            let mut tr = state.tr();
            tr.replace(start, end, vec![linked]).ok()?;
            tr.set_selection(Selection::cursor(start + href.chars().count()));
            Some(tr)
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_codec::{AttributeSpec, Attrs};
    use quire_model::{MarkSpec, NodeSpec, Schema, SchemaSpec};

    fn state(code: bool, text: &str) -> EditorState {
        let mut p = NodeSpec::new().content("text*");
        if code {
            p = p.code();
        }
        let schema = Arc::new(
            Schema::new(SchemaSpec {
                nodes: vec![
                    ("doc".to_string(), NodeSpec::new().content("p+")),
                    ("p".to_string(), p),
                    ("text".to_string(), NodeSpec::new()),
                ],
                marks: vec![("a".to_string(), MarkSpec::new().attr("href", AttributeSpec::optional()))],
                top_node: None,
            })
            .unwrap(),
        );
        let content = vec![schema.text(text, vec![]).unwrap()];
        let p = schema.node("p", Attrs::new(), content, vec![]).unwrap();
        let doc = schema.node("doc", Attrs::new(), vec![p], vec![]).unwrap();
        EditorState::create(schema, Some(doc)).unwrap()
    }

    #[test]
    fn test_autolink_wraps_url() {
        let text = "see https://example.co";
        let state = state(false, text);
        let end = 1 + text.len();
        let rules = vec![url_autolink_rule().unwrap()];
        let tr = run_input_rules(&rules, &state, end, end, "m").unwrap();

        let p = tr.doc().child(0).unwrap().clone();
        assert_eq!(p.child_count(), 2);
        assert_eq!(p.child(0).unwrap().text(), "see ");
        let link = p.child(1).unwrap();
        assert_eq!(link.text(), "https://example.com");
        assert_eq!(link.marks()[0].attr("href").and_then(|v| v.as_str()), Some("https://example.com"));
        assert_eq!(tr.selection(), Selection::cursor(end + 1));
    }

    #[test]
    fn test_no_match_without_url() {
        let state = state(false, "plain words");
        let rules = vec![url_autolink_rule().unwrap()];
        assert!(run_input_rules(&rules, &state, 12, 12, " ").is_none());
    }

    #[test]
    fn test_rules_skip_code_blocks() {
        let text = "https://example.com";
        let state = state(true, text);
        let rules = vec![url_autolink_rule().unwrap()];
        let end = 1 + text.len();
        assert!(run_input_rules(&rules, &state, end, end, "m").is_none());
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let err = InputRule::new("broken", "(", |_, _, _, _| None).unwrap_err();
        assert!(matches!(err, ComposeError::InvalidInputRule { .. }));
    }
}
