//! # Editing Session
//!
//! One document open for editing: the body and head sub-documents, each with
//! its own schema, snapshot and history.
//!
//! Every edit replaces a snapshot with the one a transaction produces. Edits
//! that do not apply leave the snapshots alone and report `false`.

use crate::comments::{self, CommentTarget, CommentThread};
use crate::errors::EditorResult;
use crate::head::{self, Direction, HeadMatch, Matcher};
use crate::import::{strip_blank_text, upgrade_deprecated_attributes, upgrade_element};
use crate::options::EditorOptions;
use crate::render::CommentRenderPass;
use crate::sync::OWNED_MARKER;
use quire_codec::{
    fold_comment_threads, get_attrs_with, to_attributes, unfold_comment_threads, AttrValue, Attrs, EDITING_ATTR,
};
use quire_dom::{parse_document, DomNode, Element, ParsedDocument, SerializeOptions};
use quire_model::{DomParser, EditorState, Node, Selection, Transaction};
use quire_schema::{composer_for, head_schema, run_input_rules, ComposedSchema};
use std::collections::BTreeMap;

const HTML_ATTRS: &str = "htmlAttrs";

pub struct EditorSession {
    body_schema: ComposedSchema,
    head_schema: ComposedSchema,
    body: EditorState,
    head: EditorState,
    options: EditorOptions,
}

impl EditorSession {
    /// A session with an empty body and a fresh head
    pub fn new(options: EditorOptions) -> EditorResult<Self> {
        let body_schema = composer_for(options.plugins.as_slice())?.compose()?;
        let head_schema = head_schema()?;
        let body = EditorState::with_history_depth(
            body_schema.schema.clone(),
            Some(body_schema.doc.clone()),
            options.undo_depth,
        )?;
        let head = head::initial_head_state(&head_schema.schema, options.lang.as_deref(), None)?;
        tracing::debug!(plugins = ?body_schema.plugins, "editor session created");
        Ok(Self {
            body_schema,
            head_schema,
            body,
            head,
            options,
        })
    }

    /// A session holding the document `html`
    pub fn open(html: &str, options: EditorOptions) -> EditorResult<Self> {
        let mut session = Self::new(options)?;
        session.import_html(html)?;
        Ok(session)
    }

    pub fn body(&self) -> &EditorState {
        &self.body
    }

    pub fn head(&self) -> &EditorState {
        &self.head
    }

    pub fn body_schema(&self) -> &ComposedSchema {
        &self.body_schema
    }

    pub fn head_schema(&self) -> &ComposedSchema {
        &self.head_schema
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// Replace both sub-documents with the content of `html`. History starts
    /// over.
    pub fn import_html(&mut self, html: &str) -> EditorResult<()> {
        let ParsedDocument {
            html_attrs,
            head,
            body,
        } = parse_document(html)?;

        let head_doc = self.import_head(head, html_attrs)?;
        let body_doc = self.import_body(body)?;
        self.head = EditorState::create(self.head_schema.schema.clone(), Some(head_doc))?;
        self.body = EditorState::with_history_depth(
            self.body_schema.schema.clone(),
            Some(body_doc),
            self.options.undo_depth,
        )?;
        tracing::debug!(
            head = self.head.doc().child_count(),
            body = self.body.doc().child_count(),
            "document imported"
        );
        Ok(())
    }

    fn prepare(&self, nodes: Vec<DomNode>) -> Vec<DomNode> {
        let mut nodes = fold_comment_threads(nodes);
        if self.options.import_deprecated {
            let upgraded = upgrade_deprecated_attributes(&mut nodes);
            if upgraded > 0 {
                tracing::debug!(upgraded, "deprecated attributes upgraded");
            }
        }
        nodes
    }

    fn import_head(&self, head: Element, html_attrs: Vec<(String, String)>) -> EditorResult<Node> {
        let schema = &self.head_schema.schema;
        let nodes: Vec<DomNode> = strip_blank_text(head.children)
            .into_iter()
            .filter(|node| {
                node.as_element()
                    .and_then(|el| el.get_attribute(EDITING_ATTR))
                    != Some(OWNED_MARKER)
            })
            .collect();
        let nodes = self.prepare(nodes);

        let specs = &schema.top_node_type().spec().attrs;
        let mut attrs = get_attrs_with(&Element { children: Vec::new(), ..head }, Some(specs), false)
            .unwrap_or_default();
        let html_attrs: BTreeMap<String, AttrValue> = html_attrs
            .into_iter()
            .map(|(name, value)| (name, AttrValue::from(value)))
            .collect();
        attrs.insert(HTML_ATTRS.to_string(), AttrValue::Map(html_attrs));

        Ok(DomParser::from_schema(schema.clone()).parse_with(&nodes, schema.top_node_name(), attrs)?)
    }

    fn import_body(&self, body: Element) -> EditorResult<Node> {
        let schema = &self.body_schema.schema;
        let mut shell = Element {
            children: Vec::new(),
            ..body
        };
        if self.options.import_deprecated {
            upgrade_element(&mut shell);
        }
        let nodes = self.prepare(body.children);
        let specs = &schema.top_node_type().spec().attrs;
        let attrs = get_attrs_with(&shell, Some(specs), false).unwrap_or_default();
        Ok(DomParser::from_schema(schema.clone()).parse_with(&nodes, schema.top_node_name(), attrs)?)
    }

    /// The whole document as HTML, comment threads unfolded into HTML comments
    pub fn export_html(&self, options: &SerializeOptions) -> String {
        let mut pass = CommentRenderPass::new();
        let head_doc = self.head.doc();
        let body_doc = self.body.doc();

        let html_attrs = head_doc
            .attr(HTML_ATTRS)
            .and_then(AttrValue::as_map)
            .map(|map| map.iter().map(|(k, v)| (k.clone(), v.to_markup())).collect())
            .unwrap_or_default();

        let document = ParsedDocument {
            html_attrs,
            head: Element {
                tag: "head".to_string(),
                attributes: root_attributes(head_doc),
                children: unfold_comment_threads(pass.serialize(head_doc.content())),
            },
            body: Element {
                tag: "body".to_string(),
                attributes: root_attributes(body_doc),
                children: unfold_comment_threads(pass.serialize(body_doc.content())),
            },
        };
        document.to_html(options)
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.body = self.body.with_selection(selection);
    }

    fn apply_body(&mut self, tr: Option<Transaction>) -> bool {
        match tr {
            Some(tr) => {
                self.body = self.body.apply(&tr);
                true
            }
            None => false,
        }
    }

    /// Run the command bound to `key`. Returns whether one applied.
    pub fn handle_key(&mut self, key: &str) -> bool {
        let tr = self.body_schema.keymap.handle(key, &self.body);
        if tr.is_none() {
            tracing::debug!(key, "no command applied");
        }
        self.apply_body(tr)
    }

    /// Run the named command
    pub fn run_command(&mut self, name: &str) -> bool {
        let tr = self.body_schema.command(name).and_then(|command| command.run(&self.body));
        self.apply_body(tr)
    }

    /// Type `text` over the selection. Input rules get the first chance;
    /// otherwise the text replaces the selection.
    pub fn handle_text_input(&mut self, text: &str) -> bool {
        let doc = self.body.doc();
        let (from, to) = self.body.selection().range(doc);
        if let Some(tr) = run_input_rules(&self.body_schema.input_rules, &self.body, from, to, text) {
            return self.apply_body(Some(tr));
        }

        let mut tr = self.body.tr();
        let typed = tr
            .delete_range(from, to)
            .and_then(|tr| tr.insert_text(from, text))
            .map(|tr| {
                tr.set_selection(Selection::cursor(from + text.chars().count()));
            });
        match typed {
            Ok(()) => self.apply_body(Some(tr)),
            Err(err) => {
                tracing::debug!(error = %err, "text input not applicable");
                false
            }
        }
    }

    pub fn undo(&mut self) -> bool {
        match self.body.undo() {
            Some(state) => {
                self.body = state;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.body.redo() {
            Some(state) => {
                self.body = state;
                true
            }
            None => false,
        }
    }

    fn replace_head(&mut self, next: EditorState) -> bool {
        let changed = !head::head_equal(self.head.doc(), next.doc());
        self.head = next;
        changed
    }

    pub fn set_head_attributes(&mut self, attrs: Attrs) -> bool {
        let next = head::set_head_attributes(&self.head, attrs);
        self.replace_head(next)
    }

    pub fn upsert_head_element(
        &mut self,
        name: &str,
        attrs: Attrs,
        content: Vec<Node>,
        matcher: &Matcher<'_>,
    ) -> bool {
        let next = head::upsert_head_element(&self.head, name, attrs, content, matcher);
        self.replace_head(next)
    }

    pub fn get_head_element(&self, matcher: &Matcher<'_>) -> Option<HeadMatch> {
        head::get_head_element(&self.head, matcher)
    }

    pub fn get_head_element_all(&self, matcher: &Matcher<'_>) -> Vec<HeadMatch> {
        head::get_head_element_all(&self.head, matcher)
    }

    pub fn delete_head_element(&mut self, matcher: &Matcher<'_>) -> bool {
        let next = head::delete_head_element(&self.head, matcher);
        self.replace_head(next)
    }

    pub fn move_head_element(&mut self, pos: usize, direction: Direction) -> bool {
        let next = head::move_head_element(&self.head, pos, direction);
        self.replace_head(next)
    }

    /// Start a comment thread on the body selection as the configured author
    pub fn add_comment(&mut self, content: &str) -> EditorResult<()> {
        let tr = comments::add_comment(&self.body, content, &self.options.author)?;
        self.body = self.body.apply(&tr);
        Ok(())
    }

    pub fn reply_comment(&mut self, target: &CommentTarget, content: &str) -> EditorResult<()> {
        let tr = comments::reply_comment(&self.body, target, content, &self.options.author)?;
        self.body = self.body.apply(&tr);
        Ok(())
    }

    pub fn update_comment(&mut self, target: &CommentTarget, index: usize, content: &str) -> EditorResult<()> {
        let tr = comments::update_comment(&self.body, target, index, content)?;
        self.body = self.body.apply(&tr);
        Ok(())
    }

    pub fn delete_comment(&mut self, target: &CommentTarget, index: usize) -> EditorResult<()> {
        let tr = comments::delete_comment(&self.body, target, index)?;
        self.body = self.body.apply(&tr);
        Ok(())
    }

    /// Threads of the body followed by threads of the head
    pub fn comment_threads(&self) -> Vec<CommentThread> {
        let mut threads = comments::comment_threads(&self.body);
        threads.extend(comments::comment_threads(&self.head));
        threads
    }
}

fn root_attributes(doc: &Node) -> Vec<(String, String)> {
    to_attributes(doc.attrs(), Some(&doc.node_type().spec().attrs), None)
}
