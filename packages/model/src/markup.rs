//! Schema-driven conversion between documents and markup trees
//!
//! [`DomSerializer`] renders nodes through their `to_dom` specs and groups
//! adjacent inline content under shared mark elements. [`DomParser`] matches
//! elements against the parse rules of every node and mark type and places the
//! result where the content grammar allows, opening wrappers or closing open
//! nodes as needed.

use crate::content::ContentMatch;
use crate::error::{ModelError, ModelResult};
use crate::fragment::Fragment;
use crate::mark::Mark;
use crate::node::Node;
use crate::schema::{NodeType, Schema};
use crate::spec::{DomSpec, ParseRule, Whitespace};
use quire_codec::{to_attributes, Attrs};
use quire_dom::{DomNode, Element};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

/// Hook to override how marks render, e.g. to render per-pass state
pub trait MarkRenderer {
    /// Output for one run of `mark`. `None` falls back to the mark's own spec.
    fn render_mark(&mut self, mark: &Mark, inline: bool) -> Option<DomSpec>;
}

pub struct DomSerializer<'r> {
    renderer: Option<&'r mut dyn MarkRenderer>,
}

impl Default for DomSerializer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> DomSerializer<'r> {
    pub fn new() -> Self {
        Self { renderer: None }
    }

    pub fn with_renderer(renderer: &'r mut dyn MarkRenderer) -> Self {
        Self {
            renderer: Some(renderer),
        }
    }

    pub fn serialize_fragment(&mut self, fragment: &Fragment) -> Vec<DomNode> {
        let mut root: Vec<DomNode> = Vec::new();
        let mut active: Vec<(Mark, Vec<DomNode>)> = Vec::new();

        for node in fragment {
            let marks = node.marks();
            let mut keep = 0;
            while keep < active.len()
                && keep < marks.len()
                && active[keep].0 == marks[keep]
                && marks[keep].mark_type().spec().spanning
            {
                keep += 1;
            }
            while active.len() > keep {
                self.close_mark(&mut active, &mut root);
            }
            for mark in &marks[keep..] {
                active.push((mark.clone(), Vec::new()));
            }

            let rendered = self.render_node(node);
            match active.last_mut() {
                Some((_, children)) => children.extend(rendered),
                None => root.extend(rendered),
            }
        }
        while !active.is_empty() {
            self.close_mark(&mut active, &mut root);
        }
        root
    }

    /// Render a node together with its marks
    pub fn serialize_node(&mut self, node: &Node) -> Vec<DomNode> {
        let mut out = self.render_node(node);
        for mark in node.marks().iter().rev() {
            let spec = self.mark_spec(mark, node.is_inline());
            out = render_spec(&spec, &mut Some(out));
        }
        out
    }

    fn close_mark(&mut self, active: &mut Vec<(Mark, Vec<DomNode>)>, root: &mut Vec<DomNode>) {
        let Some((mark, children)) = active.pop() else {
            return;
        };
        let spec = self.mark_spec(&mark, true);
        let rendered = render_spec(&spec, &mut Some(children));
        match active.last_mut() {
            Some((_, parent)) => parent.extend(rendered),
            None => root.extend(rendered),
        }
    }

    fn mark_spec(&mut self, mark: &Mark, inline: bool) -> DomSpec {
        if let Some(renderer) = self.renderer.as_deref_mut() {
            if let Some(spec) = renderer.render_mark(mark, inline) {
                return spec;
            }
        }
        match &mark.mark_type().spec().to_dom {
            Some(to_dom) => to_dom(mark, inline),
            None => DomSpec::wrap(
                mark.type_name(),
                to_attributes(mark.attrs(), Some(&mark.mark_type().spec().attrs), None),
            ),
        }
    }

    /// A node without its marks
    fn render_node(&mut self, node: &Node) -> Vec<DomNode> {
        if node.is_text() {
            return vec![DomNode::text(node.text())];
        }
        let spec = match &node.node_type().spec().to_dom {
            Some(to_dom) => to_dom(node),
            None => default_node_spec(node),
        };
        let mut content = Some(self.serialize_fragment(node.content()));
        render_spec(&spec, &mut content)
    }
}

fn default_node_spec(node: &Node) -> DomSpec {
    let attrs = to_attributes(node.attrs(), Some(&node.node_type().spec().attrs), None);
    if node.is_leaf() {
        DomSpec::leaf(node.type_name(), attrs)
    } else {
        DomSpec::wrap(node.type_name(), attrs)
    }
}

/// Build markup from a spec. The hole takes `content` once.
fn render_spec(spec: &DomSpec, content: &mut Option<Vec<DomNode>>) -> Vec<DomNode> {
    match spec {
        DomSpec::Hole => content.take().unwrap_or_default(),
        DomSpec::Text(text) => vec![DomNode::text(text.clone())],
        DomSpec::Element { tag, attrs, children } => {
            let mut element = Element::new(tag.clone());
            element.attributes = attrs.clone();
            for child in children {
                element.children.extend(render_spec(child, content));
            }
            vec![DomNode::Element(element)]
        }
    }
}

/// What a parse rule produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTarget {
    Node(String),
    Mark(String),
}

/// Parses markup trees into documents of one schema
pub struct DomParser {
    schema: Arc<Schema>,
    rules: Vec<(RuleTarget, ParseRule)>,
}

impl DomParser {
    /// Collect the parse rules of every node type, then every mark type,
    /// ordered by priority. Ties keep declaration order.
    pub fn from_schema(schema: Arc<Schema>) -> Self {
        let mut rules: Vec<(RuleTarget, ParseRule)> = Vec::new();
        for node_type in schema.node_types() {
            for rule in &node_type.spec().parse_dom {
                rules.push((RuleTarget::Node(node_type.name().to_string()), rule.clone()));
            }
        }
        for mark_type in schema.mark_types() {
            for rule in &mark_type.spec().parse_dom {
                rules.push((RuleTarget::Mark(mark_type.name().to_string()), rule.clone()));
            }
        }
        rules.sort_by(|a, b| b.1.priority.cmp(&a.1.priority));
        Self { schema, rules }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn rules(&self) -> &[(RuleTarget, ParseRule)] {
        &self.rules
    }

    /// First rule matching `element`, with the attributes it reads
    pub fn match_element(&self, element: &Element) -> Option<(&RuleTarget, &ParseRule, Attrs)> {
        for (target, rule) in &self.rules {
            let Some(attrs) = rule.read_attrs(element) else {
                continue;
            };
            let accepted = match target {
                RuleTarget::Node(name) => self
                    .schema
                    .node_type(name)
                    .map(|t| t.compute_attrs(&attrs).is_ok())
                    .unwrap_or(false),
                RuleTarget::Mark(name) => self
                    .schema
                    .mark_type(name)
                    .map(|t| t.compute_attrs(&attrs).is_ok())
                    .unwrap_or(false),
            };
            if accepted || rule.ignore || rule.skip {
                return Some((target, rule, attrs));
            }
        }
        None
    }

    /// Parse into a node of the top type with default attributes
    pub fn parse(&self, nodes: &[DomNode]) -> ModelResult<Node> {
        self.parse_with(nodes, self.schema.top_node_name(), Attrs::new())
    }

    /// Parse into a node of `type_name` with `attrs`
    pub fn parse_with(&self, nodes: &[DomNode], type_name: &str, attrs: Attrs) -> ModelResult<Node> {
        let node_type = self
            .schema
            .node_type(type_name)
            .ok_or_else(|| ModelError::UnknownNodeType(type_name.to_string()))?
            .clone();
        let attrs = node_type.compute_attrs(&attrs)?;
        let mut context = ParseContext {
            parser: self,
            stack: vec![OpenNode::new(node_type, attrs, Vec::new(), false)],
        };
        context.add_all(nodes, &[]);
        while context.stack.len() > 1 {
            context.close_top();
        }
        match context.stack.pop() {
            Some(top) => Ok(context.finish(top)),
            None => Err(ModelError::MissingTopNode(type_name.to_string())),
        }
    }
}

struct OpenNode {
    node_type: Arc<NodeType>,
    attrs: Attrs,
    marks: Vec<Mark>,
    content: Vec<Node>,
    content_match: ContentMatch,
    pre: bool,
}

impl OpenNode {
    fn new(node_type: Arc<NodeType>, attrs: Attrs, marks: Vec<Mark>, parent_pre: bool) -> Self {
        let pre = parent_pre || node_type.whitespace() == Whitespace::Pre;
        Self {
            content_match: node_type.content_match().clone(),
            node_type,
            attrs,
            marks,
            content: Vec::new(),
            pre,
        }
    }
}

struct ParseContext<'p> {
    parser: &'p DomParser,
    stack: Vec<OpenNode>,
}

/// Wrapper nesting tried when placing a node
const MAX_WRAP_DEPTH: usize = 3;

impl ParseContext<'_> {
    fn schema(&self) -> &Schema {
        &self.parser.schema
    }

    fn top(&self) -> Option<&OpenNode> {
        self.stack.last()
    }

    fn add_all(&mut self, nodes: &[DomNode], marks: &[Mark]) {
        for node in nodes {
            match node {
                DomNode::Text(text) => self.add_text(text, marks),
                DomNode::Element(element) => self.add_element(element, marks),
                DomNode::Comment(_) => {}
            }
        }
    }

    fn add_text(&mut self, text: &str, marks: &[Mark]) {
        let Some(top) = self.top() else {
            return;
        };
        let mut value = if top.pre {
            text.replace("\r\n", "\n")
        } else {
            collapse_whitespace(text)
        };
        if !top.pre && value.starts_with(' ') {
            let strip = match top.content.last() {
                None => true,
                Some(last) => !last.is_inline() || (last.is_text() && last.text().ends_with(' ')),
            };
            if strip {
                value.remove(0);
            }
        }
        if value.is_empty() {
            return;
        }
        if value.trim().is_empty() && top.content_match.match_type("text").is_none() && !top.node_type.inline_content() {
            return;
        }
        match self.schema().text(value, marks.to_vec()) {
            Ok(node) => {
                self.insert_node(node);
            }
            Err(err) => tracing::warn!(%err, "cannot create text node"),
        }
    }

    fn add_element(&mut self, element: &Element, marks: &[Mark]) {
        let parser = self.parser;
        let Some((target, rule, attrs)) = parser.match_element(element) else {
            self.add_all(&element.children, marks);
            return;
        };
        if rule.ignore {
            return;
        }
        if rule.skip {
            self.add_all(&element.children, marks);
            return;
        }
        match target.clone() {
            RuleTarget::Mark(name) => match self.schema().mark(&name, attrs) {
                Ok(mark) => {
                    let marks = mark.add_to_set(marks);
                    self.add_all(&element.children, &marks);
                }
                Err(err) => {
                    tracing::warn!(%err, tag = %element.tag, "dropping mark");
                    self.add_all(&element.children, marks);
                }
            },
            RuleTarget::Node(name) => {
                let Some(node_type) = self.schema().node_type(&name).cloned() else {
                    return;
                };
                if node_type.is_leaf() {
                    match self.schema().node(&name, attrs, Vec::new(), marks.to_vec()) {
                        Ok(node) => {
                            self.insert_node(node);
                        }
                        Err(err) => tracing::warn!(%err, tag = %element.tag, "dropping leaf"),
                    }
                    return;
                }
                if !self.find_place(&name) {
                    tracing::warn!(tag = %element.tag, node = %name, "no place for node, keeping its content");
                    self.add_all(&element.children, marks);
                    return;
                }
                let Ok(attrs) = node_type.compute_attrs(&attrs) else {
                    return;
                };
                self.open(node_type, attrs, marks.to_vec());
                let depth = self.stack.len();
                self.add_all(&element.children, marks);
                while self.stack.len() >= depth && self.stack.len() > 1 {
                    self.close_top();
                }
            }
        }
    }

    /// Place a complete node
    fn insert_node(&mut self, node: Node) -> bool {
        if !self.find_place(node.type_name()) {
            tracing::warn!(node = %node.type_name(), "no place for node, dropping it");
            return false;
        }
        let Some(top) = self.stack.last_mut() else {
            return false;
        };
        let marks: Vec<Mark> = node
            .marks()
            .iter()
            .filter(|m| top.node_type.allows_mark_type(m.type_name()))
            .cloned()
            .collect();
        let node = if marks.len() == node.marks().len() {
            node
        } else {
            node.mark(marks)
        };
        if let Some(next) = top.content_match.match_type(node.type_name()) {
            top.content_match = next;
        }
        top.content.push(node);
        true
    }

    /// Make the top of the stack accept `type_name`: close open nodes, insert
    /// required siblings before it, or open wrappers around it
    fn find_place(&mut self, type_name: &str) -> bool {
        let schema = self.parser.schema.clone();
        let fillable = |name: &str| schema.is_fillable(name);
        for depth in (0..self.stack.len()).rev() {
            let content_match = self.stack[depth].content_match.clone();
            if content_match.match_type(type_name).is_some() {
                self.close_to(depth);
                return true;
            }
            if let Some(fill) = content_match.fill_before(&[type_name], false, &fillable) {
                self.close_to(depth);
                for name in fill {
                    match schema.create_and_fill(&name, Attrs::new(), Vec::new()) {
                        Ok(node) => {
                            let top = &mut self.stack[depth];
                            if let Some(next) = top.content_match.match_type(&name) {
                                top.content_match = next;
                            }
                            top.content.push(node);
                        }
                        Err(_) => return false,
                    }
                }
                return true;
            }
            if let Some(wrappers) = find_wrapping(&schema, &content_match, type_name) {
                self.close_to(depth);
                for name in wrappers {
                    if let Some(node_type) = schema.node_type(&name).cloned() {
                        if let Ok(attrs) = node_type.compute_attrs(&Attrs::new()) {
                            self.open(node_type, attrs, Vec::new());
                        }
                    }
                }
                return true;
            }
        }
        false
    }

    fn close_to(&mut self, depth: usize) {
        while self.stack.len() > depth + 1 {
            self.close_top();
        }
    }

    fn open(&mut self, node_type: Arc<NodeType>, attrs: Attrs, marks: Vec<Mark>) {
        let parent_pre = match self.stack.last_mut() {
            Some(parent) => {
                if let Some(next) = parent.content_match.match_type(node_type.name()) {
                    parent.content_match = next;
                }
                parent.pre
            }
            None => false,
        };
        let marks = if node_type.is_inline() { marks } else { Vec::new() };
        self.stack.push(OpenNode::new(node_type, attrs, marks, parent_pre));
    }

    fn close_top(&mut self) {
        let Some(open) = self.stack.pop() else {
            return;
        };
        let node = self.finish(open);
        if let Some(parent) = self.stack.last_mut() {
            parent.content.push(node);
        }
    }

    /// Fill missing required content and build the node
    fn finish(&self, open: OpenNode) -> Node {
        let schema = self.schema();
        let mut content = open.content;
        if !open.pre && open.node_type.inline_content() {
            if let Some(last) = content.pop() {
                if last.is_text() && last.text().ends_with(' ') {
                    let trimmed = last.text().trim_end().to_string();
                    if !trimmed.is_empty() {
                        content.push(last.with_text(trimmed));
                    }
                } else {
                    content.push(last);
                }
            }
        }
        let fillable = |name: &str| schema.is_fillable(name);
        if let Some(fill) = open.content_match.fill_before::<&str>(&[], true, &fillable) {
            for name in fill {
                if let Ok(node) = schema.create_and_fill(&name, Attrs::new(), Vec::new()) {
                    content.push(node);
                }
            }
        }
        let name = open.node_type.name().to_string();
        match schema.node(&name, open.attrs.clone(), content.clone(), open.marks.clone()) {
            Ok(node) => node,
            Err(err) => {
                tracing::warn!(%err, node = %name, "keeping invalid content");
                Node::new(open.node_type, open.attrs, Fragment::from_vec(content), open.marks)
            }
        }
    }
}

/// Wrapper types that let `content_match` accept `target`, outermost first
fn find_wrapping(schema: &Schema, content_match: &ContentMatch, target: &str) -> Option<Vec<String>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<(ContentMatch, Vec<String>)> = VecDeque::new();
    queue.push_back((content_match.clone(), Vec::new()));
    while let Some((current, path)) = queue.pop_front() {
        for name in current.next_types() {
            let Some(node_type) = schema.node_type(name) else {
                continue;
            };
            if node_type.is_text() || node_type.is_leaf() || node_type.has_required_attrs() {
                continue;
            }
            if !seen.insert(name.to_string()) {
                continue;
            }
            let mut next_path = path.clone();
            next_path.push(name.to_string());
            if node_type.content_match().match_type(target).is_some() {
                return Some(next_path);
            }
            if next_path.len() < MAX_WRAP_DEPTH {
                queue.push_back((node_type.content_match().clone(), next_path));
            }
        }
    }
    None
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0c') {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{MarkSpec, NodeSpec};
    use crate::SchemaSpec;
    use quire_codec::{get_attrs, AttributeSpec};
    use quire_dom::{parse_fragment, to_html, SerializeOptions};

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
                        "pre".to_string(),
                        NodeSpec::new()
                            .content("text*")
                            .group("block")
                            .code()
                            .parse_rule(ParseRule::tag("pre")),
                    ),
                    (
                        "ul".to_string(),
                        NodeSpec::new()
                            .content("li+")
                            .group("block")
                            .parse_rule(ParseRule::tag("ul")),
                    ),
                    (
                        "li".to_string(),
                        NodeSpec::new().content("p block*").parse_rule(ParseRule::tag("li")),
                    ),
                    (
                        "img".to_string(),
                        NodeSpec::new()
                            .inline()
                            .group("inline")
                            .attr("src", AttributeSpec::required())
                            .parse_rule(ParseRule::tag("img[src]").get_attrs(|el| get_attrs(el, false))),
                    ),
                    ("text".to_string(), NodeSpec::new().group("inline")),
                ],
                marks: vec![
                    ("em".to_string(), MarkSpec::new().parse_rule(ParseRule::tag("em"))),
                    (
                        "strong".to_string(),
                        MarkSpec::new().parse_rule(ParseRule::tag("b").priority(60)),
                    ),
                ],
                top_node: None,
            })
            .unwrap(),
        )
    }

    fn parse(schema: &Arc<Schema>, html: &str) -> Node {
        let nodes = parse_fragment(html).unwrap();
        DomParser::from_schema(schema.clone()).parse(&nodes).unwrap()
    }

    fn serialize(node: &Node) -> String {
        let dom = DomSerializer::new().serialize_fragment(node.content());
        to_html(&dom, &SerializeOptions::default())
    }

    #[test]
    fn test_parse_paragraphs_and_marks() {
        let schema = schema();
        let doc = parse(&schema, "<p>Hello <em>big <b>world</b></em></p>");
        assert_eq!(doc.to_string(), "doc(p(\"Hello \", em(\"big \"), em(strong(\"world\"))))");
    }

    #[test]
    fn test_empty_input_is_filled() {
        let schema = schema();
        assert_eq!(parse(&schema, "").to_string(), "doc(p)");
    }

    #[test]
    fn test_loose_text_is_wrapped() {
        let schema = schema();
        assert_eq!(parse(&schema, "loose text").to_string(), "doc(p(\"loose text\"))");
    }

    #[test]
    fn test_list_item_gets_paragraph() {
        let schema = schema();
        let doc = parse(&schema, "<ul><li>one</li><li><p>two</p></li></ul>");
        assert_eq!(doc.to_string(), "doc(ul(li(p(\"one\")), li(p(\"two\"))))");
    }

    #[test]
    fn test_whitespace_collapsing() {
        let schema = schema();
        let doc = parse(&schema, "<p>  a \n\n b  </p>\n<pre>  x\n  y</pre>");
        assert_eq!(doc.to_string(), "doc(p(\"a b\"), pre(\"  x\\n  y\"))");
    }

    #[test]
    fn test_rejected_leaf_is_dropped() {
        let schema = schema();
        let doc = parse(&schema, "<p>a<img>b<img src=\"x.png\"></p>");
        assert_eq!(doc.child(0).unwrap().child_count(), 2);
        assert_eq!(doc.child(0).unwrap().child(1).unwrap().attr_str("src"), Some("x.png"));
    }

    #[test]
    fn test_serialize_groups_marks() {
        let schema = schema();
        let doc = parse(&schema, "<p><em>a<b>b</b>c</em></p>");
        assert_eq!(serialize(&doc), "<p><em>a<strong>b</strong>c</em></p>");
    }

    struct Italic;

    impl MarkRenderer for Italic {
        fn render_mark(&mut self, mark: &Mark, _inline: bool) -> Option<DomSpec> {
            (mark.type_name() == "em").then(|| DomSpec::wrap("i", vec![]))
        }
    }

    #[test]
    fn test_mark_renderer_hook() {
        let schema = schema();
        let doc = parse(&schema, "<p><em>a</em></p>");
        let mut renderer = Italic;
        let dom = DomSerializer::with_renderer(&mut renderer).serialize_fragment(doc.content());
        assert_eq!(to_html(&dom, &SerializeOptions::default()), "<p><i>a</i></p>");
    }
}
