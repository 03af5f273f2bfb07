//! Declarative node and mark specs, DOM output specs and parse rules

use crate::mark::Mark;
use crate::node::Node;
use quire_codec::{AttributeSpec, AttributeSpecs, Attrs};
use quire_dom::Element;
use std::fmt;
use std::sync::Arc;

pub type ToDomFn = Arc<dyn Fn(&Node) -> DomSpec + Send + Sync>;
pub type MarkToDomFn = Arc<dyn Fn(&Mark, bool) -> DomSpec + Send + Sync>;
pub type GetAttrsFn = Arc<dyn Fn(&Element) -> Option<Attrs> + Send + Sync>;
pub type LeafTextFn = Arc<dyn Fn(&Node) -> String + Send + Sync>;

/// Shape a node or mark renders to
#[derive(Debug, Clone, PartialEq)]
pub enum DomSpec {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<DomSpec>,
    },
    /// Where the node's content is rendered
    Hole,
    Text(String),
}

impl DomSpec {
    /// Element without content
    pub fn leaf(tag: impl Into<String>, attrs: Vec<(String, String)>) -> Self {
        DomSpec::Element {
            tag: tag.into(),
            attrs,
            children: Vec::new(),
        }
    }

    /// Element whose children are the node's content
    pub fn wrap(tag: impl Into<String>, attrs: Vec<(String, String)>) -> Self {
        DomSpec::Element {
            tag: tag.into(),
            attrs,
            children: vec![DomSpec::Hole],
        }
    }

    pub fn has_hole(&self) -> bool {
        match self {
            DomSpec::Hole => true,
            DomSpec::Element { children, .. } => children.iter().any(DomSpec::has_hole),
            DomSpec::Text(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrCondition {
    Present(String),
    Equals(String, String),
    Absent(String),
    NotEquals(String, String),
}

/// Minimal element selector: `tag`, `*`, `[attr]`, `[attr=value]` and `:not([...])`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    conditions: Vec<AttrCondition>,
}

impl Selector {
    pub fn parse(source: &str) -> Self {
        let source = source.trim();
        let tag_end = source.find(['[', ':']).unwrap_or(source.len());
        let tag = match &source[..tag_end] {
            "" | "*" => None,
            tag => Some(tag.to_string()),
        };

        let mut conditions = Vec::new();
        let mut rest = &source[tag_end..];
        while !rest.is_empty() {
            let negated = rest.starts_with(":not(");
            if negated {
                rest = &rest[":not(".len()..];
            }
            let Some(open) = rest.find('[') else { break };
            let Some(close) = rest[open..].find(']').map(|i| i + open) else { break };
            let body = &rest[open + 1..close];
            let condition = match body.split_once('=') {
                Some((name, value)) => {
                    let value = value.trim_matches(|c| c == '"' || c == '\'').to_string();
                    if negated {
                        AttrCondition::NotEquals(name.trim().to_string(), value)
                    } else {
                        AttrCondition::Equals(name.trim().to_string(), value)
                    }
                }
                None if negated => AttrCondition::Absent(body.trim().to_string()),
                None => AttrCondition::Present(body.trim().to_string()),
            };
            conditions.push(condition);
            rest = &rest[close + 1..];
            if negated {
                rest = rest.strip_prefix(')').unwrap_or(rest);
            }
        }

        Self { tag, conditions }
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if !tag.eq_ignore_ascii_case(&element.tag) {
                return false;
            }
        }
        self.conditions.iter().all(|condition| match condition {
            AttrCondition::Present(name) => element.has_attribute(name),
            AttrCondition::Equals(name, value) => element.get_attribute(name) == Some(value.as_str()),
            AttrCondition::Absent(name) => !element.has_attribute(name),
            AttrCondition::NotEquals(name, value) => element.get_attribute(name) != Some(value.as_str()),
        })
    }
}

/// How an element is recognized during DOM import
#[derive(Clone)]
pub struct ParseRule {
    pub selector: Selector,
    /// Higher runs first; ties keep declaration order
    pub priority: i32,
    /// Attributes from the element, `None` rejects the match
    pub get_attrs: Option<GetAttrsFn>,
    /// Fixed attributes for every match
    pub attrs: Option<Attrs>,
    /// Drop the element and its content
    pub ignore: bool,
    /// Parse the element's children in place of the element
    pub skip: bool,
}

impl ParseRule {
    pub const DEFAULT_PRIORITY: i32 = 50;

    pub fn tag(selector: &str) -> Self {
        Self {
            selector: Selector::parse(selector),
            priority: Self::DEFAULT_PRIORITY,
            get_attrs: None,
            attrs: None,
            ignore: false,
            skip: false,
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn get_attrs(mut self, get_attrs: impl Fn(&Element) -> Option<Attrs> + Send + Sync + 'static) -> Self {
        self.get_attrs = Some(Arc::new(get_attrs));
        self
    }

    pub fn attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = Some(attrs);
        self
    }

    pub fn ignore(mut self) -> Self {
        self.ignore = true;
        self
    }

    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    /// Attributes for `element`, or `None` if the rule does not apply
    pub fn read_attrs(&self, element: &Element) -> Option<Attrs> {
        if !self.selector.matches(element) {
            return None;
        }
        let mut attrs = match &self.get_attrs {
            Some(get_attrs) => get_attrs(element)?,
            None => Attrs::new(),
        };
        if let Some(fixed) = &self.attrs {
            for (k, v) in fixed {
                attrs.insert(k.clone(), v.clone());
            }
        }
        Some(attrs)
    }
}

impl fmt::Debug for ParseRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseRule")
            .field("selector", &self.selector)
            .field("priority", &self.priority)
            .field("ignore", &self.ignore)
            .field("skip", &self.skip)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Whitespace {
    #[default]
    Normal,
    Pre,
}

/// Declaration of a node type
#[derive(Clone)]
pub struct NodeSpec {
    pub content: Option<String>,
    /// Allowed marks: `_` for all, empty for none, otherwise names and groups
    pub marks: Option<String>,
    pub group: Option<String>,
    pub inline: bool,
    pub atom: bool,
    pub selectable: bool,
    pub draggable: bool,
    pub code: bool,
    pub whitespace: Whitespace,
    pub defining: bool,
    pub isolating: bool,
    pub attrs: AttributeSpecs,
    pub to_dom: Option<ToDomFn>,
    pub parse_dom: Vec<ParseRule>,
    pub leaf_text: Option<LeafTextFn>,
}

impl Default for NodeSpec {
    fn default() -> Self {
        Self {
            content: None,
            marks: None,
            group: None,
            inline: false,
            atom: false,
            selectable: true,
            draggable: false,
            code: false,
            whitespace: Whitespace::Normal,
            defining: false,
            isolating: false,
            attrs: AttributeSpecs::new(),
            to_dom: None,
            parse_dom: Vec::new(),
            leaf_text: None,
        }
    }
}

impl NodeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, expr: impl Into<String>) -> Self {
        self.content = Some(expr.into());
        self
    }

    pub fn marks(mut self, marks: impl Into<String>) -> Self {
        self.marks = Some(marks.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    pub fn atom(mut self) -> Self {
        self.atom = true;
        self
    }

    pub fn selectable(mut self, selectable: bool) -> Self {
        self.selectable = selectable;
        self
    }

    pub fn draggable(mut self) -> Self {
        self.draggable = true;
        self
    }

    pub fn code(mut self) -> Self {
        self.code = true;
        self
    }

    pub fn whitespace_pre(mut self) -> Self {
        self.whitespace = Whitespace::Pre;
        self
    }

    pub fn defining(mut self) -> Self {
        self.defining = true;
        self
    }

    pub fn isolating(mut self) -> Self {
        self.isolating = true;
        self
    }

    pub fn attrs(mut self, attrs: AttributeSpecs) -> Self {
        self.attrs.extend(&attrs);
        self
    }

    pub fn attr(mut self, name: impl Into<String>, spec: AttributeSpec) -> Self {
        self.attrs.insert(name, spec);
        self
    }

    pub fn to_dom(mut self, to_dom: impl Fn(&Node) -> DomSpec + Send + Sync + 'static) -> Self {
        self.to_dom = Some(Arc::new(to_dom));
        self
    }

    pub fn parse_rule(mut self, rule: ParseRule) -> Self {
        self.parse_dom.push(rule);
        self
    }

    pub fn parse_rules(mut self, rules: Vec<ParseRule>) -> Self {
        self.parse_dom = rules;
        self
    }

    pub fn leaf_text(mut self, leaf_text: impl Fn(&Node) -> String + Send + Sync + 'static) -> Self {
        self.leaf_text = Some(Arc::new(leaf_text));
        self
    }

    /// Whether the content expression allows no children at all
    pub fn is_leaf(&self) -> bool {
        self.content.as_deref().map(str::trim).unwrap_or("").is_empty()
    }
}

impl fmt::Debug for NodeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSpec")
            .field("content", &self.content)
            .field("marks", &self.marks)
            .field("group", &self.group)
            .field("inline", &self.inline)
            .field("atom", &self.atom)
            .field("attrs", &self.attrs.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .field("parse_dom", &self.parse_dom)
            .finish()
    }
}

/// Declaration of a mark type
#[derive(Clone)]
pub struct MarkSpec {
    pub attrs: AttributeSpecs,
    pub inclusive: bool,
    /// Marks this one excludes: `None` for its own type, empty for none, `_` for all
    pub excludes: Option<String>,
    pub group: Option<String>,
    pub spanning: bool,
    pub to_dom: Option<MarkToDomFn>,
    pub parse_dom: Vec<ParseRule>,
}

impl Default for MarkSpec {
    fn default() -> Self {
        Self {
            attrs: AttributeSpecs::new(),
            inclusive: true,
            excludes: None,
            group: None,
            spanning: true,
            to_dom: None,
            parse_dom: Vec::new(),
        }
    }
}

impl MarkSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attrs(mut self, attrs: AttributeSpecs) -> Self {
        self.attrs.extend(&attrs);
        self
    }

    pub fn attr(mut self, name: impl Into<String>, spec: AttributeSpec) -> Self {
        self.attrs.insert(name, spec);
        self
    }

    pub fn inclusive(mut self, inclusive: bool) -> Self {
        self.inclusive = inclusive;
        self
    }

    pub fn excludes(mut self, excludes: impl Into<String>) -> Self {
        self.excludes = Some(excludes.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn spanning(mut self, spanning: bool) -> Self {
        self.spanning = spanning;
        self
    }

    pub fn to_dom(mut self, to_dom: impl Fn(&Mark, bool) -> DomSpec + Send + Sync + 'static) -> Self {
        self.to_dom = Some(Arc::new(to_dom));
        self
    }

    pub fn parse_rule(mut self, rule: ParseRule) -> Self {
        self.parse_dom.push(rule);
        self
    }
}

impl fmt::Debug for MarkSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkSpec")
            .field("inclusive", &self.inclusive)
            .field("excludes", &self.excludes)
            .field("group", &self.group)
            .field("spanning", &self.spanning)
            .field("parse_dom", &self.parse_dom)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_tag_and_attrs() {
        let selector = Selector::parse("meta[name=generator]");
        assert!(selector.matches(&Element::new("meta").with_attr("name", "generator")));
        assert!(!selector.matches(&Element::new("meta").with_attr("name", "author")));
        assert!(!selector.matches(&Element::new("link").with_attr("name", "generator")));
    }

    #[test]
    fn test_selector_not() {
        let selector = Selector::parse("style:not([data-ww-editing])");
        assert!(selector.matches(&Element::new("style")));
        assert!(!selector.matches(&Element::new("style").with_attr("data-ww-editing", "")));
    }

    #[test]
    fn test_selector_wildcard() {
        let selector = Selector::parse("*");
        assert_eq!(selector.tag(), None);
        assert!(selector.matches(&Element::new("x-widget")));
    }

    #[test]
    fn test_parse_rule_rejects_with_get_attrs() {
        let rule = ParseRule::tag("p").get_attrs(|el| {
            if el.has_attribute("data-skip") {
                None
            } else {
                Some(Attrs::new())
            }
        });
        assert!(rule.read_attrs(&Element::new("p")).is_some());
        assert!(rule.read_attrs(&Element::new("p").with_attr("data-skip", "")).is_none());
    }
}
