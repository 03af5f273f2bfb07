//! Node and mark specs for HTML elements
//!
//! Every element accepts the global attribute set plus the reserved comment
//! attribute. Markup export and import run through the attribute codec so
//! defaults and private attributes never reach the output.

use quire_codec::{
    comment_element, comment_element_data, get_attrs_with, to_attributes, AttrValue, AttributeSpec,
    AttributeSpecs, Attrs, COMMENT_ATTR, COMMENT_TAG,
};
use quire_model::{DomSpec, MarkSpec, NodeSpec, ParseRule};

pub const CORE_ATTRIBUTES: &[&str] = &[
    "accesskey",
    "autocapitalize",
    "autofocus",
    "class",
    "contenteditable",
    "data",
    "dir",
    "draggable",
    "enterkeyhint",
    "exportparts",
    "hidden",
    "id",
    "inert",
    "inputmode",
    "is",
    "itemid",
    "itemprop",
    "itemref",
    "itemscope",
    "itemtype",
    "lang",
    "nonce",
    "part",
    "popover",
    "role",
    "slot",
    "spellcheck",
    "style",
    "tabindex",
    "title",
    "translate",
    "virtualkeyboardpolicy",
];

pub const ARIA_ATTRIBUTES: &[&str] = &[
    "role",
    "aria-autocomplete",
    "aria-checked",
    "aria-disabled",
    "aria-errormessage",
    "aria-expanded",
    "aria-haspopup",
    "aria-hidden",
    "aria-invalid",
    "aria-label",
    "aria-level",
    "aria-modal",
    "aria-multiline",
    "aria-multiselectable",
    "aria-orientation",
    "aria-placeholder",
    "aria-pressed",
    "aria-readonly",
    "aria-required",
    "aria-selected",
    "aria-sort",
    "aria-valuemax",
    "aria-valuemin",
    "aria-valuenow",
    "aria-valuetext",
    "aria-busy",
    "aria-live",
    "aria-relevant",
    "aria-atomic",
    "aria-dropeffect",
    "aria-grabbed",
    "aria-activedescendant",
    "aria-colcount",
    "aria-colindex",
    "aria-colspan",
    "aria-controls",
    "aria-describedby",
    "aria-description",
    "aria-details",
    "aria-flowto",
    "aria-labelledby",
    "aria-owns",
    "aria-posinset",
    "aria-rowcount",
    "aria-rowindex",
    "aria-rowspan",
    "aria-setsize",
];

pub const EVENT_ATTRIBUTES: &[&str] = &[
    "onabort",
    "onautocomplete",
    "onautocompleteerror",
    "onblur",
    "oncancel",
    "oncanplay",
    "oncanplaythrough",
    "onchange",
    "onclick",
    "onclose",
    "oncontextmenu",
    "oncuechange",
    "ondblclick",
    "ondrag",
    "ondragend",
    "ondragenter",
    "ondragleave",
    "ondragover",
    "ondragstart",
    "ondrop",
    "ondurationchange",
    "onemptied",
    "onended",
    "onerror",
    "onfocus",
    "oninput",
    "oninvalid",
    "onkeydown",
    "onkeypress",
    "onkeyup",
    "onload",
    "onloadeddata",
    "onloadedmetadata",
    "onloadstart",
    "onmousedown",
    "onmouseenter",
    "onmouseleave",
    "onmousemove",
    "onmouseout",
    "onmouseover",
    "onmouseup",
    "onmousewheel",
    "onpause",
    "onplay",
    "onplaying",
    "onprogress",
    "onratechange",
    "onreset",
    "onresize",
    "onscroll",
    "onseeked",
    "onseeking",
    "onselect",
    "onshow",
    "onsort",
    "onstalled",
    "onsubmit",
    "onsuspend",
    "ontimeupdate",
    "ontoggle",
    "onvolumechange",
    "onwaiting",
];

/// Attributes every HTML element accepts: core, ARIA and event handlers
pub fn global_attributes() -> AttributeSpecs {
    AttributeSpecs::new()
        .with_optional(CORE_ATTRIBUTES.iter().copied())
        .with_optional(ARIA_ATTRIBUTES.iter().copied())
        .with_optional(EVENT_ATTRIBUTES.iter().copied())
}

/// Declarations for a list of optional attributes
pub fn optional_attributes(names: &[&str]) -> AttributeSpecs {
    AttributeSpecs::new().with_optional(names.iter().copied())
}

/// Complete `spec` as the node for HTML element `tag`.
///
/// The global attributes and the comment attribute are added in front of the
/// spec's own. Unless the spec brings its own, markup export renders `tag`
/// (with a content hole when the node has content) and import matches `tag`.
pub fn html_element(tag: &str, mut spec: NodeSpec) -> NodeSpec {
    let own = std::mem::take(&mut spec.attrs);
    spec.attrs = global_attributes();
    spec.attrs.insert(COMMENT_ATTR, AttributeSpec::optional());
    spec.attrs.extend(&own);

    if spec.to_dom.is_none() {
        let tag = tag.to_string();
        spec = spec.to_dom(move |node| {
            let attrs = to_attributes(node.attrs(), Some(&node.node_type().spec().attrs), None);
            if node.is_leaf() {
                DomSpec::leaf(tag.clone(), attrs)
            } else {
                DomSpec::wrap(tag.clone(), attrs)
            }
        });
    }
    if spec.parse_dom.is_empty() {
        let rule = element_rule(tag, &spec.attrs);
        spec = spec.parse_rule(rule);
    }
    spec
}

/// Parse rule reading the element's attributes with `specs` in mind
pub fn element_rule(selector: &str, specs: &AttributeSpecs) -> ParseRule {
    let specs = specs.clone();
    ParseRule::tag(selector).get_attrs(move |el| get_attrs_with(el, Some(&specs), false))
}

/// Complete `spec` as the mark for HTML element `tag`. Works like
/// [`html_element`] without the comment attribute.
pub fn html_mark(tag: &str, mut spec: MarkSpec) -> MarkSpec {
    let own = std::mem::take(&mut spec.attrs);
    spec.attrs = global_attributes();
    spec.attrs.extend(&own);

    if spec.to_dom.is_none() {
        let tag = tag.to_string();
        spec = spec.to_dom(move |mark, _| {
            DomSpec::wrap(
                tag.clone(),
                to_attributes(mark.attrs(), Some(&mark.mark_type().spec().attrs), None),
            )
        });
    }
    if spec.parse_dom.is_empty() {
        let rule = element_rule(tag, &spec.attrs);
        spec = spec.parse_rule(rule);
    }
    spec
}

/// The `_comment` mark: a comment thread spanning inline content. Threads
/// overlap freely and render as `comment-` elements.
pub fn comment_mark_spec() -> MarkSpec {
    MarkSpec::new()
        .attr("id", AttributeSpec::optional())
        .attr("content", AttributeSpec::optional())
        .spanning(true)
        .excludes("")
        .to_dom(|mark, _| {
            let id = mark.attr("id").and_then(AttrValue::as_str);
            let entries = mark
                .attr("content")
                .and_then(AttrValue::as_comments)
                .unwrap_or_default();
            DomSpec::wrap(COMMENT_TAG, comment_element(id, entries).attributes)
        })
        .parse_rule(ParseRule::tag(COMMENT_TAG).get_attrs(|el| {
            let mut attrs = Attrs::new();
            if let Some(id) = el.get_attribute("data-id") {
                attrs.insert("id".to_string(), AttrValue::from(id));
            }
            attrs.insert(
                "content".to_string(),
                AttrValue::Comments(comment_element_data(el, None)),
            );
            Some(attrs)
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_codec::{attrs, CommentEntry};
    use quire_dom::{DomNode, Element};
    use quire_model::{DomParser, DomSerializer, Schema, SchemaSpec};
    use std::sync::Arc;

    fn schema() -> Arc<Schema> {
        Arc::new(
            Schema::new(SchemaSpec {
                nodes: vec![
                    (
                        "explorable".to_string(),
                        html_element("body", NodeSpec::new().content("p+")),
                    ),
                    (
                        "p".to_string(),
                        html_element("p", NodeSpec::new().content("text*").marks("_comment em")),
                    ),
                    (
                        "img".to_string(),
                        html_element("img", NodeSpec::new().attrs(optional_attributes(&["src", "alt"]))),
                    ),
                    ("text".to_string(), NodeSpec::new()),
                ],
                marks: vec![
                    ("_comment".to_string(), comment_mark_spec()),
                    ("em".to_string(), html_mark("em", MarkSpec::new())),
                ],
                top_node: Some("explorable".to_string()),
            })
            .unwrap(),
        )
    }

    #[test]
    fn test_element_accepts_global_and_own_attributes() {
        let spec = html_element("img", NodeSpec::new().attrs(optional_attributes(&["src"])));
        assert!(spec.attrs.contains("aria-label"));
        assert!(spec.attrs.contains("onclick"));
        assert!(spec.attrs.contains(COMMENT_ATTR));
        assert!(spec.attrs.contains("src"));
        assert_eq!(spec.parse_dom.len(), 1);
    }

    #[test]
    fn test_mark_gets_attribute_aware_parse_rule() {
        let spec = html_mark("q", MarkSpec::new().attrs(optional_attributes(&["cite"])));
        assert!(spec.attrs.contains("cite"));
        assert!(spec.attrs.contains("lang"));
        assert!(!spec.attrs.contains(COMMENT_ATTR));
        assert_eq!(spec.parse_dom.len(), 1);
    }

    #[test]
    fn test_export_uses_tag_and_omits_defaults() {
        let schema = schema();
        let text = schema.text("hi", vec![]).unwrap();
        let p = schema.node("p", attrs([("class", "lead")]), vec![text], vec![]).unwrap();
        let doc = schema.node("explorable", Attrs::new(), vec![p], vec![]).unwrap();

        let dom = DomSerializer::new().serialize_node(&doc);
        let DomNode::Element(body) = &dom[0] else {
            panic!("expected element");
        };
        assert_eq!(body.tag, "body");
        assert!(body.attributes.is_empty());
        let DomNode::Element(p) = &body.children[0] else {
            panic!("expected element");
        };
        assert_eq!(p.attributes, vec![("class".to_string(), "lead".to_string())]);
    }

    #[test]
    fn test_comment_mark_round_trip() {
        let schema = schema();
        let entry = CommentEntry::new("Check this").with_id("c-1");
        let mark = schema
            .mark(
                "_comment",
                attrs([
                    ("id", AttrValue::from("c-1")),
                    ("content", AttrValue::Comments(vec![entry])),
                ]),
            )
            .unwrap();
        let text = schema.text("word", vec![mark.clone()]).unwrap();
        let p = schema.node("p", Attrs::new(), vec![text], vec![]).unwrap();

        let dom = DomSerializer::new().serialize_fragment(p.content());
        let DomNode::Element(el) = &dom[0] else {
            panic!("expected element");
        };
        assert_eq!(el.tag, COMMENT_TAG);

        let wrapped = DomNode::Element(Element::new("p").with_child(dom[0].clone()));
        let parsed = DomParser::from_schema(schema.clone()).parse(&[wrapped]).unwrap();
        let text = parsed.child(0).unwrap().child(0).unwrap();
        assert_eq!(text.marks(), &[mark]);
    }
}
