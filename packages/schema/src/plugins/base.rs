use super::{element, named};
use crate::commands::{
    delete_selection, insert_break, insert_word_break, select_all, select_first_child_node, select_parent_node,
    split_block, Command,
};
use crate::html::{comment_mark_spec, optional_attributes};
use crate::plugin::SchemaPlugin;
use quire_codec::{to_attributes, AttrValue, AttributeSpec, Attrs, EDITING_ATTR};
use quire_dom::Element;
use quire_model::{DomSpec, MarkSpec, NodeSpec, ParseRule};
use std::collections::BTreeMap;

const TAGNAME_ATTR: &str = "data-ww-tagname";

const BODY_EVENT_ATTRIBUTES: &[&str] = &[
    "onafterprint",
    "onbeforeprint",
    "onbeforeunload",
    "onblur",
    "onerror",
    "onfocus",
    "onhashchange",
    "onlanguagechange",
    "onload",
    "onmessage",
    "onoffline",
    "ononline",
    "onpopstate",
    "onredo",
    "onresize",
    "onstorage",
    "onundo",
    "onunload",
];

/// Every standard HTML element name. Anything else imported into the body
/// becomes an unknown element node.
pub const KNOWN_HTML_TAGS: &[&str] = &[
    "a", "abbr", "acronym", "address", "applet", "area", "article", "aside", "audio", "b", "base", "basefont",
    "bdi", "bdo", "big", "blink", "blockquote", "body", "br", "button", "canvas", "caption", "center", "cite",
    "code", "col", "colgroup", "data", "datalist", "dd", "del", "details", "dfn", "dialog", "dir", "div", "dl",
    "dt", "em", "embed", "fieldset", "figcaption", "figure", "font", "footer", "form", "frame", "frameset", "h1",
    "h2", "h3", "h4", "h5", "h6", "head", "header", "hgroup", "hr", "html", "i", "iframe", "image", "img",
    "input", "ins", "kbd", "label", "legend", "li", "link", "listing", "main", "map", "mark", "marquee", "math",
    "menu", "meta", "meter", "nav", "nobr", "noembed", "noframes", "noscript", "object", "ol", "optgroup",
    "option", "output", "p", "param", "picture", "plaintext", "portal", "pre", "progress", "q", "rb", "rp",
    "rt", "rtc", "ruby", "s", "samp", "script", "search", "section", "select", "slot", "small", "source",
    "span", "strike", "strong", "style", "sub", "summary", "sup", "svg", "table", "tbody", "td", "template",
    "textarea", "tfoot", "th", "thead", "time", "title", "tr", "track", "tt", "u", "ul", "var", "video", "wbr",
    "xmp",
];

/// Dashed names reserved by SVG and MathML, never custom elements
const KNOWN_DASHED_TAGS: &[&str] = &[
    "annotation-xml",
    "color-profile",
    "font-face",
    "font-face-src",
    "font-face-uri",
    "font-face-format",
    "font-face-name",
    "missing-glyph",
];

const BASE_STYLE: &str = "\
body { outline: none; white-space: pre-wrap; word-wrap: break-word; }
[data-ww-editing=unknownbuiltin], [data-ww-editing=unknowncustom] { outline: 1px dashed darkorange; }
comment- { background: rgba(255, 215, 0, 0.35); }
";

/// Whether `tag` would be a custom element name
fn is_custom_name(tag: &str) -> bool {
    tag.contains('-')
        && tag.starts_with(|c: char| c.is_ascii_lowercase())
        && !KNOWN_DASHED_TAGS.contains(&tag)
}

fn is_unknown_tag(tag: &str) -> bool {
    !KNOWN_HTML_TAGS.contains(&tag) && !KNOWN_DASHED_TAGS.contains(&tag)
}

fn read_unknown_element(el: &Element) -> Option<Attrs> {
    let tag = el.tag.to_ascii_lowercase();
    if !is_unknown_tag(&tag) {
        return None;
    }
    let other: BTreeMap<String, AttrValue> = el
        .attributes
        .iter()
        .filter(|(k, _)| k != EDITING_ATTR && k != TAGNAME_ATTR)
        .map(|(k, v)| (k.clone(), AttrValue::from(v.as_str())))
        .collect();
    let mut attrs = Attrs::new();
    attrs.insert("tagName".to_string(), AttrValue::from(tag));
    attrs.insert("otherAttrs".to_string(), AttrValue::Map(other));
    Some(attrs)
}

/// Pass-through node for elements the schema does not know. The tag and every
/// attribute survive a round trip.
fn unknown_element() -> NodeSpec {
    NodeSpec::new()
        .group("flow")
        .content("flow*")
        .attr("tagName", AttributeSpec::required())
        .attr("otherAttrs", AttributeSpec::with_default(AttrValue::Map(BTreeMap::new())))
        .parse_rule(ParseRule::tag("*").priority(0).get_attrs(read_unknown_element))
        .to_dom(|node| {
            let tag = node
                .attr("tagName")
                .and_then(AttrValue::as_str)
                .unwrap_or("div")
                .to_string();
            let mut attrs: Vec<(String, String)> = node
                .attr("otherAttrs")
                .and_then(AttrValue::as_map)
                .map(|map| map.iter().map(|(k, v)| (k.clone(), v.to_markup())).collect())
                .unwrap_or_default();
            let editing = if is_custom_name(&tag) { "unknowncustom" } else { "unknownbuiltin" };
            attrs.push((EDITING_ATTR.to_string(), editing.to_string()));
            attrs.push((TAGNAME_ATTR.to_string(), tag.clone()));
            DomSpec::wrap(tag, attrs)
        })
}

/// Root, paragraphs, generic blocks, line breaks and the comment mark
pub struct BasePlugin;

impl SchemaPlugin for BasePlugin {
    fn name(&self) -> &str {
        "base"
    }

    fn nodes(&self) -> Vec<(String, NodeSpec)> {
        vec![
            named(
                "explorable",
                "body",
                NodeSpec::new()
                    .content("(p | flow)+")
                    .selectable(false)
                    .attrs(optional_attributes(BODY_EVENT_ATTRIBUTES)),
            ),
            element(
                "p",
                NodeSpec::new()
                    .group("flow palpable containerinline")
                    .content("phrasing*")
                    .whitespace_pre(),
            ),
            element("div", NodeSpec::new().group("flow palpable").content("flow*")),
            element(
                "pre",
                NodeSpec::new().group("flow palpable").content("phrasing*").code().whitespace_pre(),
            ),
            element("hr", NodeSpec::new().group("flow")),
            (
                "text".to_string(),
                NodeSpec::new().group("phrasing containerinline").inline(),
            ),
            element("br", NodeSpec::new().group("phrasing").inline()),
            ("unknownElement".to_string(), unknown_element()),
        ]
    }

    fn marks(&self) -> Vec<(String, MarkSpec)> {
        vec![("_comment".to_string(), comment_mark_spec())]
    }

    fn top_node(&self) -> Option<String> {
        Some("explorable".to_string())
    }

    fn commands(&self) -> Vec<(String, Command)> {
        vec![
            ("selectAll".to_string(), Command::new(select_all)),
            ("selectParentNode".to_string(), Command::new(select_parent_node)),
            ("selectFirstChildNode".to_string(), Command::new(select_first_child_node)),
            ("deleteSelection".to_string(), Command::new(delete_selection)),
            ("insertBreak".to_string(), Command::new(insert_break)),
            ("insertWordBreak".to_string(), Command::new(insert_word_break)),
            ("splitBlock".to_string(), Command::new(split_block)),
        ]
    }

    fn styles(&self) -> Vec<String> {
        vec![BASE_STYLE.to_string()]
    }
}

/// Export attributes of an element node, for plugins rendering a tag other
/// than their own name
pub(super) fn node_attributes(node: &quire_model::Node) -> Vec<(String, String)> {
    to_attributes(node.attrs(), Some(&node.node_type().spec().attrs), None)
}
