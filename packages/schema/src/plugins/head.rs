use super::element;
use crate::composer::{ComposedSchema, SchemaComposer};
use crate::error::ComposeResult;
use crate::html::{comment_mark_spec, optional_attributes};
use crate::plugin::SchemaPlugin;
use quire_codec::AttributeSpec;
use quire_model::{MarkSpec, NodeSpec};

/// Element types allowed in the head, in content expression order
pub const HEAD_ELEMENTS: &[&str] = &["link", "meta", "title", "base", "style", "script", "noscript"];

const LINK_ATTRIBUTES: &[&str] = &[
    "as",
    "crossorigin",
    "fetchpriority",
    "href",
    "hreflang",
    "imagesizes",
    "imagesrcset",
    "integrity",
    "media",
    "prefetch",
    "referrerpolicy",
    "rel",
    "sizes",
    "title",
    "type",
    "blocking",
];

const SCRIPT_ATTRIBUTES: &[&str] = &[
    "async",
    "crossorigin",
    "defer",
    "fetchpriority",
    "integrity",
    "nomodule",
    "referrerpolicy",
    "src",
    "type",
    "blocking",
];

fn head_element(tag: &str, spec: NodeSpec) -> (String, NodeSpec) {
    element(tag, spec.marks("_comment"))
}

/// The head sub-document: metadata elements under a single `head` root.
///
/// `noscript` is the only element holding other elements, and only the ones
/// that may appear unwrapped as well (`meta`, `link`, `style`).
pub struct HeadPlugin;

impl SchemaPlugin for HeadPlugin {
    fn name(&self) -> &str {
        "head"
    }

    fn nodes(&self) -> Vec<(String, NodeSpec)> {
        vec![
            head_element(
                "head",
                NodeSpec::new()
                    .content(format!("({})*", HEAD_ELEMENTS.join(" | ")))
                    .attr("htmlAttrs", AttributeSpec::optional().private()),
            ),
            head_element("link", NodeSpec::new().attrs(optional_attributes(LINK_ATTRIBUTES))),
            head_element(
                "meta",
                NodeSpec::new().attrs(optional_attributes(&["charset", "content", "http-equiv", "name"])),
            ),
            head_element("title", NodeSpec::new().content("text*")),
            head_element(
                "base",
                NodeSpec::new()
                    .attr("href", AttributeSpec::optional())
                    .attr("target", AttributeSpec::with_default("_self")),
            ),
            head_element(
                "style",
                NodeSpec::new()
                    .content("text*")
                    .code()
                    .whitespace_pre()
                    .attrs(optional_attributes(&["blocking", "media"])),
            ),
            head_element(
                "script",
                NodeSpec::new()
                    .content("text*")
                    .code()
                    .whitespace_pre()
                    .attrs(optional_attributes(SCRIPT_ATTRIBUTES)),
            ),
            head_element("noscript", NodeSpec::new().content("(meta | link | style)*")),
            ("text".to_string(), NodeSpec::new()),
        ]
    }

    fn marks(&self) -> Vec<(String, MarkSpec)> {
        vec![("_comment".to_string(), comment_mark_spec())]
    }

    fn top_node(&self) -> Option<String> {
        Some("head".to_string())
    }
}

/// The head schema, composed from [`HeadPlugin`] alone
pub fn head_schema() -> ComposeResult<ComposedSchema> {
    SchemaComposer::new().register(HeadPlugin).compose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_codec::{attrs, AttrValue, Attrs};
    use quire_dom::{DomNode, Element};
    use quire_model::DomParser;

    #[test]
    fn test_head_schema_starts_empty() {
        let composed = head_schema().unwrap();
        assert_eq!(composed.schema.top_node_name(), "head");
        assert_eq!(composed.doc.to_string(), "head");
    }

    #[test]
    fn test_noscript_only_groups_meta_link_style() {
        let composed = head_schema().unwrap();
        let schema = &composed.schema;
        let meta = schema.node("meta", attrs([("name", "robots")]), vec![], vec![]).unwrap();
        let title = schema
            .node("title", Attrs::new(), vec![schema.text("Doc", vec![]).unwrap()], vec![])
            .unwrap();
        assert!(schema.node("noscript", Attrs::new(), vec![meta], vec![]).is_ok());
        assert!(schema.node("noscript", Attrs::new(), vec![title], vec![]).is_err());
    }

    #[test]
    fn test_base_target_defaults_to_self() {
        let composed = head_schema().unwrap();
        let base = Element::new("base").with_attr("href", "https://example.org/");
        let head = DomParser::from_schema(composed.schema.clone())
            .parse(&[DomNode::Element(base)])
            .unwrap();
        let base = head.child(0).unwrap();
        assert_eq!(base.attr("target").and_then(AttrValue::as_str), Some("_self"));
    }
}
