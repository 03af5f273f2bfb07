use super::base::node_attributes;
use super::element;
use crate::html::html_mark;
use crate::plugin::SchemaPlugin;
use quire_codec::{get_attrs_with, merge_style, to_attributes, AttrValue};
use quire_dom::Element;
use quire_model::{DomSpec, Mark, MarkSpec, Node, NodeSpec, ParseRule};

/// Legacy `<font size>` values 1 to 7
const FONT_SIZES: &[&str] = &["x-small", "small", "medium", "large", "x-large", "xx-large", "xxx-large"];

/// Legacy block elements and the modern tag each exports as
const DEPRECATED_BLOCKS: &[(&str, &str)] = &[
    ("dir", "ul"),
    ("frameset", "div"),
    ("noembed", "div"),
    ("noframes", "div"),
    ("menuitem", "span"),
];

/// Legacy preformatted elements, all exported as `pre`
const DEPRECATED_PREFORMATTED: &[&str] = &["listing", "plaintext", "xmp"];

/// Legacy marks and the tag each exports as, with an optional style
const DEPRECATED_MARKS: &[(&str, &str, Option<(&str, &str)>)] = &[
    ("acronym", "abbr", None),
    ("big", "span", Some(("font-size", "larger"))),
    ("marquee", "span", None),
    ("nobr", "span", Some(("white-space", "nowrap"))),
    ("strike", "s", None),
    ("tt", "samp", None),
];

fn font_size(size: &str) -> Option<&'static str> {
    let index: usize = size.trim().parse().ok()?;
    FONT_SIZES.get(index.checked_sub(1)?).copied()
}

/// `attrs` with `declarations` appended to its `style` entry
fn with_style(mut attrs: Vec<(String, String)>, declarations: &[(String, String)]) -> Vec<(String, String)> {
    if declarations.is_empty() {
        return attrs;
    }
    match attrs.iter_mut().find(|(key, _)| key == "style") {
        Some((_, style)) => *style = merge_style(style, declarations),
        None => attrs.push(("style".to_string(), merge_style("", declarations))),
    }
    attrs
}

fn declaration(property: &str, value: &str) -> Vec<(String, String)> {
    vec![(property.to_string(), value.to_string())]
}

fn mark_attributes(mark: &Mark) -> Vec<(String, String)> {
    to_attributes(mark.attrs(), Some(&mark.mark_type().spec().attrs), None)
}

/// Read `<font color face size>` into a style declaration list
fn read_font(el: &Element, spec: &quire_codec::AttributeSpecs) -> Option<quire_codec::Attrs> {
    let mut attrs = get_attrs_with(el, Some(spec), false)?;
    let mut declarations = Vec::new();
    if let Some(color) = el.get_attribute("color") {
        declarations.push(("color".to_string(), color.to_string()));
    }
    if let Some(face) = el.get_attribute("face") {
        declarations.push(("font-family".to_string(), face.to_string()));
    }
    if let Some(size) = el.get_attribute("size").and_then(font_size) {
        declarations.push(("font-size".to_string(), size.to_string()));
    }
    for legacy in ["color", "face", "size"] {
        attrs.remove(legacy);
    }
    let existing = attrs.get("style").and_then(AttrValue::as_str).unwrap_or_default();
    let style = merge_style(existing, &declarations);
    if !style.is_empty() {
        attrs.insert("style".to_string(), AttrValue::from(style));
    }
    Some(attrs)
}

fn exported_as(tag: &'static str, spec: NodeSpec) -> NodeSpec {
    spec.to_dom(move |node: &Node| {
        let attrs = node_attributes(node);
        if node.is_leaf() {
            DomSpec::leaf(tag, attrs)
        } else {
            DomSpec::wrap(tag, attrs)
        }
    })
}

/// Obsolete HTML elements. Each imports under its legacy tag and exports as
/// the closest modern equivalent.
pub struct DeprecatedPlugin;

impl SchemaPlugin for DeprecatedPlugin {
    fn name(&self) -> &str {
        "deprecated"
    }

    fn nodes(&self) -> Vec<(String, NodeSpec)> {
        let mut nodes = vec![
            element(
                "center",
                NodeSpec::new().group("flow").content("flow*").to_dom(|node| {
                    DomSpec::wrap("div", with_style(node_attributes(node), &declaration("margin", "0 auto")))
                }),
            ),
            element("applet", exported_as("object", NodeSpec::new().group("flow embedded"))),
            element("frame", exported_as("iframe", NodeSpec::new().group("flow embedded"))),
        ];

        let mut image = exported_as("img", NodeSpec::new().group("flow embedded"));
        image = image.parse_rule(ParseRule::tag("image").get_attrs(|el| {
            let mut attrs = get_attrs_with(el, None, false)?;
            let title = el.text_content();
            if !title.is_empty() {
                attrs.insert("title".to_string(), AttrValue::from(title));
            }
            Some(attrs)
        }));
        nodes.push(element("image", image));

        nodes.extend(
            DEPRECATED_BLOCKS
                .iter()
                .map(|&(tag, modern)| element(tag, exported_as(modern, NodeSpec::new().group("flow").content("flow*")))),
        );
        nodes.extend(DEPRECATED_PREFORMATTED.iter().map(|tag| {
            element(
                tag,
                exported_as("pre", NodeSpec::new().group("flow").content("text*").code().whitespace_pre()),
            )
        }));
        for tag in ["rb", "rtc"] {
            nodes.push(element(
                tag,
                NodeSpec::new()
                    .group("phrasing")
                    .inline()
                    .content("phrasing*")
                    .to_dom(|node| DomSpec::Text(node.text_content())),
            ));
        }
        nodes
    }

    fn marks(&self) -> Vec<(String, MarkSpec)> {
        let mut marks: Vec<(String, MarkSpec)> = DEPRECATED_MARKS
            .iter()
            .map(|&(tag, modern, style)| {
                let spec = MarkSpec::new().group("phrasing").to_dom(move |mark, _| {
                    let declarations = style.map(|(p, v)| declaration(p, v)).unwrap_or_default();
                    DomSpec::wrap(modern, with_style(mark_attributes(mark), &declarations))
                });
                (tag.to_string(), html_mark(tag, spec))
            })
            .collect();

        let mut font = html_mark(
            "font",
            MarkSpec::new()
                .group("phrasing")
                .to_dom(|mark, _| DomSpec::wrap("span", mark_attributes(mark))),
        );
        let specs = font.attrs.clone();
        font.parse_dom = vec![ParseRule::tag("font").get_attrs(move |el| read_font(el, &specs))];
        marks.push(("font".to_string(), font));
        marks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::SchemaComposer;
    use crate::plugins::{BasePlugin, PhrasingPlugin};
    use quire_dom::DomNode;
    use quire_model::{DomParser, DomSerializer};

    fn composed() -> crate::composer::ComposedSchema {
        SchemaComposer::new()
            .register(BasePlugin)
            .register(PhrasingPlugin)
            .register(DeprecatedPlugin)
            .compose()
            .unwrap()
    }

    fn first_element(nodes: &[DomNode]) -> &Element {
        match &nodes[0] {
            DomNode::Element(el) => el,
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn test_font_size_scale() {
        assert_eq!(font_size("1"), Some("x-small"));
        assert_eq!(font_size("3"), Some("medium"));
        assert_eq!(font_size("7"), Some("xxx-large"));
        assert_eq!(font_size("0"), None);
        assert_eq!(font_size("big"), None);
    }

    #[test]
    fn test_center_exports_as_styled_div() {
        let composed = composed();
        let center = Element::new("center")
            .with_attr("style", "color: red")
            .with_child(DomNode::Element(Element::new("p").with_child(DomNode::text("hi"))));
        let doc = DomParser::from_schema(composed.schema.clone())
            .parse(&[DomNode::Element(center)])
            .unwrap();
        let node = doc.child(0).unwrap();
        assert_eq!(node.type_name(), "center");

        let dom = DomSerializer::new().serialize_node(node);
        let div = first_element(&dom);
        assert_eq!(div.tag, "div");
        assert_eq!(div.get_attribute("style"), Some("color: red; margin: 0 auto"));
    }

    #[test]
    fn test_font_becomes_styled_span() {
        let composed = composed();
        let font = Element::new("font")
            .with_attr("color", "navy")
            .with_attr("size", "5")
            .with_child(DomNode::text("loud"));
        let p = Element::new("p").with_child(DomNode::Element(font));
        let doc = DomParser::from_schema(composed.schema.clone())
            .parse(&[DomNode::Element(p)])
            .unwrap();
        let para = doc.child(0).unwrap();
        let text = para.child(0).unwrap();
        assert_eq!(text.marks()[0].type_name(), "font");

        let dom = DomSerializer::new().serialize_fragment(para.content());
        let span = first_element(&dom);
        assert_eq!(span.tag, "span");
        assert_eq!(span.get_attribute("style"), Some("color: navy; font-size: x-large"));
    }

    #[test]
    fn test_strike_exports_as_s() {
        let composed = composed();
        let schema = &composed.schema;
        let strike = schema.mark("strike", Default::default()).unwrap();
        let text = schema.text("old", vec![strike]).unwrap();
        let p = schema.node("p", Default::default(), vec![text], vec![]).unwrap();
        let dom = DomSerializer::new().serialize_fragment(p.content());
        assert_eq!(first_element(&dom).tag, "s");
    }
}
