use super::element;
use crate::commands::{toggle_mark, Command};
use crate::error::ComposeResult;
use crate::html::{element_rule, html_mark, optional_attributes};
use crate::input_rules::{url_autolink_rule, InputRule};
use crate::keymap::Keymap;
use crate::plugin::SchemaPlugin;
use quire_codec::{AttrValue, AttributeSpec, Attrs};
use quire_model::{DomSpec, MarkSpec, NodeSpec, ParseRule, Schema};

/// Marks without attributes of their own
const PLAIN_MARKS: &[&str] = &[
    "abbr", "b", "cite", "code", "dfn", "em", "i", "kbd", "ruby", "s", "samp", "small", "strong", "sub", "sup",
    "u", "var",
];

/// Style marks: each renders a `span` with one style declaration
const STYLE_MARKS: &[(&str, &str)] = &[
    ("_fontsize", "font-size"),
    ("_fontfamily", "font-family"),
    ("_color", "color"),
    ("_background", "background"),
];

/// Runs before the generic `span` rule
const STYLE_MARK_PRIORITY: i32 = ParseRule::DEFAULT_PRIORITY + 1;

/// The value of `property` when `style` holds exactly that one declaration
fn single_declaration<'a>(style: &'a str, property: &str) -> Option<&'a str> {
    let mut declarations = style.split(';').map(str::trim).filter(|d| !d.is_empty());
    let (name, value) = declarations.next()?.split_once(':')?;
    if declarations.next().is_some() || !name.trim().eq_ignore_ascii_case(property) {
        return None;
    }
    Some(value.trim())
}

fn style_mark(property: &'static str) -> MarkSpec {
    MarkSpec::new()
        .group("phrasing")
        .attr("value", AttributeSpec::optional())
        .to_dom(move |mark, _| {
            let value = mark.attr("value").map(AttrValue::to_markup).unwrap_or_default();
            DomSpec::wrap("span", vec![("style".to_string(), format!("{property}: {value}"))])
        })
        .parse_rule(
            ParseRule::tag("span")
                .priority(STYLE_MARK_PRIORITY)
                .get_attrs(move |el| {
                    let value = single_declaration(el.get_attribute("style")?, property)?;
                    let mut attrs = Attrs::new();
                    attrs.insert("value".to_string(), AttrValue::from(value));
                    Some(attrs)
                }),
        )
}

/// Inline text semantics: links, emphasis, code, edits and style spans
pub struct PhrasingPlugin;

impl SchemaPlugin for PhrasingPlugin {
    fn name(&self) -> &str {
        "phrasing"
    }

    fn nodes(&self) -> Vec<(String, NodeSpec)> {
        vec![element("wbr", NodeSpec::new().group("phrasing").inline())]
    }

    fn marks(&self) -> Vec<(String, MarkSpec)> {
        let with_attrs = |names: &[&str]| MarkSpec::new().group("phrasing").attrs(optional_attributes(names));
        let mut marks: Vec<(String, MarkSpec)> = vec![
            (
                "a".to_string(),
                html_mark(
                    "a",
                    with_attrs(&["download", "href", "ping", "hreflang", "referrerpolicy", "rel", "target", "type"]),
                ),
            ),
            ("bdi".to_string(), html_mark("bdi", with_attrs(&["dir"]))),
            ("bdo".to_string(), html_mark("bdo", with_attrs(&["dir"]))),
            ("data".to_string(), html_mark("data", with_attrs(&["value"]))),
            ("del".to_string(), html_mark("del", with_attrs(&["cite", "datetime"]))),
            ("ins".to_string(), html_mark("ins", with_attrs(&["cite", "datetime"]))),
            ("q".to_string(), html_mark("q", with_attrs(&["cite"]))),
            ("time".to_string(), html_mark("time", with_attrs(&["datetime"]))),
        ];
        marks.extend(
            PLAIN_MARKS
                .iter()
                .map(|tag| (tag.to_string(), html_mark(tag, MarkSpec::new().group("phrasing")))),
        );
        let mut span = html_mark("span", MarkSpec::new().group("phrasing").excludes(""));
        span.parse_dom = vec![element_rule("span:not([data-ww-editing=phrase])", &span.attrs)];
        marks.push(("span".to_string(), span));
        marks.extend(
            STYLE_MARKS
                .iter()
                .map(|(name, property)| (name.to_string(), style_mark(*property))),
        );
        marks
    }

    fn keymap(&self, _schema: &Schema) -> Keymap {
        Keymap::new()
            .bind("Mod-b", toggle_mark("strong", Attrs::new()))
            .bind("Mod-i", toggle_mark("em", Attrs::new()))
            .bind("Mod-u", toggle_mark("u", Attrs::new()))
    }

    fn input_rules(&self) -> ComposeResult<Vec<InputRule>> {
        Ok(vec![url_autolink_rule()?])
    }

    fn commands(&self) -> Vec<(String, Command)> {
        vec![
            ("toggleStrong".to_string(), toggle_mark("strong", Attrs::new())),
            ("toggleEm".to_string(), toggle_mark("em", Attrs::new())),
            ("toggleUnderline".to_string(), toggle_mark("u", Attrs::new())),
            ("toggleCode".to_string(), toggle_mark("code", Attrs::new())),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::SchemaComposer;
    use crate::plugins::BasePlugin;
    use quire_dom::{DomNode, Element};
    use quire_model::{DomParser, DomSerializer, EditorState, Selection};

    fn composed() -> crate::composer::ComposedSchema {
        SchemaComposer::new()
            .register(BasePlugin)
            .register(PhrasingPlugin)
            .compose()
            .unwrap()
    }

    fn parse_span(style: &str) -> Vec<String> {
        let composed = composed();
        let span = Element::new("span")
            .with_attr("style", style)
            .with_child(DomNode::text("x"));
        let p = Element::new("p").with_child(DomNode::Element(span));
        let doc = DomParser::from_schema(composed.schema.clone())
            .parse(&[DomNode::Element(p)])
            .unwrap();
        let text = doc.child(0).unwrap().child(0).unwrap().clone();
        text.marks().iter().map(|m| m.type_name().to_string()).collect()
    }

    #[test]
    fn test_single_declaration() {
        assert_eq!(single_declaration("color: red;", "color"), Some("red"));
        assert_eq!(single_declaration("color: red; font-size: 2px", "color"), None);
        assert_eq!(single_declaration("background: blue", "color"), None);
    }

    #[test]
    fn test_style_span_becomes_style_mark() {
        assert_eq!(parse_span("color: red"), vec!["_color"]);
        assert_eq!(parse_span("color: red; font-size: 2px"), vec!["span"]);
    }

    #[test]
    fn test_style_mark_renders_span() {
        let composed = composed();
        let schema = &composed.schema;
        let mark = schema
            .mark("_fontsize", quire_codec::attrs([("value", "12pt")]))
            .unwrap();
        let text = schema.text("big", vec![mark]).unwrap();
        let p = schema.node("p", Attrs::new(), vec![text], vec![]).unwrap();
        let dom = DomSerializer::new().serialize_fragment(p.content());
        let DomNode::Element(span) = &dom[0] else {
            panic!("expected element");
        };
        assert_eq!(span.tag, "span");
        assert_eq!(span.get_attribute("style"), Some("font-size: 12pt"));
    }

    #[test]
    fn test_mod_b_toggles_strong() {
        let composed = composed();
        let schema = composed.schema.clone();
        let text = schema.text("bold", vec![]).unwrap();
        let p = schema.node("p", Attrs::new(), vec![text], vec![]).unwrap();
        let doc = schema.node("explorable", Attrs::new(), vec![p], vec![]).unwrap();
        let state = EditorState::create(schema, Some(doc))
            .unwrap()
            .with_selection(Selection::text(1, 5));

        let tr = composed.keymap.handle("Mod-b", &state).unwrap();
        assert_eq!(tr.doc().to_string(), r#"explorable(p(strong("bold")))"#);
        let strong = state.apply(&tr);
        let tr = composed.keymap.handle("Mod-b", &strong).unwrap();
        assert_eq!(tr.doc().to_string(), r#"explorable(p("bold"))"#);
    }
}
