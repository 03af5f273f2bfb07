use super::element;
use crate::html::optional_attributes;
use crate::plugin::SchemaPlugin;
use quire_model::NodeSpec;

const FORM_OVERRIDE_ATTRIBUTES: &[&str] = &[
    "form",
    "formaction",
    "formenctype",
    "formmethod",
    "formnovalidate",
    "formtarget",
];

const INPUT_ATTRIBUTES: &[&str] = &[
    "accept",
    "alt",
    "autocomplete",
    "capture",
    "checked",
    "dirname",
    "disabled",
    "height",
    "list",
    "max",
    "maxlength",
    "min",
    "minlength",
    "multiple",
    "name",
    "pattern",
    "placeholder",
    "popovertarget",
    "popovertargetaction",
    "readonly",
    "required",
    "size",
    "src",
    "step",
    "type",
    "value",
    "width",
];

/// Inline control in the phrasing group
fn control(group: &str, attributes: &[&str]) -> NodeSpec {
    NodeSpec::new()
        .group(group)
        .inline()
        .attrs(optional_attributes(attributes))
}

/// Form controls. Controls allowed in phrasing content are inline nodes,
/// the grouping elements are blocks.
pub struct FormPlugin;

impl SchemaPlugin for FormPlugin {
    fn name(&self) -> &str {
        "form"
    }

    fn nodes(&self) -> Vec<(String, NodeSpec)> {
        vec![
            element(
                "button",
                control(
                    "flow phrasing interactive listed labelable submittable formassociated palpable",
                    &["disabled", "name", "popovertarget", "popovertargetaction", "type", "value"],
                )
                .attrs(optional_attributes(FORM_OVERRIDE_ATTRIBUTES))
                .content("phrasing*"),
            ),
            element(
                "input",
                control(
                    "flow phrasing listed submittable resettable formassociated labelable palpable",
                    INPUT_ATTRIBUTES,
                )
                .attrs(optional_attributes(FORM_OVERRIDE_ATTRIBUTES)),
            ),
            element(
                "select",
                control(
                    "flow phrasing interactive listed labelable resettable submittable formassociated",
                    &["autocomplete", "disabled", "form", "multiple", "name", "required", "size"],
                )
                .content("(option | optgroup)*"),
            ),
            element(
                "meter",
                control(
                    "flow phrasing labelable palpable",
                    &["value", "min", "max", "low", "high", "optimum", "form"],
                )
                .content("phrasing*"),
            ),
            element(
                "datalist",
                control("flow phrasing", &[]).content("phrasing* | option*"),
            ),
            element(
                "label",
                control("flow phrasing interactive formassociated palpable", &["for"]).content("phrasing*"),
            ),
            element(
                "output",
                control(
                    "flow phrasing listed labelable resettable formassociated palpable",
                    &["for", "form", "name"],
                )
                .content("phrasing*"),
            ),
            element(
                "progress",
                control("flow phrasing labelable palpable", &["max", "value"]).content("phrasing*"),
            ),
            element(
                "fieldset",
                NodeSpec::new()
                    .group("flow sectioning listed formassociated palpable")
                    .content("legend? flow*")
                    .attrs(optional_attributes(&["disabled", "form", "name"])),
            ),
            element(
                "form",
                NodeSpec::new().group("flow palpable").content("flow*").attrs(optional_attributes(&[
                    "accept-charset",
                    "autocomplete",
                    "name",
                    "rel",
                    "action",
                    "enctype",
                    "method",
                    "novalidate",
                    "target",
                ])),
            ),
            element("legend", NodeSpec::new().content("(phrasing | heading)*")),
            element(
                "optgroup",
                NodeSpec::new()
                    .content("option*")
                    .attrs(optional_attributes(&["disabled", "label"])),
            ),
            element(
                "option",
                NodeSpec::new()
                    .content("text?")
                    .attrs(optional_attributes(&["disabled", "label", "selected", "value"])),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::SchemaComposer;
    use crate::plugins::{BasePlugin, HeadingPlugin};
    use quire_codec::AttrValue;
    use quire_dom::{DomNode, Element};
    use quire_model::DomParser;

    #[test]
    fn test_controls_sit_inline_in_paragraphs() {
        let composed = SchemaComposer::new()
            .register(BasePlugin)
            .register(HeadingPlugin)
            .register(FormPlugin)
            .compose()
            .unwrap();
        let p = Element::new("p")
            .with_child(DomNode::text("Name:"))
            .with_child(DomNode::Element(
                Element::new("input").with_attr("name", "who").with_attr("required", ""),
            ));
        let doc = DomParser::from_schema(composed.schema.clone())
            .parse(&[DomNode::Element(p)])
            .unwrap();
        let para = doc.child(0).unwrap();
        assert_eq!(para.type_name(), "p");
        let input = para.child(1).unwrap();
        assert_eq!(input.type_name(), "input");
        assert!(input.is_inline());
        assert_eq!(input.attr("name").and_then(AttrValue::as_str), Some("who"));
    }

    #[test]
    fn test_fieldset_legend_comes_first() {
        let composed = SchemaComposer::new()
            .register(BasePlugin)
            .register(HeadingPlugin)
            .register(FormPlugin)
            .compose()
            .unwrap();
        let schema = &composed.schema;
        let legend = schema
            .node("legend", Default::default(), vec![schema.text("Who", vec![]).unwrap()], vec![])
            .unwrap();
        let p = schema.node("p", Default::default(), vec![], vec![]).unwrap();
        assert!(schema
            .node("fieldset", Default::default(), vec![legend.clone(), p.clone()], vec![])
            .is_ok());
        assert!(schema
            .node("fieldset", Default::default(), vec![p, legend], vec![])
            .is_err());
    }
}
