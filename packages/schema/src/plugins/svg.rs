use crate::html::html_element;
use crate::plugin::SchemaPlugin;
use quire_codec::AttributeSpecs;
use quire_model::NodeSpec;

const SVG_CORE_ATTRIBUTES: &[&str] = &["xml:base", "xml:lang", "xml:space"];

const SVG_PRESENTATION_ATTRIBUTES: &[&str] = &[
    "alignment-baseline",
    "baseline-shift",
    "clip-path",
    "clip-rule",
    "color",
    "cursor",
    "display",
    "dominant-baseline",
    "fill",
    "fill-opacity",
    "fill-rule",
    "filter",
    "font-family",
    "font-size",
    "font-style",
    "font-weight",
    "mask",
    "opacity",
    "overflow",
    "pointer-events",
    "shape-rendering",
    "stop-color",
    "stop-opacity",
    "stroke",
    "stroke-dasharray",
    "stroke-dashoffset",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-opacity",
    "stroke-width",
    "text-anchor",
    "transform",
    "vector-effect",
    "visibility",
];

const SVG_CONDITIONAL_ATTRIBUTES: &[&str] = &["requiredExtensions", "systemLanguage"];

const ANIMATION_ATTRIBUTES: &[&str] = &[
    "attributeName",
    "begin",
    "by",
    "dur",
    "end",
    "fill",
    "from",
    "keyTimes",
    "keySplines",
    "max",
    "min",
    "repeatCount",
    "repeatDur",
    "restart",
    "to",
    "values",
];

const TEXT_POSITION_ATTRIBUTES: &[&str] = &["x", "y", "dx", "dy", "rotate", "lengthAdjust", "textLength"];

/// Children of container elements
const CONTAINER_CONTENT: &str =
    "(animation_svg | descriptive_svg | shape_svg | structural_svg | gradient_svg | textSVG | clipPathSVG | symbolSVG | svg)*";

/// Children of shapes
const SHAPE_CONTENT: &str = "(animation_svg | descriptive_svg)*";

const TEXT_CONTENT: &str = "(text | tspanSVG | animation_svg | descriptive_svg)*";

const GRADIENT_CONTENT: &str = "(descriptive_svg | stopSVG | animation_svg)*";

/// SVG element table: tag, groups, content and own attributes
const SVG_ELEMENTS: &[(&str, &str, &str, &[&str])] = &[
    ("g", "structural_svg", CONTAINER_CONTENT, &[]),
    ("defs", "structural_svg", CONTAINER_CONTENT, &[]),
    ("use", "structural_svg", SHAPE_CONTENT, &["href", "x", "y", "width", "height"]),
    (
        "symbol",
        "",
        CONTAINER_CONTENT,
        &["viewBox", "preserveAspectRatio", "x", "y", "width", "height", "refX", "refY"],
    ),
    ("desc", "descriptive_svg", "text*", &[]),
    ("circle", "shape_svg", SHAPE_CONTENT, &["cx", "cy", "r", "pathLength"]),
    ("ellipse", "shape_svg", SHAPE_CONTENT, &["cx", "cy", "rx", "ry", "pathLength"]),
    ("line", "shape_svg", SHAPE_CONTENT, &["x1", "y1", "x2", "y2", "pathLength"]),
    ("path", "shape_svg", SHAPE_CONTENT, &["d", "pathLength"]),
    ("polygon", "shape_svg", SHAPE_CONTENT, &["points", "pathLength"]),
    ("polyline", "shape_svg", SHAPE_CONTENT, &["points", "pathLength"]),
    (
        "rect",
        "shape_svg",
        SHAPE_CONTENT,
        &["x", "y", "width", "height", "rx", "ry", "pathLength"],
    ),
    ("text", "", TEXT_CONTENT, TEXT_POSITION_ATTRIBUTES),
    ("tspan", "", TEXT_CONTENT, TEXT_POSITION_ATTRIBUTES),
    (
        "linearGradient",
        "gradient_svg",
        GRADIENT_CONTENT,
        &["gradientUnits", "gradientTransform", "href", "spreadMethod", "x1", "y1", "x2", "y2"],
    ),
    (
        "radialGradient",
        "gradient_svg",
        GRADIENT_CONTENT,
        &["cx", "cy", "fr", "fx", "fy", "gradientUnits", "gradientTransform", "href", "r", "spreadMethod"],
    ),
    ("stop", "", "animation_svg*", &["offset"]),
    ("clipPath", "", "(animation_svg | descriptive_svg | shape_svg | textSVG | useSVG)*", &["clipPathUnits"]),
    ("animate", "animation_svg", "descriptive_svg*", ANIMATION_ATTRIBUTES),
    ("set", "animation_svg", "descriptive_svg*", &["attributeName", "begin", "dur", "end", "fill", "to"]),
];

/// Node type name of SVG element `tag`
pub fn svg_name(tag: &str) -> String {
    format!("{tag}SVG")
}

fn svg_attributes(own: &[&str]) -> AttributeSpecs {
    AttributeSpecs::new()
        .with_optional(SVG_CORE_ATTRIBUTES.iter().copied())
        .with_optional(SVG_PRESENTATION_ATTRIBUTES.iter().copied())
        .with_optional(SVG_CONDITIONAL_ATTRIBUTES.iter().copied())
        .with_optional(own.iter().copied())
}

/// Inline vector graphics: shapes, text, gradients, grouping and animation
pub struct SvgPlugin;

impl SchemaPlugin for SvgPlugin {
    fn name(&self) -> &str {
        "svg"
    }

    fn nodes(&self) -> Vec<(String, NodeSpec)> {
        let mut nodes = vec![(
            "svg".to_string(),
            html_element(
                "svg",
                NodeSpec::new()
                    .group("flow embedded palpable")
                    .content(CONTAINER_CONTENT)
                    .attrs(svg_attributes(&[
                        "viewBox",
                        "preserveAspectRatio",
                        "width",
                        "height",
                        "x",
                        "y",
                        "xmlns",
                        "version",
                    ])),
            ),
        )];
        nodes.extend(SVG_ELEMENTS.iter().map(|(tag, group, content, own)| {
            let mut spec = NodeSpec::new().content(*content).attrs(svg_attributes(own));
            if !group.is_empty() {
                spec = spec.group(*group);
            }
            (svg_name(tag), html_element(tag, spec))
        }));
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::SchemaComposer;
    use crate::plugins::BasePlugin;
    use quire_codec::AttrValue;
    use quire_dom::{DomNode, Element};
    use quire_model::{DomParser, DomSerializer};

    #[test]
    fn test_svg_shapes_round_trip() {
        let composed = SchemaComposer::new()
            .register(BasePlugin)
            .register(SvgPlugin)
            .compose()
            .unwrap();
        let circle = Element::new("circle")
            .with_attr("cx", "5")
            .with_attr("cy", "5")
            .with_attr("r", "4")
            .with_attr("fill", "teal");
        let gradient = Element::new("linearGradient")
            .with_attr("id", "fade")
            .with_child(DomNode::Element(Element::new("stop").with_attr("offset", "0")));
        let svg = Element::new("svg")
            .with_attr("viewBox", "0 0 10 10")
            .with_child(DomNode::Element(gradient))
            .with_child(DomNode::Element(Element::new("g").with_child(DomNode::Element(circle))));
        let doc = DomParser::from_schema(composed.schema.clone())
            .parse(&[DomNode::Element(svg)])
            .unwrap();

        let svg = doc.child(0).unwrap();
        assert_eq!(svg.type_name(), "svg");
        assert_eq!(svg.child(0).unwrap().type_name(), "linearGradientSVG");
        let circle = svg.child(1).unwrap().child(0).unwrap();
        assert_eq!(circle.type_name(), "circleSVG");
        assert_eq!(circle.attr("fill").and_then(AttrValue::as_str), Some("teal"));

        let dom = DomSerializer::new().serialize_node(svg);
        let DomNode::Element(el) = &dom[0] else {
            panic!("expected element");
        };
        assert_eq!(el.get_attribute("viewBox"), Some("0 0 10 10"));
        let DomNode::Element(gradient) = &el.children[0] else {
            panic!("expected element");
        };
        assert_eq!(gradient.tag, "linearGradient");
    }
}
