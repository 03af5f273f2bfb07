use crate::html::{element_rule, html_element, optional_attributes, EVENT_ATTRIBUTES};
use crate::plugin::SchemaPlugin;
use quire_codec::{to_attributes, AttributeSpecs};
use quire_model::{DomSpec, NodeSpec};

/// MathML element names with a node type of their own
pub const MATHML_TAGS: &[&str] = &[
    "mtext",
    "annotation",
    "annotation-xml",
    "maction",
    "merror",
    "mfrac",
    "mi",
    "mmultiscripts",
    "mn",
    "mo",
    "mover",
    "mpadded",
    "mphantom",
    "mprescripts",
    "mroot",
    "mrow",
    "ms",
    "mspace",
    "msqrt",
    "mstyle",
    "msub",
    "msubsup",
    "msup",
    "mtable",
    "mtd",
    "mtr",
    "munder",
    "munderover",
    "none",
    "semantics",
];

const MATHML_CORE_ATTRIBUTES: &[&str] = &[
    "class",
    "data",
    "dir",
    "displaystyle",
    "id",
    "mathbackground",
    "mathcolor",
    "mathsize",
    "mathvariant",
    "nonce",
    "scriptlevel",
    "style",
    "tabindex",
];

/// Leaves: presentational spacers and script markers
const MATHML_LEAVES: &[&str] = &["mspace", "mprescripts", "none"];

/// Token elements holding text
const MATHML_TOKENS: &[&str] = &["mi", "mn", "mo", "ms", "mtext"];

/// Node type name of MathML element `tag`. Dashes are dropped.
pub fn mathml_name(tag: &str) -> String {
    format!("{}MathML", tag.replace('-', ""))
}

/// One or more of any presentation element
fn mathml_content() -> String {
    let names: Vec<String> = MATHML_TAGS
        .iter()
        .filter(|tag| !matches!(**tag, "annotation" | "annotation-xml"))
        .map(|tag| mathml_name(tag))
        .collect();
    format!("({})+", names.join(" | "))
}

fn mathml_attributes(own: &[&str]) -> AttributeSpecs {
    AttributeSpecs::new()
        .with_optional(MATHML_CORE_ATTRIBUTES.iter().copied())
        .with_optional(EVENT_ATTRIBUTES.iter().copied())
        .with_optional(own.iter().copied())
}

/// Node entry for MathML element `tag`. MathML nodes are never selected on
/// their own; the enclosing `math` is.
fn mathml_element(tag: &str, spec: NodeSpec) -> (String, NodeSpec) {
    let mut spec = spec.selectable(false);
    let rendered = tag.to_string();
    spec = spec.to_dom(move |node| {
        let attrs = to_attributes(node.attrs(), Some(&node.node_type().spec().attrs), None);
        if node.is_leaf() {
            DomSpec::leaf(rendered.clone(), attrs)
        } else {
            DomSpec::wrap(rendered.clone(), attrs)
        }
    });
    let rule = element_rule(tag, &spec.attrs);
    (mathml_name(tag), spec.parse_rule(rule))
}

fn mathml_own(tag: &str) -> &'static [&'static str] {
    match tag {
        "annotation" | "annotation-xml" => &["encoding"],
        "maction" => &["actiontype", "selection"],
        "mfrac" => &["linethickness"],
        "mo" => &[
            "form",
            "fence",
            "separator",
            "lspace",
            "rspace",
            "stretchy",
            "symmetric",
            "maxsize",
            "minsize",
            "largeop",
            "movablelimits",
        ],
        "mover" => &["accent"],
        "munderover" => &["accent", "accentunder"],
        "mpadded" => &["width", "height", "depth", "lspace", "voffset"],
        "mspace" => &["width", "height", "depth"],
        "mtd" => &["columnspan", "rowspan"],
        _ => &[],
    }
}

/// Inline formulas as MathML trees
pub struct MathPlugin;

impl SchemaPlugin for MathPlugin {
    fn name(&self) -> &str {
        "math"
    }

    fn nodes(&self) -> Vec<(String, NodeSpec)> {
        let content = mathml_content();
        let annotations = format!("({} | {})*", mathml_name("annotation"), mathml_name("annotation-xml"));
        let mut nodes = vec![(
            "math_inline".to_string(),
            html_element(
                "math",
                NodeSpec::new()
                    .group("phrasing")
                    .content(&content)
                    .inline()
                    .atom()
                    .attrs(optional_attributes(&["display"])),
            ),
        )];
        for tag in MATHML_TAGS {
            let spec = NodeSpec::new().attrs(mathml_attributes(mathml_own(tag)));
            let spec = match *tag {
                "annotation" => spec.content("text?"),
                "annotation-xml" => spec.content("flow*"),
                "mtable" => spec.content(&format!("{}*", mathml_name("mtr"))),
                "mtr" => spec.content(&format!("{}*", mathml_name("mtd"))),
                "semantics" => spec.content(&format!("{annotations} {content} {annotations}")),
                tag if MATHML_TOKENS.contains(&tag) => spec.content("phrasing*"),
                tag if MATHML_LEAVES.contains(&tag) => spec,
                _ => spec.content(&content),
            };
            nodes.push(mathml_element(tag, spec));
        }
        nodes
    }
}
