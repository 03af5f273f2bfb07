use super::element;
use crate::plugin::SchemaPlugin;
use quire_model::NodeSpec;

/// Sectioning elements, generic flow containers and figures
pub struct SectionPlugin;

impl SchemaPlugin for SectionPlugin {
    fn name(&self) -> &str {
        "section"
    }

    fn nodes(&self) -> Vec<(String, NodeSpec)> {
        let sectioning = ["article", "aside", "nav", "section"]
            .into_iter()
            .map(|tag| element(tag, NodeSpec::new().group("flow sectioning palpable containerblock").content("flow*")));
        let containers = ["header", "footer", "main", "search", "address"]
            .into_iter()
            .map(|tag| element(tag, NodeSpec::new().group("flow palpable containerblock").content("flow*")));

        sectioning
            .chain(containers)
            .chain([
                element("blockquote", NodeSpec::new().group("flow containerblock").content("flow*")),
                element(
                    "figure",
                    NodeSpec::new()
                        .group("flow palpable containerblock")
                        .content("(figcaption flow*) | (flow* figcaption?)"),
                ),
                element("figcaption", NodeSpec::new().group("containerinline").content("phrasing*")),
            ])
            .collect()
    }
}
