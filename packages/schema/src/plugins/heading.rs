use super::element;
use crate::commands::{split_block_as, Command};
use crate::keymap::Keymap;
use crate::plugin::SchemaPlugin;
use quire_model::{EditorState, NodeSpec, Schema};

pub const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

fn in_heading(state: &EditorState) -> bool {
    let doc = state.doc();
    let Ok(rp) = doc.resolve(state.selection().from(doc)) else {
        return false;
    };
    (1..=rp.depth()).any(|depth| HEADINGS.contains(&rp.node(depth).type_name()))
}

/// `h1` to `h6` and `hgroup`
pub struct HeadingPlugin;

impl SchemaPlugin for HeadingPlugin {
    fn name(&self) -> &str {
        "heading"
    }

    fn nodes(&self) -> Vec<(String, NodeSpec)> {
        let mut nodes: Vec<(String, NodeSpec)> = HEADINGS
            .iter()
            .map(|tag| {
                element(
                    tag,
                    NodeSpec::new()
                        .group("flow heading palpable containerinline")
                        .content("phrasing*")
                        .defining(),
                )
            })
            .collect();
        nodes.push(element(
            "hgroup",
            NodeSpec::new()
                .group("flow heading palpable containerblock")
                .content("h1 | h2 | h3 | h4 | h5 | h6"),
        ));
        nodes
    }

    fn keymap(&self, _schema: &Schema) -> Keymap {
        let split = split_block_as("p");
        Keymap::new().bind(
            "Enter",
            Command::new(move |state| if in_heading(state) { split.run(state) } else { None }),
        )
    }
}
