use super::element;
use crate::commands::Command;
use crate::html::optional_attributes;
use crate::plugin::SchemaPlugin;
use quire_codec::Attrs;
use quire_model::{EditorState, NodeSpec, Selection, Transaction};

const CELL_ATTRIBUTES: &[&str] = &["colspan", "rowspan", "headers"];

const TABLE_STYLE: &str = "\
table { border-collapse: collapse; table-layout: fixed; }
td, th { vertical-align: top; box-sizing: border-box; position: relative; }
";

/// Add an empty row after the row holding the cursor, with as many cells as
/// that row and the cursor in its first cell
pub fn add_row_after(state: &EditorState) -> Option<Transaction> {
    let doc = state.doc();
    let rp = doc.resolve(state.selection().from(doc)).ok()?;
    let (depth, row) = rp.find_ancestor(|node| node.type_name() == "tr")?;
    let schema = state.schema();
    let block = schema.default_textblock()?.name().to_string();

    let mut cells = Vec::with_capacity(row.child_count());
    for cell in row.children() {
        let mut attrs = Attrs::new();
        if let Some(colspan) = cell.attr("colspan").filter(|v| !v.is_null()) {
            attrs.insert("colspan".to_string(), colspan.clone());
        }
        let para = schema.create_and_fill(&block, Attrs::new(), Vec::new()).ok()?;
        cells.push(schema.node("td", attrs, vec![para], Vec::new()).ok()?);
    }
    let fresh = schema.node("tr", Attrs::new(), cells, Vec::new()).ok()?;

    let after = rp.after(depth);
    let mut tr = state.tr();
    tr.insert(after, vec![fresh]).ok()?;
    tr.set_selection(Selection::cursor(after + 3));
    Some(tr)
}

/// Tables with row groups, captions and column groups
pub struct TablePlugin;

impl SchemaPlugin for TablePlugin {
    fn name(&self) -> &str {
        "table"
    }

    fn nodes(&self) -> Vec<(String, NodeSpec)> {
        let row_group = || NodeSpec::new().group("containerblock").content("tr*");
        vec![
            element(
                "table",
                NodeSpec::new()
                    .group("flow containerblock")
                    .content("caption? colgroup* thead? tbody* tfoot?")
                    .isolating(),
            ),
            element("caption", NodeSpec::new().group("containerblock").content("flow*")),
            element("colgroup", NodeSpec::new().group("containerblock").content("col*")),
            element("col", NodeSpec::new().attrs(optional_attributes(&["span"]))),
            element("thead", row_group()),
            element("tbody", row_group()),
            element("tfoot", row_group()),
            element("tr", NodeSpec::new().group("containerblock").content("(td | th)*")),
            element(
                "td",
                NodeSpec::new()
                    .group("sectioningroot containerblock")
                    .content("(p | flow)*")
                    .isolating()
                    .attrs(optional_attributes(CELL_ATTRIBUTES)),
            ),
            element(
                "th",
                NodeSpec::new()
                    .group("containerblock")
                    .content("(p | flow)*")
                    .isolating()
                    .attrs(optional_attributes(CELL_ATTRIBUTES))
                    .attrs(optional_attributes(&["abbr", "scope"])),
            ),
        ]
    }

    fn commands(&self) -> Vec<(String, Command)> {
        vec![("addRowAfter".to_string(), Command::new(add_row_after))]
    }

    fn styles(&self) -> Vec<String> {
        vec![TABLE_STYLE.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::SchemaComposer;
    use crate::plugins::BasePlugin;
    use quire_model::{Node, Schema};

    fn node(schema: &Schema, name: &str, content: Vec<Node>) -> Node {
        schema.node(name, Attrs::new(), content, vec![]).unwrap()
    }

    fn cell(schema: &Schema, text: &str) -> Node {
        let p = node(schema, "p", vec![schema.text(text, vec![]).unwrap()]);
        node(schema, "td", vec![p])
    }

    #[test]
    fn test_add_row_after_matches_cell_count() {
        let composed = SchemaComposer::new()
            .register(BasePlugin)
            .register(TablePlugin)
            .compose()
            .unwrap();
        let schema = composed.schema.clone();
        let row = node(&schema, "tr", vec![cell(&schema, "a"), cell(&schema, "b")]);
        let table = node(&schema, "table", vec![node(&schema, "tbody", vec![row])]);
        let doc = node(&schema, "explorable", vec![table]);
        let state = EditorState::create(schema, Some(doc))
            .unwrap()
            .with_selection(Selection::cursor(5));

        let tr = composed.command("addRowAfter").unwrap().run(&state).unwrap();
        assert_eq!(
            tr.doc().to_string(),
            r#"explorable(table(tbody(tr(td(p("a")), td(p("b"))), tr(td(p), td(p)))))"#
        );
        assert_eq!(tr.selection(), Selection::cursor(17));
    }

    #[test]
    fn test_add_row_outside_table_does_nothing() {
        let composed = SchemaComposer::new()
            .register(BasePlugin)
            .register(TablePlugin)
            .compose()
            .unwrap();
        let state = EditorState::create(composed.schema.clone(), None).unwrap();
        assert!(add_row_after(&state).is_none());
    }
}
