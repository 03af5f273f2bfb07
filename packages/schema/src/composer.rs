//! Merging schema plugins into one editing schema

use crate::commands::Command;
use crate::error::{ComposeError, ComposeResult};
use crate::input_rules::InputRule;
use crate::keymap::{base_keymap, chain_keymaps, Keymap};
use crate::plugin::SchemaPlugin;
use quire_codec::Attrs;
use quire_model::{MarkSpec, Node, NodeSpec, Schema, SchemaSpec};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Result of composing plugins
#[derive(Clone)]
pub struct ComposedSchema {
    pub schema: Arc<Schema>,
    /// Minimal valid document: the top node filled with its required content
    pub doc: Node,
    pub keymap: Keymap,
    pub input_rules: Vec<InputRule>,
    pub commands: Vec<(String, Command)>,
    pub styles: Vec<String>,
    pub scripts: Vec<String>,
    /// Plugin names in composition order
    pub plugins: Vec<String>,
}

impl ComposedSchema {
    pub fn command(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }
}

impl fmt::Debug for ComposedSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedSchema")
            .field("plugins", &self.plugins)
            .field("top_node", &self.schema.top_node_name())
            .field("keys", &self.keymap.len())
            .field("input_rules", &self.input_rules.len())
            .finish()
    }
}

#[derive(Default)]
pub struct SchemaComposer {
    plugins: Vec<Arc<dyn SchemaPlugin>>,
}

impl SchemaComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, plugin: impl SchemaPlugin + 'static) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    pub fn register_arc(mut self, plugin: Arc<dyn SchemaPlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn plugin_names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn compose(&self) -> ComposeResult<ComposedSchema> {
        let mut nodes: Vec<(String, NodeSpec)> = Vec::new();
        let mut marks: Vec<(String, MarkSpec)> = Vec::new();
        let mut node_owner: HashMap<String, String> = HashMap::new();
        let mut mark_owner: HashMap<String, String> = HashMap::new();

        for plugin in &self.plugins {
            let owner = plugin.name().to_string();
            for (name, spec) in plugin.nodes() {
                if let Some(first) = node_owner.insert(name.clone(), owner.clone()) {
                    return Err(ComposeError::DuplicateNode {
                        name,
                        first,
                        second: owner,
                    });
                }
                nodes.push((name, spec));
            }
            for (name, spec) in plugin.marks() {
                if let Some(first) = mark_owner.insert(name.clone(), owner.clone()) {
                    return Err(ComposeError::DuplicateMark {
                        name,
                        first,
                        second: owner,
                    });
                }
                marks.push((name, spec));
            }
        }

        let declared: Vec<(String, String)> = self
            .plugins
            .iter()
            .filter_map(|p| p.top_node().map(|top| (p.name().to_string(), top)))
            .collect();
        let (top_owner, top_node) = declared.last().cloned().ok_or(ComposeError::MissingTopNode)?;
        if declared.len() > 1 {
            tracing::warn!(
                top_node = %top_node,
                plugin = %top_owner,
                declared = declared.len(),
                "more than one plugin declares a top node, using the last"
            );
        }

        let schema = Arc::new(Schema::new(SchemaSpec {
            nodes,
            marks,
            top_node: Some(top_node),
        })?);
        let doc = schema.create_and_fill(schema.top_node_name(), Attrs::new(), Vec::new())?;

        let mut keymaps: Vec<Keymap> = self.plugins.iter().map(|p| p.keymap(&schema)).collect();
        keymaps.push(base_keymap());
        let keymap = chain_keymaps(keymaps);

        let mut input_rules = Vec::new();
        let mut commands: Vec<(String, Command)> = Vec::new();
        let mut command_owner: HashMap<String, String> = HashMap::new();
        let mut styles = Vec::new();
        let mut scripts = Vec::new();
        for plugin in &self.plugins {
            let owner = plugin.name().to_string();
            input_rules.extend(plugin.input_rules()?);
            for (name, command) in plugin.commands() {
                if let Some(first) = command_owner.insert(name.clone(), owner.clone()) {
                    return Err(ComposeError::DuplicateCommand {
                        name,
                        first,
                        second: owner,
                    });
                }
                commands.push((name, command));
            }
            styles.extend(plugin.styles());
            scripts.extend(plugin.scripts());
        }

        let plugins = self.plugin_names();
        tracing::debug!(
            plugins = ?plugins,
            nodes = schema.node_types().len(),
            marks = schema.mark_types().len(),
            keys = keymap.len(),
            "composed schema"
        );

        Ok(ComposedSchema {
            schema,
            doc,
            keymap,
            input_rules,
            commands,
            styles,
            scripts,
            plugins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::select_all;

    struct Root;

    impl SchemaPlugin for Root {
        fn name(&self) -> &str {
            "root"
        }

        fn nodes(&self) -> Vec<(String, NodeSpec)> {
            vec![
                ("doc".to_string(), NodeSpec::new().content("block+")),
                ("p".to_string(), NodeSpec::new().content("text*").group("block")),
                ("text".to_string(), NodeSpec::new()),
            ]
        }

        fn top_node(&self) -> Option<String> {
            Some("doc".to_string())
        }

        fn keymap(&self, _schema: &Schema) -> Keymap {
            Keymap::new().bind("Mod-a", Command::new(|_| None))
        }
    }

    struct Extra(&'static str);

    impl SchemaPlugin for Extra {
        fn name(&self) -> &str {
            self.0
        }

        fn nodes(&self) -> Vec<(String, NodeSpec)> {
            vec![("hr".to_string(), NodeSpec::new().group("block"))]
        }

        fn keymap(&self, _schema: &Schema) -> Keymap {
            Keymap::new().bind("Mod-a", Command::new(select_all))
        }

        fn commands(&self) -> Vec<(String, Command)> {
            vec![("selectAll".to_string(), Command::new(select_all))]
        }
    }

    #[test]
    fn test_compose_builds_filled_document() {
        let composed = SchemaComposer::new().register(Root).register(Extra("extra")).compose().unwrap();
        assert_eq!(composed.doc.to_string(), "doc(p)");
        assert_eq!(composed.plugins, vec!["root", "extra"]);
        assert!(composed.command("selectAll").is_some());
        assert_eq!(composed.keymap.len(), base_keymap().len());
        assert!(composed.keymap.get("Mod-a").is_some());
    }

    #[test]
    fn test_duplicate_node_is_fatal() {
        let err = SchemaComposer::new()
            .register(Root)
            .register(Extra("one"))
            .register(Extra("two"))
            .compose()
            .unwrap_err();
        assert!(matches!(
            err,
            ComposeError::DuplicateNode { ref name, ref first, ref second }
                if name == "hr" && first == "one" && second == "two"
        ));
    }

    struct Emphasis(&'static str);

    impl SchemaPlugin for Emphasis {
        fn name(&self) -> &str {
            self.0
        }

        fn marks(&self) -> Vec<(String, MarkSpec)> {
            vec![("em".to_string(), MarkSpec::new())]
        }
    }

    #[test]
    fn test_duplicate_mark_is_fatal() {
        let err = SchemaComposer::new()
            .register(Root)
            .register(Emphasis("inline"))
            .register(Emphasis("legacy"))
            .compose()
            .unwrap_err();
        assert!(matches!(
            err,
            ComposeError::DuplicateMark { ref name, ref first, ref second }
                if name == "em" && first == "inline" && second == "legacy"
        ));
    }

    #[test]
    fn test_missing_top_node_is_fatal() {
        let err = SchemaComposer::new().register(Extra("extra")).compose().unwrap_err();
        assert!(matches!(err, ComposeError::MissingTopNode));
    }
}
