//! Key bindings
//!
//! Key names look like `Mod-Shift-z`: any number of modifiers followed by a
//! key, separated by `-`. Names are normalized on insert and lookup so
//! `shift-Mod-Z` and `Mod-Shift-z` address the same binding.

use crate::commands::{
    chain_commands, create_paragraph_near, delete_selection, exit_code, insert_break, insert_word_break,
    join_backward, join_forward, new_line_in_code, select_all, select_first_child_node, select_node_backward,
    select_node_forward, select_parent_node, split_block, Command,
};
use quire_model::{EditorState, Transaction};
use std::collections::BTreeMap;

const MODIFIER_ORDER: [&str; 5] = ["Mod", "Ctrl", "Alt", "Shift", "Meta"];

/// Canonical form of a key name
pub fn normalize_key(name: &str) -> String {
    // A trailing "-" is the minus key itself
    let (mods_part, key) = match name.strip_suffix("--") {
        Some(rest) => (rest, "-".to_string()),
        None => match name.rsplit_once('-') {
            Some((mods, key)) if !key.is_empty() => (mods, key.to_string()),
            _ => ("", name.to_string()),
        },
    };

    let key = if key.chars().count() == 1 {
        key.to_lowercase()
    } else {
        let mut chars = key.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => key,
        }
    };

    let mut present = [false; 5];
    for modifier in mods_part.split('-').filter(|m| !m.is_empty()) {
        let index = match modifier.to_ascii_lowercase().as_str() {
            "mod" => Some(0),
            "ctrl" | "control" | "c" => Some(1),
            "alt" | "a" => Some(2),
            "shift" | "s" => Some(3),
            "meta" | "cmd" | "m" => Some(4),
            _ => None,
        };
        if let Some(index) = index {
            present[index] = true;
        }
    }

    let mut out = String::new();
    for (index, modifier) in MODIFIER_ORDER.iter().enumerate() {
        if present[index] {
            out.push_str(modifier);
            out.push('-');
        }
    }
    out.push_str(&key);
    out
}

/// A set of key bindings
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: BTreeMap<String, Command>,
}

impl Keymap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a command, replacing any earlier binding for the key
    pub fn bind(mut self, key: &str, command: Command) -> Self {
        self.bindings.insert(normalize_key(key), command);
        self
    }

    pub fn insert(&mut self, key: &str, command: Command) {
        self.bindings.insert(normalize_key(key), command);
    }

    pub fn get(&self, key: &str) -> Option<&Command> {
        self.bindings.get(&normalize_key(key))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Run the command bound to `key`, if any applies
    pub fn handle(&self, key: &str, state: &EditorState) -> Option<Transaction> {
        self.get(key)?.run(state)
    }
}

/// Merge keymaps so that every key runs the commands bound to it by each
/// keymap, in the order the keymaps are given, until one applies
pub fn chain_keymaps(keymaps: Vec<Keymap>) -> Keymap {
    let mut grouped: BTreeMap<String, Vec<Command>> = BTreeMap::new();
    for keymap in keymaps {
        for (key, command) in keymap.bindings {
            grouped.entry(key).or_default().push(command);
        }
    }
    let bindings = grouped
        .into_iter()
        .map(|(key, mut commands)| {
            let command = if commands.len() == 1 {
                commands.remove(0)
            } else {
                chain_commands(commands)
            };
            (key, command)
        })
        .collect();
    Keymap { bindings }
}

/// Generic editing bindings. The composer installs them after every plugin
/// keymap so plugin bindings for the same keys run first.
pub fn base_keymap() -> Keymap {
    fn chain(commands: &[fn(&EditorState) -> Option<Transaction>]) -> Command {
        chain_commands(commands.iter().map(|&f| Command::new(f)).collect())
    }
    Keymap::new()
        .bind(
            "Enter",
            chain(&[new_line_in_code, create_paragraph_near, split_block, insert_break]),
        )
        .bind("Mod-Enter", chain(&[create_paragraph_near, exit_code]))
        .bind("Alt-Enter", Command::new(insert_break))
        .bind("Alt-Shift-Enter", Command::new(insert_word_break))
        .bind(
            "Backspace",
            chain(&[delete_selection, join_backward, select_node_backward]),
        )
        .bind("Delete", chain(&[delete_selection, join_forward, select_node_forward]))
        .bind("Mod-a", Command::new(select_all))
        .bind("Mod-Alt-ArrowLeft", Command::new(select_parent_node))
        .bind("Mod-Alt-ArrowRight", Command::new(select_first_child_node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::{NodeSpec, Schema, SchemaSpec, Selection};
    use std::sync::Arc;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Mod-Enter"), "Mod-Enter");
        assert_eq!(normalize_key("shift-mod-Z"), "Mod-Shift-z");
        assert_eq!(normalize_key("Alt-Shift-enter"), "Alt-Shift-Enter");
        assert_eq!(normalize_key("Ctrl--"), "Ctrl--");
        assert_eq!(normalize_key("a"), "a");
        assert_eq!(normalize_key("Mod-Alt-arrowLeft"), "Mod-Alt-ArrowLeft");
    }

    fn state() -> EditorState {
        let schema = Schema::new(SchemaSpec {
            nodes: vec![
                ("doc".to_string(), NodeSpec::new().content("p+")),
                ("p".to_string(), NodeSpec::new().content("text*")),
                ("text".to_string(), NodeSpec::new()),
            ],
            marks: vec![],
            top_node: None,
        })
        .unwrap();
        EditorState::create(Arc::new(schema), None).unwrap()
    }

    #[test]
    fn test_chained_keymaps_fall_through() {
        let never = Command::new(|_| None);
        let select = Command::new(crate::commands::select_all);
        let first = Keymap::new().bind("Mod-a", never);
        let second = Keymap::new().bind("mod-A", select).bind("Enter", Command::new(|_| None));
        let merged = chain_keymaps(vec![first, second]);

        assert_eq!(merged.len(), 2);
        let tr = merged.handle("Mod-a", &state()).unwrap();
        assert_eq!(tr.selection(), Selection::All);
        assert!(merged.handle("Enter", &state()).is_none());
        assert!(merged.handle("Tab", &state()).is_none());
    }

    #[test]
    fn test_base_keymap_splits_paragraphs() {
        let keymap = base_keymap();
        let state = state();
        let tr = keymap.handle("Enter", &state).unwrap();
        assert_eq!(tr.doc().child_count(), 2);
        assert!(keymap.get("mod-A").is_some());
    }
}
