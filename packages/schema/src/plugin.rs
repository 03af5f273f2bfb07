use crate::commands::Command;
use crate::error::ComposeResult;
use crate::input_rules::InputRule;
use crate::keymap::Keymap;
use quire_model::{MarkSpec, NodeSpec, Schema};

/// A contribution to the editing schema.
///
/// Plugins are composed in registration order. Node, mark and command names
/// must be unique across all plugins; keymaps may overlap and are chained.
pub trait SchemaPlugin: Send + Sync {
    /// Name used in error messages and configuration
    fn name(&self) -> &str;

    fn nodes(&self) -> Vec<(String, NodeSpec)> {
        Vec::new()
    }

    fn marks(&self) -> Vec<(String, MarkSpec)> {
        Vec::new()
    }

    /// Root node type, if this plugin provides one
    fn top_node(&self) -> Option<String> {
        None
    }

    /// Key bindings. Called once the full schema is known so commands can
    /// refer to any node or mark type.
    fn keymap(&self, _schema: &Schema) -> Keymap {
        Keymap::new()
    }

    fn input_rules(&self) -> ComposeResult<Vec<InputRule>> {
        Ok(Vec::new())
    }

    /// Named commands exposed to the application
    fn commands(&self) -> Vec<(String, Command)> {
        Vec::new()
    }

    /// Stylesheets the editor injects while this plugin is active
    fn styles(&self) -> Vec<String> {
        Vec::new()
    }

    /// Scripts the editor injects while this plugin is active
    fn scripts(&self) -> Vec<String> {
        Vec::new()
    }
}
