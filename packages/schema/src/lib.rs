//! # Quire Schema
//!
//! Editing schemas assembled from plugins:
//!
//! - **plugin**: the [`SchemaPlugin`] contribution trait
//! - **composer**: merges plugins, detecting name conflicts
//! - **html**: node and mark specs for HTML elements
//! - **keymap** / **commands** / **input_rules**: editing behavior plugins bind
//! - **plugins**: the built-in element families and the head schema

pub mod commands;
pub mod composer;
pub mod error;
pub mod html;
pub mod input_rules;
pub mod keymap;
pub mod plugin;
pub mod plugins;

pub use commands::{chain_commands, toggle_mark, Command};
pub use composer::{ComposedSchema, SchemaComposer};
pub use error::{ComposeError, ComposeResult};
pub use html::{html_element, html_mark};
pub use input_rules::{run_input_rules, InputRule};
pub use keymap::{base_keymap, normalize_key, Keymap};
pub use plugin::SchemaPlugin;
pub use plugins::{builtin_plugin, composer_for, default_composer, head_schema, DEFAULT_PLUGINS, HEAD_ELEMENTS};
