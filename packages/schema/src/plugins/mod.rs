//! Built-in schema plugins
//!
//! Each plugin covers one family of HTML elements. [`DEFAULT_PLUGINS`] is the
//! body schema the editor uses unless configured otherwise; the `head` plugin
//! is composed on its own for the head sub-document.

mod base;
mod deprecated;
mod form;
mod head;
mod heading;
mod list;
mod math;
mod media;
mod phrasing;
mod section;
mod svg;
mod table;

pub use base::{BasePlugin, KNOWN_HTML_TAGS};
pub use deprecated::DeprecatedPlugin;
pub use form::FormPlugin;
pub use head::{head_schema, HeadPlugin, HEAD_ELEMENTS};
pub use heading::{HeadingPlugin, HEADINGS};
pub use list::{lift_list_item, lift_list_item_in_list, sink_list_item, split_list_item, ListPlugin};
pub use math::{MathPlugin, MATHML_TAGS};
pub use media::MediaPlugin;
pub use phrasing::PhrasingPlugin;
pub use section::SectionPlugin;
pub use svg::SvgPlugin;
pub use table::{add_row_after, TablePlugin};

use crate::composer::SchemaComposer;
use crate::error::{ComposeError, ComposeResult};
use crate::html::html_element;
use crate::plugin::SchemaPlugin;
use quire_model::NodeSpec;
use std::sync::Arc;

/// Plugins composed into the body schema by default, in composition order
pub const DEFAULT_PLUGINS: &[&str] = &[
    "base",
    "heading",
    "section",
    "list",
    "table",
    "phrasing",
    "media",
    "form",
    "math",
    "svg",
    "deprecated",
];

/// Every plugin name [`builtin_plugin`] knows
pub const BUILTIN_PLUGINS: &[&str] = &[
    "base",
    "heading",
    "section",
    "list",
    "table",
    "phrasing",
    "media",
    "form",
    "math",
    "svg",
    "deprecated",
    "head",
];

pub fn builtin_plugin(name: &str) -> ComposeResult<Arc<dyn SchemaPlugin>> {
    let plugin: Arc<dyn SchemaPlugin> = match name {
        "base" => Arc::new(BasePlugin),
        "heading" => Arc::new(HeadingPlugin),
        "section" => Arc::new(SectionPlugin),
        "list" => Arc::new(ListPlugin),
        "table" => Arc::new(TablePlugin),
        "phrasing" => Arc::new(PhrasingPlugin),
        "media" => Arc::new(MediaPlugin),
        "form" => Arc::new(FormPlugin),
        "math" => Arc::new(MathPlugin),
        "svg" => Arc::new(SvgPlugin),
        "deprecated" => Arc::new(DeprecatedPlugin),
        "head" => Arc::new(HeadPlugin),
        other => return Err(ComposeError::UnknownPlugin(other.to_string())),
    };
    Ok(plugin)
}

/// A composer with the named built-in plugins registered in order
pub fn composer_for<S: AsRef<str>>(names: &[S]) -> ComposeResult<SchemaComposer> {
    names
        .iter()
        .try_fold(SchemaComposer::new(), |composer, name| {
            Ok(composer.register_arc(builtin_plugin(name.as_ref())?))
        })
}

/// A composer with [`DEFAULT_PLUGINS`]
pub fn default_composer() -> SchemaComposer {
    DEFAULT_PLUGINS
        .iter()
        .filter_map(|name| builtin_plugin(name).ok())
        .fold(SchemaComposer::new(), SchemaComposer::register_arc)
}

/// Node entry for HTML element `tag`, named after the tag
fn element(tag: &str, spec: NodeSpec) -> (String, NodeSpec) {
    (tag.to_string(), html_element(tag, spec))
}

/// Node entry named `name` for HTML element `tag`
fn named(name: &str, tag: &str, spec: NodeSpec) -> (String, NodeSpec) {
    (name.to_string(), html_element(tag, spec))
}
