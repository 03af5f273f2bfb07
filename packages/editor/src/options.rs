use quire_model::DEFAULT_DEPTH;
use quire_schema::DEFAULT_PLUGINS;
use serde::{Deserialize, Serialize};

/// Author recorded on new comments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAuthor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Settings for an editing session
#[derive(Debug, Clone, PartialEq)]
pub struct EditorOptions {
    /// `lang` of the `html` element in new documents
    pub lang: Option<String>,
    pub undo_depth: usize,
    /// Built-in plugins composed into the body schema, in order
    pub plugins: Vec<String>,
    /// Upgrade deprecated presentation attributes on import
    pub import_deprecated: bool,
    pub author: CommentAuthor,
    /// Stylesheets the editor injects into the live head
    pub editing_styles: Vec<String>,
    /// Module script sources the editor injects inline into the live head
    pub editing_scripts: Vec<String>,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            lang: None,
            undo_depth: DEFAULT_DEPTH,
            plugins: DEFAULT_PLUGINS.iter().map(|name| name.to_string()).collect(),
            import_deprecated: false,
            author: CommentAuthor::default(),
            editing_styles: Vec::new(),
            editing_scripts: Vec::new(),
        }
    }
}
