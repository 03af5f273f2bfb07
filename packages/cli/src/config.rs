use quire_editor::{CommentAuthor, EditorOptions};
use quire_model::DEFAULT_DEPTH;
use quire_schema::DEFAULT_PLUGINS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "quire.config.json";

/// Quire configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// `lang` of new documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,

    #[serde(default = "default_undo_depth")]
    pub undo_depth: usize,

    /// Built-in schema plugins, in composition order
    #[serde(default = "default_plugins")]
    pub plugins: Vec<String>,

    /// Upgrade deprecated presentation attributes on import
    #[serde(default)]
    pub import_deprecated: bool,

    /// Author recorded on new comments
    #[serde(default)]
    pub author: CommentAuthor,

    #[serde(default)]
    pub editing_styles: Vec<String>,

    #[serde(default)]
    pub editing_scripts: Vec<String>,
}

fn default_undo_depth() -> usize {
    DEFAULT_DEPTH
}

fn default_plugins() -> Vec<String> {
    DEFAULT_PLUGINS.iter().map(|name| name.to_string()).collect()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|err| anyhow::anyhow!("Invalid {}: {}", config_path.display(), err))?;
            tracing::debug!(path = %config_path.display(), "config loaded");
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    pub fn editor_options(&self) -> EditorOptions {
        EditorOptions {
            lang: self.lang.clone(),
            undo_depth: self.undo_depth,
            plugins: self.plugins.clone(),
            import_deprecated: self.import_deprecated,
            author: self.author.clone(),
            editing_styles: self.editing_styles.clone(),
            editing_scripts: self.editing_scripts.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lang: None,
            undo_depth: default_undo_depth(),
            plugins: default_plugins(),
            import_deprecated: false,
            author: CommentAuthor::default(),
            editing_styles: vec![],
            editing_scripts: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "lang": "fr",
            "undoDepth": 20,
            "plugins": ["base", "heading"],
            "importDeprecated": true,
            "author": { "name": "Ada", "email": "ada@example.org" },
            "editingStyles": ["body { caret-color: red }"]
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.lang.as_deref(), Some("fr"));
        assert_eq!(config.undo_depth, 20);
        assert_eq!(config.plugins, vec!["base", "heading"]);
        assert!(config.import_deprecated);
        assert_eq!(config.author.email.as_deref(), Some("ada@example.org"));
        assert!(config.editing_scripts.is_empty());

        let options = config.editor_options();
        assert_eq!(options.undo_depth, 20);
        assert_eq!(options.editing_styles.len(), 1);
    }

    #[test]
    fn test_default_config() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.plugins.len(), DEFAULT_PLUGINS.len());
        assert_eq!(config.editor_options(), EditorOptions::default());
    }
}
