pub mod comments;
pub mod head;
pub mod schema;

pub use comments::{comments, CommentsArgs};
pub use head::{head, HeadArgs, HeadCommand};
pub use schema::{schema, SchemaArgs};

use crate::config::Config;
use anyhow::Result;
use quire_dom::SerializeOptions;
use quire_editor::EditorSession;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Open `file` with the options of the config in `cwd`
pub(crate) fn open_session(file: &Path, cwd: &str) -> Result<EditorSession> {
    let config = Config::load(cwd)?;
    let html = fs::read_to_string(file)
        .map_err(|err| anyhow::anyhow!("Cannot read {}: {}", file.display(), err))?;
    let session = EditorSession::open(&html, config.editor_options())?;
    tracing::debug!(file = %file.display(), "document opened");
    Ok(session)
}

/// Write the document back to `file`, or print it when `write` is off
pub(crate) fn save_or_print(session: &EditorSession, file: &Path, write: bool, out: &mut dyn Write) -> Result<()> {
    let html = session.export_html(&SerializeOptions::default());
    if write {
        fs::write(file, html)?;
        writeln!(out, "Wrote {}", file.display())?;
    } else {
        writeln!(out, "{html}")?;
    }
    Ok(())
}

/// `key=value` pairs; a bare `key` has an empty value
pub(crate) fn parse_pairs(pairs: &[String]) -> Result<Vec<(String, String)>> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if key.is_empty() => Err(anyhow::anyhow!("Missing attribute name in '{pair}'")),
            Some((key, value)) => Ok((key.to_string(), value.to_string())),
            None if pair.is_empty() => Err(anyhow::anyhow!("Empty attribute")),
            None => Ok((pair.clone(), String::new())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let pairs = parse_pairs(&["name=description".to_string(), "async".to_string()]).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("name".to_string(), "description".to_string()),
                ("async".to_string(), String::new())
            ]
        );
        assert!(parse_pairs(&["=x".to_string()]).is_err());
    }
}
