use super::open_session;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use quire_editor::{CommentAnchor, CommentThread};
use std::io::Write;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CommentsArgs {
    /// HTML file
    pub file: PathBuf,

    /// Print the threads as JSON
    #[arg(long)]
    pub json: bool,
}

fn changed_at(millis: i64) -> Option<String> {
    chrono::DateTime::from_timestamp_millis(millis).map(|at| at.format("%Y-%m-%d %H:%M").to_string())
}

fn write_thread(thread: &CommentThread, out: &mut dyn Write) -> Result<()> {
    let anchor = match thread.anchor {
        CommentAnchor::Range { from, to } => format!("{from}..{to}"),
        CommentAnchor::Node { pos } => format!("node at {pos}"),
    };
    let id = thread.id.as_deref().unwrap_or("-");
    writeln!(out, "{} {}", id.cyan().bold(), anchor.dimmed())?;
    for entry in &thread.entries {
        let author = entry
            .name
            .as_deref()
            .or(entry.email.as_deref())
            .or(entry.extra.get("author").map(String::as_str))
            .unwrap_or("anonymous");
        let when = entry.changed.and_then(changed_at).unwrap_or_default();
        writeln!(out, "  {} {}", author.green(), when.dimmed())?;
        writeln!(out, "    {}", entry.content.as_deref().unwrap_or_default())?;
    }
    Ok(())
}

pub fn comments(args: CommentsArgs, cwd: &str, out: &mut dyn Write) -> Result<()> {
    let session = open_session(&args.file, cwd)?;
    let threads = session.comment_threads();

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&threads)?)?;
        return Ok(());
    }
    if threads.is_empty() {
        writeln!(out, "{}", "No comments".dimmed())?;
    }
    for thread in &threads {
        write_thread(thread, out)?;
    }
    Ok(())
}
