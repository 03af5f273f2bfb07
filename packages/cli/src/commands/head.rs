use super::{open_session, parse_pairs, save_or_print};
use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use quire_codec::{attrs, AttrValue};
use quire_editor::{top_level_index, Direction, HeadMatch};
use quire_model::Node;
use std::io::Write;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct HeadArgs {
    #[command(subcommand)]
    pub command: HeadCommand,
}

#[derive(Subcommand, Debug)]
pub enum HeadCommand {
    /// List the elements of the head
    List {
        /// HTML file
        file: PathBuf,
    },

    /// Update the first element matching `--match-attr`, or append a new one
    Upsert {
        file: PathBuf,

        /// Element to create
        #[arg(long)]
        tag: String,

        /// Attribute to set (key=value)
        #[arg(long = "attr")]
        attrs: Vec<String>,

        /// Attribute the existing element must have (key=value)
        #[arg(long = "match-attr")]
        match_attrs: Vec<String>,

        /// Text content
        #[arg(long)]
        content: Option<String>,

        /// Write the result back to the file
        #[arg(short, long)]
        write: bool,
    },

    /// Delete the first matching element
    Delete {
        file: PathBuf,

        /// Attribute the element must have (key=value)
        #[arg(long = "match-attr")]
        match_attrs: Vec<String>,

        /// Element type the element must have
        #[arg(long)]
        tag: Option<String>,

        #[arg(short, long)]
        write: bool,
    },

    /// Move an element one place up or down
    Move {
        file: PathBuf,

        /// Index among the top-level head elements
        #[arg(long, required_unless_present = "pos", conflicts_with = "pos")]
        index: Option<usize>,

        /// Position of the element, as printed by `head list`
        #[arg(long)]
        pos: Option<usize>,

        /// up or down
        #[arg(long)]
        direction: Direction,

        #[arg(short, long)]
        write: bool,
    },
}

fn matches_all(node: &Node, tag: Option<&str>, pairs: &[(String, String)]) -> bool {
    tag.map(|tag| node.type_name() == tag).unwrap_or(true)
        && pairs.iter().all(|(key, value)| node.attr_str(key) == Some(value.as_str()))
}

fn describe(node: &Node) -> String {
    let attrs: Vec<String> = node
        .attrs()
        .iter()
        .filter(|(_, value)| !value.is_null() && !matches!(value, AttrValue::Map(_)))
        .map(|(key, value)| format!("{}=\"{}\"", key, value.to_markup()))
        .collect();
    let mut line = format!("<{}", node.type_name());
    for attr in attrs {
        line.push(' ');
        line.push_str(&attr);
    }
    line.push('>');
    let text = node.text_content();
    if !text.is_empty() {
        line.push(' ');
        line.push_str(&text);
    }
    line
}

pub fn head(args: HeadArgs, cwd: &str, out: &mut dyn Write) -> Result<()> {
    match args.command {
        HeadCommand::List { file } => {
            let session = open_session(&file, cwd)?;
            let elements = session.get_head_element_all(&|node, _, _, _| !node.is_text());
            if elements.is_empty() {
                writeln!(out, "{}", "(empty head)".dimmed())?;
            }
            for HeadMatch { node, pos } in elements {
                let depth = session.head().doc().resolve(pos).map(|rp| rp.depth()).unwrap_or(0);
                writeln!(out, "{:>4}  {}{}", pos.to_string().cyan(), "  ".repeat(depth), describe(&node))?;
            }
            Ok(())
        }

        HeadCommand::Upsert {
            file,
            tag,
            attrs: pairs,
            match_attrs,
            content,
            write,
        } => {
            let mut session = open_session(&file, cwd)?;
            let pairs = parse_pairs(&pairs)?;
            let wanted = parse_pairs(&match_attrs)?;
            let schema = session.head_schema().schema.clone();
            let content = match content {
                Some(text) if !text.is_empty() => vec![schema.text(text, vec![])?],
                _ => vec![],
            };
            // without match attributes the element is always appended
            let matcher = |node: &Node, _: usize, _: Option<&Node>, _: usize| {
                !wanted.is_empty() && matches_all(node, Some(tag.as_str()), &wanted)
            };
            let changed = session.upsert_head_element(&tag, attrs(pairs), content, &matcher);
            if !changed {
                writeln!(out, "{}", "Head unchanged".yellow())?;
                return Ok(());
            }
            save_or_print(&session, &file, write, out)
        }

        HeadCommand::Delete {
            file,
            match_attrs,
            tag,
            write,
        } => {
            let wanted = parse_pairs(&match_attrs)?;
            if wanted.is_empty() && tag.is_none() {
                return Err(anyhow::anyhow!("Give --tag or at least one --match-attr"));
            }
            let mut session = open_session(&file, cwd)?;
            let matcher =
                |node: &Node, _: usize, _: Option<&Node>, _: usize| matches_all(node, tag.as_deref(), &wanted);
            if !session.delete_head_element(&matcher) {
                writeln!(out, "{}", "No matching element".yellow())?;
                return Ok(());
            }
            save_or_print(&session, &file, write, out)
        }

        HeadCommand::Move {
            file,
            index,
            pos,
            direction,
            write,
        } => {
            let mut session = open_session(&file, cwd)?;
            let pos = match (pos, index) {
                (Some(pos), _) => pos,
                (None, Some(index)) => session
                    .get_head_element(&top_level_index(index))
                    .map(|found| found.pos)
                    .ok_or_else(|| anyhow::anyhow!("No head element at index {index}"))?,
                (None, None) => return Err(anyhow::anyhow!("Give --index or --pos")),
            };
            if !session.move_head_element(pos, direction) {
                writeln!(out, "{}", format!("Nothing to move {direction}").yellow())?;
                return Ok(());
            }
            save_or_print(&session, &file, write, out)
        }
    }
}
