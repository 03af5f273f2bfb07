use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use quire_schema::{composer_for, head_schema, ComposedSchema};
use std::io::Write;

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Show the head schema instead of the body schema
    #[arg(long)]
    pub head: bool,
}

fn write_section(out: &mut dyn Write, title: &str, names: &[&str]) -> Result<()> {
    writeln!(out, "{} ({})", title.bold(), names.len())?;
    writeln!(out, "  {}", names.join(" "))?;
    Ok(())
}

pub fn schema(args: SchemaArgs, cwd: &str, out: &mut dyn Write) -> Result<()> {
    let composed: ComposedSchema = if args.head {
        head_schema()?
    } else {
        let config = Config::load(cwd)?;
        composer_for(config.plugins.as_slice())?.compose()?
    };
    let schema = &composed.schema;

    writeln!(out, "{} {}", "Plugins:".bold(), composed.plugins.join(", "))?;
    writeln!(out, "{} {}", "Top node:".bold(), schema.top_node_name().cyan())?;
    let nodes: Vec<&str> = schema.node_types().iter().map(|t| t.name()).collect();
    write_section(out, "Nodes", &nodes)?;
    let marks: Vec<&str> = schema.mark_types().iter().map(|t| t.name()).collect();
    write_section(out, "Marks", &marks)?;
    let keys: Vec<&str> = composed.keymap.keys().collect();
    write_section(out, "Keys", &keys)?;
    let commands: Vec<&str> = composed.commands.iter().map(|(name, _)| name.as_str()).collect();
    write_section(out, "Commands", &commands)?;
    Ok(())
}
