use clap::{Parser, Subcommand};
use colored::Colorize;
use quire_cli::commands::{comments, head, schema, CommentsArgs, HeadArgs, SchemaArgs};
use tracing_subscriber::EnvFilter;

/// Quire CLI - inspect and edit HTML documents
#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log every editing step
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inspect or edit the head of a document
    Head(HeadArgs),

    /// List the comment threads of a document
    Comments(CommentsArgs),

    /// Show the composed schema
    Schema(SchemaArgs),
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()
        .map_err(|err| anyhow::anyhow!("Cannot get current directory: {err}"))?
        .display()
        .to_string();
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Command::Head(args) => head(args, &cwd, &mut stdout),
        Command::Comments(args) => comments(args, &cwd, &mut stdout),
        Command::Schema(args) => schema(args, &cwd, &mut stdout),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
