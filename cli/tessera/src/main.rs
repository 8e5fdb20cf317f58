//! Tessera CLI: inspect and normalize compilation target descriptors.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "tessera", version, about = "Tessera target descriptors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Tag sources shared by the commands that resolve tags.
#[derive(clap::Args, Debug, Default)]
struct TagArgs {
    /// Tag file to load (repeatable)
    #[arg(long = "tags", value_name = "FILE")]
    files: Vec<PathBuf>,
    /// Directory whose *.tags.toml files are loaded
    #[arg(long, value_name = "DIR")]
    tags_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a target string and print the normalized descriptor
    Parse {
        /// Target string, tag name, or JSON config (e.g. "llvm -mcpu=skylake")
        target: String,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Canonical)]
        format: OutputFormat,
        /// Fail instead of falling back to defaults when a device is missing
        #[arg(long)]
        strict_device_check: bool,
        #[command(flatten)]
        tags: TagArgs,
    },
    /// List the built-in target kinds
    Kinds,
    /// Show the attribute schema of one kind
    Kind {
        /// Kind name (e.g. llvm, cuda)
        name: String,
    },
    /// List the tags found in tag files
    Tags {
        #[command(flatten)]
        tags: TagArgs,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The canonical `kind -key=value` string
    Canonical,
    /// The structured export as JSON
    Json,
    /// The verbose debug form
    Debug,
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "tessera=warn".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Parse {
            target,
            format,
            strict_device_check,
            tags,
        } => {
            let options = commands::parse::ParseOptions {
                format,
                strict_device_check,
                tag_files: tags.files,
                tags_dir: tags.tags_dir,
            };
            commands::parse::run(&target, &options)
        }
        Commands::Kinds => commands::kinds::list(),
        Commands::Kind { name } => commands::kinds::describe(&name),
        Commands::Tags { tags } => commands::tags::list(&tags.files, tags.tags_dir.as_deref()),
    }
}
