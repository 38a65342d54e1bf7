//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Gleaner CLI - Build knowledge graphs from text with a local LLM.
#[derive(Debug, Parser)]
#[command(name = "gleaner")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true, default_value = "json")]
    pub format: CliFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (defaults to ./gleaner.toml, then the user config dir)
    #[arg(short, long, global = true, env = "GLEANER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// JSON format (default)
    Json,
    /// Summary table
    Table,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract a knowledge graph from each input file
    Extract(ExtractArgs),

    /// Show how input files would be chunked, without calling the model
    Chunk(ChunkArgs),

    /// Write a configuration file with default settings
    Init(InitArgs),
}

/// Input files shared by commands that read documents.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Files to read; `-` reads standard input
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Override the chunk size in tokens
    #[arg(long)]
    pub chunk_tokens: Option<usize>,

    /// Override the chunk overlap in tokens
    #[arg(long)]
    pub overlap_tokens: Option<usize>,
}

/// Arguments for the extract command.
#[derive(Debug, Args)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Allowed entity types, comma separated
    #[arg(short, long, value_delimiter = ',')]
    pub entity_types: Vec<String>,

    /// Domain description for the extraction prompt
    #[arg(short, long)]
    pub domain: Option<String>,

    /// Example query the graph should answer (repeatable)
    #[arg(short = 'q', long = "example-query")]
    pub example_queries: Vec<String>,

    /// Ollama model name
    #[arg(short, long, env = "GLEANER_MODEL")]
    pub model: Option<String>,

    /// Ollama endpoint
    #[arg(long, env = "GLEANER_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Maximum gleaning rounds per chunk
    #[arg(short, long)]
    pub gleaning_steps: Option<usize>,

    /// Maximum chunks extracted concurrently per document
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Arguments for the chunk command.
#[derive(Debug, Args)]
pub struct ChunkArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Arguments for the init command.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Where to write the file
    #[arg(default_value = crate::config::CONFIG_FILE_NAME)]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}
