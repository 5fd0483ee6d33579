//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

/// Containment hierarchies for tagged byte ranges
#[derive(Parser, Debug)]
#[command(name = "finter")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory holding a local .finter.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    /// Do not synthesize fragment nodes for unclaimed bytes
    #[arg(long, global = true)]
    pub no_fill: bool,

    /// Drop zero-length tags instead of failing
    #[arg(long, global = true)]
    pub skip_degenerate: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Where the file span comes from; default is the largest tag end.
#[derive(Args, Debug, Clone, Default)]
pub struct SpanArgs {
    /// File size in bytes (decimal or 0x-prefixed hex)
    #[arg(short, long, value_parser = parse_size, conflicts_with = "file")]
    pub size: Option<u64>,

    /// Binary the tags were taken from; its length is the file span
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the coverage hierarchy as a tree
    Tree {
        /// Tag files ("[begin,end) kind description" per line)
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        tags: Vec<PathBuf>,
        #[command(flatten)]
        span: SpanArgs,
    },

    /// List leaves in offset order
    Leaves {
        /// Tag file
        #[arg(value_hint = ValueHint::FilePath)]
        tags: PathBuf,
        #[command(flatten)]
        span: SpanArgs,
    },

    /// Validate tag files without printing the hierarchy
    Check {
        /// Tag files
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        tags: Vec<PathBuf>,
        #[command(flatten)]
        span: SpanArgs,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,
}

/// Parse `1234` or `0x4D2`.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid size {s:?}: {e}"))
}
