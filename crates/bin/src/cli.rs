//! CLI argument definitions for the objectsync binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Format {
    /// Aligned, human-readable text
    Human,
    /// One JSON document per command
    Json,
}

/// objectsync: synchronized, versioned object trees
#[derive(Parser, Debug)]
#[command(name = "objectsync")]
#[command(about = "objectsync: synchronized object trees with per-subtree undo")]
#[command(version)]
pub struct Cli {
    /// Server configuration file (JSON)
    #[arg(short, long, global = true, env = "OBJECTSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the per-object history depth
    #[arg(long, global = true, env = "OBJECTSYNC_HISTORY_DEPTH")]
    pub history_depth: Option<usize>,

    /// Output format
    #[arg(short, long, global = true, default_value = "human")]
    pub format: Format,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the styled document scene, then undo and redo through it
    Demo(DemoArgs),
    /// Build the document scene and print the snapshot of one subtree
    Snapshot(SnapshotArgs),
    /// Build the document scene and list the transitions recorded at one object
    History(HistoryArgs),
}

/// Arguments for the demo command
#[derive(clap::Args, Debug)]
pub struct DemoArgs {
    /// Number of transitions to undo before redoing them
    #[arg(short, long, default_value_t = 2)]
    pub undo: usize,
}

/// Arguments for the snapshot command
#[derive(clap::Args, Debug)]
pub struct SnapshotArgs {
    /// Subtree to capture: `root`, `div`, `text` or `list`
    #[arg(short, long, default_value = "root")]
    pub object: String,
}

/// Arguments for the history command
#[derive(clap::Args, Debug)]
pub struct HistoryArgs {
    /// Object whose history to list: `root`, `div`, `text` or `list`
    #[arg(short, long, default_value = "root")]
    pub object: String,
}
