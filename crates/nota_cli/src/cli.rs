use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Clone, Debug, Parser)]
#[command(name = "nota", version, about = "Nota note store")]
pub struct Cli {
    /// JSON config file; defaults apply when absent.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file, overriding the config's `db_path`.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// List active notes, newest first.
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Substring search over titles and content.
    Search {
        query: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Print one note, including deleted ones.
    Show { id: String },
    /// Create a note and print its id.
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
    },
    /// Replace the title and/or content of a note.
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    /// Move a note to the trash.
    Delete { id: String },
    /// Print the most recently modified note.
    Last,
    /// Export notes into a directory, one JSON file each.
    Export {
        dir: PathBuf,
        /// Only these ids; all active notes when omitted.
        #[arg(long = "id")]
        ids: Vec<String>,
    },
    /// Export all active notes into one bundle file.
    ExportBundle { path: PathBuf },
    /// Import every `*.json` file of a directory.
    Import {
        dir: PathBuf,
        #[command(flatten)]
        policy: DuplicateArgs,
    },
    /// Import one single-note JSON file.
    ImportFile {
        path: PathBuf,
        #[command(flatten)]
        policy: DuplicateArgs,
    },
    /// Import a bundle file.
    ImportBundle {
        path: PathBuf,
        #[command(flatten)]
        policy: DuplicateArgs,
    },
    /// Show or set the UI language (`en`, `zh`).
    Language { code: Option<String> },
}

#[derive(Clone, Copy, Debug, clap::Args)]
pub struct PageArgs {
    #[arg(long, default_value_t = 0)]
    pub offset: u32,
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Clone, Copy, Debug, clap::Args)]
pub struct DuplicateArgs {
    /// Replace existing notes that share an imported id.
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}
