//! Novelistic CLI - Command-line interface for a novel library

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use novelistic_core::{JsonFileStore, NovelId};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Parse and validate jobs argument (must be at least 1)
fn parse_jobs(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
    if n < 1 {
        Err("jobs must be at least 1".to_string())
    } else {
        Ok(n)
    }
}

#[derive(Parser)]
#[command(name = "novelistic")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Library directory
    #[arg(
        long,
        global = true,
        env = "NOVELISTIC_DATA_DIR",
        default_value = "./novelistic_data"
    )]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import an EPUB into the library
    Import {
        /// EPUB file path
        input: PathBuf,

        /// Title of the new novel (defaults to the file name)
        #[arg(short, long)]
        title: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export a stored novel as EPUB
    Export {
        /// Novel id, as shown by `list`
        novel_id: NovelId,

        /// Output file or directory (defaults to the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Book language written to the package document
        #[arg(long, default_value = "en")]
        language: String,
    },

    /// List stored novels
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display information about an EPUB without importing it
    Info {
        /// EPUB file path
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the structure of an EPUB file
    Validate {
        /// EPUB file path
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export every stored novel
    Batch {
        /// Output directory
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Number of parallel jobs (must be at least 1)
        #[arg(short, long, default_value = "4", value_parser = parse_jobs)]
        jobs: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "novelistic_cli=debug,novelistic_core=debug"
    } else {
        "novelistic_cli=info"
    };

    // Logs go to stderr so `--json` output stays parseable
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let store = JsonFileStore::new(&cli.data_dir);
    tracing::debug!("Using library {}", store.path().display());

    match cli.command {
        Commands::Import { input, title, json } => {
            commands::import(&store, &input, title.as_deref(), json).await
        }

        Commands::Export {
            novel_id,
            output,
            language,
        } => commands::export(&store, novel_id, output.as_deref(), language).await,

        Commands::List { json } => commands::list(&store, json).await,

        Commands::Info { input, json } => commands::info(&input, json),

        Commands::Validate { input, json } => commands::validate(&input, json),

        Commands::Batch { output_dir, jobs } => commands::batch(&store, &output_dir, jobs).await,
    }
}
