//! gql-history CLI - inspect and edit a persisted query history.
//!
//! Usage:
//!   gql-history list                      # History, then favorites
//!   gql-history add <query|->             # Record an execution
//!   gql-history favorite <index>          # Pin / unpin an entry
//!   gql-history label <index> <label>     # Set an entry's label
//!   gql-history delete <index>            # Remove an entry
//!   gql-history clear                     # Remove everything

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gql_history::{FileStorage, HistoryConfig, HistoryStore, QueryRecord, StorageApi};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gql-history")]
#[command(about = "gql-history - persistent GraphQL query history", long_about = None)]
struct Cli {
    /// Storage directory (overrides config)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Config file
    #[arg(short, long, default_value = "gql-history.toml")]
    config: PathBuf,

    /// Maximum history entries kept (overrides config, 0 = unbounded)
    #[arg(long)]
    max_length: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List history entries followed by favorites
    List {
        /// Print the entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record a query execution (skipped if it adds nothing new)
    Add {
        /// GraphQL document, or "-" to read it from stdin
        query: String,

        #[arg(long)]
        variables: Option<String>,

        #[arg(long)]
        headers: Option<String>,

        #[arg(long)]
        extensions: Option<String>,

        #[arg(long)]
        operation_name: Option<String>,
    },

    /// Move an entry between history and favorites
    Favorite {
        /// Position in `list` output
        index: usize,
    },

    /// Set the label of an entry
    Label {
        /// Position in `list` output
        index: usize,

        label: String,
    },

    /// Delete an entry
    Delete {
        /// Position in `list` output
        index: usize,

        /// Also delete a matching entry from the other collection
        #[arg(long)]
        clear_favorites: bool,
    },

    /// Delete all history and favorites
    Clear,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = HistoryConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(dir) = cli.dir {
        config.storage_dir = dir;
    }
    if let Some(max) = cli.max_length {
        config.max_history_length = max;
    }

    let storage = Arc::new(FileStorage::open(&config.storage_dir)?);
    let api = StorageApi::with_namespace(storage, config.namespace.clone());

    match cli.command {
        Commands::Clear => {
            api.clear();
            println!("Cleared history and favorites.");
            Ok(())
        }
        command => {
            let mut store = HistoryStore::with_api(api, config.max_history_length);
            run_store_command(&mut store, command)
        }
    }
}

fn run_store_command(store: &mut HistoryStore, command: Commands) -> Result<()> {
    match command {
        Commands::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(store.queries())?);
            } else {
                print_queries(store);
            }
        }

        Commands::Add {
            query,
            variables,
            headers,
            extensions,
            operation_name,
        } => {
            let query = if query == "-" {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            } else {
                query
            };
            let candidate = QueryRecord {
                query,
                variables,
                headers,
                extensions,
                operation_name,
                ..QueryRecord::default()
            };
            if store.update_history(&candidate) {
                println!("Saved ({} in history).", store.history().len());
            } else {
                println!("Skipped: nothing new to record.");
            }
        }

        Commands::Favorite { index } => {
            let record = entry(store, index)?.clone();
            store.toggle_favorite(&record);
            let state = if record.is_favorite() { "Unpinned" } else { "Pinned" };
            println!("{}: {}", state, record.display_name());
        }

        Commands::Label { index, label } => {
            let record = entry(store, index)?.clone().with_label(label);
            let local = local_index(store, index);
            store.edit_label(&record, Some(local));
            println!("Labeled: {}", record.display_name());
        }

        Commands::Delete {
            index,
            clear_favorites,
        } => {
            let record = entry(store, index)?.clone();
            store.delete_history(&record, clear_favorites);
            println!("Deleted: {}", record.display_name());
        }

        Commands::Clear => {}
    }

    Ok(())
}

fn entry(store: &HistoryStore, index: usize) -> Result<&QueryRecord> {
    match store.queries().get(index) {
        Some(record) => Ok(record),
        None => bail!(
            "no entry at index {} ({} entries)",
            index,
            store.queries().len()
        ),
    }
}

/// Position of a combined-view index inside its owning collection.
fn local_index(store: &HistoryStore, index: usize) -> usize {
    let history_len = store.history().len();
    if index < history_len {
        index
    } else {
        index - history_len
    }
}

fn print_queries(store: &HistoryStore) {
    if store.queries().is_empty() {
        println!("No saved queries.");
        return;
    }
    for (i, record) in store.queries().iter().enumerate() {
        let marker = if record.is_favorite() { '*' } else { ' ' };
        println!("{:>3} {} {}", i, marker, record.display_name());
    }
}
