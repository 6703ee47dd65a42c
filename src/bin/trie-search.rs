use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use trie_search::{Error, Indexer, IndexerOptions, Result, Searcher, VERSION};

#[derive(Parser)]
#[command(name = "trie-search", version = VERSION)]
#[command(about = "Indexes a file tree and answers boolean word queries", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Builds the index of every file below ROOT
    Index {
        /// Root of the file tree to index
        root: PathBuf,

        /// Folder where the index is written
        #[arg(long, default_value = ".")]
        index_dir: PathBuf,

        /// Extension of the files to index (repeatable, replaces the defaults)
        #[arg(long = "extension")]
        extensions: Vec<String>,

        /// Words of this length or longer are not indexed
        #[arg(long)]
        max_word_length: Option<usize>,
    },

    /// Reads one query per line on the standard input
    Search {
        /// Folder containing the index
        #[arg(long, default_value = ".")]
        index_dir: PathBuf,
    },
}

fn index(
    root: PathBuf,
    index_dir: PathBuf,
    extensions: Vec<String>,
    max_word_length: Option<usize>,
) -> Result<()> {
    let mut options = IndexerOptions::default();
    if !extensions.is_empty() {
        options.extensions = extensions;
    }
    if let Some(max_word_length) = max_word_length {
        options.max_word_length = max_word_length;
    }

    // The indexer writes its folder when dropped, so the root is checked first
    if !root.is_dir() {
        return Err(Error::NotADirectory(root));
    }

    info!("Indexer folder: {}", root.display());
    let mut indexer = Indexer::new(&index_dir, &options);
    let count = indexer.index_directory(&root)?;
    indexer.build()?;
    info!("{} documents indexed in {}", count, index_dir.display());
    Ok(())
}

fn search(index_dir: PathBuf) -> Result<()> {
    let searcher = Searcher::new(&index_dir);
    let stdin = io::stdin();
    let stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let mut out = stdout.lock();
        match searcher.search(&line) {
            Ok(outcome) => outcome.write_report(&mut out)?,
            Err(e) => {
                if e.is_query_error() {
                    warn!("Invalid query {}: {}", line.trim(), e);
                } else {
                    error!("{}", e);
                }
                match e.outcome() {
                    Some(outcome) => outcome.write_report(&mut out)?,
                    None => writeln!(out, "end")?,
                }
            }
        }
        out.flush()?;
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Args::parse().command {
        Command::Index {
            root,
            index_dir,
            extensions,
            max_word_length,
        } => index(root, index_dir, extensions, max_word_length),
        Command::Search { index_dir } => search(index_dir),
    }
}
