use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use qsearch_core::{CorpusBuilder, EngineConfig, SearchEngine, SearchHit, DEFAULT_TOP_K};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query a TF-IDF question index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the index from a record file or a directory of .json/.jsonl files
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory (defaults to QSEARCH_INDEX_DIR or ./index)
        #[arg(long)]
        output: Option<String>,
        /// Maximum number of vocabulary tokens (defaults to QSEARCH_VOCABULARY_SIZE or 3000)
        #[arg(long)]
        vocab_size: Option<usize>,
    },
    /// Run one query against a built index
    Query {
        /// Index directory (defaults to QSEARCH_INDEX_DIR or ./index)
        #[arg(long)]
        index: Option<String>,
        /// Query text
        #[arg(long)]
        q: String,
        /// Number of results
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        k: usize,
    },
    /// Read queries from stdin, one per line, and print matches
    Repl {
        /// Index directory (defaults to QSEARCH_INDEX_DIR or ./index)
        #[arg(long)]
        index: Option<String>,
        /// Number of results per query
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        k: usize,
    },
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();

    let base = EngineConfig::from_env()?;
    match cli.command {
        Commands::Build { input, output, vocab_size } => {
            build_index(&input, &base.overridden(output.map(Into::into), vocab_size)?)
        }
        Commands::Query { index, q, k } => {
            let engine = SearchEngine::open(&base.overridden(index.map(Into::into), None)?)?;
            print_hits(&mut io::stdout().lock(), &engine.most_similar(&q, k)?)?;
            Ok(())
        }
        Commands::Repl { index, k } => repl(&base.overridden(index.map(Into::into), None)?, k),
    }
}

fn is_record_file(path: &Path) -> bool {
    matches!(path.extension().and_then(|s| s.to_str()), Some("json" | "jsonl"))
}

/// Record files under `input`. Directories are walked in file-name order so that
/// duplicate questions resolve the same way on every run.
fn input_files(input: &Path) -> Vec<PathBuf> {
    if input.is_file() {
        return vec![input.to_path_buf()];
    }
    WalkDir::new(input)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_record_file(e.path()))
        .map(|e| e.into_path())
        .collect()
}

fn build_index(input: &str, config: &EngineConfig) -> Result<()> {
    let files = input_files(Path::new(input));
    if files.is_empty() {
        bail!("no .json or .jsonl input found at {input}");
    }

    let mut builder = CorpusBuilder::new();
    for file in &files {
        builder.read_jsonl_file(file)?;
        tracing::debug!(file = %file.display(), questions = builder.len(), "read input file");
    }
    let corpus = builder.finish();
    tracing::info!(files = files.len(), num_docs = corpus.len(), "ingested questions");

    let engine = SearchEngine::build(corpus, config)?;
    tracing::info!(
        output = %config.index_dir.display(),
        vocabulary_size = config.vocabulary_size,
        num_docs = engine.corpus().len(),
        "index build complete"
    );
    Ok(())
}

fn repl(config: &EngineConfig, k: usize) -> Result<()> {
    let engine = SearchEngine::open(config)?;
    engine.warm_up()?;

    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    write!(out, ">>> ")?;
    out.flush()?;
    for line in stdin.lock().lines() {
        let query = line?;
        if !query.trim().is_empty() {
            print_hits(&mut out, &engine.most_similar(&query, k)?)?;
        }
        write!(out, ">>> ")?;
        out.flush()?;
    }
    writeln!(out)?;
    Ok(())
}

fn print_hits<W: Write>(out: &mut W, hits: &[SearchHit]) -> io::Result<()> {
    for hit in hits {
        writeln!(out, "{:.4}\t{}\t{}", hit.score, hit.external_id, hit.text)?;
    }
    Ok(())
}
