//! Command-line loader: reads the definition for a file type, streams its
//! data files and writes the records into a JSON Lines database directory.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use microlector::io::{GlobResolver, MapResolver, ResolverChain};
use microlector::{Catalog, DocumentStore, IngestConfig, JsonlStore, MemoryStore, Scheduler};
use tracing_subscriber::EnvFilter;

/// Load fixed-width microdata files into a document store.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File type; selects `<formats>/<FILE_TYPE>.json`
    file_type: String,

    /// Database name (defaults to the file type)
    db_name: Option<String>,

    /// Directory holding format definitions
    #[arg(long, default_value = "formats")]
    formats: PathBuf,

    /// Directory holding databases
    #[arg(long, default_value = "data")]
    store: PathBuf,

    /// Data path for one file id, as ID=PATH (repeatable)
    #[arg(long = "data", value_name = "ID=PATH", value_parser = MapResolver::parse_pair)]
    data: Vec<(String, PathBuf)>,

    /// Directory searched for `<id>*` when no --data is given for a file
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Read chunk size in bytes
    #[arg(long, default_value_t = microlector::io::lines::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Treat definition warnings as errors
    #[arg(long)]
    strict: bool,

    /// Load into memory only; nothing is written
    #[arg(long)]
    dry_run: bool,

    /// Write a JSON load report to this path
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let definition = Catalog::new(&args.formats).load(&args.file_type)?;
    let resolver = ResolverChain::new()
        .with(args.data.iter().cloned().collect::<MapResolver>())
        .with(GlobResolver::new(&args.data_dir));
    let config = IngestConfig::default()
        .with_chunk_size(args.chunk_size)
        .strict(args.strict);

    let store: Box<dyn DocumentStore> = if args.dry_run {
        Box::new(MemoryStore::new())
    } else {
        let db = args.db_name.as_deref().unwrap_or(&args.file_type);
        Box::new(JsonlStore::open(args.store.join(db))?)
    };

    let outcome = Scheduler::new(store.as_ref(), &resolver)
        .with_config(config)
        .run(definition);
    // Records written before a failure are kept.
    let flushed = store.flush();
    let report = outcome?;
    flushed?;

    if let Some(path) = &args.report {
        report
            .save_to_file(path)
            .with_context(|| format!("write report {}", path.display()))?;
    }
    tracing::info!(
        files = report.files.len(),
        records = report.total_records(),
        deferrals = report.deferrals.len(),
        "done"
    );
    Ok(())
}
