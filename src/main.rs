use anyhow::Result;
use clap::Parser;
use snaprev::scan::ScanOptions;
use snaprev::store::RevisionRange;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// snaprev - snap revision scanner
///
/// Downloads every published revision of a snap from the store and records
/// the version and architecture found in each revision's meta/snap.yaml.
///
/// Examples:
///   snaprev                          # Scan pc-kernel into results.csv
///   snaprev --snap pi-kernel -w 16   # Scan another kernel with 16 workers
#[derive(Parser, Debug)]
#[command(author, version = env!("SNAPREV_VERSION"), about)]
struct Cli {
    /// Snap to scan
    #[arg(long, env = "SNAPREV_SNAP", default_value = "pc-kernel")]
    snap: String,

    /// Revisions processed concurrently (defaults to the number of CPUs)
    #[arg(long, short = 'w', env = "SNAPREV_WORKERS", default_value_t = default_workers())]
    workers: NonZeroUsize,

    /// CSV file to write
    #[arg(long, short = 'o', value_name = "PATH", default_value = "results.csv")]
    output: PathBuf,

    /// Log per-revision progress
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Store API URL (defaults to https://api.snapcraft.io)
    #[arg(long = "api-url", env = "SNAPREV_API_URL", value_name = "URL")]
    api_url: Option<String>,

    /// Lowest revision to scan
    #[arg(long, value_name = "REV", default_value_t = 1)]
    min_revision: u32,

    /// Highest revision to scan (defaults to the newest published revision)
    #[arg(long, value_name = "REV")]
    max_revision: Option<u32>,

    /// Directory for downloaded archives (defaults to the system temp dir)
    #[arg(long, env = "SNAPREV_WORK_DIR", value_name = "PATH")]
    work_dir: Option<PathBuf>,
}

fn default_workers() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let options = ScanOptions {
        workers: cli.workers,
        range: RevisionRange {
            min: cli.min_revision,
            max: cli.max_revision,
        },
        work_dir: cli.work_dir,
    };

    snaprev::run(&cli.snap, &cli.output, cli.api_url, options).await
}
