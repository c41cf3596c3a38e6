//! Size cache worker: walks large trees and publishes their recursive sizes
//! for `l` to pick up.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use ltree::sizes::{ScanOptions, ScanStats, SizeCacheBuilder, default_cache_path, scan};
use ltree::tree::format_size;

#[derive(Parser, Debug)]
#[command(name = "l-sizes")]
#[command(about = "Precompute recursive directory sizes for l")]
#[command(version)]
struct Args {
    /// Directories to scan (default: $HOME)
    roots: Vec<PathBuf>,

    /// Only cache directories holding at least N files
    #[arg(long = "min-files", value_name = "N", default_value_t = ScanOptions::default().min_files)]
    min_files: u64,

    /// Cache file to publish (default: ~/.cache/l/sizes.db)
    #[arg(long, value_name = "PATH")]
    cache: Option<PathBuf>,

    /// Scan but discard the result
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Log diagnostics to stderr
    #[arg(long)]
    debug: bool,
}

fn init_logging(debug: bool) {
    let env = env_logger::Env::default().default_filter_or("warn");
    let mut builder = env_logger::Builder::from_env(env);
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("l-sizes: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> ltree::Result<()> {
    let roots = if args.roots.is_empty() {
        vec![dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"))]
    } else {
        args.roots.clone()
    };
    let live = args.cache.clone().unwrap_or_else(default_cache_path);
    let opts = ScanOptions {
        min_files: args.min_files,
    };

    let mut builder = SizeCacheBuilder::init(&live)?;
    let mut total = ScanStats::default();
    for root in &roots {
        // Cache keys are canonical paths, the same ones listings look up.
        let root = match root.canonicalize() {
            Ok(root) => root,
            Err(e) => {
                log::warn!("cannot scan {}: {}", root.display(), e);
                total.errors += 1;
                continue;
            }
        };
        let stats = match scan(&root, opts, &mut builder) {
            Ok(stats) => stats,
            Err(e) => {
                builder.close();
                return Err(e);
            }
        };
        log::debug!(
            "{}: {} dirs, {} files, {}",
            root.display(),
            stats.dirs,
            stats.files,
            format_size(stats.size)
        );
        total.dirs += stats.dirs;
        total.stored += stats.stored;
        total.errors += stats.errors;
        total.size += stats.size;
        total.files += stats.files;
    }

    eprintln!(
        "l-sizes: {} of {} directories cached ({} files, {}, {} unreadable)",
        total.stored,
        total.dirs,
        total.files,
        format_size(total.size),
        total.errors
    );

    if args.dry_run {
        builder.close();
        return Ok(());
    }
    builder.save()
}
