//! CLI entry point for l

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use regex::Regex;
use termcolor::{ColorChoice, StandardStream};

use ltree::output::Format;
use ltree::select::{self, Outcome, Selector};
use ltree::sizes::{SizeCache, default_cache_path};
use ltree::{
    BuildOpts, ComputeOpts, Config, Git2Cache, GitCache, Icons, NoGit, OutputConfig,
    PrunePatterns, SortMode, Summary, TreeBuilder, TreeNode, TreePrinter, Visibility, print_json,
    print_summary,
};

/// Exit code after Ctrl-C in the selector.
const EXIT_INTERRUPTED: u8 = 130;

/// Color output mode
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ColorMode {
    /// Auto-detect based on terminal and environment
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Decide whether to color output for a stream with the given tty state.
fn should_use_color(mode: ColorMode, is_terminal: bool) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            // Respect NO_COLOR environment variable (https://no-color.org/)
            if std::env::var_os("NO_COLOR").is_some() {
                return false;
            }
            if std::env::var_os("FORCE_COLOR").is_some() {
                return true;
            }
            if std::env::var("TERM").is_ok_and(|t| t == "dumb") {
                return false;
            }
            is_terminal
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortKey {
    /// Largest first
    Size,
    /// Most recently modified first
    Time,
    /// Alphabetical, directories mixed in
    Name,
}

impl From<SortKey> for SortMode {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::Size => SortMode::Size,
            SortKey::Time => SortMode::Time,
            SortKey::Name => SortMode::Name,
        }
    }
}

fn parse_regex(s: &str) -> Result<Regex, regex::Error> {
    Regex::new(s)
}

#[derive(Parser, Debug)]
#[command(name = "l")]
#[command(about = "Directory listing with git status, sizes and content info")]
#[command(version)]
struct Args {
    /// Paths to list
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Long format: size, file count, content info, mtime, git and diff columns
    #[arg(short, long, conflicts_with = "summary")]
    long: bool,

    /// Long format without diffs, followed by totals, type table and repo info
    #[arg(short, long)]
    summary: bool,

    /// Browse the tree interactively; prints the selected path
    #[arg(short, long, conflicts_with = "json")]
    interactive: bool,

    /// Show hidden files
    #[arg(short, long)]
    all: bool,

    /// Show files ignored by .gitignore
    #[arg(long = "no-ignore")]
    no_ignore: bool,

    /// Expand all directories
    #[arg(short, long = "expand-all")]
    expand_all: bool,

    /// Descend only N levels deep
    #[arg(short = 'L', long = "level", value_name = "N")]
    level: Option<usize>,

    /// Sort entries
    #[arg(long, value_name = "KEY")]
    sort: Option<SortKey>,

    /// Reverse the sort order
    #[arg(short, long)]
    reverse: bool,

    /// Show only entries with git changes
    #[arg(short, long = "git-only")]
    git_only: bool,

    /// Show only entries whose name matches PATTERN (and their parents)
    #[arg(long, value_name = "PATTERN", value_parser = parse_regex)]
    grep: Option<Regex>,

    /// Do not show icons
    #[arg(long = "no-icons")]
    no_icons: bool,

    /// Show the path from the current directory (or /) down to each target
    #[arg(short = 'A', long)]
    ancestry: bool,

    /// List directories matching GLOB without descending (can be repeated)
    #[arg(short = 'I', long = "prune", value_name = "GLOB")]
    prune: Vec<String>,

    /// Do not query git
    #[arg(long = "no-git")]
    no_git: bool,

    /// Output in JSON format
    #[arg(long)]
    json: bool,

    /// Control color output: auto, always, never
    #[arg(long = "color", value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    /// Log diagnostics to stderr
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn format(&self) -> Format {
        if self.summary {
            Format::Summary
        } else if self.long {
            Format::Long
        } else {
            Format::Short
        }
    }

    fn compute(&self) -> ComputeOpts {
        let mut compute = match self.format() {
            Format::Short => ComputeOpts::basic(),
            Format::Long => ComputeOpts::long(),
            Format::Summary => ComputeOpts::summary(),
        };
        if self.no_git {
            compute.git_status = false;
            compute.git_diff = false;
            compute.git_repo_info = false;
        }
        compute
    }

    /// `-L` wins; otherwise one level, or everything for `-e` and `-s`.
    fn max_depth(&self) -> Option<usize> {
        match self.level {
            Some(level) => Some(level),
            None if self.expand_all || self.summary => None,
            None => Some(1),
        }
    }

    fn visibility(&self) -> Visibility {
        Visibility {
            show_hidden: self.all,
            show_ignored: self.no_ignore,
            git_only: self.git_only,
            grep: self.grep.clone(),
        }
    }
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
    std::panic::set_hook(Box::new(|info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(
            io::stderr(),
            crossterm::cursor::Show,
            crossterm::terminal::EnableLineWrap
        );
        eprintln!("l: {}", info);
    }));

    let args = Args::parse();
    init_logging(args.debug);

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("l: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> ltree::Result<ExitCode> {
    let prune = PrunePatterns::new(&args.prune)
        .unwrap_or_else(|e| Args::command().error(ErrorKind::InvalidValue, e).exit());

    let config = Config::load();
    let icons = if args.no_icons {
        Icons::disabled()
    } else {
        config.icons.clone()
    };

    let compute = args.compute();
    let opts = BuildOpts {
        max_depth: args.max_depth(),
        show_hidden: args.all,
        skip_gitignored: !args.no_ignore,
        sort_by: args.sort.map(SortMode::from).unwrap_or_default(),
        sort_reverse: args.reverse,
        compute,
        ..BuildOpts::default()
    };

    let git: Box<dyn GitCache> = if compute.git_status {
        Box::new(Git2Cache::new(compute.git_diff))
    } else {
        Box::new(NoGit)
    };
    let sizes = if compute.sizes {
        SizeCache::open(&default_cache_path())
    } else {
        None
    };

    let mut builder = TreeBuilder::new(opts, git.as_ref());
    if let Some(sizes) = &sizes {
        builder = builder.with_size_cache(sizes);
    }
    if !prune.is_empty() {
        builder = builder.with_skip(&prune);
    }

    let (roots, failed) = build_roots(&builder, &args.paths, args.ancestry);
    if roots.is_empty() {
        return Ok(ExitCode::FAILURE);
    }

    if args.json {
        print_json(&roots).map_err(|e| ltree::Error::io("<stdout>", e))?;
    } else if args.interactive {
        let color = should_use_color(args.color, io::stderr().is_terminal());
        let mut selector = Selector::new(
            roots,
            &builder,
            &icons,
            args.visibility(),
            args.format().columns(),
        );
        match select::run(&mut selector, color)? {
            Outcome::Select(path) => println!("{}", path.display()),
            Outcome::Interrupted => return Ok(ExitCode::from(EXIT_INTERRUPTED)),
            _ => {}
        }
    } else {
        let output = OutputConfig {
            format: args.format(),
            visibility: args.visibility(),
            use_color: should_use_color(args.color, io::stdout().is_terminal()),
        };
        print_listing(&output, &icons, &config, compute.type_stats, &roots)
            .map_err(|e| ltree::Error::io("<stdout>", e))?;
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Build one tree per path. Paths that fail are reported and skipped.
fn build_roots(builder: &TreeBuilder<'_>, paths: &[PathBuf], ancestry: bool) -> (Vec<TreeNode>, bool) {
    let mut roots = Vec::with_capacity(paths.len());
    let mut failed = false;
    for path in paths {
        match build_root(builder, path, ancestry) {
            Ok(tree) => roots.push(tree),
            Err(e) => {
                eprintln!("l: {}", e);
                failed = true;
            }
        }
    }
    (roots, failed)
}

fn build_root(builder: &TreeBuilder<'_>, path: &Path, ancestry: bool) -> ltree::Result<TreeNode> {
    if ancestry {
        builder.build_ancestry_tree(path)
    } else {
        builder.build_tree(path)
    }
}

fn print_listing(
    output: &OutputConfig,
    icons: &Icons,
    config: &Config,
    type_stats: bool,
    roots: &[TreeNode],
) -> io::Result<()> {
    TreePrinter::new(output, icons).print(roots)?;
    if output.format != Format::Summary {
        return Ok(());
    }

    let choice = if output.use_color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);
    for root in roots {
        let summary = Summary::collect(root, type_stats.then_some(&config.filetypes));
        writeln!(stdout)?;
        print_summary(&mut stdout, &summary)?;
    }
    Ok(())
}
