use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docsearch::index::writer::{base85_decode_search_data, is_base85_wrapper};
use docsearch::index::{BuildConfig, SearchDataBuilder, SearchDataWriter, Symbol};
use docsearch::output::{pretty_print, PrettyPrintOptions};
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docsearch")]
#[command(about = "Build and inspect compact search data for documentation sites")]
struct Cli {
    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build search data from a JSON array of symbols
    Build {
        /// Symbol list produced by the documentation crawler
        symbols: PathBuf,

        /// Directory to write the search data into
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// JSON build configuration
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the base85 JavaScript loader instead of the binary
        #[arg(long)]
        base85: bool,

        /// Don't deduplicate identical trie subtrees
        #[arg(long)]
        no_merge_subtrees: bool,

        /// Don't store results relative to a shared prefix entry
        #[arg(long)]
        no_merge_prefixes: bool,

        /// Don't mark joiner edges as lookahead barriers
        #[arg(long)]
        no_lookahead_barriers: bool,
    },
    /// Pretty-print serialized search data
    Dump {
        /// Binary search data or its base85 loader
        file: PathBuf,

        /// Mark subtrees shared with an earlier one as `#`
        #[arg(long)]
        show_merged: bool,

        /// Mark lookahead barrier edges with `$`
        #[arg(long)]
        show_lookahead_barriers: bool,

        /// Print trie statistics to stderr
        #[arg(long)]
        show_stats: bool,

        /// Colorize the output
        #[arg(long)]
        colors: bool,
    },
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("DOCSEARCH_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Build {
            symbols,
            output,
            config,
            base85,
            no_merge_subtrees,
            no_merge_prefixes,
            no_lookahead_barriers,
        } => {
            let mut config = match config {
                Some(path) => BuildConfig::load(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => BuildConfig::default(),
            };
            config.base85 |= base85;
            config.merge_subtrees &= !no_merge_subtrees;
            config.merge_prefixes &= !no_merge_prefixes;
            config.add_lookahead_barriers &= !no_lookahead_barriers;

            build(&symbols, &output, config)?;
        }
        Commands::Dump {
            file,
            show_merged,
            show_lookahead_barriers,
            show_stats,
            colors,
        } => {
            let options = PrettyPrintOptions {
                show_merged,
                show_lookahead_barriers,
                colors,
            };
            dump(&file, &options, show_stats)?;
        }
    }

    Ok(())
}

fn build(symbols_path: &Path, output_dir: &Path, config: BuildConfig) -> Result<()> {
    let file = File::open(symbols_path)
        .with_context(|| format!("Failed to open {}", symbols_path.display()))?;
    let symbols: Vec<Symbol> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse symbols from {}", symbols_path.display()))?;
    tracing::info!(symbols = symbols.len(), "building search data");

    let base85 = config.base85;
    let mut builder = SearchDataBuilder::new(config);
    builder.add_symbols(&symbols)?;
    let data = builder.finish().context("Failed to serialize search data")?;

    let path = SearchDataWriter::write(output_dir, &data, base85)
        .with_context(|| format!("Failed to write search data to {}", output_dir.display()))?;
    println!("Wrote {} ({} bytes)", path.display(), data.len());
    Ok(())
}

fn dump(path: &Path, options: &PrettyPrintOptions, show_stats: bool) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to map {}", path.display()))?;

    let (pretty, stats) = if is_base85_wrapper(&mmap) {
        let text = std::str::from_utf8(&mmap)
            .with_context(|| format!("{} is not valid UTF-8", path.display()))?;
        let data = base85_decode_search_data(text)?;
        pretty_print(&data, options)?
    } else {
        pretty_print(&mmap, options)?
    };
    tracing::debug!(path = %path.display(), nodes = stats.node_count, "dumped search data");

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{pretty}")?;
    if show_stats {
        eprintln!("{stats}");
    }
    Ok(())
}
