//! equichunk CLI - split a test manifest into equal-time CI chunks.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

use equichunk::chunk::{EqualTimeChunker, Selection};
use equichunk::config::{self, Config, OutputFormat};
use equichunk::manifest::Manifest;
use equichunk::report;

#[derive(Parser)]
#[command(name = "equichunk")]
#[command(about = "Split a test manifest into equal-time CI chunks", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the tests this worker should run
    Select {
        /// Manifest file (.json or .toml)
        #[arg(short, long)]
        manifest: PathBuf,

        /// Number of chunks the manifest is split into
        #[arg(long)]
        total_chunks: Option<usize>,

        /// Chunk to print, counting from 1
        #[arg(long)]
        this_chunk: usize,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Show how the manifest is split across every chunk
    Plan {
        /// Manifest file (.json or .toml)
        #[arg(short, long)]
        manifest: PathBuf,

        /// Number of chunks the manifest is split into
        #[arg(long)]
        total_chunks: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Validate configuration file
    Validate,

    /// Initialize a new configuration file
    Init {
        /// Path of the file to create
        #[arg(short, long, default_value = "equichunk.toml")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays consumable by the executor.
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Select {
            manifest,
            total_chunks,
            this_chunk,
            format,
        } => select_chunk(
            cli.config.as_deref(),
            &manifest,
            total_chunks,
            this_chunk,
            format,
        ),
        Commands::Plan {
            manifest,
            total_chunks,
            format,
        } => plan_chunks(cli.config.as_deref(), &manifest, total_chunks, format),
        Commands::Validate => validate_config(cli.config.as_deref()),
        Commands::Init { output } => init_config(&output),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let config = config::load_config(path)?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        None => Ok(Config::default()),
    }
}

fn load_manifest(path: &Path) -> Result<Manifest> {
    let manifest = Manifest::load(path)
        .with_context(|| format!("Failed to load manifest from {}", path.display()))?;
    info!(
        "Loaded {} tests in {} groups from {}",
        manifest.test_count(),
        manifest.len(),
        path.display()
    );
    Ok(manifest)
}

fn resolve_total_chunks(config: &Config, total_chunks: Option<usize>) -> Result<usize> {
    total_chunks.or(config.chunking.total_chunks).ok_or_else(|| {
        anyhow!("--total-chunks is required unless chunking.total_chunks is set in the config")
    })
}

fn select_chunk(
    config_path: Option<&Path>,
    manifest_path: &Path,
    total_chunks: Option<usize>,
    this_chunk: usize,
    format: Option<OutputFormat>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let total_chunks = resolve_total_chunks(&config, total_chunks)?;
    let selection = Selection::new(total_chunks, this_chunk)?;
    let format = format.unwrap_or(config.output.format);

    let manifest = load_manifest(manifest_path)?;
    let chunker = EqualTimeChunker::new(config.weight_model()?);
    let chunk = selection.apply(&chunker, &manifest)?;

    print!("{}", report::render_selection(&chunk, total_chunks, format)?);
    Ok(())
}

fn plan_chunks(
    config_path: Option<&Path>,
    manifest_path: &Path,
    total_chunks: Option<usize>,
    format: Option<OutputFormat>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let total_chunks = resolve_total_chunks(&config, total_chunks)?;
    let format = format.unwrap_or(config.output.format);

    let manifest = load_manifest(manifest_path)?;
    let chunker = EqualTimeChunker::new(config.weight_model()?);
    let chunks = chunker.partition(&manifest, total_chunks)?;
    debug!("Computed {} chunks", chunks.len());

    print!("{}", report::render_plan(&chunks, format)?);
    Ok(())
}

fn validate_config(config_path: Option<&Path>) -> Result<()> {
    let path = config_path.unwrap_or(Path::new("equichunk.toml"));
    let config = config::load_config(path)?;

    println!("Configuration is valid!");
    println!();
    println!("Settings:");
    println!("  Default weight: {}", config.chunking.default_weight);
    match config.chunking.total_chunks {
        Some(total) => println!("  Total chunks: {}", total),
        None => println!("  Total chunks: (from --total-chunks)"),
    }
    let format = match config.output.format {
        OutputFormat::Text => "text",
        OutputFormat::Json => "json",
    };
    println!("  Output format: {}", format);

    Ok(())
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(anyhow!(
            "{} already exists. Remove it first or edit manually.",
            path.display()
        ));
    }

    let config = r#"# equichunk configuration file

[chunking]
# Weight of a test that declares no positive timeout.
default_weight = 1.0
# Uncomment to avoid passing --total-chunks on every invocation.
# total_chunks = 4

[output]
# "text" prints one test id per line; "json" prints the selected groups.
format = "text"
"#;

    std::fs::write(path, config)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Created {}", path.display());
    println!();
    println!("Edit the configuration as needed, then run:");
    println!("  equichunk select --manifest <file> --total-chunks <N> --this-chunk <M>");

    Ok(())
}
