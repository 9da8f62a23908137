use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use moddeps_core::{
    calc_load_sequence_with, CliOverrides, DeclarationPolicy, LoadManifest, LoadSequence,
    ResolverConfig, ResourceFinder,
};

/// Default configuration file looked up in the current directory
const DEFAULT_CONFIG_FILE: &str = "moddeps.yaml";

/// moddeps - compute the load order of declared modules
#[derive(Parser, Debug, Clone)]
#[command(name = "moddeps")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Entry module files
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Path to a configuration file (YAML, or JSON with a .json extension)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Additional directory to search for modules (repeatable)
    #[arg(short = 'I', long = "search-path", value_name = "DIR")]
    search_paths: Vec<PathBuf>,

    /// File extension of module sources
    #[arg(long, value_name = "EXT")]
    extension: Option<String>,

    /// Accept dependency files without a defineModule declaration
    #[arg(long)]
    allow_undeclared: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Names)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One module name per line
    Names,
    /// One source path per line
    Paths,
    /// JSON load manifest
    Json,
}

fn main() -> anyhow::Result<()> {
    // Set RUST_LOG=debug for detailed logs
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = load_config(&cli)?;
    debug!("Search paths: {:?}", config.search_paths);
    debug!("Extension: {}", config.extension);

    info!("Resolving {} entry file(s)", cli.files.len());

    let finder = ResourceFinder::new(&config);
    let sequence = calc_load_sequence_with(
        cli.files.as_slice(),
        &finder,
        config.dependency_declarations,
    )
    .map_err(|e| anyhow::anyhow!("{}", e))?;

    print!("{}", render(&sequence, cli.format)?);
    Ok(())
}

/// Load configuration from file (if any) and merge command-line overrides
fn load_config(cli: &Cli) -> anyhow::Result<ResolverConfig> {
    let mut config = if let Some(ref path) = cli.config {
        ResolverConfig::from_file(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config file: {}", e))?
    } else {
        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            ResolverConfig::from_file(&default_path)
                .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", DEFAULT_CONFIG_FILE, e))?
        } else {
            ResolverConfig::default()
        }
    };

    let mut overrides = CliOverrides::default();
    if !cli.search_paths.is_empty() {
        overrides.search_paths = Some(cli.search_paths.clone());
    }
    overrides.extension = cli.extension.clone();
    if cli.allow_undeclared {
        overrides.dependency_declarations = Some(DeclarationPolicy::Optional);
    }

    config.merge(&overrides);
    Ok(config)
}

fn render(sequence: &LoadSequence, format: OutputFormat) -> anyhow::Result<String> {
    let mut output = String::new();
    match format {
        OutputFormat::Names => {
            for name in sequence.names() {
                output.push_str(&name);
                output.push('\n');
            }
        }
        OutputFormat::Paths => {
            for module in sequence.modules() {
                let path = module
                    .filename()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| module.display_name());
                output.push_str(&path);
                output.push('\n');
            }
        }
        OutputFormat::Json => {
            output = LoadManifest::from_sequence(sequence).to_json()?;
            output.push('\n');
        }
    }
    Ok(output)
}
