//! mcpforge CLI entrypoint
//! Parses command-line arguments and dispatches to the generator.
#![deny(unsafe_code)]

// Internal imports (std, crate)
use mcpforge::core::GeneratorConfig;
use mcpforge::generation::Generator;
use mcpforge::spec::RawSpec;
use std::path::{Path, PathBuf};

// External imports (alphabetized)
use anyhow::Context;
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mcpforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Generate an MCP server project from a spec
    Generate {
        /// Path to the spec document (YAML or JSON)
        spec: PathBuf,
        /// Template root containing one directory per language
        #[arg(long)]
        template_dir: Option<PathBuf>,
        /// Output directory for generated code
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Generator configuration file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Skip per-tool test stubs
        #[arg(long)]
        no_tests: bool,
        /// Skip the README
        #[arg(long)]
        no_docs: bool,
        /// List the files that would be generated without writing them
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the pattern selection manifest for a spec as JSON
    Plan {
        /// Path to the spec document (YAML or JSON)
        spec: PathBuf,
        /// Generator configuration file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging with default level INFO
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Generate {
            spec,
            template_dir,
            output_dir,
            config,
            no_tests,
            no_docs,
            dry_run,
        } => {
            let mut config = load_config(config.as_deref()).await?;
            if let Some(dir) = template_dir {
                config.template_dir = dir.clone();
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir.clone();
            }
            config.generate_tests &= !no_tests;
            config.generate_docs &= !no_docs;
            generate(spec, config, *dry_run).await?
        }
        Commands::Plan { spec, config } => {
            let config = load_config(config.as_deref()).await?;
            plan(spec, config).await?
        }
    }
    Ok(())
}

async fn load_config(path: Option<&Path>) -> anyhow::Result<GeneratorConfig> {
    match path {
        Some(path) => GeneratorConfig::load(path)
            .await
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(GeneratorConfig::default()),
    }
}

async fn read_spec(path: &Path) -> anyhow::Result<RawSpec> {
    RawSpec::from_file(path)
        .await
        .with_context(|| format!("Failed to read spec {}", path.display()))
}

/// Generate a project and write it unless this is a dry run
async fn generate(spec_path: &Path, config: GeneratorConfig, dry_run: bool) -> anyhow::Result<()> {
    info!(
        spec = %spec_path.display(),
        template_dir = %config.template_dir.display(),
        "Generating MCP server"
    );

    let generator = Generator::new(config);
    let raw = read_spec(spec_path).await?;
    let files = generator
        .generate(&raw)
        .await
        .context("Failed to generate project")?;

    if dry_run {
        for path in files.paths() {
            println!("{}", path.display());
        }
        return Ok(());
    }

    let root = generator
        .write_files(&files, None)
        .await
        .context("Failed to write generated files")?;
    info!(output_path = %root.display(), files = files.len(), "Successfully generated MCP server");
    Ok(())
}

async fn plan(spec_path: &Path, config: GeneratorConfig) -> anyhow::Result<()> {
    let generator = Generator::new(config);
    let raw = read_spec(spec_path).await?;
    let plan = generator.plan(&raw).context("Failed to plan generation")?;
    println!("{}", plan.manifest.to_json_pretty()?);
    Ok(())
}
