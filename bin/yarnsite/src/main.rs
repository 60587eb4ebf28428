//! yarnsite CLI
//!
//! Static site generator with incremental rebuilds and convention-based
//! plugin packages.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for yarnsite.
#[derive(Parser)]
#[command(
    name = "yarnsite",
    version,
    about = "A static site generator with incremental rebuilds"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: std::path::PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Build the whole site once
    Build,
    /// Rebuild incrementally as source and theme files change
    Watch,
    /// List plugin packages declared in the project manifest
    Plugins,
    /// Mirror the project and its plugin packages into a directory
    Bundle {
        /// Output directory
        #[arg(short, long, default_value = "bundle")]
        output: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // Rebuild progress is logged at INFO.
    let verbose = match cli.command {
        Commands::Watch => cli.verbose.max(1),
        _ => cli.verbose,
    };
    yarnsite::init_tracing(verbose);

    match cli.command {
        Commands::Build => {
            yarnsite::cmd::build::run(&cli.config).await?;
        }
        Commands::Watch => {
            yarnsite::cmd::watch::run(&cli.config).await?;
        }
        Commands::Plugins => {
            yarnsite::cmd::plugins::run(&cli.config)?;
        }
        Commands::Bundle { output } => {
            yarnsite::cmd::bundle::run(&cli.config, &output)?;
        }
    }

    Ok(())
}
