/// Walks a project tree and reports the services, groups and imports that
/// the configured generators find in it. Directories can opt out of the scan
/// with a `.discoverignore` file using gitignore syntax.
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use svc_discover::builders::reporter::OutputFormat;
use svc_discover::utils::{self, ScanOptions};

#[derive(Parser)]
#[command(name = "svc-discover")]
#[command(about = "Discover service and group definitions in a directory tree")]
struct Cli {
    /// Log level: trace, debug, info, warn, error or off
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default discover.toml
    Init {
        /// Directory to write the configuration into (defaults to the current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Scan a directory tree and print what was discovered
    Scan {
        /// Directory to scan (overrides `root` from the configuration)
        path: Option<PathBuf>,
        /// Configuration file to use instead of the nearest discover.toml
        #[arg(long)]
        config: Option<PathBuf>,
        /// Only report services and groups with this name (repeatable)
        #[arg(long = "target")]
        targets: Vec<String>,
        /// Output format: text, json, yaml or toml
        #[arg(long)]
        format: Option<OutputFormat>,
        /// Name of the per-directory ignore file
        #[arg(long)]
        ignore_file: Option<String>,
    },
    /// Check the configuration for problems
    Validate {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    utils::setup_logging(&cli.log_level);

    match cli.command {
        Commands::Init { path } => utils::initialize_config(path),
        Commands::Scan {
            path,
            config,
            targets,
            format,
            ignore_file,
        } => utils::run_scan(ScanOptions {
            config,
            path,
            targets,
            format,
            ignore_file,
        }),
        Commands::Validate { config } => utils::validate_config(config),
    }
}
