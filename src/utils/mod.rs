use anyhow::{Context, Result};
use log::LevelFilter;
use std::path::PathBuf;

use crate::builders::reporter::{ConsoleReporter, DiscoveryReporter, OutputFormat};
use crate::core::config::{ConfigManager, ConfigProvider};

/// Overrides a `scan` invocation applies on top of the configuration file.
#[derive(Debug, Default)]
pub struct ScanOptions {
    pub config: Option<PathBuf>,
    pub path: Option<PathBuf>,
    pub targets: Vec<String>,
    pub format: Option<OutputFormat>,
    pub ignore_file: Option<String>,
}

pub fn setup_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Warn,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

pub fn initialize_config(path: Option<PathBuf>) -> Result<()> {
    let base_dir = match path {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    let config_manager = ConfigManager::new_at(base_dir);

    if config_manager.initialize()? {
        println!(
            "✓ Wrote {}",
            config_manager.get_config_path()?.display()
        );
        println!("Run 'svc-discover scan' to discover services");
    } else {
        println!(
            "✓ {} already exists",
            config_manager.get_config_path()?.display()
        );
    }
    Ok(())
}

pub fn run_scan(options: ScanOptions) -> Result<()> {
    let config_manager = get_config_manager(options.config)?;
    let mut config = config_manager.resolved_config()?;

    // A path given on the command line is relative to where we were invoked,
    // not to the configuration file.
    if let Some(path) = options.path {
        config.root = std::env::current_dir()
            .context("Failed to read current directory")?
            .join(path);
    }
    if !options.targets.is_empty() {
        config.targets = options.targets;
    }
    if let Some(ignore_file) = options.ignore_file {
        config.global_settings.ignore_file = ignore_file;
    }
    let format = options
        .format
        .unwrap_or(config.global_settings.output_format);

    let mut collection = config_manager.build_collection(&config);
    collection.generate()?;
    let report = collection.report();

    match format {
        OutputFormat::Text => ConsoleReporter::new().report(&report),
        other => {
            println!("{}", report.render(other)?);
            Ok(())
        }
    }
}

pub fn validate_config(config: Option<PathBuf>) -> Result<()> {
    let config_manager = get_config_manager(config)?;
    let issues = config_manager.validate_config()?;

    if issues.is_empty() {
        println!("✓ Configuration is valid.");
        Ok(())
    } else {
        println!("⚠️  Found issues in configuration:");
        for issue in issues {
            println!("  - {issue}");
        }
        anyhow::bail!("Configuration validation failed.");
    }
}

// Helper function to create ConfigManager instance
fn get_config_manager(config: Option<PathBuf>) -> Result<ConfigManager> {
    match config {
        Some(path) => Ok(ConfigManager::from_file(path)),
        None => ConfigManager::new(),
    }
}
