use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::builders::ignores::DEFAULT_IGNORE_FILE;
use crate::builders::manifest::{DEFAULT_MANIFEST, ManifestGenerator};
use crate::builders::reporter::OutputFormat;
use crate::builders::validator::{ConfigValidator, StandardValidator};
use crate::core::engine::GeneratorCollection;

/// File name of the discovery configuration.
pub const CONFIG_FILE: &str = "discover.toml";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GlobalSettings {
    /// Name of the per-directory ignore file.
    pub ignore_file: String,
    pub output_format: OutputFormat,
}

/// One entry of the ordered generator list.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeneratorSettings {
    pub name: String,
    #[serde(default = "default_manifest")]
    pub manifest: String,
}

fn default_manifest() -> String {
    DEFAULT_MANIFEST.to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DiscoveryConfig {
    pub version: String,
    /// Directory to scan. Relative paths resolve against the directory that
    /// holds the configuration file.
    pub root: PathBuf,
    #[serde(default)]
    pub targets: Vec<String>,
    /// Generators in the order they are offered each directory.
    #[serde(default)]
    pub generators: Vec<GeneratorSettings>,
    pub global_settings: GlobalSettings,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            root: PathBuf::from("."),
            targets: Vec::new(),
            generators: vec![GeneratorSettings {
                name: "manifest".to_string(),
                manifest: DEFAULT_MANIFEST.to_string(),
            }],
            global_settings: GlobalSettings {
                ignore_file: DEFAULT_IGNORE_FILE.to_string(),
                output_format: OutputFormat::Text,
            },
        }
    }
}

pub struct ConfigManager {
    config_path: PathBuf,
    base_dir: PathBuf,
}

impl ConfigManager {
    /// Uses the nearest `discover.toml` at or above the current directory, or
    /// the current directory when none exists yet.
    pub fn new() -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to read current directory")?;
        let base_dir = find_config_dir(&current_dir).unwrap_or(current_dir);
        Ok(Self::new_at(base_dir))
    }

    /// Uses `discover.toml` inside `base_dir`.
    pub fn new_at(base_dir: PathBuf) -> Self {
        Self {
            config_path: base_dir.join(CONFIG_FILE),
            base_dir,
        }
    }

    /// Uses an explicit configuration file.
    pub fn from_file(config_path: PathBuf) -> Self {
        let base_dir = config_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            config_path,
            base_dir,
        }
    }

    /// Writes a default configuration unless one already exists. Returns
    /// whether a file was written.
    pub fn initialize(&self) -> Result<bool> {
        if self.config_path.exists() {
            return Ok(false);
        }

        let default_config = DiscoveryConfig::default();
        self.save_config(&default_config)?;
        Ok(true)
    }

    /// Checks the configuration and returns every issue found.
    pub fn validate_config(&self) -> Result<Vec<String>> {
        let config = self.resolved_config()?;
        let validator = StandardValidator::new();
        validator.validate_config(&config)
    }

    /// Loads the configuration with `root` resolved against the base directory.
    pub fn resolved_config(&self) -> Result<DiscoveryConfig> {
        let mut config = self.load_config()?;
        config.root = self.resolve(&config.root);
        Ok(config)
    }

    /// Builds a collection with one manifest generator per configured entry,
    /// in configuration order.
    pub fn build_collection(&self, config: &DiscoveryConfig) -> GeneratorCollection {
        config.generators.iter().fold(
            GeneratorCollection::new(self.resolve(&config.root))
                .with_targets(config.targets.clone())
                .with_ignore_file(config.global_settings.ignore_file.clone()),
            |collection, settings| {
                collection.with_generator(Box::new(ManifestGenerator::new(
                    settings.name.clone(),
                    settings.manifest.clone(),
                )))
            },
        )
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if path == Path::new(".") {
            self.base_dir.clone()
        } else {
            self.base_dir.join(path)
        }
    }
}

pub trait ConfigProvider {
    fn load_config(&self) -> Result<DiscoveryConfig>;
    fn save_config(&self, config: &DiscoveryConfig) -> Result<()>;
    fn get_config_path(&self) -> Result<PathBuf>;
}

impl ConfigProvider for ConfigManager {
    fn load_config(&self) -> Result<DiscoveryConfig> {
        if !self.config_path.exists() {
            return Ok(DiscoveryConfig::default());
        }

        let content =
            fs::read_to_string(&self.config_path).context("Failed to read config file")?;

        toml::from_str(&content).context("Failed to parse config file")
    }

    fn save_config(&self, config: &DiscoveryConfig) -> Result<()> {
        let content = toml::to_string_pretty(config).context("Failed to serialize config")?;

        fs::write(&self.config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn get_config_path(&self) -> Result<PathBuf> {
        Ok(self.config_path.clone())
    }
}

fn find_config_dir(start: &Path) -> Option<PathBuf> {
    let mut dir = start;

    loop {
        if dir.join(CONFIG_FILE).exists() {
            return Some(dir.to_path_buf());
        }

        dir = dir.parent()?;
    }
}
