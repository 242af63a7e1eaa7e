use anyhow::Result;
use std::collections::HashSet;

use crate::core::config::{DiscoveryConfig, GeneratorSettings};

/// The `ConfigValidator` trait defines the public interface for validating the
/// discovery configuration.
///
/// Validators report issues rather than failing on the first one, so a user
/// can fix a configuration in a single pass.
pub trait ConfigValidator {
    /// Performs a full validation of the `DiscoveryConfig` and returns
    /// a list of issues found.
    ///
    /// # Arguments
    /// * `config`: The configuration to be validated. Its `root` is expected
    ///   to be resolved already.
    ///
    /// # Returns
    /// A `Result<Vec<String>>` where each string describes one issue.
    fn validate_config(&self, config: &DiscoveryConfig) -> Result<Vec<String>>;

    /// Validates a single generator entry and returns a list of issues.
    fn validate_generator(&self, generator: &GeneratorSettings) -> Result<Vec<String>>;
}

/// The `StandardValidator` is the validator used by the `validate` command.
pub struct StandardValidator;

impl StandardValidator {
    /// Creates a new instance of `StandardValidator`.
    pub fn new() -> Self {
        Self
    }

    /// Checks that a configured file name names a file, not a path.
    ///
    /// Ignore files and manifests are looked up inside every scanned
    /// directory, so a separator in the name can never match anything.
    fn is_plain_file_name(&self, name: &str) -> bool {
        !name.trim().is_empty() && !name.contains(['/', '\\'])
    }

    /// Flags duplicate and empty target names.
    fn check_targets(&self, targets: &[String]) -> Vec<String> {
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();

        for target in targets {
            if target.trim().is_empty() {
                warnings.push("Empty target name".to_string());
            } else if !seen.insert(target.as_str()) {
                warnings.push(format!("Duplicate target: {target}"));
            }
        }
        warnings
    }
}

impl Default for StandardValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigValidator for StandardValidator {
    fn validate_config(&self, config: &DiscoveryConfig) -> Result<Vec<String>> {
        let mut issues = Vec::new();

        if config.version != "1.0" {
            issues.push(format!("Unsupported config version: {}", config.version));
        }

        if !config.root.exists() {
            issues.push(format!("Scan root not found: {}", config.root.display()));
        } else if !config.root.is_dir() {
            issues.push(format!(
                "Scan root is not a directory: {}",
                config.root.display()
            ));
        }

        if !self.is_plain_file_name(&config.global_settings.ignore_file) {
            issues.push(format!(
                "Ignore file must be a plain file name: '{}'",
                config.global_settings.ignore_file
            ));
        }

        if config.generators.is_empty() {
            issues.push("No generators configured; nothing will be discovered".to_string());
        }

        let mut names = HashSet::new();
        for generator in &config.generators {
            if !names.insert(generator.name.as_str()) {
                issues.push(format!("Duplicate generator name: {}", generator.name));
            }
            issues.extend(self.validate_generator(generator)?);
        }

        issues.extend(self.check_targets(&config.targets));

        Ok(issues)
    }

    fn validate_generator(&self, generator: &GeneratorSettings) -> Result<Vec<String>> {
        let mut issues = Vec::new();

        if generator.name.trim().is_empty() {
            issues.push("Generator name cannot be empty".to_string());
        }
        if !self.is_plain_file_name(&generator.manifest) {
            issues.push(format!(
                "Generator '{}' manifest must be a plain file name: '{}'",
                generator.name, generator.manifest
            ));
        }

        Ok(issues)
    }
}
