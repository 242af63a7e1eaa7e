use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::builders::records::{GroupConfig, ServiceConfig};
use crate::core::error::DiscoveryError;

/// The formats a discovery report can be rendered in.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable listing printed by the `ConsoleReporter`.
    #[default]
    Text,
    Json,
    Yaml,
    Toml,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
            OutputFormat::Toml => write!(f, "toml"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "toml" => Ok(OutputFormat::Toml),
            other => Err(DiscoveryError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Everything a discovery run produced, already filtered and sorted.
///
/// `imports` comes first so the TOML rendering emits plain values before the
/// arrays of tables.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct DiscoveryReport {
    pub imports: Vec<String>,
    pub services: Vec<ServiceConfig>,
    pub groups: Vec<GroupConfig>,
}

impl DiscoveryReport {
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.services.is_empty() && self.groups.is_empty()
    }

    /// Serializes the report in one of the machine-readable formats.
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(self).context("Failed to serialize to JSON")
            }
            OutputFormat::Yaml => serde_yaml::to_string(self).context("Failed to serialize to YAML"),
            OutputFormat::Toml => {
                toml::to_string_pretty(self).context("Failed to serialize to TOML")
            }
            OutputFormat::Text => Ok(ConsoleReporter::new().format_report(self)),
        }
    }
}

pub trait DiscoveryReporter {
    fn report(&self, report: &DiscoveryReport) -> Result<()>;
}

/// Prints a discovery report for humans. Used by the `scan` command.
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    fn format_service(&self, service: &ServiceConfig) -> String {
        let mut line = format!("  🔧 {}", service.name);
        if let Some(path) = &service.path {
            line.push_str(&format!(" ({})", path.display()));
        }
        if let Some(description) = &service.description {
            line.push_str(&format!(" - {description}"));
        }
        line
    }

    fn format_group(&self, group: &GroupConfig) -> String {
        format!("  📦 {} [{}]", group.name, group.children.join(", "))
    }

    /// Builds the whole text report.
    pub fn format_report(&self, report: &DiscoveryReport) -> String {
        let mut lines = vec![
            "🔎 Discovery Report".to_string(),
            "==================".to_string(),
        ];

        if report.is_empty() {
            lines.push("Nothing discovered.".to_string());
            return lines.join("\n");
        }

        if !report.services.is_empty() {
            lines.push(format!("\nServices ({}):", report.services.len()));
            lines.extend(report.services.iter().map(|s| self.format_service(s)));
        }

        if !report.groups.is_empty() {
            lines.push(format!("\nGroups ({}):", report.groups.len()));
            lines.extend(report.groups.iter().map(|g| self.format_group(g)));
        }

        if !report.imports.is_empty() {
            lines.push(format!("\nImports ({}):", report.imports.len()));
            lines.extend(report.imports.iter().map(|i| format!("  📄 {i}")));
        }

        lines.join("\n")
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoveryReporter for ConsoleReporter {
    fn report(&self, report: &DiscoveryReport) -> Result<()> {
        println!("{}", self.format_report(report));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_report() -> DiscoveryReport {
        let mut api = ServiceConfig::new("api");
        api.path = Some(PathBuf::from("backend/api"));
        api.description = Some("public HTTP API".to_string());

        DiscoveryReport {
            imports: vec!["shared/services.toml".to_string()],
            services: vec![api, ServiceConfig::new("worker")],
            groups: vec![GroupConfig::new(
                "backend",
                vec!["api".to_string(), "worker".to_string()],
            )],
        }
    }

    #[test]
    fn test_parse_output_format() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("YML".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert_eq!("toml".parse::<OutputFormat>().unwrap(), OutputFormat::Toml);
        assert!(matches!(
            "xml".parse::<OutputFormat>(),
            Err(DiscoveryError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_text_report_lists_everything() {
        let text = ConsoleReporter::new().format_report(&sample_report());

        assert!(text.contains("Services (2):"));
        assert!(text.contains("🔧 api (backend/api) - public HTTP API"));
        assert!(text.contains("🔧 worker"));
        assert!(text.contains("📦 backend [api, worker]"));
        assert!(text.contains("📄 shared/services.toml"));
    }

    #[test]
    fn test_empty_report() {
        let text = ConsoleReporter::new().format_report(&DiscoveryReport::default());
        assert!(text.contains("Nothing discovered."));
    }

    #[test]
    fn test_json_report_round_trips() {
        let report = sample_report();
        let json = report.render(OutputFormat::Json).unwrap();
        let parsed: DiscoveryReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_toml_and_yaml_render() {
        let report = sample_report();

        let toml = report.render(OutputFormat::Toml).unwrap();
        assert!(toml.contains("[[services]]"));
        assert!(toml.contains("name = \"api\""));

        let yaml = report.render(OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("name: worker"));
    }
}
