use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::builders::generator::Generator;
use crate::builders::ignores::DEFAULT_IGNORE_FILE;
use crate::builders::records::{GroupConfig, Named, ServiceConfig};
use crate::builders::reporter::DiscoveryReport;
use crate::core::error::DiscoveryError;
use crate::core::tree::DirectoryTree;
use crate::core::walker::{self, WalkSummary};

/// Runs a set of generators over a directory tree and aggregates what they
/// found.
///
/// Generator order matters: it decides who is offered a directory first, and
/// therefore who gets to claim it.
pub struct GeneratorCollection {
    generators: Vec<Box<dyn Generator>>,
    path: PathBuf,
    targets: Vec<String>,
    ignore_file: String,
}

impl GeneratorCollection {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            generators: Vec::new(),
            path: path.into(),
            targets: Vec::new(),
            ignore_file: DEFAULT_IGNORE_FILE.to_string(),
        }
    }

    /// Appends a generator after the ones already registered.
    pub fn with_generator(mut self, generator: Box<dyn Generator>) -> Self {
        self.generators.push(generator);
        self
    }

    /// Restricts `services()` and `groups()` to the given names.
    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_ignore_file(mut self, ignore_file: impl Into<String>) -> Self {
        self.ignore_file = ignore_file.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn generators(&self) -> &[Box<dyn Generator>] {
        &self.generators
    }

    /// Walks the configured root with every generator.
    ///
    /// Every generator is started before the walk and stopped after it, even
    /// when the walk fails part-way through. Errors recorded by a generator on
    /// itself do not fail the run; they only remove that generator's results.
    pub fn generate(&mut self) -> Result<WalkSummary> {
        let metadata = fs::metadata(&self.path)
            .with_context(|| format!("Failed to read scan root {}", self.path.display()))?;
        if !metadata.is_dir() {
            return Err(DiscoveryError::NotADirectory(self.path.clone()).into());
        }

        let tree = DirectoryTree::build(&self.path, &self.ignore_file)
            .with_context(|| format!("Failed to scan {}", self.path.display()))?;
        debug!(
            "built tree of {} directories ({} excluded) under {}",
            tree.len(),
            tree.excluded(),
            self.path.display()
        );

        for generator in self.generators.iter_mut() {
            generator.start_walk(&self.path);
        }

        let result = walker::walk(&tree, &mut self.generators);

        for generator in self.generators.iter_mut() {
            generator.stop_walk();
        }

        let summary = result
            .with_context(|| format!("Failed to generate from {}", self.path.display()))?;
        for generator in self.generators.iter() {
            if let Some(err) = generator.err() {
                warn!("discarding results from {}: {err:#}", generator.name());
            }
        }
        info!(
            "visited {} directories with {} generator call(s)",
            summary.directories, summary.visits
        );
        Ok(summary)
    }

    /// Services from every healthy generator, sorted by name.
    pub fn services(&self) -> Vec<ServiceConfig> {
        let mut services = Vec::new();
        for generator in self.healthy() {
            if let Some(found) = generator.as_service_generator() {
                debug!(
                    "{} contributed {} service(s)",
                    generator.name(),
                    found.services().len()
                );
                services.extend_from_slice(found.services());
            }
        }
        self.select(services)
    }

    /// Groups from every healthy generator, sorted by name.
    pub fn groups(&self) -> Vec<GroupConfig> {
        let mut groups = Vec::new();
        for generator in self.healthy() {
            if let Some(found) = generator.as_group_generator() {
                debug!(
                    "{} contributed {} group(s)",
                    generator.name(),
                    found.groups().len()
                );
                groups.extend_from_slice(found.groups());
            }
        }
        self.select(groups)
    }

    /// Imports from every healthy generator, in generator order.
    pub fn imports(&self) -> Vec<String> {
        let mut imports = Vec::new();
        for generator in self.healthy() {
            if let Some(found) = generator.as_import_generator() {
                imports.extend_from_slice(found.imports());
            }
        }
        imports
    }

    /// Everything discovered by the last run.
    pub fn report(&self) -> DiscoveryReport {
        DiscoveryReport {
            imports: self.imports(),
            services: self.services(),
            groups: self.groups(),
        }
    }

    /// Names of the generators whose results the last run threw away.
    pub fn discarded(&self) -> Vec<&str> {
        self.generators
            .iter()
            .filter(|generator| generator.err().is_some())
            .map(|generator| generator.name())
            .collect()
    }

    fn healthy(&self) -> impl Iterator<Item = &dyn Generator> + '_ {
        self.generators
            .iter()
            .filter(|generator| generator.err().is_none())
            .map(|generator| generator.as_ref())
    }

    /// Applies the target allow-list, if any, then sorts by name.
    fn select<T: Named>(&self, mut records: Vec<T>) -> Vec<T> {
        if !self.targets.is_empty() {
            let allowed: HashSet<&str> = self.targets.iter().map(String::as_str).collect();
            records.retain(|record| allowed.contains(record.name()));
        }
        records.sort_by(|a, b| a.name().cmp(b.name()));
        records
    }
}
