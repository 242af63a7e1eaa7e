use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::builders::generator::{
    Generator, GeneratorBase, GroupGenerator, ImportGenerator, ServiceGenerator, Visit,
};
use crate::builders::records::{GroupConfig, ServiceConfig};

/// Manifest file name used when a generator entry does not name one.
pub const DEFAULT_MANIFEST: &str = "services.toml";

/// The on-disk shape of a service manifest.
#[derive(Debug, Deserialize, Default)]
struct Manifest {
    #[serde(default)]
    services: Vec<ServiceConfig>,
    #[serde(default)]
    groups: Vec<GroupConfig>,
    #[serde(default)]
    imports: Vec<String>,
    /// Stop looking for further manifests below this directory.
    #[serde(default)]
    skip_subtree: bool,
}

/// A generator that reads declarative TOML manifests.
///
/// A directory containing the manifest is claimed by this generator: its
/// services, groups and imports are recorded and generators configured after
/// this one never see that directory or anything under it. A manifest that
/// fails to parse poisons the generator for the run instead of aborting it.
pub struct ManifestGenerator {
    name: String,
    manifest: String,
    base: GeneratorBase,
    services: Vec<ServiceConfig>,
    groups: Vec<GroupConfig>,
    imports: Vec<String>,
}

impl ManifestGenerator {
    pub fn new(name: impl Into<String>, manifest: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            manifest: manifest.into(),
            base: GeneratorBase::new(),
            services: Vec::new(),
            groups: Vec::new(),
            imports: Vec::new(),
        }
    }

    pub fn manifest(&self) -> &str {
        &self.manifest
    }

    fn record(&mut self, dir: &Path, manifest: Manifest) {
        let relative = dir
            .strip_prefix(self.base.base_path())
            .unwrap_or(dir)
            .to_path_buf();

        for mut service in manifest.services {
            if service.path.is_none() {
                service.path = Some(relative.clone());
            }
            self.services.push(service);
        }
        self.groups.extend(manifest.groups);
        self.imports.extend(
            manifest
                .imports
                .iter()
                .map(|import| normalize(&dir.join(import)).to_string_lossy().into_owned()),
        );
    }
}

/// Resolves `.` and `..` components without touching the filesystem.
///
/// `..` never climbs above the root or a leading prefix; on a relative path
/// with nothing left to pop it is kept.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}

impl Generator for ManifestGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn base(&self) -> &GeneratorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut GeneratorBase {
        &mut self.base
    }

    fn start_walk(&mut self, base_path: &Path) {
        self.base.start_walk(base_path);
        self.services.clear();
        self.groups.clear();
        self.imports.clear();
    }

    fn visit_dir(&mut self, path: &Path) -> Result<Visit> {
        let manifest_path = path.join(&self.manifest);
        let content = match fs::read_to_string(&manifest_path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Visit::none()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read manifest {}", manifest_path.display())
                });
            }
        };

        let manifest: Manifest = match toml::from_str(&content) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!("{}: invalid manifest {}", self.name, manifest_path.display());
                self.set_err(
                    anyhow::Error::new(e)
                        .context(format!("Failed to parse {}", manifest_path.display())),
                );
                return Ok(Visit::skip_subtree());
            }
        };

        debug!(
            "{}: {} declares {} service(s), {} group(s), {} import(s)",
            self.name,
            manifest_path.display(),
            manifest.services.len(),
            manifest.groups.len(),
            manifest.imports.len()
        );

        let skip = manifest.skip_subtree;
        self.record(path, manifest);

        let visit = Visit::found();
        Ok(if skip { visit.and_skip_subtree() } else { visit })
    }

    fn as_service_generator(&self) -> Option<&dyn ServiceGenerator> {
        Some(self)
    }

    fn as_group_generator(&self) -> Option<&dyn GroupGenerator> {
        Some(self)
    }

    fn as_import_generator(&self) -> Option<&dyn ImportGenerator> {
        Some(self)
    }
}

impl ServiceGenerator for ManifestGenerator {
    fn services(&self) -> &[ServiceConfig] {
        &self.services
    }
}

impl GroupGenerator for ManifestGenerator {
    fn groups(&self) -> &[GroupConfig] {
        &self.groups
    }
}

impl ImportGenerator for ManifestGenerator {
    fn imports(&self) -> &[String] {
        &self.imports
    }
}
