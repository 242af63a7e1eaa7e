use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::builders::records::{GroupConfig, ServiceConfig};

/// Whether a generator wants to keep looking below the directory it just saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Descend {
    /// Keep offering this generator the subdirectories.
    #[default]
    Continue,
    /// Drop this generator for everything below the current directory. The
    /// generator has still seen the current directory itself.
    SkipSubtree,
}

/// The outcome of offering one directory to one generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Visit {
    /// The generator claims this directory. Generators listed after it are not
    /// offered this directory or anything beneath it.
    pub found: bool,
    pub descend: Descend,
}

impl Visit {
    /// Nothing of interest here; keep going.
    pub fn none() -> Self {
        Self::default()
    }

    /// The directory is claimed by the visiting generator.
    pub fn found() -> Self {
        Self {
            found: true,
            descend: Descend::Continue,
        }
    }

    /// Stop offering the subtree to the visiting generator.
    pub fn skip_subtree() -> Self {
        Self {
            found: false,
            descend: Descend::SkipSubtree,
        }
    }

    /// Same claim, but without descending any further.
    pub fn and_skip_subtree(self) -> Self {
        Self {
            descend: Descend::SkipSubtree,
            ..self
        }
    }

    pub fn skips_subtree(&self) -> bool {
        self.descend == Descend::SkipSubtree
    }
}

/// Per-run state every generator carries.
///
/// Generators embed one of these and hand it out through [`Generator::base`]
/// and [`Generator::base_mut`]; the default lifecycle methods of the trait
/// operate on it.
#[derive(Debug, Default)]
pub struct GeneratorBase {
    err: Option<anyhow::Error>,
    base_path: PathBuf,
}

impl GeneratorBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the recorded error and remembers the root of the new run.
    pub fn start_walk(&mut self, base_path: &Path) {
        self.err = None;
        self.base_path = base_path.to_path_buf();
    }

    pub fn err(&self) -> Option<&anyhow::Error> {
        self.err.as_ref()
    }

    pub fn set_err(&mut self, err: anyhow::Error) {
        self.err = Some(err);
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

/// The contract every discovery plugin implements.
///
/// A collection drives a generator through exactly one run at a time:
/// `start_walk`, any number of `visit_dir` calls in preorder, then
/// `stop_walk`, which runs even when the walk is aborted. State kept on the
/// generator belongs to the current run and must be reset in `start_walk`;
/// concurrent runs need separate instances.
///
/// Beyond the base contract a generator may produce services, groups and
/// imports. Each of these is an independent capability, advertised by
/// overriding the matching `as_*_generator` method.
pub trait Generator {
    /// Display name, used in logs and error messages.
    fn name(&self) -> &str;

    fn base(&self) -> &GeneratorBase;

    fn base_mut(&mut self) -> &mut GeneratorBase;

    /// Prepares the generator for a walk rooted at `base_path`.
    ///
    /// Implementations that override this must still reset the base state.
    fn start_walk(&mut self, base_path: &Path) {
        self.base_mut().start_walk(base_path);
    }

    /// Inspects a single directory.
    ///
    /// An `Err` is a genuine failure and aborts the whole walk. To stop
    /// looking below this directory without failing, return a [`Visit`] with
    /// [`Descend::SkipSubtree`] instead.
    fn visit_dir(&mut self, path: &Path) -> Result<Visit>;

    /// Releases anything held for the run.
    fn stop_walk(&mut self) {}

    /// The error this generator recorded against itself during the run, if
    /// any. A generator with a recorded error contributes nothing to the
    /// aggregated results.
    fn err(&self) -> Option<&anyhow::Error> {
        self.base().err()
    }

    fn set_err(&mut self, err: anyhow::Error) {
        self.base_mut().set_err(err);
    }

    fn as_service_generator(&self) -> Option<&dyn ServiceGenerator> {
        None
    }

    fn as_group_generator(&self) -> Option<&dyn GroupGenerator> {
        None
    }

    fn as_import_generator(&self) -> Option<&dyn ImportGenerator> {
        None
    }
}

/// A generator that discovers services.
pub trait ServiceGenerator {
    fn services(&self) -> &[ServiceConfig];
}

/// A generator that discovers groups.
pub trait GroupGenerator {
    fn groups(&self) -> &[GroupConfig];
}

/// A generator that discovers references to further configuration files.
pub trait ImportGenerator {
    fn imports(&self) -> &[String];
}
