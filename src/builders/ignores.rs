use anyhow::{Context, Result};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::core::error::DiscoveryError;

/// File name looked up in every directory when no other name is configured.
pub const DEFAULT_IGNORE_FILE: &str = ".discoverignore";

/// A compiled set of gitignore rules declared by a single directory.
///
/// Rules are anchored at the directory that declared them, so a pattern such
/// as `build/` matches `<dir>/build` and, because it has no inner slash, any
/// `build` directory further down as well.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    matcher: Gitignore,
    source: PathBuf,
}

impl IgnoreRules {
    /// Loads the ignore file named `file_name` from `dir`.
    ///
    /// Returns `Ok(None)` when the directory declares no rules of its own. A
    /// file that exists but contains an invalid pattern is a hard error.
    pub fn load(dir: &Path, file_name: &str) -> Result<Option<Self>> {
        let source = dir.join(file_name);

        match fs::metadata(&source) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to stat ignore file {}", source.display()));
            }
        }

        let mut builder = GitignoreBuilder::new(dir);
        // An unclosed `[` is a typo, not a literal bracket.
        builder.allow_unclosed_class(false);
        if let Some(err) = builder.add(&source) {
            return Err(DiscoveryError::InvalidIgnoreFile {
                path: source,
                source: err,
            }
            .into());
        }

        let matcher = builder
            .build()
            .map_err(|err| DiscoveryError::InvalidIgnoreFile {
                path: source.clone(),
                source: err,
            })?;

        debug!(
            "loaded {} ignore rule(s) from {}",
            matcher.num_ignores() + matcher.num_whitelists(),
            source.display()
        );

        Ok(Some(Self { matcher, source }))
    }

    /// Reports whether the directory at `path` is excluded by these rules.
    pub fn matches(&self, path: &Path) -> bool {
        self.matcher.matched(path, true).is_ignore()
    }

    /// The ignore file these rules were compiled from.
    pub fn source(&self) -> &Path {
        &self.source
    }
}
