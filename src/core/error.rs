use std::path::PathBuf;
use thiserror::Error;

/// Typed failures raised by the discovery core.
///
/// Everything else travels as `anyhow::Error` with context attached; these
/// variants exist so callers can `downcast_ref` the cases they care about.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The configured scan root exists but is not a directory.
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// A directory's ignore file exists but could not be compiled.
    #[error("invalid ignore file {}", .path.display())]
    InvalidIgnoreFile {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },

    /// A report was requested in a format we cannot render.
    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),
}
