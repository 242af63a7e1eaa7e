//! Discovers service and group definitions by walking a directory tree and
//! letting an ordered list of generators interpret each directory.
//!
//! ```no_run
//! use svc_discover::builders::manifest::ManifestGenerator;
//! use svc_discover::core::engine::GeneratorCollection;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut collection = GeneratorCollection::new("./projects")
//!     .with_generator(Box::new(ManifestGenerator::new("manifest", "services.toml")));
//! collection.generate()?;
//! for service in collection.services() {
//!     println!("{}", service.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod builders;
pub mod core;
pub mod utils;

#[cfg(test)]
mod tests;
