// This file is the module declaration file for the `core` module.
// It holds the discovery machinery itself: the directory tree, the walk over
// it, and the collection that drives a run and aggregates the results.

// `config` module:
// Defines the `discover.toml` data structures (`DiscoveryConfig`), the
// `ConfigProvider` trait, and the `ConfigManager` that locates, loads, saves
// and validates the file and turns it into a `GeneratorCollection`.
pub mod config;

// `engine` module:
// Home of `GeneratorCollection`. It checks the scan root, builds the tree,
// starts and stops every generator around the walk, and afterwards merges,
// filters and sorts the services, groups and imports they discovered.
pub mod engine;

// `error` module:
// The typed errors (`DiscoveryError`) callers can match on after a failure.
pub mod error;

// `tree` module:
// Builds the arena of directory nodes below the scan root. Subdirectories
// matched by an inherited ignore rule stay in their parent's child list as
// `Child::Absent` and are never listed.
pub mod tree;

// `walker` module:
// The preorder traversal that offers each directory to the active generators
// and narrows the list handed down to the children.
pub mod walker;
